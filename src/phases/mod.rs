//! Compilation phase modules
//!
//! Each phase handles one step of a compilation pass and runs in this order:
//! - `dependency_phase`: hierarchical, memoized resolution of constructor plans
//! - `constructor_phase`: constructor text synthesis from resolved plans
//! - `validation_phase`: lifetime safety and cycle checks over the whole dependency graph
//! - `registration_phase`: container registration statements in dependency order
//!
//! The validation phase is the synchronization point: it needs every plan resolved first.

pub mod constructor_phase;
pub mod dependency_phase;
pub mod registration_phase;
pub mod validation_phase;
