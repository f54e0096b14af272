//! Helper modules for the builder and synthesizer
//!
//! Pure functions with no access to pass state: configuration-binding inference and
//! identifier generation.

pub mod config_binding;
pub mod naming;
