//! Per-pass state
//!
//! Everything derived while compiling one model lives here and is dropped with the pass.
//! Nothing is shared between passes.

pub mod metrics;
pub mod pass_state;

pub use metrics::{MetricSummary, PassMetrics, Phase};
pub use pass_state::PassState;
