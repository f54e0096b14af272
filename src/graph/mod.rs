//! Whole-program service dependency graph

pub mod dependency_graph;
pub mod service_index;

pub use dependency_graph::DependencyGraph;
pub use service_index::{is_registrable, ServiceIndex};
