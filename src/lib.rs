pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod graph;
mod helpers;
pub mod model;
pub mod namespace_resolver;
pub mod phases;
pub mod plan;
pub mod skip_policy;
pub mod state;
pub mod utils;

pub use compiler::{CompilationOutput, RegistrationCompiler};
pub use config::{CompilerConfig, CompilerOptions, SkipAssignableOptions};
pub use diagnostics::{
    error_codes, CollectingDiagnosticHandler, ConsoleDiagnosticHandler, Diagnostic,
    DiagnosticCode, DiagnosticHandler, DiagnosticLevel,
};
pub use errors::{CompilationError, ModelError};
pub use graph::DependencyGraph;
pub use model::{
    InjectableMember, InstanceSharing, Lifetime, ProgramModel, RegistrationMode, TypeDescriptor,
    TypeKey, TypeRef,
};
pub use namespace_resolver::{resolve_imports, NamespaceResolver};
pub use plan::{RegistrationBlock, ResolvedConstructorPlan, SynthesizedConstructor};
pub use skip_policy::SkipAssignablePolicy;
pub use state::MetricSummary;
