use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument};

use crate::config::{CompilerConfig, CompilerOptions};
use crate::diagnostics::{error_codes, ConsoleDiagnosticHandler, Diagnostic, DiagnosticHandler};
use crate::errors::CompilationError;
use crate::graph::{DependencyGraph, ServiceIndex};
use crate::model::{ProgramModel, TypeKey};
use crate::phases::{constructor_phase, dependency_phase, registration_phase, validation_phase};
use crate::plan::{RegistrationBlock, ResolvedConstructorPlan, SynthesizedConstructor};
use crate::skip_policy::SkipAssignablePolicy;
use crate::state::{MetricSummary, PassState, Phase};

/// Everything one compilation pass produces
#[derive(Debug)]
pub struct CompilationOutput {
    /// One generated constructor file per eligible type, in declaration order
    pub constructors: Vec<SynthesizedConstructor>,
    pub registrations: RegistrationBlock,
    /// Resolved plans for every type, including those that received no constructor
    pub plans: Vec<Arc<ResolvedConstructorPlan>>,
    pub graph: DependencyGraph,
    /// Model types, dependencies first
    pub order: Vec<TypeKey>,
    pub metrics: MetricSummary,
}

impl CompilationOutput {
    pub fn constructor_for(&self, key: &TypeKey) -> Option<&SynthesizedConstructor> {
        self.constructors.iter().find(|c| &c.owner == key)
    }

    pub fn plan_for(&self, key: &TypeKey) -> Option<&Arc<ResolvedConstructorPlan>> {
        self.plans.iter().find(|p| &p.owner == key)
    }
}

/// Registration compiler for a program model
///
/// Each call to [`RegistrationCompiler::compile`] is an independent pass over a fresh working
/// set; nothing carries over between passes.
pub struct RegistrationCompiler {
    options: CompilerOptions,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
}

impl RegistrationCompiler {
    /// Create a compiler with default options.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use autowire::diagnostics::CollectingDiagnosticHandler;
    /// use autowire::model::{Lifetime, ProgramModel, TypeDescriptor};
    /// use autowire::RegistrationCompiler;
    ///
    /// let model = ProgramModel::new(vec![
    ///     TypeDescriptor::new("App", "Clock").with_lifetime(Lifetime::Singleton),
    /// ])
    /// .unwrap();
    /// let compiler = RegistrationCompiler::new(Arc::new(CollectingDiagnosticHandler::new()));
    /// let output = compiler.compile(&model).unwrap();
    /// assert_eq!(output.registrations.statements, vec!["services.AddSingleton<Clock>();"]);
    /// ```
    pub fn new(diagnostic_handler: Arc<dyn DiagnosticHandler>) -> Self {
        Self {
            options: CompilerOptions::default(),
            diagnostic_handler,
        }
    }

    /// Compiler that prints diagnostics to stderr, styled per `compilerOptions.pretty`
    pub fn with_console(config: CompilerConfig) -> Self {
        let handler = Arc::new(ConsoleDiagnosticHandler::new(config.compiler_options.pretty));
        Self::new(handler).with_options(config.compiler_options)
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Run one pass over `model`
    ///
    /// Only invalid options abort the pass. Everything found in the model is reported as a
    /// diagnostic and generation continues.
    #[instrument(skip_all, fields(types = model.len()))]
    pub fn compile(&self, model: &ProgramModel) -> Result<CompilationOutput, CompilationError> {
        let policy = match self
            .options
            .validate()
            .and_then(|_| SkipAssignablePolicy::from_options(&self.options.skip_assignable))
        {
            Ok(policy) => policy,
            Err(err) => {
                error!(error = %err, "Invalid compiler options");
                self.diagnostic_handler.report(Diagnostic::coded(
                    error_codes::INVALID_CONFIG,
                    Vec::new(),
                    err.to_string(),
                ));
                return Err(err);
            }
        };

        let mut state = PassState::new(self.diagnostic_handler.clone(), self.options.clone());

        let start = Instant::now();
        dependency_phase::resolve_all(model, &mut state);
        state.metrics.record_phase_time(Phase::Resolve, start.elapsed());

        let start = Instant::now();
        let constructors = constructor_phase::synthesize_all(model, &state);
        state
            .metrics
            .record_phase_time(Phase::Synthesize, start.elapsed());

        let start = Instant::now();
        let index = ServiceIndex::build(model, &policy);
        let validation = validation_phase::validate(model, &index, &state);
        state.metrics.record_phase_time(Phase::Validate, start.elapsed());

        let start = Instant::now();
        let registrations =
            registration_phase::emit(model, &validation.order, &policy, &state);
        state.metrics.record_phase_time(Phase::Emit, start.elapsed());

        let metrics = state.metrics.get_summary();
        info!(
            constructors = constructors.len(),
            registrations = registrations.statements.len(),
            diagnostics = metrics.diagnostics_reported,
            "Compilation pass completed"
        );

        Ok(CompilationOutput {
            constructors,
            registrations,
            plans: state.plans().to_vec(),
            graph: validation.graph,
            order: validation.order,
            metrics,
        })
    }
}
