use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::metrics::PassMetrics;
use crate::config::CompilerOptions;
use crate::diagnostics::{Diagnostic, DiagnosticHandler};
use crate::model::TypeKey;
use crate::plan::ResolvedConstructorPlan;

/// Shared state for one compilation pass
///
/// Phases read the immutable model and write only here:
/// - the append-only plan cache filled by hierarchical resolution
/// - the stack of types currently being resolved (inheritance-cycle detection)
/// - pass metrics
pub struct PassState {
    pub options: CompilerOptions,
    pub diagnostic_handler: Arc<dyn DiagnosticHandler>,
    pub metrics: PassMetrics,
    plans: Vec<Arc<ResolvedConstructorPlan>>,
    plan_index: FxHashMap<TypeKey, usize>,
    resolving: Vec<TypeKey>,
}

impl PassState {
    pub fn new(diagnostic_handler: Arc<dyn DiagnosticHandler>, options: CompilerOptions) -> Self {
        Self {
            options,
            diagnostic_handler,
            metrics: PassMetrics::new(),
            plans: Vec::new(),
            plan_index: FxHashMap::default(),
            resolving: Vec::new(),
        }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.metrics.record_diagnostic();
        self.diagnostic_handler.report(diagnostic);
    }

    pub fn cached_plan(&self, key: &TypeKey) -> Option<Arc<ResolvedConstructorPlan>> {
        let hit = self.plan_index.get(key).map(|&i| Arc::clone(&self.plans[i]));
        self.metrics.record_plan_lookup(hit.is_some());
        hit
    }

    /// Append a plan. A plan already cached for the same type is kept.
    pub fn cache_plan(&mut self, plan: ResolvedConstructorPlan) -> Arc<ResolvedConstructorPlan> {
        if let Some(&i) = self.plan_index.get(&plan.owner) {
            return Arc::clone(&self.plans[i]);
        }
        let plan = Arc::new(plan);
        self.plan_index.insert(plan.owner.clone(), self.plans.len());
        self.plans.push(Arc::clone(&plan));
        self.metrics.record_plan_resolved();
        plan
    }

    /// Plans in the order they were resolved (bases before derived types)
    pub fn plans(&self) -> &[Arc<ResolvedConstructorPlan>] {
        &self.plans
    }

    pub fn plan(&self, key: &TypeKey) -> Option<&Arc<ResolvedConstructorPlan>> {
        self.plan_index.get(key).map(|&i| &self.plans[i])
    }

    pub fn is_resolving(&self, key: &TypeKey) -> bool {
        self.resolving.contains(key)
    }

    pub fn push_resolving(&mut self, key: TypeKey) {
        self.resolving.push(key);
    }

    pub fn pop_resolving(&mut self) {
        self.resolving.pop();
    }

    /// Types from `key` to the top of the resolving stack
    pub fn resolving_from(&self, key: &TypeKey) -> Vec<TypeKey> {
        match self.resolving.iter().position(|k| k == key) {
            Some(start) => self.resolving[start..].to_vec(),
            None => Vec::new(),
        }
    }
}
