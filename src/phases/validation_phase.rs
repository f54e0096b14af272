//! Validation phase: lifetime safety and dependency cycles
//!
//! This phase handles:
//! - Building the whole-program dependency graph from every resolved plan
//! - Flagging singletons that capture scoped or transient services
//! - Reporting dependency cycles
//! - Computing the dependency order the registration block is emitted in
//!
//! It runs once all plans exist and never blocks generation.
//!
//! **Design Pattern**: Stateless phase functions that take explicit context parameters.

use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

use crate::diagnostics::{error_codes, Diagnostic};
use crate::graph::{DependencyGraph, ServiceIndex};
use crate::model::{Lifetime, ProgramModel, TypeKey};
use crate::state::PassState;

/// Graph and emission order produced by validation
#[derive(Debug)]
pub struct ValidationOutcome {
    pub graph: DependencyGraph,
    /// Model types, dependencies first
    pub order: Vec<TypeKey>,
}

#[instrument(skip_all, fields(plans = state.plans().len()))]
pub fn validate(model: &ProgramModel, index: &ServiceIndex, state: &PassState) -> ValidationOutcome {
    let graph = build_graph(model, index, state);
    check_lifetimes(model, index, &graph, state);
    check_cycles(&graph, state);

    let order: Vec<TypeKey> = graph
        .dependency_order()
        .into_iter()
        .filter(|key| model.contains(key))
        .collect();
    debug!(edges = graph.edge_count(), "Validated dependency graph");

    ValidationOutcome { graph, order }
}

/// One node per model type (declaration order) plus framework services that are requested
pub fn build_graph(model: &ProgramModel, index: &ServiceIndex, state: &PassState) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for key in model.keys() {
        graph.add_node(key.clone());
    }
    for plan in state.plans() {
        for edge in plan.dependency_edges() {
            for provider in index.providers_of(model, &edge.provided) {
                graph.add_edge(edge.consumer.clone(), provider);
            }
        }
    }
    state.metrics.record_edges(graph.edge_count());
    graph
}

/// A shorter-lived provider reachable from a singleton, with the path that reaches it
struct Capture {
    provider: TypeKey,
    lifetime: Lifetime,
    path: Vec<TypeKey>,
}

/// Depth-first from `node`, continuing only through transient providers
fn find_captures(
    graph: &DependencyGraph,
    index: &ServiceIndex,
    node: &TypeKey,
    path: &mut Vec<TypeKey>,
    visited: &mut FxHashSet<TypeKey>,
    captures: &mut Vec<Capture>,
) {
    for dep in graph.dependencies_of(node) {
        if !visited.insert(dep.clone()) {
            continue;
        }
        let lifetime = index.lifetime_of(dep);
        match lifetime {
            Lifetime::Scoped | Lifetime::Transient => {
                path.push(dep.clone());
                captures.push(Capture {
                    provider: dep.clone(),
                    lifetime,
                    path: path.clone(),
                });
                if lifetime == Lifetime::Transient {
                    find_captures(graph, index, dep, path, visited, captures);
                }
                path.pop();
            }
            Lifetime::Singleton | Lifetime::ExternallyManaged | Lifetime::None => {}
        }
    }
}

fn check_lifetimes(
    model: &ProgramModel,
    index: &ServiceIndex,
    graph: &DependencyGraph,
    state: &PassState,
) {
    for descriptor in model.iter() {
        let root = descriptor.key();
        if descriptor.lifetime != Lifetime::Singleton || !index.is_registered(&root) {
            continue;
        }

        let mut visited = FxHashSet::default();
        visited.insert(root.clone());
        let mut path = vec![root.clone()];
        let mut captures = Vec::new();
        find_captures(graph, index, &root, &mut path, &mut visited, &mut captures);

        for capture in captures {
            let code = if capture.lifetime == Lifetime::Scoped {
                error_codes::SINGLETON_DEPENDS_ON_SCOPED
            } else {
                error_codes::SINGLETON_DEPENDS_ON_TRANSIENT
            };
            let mut message = format!(
                "Singleton '{}' depends on {} service '{}'",
                root.full_name(),
                capture.lifetime.as_str(),
                capture.provider.full_name()
            );
            if capture.path.len() > 2 {
                let chain: Vec<String> = capture.path.iter().map(|k| k.full_name()).collect();
                message.push_str(&format!(" via {}", chain.join(" -> ")));
            }

            let mut diagnostic =
                Diagnostic::coded(code, vec![root.clone(), capture.provider.clone()], message);
            for hop in &capture.path[1..capture.path.len() - 1] {
                diagnostic = diagnostic.with_related(hop.clone(), "Transient dependency on the path");
            }
            state.report(diagnostic);
        }
    }
}

fn check_cycles(graph: &DependencyGraph, state: &PassState) {
    for cycle in graph.cycles() {
        let mut names: Vec<String> = cycle.iter().map(|k| k.full_name()).collect();
        names.push(cycle[0].full_name());
        state.report(Diagnostic::coded(
            error_codes::DEPENDENCY_CYCLE,
            cycle,
            format!("Dependency cycle: {}", names.join(" -> ")),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompilerOptions, SkipAssignableOptions};
    use crate::diagnostics::{CollectingDiagnosticHandler, DiagnosticHandler};
    use crate::model::{well_known, InjectableMember, OptionsKind, TypeDescriptor, TypeRef};
    use crate::phases::dependency_phase::resolve_all;
    use crate::skip_policy::SkipAssignablePolicy;
    use std::sync::Arc;

    fn run(model: &ProgramModel) -> (ValidationOutcome, Arc<CollectingDiagnosticHandler>) {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let mut state = PassState::new(handler.clone(), CompilerOptions::default());
        resolve_all(model, &mut state);
        let policy = SkipAssignablePolicy::from_options(&SkipAssignableOptions::default()).unwrap();
        let index = ServiceIndex::build(model, &policy);
        (validate(model, &index, &state), handler)
    }

    fn service(namespace: &str, name: &str, lifetime: Lifetime) -> TypeDescriptor {
        TypeDescriptor::new(namespace, name).with_lifetime(lifetime)
    }

    #[test]
    fn test_singleton_capturing_scoped_is_an_error() {
        let model = ProgramModel::new(vec![
            service("App", "Cache", Lifetime::Singleton).with_member(InjectableMember::service(
                "_database",
                TypeRef::class("App.Data", "Database"),
            )),
            service("App.Data", "Database", Lifetime::Scoped),
        ])
        .unwrap();

        let (_, handler) = run(&model);

        let errors = handler.with_code(error_codes::SINGLETON_DEPENDS_ON_SCOPED);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].types,
            vec![TypeKey::new("App", "Cache", 0), TypeKey::new("App.Data", "Database", 0)]
        );
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_transitive_capture_through_transient() {
        let model = ProgramModel::new(vec![
            service("App", "Cache", Lifetime::Singleton).with_member(InjectableMember::service(
                "_formatter",
                TypeRef::interface("App", "IFormatter"),
            )),
            service("App", "Formatter", Lifetime::Transient)
                .with_interface(TypeRef::interface("App", "IFormatter"))
                .with_member(InjectableMember::service(
                    "_session",
                    TypeRef::class("App", "Session"),
                )),
            service("App", "Session", Lifetime::Scoped),
        ])
        .unwrap();

        let (_, handler) = run(&model);

        assert_eq!(
            handler.with_code(error_codes::SINGLETON_DEPENDS_ON_TRANSIENT).len(),
            1
        );
        let errors = handler.with_code(error_codes::SINGLETON_DEPENDS_ON_SCOPED);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("via App.Cache -> App.Formatter -> App.Session"));
        assert_eq!(errors[0].related_information.len(), 1);
    }

    #[test]
    fn test_traversal_stops_at_singletons_and_unregistered_types() {
        let model = ProgramModel::new(vec![
            service("App", "Root", Lifetime::Singleton)
                .with_member(InjectableMember::service("_clock", TypeRef::class("App", "Clock")))
                .with_member(InjectableMember::service("_plain", TypeRef::class("App", "Plain"))),
            service("App", "Clock", Lifetime::Singleton)
                .with_member(InjectableMember::service("_scope", TypeRef::class("App", "Scope"))),
            TypeDescriptor::new("App", "Plain")
                .with_member(InjectableMember::service("_scope", TypeRef::class("App", "Scope"))),
            service("App", "Scope", Lifetime::Scoped),
        ])
        .unwrap();

        let (_, handler) = run(&model);

        // Clock itself captures Scope; Root only sees Clock and Plain
        let errors = handler.with_code(error_codes::SINGLETON_DEPENDS_ON_SCOPED);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].types[0], TypeKey::new("App", "Clock", 0));
    }

    #[test]
    fn test_each_pair_reported_once() {
        let scoped = TypeRef::class("App", "Scope");
        let model = ProgramModel::new(vec![
            service("App", "Root", Lifetime::Singleton)
                .with_member(InjectableMember::service("_a", scoped.clone()))
                .with_member(InjectableMember::collection("_all", scoped.clone()))
                .with_member(InjectableMember::service("_t", TypeRef::class("App", "Hop"))),
            service("App", "Hop", Lifetime::Transient)
                .with_member(InjectableMember::service("_scope", scoped)),
            service("App", "Scope", Lifetime::Scoped),
        ])
        .unwrap();

        let (_, handler) = run(&model);

        assert_eq!(handler.with_code(error_codes::SINGLETON_DEPENDS_ON_SCOPED).len(), 1);
    }

    #[test]
    fn test_factories_and_hosted_consumers_are_exempt() {
        let model = ProgramModel::new(vec![
            service("App", "Lazy", Lifetime::Singleton).with_member(InjectableMember::factory(
                "_scope",
                TypeRef::class("App", "Scope"),
            )),
            service("App", "Worker", Lifetime::ExternallyManaged).with_member(
                InjectableMember::service("_scope", TypeRef::class("App", "Scope")),
            ),
            service("App", "Scope", Lifetime::Scoped),
        ])
        .unwrap();

        let (_, handler) = run(&model);

        assert_eq!(handler.get_diagnostics().len(), 0);
    }

    #[test]
    fn test_options_snapshot_is_scoped() {
        let mail = TypeRef::class("App", "MailSettings");
        let model = ProgramModel::new(vec![
            service("App", "Mailer", Lifetime::Singleton)
                .with_member(InjectableMember::options("_snapshot", OptionsKind::Snapshot, mail.clone()))
                .with_member(InjectableMember::options("_monitor", OptionsKind::Monitor, mail.clone())),
        ])
        .unwrap();

        let (_, handler) = run(&model);

        let errors = handler.with_code(error_codes::SINGLETON_DEPENDS_ON_SCOPED);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            Some(errors[0].types[1].clone()),
            well_known::options(OptionsKind::Snapshot, mail).definition_key()
        );
    }

    #[test]
    fn test_three_cycle_reported_once() {
        let model = ProgramModel::new(vec![
            service("App", "A", Lifetime::Transient)
                .with_member(InjectableMember::service("_b", TypeRef::class("App", "B"))),
            service("App", "B", Lifetime::Transient)
                .with_member(InjectableMember::service("_c", TypeRef::class("App", "C"))),
            service("App", "C", Lifetime::Transient)
                .with_member(InjectableMember::service("_a", TypeRef::class("App", "A"))),
        ])
        .unwrap();

        let (_, handler) = run(&model);

        let cycles = handler.with_code(error_codes::DEPENDENCY_CYCLE);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].types.len(), 3);
        assert_eq!(cycles[0].message, "Dependency cycle: App.A -> App.B -> App.C -> App.A");
    }

    #[test]
    fn test_dependency_order_puts_providers_first() {
        let model = ProgramModel::new(vec![
            service("App", "Controller", Lifetime::Scoped)
                .with_member(InjectableMember::service("_service", TypeRef::class("App", "Service"))),
            service("App", "Service", Lifetime::Scoped)
                .with_member(InjectableMember::service("_store", TypeRef::class("App", "Store"))),
            service("App", "Store", Lifetime::Singleton),
        ])
        .unwrap();

        let (outcome, _) = run(&model);

        let names: Vec<&str> = outcome.order.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["Store", "Service", "Controller"]);
    }
}
