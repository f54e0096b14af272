//! Registration phase: container registration emission
//!
//! This phase handles:
//! - Checking explicit skip lists against what each type exposes
//! - Applying the skip-assignable policy
//! - Turning lifetime, registration mode and instance sharing into a [`RegistrationPlan`]
//! - Rendering the plans, in dependency order, as one static extension method
//!
//! **Design Pattern**: Stateless phase functions that take explicit context parameters.

use std::fmt::Write as _;

use tracing::{debug, instrument};

use crate::diagnostics::{error_codes, Diagnostic};
use crate::model::descriptor::skip_entry_names;
use crate::model::{
    well_known, InstanceSharing, Lifetime, ProgramModel, TypeDescriptor, TypeKey, TypeRef,
};
use crate::namespace_resolver::NamespaceResolver;
use crate::plan::{InterfaceEntry, InterfaceEntryKind, RegistrationBlock, RegistrationPlan};
use crate::skip_policy::SkipAssignablePolicy;
use crate::state::PassState;
use crate::utils::fuzzy::closest_name;
use crate::utils::type_formatter::{format_open_generic, format_type, ScopedFormatter};

const INDENT: &str = "    ";

/// Emit registrations for every eligible type in `order`
#[instrument(skip_all, fields(types = order.len()))]
pub fn emit(
    model: &ProgramModel,
    order: &[TypeKey],
    policy: &SkipAssignablePolicy,
    state: &PassState,
) -> RegistrationBlock {
    for descriptor in model.iter() {
        check_skip_list(descriptor, state);
    }

    let mut plans = Vec::new();
    for key in order {
        let Some(descriptor) = model.get(key) else {
            continue;
        };
        if !descriptor.lifetime.is_declared() || descriptor.is_abstract {
            continue;
        }
        if let Some(entry) = policy.suppressing_entry(model, descriptor) {
            state.metrics.record_suppressed();
            debug!(ty = %key, entry = %entry, "Registration suppressed by skip-assignable policy");
            continue;
        }
        plans.push(plan_registration(descriptor, state));
    }

    let block = render_block(model, plans, state);
    state.metrics.record_registrations(block.statements.len());
    block
}

/// Report skip-list entries that name neither the type nor one of its interfaces
pub fn check_skip_list(descriptor: &TypeDescriptor, state: &PassState) {
    if descriptor.skip.is_empty() {
        return;
    }
    let self_ref = descriptor.self_ref();
    for entry in &descriptor.skip {
        let known = skip_entry_names(entry, &self_ref)
            || descriptor
                .interfaces
                .iter()
                .any(|interface| skip_entry_names(entry, interface));
        if known {
            continue;
        }

        let mut candidates: Vec<String> = descriptor.interfaces.iter().map(format_type).collect();
        candidates.push(descriptor.display_name());

        let mut diagnostic = Diagnostic::coded(
            error_codes::UNKNOWN_SKIP_ENTRY,
            vec![descriptor.key()],
            format!(
                "Skip entry '{}' does not match '{}' or any interface it implements",
                entry.trim(),
                descriptor.display_name()
            ),
        );
        if let Some(suggestion) = closest_name(entry.trim(), &candidates) {
            diagnostic = diagnostic.with_suggestion(
                suggestion.to_string(),
                format!("Did you mean '{}'?", suggestion),
            );
        }
        state.report(diagnostic);
    }
}

/// Decide which registrations one type receives
pub fn plan_registration(descriptor: &TypeDescriptor, state: &PassState) -> RegistrationPlan {
    let key = descriptor.key();
    let open_generic = descriptor.is_open_generic();
    let hosted = descriptor.lifetime == Lifetime::ExternallyManaged;

    // The host activates hosted services itself, so the concrete type is always registered
    let concrete = hosted || !descriptor.skips_self();

    let mut interfaces: Vec<&TypeRef> = descriptor.registered_interfaces();
    if open_generic {
        // A closed interface cannot be served by an unbound implementation
        interfaces.retain(|interface| {
            let usable = interface.is_open();
            if !usable {
                debug!(
                    ty = %key,
                    interface = %format_type(interface),
                    "Closed interface skipped for open generic"
                );
            }
            usable
        });
    }

    let mut sharing = descriptor.registration.sharing;
    if open_generic && sharing == InstanceSharing::Shared && !interfaces.is_empty() {
        state.report(Diagnostic::coded(
            error_codes::SHARED_OPEN_GENERIC,
            vec![key.clone()],
            format!(
                "Open generic '{}' cannot share one instance across its interfaces; registering them separately",
                descriptor.display_name()
            ),
        ));
        sharing = InstanceSharing::Separate;
    }

    let kind = if hosted || (concrete && sharing == InstanceSharing::Shared) {
        InterfaceEntryKind::Factory
    } else {
        InterfaceEntryKind::Direct
    };

    RegistrationPlan {
        owner: key,
        lifetime: descriptor.lifetime,
        open_generic,
        concrete,
        interfaces: interfaces
            .into_iter()
            .map(|interface| InterfaceEntry {
                interface: interface.clone(),
                kind,
            })
            .collect(),
    }
}

/// `typeof(...)` operand for an unbound generic reference
fn unbound(formatter: &ScopedFormatter, ty: &TypeRef) -> String {
    let name = formatter.spell(
        ty.namespace().unwrap_or_default(),
        ty.simple_name().unwrap_or_default(),
    );
    format_open_generic(&name, ty.generic_args().len())
}

/// Statements for one plan
pub fn render_plan(
    plan: &RegistrationPlan,
    descriptor: &TypeDescriptor,
    formatter: &ScopedFormatter,
) -> Vec<String> {
    let mut statements = Vec::new();
    let hosted = plan.lifetime == Lifetime::ExternallyManaged;
    let method = if hosted {
        "AddSingleton"
    } else {
        plan.lifetime.add_method().unwrap_or("AddTransient")
    };
    let self_ref = descriptor.self_ref();

    if plan.open_generic {
        let implementation = unbound(formatter, &self_ref);
        if plan.concrete {
            statements.push(format!("services.{}(typeof({}));", method, implementation));
        }
        for entry in &plan.interfaces {
            statements.push(format!(
                "services.{}(typeof({}), typeof({}));",
                method,
                unbound(formatter, &entry.interface),
                implementation
            ));
        }
        return statements;
    }

    let implementation = formatter.format(&self_ref);
    if hosted && plan.interfaces.is_empty() {
        statements.push(format!("services.AddHostedService<{}>();", implementation));
        return statements;
    }
    if plan.concrete {
        statements.push(format!("services.{}<{}>();", method, implementation));
    }
    if hosted {
        statements.push(format!(
            "services.AddHostedService(sp => sp.GetRequiredService<{}>());",
            implementation
        ));
    }
    for entry in &plan.interfaces {
        let service = formatter.format(&entry.interface);
        statements.push(match entry.kind {
            InterfaceEntryKind::Direct => {
                format!("services.{}<{}, {}>();", method, service, implementation)
            }
            InterfaceEntryKind::Factory => format!(
                "services.{}<{}>(sp => sp.GetRequiredService<{}>());",
                method, service, implementation
            ),
        });
    }
    statements
}

fn render_block(
    model: &ProgramModel,
    plans: Vec<RegistrationPlan>,
    state: &PassState,
) -> RegistrationBlock {
    let mut referenced = vec![well_known::service_collection()];
    for plan in &plans {
        if let Some(descriptor) = model.get(&plan.owner) {
            referenced.push(descriptor.self_ref());
        }
        referenced.extend(plan.interfaces.iter().map(|e| e.interface.clone()));
    }
    let formatter = ScopedFormatter::new(&referenced);

    let mut statements = Vec::new();
    for plan in &plans {
        if let Some(descriptor) = model.get(&plan.owner) {
            statements.extend(render_plan(plan, descriptor, &formatter));
        }
    }

    let options = &state.options;
    let namespace = options.registration_namespace.clone().unwrap_or_default();
    let mut resolver = NamespaceResolver::new(namespace.clone());
    resolver
        .extend(&referenced)
        .add_namespace(well_known::DEPENDENCY_INJECTION_NAMESPACE);
    let imports = resolver.finish();

    let source = render_file(
        &namespace,
        &options.registration_class_name,
        &options.registration_method_name,
        &statements,
        &imports,
    );

    RegistrationBlock {
        plans,
        statements,
        imports,
        source,
    }
}

fn render_file(
    namespace: &str,
    class_name: &str,
    method_name: &str,
    statements: &[String],
    imports: &[String],
) -> String {
    let mut out = String::from("// <auto-generated/>\n");
    if !imports.is_empty() {
        out.push('\n');
        for import in imports {
            let _ = writeln!(out, "using {};", import);
        }
    }
    out.push('\n');

    let depth = if namespace.is_empty() {
        0
    } else {
        let _ = writeln!(out, "namespace {}\n{{", namespace);
        1
    };
    let pad = |level: usize| INDENT.repeat(level);

    let _ = writeln!(out, "{}public static class {}", pad(depth), class_name);
    let _ = writeln!(out, "{}{{", pad(depth));
    let _ = writeln!(
        out,
        "{}public static IServiceCollection {}(this IServiceCollection services)",
        pad(depth + 1),
        method_name
    );
    let _ = writeln!(out, "{}{{", pad(depth + 1));
    for statement in statements {
        let _ = writeln!(out, "{}{}", pad(depth + 2), statement);
    }
    let _ = writeln!(out, "{}return services;", pad(depth + 2));
    let _ = writeln!(out, "{}}}", pad(depth + 1));
    let _ = writeln!(out, "{}}}", pad(depth));

    if depth > 0 {
        out.push_str("}\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompilerOptions, SkipAssignableOptions};
    use crate::diagnostics::{CollectingDiagnosticHandler, DiagnosticHandler};
    use crate::model::RegistrationMode;
    use std::sync::Arc;

    fn run_with(
        model: &ProgramModel,
        options: CompilerOptions,
    ) -> (RegistrationBlock, Arc<CollectingDiagnosticHandler>) {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let policy = SkipAssignablePolicy::from_options(&options.skip_assignable).unwrap();
        let state = PassState::new(handler.clone(), options);
        let order: Vec<TypeKey> = model.keys().cloned().collect();
        (emit(model, &order, &policy, &state), handler)
    }

    fn run(model: &ProgramModel) -> (RegistrationBlock, Arc<CollectingDiagnosticHandler>) {
        run_with(model, CompilerOptions::default())
    }

    fn cache(sharing: InstanceSharing) -> TypeDescriptor {
        TypeDescriptor::new("App", "Cache")
            .with_lifetime(Lifetime::Singleton)
            .with_sharing(sharing)
            .with_interface(TypeRef::interface("App", "ICache"))
            .with_interface(TypeRef::interface("App", "IFlushable"))
    }

    #[test]
    fn test_shared_uses_factories() {
        let model = ProgramModel::new(vec![cache(InstanceSharing::Shared)]).unwrap();
        let (block, _) = run(&model);

        assert_eq!(
            block.statements,
            vec![
                "services.AddSingleton<Cache>();",
                "services.AddSingleton<ICache>(sp => sp.GetRequiredService<Cache>());",
                "services.AddSingleton<IFlushable>(sp => sp.GetRequiredService<Cache>());",
            ]
        );
    }

    #[test]
    fn test_separate_uses_direct_mappings() {
        let model = ProgramModel::new(vec![cache(InstanceSharing::Separate)]).unwrap();
        let (block, _) = run(&model);

        assert_eq!(
            block.statements,
            vec![
                "services.AddSingleton<Cache>();",
                "services.AddSingleton<ICache, Cache>();",
                "services.AddSingleton<IFlushable, Cache>();",
            ]
        );
        assert!(block.statements.iter().all(|s| !s.contains("GetRequiredService")));
    }

    #[test]
    fn test_modes_and_skip_list() {
        let model = ProgramModel::new(vec![
            cache(InstanceSharing::Separate).with_mode(RegistrationMode::DirectOnly),
            TypeDescriptor::new("App", "Store")
                .with_lifetime(Lifetime::Scoped)
                .with_mode(RegistrationMode::Exclusionary)
                .with_sharing(InstanceSharing::Separate)
                .with_interface(TypeRef::interface("App", "IStore"))
                .with_interface(TypeRef::interface("System", "IDisposable"))
                .skipping("IDisposable"),
        ])
        .unwrap();
        let (block, handler) = run(&model);

        assert_eq!(
            block.statements,
            vec![
                "services.AddSingleton<Cache>();",
                "services.AddScoped<Store>();",
                "services.AddScoped<IStore, Store>();",
            ]
        );
        assert!(handler.get_diagnostics().is_empty());
    }

    #[test]
    fn test_skipping_the_type_registers_interfaces_directly() {
        let model = ProgramModel::new(vec![cache(InstanceSharing::Shared).skipping("App.Cache")])
            .unwrap();
        let (block, _) = run(&model);

        assert_eq!(
            block.statements,
            vec![
                "services.AddSingleton<ICache, Cache>();",
                "services.AddSingleton<IFlushable, Cache>();",
            ]
        );
        assert!(!block.plans[0].concrete);
    }

    #[test]
    fn test_unknown_skip_entry_suggests_interface() {
        let model =
            ProgramModel::new(vec![cache(InstanceSharing::Shared).skipping("IChache")]).unwrap();
        let (_, handler) = run(&model);

        let warnings = handler.with_code(error_codes::UNKNOWN_SKIP_ENTRY);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].suggestions[0].replacement, "ICache");
    }

    #[test]
    fn test_open_generic_registrations() {
        let model = ProgramModel::new(vec![TypeDescriptor::new("App.Data", "Repository")
            .with_type_parameters(["T"])
            .with_lifetime(Lifetime::Scoped)
            .with_interface(
                TypeRef::interface("App.Data", "IRepository")
                    .with_args(vec![TypeRef::generic_parameter("T")]),
            )
            .with_interface(TypeRef::interface("System", "IDisposable"))])
        .unwrap();
        let (block, handler) = run(&model);

        assert_eq!(
            block.statements,
            vec![
                "services.AddScoped(typeof(Repository<>));",
                "services.AddScoped(typeof(IRepository<>), typeof(Repository<>));",
            ]
        );
        assert_eq!(handler.with_code(error_codes::SHARED_OPEN_GENERIC).len(), 1);
    }

    #[test]
    fn test_hosted_services() {
        let model = ProgramModel::new(vec![
            TypeDescriptor::new("App", "Poller").with_lifetime(Lifetime::ExternallyManaged),
            TypeDescriptor::new("App", "Worker")
                .with_lifetime(Lifetime::ExternallyManaged)
                .with_interface(TypeRef::interface("App", "IWorkerStatus")),
        ])
        .unwrap();
        let (block, _) = run(&model);

        assert_eq!(
            block.statements,
            vec![
                "services.AddHostedService<Poller>();",
                "services.AddSingleton<Worker>();",
                "services.AddHostedService(sp => sp.GetRequiredService<Worker>());",
                "services.AddSingleton<IWorkerStatus>(sp => sp.GetRequiredService<Worker>());",
            ]
        );
    }

    #[test]
    fn test_unregistered_abstract_and_suppressed_types_are_skipped() {
        let model = ProgramModel::new(vec![
            TypeDescriptor::new("App", "Plain"),
            TypeDescriptor::new("App", "Base")
                .abstract_type()
                .with_lifetime(Lifetime::Scoped),
            TypeDescriptor::new("App.Api", "OrdersController")
                .with_lifetime(Lifetime::Scoped)
                .with_base(TypeRef::class("Microsoft.AspNetCore.Mvc", "ControllerBase")),
        ])
        .unwrap();
        let (block, _) = run(&model);
        assert!(block.statements.is_empty());

        let mut options = CompilerOptions::default();
        options.skip_assignable = SkipAssignableOptions {
            exceptions: vec!["App.Api".to_string()],
            ..SkipAssignableOptions::default()
        };
        let (block, _) = run_with(&model, options);
        assert_eq!(block.statements, vec!["services.AddScoped<OrdersController>();"]);
    }

    #[test]
    fn test_ambiguous_names_are_qualified() {
        let model = ProgramModel::new(vec![
            TypeDescriptor::new("App.Orders", "Handler").with_lifetime(Lifetime::Transient),
            TypeDescriptor::new("App.Users", "Handler").with_lifetime(Lifetime::Transient),
        ])
        .unwrap();
        let (block, _) = run(&model);

        assert_eq!(
            block.statements,
            vec![
                "services.AddTransient<App.Orders.Handler>();",
                "services.AddTransient<App.Users.Handler>();",
            ]
        );
    }

    #[test]
    fn test_rendered_file() {
        let model = ProgramModel::new(vec![cache(InstanceSharing::Separate)
            .with_mode(RegistrationMode::DirectOnly)])
        .unwrap();
        let mut options = CompilerOptions::default();
        options.registration_namespace = Some("App.Startup".to_string());
        let (block, _) = run_with(&model, options);

        let expected = "// <auto-generated/>\n\
                        \n\
                        using App;\n\
                        using Microsoft.Extensions.DependencyInjection;\n\
                        \n\
                        namespace App.Startup\n\
                        {\n\
                        \x20   public static class GeneratedServiceRegistrations\n\
                        \x20   {\n\
                        \x20       public static IServiceCollection AddGeneratedServices(this IServiceCollection services)\n\
                        \x20       {\n\
                        \x20           services.AddSingleton<Cache>();\n\
                        \x20           return services;\n\
                        \x20       }\n\
                        \x20   }\n\
                        }\n";
        assert_eq!(block.source, expected);
    }
}
