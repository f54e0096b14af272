//! Constructor phase: constructor text synthesis
//!
//! This phase handles:
//! - Structural checks (extensibility marker, clashing hand-written constructors)
//! - Rendering the signature, base-constructor call and member assignments of a resolved plan
//! - Building the complete generated file with its `using` list
//!
//! **Design Pattern**: Stateless phase functions that take explicit context parameters.

use std::fmt::Write as _;

use tracing::{debug, instrument};

use crate::diagnostics::{error_codes, Diagnostic};
use crate::helpers::config_binding::render_binding;
use crate::model::{well_known, ProgramModel, TypeDescriptor, TypeRef};
use crate::namespace_resolver::NamespaceResolver;
use crate::plan::{AssignedValue, ResolvedConstructorPlan, SynthesizedConstructor};
use crate::state::PassState;
use crate::utils::type_formatter::{format_qualified, ScopedFormatter};

const INDENT: &str = "    ";

/// Synthesize constructors for every resolved type, in declaration order
#[instrument(skip_all, fields(types = model.len()))]
pub fn synthesize_all(model: &ProgramModel, state: &PassState) -> Vec<SynthesizedConstructor> {
    let mut constructors = Vec::new();
    for descriptor in model.iter() {
        let Some(plan) = state.plan(&descriptor.key()) else {
            continue;
        };
        let generated = synthesize(descriptor, plan, state);
        state.metrics.record_constructor(generated.is_some());
        constructors.extend(generated);
    }
    debug!(generated = constructors.len(), "Synthesized constructors");
    constructors
}

/// Render one type's constructor, or report why none can be generated
pub fn synthesize(
    descriptor: &TypeDescriptor,
    plan: &ResolvedConstructorPlan,
    state: &PassState,
) -> Option<SynthesizedConstructor> {
    let key = descriptor.key();

    if !descriptor.is_partial {
        state.report(Diagnostic::coded(
            error_codes::INVALID_GENERATION_TARGET,
            vec![key],
            format!(
                "'{}' must be declared partial to receive a generated constructor",
                descriptor.display_name()
            ),
        ));
        return None;
    }

    let generated: Vec<String> = plan
        .parameters
        .iter()
        .map(|p| format_qualified(&p.ty))
        .collect();
    let conflicts = descriptor.declared_constructors.iter().any(|declared| {
        declared.iter().map(format_qualified).collect::<Vec<_>>() == generated
    });
    if conflicts {
        state.report(Diagnostic::coded(
            error_codes::CONFLICTING_CONSTRUCTOR,
            vec![key],
            format!(
                "'{}' already declares a constructor with the generated signature; generation skipped",
                descriptor.display_name()
            ),
        ));
        return None;
    }

    let self_ref = descriptor.self_ref();
    let formatter = ScopedFormatter::new(
        plan.parameters
            .iter()
            .map(|p| &p.ty)
            .chain(binding_targets(plan))
            .chain(std::iter::once(&self_ref)),
    );

    let signature = render_signature(descriptor, plan, &formatter);
    let body = render_body(plan, state, &formatter);
    let imports = collect_imports(descriptor, plan);
    let source = render_file(descriptor, &signature, &body, &imports);

    Some(SynthesizedConstructor {
        owner: key,
        signature,
        body,
        imports,
        source,
    })
}

fn binding_targets(plan: &ResolvedConstructorPlan) -> impl Iterator<Item = &TypeRef> {
    plan.assignments.iter().filter_map(|a| match &a.value {
        AssignedValue::Binding(binding) => Some(&binding.target),
        _ => None,
    })
}

/// `public Name(T1 a, T2 b) : base(a)`
fn render_signature(
    descriptor: &TypeDescriptor,
    plan: &ResolvedConstructorPlan,
    formatter: &ScopedFormatter,
) -> String {
    let visibility = if descriptor.is_abstract {
        "protected"
    } else {
        "public"
    };
    let parameters: Vec<String> = plan
        .parameters
        .iter()
        .map(|p| format!("{} {}", formatter.format(&p.ty), p.name))
        .collect();

    let mut signature = format!(
        "{} {}({})",
        visibility,
        descriptor.name,
        parameters.join(", ")
    );
    if let Some(arguments) = &plan.base_arguments {
        let _ = write!(signature, " : base({})", arguments.join(", "));
    }
    signature
}

/// One assignment statement per own member, declaration order
fn render_body(
    plan: &ResolvedConstructorPlan,
    state: &PassState,
    formatter: &ScopedFormatter,
) -> String {
    let provider = plan
        .configuration_parameter()
        .map(|p| p.name.as_str())
        .unwrap_or(state.options.configuration_parameter_name.as_str());
    let mut body = String::new();
    for assignment in &plan.assignments {
        let value = match &assignment.value {
            AssignedValue::Parameter(name) => name.clone(),
            AssignedValue::ArrayFromParameter(name) => format!("{}.ToArray()", name),
            AssignedValue::Binding(binding) => {
                render_binding(binding, provider, &formatter.format(&binding.target))
            }
        };
        let _ = writeln!(body, "this.{} = {};", assignment.member, value);
    }
    body
}

fn collect_imports(descriptor: &TypeDescriptor, plan: &ResolvedConstructorPlan) -> Vec<String> {
    let mut resolver = NamespaceResolver::new(descriptor.namespace.clone());
    resolver.extend(plan.parameters.iter().map(|p| &p.ty));
    resolver.extend(binding_targets(plan));
    if plan
        .assignments
        .iter()
        .any(|a| matches!(a.value, AssignedValue::ArrayFromParameter(_)))
    {
        resolver.add_namespace(well_known::LINQ_NAMESPACE);
    }
    resolver.finish()
}

/// Complete generated file for one type
fn render_file(
    descriptor: &TypeDescriptor,
    signature: &str,
    body: &str,
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

    let depth = if descriptor.namespace.is_empty() {
        0
    } else {
        let _ = writeln!(out, "namespace {}\n{{", descriptor.namespace);
        1
    };
    let pad = |level: usize| INDENT.repeat(level);

    let _ = writeln!(out, "{}partial class {}", pad(depth), descriptor.display_name());
    let _ = writeln!(out, "{}{{", pad(depth));
    let _ = writeln!(out, "{}{}", pad(depth + 1), signature);
    let _ = writeln!(out, "{}{{", pad(depth + 1));
    for line in body.lines() {
        let _ = writeln!(out, "{}{}", pad(depth + 2), line);
    }
    let _ = writeln!(out, "{}}}", pad(depth + 1));
    let _ = writeln!(out, "{}}}", pad(depth));

    if depth > 0 {
        out.push_str("}\n");
    }
    out
}
