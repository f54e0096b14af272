//! Dependency phase: hierarchical constructor resolution
//!
//! This phase handles:
//! - Resolving each type's own injectable members into constructor parameters
//! - Composing a derived type's parameters from its base's already-resolved plan
//! - Substituting generic arguments of closed generic bases
//! - Configuration-key inference and binding diagnostics
//! - Inheritance-cycle detection
//!
//! Plans are memoized in the pass state, so each type is resolved (and diagnosed) once.
//!
//! **Design Pattern**: Stateless phase functions that take explicit context parameters.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::diagnostics::{error_codes, Diagnostic, DiagnosticCode};
use crate::helpers::config_binding::{self, KeyIssue};
use crate::helpers::naming::{parameter_name, unique_name};
use crate::model::{
    well_known, InjectableMember, MemberShape, ProgramModel, TypeDescriptor, TypeKey, TypeRef,
};
use crate::plan::{
    AssignedValue, ConstructorParameter, MemberAssignment, Multiplicity, ParameterKind,
    ResolvedConstructorPlan,
};
use crate::state::PassState;

/// Resolve every type of the model, in declaration order
#[instrument(skip_all, fields(types = model.len()))]
pub fn resolve_all(model: &ProgramModel, state: &mut PassState) {
    for key in model.keys() {
        resolve(model, key, state);
    }
    debug!(plans = state.plans().len(), "Resolved constructor plans");
}

/// Resolve one type, resolving its base chain first. `None` for types outside the model.
pub fn resolve(
    model: &ProgramModel,
    key: &TypeKey,
    state: &mut PassState,
) -> Option<Arc<ResolvedConstructorPlan>> {
    if let Some(plan) = state.cached_plan(key) {
        return Some(plan);
    }
    let descriptor = model.get(key)?;

    state.push_resolving(key.clone());
    let base = resolve_base(model, descriptor, state);
    state.pop_resolving();

    let plan = build_plan(descriptor, base, state);
    debug!(
        ty = %key,
        parameters = plan.parameters.len(),
        inherited = plan.inherited_count,
        "Resolved constructor plan"
    );
    Some(state.cache_plan(plan))
}

/// Base plan with the base's generic parameters substituted by the arguments `descriptor` passes
struct BaseContext {
    plan: Arc<ResolvedConstructorPlan>,
    substitutions: FxHashMap<String, TypeRef>,
}

fn resolve_base(
    model: &ProgramModel,
    descriptor: &TypeDescriptor,
    state: &mut PassState,
) -> Option<BaseContext> {
    let base_ref = descriptor.base.as_ref()?;
    // Bases outside the model contribute no requirements
    let base = model.resolve_ref(base_ref)?;
    let base_key = base.key();

    if state.is_resolving(&base_key) {
        let cycle = state.resolving_from(&base_key);
        let names: Vec<String> = cycle.iter().map(|k| k.full_name()).collect();
        state.report(Diagnostic::coded(
            error_codes::INHERITANCE_CYCLE,
            cycle.clone(),
            format!(
                "Inheritance cycle: {} -> {}",
                names.join(" -> "),
                base_key.full_name()
            ),
        ));
        return None;
    }

    let plan = resolve(model, &base_key, state)?;
    let substitutions = base
        .type_parameters
        .iter()
        .cloned()
        .zip(base_ref.generic_args().iter().cloned())
        .collect();

    Some(BaseContext {
        plan,
        substitutions,
    })
}

fn substitute_parameter(
    param: &ConstructorParameter,
    substitutions: &FxHashMap<String, TypeRef>,
) -> ConstructorParameter {
    let kind = match &param.kind {
        ParameterKind::Service {
            provided,
            multiplicity,
        } => ParameterKind::Service {
            provided: provided.substitute(substitutions),
            multiplicity: *multiplicity,
        },
        ParameterKind::Factory { provided } => ParameterKind::Factory {
            provided: provided.substitute(substitutions),
        },
        ParameterKind::Options { kind, wrapped } => ParameterKind::Options {
            kind: *kind,
            wrapped: wrapped.substitute(substitutions),
        },
        ParameterKind::Configuration => ParameterKind::Configuration,
    };
    ConstructorParameter {
        name: param.name.clone(),
        ty: param.ty.substitute(substitutions),
        kind,
        declared_by: param.declared_by.clone(),
        member: param.member.clone(),
    }
}

/// Own-member resolution for one type
struct MemberResolver {
    owner: TypeKey,
    /// Preferred configuration parameter name, suffixed when a forwarded parameter holds it
    configuration_name: String,
    taken: FxHashSet<String>,
    parameters: Vec<ConstructorParameter>,
    assignments: Vec<MemberAssignment>,
    keys: Vec<String>,
    needs_configuration: bool,
    diagnostics: Vec<Diagnostic>,
}

impl MemberResolver {
    fn new(
        owner: TypeKey,
        preferred_configuration_name: &str,
        inherited: &[ConstructorParameter],
        reserve_configuration: bool,
    ) -> Self {
        let mut taken: FxHashSet<String> = inherited.iter().map(|p| p.name.clone()).collect();
        let configuration_name = unique_name(preferred_configuration_name, &taken);
        if reserve_configuration {
            taken.insert(configuration_name.clone());
        }
        Self {
            owner,
            configuration_name,
            taken,
            parameters: Vec::new(),
            assignments: Vec::new(),
            keys: Vec::new(),
            needs_configuration: false,
            diagnostics: Vec::new(),
        }
    }

    fn warn(&mut self, code: DiagnosticCode, message: String) {
        self.diagnostics
            .push(Diagnostic::coded(code, vec![self.owner.clone()], message));
    }

    fn add_parameter(
        &mut self,
        member: &InjectableMember,
        ty: TypeRef,
        kind: ParameterKind,
    ) -> String {
        let name = unique_name(&parameter_name(&member.name), &self.taken);
        self.taken.insert(name.clone());
        self.parameters.push(ConstructorParameter {
            name: name.clone(),
            ty,
            kind,
            declared_by: self.owner.clone(),
            member: Some(member.name.clone()),
        });
        name
    }

    fn assign(&mut self, member: &InjectableMember, value: AssignedValue) {
        self.assignments.push(MemberAssignment {
            member: member.name.clone(),
            value,
        });
    }

    fn resolve_member(&mut self, member: &InjectableMember) {
        if member.is_static {
            self.warn(
                error_codes::STATIC_MEMBER_IGNORED,
                format!("Static member '{}' is not injected", member.name),
            );
            return;
        }

        match &member.shape {
            MemberShape::Scalar(ty) if is_configuration_provider(ty) => {
                self.needs_configuration = true;
                let name = self.configuration_name.clone();
                self.assign(member, AssignedValue::Parameter(name));
            }
            MemberShape::Scalar(ty) => {
                let kind = match ty.options_kind() {
                    Some(kind) => ParameterKind::Options {
                        kind,
                        wrapped: ty.generic_args()[0].clone(),
                    },
                    None => ParameterKind::Service {
                        provided: ty.clone(),
                        multiplicity: Multiplicity::Single,
                    },
                };
                let name = self.add_parameter(member, ty.clone(), kind);
                self.assign(member, AssignedValue::Parameter(name));
            }
            MemberShape::Collection(element) | MemberShape::Array(element) => {
                let kind = ParameterKind::Service {
                    provided: element.clone(),
                    multiplicity: Multiplicity::Collection,
                };
                let name =
                    self.add_parameter(member, well_known::enumerable(element.clone()), kind);
                let value = if matches!(member.shape, MemberShape::Array(_)) {
                    AssignedValue::ArrayFromParameter(name)
                } else {
                    AssignedValue::Parameter(name)
                };
                self.assign(member, value);
            }
            MemberShape::Options { kind, wrapped } => {
                let ty = well_known::options(*kind, wrapped.clone());
                let param_kind = ParameterKind::Options {
                    kind: *kind,
                    wrapped: wrapped.clone(),
                };
                let name = self.add_parameter(member, ty, param_kind);
                self.assign(member, AssignedValue::Parameter(name));
            }
            MemberShape::Factory(ty) => {
                let kind = ParameterKind::Factory {
                    provided: ty.clone(),
                };
                let name = self.add_parameter(member, well_known::func(ty.clone()), kind);
                self.assign(member, AssignedValue::Parameter(name));
            }
            MemberShape::Configuration(binding) => {
                if let Some(kind) = binding.target.options_kind() {
                    self.warn(
                        error_codes::UNSUPPORTED_MEMBER_SHAPE,
                        format!(
                            "'{}' binds configuration to an options wrapper; injected as a service instead",
                            member.name
                        ),
                    );
                    let param_kind = ParameterKind::Options {
                        kind,
                        wrapped: binding.target.generic_args()[0].clone(),
                    };
                    let name = self.add_parameter(member, binding.target.clone(), param_kind);
                    self.assign(member, AssignedValue::Parameter(name));
                    return;
                }
                if binding.target.is_interface() {
                    self.warn(
                        error_codes::UNSUPPORTED_MEMBER_SHAPE,
                        format!(
                            "'{}' binds configuration to interface type; member skipped",
                            member.name
                        ),
                    );
                    return;
                }

                let (resolved, issue) = config_binding::resolve_binding(binding, &member.name);
                match issue {
                    Some(KeyIssue::Empty) => self.warn(
                        error_codes::EMPTY_BINDING_KEY,
                        format!(
                            "'{}' has an empty configuration key; using '{}'",
                            member.name, resolved.key
                        ),
                    ),
                    Some(KeyIssue::Ambiguous) => self.warn(
                        error_codes::AMBIGUOUS_BINDING_KEY,
                        format!(
                            "No section name can be inferred for '{}'; using '{}'",
                            member.name, resolved.key
                        ),
                    ),
                    None => {}
                }

                if self
                    .keys
                    .iter()
                    .any(|k| k.eq_ignore_ascii_case(&resolved.key))
                {
                    self.warn(
                        error_codes::DUPLICATE_BINDING_KEY,
                        format!(
                            "Configuration key '{}' is bound more than once ('{}')",
                            resolved.key, member.name
                        ),
                    );
                }
                self.keys.push(resolved.key.clone());
                self.needs_configuration = true;
                self.assign(member, AssignedValue::Binding(resolved));
            }
        }
    }
}

fn is_configuration_provider(ty: &TypeRef) -> bool {
    ty.definition_key() == well_known::configuration().definition_key()
}

/// Whether resolving `member` will read from the configuration parameter
fn reads_configuration(member: &InjectableMember) -> bool {
    !member.is_static
        && match &member.shape {
            MemberShape::Configuration(_) => true,
            MemberShape::Scalar(ty) => is_configuration_provider(ty),
            _ => false,
        }
}

fn build_plan(
    descriptor: &TypeDescriptor,
    base: Option<BaseContext>,
    state: &PassState,
) -> ResolvedConstructorPlan {
    let owner = descriptor.key();
    let configuration_name = state.options.configuration_parameter_name.as_str();

    let inherited: Vec<ConstructorParameter> = base
        .as_ref()
        .map(|b| {
            b.plan
                .forwardable_parameters()
                .iter()
                .map(|p| substitute_parameter(p, &b.substitutions))
                .collect()
        })
        .unwrap_or_default();
    let inherited_keys: Vec<String> = base
        .as_ref()
        .map(|b| {
            b.plan
                .inherited_keys
                .iter()
                .chain(&b.plan.own_keys)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let base_needs_configuration = base
        .as_ref()
        .map(|b| b.plan.needs_configuration())
        .unwrap_or(false);
    let reserve_configuration =
        base_needs_configuration || descriptor.members.iter().any(reads_configuration);

    let mut members = MemberResolver::new(
        owner.clone(),
        configuration_name,
        &inherited,
        reserve_configuration,
    );
    for member in &descriptor.members {
        members.resolve_member(member);
    }

    if state.options.detect_cross_level_key_conflicts {
        let conflicts: Vec<String> = members
            .keys
            .iter()
            .filter(|k| inherited_keys.iter().any(|i| i.eq_ignore_ascii_case(k)))
            .cloned()
            .collect();
        for key in conflicts {
            let mut diagnostic = Diagnostic::coded(
                error_codes::DUPLICATE_BINDING_KEY,
                vec![owner.clone()],
                format!("Configuration key '{}' is also bound by a base type", key),
            );
            if let Some(b) = &base {
                diagnostic = diagnostic.with_related(b.plan.owner.clone(), "Base type chain");
            }
            members.diagnostics.push(diagnostic);
        }
    }

    for diagnostic in members.diagnostics.drain(..) {
        state.report(diagnostic);
    }

    let inherited_count = inherited.len();
    let mut parameters = inherited;
    parameters.append(&mut members.parameters);
    if members.needs_configuration || base_needs_configuration {
        parameters.push(ConstructorParameter {
            name: members.configuration_name.clone(),
            ty: well_known::configuration(),
            kind: ParameterKind::Configuration,
            declared_by: owner.clone(),
            member: None,
        });
    }

    ResolvedConstructorPlan {
        owner,
        base: base.as_ref().map(|b| b.plan.owner.clone()),
        parameters,
        inherited_count,
        assignments: members.assignments,
        base_arguments: base.as_ref().map(|b| b.plan.parameter_names()),
        own_keys: members.keys,
        inherited_keys,
    }
}
