//! Derived, per-pass artifacts: resolved constructor plans, dependency edges and registration plans

use crate::helpers::config_binding::ResolvedBinding;
use crate::model::{Lifetime, OptionsKind, TypeKey, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    Single,
    Collection,
}

/// What a constructor parameter asks the container for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Service {
        provided: TypeRef,
        multiplicity: Multiplicity,
    },
    /// `Func<T>`: resolved on demand, never lifetime-checked
    Factory { provided: TypeRef },
    Options { kind: OptionsKind, wrapped: TypeRef },
    /// The single configuration-provider parameter
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructorParameter {
    pub name: String,
    pub ty: TypeRef,
    pub kind: ParameterKind,
    /// Type whose member introduced the parameter
    pub declared_by: TypeKey,
    pub member: Option<String>,
}

impl ConstructorParameter {
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ParameterKind::Configuration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssignedValue {
    Parameter(String),
    /// `parameter.ToArray()`
    ArrayFromParameter(String),
    Binding(ResolvedBinding),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberAssignment {
    pub member: String,
    pub value: AssignedValue,
}

/// Result of hierarchical resolution for one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConstructorPlan {
    pub owner: TypeKey,
    /// Base type inside the model, if any
    pub base: Option<TypeKey>,
    /// inherited ++ own ++ [configuration]
    pub parameters: Vec<ConstructorParameter>,
    pub inherited_count: usize,
    /// Own members only, declaration order
    pub assignments: Vec<MemberAssignment>,
    /// Arguments forwarded through `: base(...)`, `None` without a model base
    pub base_arguments: Option<Vec<String>>,
    /// Keys bound by this type's own members
    pub own_keys: Vec<String>,
    /// Keys bound anywhere up the base chain
    pub inherited_keys: Vec<String>,
}

impl ResolvedConstructorPlan {
    pub fn inherited_parameters(&self) -> &[ConstructorParameter] {
        &self.parameters[..self.inherited_count]
    }

    /// Own service parameters, without the trailing configuration parameter
    pub fn own_parameters(&self) -> &[ConstructorParameter] {
        let end = if self.needs_configuration() {
            self.parameters.len() - 1
        } else {
            self.parameters.len()
        };
        &self.parameters[self.inherited_count..end]
    }

    pub fn configuration_parameter(&self) -> Option<&ConstructorParameter> {
        self.parameters.last().filter(|p| p.is_configuration())
    }

    pub fn needs_configuration(&self) -> bool {
        self.configuration_parameter().is_some()
    }

    /// Parameters a derived type forwards: everything but the configuration parameter
    pub fn forwardable_parameters(&self) -> &[ConstructorParameter] {
        &self.parameters[..self.inherited_count + self.own_parameters().len()]
    }

    pub fn parameter_types(&self) -> Vec<TypeRef> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    /// Edges to every container-supplied service, inherited parameters included
    pub fn dependency_edges(&self) -> Vec<DependencyEdge> {
        self.parameters
            .iter()
            .enumerate()
            .filter_map(|(index, param)| {
                let (provided, multiplicity) = match &param.kind {
                    ParameterKind::Service {
                        provided,
                        multiplicity,
                    } => (provided.clone(), *multiplicity),
                    ParameterKind::Options { .. } => (param.ty.clone(), Multiplicity::Single),
                    ParameterKind::Factory { .. } | ParameterKind::Configuration => return None,
                };
                Some(DependencyEdge {
                    consumer: self.owner.clone(),
                    provided,
                    multiplicity,
                    member: param.member.clone(),
                    inherited: index < self.inherited_count,
                })
            })
            .collect()
    }
}

/// consumer → provided service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub consumer: TypeKey,
    pub provided: TypeRef,
    pub multiplicity: Multiplicity,
    pub member: Option<String>,
    pub inherited: bool,
}

/// Generated constructor for one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedConstructor {
    pub owner: TypeKey,
    pub signature: String,
    pub body: String,
    pub imports: Vec<String>,
    /// Complete source file: header, imports, namespace and partial type
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceEntryKind {
    /// `AddX<IService, Impl>()`
    Direct,
    /// `AddX<IService>(sp => sp.GetRequiredService<Impl>())`
    Factory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub interface: TypeRef,
    pub kind: InterfaceEntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPlan {
    pub owner: TypeKey,
    pub lifetime: Lifetime,
    pub open_generic: bool,
    /// Whether the concrete type itself is registered
    pub concrete: bool,
    pub interfaces: Vec<InterfaceEntry>,
}

/// The emitted registration block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationBlock {
    pub plans: Vec<RegistrationPlan>,
    /// One line per registration, in emission order
    pub statements: Vec<String>,
    pub imports: Vec<String>,
    /// Complete source file with the extension class
    pub source: String,
}
