use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{well_known, NamedKind, OptionsKind, TypeKey, TypeRef};
use crate::utils::type_formatter::{format_qualified, format_type};

/// Declared service lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lifetime {
    /// Not registered with the container
    #[default]
    None,
    Singleton,
    Scoped,
    Transient,
    /// Activated by the host as a long-running process
    ExternallyManaged,
}

impl Lifetime {
    pub fn is_declared(self) -> bool {
        !matches!(self, Lifetime::None)
    }

    /// Registration method used for this lifetime
    pub fn add_method(self) -> Option<&'static str> {
        match self {
            Lifetime::Singleton => Some("AddSingleton"),
            Lifetime::Scoped => Some("AddScoped"),
            Lifetime::Transient => Some("AddTransient"),
            Lifetime::ExternallyManaged => Some("AddHostedService"),
            Lifetime::None => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lifetime::None => "none",
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
            Lifetime::ExternallyManaged => "externally managed",
        }
    }
}

/// Which implemented interfaces receive registrations
///
/// The explicit skip list applies in every mode, so `All` and `Exclusionary` register the same
/// set. `Exclusionary` is accepted so metadata can state that a skip list is intended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationMode {
    /// Every interface not on the skip list
    #[default]
    All,
    /// Alias of `All`
    Exclusionary,
    /// The concrete type only
    DirectOnly,
}

/// Whether interface registrations share the concrete instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceSharing {
    #[default]
    Shared,
    Separate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPolicy {
    #[serde(default)]
    pub mode: RegistrationMode,
    #[serde(default)]
    pub sharing: InstanceSharing,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigKey {
    Explicit(String),
    /// Section name derived from the bound type's name
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationBinding {
    pub key: ConfigKey,
    pub target: TypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

/// Resolved shape of an injectable member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberShape {
    Scalar(TypeRef),
    Collection(TypeRef),
    Array(TypeRef),
    Options { kind: OptionsKind, wrapped: TypeRef },
    Configuration(ConfigurationBinding),
    /// `Func<T>` resolved lazily from the container
    Factory(TypeRef),
}

impl MemberShape {
    /// Declared type of the member itself
    pub fn member_type(&self) -> TypeRef {
        match self {
            MemberShape::Scalar(ty) => ty.clone(),
            MemberShape::Collection(element) => well_known::enumerable(element.clone()),
            MemberShape::Array(element) => TypeRef::array(element.clone()),
            MemberShape::Options { kind, wrapped } => well_known::options(*kind, wrapped.clone()),
            MemberShape::Configuration(binding) => binding.target.clone(),
            MemberShape::Factory(ty) => well_known::func(ty.clone()),
        }
    }

    /// Type requested from the container, `None` for configuration-bound members
    pub fn parameter_type(&self) -> Option<TypeRef> {
        match self {
            MemberShape::Scalar(ty) => Some(ty.clone()),
            MemberShape::Collection(element) | MemberShape::Array(element) => {
                Some(well_known::enumerable(element.clone()))
            }
            MemberShape::Options { kind, wrapped } => {
                Some(well_known::options(*kind, wrapped.clone()))
            }
            MemberShape::Factory(ty) => Some(well_known::func(ty.clone())),
            MemberShape::Configuration(_) => None,
        }
    }
}

/// A field or property marked for automatic binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectableMember {
    pub name: String,
    pub shape: MemberShape,
    #[serde(default)]
    pub is_static: bool,
}

impl InjectableMember {
    pub fn new(name: impl Into<String>, shape: MemberShape) -> Self {
        Self {
            name: name.into(),
            shape,
            is_static: false,
        }
    }

    pub fn service(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, MemberShape::Scalar(ty))
    }

    pub fn collection(name: impl Into<String>, element: TypeRef) -> Self {
        Self::new(name, MemberShape::Collection(element))
    }

    pub fn array(name: impl Into<String>, element: TypeRef) -> Self {
        Self::new(name, MemberShape::Array(element))
    }

    pub fn options(name: impl Into<String>, kind: OptionsKind, wrapped: TypeRef) -> Self {
        Self::new(name, MemberShape::Options { kind, wrapped })
    }

    pub fn factory(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, MemberShape::Factory(ty))
    }

    pub fn configuration(name: impl Into<String>, key: impl Into<String>, target: TypeRef) -> Self {
        Self::new(
            name,
            MemberShape::Configuration(ConfigurationBinding {
                key: ConfigKey::Explicit(key.into()),
                target,
                default_value: None,
            }),
        )
    }

    pub fn inferred_configuration(name: impl Into<String>, target: TypeRef) -> Self {
        Self::new(
            name,
            MemberShape::Configuration(ConfigurationBinding {
                key: ConfigKey::Inferred,
                target,
                default_value: None,
            }),
        )
    }

    /// Set the fallback expression of a configuration binding. No effect on other shapes.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        if let MemberShape::Configuration(binding) = &mut self.shape {
            binding.default_value = Some(default.into());
        }
        self
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Normalized metadata for one declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub lifetime: Lifetime,
    #[serde(default)]
    pub registration: RegistrationPolicy,
    /// Interface or type names never registered for this type
    #[serde(default)]
    pub skip: BTreeSet<String>,
    /// Directly implemented and inherited interfaces
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub members: Vec<InjectableMember>,
    /// Carries the extensibility marker that allows generated members
    #[serde(default = "default_true")]
    pub is_partial: bool,
    #[serde(default)]
    pub is_abstract: bool,
    /// Parameter type lists of hand-written constructors
    #[serde(default)]
    pub declared_constructors: Vec<Vec<TypeRef>>,
}

impl TypeDescriptor {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            type_parameters: Vec::new(),
            base: None,
            lifetime: Lifetime::None,
            registration: RegistrationPolicy::default(),
            skip: BTreeSet::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            is_partial: true,
            is_abstract: false,
            declared_constructors: Vec::new(),
        }
    }

    pub fn key(&self) -> TypeKey {
        TypeKey::new(
            self.namespace.clone(),
            self.name.clone(),
            self.type_parameters.len(),
        )
    }

    pub fn full_name(&self) -> String {
        self.key().full_name()
    }

    /// Name with type parameters, e.g. `Repository<T>`
    pub fn display_name(&self) -> String {
        if self.type_parameters.is_empty() {
            self.name.clone()
        } else {
            format!("{}<{}>", self.name, self.type_parameters.join(", "))
        }
    }

    pub fn is_open_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }

    /// Reference to this type parameterized by its own type parameters
    pub fn self_ref(&self) -> TypeRef {
        TypeRef::named(self.namespace.clone(), self.name.clone(), NamedKind::Class).with_args(
            self.type_parameters
                .iter()
                .map(|p| TypeRef::generic_parameter(p.clone()))
                .collect(),
        )
    }

    /// Whether a skip entry names `ty`: simple name, full name, or rendered with its arguments
    pub fn skips(&self, ty: &TypeRef) -> bool {
        self.skip.iter().any(|entry| skip_entry_names(entry, ty))
    }

    /// Skip list names the type itself: only its interfaces may be registered
    pub fn skips_self(&self) -> bool {
        self.skips(&self.self_ref())
    }

    /// Interfaces that receive registrations under the registration mode and skip list
    pub fn registered_interfaces(&self) -> Vec<&TypeRef> {
        match self.registration.mode {
            RegistrationMode::DirectOnly => Vec::new(),
            RegistrationMode::All | RegistrationMode::Exclusionary => self
                .interfaces
                .iter()
                .filter(|interface| !self.skips(interface))
                .collect(),
        }
    }

    pub fn with_type_parameters<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_parameters = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_mode(mut self, mode: RegistrationMode) -> Self {
        self.registration.mode = mode;
        self
    }

    pub fn with_sharing(mut self, sharing: InstanceSharing) -> Self {
        self.registration.sharing = sharing;
        self
    }

    pub fn skipping(mut self, name: impl Into<String>) -> Self {
        self.skip.insert(name.into());
        self
    }

    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_member(mut self, member: InjectableMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_constructor(mut self, parameter_types: Vec<TypeRef>) -> Self {
        self.declared_constructors.push(parameter_types);
        self
    }

    pub fn not_partial(mut self) -> Self {
        self.is_partial = false;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

pub(crate) fn skip_entry_names(entry: &str, ty: &TypeRef) -> bool {
    let entry = entry.trim();
    match ty {
        TypeRef::Named {
            namespace, name, ..
        } => {
            entry == name
                || (!namespace.is_empty() && entry == format!("{}.{}", namespace, name))
                || entry == format_type(ty)
                || entry == format_qualified(ty)
        }
        _ => false,
    }
}
