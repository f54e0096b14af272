use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::well_known;

/// Built-in keyword types. These never need an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    String,
}

impl Primitive {
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Decimal => "decimal",
            Primitive::String => "string",
        }
    }
}

/// What a named type is declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedKind {
    #[default]
    Class,
    Struct,
    Enum,
    Interface,
}

/// A reference to a type as it appears in a member, base clause or interface list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeRef {
    Primitive(Primitive),
    Named {
        #[serde(default)]
        namespace: String,
        name: String,
        #[serde(default)]
        kind: NamedKind,
        #[serde(default)]
        args: Vec<TypeRef>,
    },
    Array(Box<TypeRef>),
    Pointer(Box<TypeRef>),
    Nullable(Box<TypeRef>),
    GenericParameter(String),
}

/// Identity of a declared type: namespace, simple name and generic arity.
///
/// `Repository<User>` and `Repository<T>` share the key `App.Repository`1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey {
    pub namespace: String,
    pub name: String,
    pub arity: usize,
}

impl TypeKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, arity: usize) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            arity,
        }
    }

    /// `Namespace.Name` without the arity suffix
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())?;
        if self.arity > 0 {
            write!(f, "`{}", self.arity)?;
        }
        Ok(())
    }
}

impl TypeRef {
    pub fn primitive(primitive: Primitive) -> Self {
        TypeRef::Primitive(primitive)
    }

    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::named(namespace, name, NamedKind::Class)
    }

    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::named(namespace, name, NamedKind::Interface)
    }

    pub fn structure(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::named(namespace, name, NamedKind::Struct)
    }

    pub fn enumeration(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::named(namespace, name, NamedKind::Enum)
    }

    pub fn named(namespace: impl Into<String>, name: impl Into<String>, kind: NamedKind) -> Self {
        TypeRef::Named {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            args: Vec::new(),
        }
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn pointer(target: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(target))
    }

    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::Nullable(Box::new(inner))
    }

    pub fn generic_parameter(name: impl Into<String>) -> Self {
        TypeRef::GenericParameter(name.into())
    }

    /// Attach generic arguments to a named reference. Other variants are returned unchanged.
    pub fn with_args(self, new_args: Vec<TypeRef>) -> Self {
        match self {
            TypeRef::Named {
                namespace,
                name,
                kind,
                ..
            } => TypeRef::Named {
                namespace,
                name,
                kind,
                args: new_args,
            },
            other => other,
        }
    }

    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            TypeRef::Named { namespace, .. } => Some(namespace),
            _ => None,
        }
    }

    pub fn generic_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// The type `T?` wraps, or the reference itself when it is not nullable
    pub fn strip_nullable(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner.strip_nullable(),
            other => other,
        }
    }

    /// Key of the declaration this reference names, if it names one
    pub fn definition_key(&self) -> Option<TypeKey> {
        match self {
            TypeRef::Named {
                namespace,
                name,
                args,
                ..
            } => Some(TypeKey::new(namespace.clone(), name.clone(), args.len())),
            _ => None,
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(
            self,
            TypeRef::Named {
                kind: NamedKind::Interface,
                ..
            }
        )
    }

    /// Whether any generic parameter appears anywhere in this reference
    pub fn is_open(&self) -> bool {
        match self {
            TypeRef::GenericParameter(_) => true,
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::is_open),
            TypeRef::Array(inner) | TypeRef::Pointer(inner) | TypeRef::Nullable(inner) => {
                inner.is_open()
            }
            TypeRef::Primitive(_) => false,
        }
    }

    /// Replace generic parameters according to `substitutions`
    pub fn substitute(&self, substitutions: &FxHashMap<String, TypeRef>) -> TypeRef {
        if substitutions.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::GenericParameter(name) => substitutions
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::Named {
                namespace,
                name,
                kind,
                args,
            } => TypeRef::Named {
                namespace: namespace.clone(),
                name: name.clone(),
                kind: *kind,
                args: args.iter().map(|a| a.substitute(substitutions)).collect(),
            },
            TypeRef::Array(inner) => TypeRef::Array(Box::new(inner.substitute(substitutions))),
            TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(inner.substitute(substitutions))),
            TypeRef::Nullable(inner) => {
                TypeRef::Nullable(Box::new(inner.substitute(substitutions)))
            }
            TypeRef::Primitive(_) => self.clone(),
        }
    }

    /// Options wrapper kind if this is `IOptions<T>`, `IOptionsSnapshot<T>` or `IOptionsMonitor<T>`
    pub fn options_kind(&self) -> Option<OptionsKind> {
        match self {
            TypeRef::Named {
                namespace,
                name,
                args,
                ..
            } if namespace == well_known::OPTIONS_NAMESPACE && args.len() == 1 => {
                OptionsKind::from_interface_name(name)
            }
            _ => None,
        }
    }

    /// Types bound from configuration with a single value lookup rather than a section bind
    pub fn is_value_like(&self) -> bool {
        match self {
            TypeRef::Primitive(_) => true,
            TypeRef::Named {
                kind: NamedKind::Struct | NamedKind::Enum,
                args,
                ..
            } => args.is_empty(),
            TypeRef::Nullable(inner) => inner.is_value_like(),
            _ => false,
        }
    }
}

/// Reload semantics of an options wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionsKind {
    Static,
    Snapshot,
    Monitor,
}

impl OptionsKind {
    pub fn interface_name(self) -> &'static str {
        match self {
            OptionsKind::Static => "IOptions",
            OptionsKind::Snapshot => "IOptionsSnapshot",
            OptionsKind::Monitor => "IOptionsMonitor",
        }
    }

    pub fn from_interface_name(name: &str) -> Option<Self> {
        match name {
            "IOptions" => Some(OptionsKind::Static),
            "IOptionsSnapshot" => Some(OptionsKind::Snapshot),
            "IOptionsMonitor" => Some(OptionsKind::Monitor),
            _ => None,
        }
    }

    /// Lifetime the host container registers this wrapper with
    pub fn container_lifetime(self) -> super::Lifetime {
        match self {
            OptionsKind::Static | OptionsKind::Monitor => super::Lifetime::Singleton,
            OptionsKind::Snapshot => super::Lifetime::Scoped,
        }
    }
}
