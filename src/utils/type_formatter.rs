//! Rendering of type references as target-language source text

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::TypeRef;

/// Render a reference with simple names: `List<User>`, `int[]`, `Settings?`
pub fn format_type(ty: &TypeRef) -> String {
    format_with(ty, &|_, name| name.to_string())
}

/// Render a reference with every named type namespace-qualified
pub fn format_qualified(ty: &TypeRef) -> String {
    format_with(ty, &|namespace, name| {
        if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", namespace, name)
        }
    })
}

/// Render a reference, choosing how each named type is spelled through `name_of(namespace, name)`
pub fn format_with(ty: &TypeRef, name_of: &dyn Fn(&str, &str) -> String) -> String {
    match ty {
        TypeRef::Primitive(primitive) => primitive.keyword().to_string(),
        TypeRef::GenericParameter(name) => name.clone(),
        TypeRef::Named {
            namespace,
            name,
            args,
            ..
        } => {
            let head = name_of(namespace, name);
            if args.is_empty() {
                head
            } else {
                let args: Vec<String> = args.iter().map(|a| format_with(a, name_of)).collect();
                format!("{}<{}>", head, args.join(", "))
            }
        }
        TypeRef::Array(element) => format!("{}[]", format_with(element, name_of)),
        TypeRef::Pointer(target) => format!("{}*", format_with(target, name_of)),
        TypeRef::Nullable(inner) => format!("{}?", format_with(inner, name_of)),
    }
}

/// Unbound generic form used with `typeof`: `Repository<>`, `Dictionary<,>`
pub fn format_open_generic(name: &str, arity: usize) -> String {
    if arity == 0 {
        name.to_string()
    } else {
        format!("{}<{}>", name, ",".repeat(arity - 1))
    }
}

/// Spells types with simple names, qualifying only names that two namespaces share
#[derive(Debug, Default, Clone)]
pub struct ScopedFormatter {
    ambiguous: FxHashSet<String>,
}

impl ScopedFormatter {
    pub fn new<'a>(types: impl IntoIterator<Item = &'a TypeRef>) -> Self {
        let mut seen: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
        for ty in types {
            collect_names(ty, &mut seen);
        }
        Self {
            ambiguous: seen
                .into_iter()
                .filter(|(_, namespaces)| namespaces.len() > 1)
                .map(|(name, _)| name)
                .collect(),
        }
    }

    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous.contains(name)
    }

    pub fn format(&self, ty: &TypeRef) -> String {
        format_with(ty, &|namespace, name| self.spell(namespace, name))
    }

    /// Spelling of a named type without generic arguments
    pub fn spell(&self, namespace: &str, name: &str) -> String {
        if self.is_ambiguous(name) && !namespace.is_empty() {
            format!("{}.{}", namespace, name)
        } else {
            name.to_string()
        }
    }
}

fn collect_names(ty: &TypeRef, seen: &mut FxHashMap<String, FxHashSet<String>>) {
    match ty {
        TypeRef::Named {
            namespace,
            name,
            args,
            ..
        } => {
            seen.entry(name.clone())
                .or_default()
                .insert(namespace.clone());
            for arg in args {
                collect_names(arg, seen);
            }
        }
        TypeRef::Array(inner) | TypeRef::Pointer(inner) | TypeRef::Nullable(inner) => {
            collect_names(inner, seen)
        }
        TypeRef::Primitive(_) | TypeRef::GenericParameter(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{well_known, Primitive};

    #[test]
    fn test_format_nested_generic() {
        let ty = TypeRef::class("System.Collections.Generic", "Dictionary").with_args(vec![
            TypeRef::primitive(Primitive::String),
            TypeRef::array(TypeRef::class("App", "User")),
        ]);
        assert_eq!(format_type(&ty), "Dictionary<string, User[]>");
        assert_eq!(
            format_qualified(&ty),
            "System.Collections.Generic.Dictionary<string, App.User[]>"
        );
    }

    #[test]
    fn test_format_indirections() {
        assert_eq!(
            format_type(&TypeRef::pointer(TypeRef::primitive(Primitive::Byte))),
            "byte*"
        );
        assert_eq!(
            format_type(&TypeRef::nullable(TypeRef::primitive(Primitive::Int))),
            "int?"
        );
        assert_eq!(
            format_type(&well_known::enumerable(TypeRef::generic_parameter("T"))),
            "IEnumerable<T>"
        );
    }

    #[test]
    fn test_format_open_generic() {
        assert_eq!(format_open_generic("Repository", 1), "Repository<>");
        assert_eq!(format_open_generic("Dictionary", 2), "Dictionary<,>");
        assert_eq!(format_open_generic("Cache", 0), "Cache");
    }

    #[test]
    fn test_scoped_formatter_qualifies_only_clashing_names() {
        let ours = TypeRef::class("App.Caching", "Options");
        let theirs = TypeRef::class("Vendor.Caching", "Options");
        let user = TypeRef::class("App", "User");
        let formatter = ScopedFormatter::new([&ours, &theirs, &user]);

        assert_eq!(formatter.format(&ours), "App.Caching.Options");
        assert_eq!(formatter.format(&theirs), "Vendor.Caching.Options");
        assert_eq!(formatter.format(&TypeRef::array(user)), "User[]");
    }
}
