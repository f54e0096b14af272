//! Namespace resolution for generated files
//!
//! Computes the minimal `using` list for a set of type references: every namespace of every
//! named type reached through generic arguments, array elements, pointer and nullable targets,
//! minus the consuming type's own namespace and the global namespace.

use std::collections::BTreeSet;

use crate::model::TypeRef;

/// Union the namespace of every named type inside `ty` into `out`
pub fn collect_namespaces(ty: &TypeRef, out: &mut BTreeSet<String>) {
    match ty {
        TypeRef::Named {
            namespace, args, ..
        } => {
            out.insert(namespace.clone());
            for arg in args {
                collect_namespaces(arg, out);
            }
        }
        TypeRef::Array(inner) | TypeRef::Pointer(inner) | TypeRef::Nullable(inner) => {
            collect_namespaces(inner, out)
        }
        TypeRef::Primitive(_) | TypeRef::GenericParameter(_) => {}
    }
}

/// Accumulates imports for one consuming type
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    consuming_namespace: String,
    namespaces: BTreeSet<String>,
}

impl NamespaceResolver {
    pub fn new(consuming_namespace: impl Into<String>) -> Self {
        Self {
            consuming_namespace: consuming_namespace.into(),
            namespaces: BTreeSet::new(),
        }
    }

    pub fn add(&mut self, ty: &TypeRef) -> &mut Self {
        collect_namespaces(ty, &mut self.namespaces);
        self
    }

    pub fn extend<'a>(&mut self, types: impl IntoIterator<Item = &'a TypeRef>) -> &mut Self {
        for ty in types {
            self.add(ty);
        }
        self
    }

    /// Require a namespace that is not reachable through a type reference (extension methods)
    pub fn add_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespaces.insert(namespace.into());
        self
    }

    /// Sorted imports without the consuming namespace and the global namespace
    pub fn finish(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .filter(|ns| !ns.is_empty() && **ns != self.consuming_namespace)
            .cloned()
            .collect()
    }
}

/// Imports needed by `types` when referenced from `consuming_namespace`
pub fn resolve_imports<'a>(
    consuming_namespace: &str,
    types: impl IntoIterator<Item = &'a TypeRef>,
) -> Vec<String> {
    let mut resolver = NamespaceResolver::new(consuming_namespace);
    resolver.extend(types);
    resolver.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{well_known, Primitive};

    #[test]
    fn test_descends_into_generic_arguments() {
        let ty = TypeRef::class("System.Collections.Generic", "Dictionary").with_args(vec![
            TypeRef::primitive(Primitive::String),
            TypeRef::class("App.Domain", "Order"),
        ]);
        assert_eq!(
            resolve_imports("App.Services", [&ty]),
            vec!["App.Domain", "System.Collections.Generic"]
        );
    }

    #[test]
    fn test_descends_into_arrays_and_pointers() {
        let array = TypeRef::array(TypeRef::class("App.Domain", "Order"));
        let pointer = TypeRef::pointer(TypeRef::structure("App.Interop", "Handle"));
        let nullable = TypeRef::nullable(TypeRef::enumeration("App.Enums", "Mode"));
        assert_eq!(
            resolve_imports("App", [&array, &pointer, &nullable]),
            vec!["App.Domain", "App.Enums", "App.Interop"]
        );
    }

    #[test]
    fn test_removes_own_and_global_namespace() {
        let own = TypeRef::class("App.Services", "Clock");
        let global = TypeRef::class("", "GlobalThing");
        let other = well_known::configuration();
        let imports = resolve_imports("App.Services", [&own, &global, &other]);
        assert_eq!(imports, vec!["Microsoft.Extensions.Configuration"]);
    }

    #[test]
    fn test_deduplicates() {
        let a = TypeRef::class("App.Data", "Database");
        let b = well_known::enumerable(TypeRef::class("App.Data", "Migration"));
        let c = well_known::enumerable(TypeRef::class("App.Data", "Seed"));
        assert_eq!(
            resolve_imports("App", [&a, &b, &c]),
            vec!["App.Data", "System.Collections.Generic"]
        );
    }

    #[test]
    fn test_generic_parameters_need_no_import() {
        let ty = well_known::enumerable(TypeRef::generic_parameter("T"));
        let mut resolver = NamespaceResolver::new("App");
        resolver.add(&ty).add_namespace(well_known::LINQ_NAMESPACE);
        assert_eq!(
            resolver.finish(),
            vec!["System.Collections.Generic", "System.Linq"]
        );
    }
}
