//! Skip-assignable policy
//!
//! Types assignable to a framework base (controllers, pages, hubs, ...) are activated by their
//! framework and must not be registered. The effective skip set is the built-in defaults, plus
//! configured additions, minus configured removals. Exception globs restore registration and
//! always win.

use rustc_hash::FxHashSet;

use crate::config::SkipAssignableOptions;
use crate::errors::CompilationError;
use crate::model::{ProgramModel, TypeDescriptor, TypeKey, TypeRef};

/// Framework bases whose subclasses are never registered by default
pub const DEFAULT_SKIP_ASSIGNABLE: &[&str] = &[
    "Microsoft.AspNetCore.Mvc.ControllerBase",
    "Microsoft.AspNetCore.Mvc.Controller",
    "Microsoft.AspNetCore.Components.ComponentBase",
    "Microsoft.AspNetCore.Mvc.RazorPages.PageModel",
    "Microsoft.AspNetCore.SignalR.Hub",
];

#[derive(Debug, Clone)]
enum SkipEntry {
    Exact(String),
    Pattern(glob::Pattern),
}

impl SkipEntry {
    fn parse(entry: &str) -> Result<Self, CompilationError> {
        if entry.contains(|c: char| matches!(c, '*' | '?' | '[')) {
            glob::Pattern::new(entry)
                .map(SkipEntry::Pattern)
                .map_err(|e| {
                    CompilationError::ConfigError(format!("invalid glob '{}': {}", entry, e))
                })
        } else {
            Ok(SkipEntry::Exact(entry.to_string()))
        }
    }

    fn as_str(&self) -> &str {
        match self {
            SkipEntry::Exact(name) => name,
            SkipEntry::Pattern(pattern) => pattern.as_str(),
        }
    }

    fn matches(&self, full_name: &str) -> bool {
        match self {
            SkipEntry::Exact(name) => name == full_name,
            SkipEntry::Pattern(pattern) => pattern.matches(full_name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SkipAssignablePolicy {
    entries: Vec<SkipEntry>,
    exceptions: Vec<glob::Pattern>,
}

impl SkipAssignablePolicy {
    pub fn from_options(options: &SkipAssignableOptions) -> Result<Self, CompilationError> {
        let removed: FxHashSet<&str> = options.remove.iter().map(|r| r.trim()).collect();

        let defaults: &[&str] = if options.use_defaults {
            DEFAULT_SKIP_ASSIGNABLE
        } else {
            &[]
        };
        let mut seen = FxHashSet::default();
        let mut entries = Vec::new();
        for entry in defaults
            .iter()
            .copied()
            .chain(options.add.iter().map(|a| a.trim()))
        {
            if entry.is_empty() || removed.contains(entry) || !seen.insert(entry) {
                continue;
            }
            entries.push(SkipEntry::parse(entry)?);
        }

        let exceptions = options
            .exceptions
            .iter()
            .map(|e| {
                glob::Pattern::new(e.trim()).map_err(|err| {
                    CompilationError::ConfigError(format!("invalid glob '{}': {}", e, err))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            entries,
            exceptions,
        })
    }

    /// Entries of the effective skip set, in the order they were applied
    pub fn entries(&self) -> Vec<&str> {
        self.entries.iter().map(SkipEntry::as_str).collect()
    }

    /// Exception globs match the type's full name or its namespace
    pub fn is_exception(&self, descriptor: &TypeDescriptor) -> bool {
        let full_name = descriptor.full_name();
        self.exceptions
            .iter()
            .any(|p| p.matches(&full_name) || p.matches(&descriptor.namespace))
    }

    /// The skip entry `descriptor` is assignable to, unless an exception applies
    pub fn suppressing_entry(
        &self,
        model: &ProgramModel,
        descriptor: &TypeDescriptor,
    ) -> Option<String> {
        if self.entries.is_empty() || self.is_exception(descriptor) {
            return None;
        }
        assignable_names(model, descriptor)
            .into_iter()
            .find(|name| self.entries.iter().any(|e| e.matches(name)))
    }

    pub fn suppresses(&self, model: &ProgramModel, descriptor: &TypeDescriptor) -> bool {
        self.suppressing_entry(model, descriptor).is_some()
    }
}

fn ref_full_name(ty: &TypeRef) -> Option<String> {
    ty.definition_key().map(|key| key.full_name())
}

/// Full names of every base (model or external) and interface up the chain
pub fn assignable_names(model: &ProgramModel, descriptor: &TypeDescriptor) -> Vec<String> {
    let mut names = Vec::new();
    let mut visited: FxHashSet<TypeKey> = FxHashSet::default();
    let mut current = Some(descriptor);

    while let Some(ty) = current {
        if !visited.insert(ty.key()) {
            break;
        }
        names.extend(ty.interfaces.iter().filter_map(ref_full_name));
        current = match &ty.base {
            Some(base) => {
                names.extend(ref_full_name(base));
                model.resolve_ref(base)
            }
            None => None,
        };
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeDescriptor;

    fn controller_base() -> TypeRef {
        TypeRef::class("Microsoft.AspNetCore.Mvc", "ControllerBase")
    }

    fn options(add: &[&str], remove: &[&str], exceptions: &[&str]) -> SkipAssignableOptions {
        SkipAssignableOptions {
            use_defaults: true,
            add: add.iter().map(|s| s.to_string()).collect(),
            remove: remove.iter().map(|s| s.to_string()).collect(),
            exceptions: exceptions.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn model() -> ProgramModel {
        ProgramModel::new(vec![
            TypeDescriptor::new("App.Api", "ApiController").with_base(controller_base()),
            TypeDescriptor::new("App.Api", "OrdersController")
                .with_base(TypeRef::class("App.Api", "ApiController")),
            TypeDescriptor::new("App.Legacy", "LegacyHandler")
                .with_interface(TypeRef::interface("App.Legacy", "ILegacyHandler")),
            TypeDescriptor::new("App", "Cache"),
        ])
        .unwrap()
    }

    fn get<'a>(model: &'a ProgramModel, ns: &str, name: &str) -> &'a TypeDescriptor {
        model.get(&TypeKey::new(ns, name, 0)).unwrap()
    }

    #[test]
    fn test_defaults_suppress_through_base_chain() {
        let model = model();
        let policy = SkipAssignablePolicy::from_options(&options(&[], &[], &[])).unwrap();

        assert!(policy.suppresses(&model, get(&model, "App.Api", "OrdersController")));
        assert!(!policy.suppresses(&model, get(&model, "App", "Cache")));
        assert_eq!(
            policy
                .suppressing_entry(&model, get(&model, "App.Api", "ApiController"))
                .as_deref(),
            Some("Microsoft.AspNetCore.Mvc.ControllerBase")
        );
    }

    #[test]
    fn test_add_glob_matches_interfaces() {
        let model = model();
        let policy =
            SkipAssignablePolicy::from_options(&options(&["App.Legacy.I*"], &[], &[])).unwrap();

        assert!(policy.suppresses(&model, get(&model, "App.Legacy", "LegacyHandler")));
    }

    #[test]
    fn test_remove_restores_default_entry() {
        let model = model();
        let policy = SkipAssignablePolicy::from_options(&options(
            &[],
            &["Microsoft.AspNetCore.Mvc.ControllerBase"],
            &[],
        ))
        .unwrap();

        assert!(!policy.suppresses(&model, get(&model, "App.Api", "OrdersController")));
        assert_eq!(policy.entries().len(), DEFAULT_SKIP_ASSIGNABLE.len() - 1);
    }

    #[test]
    fn test_exceptions_always_win() {
        let model = model();
        let by_namespace =
            SkipAssignablePolicy::from_options(&options(&["*"], &[], &["App.Api"])).unwrap();
        assert!(!by_namespace.suppresses(&model, get(&model, "App.Api", "OrdersController")));

        let by_name =
            SkipAssignablePolicy::from_options(&options(&[], &[], &["*.Orders*"])).unwrap();
        assert!(!by_name.suppresses(&model, get(&model, "App.Api", "OrdersController")));
        assert!(by_name.suppresses(&model, get(&model, "App.Api", "ApiController")));
    }

    #[test]
    fn test_without_defaults_nothing_is_skipped() {
        let model = model();
        let mut opts = options(&[], &[], &[]);
        opts.use_defaults = false;
        let policy = SkipAssignablePolicy::from_options(&opts).unwrap();

        assert!(policy.entries().is_empty());
        assert!(!policy.suppresses(&model, get(&model, "App.Api", "OrdersController")));
    }
}
