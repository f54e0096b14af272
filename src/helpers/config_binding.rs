//! Configuration-binding inference
//!
//! Decides the section key a configuration-bound member reads and which binder call reads it.
//! Value-like targets (primitives, enums, structs) are read with a single value lookup; anything
//! with structure (arrays, generic collections, dictionaries, classes) is bound from a section.

use serde::{Deserialize, Serialize};

use crate::model::{ConfigKey, ConfigurationBinding, TypeRef};
use crate::utils::type_formatter::format_type;

/// Suffixes stripped from a bound type's name when inferring its section, checked in order
pub const SECTION_SUFFIXES: &[&str] = &["Configuration", "Settings", "Config"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingCall {
    /// `configuration.GetValue<T>("key")`
    Value,
    /// `configuration.GetSection("key").Get<T>()`
    Section,
}

/// Where the final key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySource {
    Explicit,
    InferredFromType,
    MemberNameFallback,
}

/// Problems found while choosing a key; generation still proceeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyIssue {
    /// Explicit key was empty or blank
    Empty,
    /// No type name to infer a section from
    Ambiguous,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedBinding {
    pub key: String,
    pub source: KeySource,
    pub call: BindingCall,
    pub target: TypeRef,
    pub default_value: Option<String>,
}

/// Section name for a type name with a known suffix removed: `DatabaseSettings` → `Database`
pub fn infer_section_name(type_name: &str) -> String {
    for suffix in SECTION_SUFFIXES {
        if let Some(stripped) = type_name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    type_name.to_string()
}

/// Type whose name a section can be inferred from, looking through `T?`
fn nameable_target(target: &TypeRef) -> Option<&str> {
    match target {
        TypeRef::Named { name, args, .. } if args.is_empty() => Some(name),
        TypeRef::Nullable(inner) => nameable_target(inner),
        _ => None,
    }
}

pub fn select_call(target: &TypeRef) -> BindingCall {
    if target.is_value_like() {
        BindingCall::Value
    } else {
        BindingCall::Section
    }
}

/// Resolve key and binder call for one member
pub fn resolve_binding(
    binding: &ConfigurationBinding,
    member_name: &str,
) -> (ResolvedBinding, Option<KeyIssue>) {
    let mut issue = None;

    let explicit = match &binding.key {
        ConfigKey::Explicit(key) if key.trim().is_empty() => {
            issue = Some(KeyIssue::Empty);
            None
        }
        ConfigKey::Explicit(key) => Some(key.clone()),
        ConfigKey::Inferred => None,
    };

    let (key, source) = match explicit {
        Some(key) => (key, KeySource::Explicit),
        None => match nameable_target(&binding.target) {
            Some(name) => (infer_section_name(name), KeySource::InferredFromType),
            None => {
                if issue.is_none() {
                    issue = Some(KeyIssue::Ambiguous);
                }
                (
                    member_name.trim_start_matches('_').to_string(),
                    KeySource::MemberNameFallback,
                )
            }
        },
    };

    (
        ResolvedBinding {
            key,
            source,
            call: select_call(&binding.target),
            target: binding.target.clone(),
            default_value: binding.default_value.clone(),
        },
        issue,
    )
}

fn quote(key: &str) -> String {
    let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Binder expression reading `binding` from the provider named `provider`
pub fn binding_expression(binding: &ResolvedBinding, provider: &str) -> String {
    render_binding(binding, provider, &format_type(&binding.target))
}

/// Same as [`binding_expression`] with the target type already rendered
pub fn render_binding(binding: &ResolvedBinding, provider: &str, target: &str) -> String {
    let key = quote(&binding.key);
    match (binding.call, &binding.default_value) {
        (BindingCall::Value, None) => format!("{}.GetValue<{}>({})", provider, target, key),
        (BindingCall::Value, Some(default)) => {
            format!("{}.GetValue<{}>({}, {})", provider, target, key, default)
        }
        (BindingCall::Section, None) => {
            format!("{}.GetSection({}).Get<{}>()", provider, key, target)
        }
        (BindingCall::Section, Some(default)) => format!(
            "{}.GetSection({}).Get<{}>() ?? {}",
            provider, key, target, default
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Primitive;

    fn binding(key: ConfigKey, target: TypeRef) -> ConfigurationBinding {
        ConfigurationBinding {
            key,
            target,
            default_value: None,
        }
    }

    #[test]
    fn test_infer_section_name_strips_suffixes() {
        assert_eq!(infer_section_name("DatabaseSettings"), "Database");
        assert_eq!(infer_section_name("SmtpConfig"), "Smtp");
        assert_eq!(infer_section_name("CacheConfiguration"), "Cache");
        assert_eq!(infer_section_name("Features"), "Features");
        assert_eq!(infer_section_name("Settings"), "Settings");
    }

    #[test]
    fn test_explicit_key_used_verbatim() {
        let (resolved, issue) = resolve_binding(
            &binding(
                ConfigKey::Explicit("Level1:Setting".to_string()),
                TypeRef::primitive(Primitive::String),
            ),
            "_setting",
        );
        assert_eq!(resolved.key, "Level1:Setting");
        assert_eq!(resolved.source, KeySource::Explicit);
        assert_eq!(resolved.call, BindingCall::Value);
        assert!(issue.is_none());
    }

    #[test]
    fn test_inferred_key_from_class() {
        let (resolved, issue) = resolve_binding(
            &binding(ConfigKey::Inferred, TypeRef::class("App", "DatabaseSettings")),
            "_db",
        );
        assert_eq!(resolved.key, "Database");
        assert_eq!(resolved.call, BindingCall::Section);
        assert!(issue.is_none());
    }

    #[test]
    fn test_empty_key_falls_back_to_inference() {
        let (resolved, issue) = resolve_binding(
            &binding(
                ConfigKey::Explicit("  ".to_string()),
                TypeRef::class("App", "MailConfig"),
            ),
            "_mail",
        );
        assert_eq!(resolved.key, "Mail");
        assert_eq!(issue, Some(KeyIssue::Empty));
    }

    #[test]
    fn test_primitive_inference_is_ambiguous() {
        let (resolved, issue) = resolve_binding(
            &binding(ConfigKey::Inferred, TypeRef::primitive(Primitive::Int)),
            "_retryCount",
        );
        assert_eq!(resolved.key, "retryCount");
        assert_eq!(resolved.source, KeySource::MemberNameFallback);
        assert_eq!(issue, Some(KeyIssue::Ambiguous));
    }

    #[test]
    fn test_binding_expressions() {
        let value = ResolvedBinding {
            key: "Http:Retries".to_string(),
            source: KeySource::Explicit,
            call: BindingCall::Value,
            target: TypeRef::primitive(Primitive::Int),
            default_value: Some("3".to_string()),
        };
        assert_eq!(
            binding_expression(&value, "configuration"),
            "configuration.GetValue<int>(\"Http:Retries\", 3)"
        );

        let list = TypeRef::class("System.Collections.Generic", "List")
            .with_args(vec![TypeRef::primitive(Primitive::String)]);
        let section = ResolvedBinding {
            key: "Cors:Origins".to_string(),
            source: KeySource::Explicit,
            call: select_call(&list),
            target: list,
            default_value: None,
        };
        assert_eq!(
            binding_expression(&section, "configuration"),
            "configuration.GetSection(\"Cors:Origins\").Get<List<string>>()"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
