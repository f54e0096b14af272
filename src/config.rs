use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::CompilationError;

/// Skip-assignable policy knobs
///
/// The effective skip set is built as: built-in defaults (when `use_defaults`), plus `add`,
/// minus `remove`. `exceptions` are matched against the candidate type itself and always win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipAssignableOptions {
    /// Start from the built-in framework base types (default: true)
    #[serde(default = "default_true")]
    pub use_defaults: bool,

    /// Extra base types or glob patterns to suppress
    #[serde(default)]
    pub add: Vec<String>,

    /// Entries removed from the skip set (exact match)
    #[serde(default)]
    pub remove: Vec<String>,

    /// Type-name or namespace globs that are registered even when assignable
    #[serde(default)]
    pub exceptions: Vec<String>,
}

impl Default for SkipAssignableOptions {
    fn default() -> Self {
        Self {
            use_defaults: true,
            add: Vec::new(),
            remove: Vec::new(),
            exceptions: Vec::new(),
        }
    }
}

/// Options that control constructor synthesis and registration emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default)]
    pub skip_assignable: SkipAssignableOptions,

    /// Namespace of the generated registration class (default: global namespace)
    #[serde(default)]
    pub registration_namespace: Option<String>,

    /// Name of the generated static registration class
    #[serde(default = "default_registration_class")]
    pub registration_class_name: String,

    /// Name of the generated `IServiceCollection` extension method
    #[serde(default = "default_registration_method")]
    pub registration_method_name: String,

    /// Identifier of the single configuration-provider parameter
    #[serde(default = "default_configuration_parameter")]
    pub configuration_parameter_name: String,

    /// Report identical configuration keys bound at two inheritance levels (default: false)
    #[serde(default)]
    pub detect_cross_level_key_conflicts: bool,

    /// Pretty-print diagnostics (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

fn default_registration_class() -> String {
    "GeneratedServiceRegistrations".to_string()
}

fn default_registration_method() -> String {
    "AddGeneratedServices".to_string()
}

fn default_configuration_parameter() -> String {
    "configuration".to_string()
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            skip_assignable: SkipAssignableOptions::default(),
            registration_namespace: None,
            registration_class_name: default_registration_class(),
            registration_method_name: default_registration_method(),
            configuration_parameter_name: default_configuration_parameter(),
            detect_cross_level_key_conflicts: false,
            pretty: true,
        }
    }
}

impl CompilerOptions {
    /// Check option values that would produce unusable generated code
    pub fn validate(&self) -> Result<(), CompilationError> {
        for (field, value) in [
            ("registrationClassName", &self.registration_class_name),
            ("registrationMethodName", &self.registration_method_name),
            (
                "configurationParameterName",
                &self.configuration_parameter_name,
            ),
        ] {
            if !is_identifier(value) {
                return Err(CompilationError::ConfigError(format!(
                    "{} must be a valid identifier, found '{}'",
                    field, value
                )));
            }
        }
        for pattern in self
            .skip_assignable
            .add
            .iter()
            .chain(&self.skip_assignable.exceptions)
        {
            glob::Pattern::new(pattern).map_err(|e| {
                CompilationError::ConfigError(format!("invalid glob '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Main compiler configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

impl CompilerConfig {
    /// Load configuration from a YAML file (autowire.config.yaml)
    pub fn from_file(path: &Path) -> Result<Self, CompilationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CompilationError> {
        let config: CompilerConfig = serde_yaml::from_str(content)
            .map_err(|e| CompilationError::ConfigError(e.to_string()))?;
        config.compiler_options.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, CompilationError> {
        serde_yaml::to_string(self).map_err(|e| CompilationError::ConfigError(e.to_string()))
    }

    /// Create a default configuration and write it to `path`
    pub fn init_file(path: &Path) -> Result<(), CompilationError> {
        std::fs::write(path, CompilerConfig::default().to_yaml()?)?;
        Ok(())
    }
}
