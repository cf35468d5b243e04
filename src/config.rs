//! Processor configuration
//!
//! Loaded from `valuegen.yaml` (or `.json`). Every field has a default, so
//! an empty file is a valid configuration.

use crate::error::{Error, Result};
use crate::render::RenderConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Processor configuration (`valuegen.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessorConfig {
    /// Generated class naming
    #[serde(default)]
    pub naming: NamingConfig,

    /// Rendering of the classes the processor owns
    #[serde(default)]
    pub render: RenderOptions,

    /// Processor options handed to extensions uninterpreted
    #[serde(default)]
    pub options: BTreeMap<String, String>,

    /// Built-in extensions to run, in order
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// Naming convention for generated classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NamingConfig {
    /// Prefix of the terminal class name: `Value_` gives `Value_Outer_Inner`
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "Value_".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderOptions {
    /// Include a provenance header comment
    #[serde(default = "default_true")]
    pub provenance: bool,

    /// Annotate generated classes with `@Generated`
    #[serde(default = "default_true")]
    pub generated_annotation: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            provenance: true,
            generated_annotation: true,
        }
    }
}

impl ProcessorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_norway::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a `.json` file, or YAML otherwise
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_yaml(&content)?,
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), extensions = config.extensions.len(), "loaded config");
        Ok(config)
    }

    /// Reject settings that cannot produce valid class names
    pub fn validate(&self) -> Result<()> {
        validate_prefix("naming.prefix", &self.naming.prefix)
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            provenance: self.render.provenance,
            generated_annotation: self.render.generated_annotation,
            ..RenderConfig::default()
        }
    }
}

/// A class-name prefix must be non-empty, must not start with `$` (reserved
/// for chain links) and may hold only identifier characters
pub fn validate_prefix(setting: &str, prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(Error::Config(format!("{} must not be empty", setting)));
    }
    if prefix.starts_with('$') || !prefix.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::Config(format!(
            "{} must be a Java identifier fragment not starting with '$': {:?}",
            setting, prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ProcessorConfig::from_yaml("{}").unwrap();
        assert_eq!(config.naming.prefix, "Value_");
        assert!(config.render.provenance);
        assert!(config.render.generated_annotation);
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let config = ProcessorConfig::from_yaml(
            r#"
naming:
  prefix: Auto_
render:
  provenance: false
options:
  customAnnotation.customOption: "on"
extensions: [serializable, final-marker]
"#,
        )
        .unwrap();
        assert_eq!(config.naming.prefix, "Auto_");
        assert!(!config.render.provenance);
        assert!(config.render.generated_annotation);
        assert_eq!(config.options["customAnnotation.customOption"], "on");
        assert_eq!(config.extensions, vec!["serializable", "final-marker"]);
        assert!(!config.render_config().provenance);
    }

    #[test]
    fn test_invalid_prefix() {
        let mut config = ProcessorConfig::default();
        config.naming.prefix = "$Bad".into();
        assert!(config.validate().is_err());
        config.naming.prefix = String::new();
        assert!(config.validate().is_err());
        config.naming.prefix = "Ok_".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_prefix_error_names_setting() {
        let err = validate_prefix("valuegen.prefix", "").unwrap_err();
        assert_eq!(err.to_string(), "Config error: valuegen.prefix must not be empty");
        assert!(validate_prefix("valuegen.prefix", "Gen-").is_err());
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valuegen.json");
        std::fs::write(&path, r#"{"naming": {"prefix": "Gen_"}}"#).unwrap();
        let config = ProcessorConfig::load(&path).unwrap();
        assert_eq!(config.naming.prefix, "Gen_");
    }
}
