//! Binding files.
//!
//! A binding file declares, per logical entity, the query keys to keep in
//! sync and the shape of their cached values:
//!
//! ```toml
//! [[binding]]
//! name = "todos"
//! keys = [["todos"], ["todos", { status = "open" }]]
//! paginated = true
//! data_path = ["data"]
//! identity_fields = ["id", "_id"]
//! delete_count = "always"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::config::{CacheManagerConfig, DeleteCountPolicy};
use crate::error::ConfigError;
use crate::key::{KeySet, QueryKey};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingsFile {
    #[serde(rename = "binding", default)]
    pub bindings: Vec<BindingSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingSettings {
    pub name: String,
    pub keys: Vec<QueryKey>,
    #[serde(default = "default_paginated")]
    pub paginated: bool,
    #[serde(default)]
    pub data_path: Vec<String>,
    #[serde(default = "default_identity_fields")]
    pub identity_fields: Vec<String>,
    #[serde(default)]
    pub delete_count: DeleteCountPolicy,
}

fn default_paginated() -> bool {
    true
}

fn default_identity_fields() -> Vec<String> {
    vec!["id".to_string(), "_id".to_string()]
}

impl BindingsFile {
    /// Read, parse and validate a binding file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate binding TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: BindingsFile = toml::from_str(contents)?;
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bindings.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "binding".to_string(),
                reason: "at least one binding is required".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for binding in &self.bindings {
            binding.validate()?;
            if !seen.insert(binding.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "binding.name".to_string(),
                    reason: format!("duplicate binding name '{}'", binding.name),
                });
            }
        }
        Ok(())
    }

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Result<&BindingSettings, ConfigError> {
        self.bindings
            .iter()
            .find(|binding| binding.name == name)
            .ok_or_else(|| ConfigError::UnknownBinding {
                name: name.to_string(),
            })
    }
}

impl BindingSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = |name: &str| format!("binding.{}.{}", self.name, name);

        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "binding.name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.keys.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field("keys"),
                reason: "must contain at least one key".to_string(),
            });
        }
        if self.data_path.iter().any(|segment| segment.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: field("data_path"),
                reason: "segments must not be empty".to_string(),
            });
        }
        if self.identity_fields.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field("identity_fields"),
                reason: "must name at least one field".to_string(),
            });
        }
        if self.identity_fields.iter().any(|name| name.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: field("identity_fields"),
                reason: "field names must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_manager_config(&self) -> CacheManagerConfig {
        CacheManagerConfig::new(self.keys.iter().cloned().collect::<KeySet>())
            .with_paginated(self.paginated)
            .with_data_path(self.data_path.clone())
            .with_identity_fields(self.identity_fields.iter().cloned())
            .with_delete_count_policy(self.delete_count)
    }

    pub fn keys(&self) -> &[QueryKey] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ItemKey;
    use crate::value::CacheValue;
    use serde_json::json;
    use std::io::Write;

    const FULL: &str = r#"
[[binding]]
name = "todos"
keys = [["todos"], ["todos", { status = "open" }]]
paginated = true
data_path = ["data"]
identity_fields = ["uuid"]
delete_count = "on_removal"

[[binding]]
name = "profile"
keys = [["me"]]
paginated = false
"#;

    fn invalid_field(err: ConfigError) -> String {
        match err {
            ConfigError::InvalidValue { field, .. } => field,
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_file() {
        let file = BindingsFile::from_toml_str(FULL).unwrap();
        assert_eq!(file.bindings.len(), 2);

        let todos = file.get("todos").unwrap();
        assert_eq!(
            todos.keys()[1],
            QueryKey::from_json(json!(["todos", {"status": "open"}]))
        );
        let config = todos.to_manager_config();
        assert!(config.is_paginated());
        assert_eq!(config.data_path().segments(), ["data"]);
        assert_eq!(config.delete_count_policy(), DeleteCountPolicy::OnRemoval);
        assert_eq!(
            config
                .identity()
                .extract(&CacheValue::from(json!({"id": 1, "uuid": "u"}))),
            Some(ItemKey::from("u"))
        );
    }

    #[test]
    fn test_optional_fields_default() {
        let file = BindingsFile::from_toml_str(FULL).unwrap();
        let profile = file.get("profile").unwrap();
        assert!(!profile.paginated);
        assert!(profile.data_path.is_empty());
        assert_eq!(profile.identity_fields, vec!["id", "_id"]);
        assert_eq!(profile.delete_count, DeleteCountPolicy::Always);
    }

    #[test]
    fn test_unknown_binding() {
        let file = BindingsFile::from_toml_str(FULL).unwrap();
        let err = file.get("missing").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBinding { ref name } if name == "missing"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let toml = r#"
[[binding]]
name = "todos"
keys = [["todos"]]
pagnated = true
"#;
        assert!(matches!(
            BindingsFile::from_toml_str(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        let err = BindingsFile::from_toml_str("").unwrap_err();
        assert_eq!(invalid_field(err), "binding");
    }

    #[test]
    fn test_duplicate_names_are_invalid() {
        let toml = r#"
[[binding]]
name = "todos"
keys = [["todos"]]

[[binding]]
name = "todos"
keys = [["other"]]
"#;
        let err = BindingsFile::from_toml_str(toml).unwrap_err();
        assert_eq!(invalid_field(err), "binding.name");
    }

    #[test]
    fn test_binding_without_keys_is_invalid() {
        let toml = r#"
[[binding]]
name = "todos"
keys = []
"#;
        let err = BindingsFile::from_toml_str(toml).unwrap_err();
        assert_eq!(invalid_field(err), "binding.todos.keys");
    }

    #[test]
    fn test_empty_path_segment_is_invalid() {
        let toml = r#"
[[binding]]
name = "todos"
keys = [["todos"]]
data_path = ["data", ""]
"#;
        let err = BindingsFile::from_toml_str(toml).unwrap_err();
        assert_eq!(invalid_field(err), "binding.todos.data_path");
    }

    #[test]
    fn test_empty_identity_fields_are_invalid() {
        let toml = r#"
[[binding]]
name = "todos"
keys = [["todos"]]
identity_fields = []
"#;
        let err = BindingsFile::from_toml_str(toml).unwrap_err();
        assert_eq!(invalid_field(err), "binding.todos.identity_fields");
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let bindings = BindingsFile::from_path(file.path()).unwrap();
        assert_eq!(bindings.bindings.len(), 2);
    }

    #[test]
    fn test_from_missing_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BindingsFile::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
