//! Addon configuration loading

use crate::addon::{Addon, AddonChain, AddonConfig, AddonFilters, AddonHandler};
use crate::error::{Result, ScriptError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::error;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ScriptError::config("Unable to detect config format"))?;

        match ext {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ScriptError::config(format!(
                "Unsupported config format: {ext}"
            ))),
        }
    }
}

/// Addons to load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Addons in execution order
    #[serde(default)]
    pub addons: Vec<AddonConfig>,
}

impl ScriptsConfig {
    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| ScriptError::Io {
            message: format!("Failed to read config file {}: {e}", path.display()),
        })?;

        let format = ConfigFormat::from_path(path)?;

        Self::load_from_str(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        let config = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&expanded)
                .map_err(|e| ScriptError::config(format!("Failed to parse YAML: {e}")))?,
            ConfigFormat::Toml => toml::from_str(&expanded)
                .map_err(|e| ScriptError::config(format!("Failed to parse TOML: {e}")))?,
            ConfigFormat::Json => serde_json::from_str(&expanded)
                .map_err(|e| ScriptError::config(format!("Failed to parse JSON: {e}")))?,
        };

        Ok(config)
    }

    /// Parse every addon's filters without building handlers
    pub fn validate(&self) -> Result<()> {
        for addon in &self.addons {
            if addon.name.is_empty() {
                return Err(ScriptError::config("Addon name must not be empty"));
            }
            AddonFilters::from_config(addon)?;
        }
        Ok(())
    }

    /// Load every addon
    ///
    /// An addon whose filters do not parse is logged and left out; the others
    /// still load. Use [`validate`](Self::validate) to reject the whole file.
    pub fn build_chain<F>(&self, mut handler_factory: F) -> AddonChain
    where
        F: FnMut(&AddonConfig) -> Arc<dyn AddonHandler>,
    {
        let mut chain = AddonChain::new();
        for config in &self.addons {
            match Addon::new(config, handler_factory(config)) {
                Ok(addon) => chain.push(addon),
                Err(e) => error!(addon = %config.name, error = %e, "Failed to load addon"),
            }
        }
        chain
    }
}

/// Expand environment variables in configuration string
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| ScriptError::config(format!("Invalid regex: {e}")))?;

    let mut result = String::new();
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let default_value = cap.get(3).map(|m| m.as_str());

        let value = match (env::var(var_name.as_str()), default_value) {
            (Ok(val), _) => val,
            (Err(_), Some(default)) => default.to_string(),
            (Err(_), None) => {
                return Err(ScriptError::config(format!(
                    "Environment variable '{}' not set and no default provided",
                    var_name.as_str()
                )));
            }
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::PassThrough;
    use std::path::PathBuf;

    const YAML_CONFIG: &str = r#"
addons:
  - name: "api-only"
    REQ_FILTER: '(path-matches r"^/api/.*")'
  - name: "errors"
    res_filter: "(status-code-in 500 599)"
    continue_on_error: true
"#;

    #[test]
    fn test_detect_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("addons.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("addons.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("addons.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(&PathBuf::from("addons.txt")).is_err());
        assert!(ConfigFormat::from_path(&PathBuf::from("addons")).is_err());
    }

    #[test]
    fn test_load_yaml() {
        let config = ScriptsConfig::load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.addons.len(), 2);
        assert_eq!(
            config.addons[0].req_filter.as_deref(),
            Some(r#"(path-matches r"^/api/.*")"#)
        );
        assert!(config.addons[1].continue_on_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[[addons]]
name = "auth"
req_filter = '(not (has-header "Authorization"))'
"#;
        let config = ScriptsConfig::load_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.addons[0].name, "auth");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ScriptsConfig::load_from_str("addons: [", ConfigFormat::Yaml);
        assert!(matches!(result, Err(ScriptError::Config { .. })));
    }

    #[test]
    fn test_validate_reports_filter() {
        let json = r#"{"addons": [{"name": "bad", "req_filter": "(has-header)"}]}"#;
        let config = ScriptsConfig::load_from_str(json, ConfigFormat::Json).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ScriptError::FilterParse { field: "REQ_FILTER", .. })
        ));
    }

    #[test]
    fn test_build_chain_skips_broken_addon() {
        let yaml = r#"
addons:
  - name: "broken"
    req_filter: "(has-headr \"X\")"
  - name: "fine"
    res_filter: "(status-code-eq 200)"
"#;
        let config = ScriptsConfig::load_from_str(yaml, ConfigFormat::Yaml).unwrap();
        assert!(config.validate().is_err());

        let chain = config.build_chain(|_| Arc::new(PassThrough));
        let names: Vec<_> = chain.iter().map(Addon::name).collect();
        assert_eq!(names, vec!["fine"]);
    }

    #[test]
    fn test_env_var_with_default() {
        let yaml = r#"
addons:
  - name: "${OCTOPUS_FILTER_TEST_UNSET_NAME:-fallback}"
"#;
        let config = ScriptsConfig::load_from_str(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.addons[0].name, "fallback");
    }

    #[test]
    fn test_missing_env_var_no_default() {
        let yaml = "addons:\n  - name: \"${OCTOPUS_FILTER_TEST_UNSET_NAME}\"\n";
        assert!(ScriptsConfig::load_from_str(yaml, ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn test_build_chain() {
        let config = ScriptsConfig::load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();
        let mut seen = Vec::new();
        let chain = config.build_chain(|addon| {
            seen.push(addon.name.clone());
            Arc::new(PassThrough)
        });
        assert_eq!(chain.len(), 2);
        assert_eq!(seen, vec!["api-only", "errors"]);
    }
}
