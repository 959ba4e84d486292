//! Configuration file loading and parsing.

use crate::env::vars;
use crate::types::ClientSettings;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory (relative to the project root) holding the config file.
pub const CONFIG_DIR: &str = ".courier";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yaml";

const ENV_VAR_PATTERN: &str = r"\$\{([^}:]+)(?::-([^}]*))?\}";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Loads [`ClientSettings`] from YAML.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: PathBuf,
    required: bool,
}

impl ConfigLoader {
    /// Loader for `<project_dir>/.courier/config.yaml`. A missing file yields defaults.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            config_path: project_dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE),
            required: false,
        }
    }

    /// Loader for an explicit file. A missing file is an error.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            required: true,
        }
    }

    /// Honour `COURIER_CONFIG_PATH`, otherwise look in the current directory.
    pub fn from_env() -> Self {
        match std::env::var(vars::COURIER_CONFIG_PATH) {
            Ok(path) => Self::with_path(path),
            Err(_) => Self::default(),
        }
    }

    /// Path this loader reads from and writes to.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load, expand `${VAR}` references, parse and validate.
    pub fn load(&self) -> Result<ClientSettings, ConfigError> {
        if !self.config_path.exists() {
            if self.required {
                return Err(ConfigError::NotFound {
                    path: self.config_path.clone(),
                });
            }
            return Ok(ClientSettings::default());
        }

        let contents = std::fs::read_to_string(&self.config_path)?;
        self.parse(&contents)
    }

    /// Parse settings from YAML text.
    pub fn parse(&self, contents: &str) -> Result<ClientSettings, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        let settings: ClientSettings =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        validate(&settings)?;
        Ok(settings)
    }

    /// Save settings to the loader's path.
    pub fn save(&self, settings: &ClientSettings) -> Result<(), ConfigError> {
        if let Some(dir) = self.config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml = serde_yaml::to_string(settings).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(&self.config_path, yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

/// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let re = Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::ParseError {
        line: None,
        message: e.to_string(),
    })?;

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let value = match std::env::var(var_name) {
            Ok(v) => v,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            },
        };

        result = result.replace(&cap[0], &value);
    }

    Ok(result)
}

/// Validate settings values.
pub fn validate(settings: &ClientSettings) -> Result<(), ConfigError> {
    if settings.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }

    if let Some(base_url) = &settings.base_url {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                message: format!("base_url must be an absolute http(s) URL, got {base_url:?}"),
            });
        }
    }

    if settings.default_content_type.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            message: "default_content_type must not be empty".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RetryKind;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let settings = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("missing.yaml"));
        assert!(matches!(loader.load(), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
base_url: http://localhost:3000
retry:
  strategy: constant
  max_attempts: 4
  delay_ms: 250
transport:
  attempt_timeout_ms: 1500
  default_headers:
    Accept: application/json
accept_status: [200, 201]
"#,
        );

        let settings = ConfigLoader::new(dir.path()).load().unwrap();

        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(settings.retry.strategy, RetryKind::Constant);
        assert_eq!(settings.retry.max_attempts, 4);
        assert_eq!(settings.retry.delay_ms, 250);
        assert_eq!(settings.transport.attempt_timeout_ms, Some(1500));
        assert_eq!(
            settings.transport.default_headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(settings.accept_status, Some(vec![200, 201]));

        // unspecified values keep their defaults
        assert_eq!(settings.default_content_type, "application/json");
        assert_eq!(settings.transport.connect_timeout_ms, 10_000);
        assert!(settings.transport.gzip);
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("COURIER_TEST_HOST", "api.example.com");
        let result = expand_env_vars("base_url: https://${COURIER_TEST_HOST}/v1").unwrap();
        assert_eq!(result, "base_url: https://api.example.com/v1");
        std::env::remove_var("COURIER_TEST_HOST");
    }

    #[test]
    fn test_env_var_default() {
        let result = expand_env_vars("max_attempts: ${COURIER_TEST_NONEXISTENT:-3}").unwrap();
        assert_eq!(result, "max_attempts: 3");
    }

    #[test]
    fn test_env_var_missing_error() {
        match expand_env_vars("base_url: ${COURIER_TEST_MISSING_VAR}") {
            Err(ConfigError::EnvVarNotFound { var }) => {
                assert_eq!(var, "COURIER_TEST_MISSING_VAR")
            }
            other => panic!("expected EnvVarNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = ClientSettings::default();
        settings.retry.max_attempts = 0;
        match validate(&settings) {
            Err(ConfigError::ValidationError { message }) => {
                assert!(message.contains("max_attempts"))
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }

        let mut settings = ClientSettings::default();
        settings.base_url = Some("localhost:3000".to_string());
        assert!(validate(&settings).is_err());

        let mut settings = ClientSettings::default();
        settings.default_content_type = "  ".to_string();
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let loader = ConfigLoader::new(".");
        let result = loader.parse("retry:\n  max_attempts: [unclosed\n");
        match result {
            Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());

        let mut settings = ClientSettings::default();
        settings.base_url = Some("https://api.example.com".to_string());
        settings.retry.max_attempts = 5;

        loader.save(&settings).unwrap();
        assert!(loader.path().exists());
        assert_eq!(loader.load().unwrap(), settings);
    }
}
