//! Environment variable handling.

use crate::types::ClientSettings;
use std::env;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    pub const COURIER_CONFIG_PATH: &str = "COURIER_CONFIG_PATH";
    pub const COURIER_BASE_URL: &str = "COURIER_BASE_URL";
    pub const COURIER_RETRY_ATTEMPTS: &str = "COURIER_RETRY_ATTEMPTS";
    pub const COURIER_ENV: &str = "COURIER_ENV";
}

/// Environment configuration.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from .env files in the working directory.
    pub fn init() -> Result<Self, EnvError> {
        Self::init_in(Path::new("."))
    }

    /// Initialize environment from .env files in `dir`.
    ///
    /// Missing files are skipped; unreadable or malformed ones are errors.
    pub fn init_in(dir: &Path) -> Result<Self, EnvError> {
        // variables already set are never overwritten, so earlier files win
        load_optional(&dir.join(".env"))?;
        load_optional(&dir.join(".env.local"))?;

        if let Ok(env) = env::var(vars::COURIER_ENV) {
            load_optional(&dir.join(format!(".env.{}", env)))?;
        }

        Ok(Self { _guard: () })
    }

    /// Get a required string variable.
    pub fn require(var: &str) -> Result<String, EnvError> {
        env::var(var).map_err(|_| EnvError::NotSet { var: var.to_string() })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get a variable with a default value.
    pub fn get_or(var: &str, default: &str) -> String {
        env::var(var).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer variable.
    pub fn get_int<T: std::str::FromStr>(var: &str) -> Result<Option<T>, EnvError> {
        match env::var(var) {
            Ok(v) => v.trim().parse().map(Some).map_err(|_| EnvError::InvalidValue {
                var: var.to_string(),
                message: "expected integer".to_string(),
            }),
            Err(_) => Ok(None),
        }
    }
}

fn load_optional(path: &Path) -> Result<(), EnvError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl ClientSettings {
    /// Override settings from `COURIER_*` variables.
    pub fn apply_env(&mut self) -> Result<(), EnvError> {
        if let Some(base_url) = Environment::get(vars::COURIER_BASE_URL) {
            self.base_url = Some(base_url);
        }

        if let Some(attempts) = Environment::get_int::<u32>(vars::COURIER_RETRY_ATTEMPTS)? {
            if attempts == 0 {
                return Err(EnvError::InvalidValue {
                    var: vars::COURIER_RETRY_ATTEMPTS.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
            self.retry.max_attempts = attempts;
        }

        Ok(())
    }
}
