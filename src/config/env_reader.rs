//! Environment variable reader abstraction
//!
//! Configuration never touches `std::env` directly. Production code reads
//! through `RealEnvReader` or a `LayeredEnvReader` (process environment over a
//! `.env` file); tests hand the validator a `MapEnvReader` so nothing mutates
//! global state.

use std::collections::HashMap;
use std::env::VarError;
use std::path::Path;

use crate::error::{DeployError, ErrorCode, Result};

/// Trait for reading environment variables
///
/// Implementations must be thread-safe.
pub trait EnvReader: Send + Sync {
    /// Read an environment variable as a String
    ///
    /// # Errors
    ///
    /// Returns `VarError::NotPresent` if the variable is not set,
    /// or `VarError::NotUnicode` if the value contains invalid UTF-8.
    fn var(&self, key: &str) -> std::result::Result<String, VarError>;
}

/// Reads the process environment
#[derive(Clone, Default, Debug)]
pub struct RealEnvReader;

impl EnvReader for RealEnvReader {
    fn var(&self, key: &str) -> std::result::Result<String, VarError> {
        std::env::var(key)
    }
}

/// Fixed set of values, used for tests and for already-parsed sources
#[derive(Clone, Default, Debug)]
pub struct MapEnvReader {
    values: HashMap<String, String>,
}

impl MapEnvReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvReader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvReader for MapEnvReader {
    fn var(&self, key: &str) -> std::result::Result<String, VarError> {
        self.values.get(key).cloned().ok_or(VarError::NotPresent)
    }
}

/// Process environment layered over the contents of a `.env` file.
///
/// Variables exported in the process win over the file. The file is parsed
/// without loading it into the process environment.
pub struct LayeredEnvReader {
    primary: Box<dyn EnvReader>,
    file_values: HashMap<String, String>,
}

impl LayeredEnvReader {
    pub fn new(primary: Box<dyn EnvReader>, file_values: HashMap<String, String>) -> Self {
        Self {
            primary,
            file_values,
        }
    }

    /// Layer the process environment over `path`.
    ///
    /// A missing file is only an error when the operator named it
    /// explicitly (`required`); the default `.env` is optional.
    pub fn from_env_file(path: &Path, required: bool) -> Result<Self> {
        let file_values = if path.exists() {
            read_env_file(path)?
        } else if required {
            return Err(DeployError::config_with_code(
                ErrorCode::CONFIG_ENV_FILE,
                format!("Environment file {} does not exist", path.display()),
            )
            .with_remediation("cp .env.example .env"));
        } else {
            tracing::debug!("No environment file at {}, using process environment", path.display());
            HashMap::new()
        };

        Ok(Self::new(Box::new(RealEnvReader), file_values))
    }
}

impl EnvReader for LayeredEnvReader {
    fn var(&self, key: &str) -> std::result::Result<String, VarError> {
        match self.primary.var(key) {
            Ok(value) => Ok(value),
            Err(VarError::NotPresent) => self
                .file_values
                .get(key)
                .cloned()
                .ok_or(VarError::NotPresent),
            Err(e) => Err(e),
        }
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let file_error = |e: dotenvy::Error| {
        DeployError::config_with_code(
            ErrorCode::CONFIG_ENV_FILE,
            format!("Failed to read environment file {}", path.display()),
        )
        .with_source(e)
    };

    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(file_error)? {
        let (key, value) = item.map_err(file_error)?;
        values.insert(key, value);
    }
    tracing::debug!("Loaded {} entries from {}", values.len(), path.display());
    Ok(values)
}
