//! Project configuration loaded from `.lithium/config.json`.
//!
//! Every field has a default, so an absent file (or an empty JSON object)
//! yields a usable configuration. Relative paths are interpreted against the
//! project directory by [`LithiumConfig::resolve_path`].

use crate::error::{LithiumError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Location of the config file relative to the project directory.
pub const CONFIG_FILE: &str = ".lithium/config.json";

/// Maven Central mirror used when none is configured.
pub const DEFAULT_MIRROR: &str = "https://repo.maven.apache.org/maven2";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LithiumConfig {
    /// Local repository root; `None` means `$HOME/.m2/repository`.
    pub local_repository: Option<PathBuf>,
    /// Base URL artifacts are fetched from on a local miss.
    pub mirror: String,
    /// Disables remote resolution entirely.
    pub offline: bool,
    /// Scope names removed during mediation.
    pub excluded_scopes: Vec<String>,
    pub ignore_optional: bool,
    /// Follow the descriptors of resolved artifacts.
    pub transitive: bool,
    pub classpath_file: PathBuf,
    pub search_cache: PathBuf,
}

impl Default for LithiumConfig {
    fn default() -> Self {
        Self {
            local_repository: None,
            mirror: DEFAULT_MIRROR.to_string(),
            offline: false,
            excluded_scopes: Vec::new(),
            ignore_optional: false,
            transitive: true,
            classpath_file: PathBuf::from(".lithium/mvn/classpath"),
            search_cache: PathBuf::from(".lithium/cache/search.json"),
        }
    }
}

impl LithiumConfig {
    /// Loads `<project_dir>/.lithium/config.json`, falling back to defaults
    /// when the file does not exist.
    ///
    /// # Errors
    ///
    /// A file that exists but cannot be read or deserialized is reported as
    /// [`LithiumError::Config`].
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LithiumError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!("loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Local repository root, defaulting to `$HOME/.m2/repository`.
    ///
    /// # Errors
    ///
    /// Fails only when no repository is configured and the home directory
    /// cannot be determined.
    pub fn local_repository(&self) -> Result<PathBuf> {
        if let Some(ref repo) = self.local_repository {
            return Ok(repo.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(".m2").join("repository"))
            .ok_or_else(|| LithiumError::Config("home directory cannot be determined".into()))
    }

    pub fn resolve_path(&self, project_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_dir.join(path)
        }
    }
}
