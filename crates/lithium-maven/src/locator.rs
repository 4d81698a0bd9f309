//! Local repository lookup with remote fallback.
//!
//! Artifacts live at `<repository>/<group path>/<artifactId>/<version>/`.
//! On a local miss the same relative path is requested from the mirror and the
//! response is stored locally, so the local repository doubles as a cache
//! across runs. The repository is not locked: two processes fetching the same
//! artifact at once may both download it.

use crate::error::{MavenError, Result};
use crate::types::Coordinate;
use lithium_core::{FetcherRegistry, LithiumConfig};
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct ArtifactLocator {
    repository: PathBuf,
    mirror: String,
    remote: bool,
    fetchers: FetcherRegistry,
}

impl ArtifactLocator {
    /// Locator with remote resolution enabled and the default fetchers.
    pub fn new(repository: impl Into<PathBuf>, mirror: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            mirror: mirror.into().trim_end_matches('/').to_string(),
            remote: true,
            fetchers: FetcherRegistry::with_defaults(),
        }
    }

    pub fn from_config(config: &LithiumConfig) -> Result<Self> {
        Ok(Self::new(config.local_repository()?, config.mirror.clone()).with_remote(!config.offline))
    }

    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_fetchers(mut self, fetchers: FetcherRegistry) -> Self {
        self.fetchers = fetchers;
        self
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.remote
    }

    pub fn local_path(&self, coordinate: &Coordinate, extension: &str) -> PathBuf {
        coordinate.local_path(&self.repository, extension)
    }

    pub fn remote_url(&self, coordinate: &Coordinate, extension: &str) -> String {
        format!("{}/{}", self.mirror, coordinate.repository_path(extension))
    }

    /// Path of the jar for `coordinate`, downloading it on a local miss.
    ///
    /// # Errors
    ///
    /// - [`MavenError::ArtifactNotFound`] if the jar is not local and remote
    ///   resolution is disabled
    /// - [`MavenError::FetchFailure`] if the mirror does not deliver it
    pub async fn locate(&self, coordinate: &Coordinate) -> Result<PathBuf> {
        self.artifact(coordinate, "jar").await
    }

    /// Path of the descriptor for `coordinate`, downloading it on a local miss.
    ///
    /// Used to discover dependencies of an artifact that has no descriptor
    /// of its own in the project; callers treat a failure as "no further
    /// dependencies known".
    pub async fn fetch_pom(&self, coordinate: &Coordinate) -> Result<PathBuf> {
        self.artifact(coordinate, "pom").await
    }

    async fn artifact(&self, coordinate: &Coordinate, extension: &str) -> Result<PathBuf> {
        let path = self.local_path(coordinate, extension);
        if path.is_file() {
            tracing::debug!("{} found at {}", coordinate, path.display());
            return Ok(path);
        }

        if !self.remote {
            return Err(MavenError::ArtifactNotFound {
                coordinate: coordinate.clone(),
                path,
            });
        }

        let url = self.remote_url(coordinate, extension);
        tracing::info!("downloading {}", url);
        let content = self
            .fetchers
            .fetch(&url)
            .await
            .map_err(|source| MavenError::FetchFailure {
                coordinate: coordinate.clone(),
                source,
            })?;

        write_atomically(&path, &content).await?;
        Ok(path)
    }
}

/// Writes to a sibling `.part` file first so an interrupted download never
/// leaves a truncated artifact at `path`.
async fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    tokio::fs::write(&partial, content).await?;
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}
