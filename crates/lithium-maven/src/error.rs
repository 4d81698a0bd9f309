//! Errors specific to pom.xml resolution.

use crate::types::Coordinate;
use lithium_core::LithiumError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MavenError {
    #[error("Failed to parse {}: {message}", path.display())]
    ParseError { path: PathBuf, message: String },

    #[error("Descriptor {} is its own ancestor", path.display())]
    ParentCycle { path: PathBuf },

    #[error("Artifact '{coordinate}' not found at {}", path.display())]
    ArtifactNotFound { coordinate: Coordinate, path: PathBuf },

    #[error("Fetching '{coordinate}' failed: {source}")]
    FetchFailure {
        coordinate: Coordinate,
        #[source]
        source: LithiumError,
    },

    #[error("Invalid Maven coordinates '{coordinates}': expected 'groupId:artifactId:version'")]
    InvalidCoordinates { coordinates: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(LithiumError),
}

pub type Result<T> = std::result::Result<T, MavenError>;

impl From<LithiumError> for MavenError {
    fn from(err: LithiumError) -> Self {
        match err {
            LithiumError::Io(e) => Self::Io(e),
            other => Self::Core(other),
        }
    }
}

impl From<MavenError> for LithiumError {
    fn from(err: MavenError) -> Self {
        match err {
            MavenError::ParseError { path, message } => Self::ParseError {
                file_type: path.display().to_string(),
                source: Box::new(std::io::Error::other(message)),
            },
            MavenError::Io(e) => Self::Io(e),
            MavenError::Core(e) => e,
            MavenError::FetchFailure { source, .. } => source,
            other => Self::Resolution(other.to_string()),
        }
    }
}
