use lithium_core::LithiumError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClasspathError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(LithiumError),
}

pub type Result<T> = std::result::Result<T, ClasspathError>;

impl From<LithiumError> for ClasspathError {
    fn from(err: LithiumError) -> Self {
        match err {
            LithiumError::Io(e) => Self::Io(e),
            other => Self::Core(other),
        }
    }
}

impl From<serde_json::Error> for ClasspathError {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(LithiumError::Json(err))
    }
}

impl From<ClasspathError> for LithiumError {
    fn from(err: ClasspathError) -> Self {
        match err {
            ClasspathError::Io(e) => Self::Io(e),
            ClasspathError::Core(e) => e,
            other => Self::Classpath(other.to_string()),
        }
    }
}
