//! Error types for Fontstage
//!
//! Every failure on the resolve path ends up here instead of as a silent
//! `None`. Callers that only care whether a typeface came back can still
//! collapse any of these with `.ok()`.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ResourceId;

pub type Result<T> = std::result::Result<T, TypefaceError>;

/// Main error type for typeface resolution
#[derive(Debug, Error)]
pub enum TypefaceError {
    #[error("Resource not found: {0:#x}")]
    ResourceNotFound(ResourceId),

    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error("Malformed font data: {reason}")]
    MalformedFont { reason: String },

    #[error("No font in the family matches the request")]
    NoMatchingFont,

    #[error("Not supported by this factory: {0}")]
    Unsupported(String),

    #[error("Font provider failed: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TypefaceError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFont {
            reason: reason.into(),
        }
    }
}

impl From<ResourceError> for TypefaceError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound(id) => TypefaceError::ResourceNotFound(id),
            ResourceError::Io(e) => TypefaceError::Io(e),
        }
    }
}

/// Resource-set lookup errors
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Resource not found: {0:#x}")]
    NotFound(ResourceId),

    #[error("Resource read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Temp-file staging errors
#[derive(Debug, Error)]
pub enum StagingError {
    /// Every candidate name was taken or the directory refused the create
    #[error("No temp file available in {} after {} attempts", dir.display(), attempts)]
    TempFileExhausted { dir: PathBuf, attempts: u32 },

    #[error("Failed to write {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to memory-map {}: {}", path.display(), source)]
    Map {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Resource unavailable: {0}")]
    Resource(#[from] ResourceError),
}

/// Capability probe failure
#[derive(Debug, Error)]
#[error("Capability probe failed: {0}")]
pub struct ProbeError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found_maps_to_typeface_not_found() {
        let err: TypefaceError = ResourceError::NotFound(0x7f01).into();
        assert!(matches!(err, TypefaceError::ResourceNotFound(0x7f01)));
    }

    #[test]
    fn test_staging_error_display_names_the_directory() {
        let err = StagingError::TempFileExhausted {
            dir: PathBuf::from("/tmp/cache"),
            attempts: 100,
        };
        assert_eq!(
            err.to_string(),
            "No temp file available in /tmp/cache after 100 attempts"
        );
    }
}
