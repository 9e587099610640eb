//! Error types
//!
//! `StorageError` covers engine and codec failures. `ApiError` is the classified
//! outcome handed to the boundary layer; every variant maps onto one `ErrorKind`.

use thiserror::Error;

/// Storage-layer failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("tree document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("corrupt owner record for {owner}: {reason}")]
    CorruptRecord { owner: String, reason: String },
}

/// Classified outcome kinds exposed to the boundary layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Internal,
    NotImplemented,
}

impl ErrorKind {
    /// HTTP-shaped status code for this kind
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
            ErrorKind::NotImplemented => 501,
        }
    }
}

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("unsupported content type: {0:?}")]
    UnsupportedContentType(Option<String>),

    #[error("caller {caller} may not access owner {owner}")]
    Forbidden { caller: String, owner: String },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("blob not found: {0}")]
    BlobNotFound(u64),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation not allowed at the root (allow: {allow})")]
    RootNotAllowed { allow: &'static str },

    #[error("folder is not empty: {0}")]
    FolderNotEmpty(String),

    #[error("entry under {parent} would exceed the maximum depth of {max}")]
    DepthExceeded { parent: String, max: usize },

    #[error("not a folder: {0}")]
    NotAFolder(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("transaction for owner {owner} gave up after {attempts} attempts")]
    RetriesExhausted { owner: String, attempts: u32 },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidPath(_)
            | ApiError::InvalidPayload(_)
            | ApiError::UnsupportedContentType(_) => ErrorKind::BadRequest,
            ApiError::Forbidden { .. } => ErrorKind::Forbidden,
            ApiError::PathNotFound(_)
            | ApiError::BlobNotFound(_)
            | ApiError::NotFound(_)
            | ApiError::NotAFolder(_) => ErrorKind::NotFound,
            ApiError::RootNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            ApiError::FolderNotEmpty(_) | ApiError::DepthExceeded { .. } => ErrorKind::Conflict,
            ApiError::NotImplemented(_) => ErrorKind::NotImplemented,
            ApiError::RetriesExhausted { .. }
            | ApiError::Internal(_)
            | ApiError::StorageError(_)
            | ApiError::ConfigError(_) => ErrorKind::Internal,
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_status_codes() {
        assert_eq!(ApiError::InvalidPath("x".into()).kind().status_code(), 400);
        assert_eq!(
            ApiError::Forbidden {
                caller: "a".into(),
                owner: "b".into()
            }
            .kind()
            .status_code(),
            403
        );
        assert_eq!(ApiError::BlobNotFound(3).kind().status_code(), 404);
        assert_eq!(
            ApiError::RootNotAllowed { allow: "GET, POST" }
                .kind()
                .status_code(),
            405
        );
        assert_eq!(ApiError::FolderNotEmpty("f1".into()).kind().status_code(), 409);
        assert_eq!(
            ApiError::DepthExceeded {
                parent: "/f1".into(),
                max: 48
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ApiError::NotAFolder("f1".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            ApiError::RetriesExhausted {
                owner: "a".into(),
                attempts: 3
            }
            .kind(),
            ErrorKind::Internal
        );
        assert_eq!(ApiError::NotImplemented("x".into()).kind().status_code(), 501);
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let err: ApiError = StorageError::CorruptRecord {
            owner: "u1".into(),
            reason: "bad".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
