/// Sync error taxonomy
///
/// Every failure of a sync operation falls into one of four classes:
///
/// | Class            | Cause                                   | Retried |
/// |------------------|-----------------------------------------|---------|
/// | `Unauthenticated`| no current principal                    | never   |
/// | `Validation`     | empty required field, nothing attempted | never   |
/// | `Backend`        | write/query/auth-provider failure       | never   |
/// | `Upload`         | image bytes could not be stored         | never   |
///
/// Errors are caught at the user action that triggered them and turned into
/// a notice; they never escape a screen.
///
/// # Example
///
/// ```
/// use tasknest_shared::error::SyncError;
///
/// let err = SyncError::Unauthenticated;
/// assert_eq!(err.kind(), "unauthenticated");
/// assert_eq!(err.user_message(), "User not authenticated.");
/// ```

use crate::backend::{AuthError, BackendError};
use thiserror::Error;
use validator::ValidationErrors;

/// Sync result type alias
pub type SyncResult<T> = Result<T, SyncError>;

/// Failures surfaced by sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// No current principal
    #[error("User not authenticated")]
    Unauthenticated,

    /// Input rejected before any backend call
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Backend collaborator failure
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Image transfer failure
    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        SyncError::Backend(BackendError::Auth(err))
    }
}

impl SyncError {
    /// Stable error class identifier
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Unauthenticated => "unauthenticated",
            SyncError::Validation(_) => "validation_error",
            SyncError::Backend(_) => "backend_error",
            SyncError::Upload(_) => "upload_error",
        }
    }

    /// Authentication provider error, if this is one
    pub fn auth_error(&self) -> Option<&AuthError> {
        match self {
            SyncError::Backend(BackendError::Auth(err)) => Some(err),
            _ => None,
        }
    }

    /// Generic message shown to the user
    ///
    /// Screens usually prefer an action-specific message for backend
    /// failures; this is the fallback.
    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::Unauthenticated => "User not authenticated.",
            SyncError::Validation(_) => "The name cannot be empty.",
            SyncError::Backend(BackendError::Auth(err)) => err.user_message(),
            SyncError::Backend(_) => "The operation could not be completed. Please try again.",
            SyncError::Upload(_) => "The image could not be uploaded.",
        }
    }
}

/// Image upload failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    /// Local image bytes could not be read
    #[error("Failed to read image {uri}: {message}")]
    Read { uri: String, message: String },

    /// URI scheme not understood by the image source
    #[error("Unsupported image URI: {0}")]
    UnsupportedUri(String),

    /// Blob store rejected the bytes
    #[error("Failed to upload image to {path}: {source}")]
    Transfer {
        path: String,
        #[source]
        source: BackendError,
    },

    /// Download URL could not be resolved after upload
    #[error("Failed to resolve download URL for {path}: {source}")]
    Url {
        path: String,
        #[source]
        source: BackendError,
    },
}
