/// Backend and authentication errors
///
/// `BackendError` covers every failure reported by a backend collaborator.
/// The sync layer does not distinguish "record not found" from other write
/// failures; `NotFound` exists so backends can report it and logs can show it.

use thiserror::Error;

/// Backend result type alias
pub type BackendResult<T> = Result<T, BackendError>;

/// Failures reported by the document store, blob store or identity provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Addressed document does not exist
    #[error("Document not found: {path}/{id}")]
    NotFound { path: String, id: String },

    /// Backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the request (permissions, malformed data)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Addressed blob does not exist
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// URL does not reference a blob of this store
    #[error("Invalid blob URL: {0}")]
    InvalidBlobUrl(String),

    /// Identity provider failure
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

/// Identity provider failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed email address
    #[error("Invalid email address")]
    InvalidEmail,

    /// Account disabled by an administrator
    #[error("User account is disabled")]
    UserDisabled,

    /// No account for this email
    #[error("No account found for this email")]
    UserNotFound,

    /// Password mismatch
    #[error("Wrong password")]
    WrongPassword,

    /// Sign-up with an email that already has an account
    #[error("Email address already in use")]
    EmailAlreadyInUse,

    /// Password shorter than the provider minimum
    #[error("Password is too weak")]
    WeakPassword,

    /// Sign-in refused until the email is verified
    #[error("Email address not verified")]
    EmailNotVerified,

    /// Account created but the verification email could not be sent
    #[error("Failed to send verification email: {0}")]
    VerificationEmailFailed(String),

    /// Any other provider error code
    #[error("Authentication provider error: {code}")]
    Provider { code: String },
}

impl AuthError {
    /// Maps a provider error code (e.g. `auth/wrong-password`)
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/user-disabled" => AuthError::UserDisabled,
            "auth/user-not-found" => AuthError::UserNotFound,
            "auth/wrong-password" => AuthError::WrongPassword,
            "auth/email-already-in-use" => AuthError::EmailAlreadyInUse,
            "auth/weak-password" => AuthError::WeakPassword,
            other => AuthError::Provider {
                code: other.to_string(),
            },
        }
    }

    /// Provider error code for this error
    pub fn code(&self) -> &str {
        match self {
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::UserDisabled => "auth/user-disabled",
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::EmailNotVerified => "auth/email-not-verified",
            AuthError::VerificationEmailFailed(_) => "auth/verification-email-failed",
            AuthError::Provider { code } => code,
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "The email address is not valid.",
            AuthError::UserDisabled => "This user account has been disabled.",
            AuthError::UserNotFound => "No account found with this email.",
            AuthError::WrongPassword => "Incorrect password.",
            AuthError::EmailAlreadyInUse => "This email address is already in use.",
            AuthError::WeakPassword => {
                "The password is too weak. It must be at least 6 characters long."
            }
            AuthError::EmailNotVerified => "Please verify your email before signing in.",
            AuthError::VerificationEmailFailed(_) => "Error while sending the verification email.",
            AuthError::Provider { .. } => "An error occurred. Please try again.",
        }
    }
}
