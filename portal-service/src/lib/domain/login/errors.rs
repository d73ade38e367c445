use thiserror::Error;

/// Error for portal selector validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortalTypeError {
    #[error("Unsupported portal: {0}")]
    Unsupported(String),
}

/// Error for date-of-birth parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DobError {
    #[error("Date of birth matches no accepted format")]
    Unrecognized,

    #[error("Not a valid calendar date: {0}")]
    InvalidDate(String),
}

/// Error for the best-effort student-to-account link step.
///
/// Kept as its own type so the service can log and discard it without
/// collapsing it into the main error flow.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("Failed to link student {student_id} to account {account_id}: {reason}")]
    UpdateFailed {
        student_id: String,
        account_id: String,
        reason: String,
    },
}

/// Error for identity provider operations
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Account already exists for this email")]
    AlreadyExists,

    #[error("Identity provider rejected the credentials")]
    InvalidCredentials,

    #[error("Identity provider request failed: {0}")]
    Transport(String),

    #[error("Identity provider returned unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Top-level error for the login flow.
///
/// Each variant maps to exactly one client-facing status and message; the
/// two 401 variants are kept separate internally but deliberately read the
/// same level of detail to the client, so a caller cannot tell which factor
/// was wrong.
#[derive(Debug, Clone, Error)]
pub enum LoginError {
    #[error("Unsupported portal: {0}")]
    UnsupportedPortal(#[from] PortalTypeError),

    #[error("Missing or malformed roll/register number or date of birth")]
    MissingCredentials,

    #[error("No active student matches the identifier and date of birth")]
    InvalidStudent,

    #[error("Student portal access not activated")]
    NotActivated,

    #[error("Backing account provisioning failed: {0}")]
    Provisioning(String),

    #[error("Identity provider rejected the login")]
    InvalidLogin,

    #[error("Store error: {0}")]
    Database(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<DobError> for LoginError {
    fn from(_: DobError) -> Self {
        LoginError::MissingCredentials
    }
}

impl From<anyhow::Error> for LoginError {
    fn from(err: anyhow::Error) -> Self {
        LoginError::Unknown(err.to_string())
    }
}
