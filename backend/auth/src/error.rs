use thiserror::Error;

/// Distinct kinds so the API layer can choose a precise HTTP status instead
/// of collapsing every auth failure to a bare 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session token expired")]
    Expired,

    #[error("session token malformed")]
    Malformed,

    #[error("subject not recognized")]
    UnknownSubject,

    #[error("account deactivated")]
    Deactivated,

    #[error("email not verified")]
    EmailNotVerified,

    #[error("tier too low: needed {needed}, have {have}")]
    TierTooLow { needed: &'static str, have: String },

    #[error("attorney verification required")]
    AttorneyVerificationRequired,

    #[error("disclaimer acceptance required for a restricted-period lead")]
    DisclaimerRequired,

    #[error("daily view limit exceeded")]
    DailyViewLimitExceeded,

    #[error("concurrent session limit exceeded")]
    SessionLimitExceeded,

    #[error("invalid credentials")]
    InvalidCredentials,
}

pub type AuthResult<T> = Result<T, AuthError>;
