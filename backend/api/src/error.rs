use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Every failure mode this binary can surface to a client, already carrying
/// its HTTP status. Each downstream crate's error enum converts into one of
/// these variants at this boundary and nowhere else, per the single
/// translation point in the error-handling design.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authorization required")]
    AuthRequired,
    #[error("session token expired")]
    TokenExpired,
    #[error("session token malformed")]
    TokenMalformed,
    #[error("insufficient credits: needed {needed}, had {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("tier too low: needed {needed}, have {have}")]
    TierTooLow { needed: &'static str, have: String },
    #[error("attorney verification required")]
    AttorneyNotVerified,
    #[error("email verification required")]
    EmailNotVerified,
    #[error("disclaimer acceptance required")]
    DisclaimerRequired,
    #[error("not found")]
    NotFound,
    #[error("lead expired")]
    LeadExpired,
    #[error("rate limited")]
    RateLimited,
    #[error("billing unavailable")]
    BillingUnavailable,
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("daily view limit exceeded")]
    DailyViewLimitExceeded,
    #[error("concurrent session limit exceeded")]
    SessionLimitExceeded,
    #[error("internal error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthRequired => "AuthRequired",
            ApiError::TokenExpired => "TokenExpired",
            ApiError::TokenMalformed => "TokenMalformed",
            ApiError::InsufficientFunds { .. } => "InsufficientFunds",
            ApiError::TierTooLow { .. } => "TierTooLow",
            ApiError::AttorneyNotVerified => "AttorneyNotVerified",
            ApiError::EmailNotVerified => "EmailNotVerified",
            ApiError::DisclaimerRequired => "DisclaimerRequired",
            ApiError::NotFound => "NotFound",
            ApiError::LeadExpired => "LeadExpired",
            ApiError::RateLimited => "RateLimited",
            ApiError::BillingUnavailable => "BillingUnavailable",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::DailyViewLimitExceeded => "DailyViewLimitExceeded",
            ApiError::SessionLimitExceeded => "SessionLimitExceeded",
            ApiError::Internal => "Internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthRequired | ApiError::TokenExpired | ApiError::TokenMalformed => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::TierTooLow { .. }
            | ApiError::AttorneyNotVerified
            | ApiError::EmailNotVerified
            | ApiError::DisclaimerRequired => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::LeadExpired => StatusCode::GONE,
            ApiError::RateLimited | ApiError::DailyViewLimitExceeded | ApiError::SessionLimitExceeded => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::BillingUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody { error: self.kind(), message: self.to_string() };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "unhandled internal error");
        }
        (status, Json(body)).into_response()
    }
}

impl From<flx_auth::AuthError> for ApiError {
    fn from(err: flx_auth::AuthError) -> Self {
        use flx_auth::AuthError as E;
        match err {
            E::Expired => ApiError::TokenExpired,
            E::Malformed | E::UnknownSubject => ApiError::TokenMalformed,
            E::Deactivated => ApiError::AuthRequired,
            E::EmailNotVerified => ApiError::EmailNotVerified,
            E::TierTooLow { needed, have } => ApiError::TierTooLow { needed, have },
            E::AttorneyVerificationRequired => ApiError::AttorneyNotVerified,
            E::DisclaimerRequired => ApiError::DisclaimerRequired,
            E::DailyViewLimitExceeded => ApiError::DailyViewLimitExceeded,
            E::SessionLimitExceeded => ApiError::SessionLimitExceeded,
            E::InvalidCredentials => ApiError::BadRequest("invalid credentials".to_string()),
        }
    }
}

impl From<flx_store::StoreError> for ApiError {
    fn from(err: flx_store::StoreError) -> Self {
        match err {
            flx_store::StoreError::LeadNotFound(_) => ApiError::NotFound,
            other => {
                tracing::error!(error = %other, "store error");
                ApiError::Internal
            }
        }
    }
}

impl From<flx_wallet::WalletError> for ApiError {
    fn from(err: flx_wallet::WalletError) -> Self {
        match err {
            flx_wallet::WalletError::InsufficientFunds { needed, available } => ApiError::InsufficientFunds { needed, available },
            flx_wallet::WalletError::LeadExpired => ApiError::LeadExpired,
            flx_wallet::WalletError::WalletNotFound(_) => ApiError::NotFound,
            flx_wallet::WalletError::Store(e) => e.into(),
        }
    }
}

impl From<flx_billing::BillingError> for ApiError {
    fn from(err: flx_billing::BillingError) -> Self {
        match err {
            flx_billing::BillingError::BadSignature => ApiError::BadRequest("signature mismatch".to_string()),
            flx_billing::BillingError::MalformedPayload(msg) => ApiError::BadRequest(msg),
            flx_billing::BillingError::Wallet(e) => e.into(),
            flx_billing::BillingError::Store(e) => e.into(),
        }
    }
}
