use axum::extract::State;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use flx_auth::gates::{require_session_quota, Tier as GateTier};
use flx_auth::password::{hash_password, verify_password};
use flx_auth::Subject;
use flx_store::user::{Tier as StoreTier, User};
use flx_wallet::founders;

use crate::error::ApiError;
use crate::models::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse, VerifyEmailRequest,
};
use crate::state::AppState;

const SESSION_TTL_HOURS: i64 = 24;
const VERIFICATION_CODE_TTL: Duration = Duration::minutes(15);

fn generate_verification_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterRequest>) -> Result<Json<RegisterResponse>, ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".to_string()));
    }
    if body.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".to_string()));
    }

    let now = Utc::now();
    let user_id = Uuid::new_v4().to_string();
    let password_hash = hash_password(&body.password).map_err(ApiError::from)?;
    let founders_cap = state.config.auth.founders_cap;

    let outcome = state
        .store
        .write_tx(|conn| {
            let email = email.clone();
            let password_hash = password_hash.clone();
            let user_id = user_id.clone();
            Box::pin(async move {
                if flx_store::user::get_by_email(conn, &email).await?.is_some() {
                    return Err(flx_store::StoreError::InvalidLead("email already registered".to_string()));
                }

                let user = User {
                    id: user_id.clone(),
                    email,
                    password_hash,
                    tier: StoreTier::Scout.as_str().to_string(),
                    email_verified: false,
                    attorney_status: "none".to_string(),
                    bar_number: None,
                    is_admin: false,
                    deactivated: false,
                    created_at: now.to_rfc3339(),
                    updated_at: now.to_rfc3339(),
                };
                flx_store::user::insert(conn, &user).await?;
                flx_wallet::wallet::create(conn, &user_id).await.map_err(|_| {
                    flx_store::StoreError::InvalidLead("wallet creation failed".to_string())
                })?;

                let claim = founders::try_claim(conn, &user_id, founders_cap, now)
                    .await
                    .map_err(|_| flx_store::StoreError::InvalidLead("founders claim failed".to_string()))?;
                let founders_slot = matches!(claim, founders::ClaimOutcome::Claimed);

                Ok(founders_slot)
            })
        })
        .await
        .map_err(|e| match e {
            flx_store::StoreError::InvalidLead(msg) if msg == "email already registered" => {
                ApiError::BadRequest("email already registered".to_string())
            }
            other => ApiError::from(other),
        })?;

    Ok(Json(RegisterResponse { user_id, founders_slot: outcome }))
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
    let email = body.email.trim().to_lowercase();
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let user = flx_store::user::get_by_email(&mut conn, &email)
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::BadRequest("invalid credentials".to_string()))?;

    if user.deactivated {
        return Err(ApiError::AuthRequired);
    }
    verify_password(&body.password, &user.password_hash).map_err(ApiError::from)?;

    let now = Utc::now();
    let gate_tier: GateTier = user.tier().map_err(ApiError::from)?.as_str().parse().map_err(ApiError::from)?;
    let attorney_verified = user.attorney_status().map_err(ApiError::from)? == flx_store::user::AttorneyStatus::Verified;
    let active_sessions = flx_store::session::count_active(&mut conn, &user.id, now).await.map_err(ApiError::from)?;
    require_session_quota(&Subject {
        user_id: user.id.clone(),
        tier: gate_tier,
        email_verified: user.email_verified,
        attorney_verified,
        bar_number: user.bar_number.clone(),
        is_admin: user.is_admin,
        deactivated: user.deactivated,
        views_today: 0,
        active_sessions,
    })
    .map_err(ApiError::from)?;

    let token = state.tokens.issue(&user.id, &user.tier, now, SESSION_TTL_HOURS).map_err(ApiError::from)?;

    let session_id = Uuid::new_v4().to_string();
    let expires_at = now + Duration::hours(SESSION_TTL_HOURS);
    flx_store::session::create(&mut conn, &session_id, &user.id, now, expires_at).await.map_err(ApiError::from)?;

    Ok(Json(LoginResponse { token }))
}

pub async fn me(State(state): State<AppState>, Extension(subject): Extension<Subject>) -> Result<Json<MeResponse>, ApiError> {
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let user = flx_store::user::get_by_id(&mut conn, &subject.user_id).await.map_err(ApiError::from)?;
    let wallet = flx_wallet::wallet::load_for_update(&mut conn, &subject.user_id).await.map_err(ApiError::from)?;

    Ok(Json(MeResponse {
        user_id: user.id,
        email: user.email,
        tier: user.tier,
        email_verified: user.email_verified,
        attorney_status: user.attorney_status,
        subscription_credits: wallet.subscription_credits,
        purchased_credits: wallet.purchased_credits,
    }))
}

pub async fn send_verification(State(state): State<AppState>, Extension(subject): Extension<Subject>) -> Result<(), ApiError> {
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let user = flx_store::user::get_by_id(&mut conn, &subject.user_id).await.map_err(ApiError::from)?;

    let now = Utc::now();
    let code = generate_verification_code();
    let outcome = flx_store::verification::issue(&mut conn, &subject.user_id, &code, VERIFICATION_CODE_TTL, now)
        .await
        .map_err(ApiError::from)?;

    match outcome {
        flx_store::verification::IssueOutcome::Issued(_) => {
            state.mailer.send_verification_code(&user.email, &code).await;
            Ok(())
        }
        flx_store::verification::IssueOutcome::Throttled { .. } => Err(ApiError::RateLimited),
    }
}

pub async fn verify_email(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<(), ApiError> {
    let mut conn = state.store.pool().acquire().await.map_err(|e| ApiError::from(flx_store::StoreError::from(e)))?;
    let now = Utc::now();
    let outcome = flx_store::verification::verify(&mut conn, &subject.user_id, &body.code, now).await.map_err(ApiError::from)?;

    match outcome {
        flx_store::verification::VerifyOutcome::Verified => {
            flx_store::user::set_email_verified(&mut conn, &subject.user_id, &now.to_rfc3339()).await.map_err(ApiError::from)?;
            Ok(())
        }
        flx_store::verification::VerifyOutcome::CodeMismatch | flx_store::verification::VerifyOutcome::NotFound => {
            Err(ApiError::BadRequest("verification code does not match".to_string()))
        }
        flx_store::verification::VerifyOutcome::Expired => Err(ApiError::BadRequest("verification code expired".to_string())),
    }
}
