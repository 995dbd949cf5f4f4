use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Scout,
    Operator,
    Sovereign,
}

impl Tier {
    pub fn daily_view_limit(&self) -> u32 {
        match self {
            Tier::Scout => 20,
            Tier::Operator => 200,
            Tier::Sovereign => u32::MAX,
        }
    }

    pub fn session_limit(&self) -> u32 {
        match self {
            Tier::Scout => 1,
            Tier::Operator => 3,
            Tier::Sovereign => 10,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Scout => "scout",
            Tier::Operator => "operator",
            Tier::Sovereign => "sovereign",
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = AuthError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scout" => Ok(Tier::Scout),
            "operator" => Ok(Tier::Operator),
            "sovereign" => Ok(Tier::Sovereign),
            _ => Err(AuthError::UnknownSubject),
        }
    }
}

/// Everything a gate needs about the caller. `flx-auth` knows nothing about
/// how this is loaded; the API layer populates it from `flx-store`.
#[derive(Debug, Clone)]
pub struct Subject {
    pub user_id: String,
    pub tier: Tier,
    pub email_verified: bool,
    pub attorney_verified: bool,
    pub bar_number: Option<String>,
    pub is_admin: bool,
    pub deactivated: bool,
    pub views_today: u32,
    pub active_sessions: u32,
}

pub fn require_active(subject: &Subject) -> AuthResult<()> {
    if subject.deactivated {
        return Err(AuthError::Deactivated);
    }
    Ok(())
}

pub fn require_email_verified(subject: &Subject) -> AuthResult<()> {
    if !subject.email_verified {
        return Err(AuthError::EmailNotVerified);
    }
    Ok(())
}

pub fn require_tier_at_least(subject: &Subject, minimum: Tier) -> AuthResult<()> {
    if subject.tier < minimum {
        return Err(AuthError::TierTooLow { needed: minimum.label(), have: subject.tier.label().to_string() });
    }
    Ok(())
}

pub fn require_attorney_verified(subject: &Subject) -> AuthResult<()> {
    if !subject.attorney_verified || subject.bar_number.is_none() {
        return Err(AuthError::AttorneyVerificationRequired);
    }
    Ok(())
}

/// Unlocking a `RESTRICTED`-status lead requires attorney verification,
/// operator tier or above, and explicit disclaimer acceptance on the request.
pub fn require_restricted_unlock(subject: &Subject, disclaimer_accepted: bool) -> AuthResult<()> {
    require_attorney_verified(subject)?;
    require_tier_at_least(subject, Tier::Operator)?;
    if !disclaimer_accepted {
        return Err(AuthError::DisclaimerRequired);
    }
    Ok(())
}

pub fn require_daily_view_quota(subject: &Subject) -> AuthResult<()> {
    if subject.views_today >= subject.tier.daily_view_limit() {
        return Err(AuthError::DailyViewLimitExceeded);
    }
    Ok(())
}

pub fn require_session_quota(subject: &Subject) -> AuthResult<()> {
    if subject.active_sessions >= subject.tier.session_limit() {
        return Err(AuthError::SessionLimitExceeded);
    }
    Ok(())
}

/// An admin may send a simulation header to view the API as a non-admin
/// user for that one request. Never persisted, never affects other requests.
pub const ADMIN_SIMULATION_HEADER: &str = "x-flexion-simulate-non-admin";

pub fn apply_admin_simulation(subject: &mut Subject, simulate_non_admin: bool) {
    if simulate_non_admin {
        subject.is_admin = false;
    }
}

pub fn is_lead_view_fresh(recorded_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(recorded_at).num_hours() < 24
}
