use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Scout,
    Operator,
    Sovereign,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Scout => "scout",
            Tier::Operator => "operator",
            Tier::Sovereign => "sovereign",
        }
    }

    /// Monthly subscription-credit allocation per spec.md 4.7.
    pub fn monthly_credits(&self) -> i64 {
        match self {
            Tier::Scout => 25,
            Tier::Operator => 100,
            Tier::Sovereign => 500,
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = StoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scout" => Ok(Tier::Scout),
            "operator" => Ok(Tier::Operator),
            "sovereign" => Ok(Tier::Sovereign),
            other => Err(StoreError::InvalidLead(format!("unknown tier {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttorneyStatus {
    None,
    Pending,
    Verified,
}

impl AttorneyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttorneyStatus::None => "none",
            AttorneyStatus::Pending => "pending",
            AttorneyStatus::Verified => "verified",
        }
    }
}

impl std::str::FromStr for AttorneyStatus {
    type Err = StoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(AttorneyStatus::None),
            "pending" => Ok(AttorneyStatus::Pending),
            "verified" => Ok(AttorneyStatus::Verified),
            other => Err(StoreError::InvalidLead(format!("unknown attorney_status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub tier: String,
    pub email_verified: bool,
    pub attorney_status: String,
    pub bar_number: Option<String>,
    pub is_admin: bool,
    pub deactivated: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn tier(&self) -> StoreResult<Tier> {
        self.tier.parse()
    }

    pub fn attorney_status(&self) -> StoreResult<AttorneyStatus> {
        self.attorney_status.parse()
    }
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> StoreResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| StoreError::LeadNotFound(id.to_string()))
}

pub async fn get_by_email(conn: &mut SqliteConnection, email: &str) -> StoreResult<Option<User>> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(conn)
        .await?)
}

pub async fn insert(conn: &mut SqliteConnection, user: &User) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, tier, email_verified, attorney_status, bar_number, is_admin, deactivated, created_at, updated_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.tier)
    .bind(user.email_verified)
    .bind(&user.attorney_status)
    .bind(&user.bar_number)
    .bind(user.is_admin)
    .bind(user.deactivated)
    .bind(&user.created_at)
    .bind(&user.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_deactivated(conn: &mut SqliteConnection, id: &str, deactivated: bool, now: &str) -> StoreResult<()> {
    sqlx::query("UPDATE users SET deactivated = ?, updated_at = ? WHERE id = ?")
        .bind(deactivated)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_tier(conn: &mut SqliteConnection, id: &str, tier: Tier, now: &str) -> StoreResult<()> {
    sqlx::query("UPDATE users SET tier = ?, updated_at = ? WHERE id = ?")
        .bind(tier.as_str())
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_email_verified(conn: &mut SqliteConnection, id: &str, now: &str) -> StoreResult<()> {
    sqlx::query("UPDATE users SET email_verified = 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_attorney_status(conn: &mut SqliteConnection, id: &str, status: AttorneyStatus, now: &str) -> StoreResult<()> {
    sqlx::query("UPDATE users SET attorney_status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
