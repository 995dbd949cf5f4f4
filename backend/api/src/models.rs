use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flx_store::lead::{Lead, LeadStatus};

/// Public-fields-only projection. No owner name, a coarsened surplus, and a
/// city hint instead of a full street address -- this is what unauthenticated
/// listing and preview endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct SafeLead {
    pub id: String,
    pub county: Option<String>,
    pub city_hint: Option<String>,
    pub surplus_amount: i64,
    pub data_grade: String,
    pub status: String,
    pub days_remaining: Option<i64>,
}

/// Everything, including owner name and full address. Only returned by a
/// successful unlock, and by cached re-reads for the same user that already
/// paid for it.
#[derive(Debug, Clone, Serialize)]
pub struct FullLead {
    pub id: String,
    pub county: Option<String>,
    pub case_number: Option<String>,
    pub owner_name: Option<String>,
    pub property_address: Option<String>,
    pub winning_bid_cents: Option<i64>,
    pub total_debt_cents: Option<i64>,
    pub surplus_amount_cents: i64,
    pub sale_date: Option<String>,
    pub claim_deadline: Option<String>,
    pub data_grade: String,
    pub status: String,
    pub days_remaining: Option<i64>,
}

/// Round to the nearest $100 -- `surplus_amount_cents` is in cents, this
/// returns whole dollars.
fn round_surplus_dollars(cents: i64) -> i64 {
    let dollars = cents / 100;
    ((dollars + 50) / 100) * 100
}

/// The city hint is the last comma-delimited segment of the address, e.g.
/// `"123 Main St, Golden, CO 80401"` -> `"CO 80401"`. Falls back to `None`
/// for an address with no comma.
fn city_hint(address: &str) -> Option<String> {
    address.rsplit(',').next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn days_remaining(claim_deadline: Option<chrono::NaiveDate>, now: DateTime<Utc>) -> Option<i64> {
    claim_deadline.map(|deadline| (deadline - now.date_naive()).num_days())
}

impl SafeLead {
    pub fn from_lead(lead: &Lead, now: DateTime<Utc>, restriction_months: u32) -> Self {
        let status = lead.status(now, restriction_months);
        Self {
            id: lead.id.clone(),
            county: lead.county.clone(),
            city_hint: lead.property_address.as_deref().and_then(city_hint),
            surplus_amount: round_surplus_dollars(lead.surplus_amount_cents),
            data_grade: lead.data_grade.clone(),
            status: status.as_str().to_string(),
            days_remaining: days_remaining(lead.claim_deadline_naive(), now),
        }
    }
}

impl FullLead {
    pub fn from_lead(lead: &Lead, now: DateTime<Utc>, restriction_months: u32) -> Self {
        let status = lead.status(now, restriction_months);
        Self {
            id: lead.id.clone(),
            county: lead.county.clone(),
            case_number: lead.case_number.clone(),
            owner_name: lead.owner_name.clone(),
            property_address: lead.property_address.clone(),
            winning_bid_cents: lead.winning_bid_cents,
            total_debt_cents: lead.total_debt_cents,
            surplus_amount_cents: lead.surplus_amount_cents,
            sale_date: lead.sale_date.clone(),
            claim_deadline: lead.claim_deadline.clone(),
            data_grade: lead.data_grade.clone(),
            status: status.as_str().to_string(),
            days_remaining: days_remaining(lead.claim_deadline_naive(), now),
        }
    }
}

pub fn lead_status(lead: &Lead, now: DateTime<Utc>, restriction_months: u32) -> LeadStatus {
    lead.status(now, restriction_months)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub founders_slot: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub tier: String,
    pub email_verified: bool,
    pub attorney_status: String,
    pub subscription_credits: i64,
    pub purchased_credits: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UnlockRequest {
    #[serde(default)]
    pub disclaimer_accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub lead: FullLead,
    pub credits_spent: i64,
    pub already_unlocked: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub tier: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct LeadListQuery {
    pub county: Option<String>,
    pub grade: Option<String>,
    pub min_surplus_cents: Option<i64>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}
