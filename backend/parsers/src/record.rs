use serde::{Deserialize, Serialize};

/// A record pulled straight out of document text, before confidence
/// scoring or grading. Money fields are already in cents to keep the
/// scorer's arithmetic exact.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawRecord {
    pub county: Option<String>,
    pub case_number: Option<String>,
    pub owner_name: Option<String>,
    pub property_address: Option<String>,
    pub winning_bid_cents: Option<i64>,
    pub total_debt_cents: Option<i64>,
    pub overbid_amount_cents: Option<i64>,
    pub estimated_surplus_cents: Option<i64>,
    pub sale_date: Option<String>,
    /// Set only by county-verified excess-funds sources where a single
    /// published surplus figure stands on its own without bid/debt.
    pub county_verified_surplus: bool,
}

impl RawRecord {
    pub fn surplus_cents(&self) -> i64 {
        match (self.winning_bid_cents, self.total_debt_cents) {
            (Some(bid), Some(debt)) => (bid - debt).max(0),
            _ => self.estimated_surplus_cents.unwrap_or(0).max(0),
        }
    }
}
