use flx_store::lead::Lead;

/// Placeholder values that don't count as "filled in" for completeness
/// purposes, per spec.md 4.6.
const PLACEHOLDERS: &[&str] = &["", "unknown", "n/a", "tbd"];

fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS.contains(&value.trim().to_ascii_lowercase().as_str())
}

fn field_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !is_placeholder(v)).unwrap_or(false)
}

/// Fraction of Tier-2 descriptive fields that are non-empty and non-placeholder.
pub fn completeness(lead: &Lead) -> f64 {
    let fields = [
        field_filled(&lead.county),
        field_filled(&lead.case_number),
        field_filled(&lead.owner_name),
        field_filled(&lead.property_address),
        field_filled(&lead.sale_date),
        lead.winning_bid_cents.is_some(),
        lead.total_debt_cents.is_some(),
    ];
    fields.iter().filter(|f| **f).count() as f64 / fields.len() as f64
}

/// `confidence' = max(0, confidence - age_penalty)`,
/// `age_penalty = max(0, (days_since_updated - 7) / 7) * 0.05`.
pub fn decayed_confidence(confidence: f64, days_since_updated: i64) -> f64 {
    let age_penalty = ((days_since_updated - 7).max(0) as f64 / 7.0) * 0.05;
    (confidence - age_penalty).max(0.0)
}
