use crate::record::RawRecord;
use flx_store::lead::DataGrade;

/// The default confidence function `C` from spec.md 4.3. The weighted
/// formula always runs, including when bid and debt are both absent --
/// owner/address/sale_date still carry their own credit in that case.
/// The only branch that bypasses the formula is the verified-surplus-only
/// partial credit below; the flat 0.40 county-verified score belongs to a
/// parser's own `score` override (see `jefferson.rs`), never this default.
pub fn confidence(record: &RawRecord) -> f64 {
    let has_bid = record.winning_bid_cents.map(|c| c > 0).unwrap_or(false);
    let has_debt = record.total_debt_cents.map(|c| c > 0).unwrap_or(false);

    if !has_bid && !has_debt && record.county_verified_surplus {
        return 0.05;
    }

    let has_sale_date = record.sale_date.is_some();
    let address_len = record.property_address.as_deref().map(str::len).unwrap_or(0);
    let owner_len = record.owner_name.as_deref().map(str::len).unwrap_or(0);
    let has_surplus_evidence = has_bid || has_debt || record.estimated_surplus_cents.is_some();

    let bid = record.winning_bid_cents.unwrap_or(0);
    let debt = record.total_debt_cents.unwrap_or(0);
    let naive_surplus = (bid - debt).max(0);
    let reported_surplus = record.estimated_surplus_cents.unwrap_or(naive_surplus);
    let delta_cents = (reported_surplus - naive_surplus).abs();
    let v = if has_surplus_evidence { variance_check(delta_cents) } else { 0.0 };

    let c = 0.25 * bool_to_f(has_bid)
        + 0.25 * bool_to_f(has_debt)
        + 0.15 * bool_to_f(has_sale_date)
        + 0.15 * bool_to_f(address_len > 5)
        + 0.10 * bool_to_f(owner_len > 2)
        + 0.10 * v;

    c.clamp(0.0, 1.0)
}

fn variance_check(delta_cents: i64) -> f64 {
    if delta_cents <= 500 {
        1.0
    } else if delta_cents <= 5_000 {
        0.5
    } else {
        0.0
    }
}

fn bool_to_f(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Grade mapping from spec.md 4.3, applied at extraction time (distinct
/// from the lifecycle engine's periodic re-grade matrix).
pub fn grade(record: &RawRecord, confidence_score: f64) -> DataGrade {
    let surplus = record.surplus_cents();
    if surplus >= 1_000_000 && confidence_score >= 0.8 {
        DataGrade::Gold
    } else if surplus >= 500_000 && confidence_score >= 0.6 {
        DataGrade::Silver
    } else if surplus > 0 {
        DataGrade::Bronze
    } else {
        DataGrade::Iron
    }
}
