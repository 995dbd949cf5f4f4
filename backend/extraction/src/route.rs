use chrono::{DateTime, Utc};
use flx_store::lead::{self, DocumentType, LeadStage, NewLeadFields, UpsertOutcome};
use flx_store::StoreResult;
use flx_parsers::ParserRegistry;
use sqlx::SqliteConnection;

pub const ENRICHED_THRESHOLD: f64 = 0.80;
pub const REVIEW_THRESHOLD: f64 = 0.50;

#[derive(Debug, Clone, serde::Serialize)]
pub struct AnomalyRecord {
    pub source_url: Option<String>,
    pub parser_name: &'static str,
    pub confidence_score: f64,
    pub reason: &'static str,
    pub logged_at: String,
}

pub enum RouteOutcome {
    Persisted(UpsertOutcome),
    Anomaly(AnomalyRecord),
}

/// Scans one document's text, routes through the parser registry, and
/// applies the threshold table from spec.md 4.4. Records at or below
/// `REVIEW_THRESHOLD` are never persisted -- only logged as anomalies.
pub async fn route_document(
    conn: &mut SqliteConnection,
    registry: &ParserRegistry,
    text: &str,
    source_url: Option<&str>,
    document_type: DocumentType,
    now: DateTime<Utc>,
) -> StoreResult<Vec<RouteOutcome>> {
    let scored = registry.route_and_score(text);
    let mut outcomes = Vec::with_capacity(scored.len());

    for scored_record in scored {
        if scored_record.confidence_score <= REVIEW_THRESHOLD {
            outcomes.push(RouteOutcome::Anomaly(AnomalyRecord {
                source_url: source_url.map(str::to_string),
                parser_name: scored_record.parser_name,
                confidence_score: scored_record.confidence_score,
                reason: "below review threshold",
                logged_at: now.to_rfc3339(),
            }));
            continue;
        }

        let target_stage =
            if scored_record.confidence_score > ENRICHED_THRESHOLD { LeadStage::Enriched } else { LeadStage::ReviewRequired };

        let record = scored_record.record;
        let record_json = serde_json::json!({
            "county": record.county,
            "case_number": record.case_number,
            "owner_name": record.owner_name,
            "property_address": record.property_address,
            "winning_bid_cents": record.winning_bid_cents,
            "total_debt_cents": record.total_debt_cents,
            "sale_date": record.sale_date,
        });
        let record_hash = flx_crypto::record_hash(&record_json);
        let source_hash = source_url.map(|s| flx_crypto::sha256_hex(s.as_bytes())).unwrap_or_else(|| record_hash.clone());

        let fields = NewLeadFields {
            county: record.county,
            case_number: record.case_number,
            owner_name: record.owner_name,
            property_address: record.property_address,
            winning_bid_cents: record.winning_bid_cents,
            total_debt_cents: record.total_debt_cents,
            overbid_amount_cents: record.overbid_amount_cents,
            estimated_surplus_cents: record.estimated_surplus_cents,
            sale_date: record.sale_date,
            claim_deadline: None,
            confidence_score: scored_record.confidence_score,
            data_grade: scored_record.data_grade,
            source_url: source_url.map(str::to_string),
            source_hash,
            parser_name: scored_record.parser_name.to_string(),
            record_hash,
            document_type,
            target_stage,
        };

        let outcome = lead::upsert(conn, fields, now).await?;
        outcomes.push(RouteOutcome::Persisted(outcome));
    }

    Ok(outcomes)
}
