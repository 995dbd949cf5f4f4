use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::error::{StoreError, StoreResult};
use crate::events::{self, EventType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataGrade {
    Gold,
    Silver,
    Bronze,
    Iron,
    Reject,
    PipelineStaging,
}

impl DataGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataGrade::Gold => "GOLD",
            DataGrade::Silver => "SILVER",
            DataGrade::Bronze => "BRONZE",
            DataGrade::Iron => "IRON",
            DataGrade::Reject => "REJECT",
            DataGrade::PipelineStaging => "PIPELINE_STAGING",
        }
    }

    /// Total ordering used by the "never downgrade during extraction" rule.
    pub fn rank(&self) -> u8 {
        match self {
            DataGrade::Reject => 0,
            DataGrade::PipelineStaging => 1,
            DataGrade::Iron => 2,
            DataGrade::Bronze => 3,
            DataGrade::Silver => 4,
            DataGrade::Gold => 5,
        }
    }

    pub fn credits_required(&self) -> i64 {
        match self {
            DataGrade::Gold => 3,
            DataGrade::Silver => 2,
            _ => 1,
        }
    }
}

impl std::str::FromStr for DataGrade {
    type Err = StoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GOLD" => Ok(DataGrade::Gold),
            "SILVER" => Ok(DataGrade::Silver),
            "BRONZE" => Ok(DataGrade::Bronze),
            "IRON" => Ok(DataGrade::Iron),
            "REJECT" => Ok(DataGrade::Reject),
            "PIPELINE_STAGING" => Ok(DataGrade::PipelineStaging),
            other => Err(StoreError::InvalidLead(format!("unknown data_grade {other}"))),
        }
    }
}

/// Final-sale records and pre-sale/continuance notices carry the same
/// fields but mean very different things when surplus data is absent --
/// see `VERTEX_GHOST_ZERO_VALUE` in the lifecycle crate's quarantine sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    SaleResult,
    PreSaleNotice,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::SaleResult => "SALE_RESULT",
            DocumentType::PreSaleNotice => "PRE_SALE_NOTICE",
            DocumentType::Unknown => "UNKNOWN",
        }
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Unknown
    }
}

impl std::str::FromStr for DocumentType {
    type Err = StoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALE_RESULT" => Ok(DocumentType::SaleResult),
            "PRE_SALE_NOTICE" => Ok(DocumentType::PreSaleNotice),
            "UNKNOWN" => Ok(DocumentType::Unknown),
            other => Err(StoreError::InvalidLead(format!("unknown document_type {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStage {
    Staged,
    Enriched,
    ReviewRequired,
    Quarantined,
}

impl LeadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStage::Staged => "STAGED",
            LeadStage::Enriched => "ENRICHED",
            LeadStage::ReviewRequired => "REVIEW_REQUIRED",
            LeadStage::Quarantined => "QUARANTINED",
        }
    }
}

impl std::str::FromStr for LeadStage {
    type Err = StoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STAGED" => Ok(LeadStage::Staged),
            "ENRICHED" => Ok(LeadStage::Enriched),
            "REVIEW_REQUIRED" => Ok(LeadStage::ReviewRequired),
            "QUARANTINED" => Ok(LeadStage::Quarantined),
            other => Err(StoreError::InvalidLead(format!("unknown status {other}"))),
        }
    }
}

/// Runtime-computed eligibility status. Never stored -- always derived from
/// dates at read time against an injected clock, per the design note that
/// status must not rot into a stale column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    Expired,
    Restricted,
    Actionable,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Expired => "EXPIRED",
            LeadStatus::Restricted => "RESTRICTED",
            LeadStatus::Actionable => "ACTIONABLE",
        }
    }
}

/// `status(lead, now)` from spec.md 4.6. Calendar-month arithmetic for the
/// restriction window, not a flat day count.
pub fn derive_status(
    sale_date: Option<NaiveDate>,
    claim_deadline: Option<NaiveDate>,
    now: DateTime<Utc>,
    restriction_months: u32,
) -> LeadStatus {
    let today = now.date_naive();
    if let Some(deadline) = claim_deadline {
        if deadline < today {
            return LeadStatus::Expired;
        }
    }
    if let Some(sale) = sale_date {
        if today < add_calendar_months(sale, restriction_months) {
            return LeadStatus::Restricted;
        }
    }
    LeadStatus::Actionable
}

fn add_calendar_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total_months = date.month0() as i32 + months as i32;
    let year = date.year() + total_months / 12;
    let month0 = (total_months % 12) as u32;
    let last_day = days_in_month(year, month0 + 1);
    NaiveDate::from_ymd_opt(year, month0 + 1, date.day().min(last_day))
        .expect("clamped day is always valid")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid next-month anchor");
    let this = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month anchor");
    (next - this).num_days() as u32
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: String,
    pub county: Option<String>,
    pub case_number: Option<String>,
    pub owner_name: Option<String>,
    pub property_address: Option<String>,
    pub winning_bid_cents: Option<i64>,
    pub total_debt_cents: Option<i64>,
    pub surplus_amount_cents: i64,
    pub overbid_amount_cents: Option<i64>,
    pub estimated_surplus_cents: Option<i64>,
    pub sale_date: Option<String>,
    pub claim_deadline: Option<String>,
    pub confidence_score: f64,
    pub data_grade: String,
    pub source_url: Option<String>,
    pub source_hash: Option<String>,
    pub parser_name: Option<String>,
    pub extracted_at: Option<String>,
    pub status: String,
    pub attorney_packet_ready: bool,
    pub record_hash: String,
    pub document_type: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Lead {
    pub fn grade(&self) -> StoreResult<DataGrade> {
        self.data_grade.parse()
    }

    pub fn document_type(&self) -> StoreResult<DocumentType> {
        self.document_type.parse()
    }

    pub fn stage(&self) -> StoreResult<LeadStage> {
        self.status.parse()
    }

    pub fn sale_date_naive(&self) -> Option<NaiveDate> {
        self.sale_date.as_deref().and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    pub fn claim_deadline_naive(&self) -> Option<NaiveDate> {
        self.claim_deadline
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    pub fn status(&self, now: DateTime<Utc>, restriction_months: u32) -> LeadStatus {
        derive_status(self.sale_date_naive(), self.claim_deadline_naive(), now, restriction_months)
    }

    fn recompute_attorney_packet_ready(&mut self, has_provenance: bool) {
        self.attorney_packet_ready = non_empty(&self.county)
            && non_empty(&self.case_number)
            && non_empty(&self.owner_name)
            && self.sale_date.is_some()
            && self.surplus_amount_cents > 0
            && has_provenance;
    }
}

fn non_empty(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// A newly extracted record, not yet a canonical `Lead` row. Upstream of the
/// store, `confidence_score`/`data_grade` come from the parser registry.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewLeadFields {
    pub county: Option<String>,
    pub case_number: Option<String>,
    pub owner_name: Option<String>,
    pub property_address: Option<String>,
    pub winning_bid_cents: Option<i64>,
    pub total_debt_cents: Option<i64>,
    pub overbid_amount_cents: Option<i64>,
    pub estimated_surplus_cents: Option<i64>,
    pub sale_date: Option<String>,
    pub claim_deadline: Option<String>,
    pub confidence_score: f64,
    pub data_grade: DataGrade,
    pub source_url: Option<String>,
    pub source_hash: String,
    pub parser_name: String,
    pub record_hash: String,
    pub document_type: DocumentType,
    pub target_stage: LeadStage,
}

impl Default for LeadStage {
    fn default() -> Self {
        LeadStage::Staged
    }
}

impl NewLeadFields {
    pub fn surplus_cents(&self) -> i64 {
        match (self.winning_bid_cents, self.total_debt_cents) {
            (Some(bid), Some(debt)) => (bid - debt).max(0),
            _ => self.estimated_surplus_cents.unwrap_or(0).max(0),
        }
    }
}

pub enum UpsertOutcome {
    Inserted(Lead),
    Updated(Lead),
}

/// Upsert by `(county, case_number)` when both are present, else by
/// `record_hash`. Field merge is COALESCE-on-null; confidence and grade use
/// max-of so extraction never silently downgrades a lead. Emits a
/// `PipelineEvent` for the write.
pub async fn upsert(
    conn: &mut SqliteConnection,
    fields: NewLeadFields,
    now: DateTime<Utc>,
) -> StoreResult<UpsertOutcome> {
    let existing = find_match(conn, &fields).await?;
    let now_str = now.to_rfc3339();

    match existing {
        Some(mut current) => {
            let old_grade = current.data_grade.clone();
            merge_fields(&mut current, &fields);
            current.updated_at = now_str.clone();
            let has_provenance = count_provenance(conn, &current.id).await? > 0 || fields.source_url.is_some();
            current.recompute_attorney_packet_ready(has_provenance);
            if current.status != LeadStage::Quarantined.as_str() {
                current.status = fields.target_stage.as_str().to_string();
            }

            sqlx::query(
                "UPDATE leads SET county=?, case_number=?, owner_name=?, property_address=?, \
                 winning_bid_cents=?, total_debt_cents=?, surplus_amount_cents=?, overbid_amount_cents=?, \
                 estimated_surplus_cents=?, sale_date=?, claim_deadline=?, confidence_score=?, data_grade=?, \
                 source_url=?, source_hash=?, parser_name=?, extracted_at=?, status=?, attorney_packet_ready=?, \
                 document_type=?, updated_at=? \
                 WHERE id=?",
            )
            .bind(&current.county)
            .bind(&current.case_number)
            .bind(&current.owner_name)
            .bind(&current.property_address)
            .bind(current.winning_bid_cents)
            .bind(current.total_debt_cents)
            .bind(current.surplus_amount_cents)
            .bind(current.overbid_amount_cents)
            .bind(current.estimated_surplus_cents)
            .bind(&current.sale_date)
            .bind(&current.claim_deadline)
            .bind(current.confidence_score)
            .bind(&current.data_grade)
            .bind(&current.source_url)
            .bind(&current.source_hash)
            .bind(&current.parser_name)
            .bind(&current.extracted_at)
            .bind(&current.status)
            .bind(current.attorney_packet_ready)
            .bind(&current.document_type)
            .bind(&current.updated_at)
            .bind(&current.id)
            .execute(&mut *conn)
            .await?;

            if let Some(url) = &fields.source_url {
                insert_provenance(conn, &current.id, Some(url.as_str()), &fields.source_hash, &fields.parser_name, &now_str).await?;
            }

            if old_grade != current.data_grade {
                events::record(
                    conn,
                    &current.id,
                    EventType::GradeChange,
                    Some(&old_grade),
                    Some(&current.data_grade),
                    "extraction-engine",
                    None,
                    now,
                )
                .await?;
            }

            Ok(UpsertOutcome::Updated(current))
        }
        None => {
            let id = flx_crypto::lead_id(fields.county.as_deref().unwrap_or("unknown"), &fields.record_hash);
            let surplus = fields.surplus_cents();
            let lead = Lead {
                id: id.clone(),
                county: fields.county.clone(),
                case_number: fields.case_number.clone(),
                owner_name: fields.owner_name.clone(),
                property_address: fields.property_address.clone(),
                winning_bid_cents: fields.winning_bid_cents,
                total_debt_cents: fields.total_debt_cents,
                surplus_amount_cents: surplus,
                overbid_amount_cents: fields.overbid_amount_cents,
                estimated_surplus_cents: fields.estimated_surplus_cents,
                sale_date: fields.sale_date.clone(),
                claim_deadline: fields.claim_deadline.clone(),
                confidence_score: fields.confidence_score,
                data_grade: fields.data_grade.as_str().to_string(),
                source_url: fields.source_url.clone(),
                source_hash: Some(fields.source_hash.clone()),
                parser_name: Some(fields.parser_name.clone()),
                extracted_at: Some(now_str.clone()),
                status: fields.target_stage.as_str().to_string(),
                attorney_packet_ready: false,
                record_hash: fields.record_hash.clone(),
                document_type: fields.document_type.as_str().to_string(),
                created_at: now_str.clone(),
                updated_at: now_str.clone(),
            };

            sqlx::query(
                "INSERT INTO leads (id, county, case_number, owner_name, property_address, \
                 winning_bid_cents, total_debt_cents, surplus_amount_cents, overbid_amount_cents, \
                 estimated_surplus_cents, sale_date, claim_deadline, confidence_score, data_grade, \
                 source_url, source_hash, parser_name, extracted_at, status, attorney_packet_ready, \
                 record_hash, document_type, created_at, updated_at) \
                 VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
            )
            .bind(&lead.id)
            .bind(&lead.county)
            .bind(&lead.case_number)
            .bind(&lead.owner_name)
            .bind(&lead.property_address)
            .bind(lead.winning_bid_cents)
            .bind(lead.total_debt_cents)
            .bind(lead.surplus_amount_cents)
            .bind(lead.overbid_amount_cents)
            .bind(lead.estimated_surplus_cents)
            .bind(&lead.sale_date)
            .bind(&lead.claim_deadline)
            .bind(lead.confidence_score)
            .bind(&lead.data_grade)
            .bind(&lead.source_url)
            .bind(&lead.source_hash)
            .bind(&lead.parser_name)
            .bind(&lead.extracted_at)
            .bind(&lead.status)
            .bind(lead.attorney_packet_ready)
            .bind(&lead.record_hash)
            .bind(&lead.document_type)
            .bind(&lead.created_at)
            .bind(&lead.updated_at)
            .execute(&mut *conn)
            .await?;

            if let Some(url) = &lead.source_url {
                insert_provenance(conn, &lead.id, Some(url.as_str()), &fields.source_hash, &fields.parser_name, &now_str).await?;
            }

            events::record(conn, &lead.id, EventType::ScraperSuccess, None, Some(&lead.data_grade), "extraction-engine", None, now).await?;

            Ok(UpsertOutcome::Inserted(lead))
        }
    }
}

async fn find_match(conn: &mut SqliteConnection, fields: &NewLeadFields) -> StoreResult<Option<Lead>> {
    if let (Some(county), Some(case_number)) = (&fields.county, &fields.case_number) {
        if let Some(lead) = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE county = ? AND case_number = ?")
            .bind(county)
            .bind(case_number)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(Some(lead));
        }
    }
    let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE record_hash = ?")
        .bind(&fields.record_hash)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(lead)
}

fn merge_fields(current: &mut Lead, incoming: &NewLeadFields) {
    coalesce(&mut current.county, &incoming.county);
    coalesce(&mut current.case_number, &incoming.case_number);
    coalesce(&mut current.owner_name, &incoming.owner_name);
    coalesce(&mut current.property_address, &incoming.property_address);
    coalesce_num(&mut current.winning_bid_cents, incoming.winning_bid_cents);
    coalesce_num(&mut current.total_debt_cents, incoming.total_debt_cents);
    coalesce_num(&mut current.overbid_amount_cents, incoming.overbid_amount_cents);
    coalesce_num(&mut current.estimated_surplus_cents, incoming.estimated_surplus_cents);
    coalesce(&mut current.sale_date, &incoming.sale_date);
    coalesce(&mut current.claim_deadline, &incoming.claim_deadline);
    coalesce(&mut current.source_url, &incoming.source_url);

    let incoming_surplus = incoming.surplus_cents();
    current.surplus_amount_cents = current.surplus_amount_cents.max(incoming_surplus);

    // Confidence and grade use max-of: extraction never downgrades a lead.
    if incoming.confidence_score > current.confidence_score {
        current.confidence_score = incoming.confidence_score;
    }
    if incoming.data_grade.rank() > current.data_grade.parse::<DataGrade>().map(|g| g.rank()).unwrap_or(0) {
        current.data_grade = incoming.data_grade.as_str().to_string();
    }
    current.source_hash = Some(incoming.source_hash.clone());
    current.parser_name = Some(incoming.parser_name.clone());

    if current.document_type == DocumentType::Unknown.as_str() {
        current.document_type = incoming.document_type.as_str().to_string();
    }
}

fn coalesce(field: &mut Option<String>, incoming: &Option<String>) {
    if field.is_none() {
        *field = incoming.clone();
    }
}

fn coalesce_num(field: &mut Option<i64>, incoming: Option<i64>) {
    if field.is_none() {
        *field = incoming;
    }
}

async fn insert_provenance(
    conn: &mut SqliteConnection,
    lead_id: &str,
    source_url: Option<&str>,
    source_hash: &str,
    parser_name: &str,
    now: &str,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO lead_provenance (lead_id, source_url, source_hash, parser_name, extracted_at) VALUES (?,?,?,?,?)",
    )
    .bind(lead_id)
    .bind(source_url)
    .bind(source_hash)
    .bind(parser_name)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn count_provenance(conn: &mut SqliteConnection, lead_id: &str) -> StoreResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lead_provenance WHERE lead_id = ?")
        .bind(lead_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Lead> {
    sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| StoreError::LeadNotFound(id.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub county: Option<String>,
    pub grade: Option<DataGrade>,
    pub min_surplus_cents: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

pub async fn list(conn: &mut SqliteConnection, filter: &LeadFilter, page: Page) -> StoreResult<Vec<Lead>> {
    let mut sql = String::from("SELECT * FROM leads WHERE status != 'QUARANTINED'");
    if filter.county.is_some() {
        sql.push_str(" AND county = ?");
    }
    if filter.grade.is_some() {
        sql.push_str(" AND data_grade = ?");
    }
    if filter.min_surplus_cents.is_some() {
        sql.push_str(" AND surplus_amount_cents >= ?");
    }
    sql.push_str(" ORDER BY surplus_amount_cents DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, Lead>(&sql);
    if let Some(c) = &filter.county {
        query = query.bind(c);
    }
    if let Some(g) = &filter.grade {
        query = query.bind(g.as_str());
    }
    if let Some(m) = filter.min_surplus_cents {
        query = query.bind(m);
    }
    query = query.bind(page.limit).bind(page.offset);

    Ok(query.fetch_all(conn).await?)
}

pub async fn count_active(conn: &mut SqliteConnection) -> StoreResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads WHERE status != 'QUARANTINED'").fetch_one(conn).await?;
    Ok(count)
}

/// Whether `user_id` has already spent credits to unlock `lead_id`, per the
/// `unlocks` ledger written by `flx_wallet::unlock::unlock`. Backs the
/// dossier-download endpoint's "already paid for this" check.
pub async fn is_unlocked_by(conn: &mut SqliteConnection, user_id: &str, lead_id: &str) -> StoreResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM unlocks WHERE user_id = ? AND lead_id = ?")
        .bind(user_id)
        .bind(lead_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}


impl Default for DataGrade {
    fn default() -> Self {
        DataGrade::Iron
    }
}
