use regex::Regex;
use std::sync::OnceLock;

use crate::record::RawRecord;
use crate::registry::Parser;

/// Jefferson County publishes a county-verified excess-funds list: a single
/// surplus figure per case, no bid/debt breakdown. `detect` keys off the
/// list's stable anchor phrase rather than trying to parse the whole page.
pub struct JeffersonExcessFundsParser;

const ANCHOR_PHRASE: &str = "Jefferson County Excess Funds";

fn surplus_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Excess Funds:\s*\$\s?([\d,]+\.\d{2})").unwrap())
}

fn case_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Case\s*#?:?\s*([0-9]{2,4}-CV-[0-9]{3,6})").unwrap())
}

fn owner_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Former Owner:\s*([A-Za-z .,'-]+)").unwrap())
}

impl Parser for JeffersonExcessFundsParser {
    fn name(&self) -> &'static str {
        "jefferson_excess_funds"
    }

    fn detect(&self, text: &str) -> bool {
        text.contains(ANCHOR_PHRASE)
    }

    fn extract(&self, text: &str) -> Vec<RawRecord> {
        let Some(surplus_cap) = surplus_re().captures(text) else {
            return Vec::new();
        };
        let Some(surplus_cents) = parse_dollars_to_cents(&surplus_cap[1]) else {
            return Vec::new();
        };
        let case_number = case_number_re().captures(text).map(|c| c[1].to_string());
        let owner_name = owner_re().captures(text).map(|c| c[1].trim().to_string());

        vec![RawRecord {
            county: Some("jefferson".to_string()),
            case_number,
            owner_name,
            estimated_surplus_cents: Some(surplus_cents),
            county_verified_surplus: true,
            ..Default::default()
        }]
    }

    /// A single published surplus figure from a county-verified list is
    /// worth 0.40 on its own, per spec.md 4.3's county-override allowance.
    fn score(&self, record: &RawRecord) -> f64 {
        if record.county_verified_surplus {
            0.40
        } else {
            crate::score::confidence(record)
        }
    }
}

fn parse_dollars_to_cents(captured: &str) -> Option<i64> {
    let cleaned: String = captured.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let dollars: f64 = cleaned.parse().ok()?;
    Some((dollars * 100.0).round() as i64)
}
