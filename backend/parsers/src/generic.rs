use regex::Regex;
use std::sync::OnceLock;

use crate::record::RawRecord;
use crate::registry::Parser;

/// The permissive fallback every registry must end with so no document is
/// silently dropped. Pulls whatever money/date fields a generic regex
/// sweep can find; leaves the rest `None` for the confidence function to
/// penalize honestly.
pub struct GenericParser;

fn money_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\s?([\d,]+(?:\.\d{2})?)").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap())
}

fn case_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{2,4}-[A-Z]{2}-\d{3,6})\b").unwrap())
}

fn parse_money_cents(captured: &str) -> Option<i64> {
    let cleaned: String = captured.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let dollars: f64 = cleaned.parse().ok()?;
    Some((dollars * 100.0).round() as i64)
}

impl Parser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn detect(&self, _text: &str) -> bool {
        true
    }

    fn extract(&self, text: &str) -> Vec<RawRecord> {
        let amounts: Vec<i64> = money_re().captures_iter(text).filter_map(|c| parse_money_cents(&c[1])).collect();
        let sale_date = date_re().captures(text).map(|c| c[1].to_string());
        let case_number = case_number_re().captures(text).map(|c| c[1].to_string());

        // Heuristic only: the largest figure mentioned is usually the debt,
        // the next largest the winning bid. A county-specific parser
        // should supersede this wherever the format is actually known.
        let mut sorted = amounts.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let (total_debt_cents, winning_bid_cents) = match sorted.as_slice() {
            [debt, bid, ..] => (Some(*debt), Some(*bid)),
            [only] => (Some(*only), None),
            [] => (None, None),
        };

        vec![RawRecord { case_number, winning_bid_cents, total_debt_cents, sale_date, ..Default::default() }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_parser_always_detects() {
        assert!(GenericParser.detect("anything at all"));
    }

    #[test]
    fn generic_parser_extracts_money_and_date() {
        let text = "Case 24-CV-00123 sold 2025-03-14. Debt $45,000.00, winning bid $52,500.00.";
        let records = GenericParser.extract(text);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.case_number.as_deref(), Some("24-CV-00123"));
        assert_eq!(r.sale_date.as_deref(), Some("2025-03-14"));
        assert_eq!(r.total_debt_cents, Some(4_500_000));
        assert_eq!(r.winning_bid_cents, Some(5_250_000));
    }
}
