use regex::Regex;
use std::sync::OnceLock;

const WHALE_CAP_THRESHOLD_CENTS: i64 = 1_000_000_00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsFlag {
    WhaleCap,
    DateGlitch,
    RatioTest,
}

impl BsFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BsFlag::WhaleCap => "WHALE_CAP",
            BsFlag::DateGlitch => "DATE_GLITCH",
            BsFlag::RatioTest => "RATIO_TEST",
        }
    }
}

fn date_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(19|20)\d{6}$").unwrap())
}

/// Data-quality flags from spec.md 4.6. These are recorded for review, not
/// auto-quarantine: a flagged lead keeps its grade.
pub fn detect(surplus_cents: i64, total_debt_cents: Option<i64>) -> Vec<BsFlag> {
    let mut flags = Vec::new();

    if surplus_cents > WHALE_CAP_THRESHOLD_CENTS {
        flags.push(BsFlag::WhaleCap);
    }

    let surplus_dollars = surplus_cents / 100;
    if date_like_re().is_match(&surplus_dollars.to_string()) {
        flags.push(BsFlag::DateGlitch);
    }

    if let Some(debt) = total_debt_cents {
        if debt > 0 && surplus_cents as f64 > 0.5 * debt as f64 {
            flags.push(BsFlag::RatioTest);
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whale_cap_flags_surplus_over_one_million_dollars() {
        let flags = detect(150_000_000_00, None);
        assert!(flags.contains(&BsFlag::WhaleCap));
    }

    #[test]
    fn date_glitch_flags_yyyymmdd_shaped_surplus() {
        // $20,250,615 surplus looks exactly like a 2025-06-15 date.
        let flags = detect(20_250_615_00, None);
        assert!(flags.contains(&BsFlag::DateGlitch));
    }

    #[test]
    fn ratio_test_flags_surplus_over_half_of_debt() {
        let flags = detect(60_000_00, Some(100_000_00));
        assert!(flags.contains(&BsFlag::RatioTest));
    }

    #[test]
    fn clean_record_has_no_flags() {
        let flags = detect(50_000_00, Some(400_000_00));
        assert!(flags.is_empty());
    }
}
