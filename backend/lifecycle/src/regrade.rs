use flx_store::lead::DataGrade;

/// The periodic re-grade matrix from spec.md 4.6 -- distinct from the
/// extraction-time grade mapping in `flx-parsers`. Re-grading can move a
/// lead down (to BRONZE or REJECT) where extraction-time scoring never
/// downgrades.
pub fn regrade(completeness: f64, decayed_confidence: f64, surplus_cents: i64, days_to_deadline: i64) -> DataGrade {
    if days_to_deadline <= 0 || decayed_confidence < 0.2 || surplus_cents <= 0 {
        return DataGrade::Reject;
    }
    if (completeness - 1.0).abs() < f64::EPSILON && decayed_confidence >= 0.7 && surplus_cents > 0 && days_to_deadline > 30 {
        return DataGrade::Gold;
    }
    if completeness >= 0.8 && decayed_confidence >= 0.5 && surplus_cents > 0 {
        return DataGrade::Silver;
    }
    DataGrade::Bronze
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_takes_priority_over_everything() {
        assert_eq!(regrade(1.0, 0.9, 100_000_00, 0), DataGrade::Reject);
        assert_eq!(regrade(1.0, 0.1, 100_000_00, 60), DataGrade::Reject);
        assert_eq!(regrade(1.0, 0.9, 0, 60), DataGrade::Reject);
    }

    #[test]
    fn gold_requires_perfect_completeness_and_runway() {
        assert_eq!(regrade(1.0, 0.7, 50_000_00, 31), DataGrade::Gold);
        assert_eq!(regrade(0.99, 0.7, 50_000_00, 31), DataGrade::Bronze);
        assert_eq!(regrade(1.0, 0.7, 50_000_00, 30), DataGrade::Bronze);
    }

    #[test]
    fn silver_is_the_mid_tier() {
        assert_eq!(regrade(0.85, 0.55, 10_000_00, 60), DataGrade::Silver);
    }
}
