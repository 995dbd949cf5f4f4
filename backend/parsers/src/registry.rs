use flx_store::lead::DataGrade;

use crate::record::RawRecord;

/// Contract from spec.md 4.3. `detect` must be cheap; `extract`/`score`/
/// `grade` only run once a parser has already claimed the document.
pub trait Parser: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, text: &str) -> bool;
    fn extract(&self, text: &str) -> Vec<RawRecord>;

    fn score(&self, record: &RawRecord) -> f64 {
        crate::score::confidence(record)
    }

    fn grade(&self, record: &RawRecord, confidence_score: f64) -> DataGrade {
        crate::score::grade(record, confidence_score)
    }
}

pub struct ScoredRecord {
    pub parser_name: &'static str,
    pub record: RawRecord,
    pub confidence_score: f64,
    pub data_grade: DataGrade,
}

/// Parsers are tried in declared order; first match wins. The registry
/// must be constructed with the generic parser last so no document is
/// silently dropped.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn Parser>>,
}

impl ParserRegistry {
    pub fn new(parsers: Vec<Box<dyn Parser>>) -> Self {
        Self { parsers }
    }

    pub fn route(&self, text: &str) -> Option<(&dyn Parser, Vec<RawRecord>)> {
        for parser in &self.parsers {
            if parser.detect(text) {
                let records = parser.extract(text);
                return Some((parser.as_ref(), records));
            }
        }
        None
    }

    pub fn route_and_score(&self, text: &str) -> Vec<ScoredRecord> {
        let Some((parser, records)) = self.route(text) else {
            return Vec::new();
        };
        records
            .into_iter()
            .map(|record| {
                let confidence_score = parser.score(&record);
                let data_grade = parser.grade(&record, confidence_score);
                ScoredRecord { parser_name: parser.name(), record, confidence_score, data_grade }
            })
            .collect()
    }
}
