//! Parser registry: a closed, ordered set of document parsers ending in a
//! permissive generic fallback, plus the default confidence/grade scorer.

pub mod generic;
pub mod jefferson;
pub mod record;
pub mod registry;
pub mod score;

pub use generic::GenericParser;
pub use jefferson::JeffersonExcessFundsParser;
pub use record::RawRecord;
pub use registry::{Parser, ParserRegistry, ScoredRecord};

/// The production registry: county-specific parsers first, generic last so
/// nothing is ever silently dropped.
pub fn default_registry() -> ParserRegistry {
    ParserRegistry::new(vec![Box::new(JeffersonExcessFundsParser), Box::new(GenericParser)])
}
