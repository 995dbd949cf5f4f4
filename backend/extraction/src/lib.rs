//! Extraction engine: deterministic text extraction, parser routing, and
//! threshold-based persistence. Parser errors never escape this crate;
//! anomalies are logged, not raised.

pub mod anomaly_log;
pub mod error;
pub mod pipeline;
pub mod route;
pub mod text;

pub use anomaly_log::AnomalyLog;
pub use error::{ExtractionError, ExtractionResult};
pub use pipeline::{run_adapter, PipelineCounts};
pub use route::{route_document, AnomalyRecord, RouteOutcome, ENRICHED_THRESHOLD, REVIEW_THRESHOLD};
