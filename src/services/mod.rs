pub mod aggregator;
pub mod categorizer;
pub mod dedup;
pub mod detail_visitor;
pub mod extractor;
pub mod pagination;
pub mod report_sink;

pub use aggregator::Aggregator;
pub use categorizer::Categorizer;
pub use dedup::Deduplicator;
pub use detail_visitor::{dismiss_consent, DetailVisitor, VisitCtx};
pub use extractor::RecordExtractor;
pub use pagination::{PageHandler, PaginationController, PaginationOutcome, StopReason};
pub use report_sink::ReportSink;
