mod aggregate;
mod render;
pub mod views;

pub use aggregate::{gap_severity, GapAggregator, DEFAULT_STRENGTHS, DISPLAYED_RECOMMENDATION_COUNT};
pub use render::{mapping_csv, render_markdown};
pub use views::{FinalReport, GapEntry, GapSeverity, ReportSummary};
