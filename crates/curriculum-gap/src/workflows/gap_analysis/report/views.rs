use super::super::domain::{Mapping, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GapSeverity {
    High,
    Medium,
    Low,
}

impl GapSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// A standard topic the curriculum covers only partially or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapEntry {
    /// 1-based position of the source record in the full mapping.
    pub id: usize,
    pub topic: String,
    pub severity: GapSeverity,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Display form of the coverage percentage, e.g. `"50.0%"`.
    pub coverage: String,
    pub coverage_percentage: f64,
    #[serde(rename = "topicsCovered")]
    pub topics_covered: usize,
    #[serde(rename = "totalTopics")]
    pub total_topics: usize,
    pub gaps: usize,
    pub recommendations: u32,
    #[serde(rename = "alignmentScore")]
    pub alignment_score: u32,
}

/// Persisted gap report for one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub id: SessionId,
    pub mapping_results: Mapping,
    pub summary: ReportSummary,
    pub gaps: Vec<GapEntry>,
    pub recommendations: String,
    pub strengths: Vec<String>,
    pub timestamp: DateTime<Utc>,
}
