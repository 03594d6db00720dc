use super::super::domain::{AlignmentRecord, AlignmentStatus, Mapping, SessionId};
use super::views::{FinalReport, GapEntry, GapSeverity, ReportSummary};
use chrono::{DateTime, Utc};

/// Illustrative strengths carried on every report until a derivation rule exists.
pub const DEFAULT_STRENGTHS: [&str; 4] = [
    "Strong foundation in programming fundamentals",
    "Good balance of theory and practice",
    "Regular assessment and feedback mechanisms",
    "Structured learning progression",
];

/// Count shown by display clients alongside the narrative.
pub const DISPLAYED_RECOMMENDATION_COUNT: u32 = 15;

const HIGH_SEVERITY_CEILING: f64 = 0.30;
const MEDIUM_SEVERITY_CEILING: f64 = 0.60;

/// Builds the final report from a mapping and narrative text. Pure apart from
/// the timestamp.
#[derive(Debug, Clone)]
pub struct GapAggregator {
    strengths: Vec<String>,
}

impl Default for GapAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_STRENGTHS.iter().map(|s| s.to_string()).collect())
    }
}

impl GapAggregator {
    pub fn new(strengths: Vec<String>) -> Self {
        Self { strengths }
    }

    pub fn aggregate(
        &self,
        id: &SessionId,
        mapping: Mapping,
        recommendations: String,
    ) -> FinalReport {
        self.aggregate_at(id, mapping, recommendations, Utc::now())
    }

    pub fn aggregate_at(
        &self,
        id: &SessionId,
        mapping: Mapping,
        recommendations: String,
        timestamp: DateTime<Utc>,
    ) -> FinalReport {
        let gaps = collect_gaps(&mapping);
        let summary = summarize(&mapping, gaps.len());

        FinalReport {
            id: id.clone(),
            mapping_results: mapping,
            summary,
            gaps,
            recommendations,
            strengths: self.strengths.clone(),
            timestamp,
        }
    }
}

/// Severity for a record that is not fully aligned.
///
/// Reads the persisted (rounded) similarity while status comes from the raw
/// score, so a `Missing` record scored in [0.595, 0.60) rounds up to 0.60 and
/// lands on `Low`.
pub fn gap_severity(record: &AlignmentRecord) -> Option<GapSeverity> {
    match record.status {
        AlignmentStatus::FullyAligned => None,
        AlignmentStatus::PartialMatch => Some(GapSeverity::Medium),
        AlignmentStatus::Missing => Some(if record.similarity < HIGH_SEVERITY_CEILING {
            GapSeverity::High
        } else if record.similarity < MEDIUM_SEVERITY_CEILING {
            GapSeverity::Medium
        } else {
            GapSeverity::Low
        }),
    }
}

fn collect_gaps(mapping: &Mapping) -> Vec<GapEntry> {
    mapping
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let severity = gap_severity(record)?;
            let topic = &record.standard_topic;
            let (description, recommendation) = match record.status {
                AlignmentStatus::PartialMatch => (
                    format!(
                        "Partial coverage of '{topic}' (similarity: {:.2})",
                        record.similarity
                    ),
                    format!("Enhance existing content for {topic}"),
                ),
                _ => (
                    format!("Missing coverage of '{topic}' in curriculum"),
                    format!("Add module on {topic} with appropriate learning outcomes"),
                ),
            };

            Some(GapEntry {
                id: index + 1,
                topic: topic.clone(),
                severity,
                description,
                recommendation,
            })
        })
        .collect()
}

fn summarize(mapping: &Mapping, gap_count: usize) -> ReportSummary {
    let total_topics = mapping.len();
    let topics_covered = mapping
        .iter()
        .filter(|record| record.status.is_covered())
        .count();

    let coverage_percentage = if total_topics > 0 {
        (topics_covered as f64 / total_topics as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    ReportSummary {
        coverage: format!("{coverage_percentage:.1}%"),
        coverage_percentage,
        topics_covered,
        total_topics,
        gaps: gap_count,
        recommendations: DISPLAYED_RECOMMENDATION_COUNT,
        alignment_score: coverage_percentage.round() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(topic: &str, similarity: f64) -> AlignmentRecord {
        AlignmentRecord::from_score(topic.to_string(), Some("anything".to_string()), similarity)
    }

    #[test]
    fn severity_follows_status_and_similarity() {
        assert_eq!(gap_severity(&record("a", 0.95)), None);
        assert_eq!(gap_severity(&record("b", 0.65)), Some(GapSeverity::Medium));
        assert_eq!(gap_severity(&record("c", 0.29)), Some(GapSeverity::High));
        assert_eq!(gap_severity(&record("d", 0.30)), Some(GapSeverity::Medium));
        assert_eq!(gap_severity(&record("e", 0.59)), Some(GapSeverity::Medium));
        assert_eq!(gap_severity(&record("f", -1.0)), Some(GapSeverity::High));
    }

    #[test]
    fn missing_scores_that_round_up_to_the_partial_threshold_are_low() {
        for score in [0.596, 0.598, 0.599] {
            let rounded = record("edge", score);
            assert_eq!(rounded.status, AlignmentStatus::Missing, "{score}");
            assert_eq!(rounded.similarity, 0.6, "{score}");
            assert_eq!(gap_severity(&rounded), Some(GapSeverity::Low), "{score}");
        }
        assert_eq!(gap_severity(&record("below", 0.594)), Some(GapSeverity::Medium));
    }

    #[test]
    fn gap_ids_keep_mapping_positions() {
        let mapping = vec![
            record("aligned", 0.91),
            record("partial", 0.7),
            record("aligned again", 0.88),
            record("missing", 0.1),
        ];
        let report =
            GapAggregator::default().aggregate(&SessionId::from("s1"), mapping, String::new());

        let ids: Vec<usize> = report.gaps.iter().map(|gap| gap.id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert_eq!(
            report.gaps[0].description,
            "Partial coverage of 'partial' (similarity: 0.70)"
        );
        assert_eq!(report.gaps[0].recommendation, "Enhance existing content for partial");
        assert_eq!(
            report.gaps[1].description,
            "Missing coverage of 'missing' in curriculum"
        );
    }

    #[test]
    fn summary_counts_partial_matches_as_covered() {
        let mapping = vec![record("a", 0.9), record("b", 0.6), record("c", 0.2)];
        let report =
            GapAggregator::default().aggregate(&SessionId::from("s1"), mapping, String::new());

        assert_eq!(report.summary.topics_covered, 2);
        assert_eq!(report.summary.total_topics, 3);
        assert_eq!(report.summary.gaps, 2);
        assert_eq!(report.summary.coverage, "66.7%");
        assert_eq!(report.summary.alignment_score, 67);
    }

    #[test]
    fn empty_mapping_has_zero_coverage() {
        let report =
            GapAggregator::default().aggregate(&SessionId::from("s1"), Vec::new(), String::new());
        assert_eq!(report.summary.coverage_percentage, 0.0);
        assert_eq!(report.summary.coverage, "0.0%");
        assert_eq!(report.summary.alignment_score, 0);
        assert!(report.gaps.is_empty());
    }

    #[test]
    fn configured_strengths_are_carried_verbatim() {
        let aggregator = GapAggregator::new(vec!["Hands-on labs".to_string()]);
        let report = aggregator.aggregate(&SessionId::from("s1"), Vec::new(), String::new());
        assert_eq!(report.strengths, vec!["Hands-on labs"]);

        let defaults =
            GapAggregator::default().aggregate(&SessionId::from("s1"), Vec::new(), String::new());
        assert_eq!(defaults.strengths.len(), DEFAULT_STRENGTHS.len());
    }
}
