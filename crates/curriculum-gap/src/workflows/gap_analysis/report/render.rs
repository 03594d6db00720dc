use super::super::domain::Mapping;
use super::views::FinalReport;
use serde::Serialize;
use std::fmt::Write as _;

/// Human-readable Markdown rendition of a report. The narrative
/// recommendations are appended unmodified.
pub fn render_markdown(report: &FinalReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    let _ = writeln!(out, "# Curriculum Gap Analysis Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "Session `{}`, generated {}", report.id, report.timestamp.to_rfc3339());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Coverage | {} |", summary.coverage);
    let _ = writeln!(
        out,
        "| Topics covered | {} of {} |",
        summary.topics_covered, summary.total_topics
    );
    let _ = writeln!(out, "| Gaps | {} |", summary.gaps);
    let _ = writeln!(out, "| Alignment score | {} |", summary.alignment_score);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Topic Mapping");
    let _ = writeln!(out);
    if report.mapping_results.is_empty() {
        let _ = writeln!(out, "No standard topics were extracted.");
    } else {
        let _ = writeln!(out, "| # | Standard topic | Closest curriculum topic | Similarity | Status |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        for (index, record) in report.mapping_results.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {:.2} | {} |",
                index + 1,
                escape_cell(&record.standard_topic),
                record
                    .closest_curriculum_topic
                    .as_deref()
                    .map(escape_cell)
                    .unwrap_or_else(|| "-".to_string()),
                record.similarity,
                record.status.label()
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Gaps");
    let _ = writeln!(out);
    if report.gaps.is_empty() {
        let _ = writeln!(out, "No gaps identified.");
    } else {
        for gap in &report.gaps {
            let _ = writeln!(
                out,
                "- **[{}] #{} {}**: {} {}",
                gap.severity.label(),
                gap.id,
                gap.topic,
                gap.description,
                gap.recommendation
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Strengths");
    let _ = writeln!(out);
    for strength in &report.strengths {
        let _ = writeln!(out, "- {strength}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Recommendations");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", report.recommendations.trim_end());

    out
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

#[derive(Serialize)]
struct MappingRow<'a> {
    standard_topic: &'a str,
    closest_curriculum_topic: Option<&'a str>,
    similarity: f64,
    status: &'static str,
}

/// CSV export of a mapping, one row per standard topic.
pub fn mapping_csv(mapping: &Mapping) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in mapping {
        writer.serialize(MappingRow {
            standard_topic: &record.standard_topic,
            closest_curriculum_topic: record.closest_curriculum_topic.as_deref(),
            similarity: record.similarity,
            status: record.status.label(),
        })?;
    }

    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
