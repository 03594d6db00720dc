use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying one analysis session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Short random identifier used when the caller does not supply one.
    pub fn generate() -> Self {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        Self(raw[..8].to_string())
    }

    /// Accepts a caller-supplied id only when it is safe to embed in a file name:
    /// non-empty ASCII alphanumerics, `-` and `_`.
    pub fn parse(value: &str) -> Option<Self> {
        let is_token = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        is_token.then(|| Self(value.to_string()))
    }

    pub fn is_valid(&self) -> bool {
        Self::parse(&self.0).is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Which side of the comparison a document sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Curriculum,
    Standards,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Curriculum => "curriculum",
            Self::Standards => "standards",
        }
    }
}

/// Topics, competencies and outcomes extracted from one document.
///
/// `topics` may contain duplicates and the parallel sequences are not aligned
/// positionally with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredTopicSet {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub subtopics: Vec<String>,
    #[serde(default)]
    pub competencies: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
}

impl StructuredTopicSet {
    pub fn with_topics<I, S>(subject: &str, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.to_string(),
            topics: topics.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

pub const FULLY_ALIGNED_THRESHOLD: f64 = 0.80;
pub const PARTIAL_MATCH_THRESHOLD: f64 = 0.60;

/// Score assigned when there is nothing to compare against.
pub const SIMILARITY_FLOOR: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignmentStatus {
    #[serde(rename = "Fully aligned")]
    FullyAligned,
    #[serde(rename = "Partial match")]
    PartialMatch,
    #[serde(rename = "Missing")]
    Missing,
}

impl AlignmentStatus {
    /// Lower bounds are inclusive: 0.80 is fully aligned, 0.60 is a partial match.
    pub fn classify(score: f64) -> Self {
        if score >= FULLY_ALIGNED_THRESHOLD {
            Self::FullyAligned
        } else if score >= PARTIAL_MATCH_THRESHOLD {
            Self::PartialMatch
        } else {
            Self::Missing
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FullyAligned => "Fully aligned",
            Self::PartialMatch => "Partial match",
            Self::Missing => "Missing",
        }
    }

    pub const fn is_covered(self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Best curriculum counterpart for one standard topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub standard_topic: String,
    pub closest_curriculum_topic: Option<String>,
    pub similarity: f64,
    pub status: AlignmentStatus,
}

impl AlignmentRecord {
    /// Classifies on the raw score and keeps two decimals for persistence.
    pub fn from_score(standard_topic: String, closest: Option<String>, score: f64) -> Self {
        Self {
            standard_topic,
            closest_curriculum_topic: closest,
            similarity: round_to_hundredths(score),
            status: AlignmentStatus::classify(score),
        }
    }
}

/// One record per standard topic, in standard-topic order.
pub type Mapping = Vec<AlignmentRecord>;

pub(crate) fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries_fall_into_the_higher_band() {
        assert_eq!(AlignmentStatus::classify(0.80), AlignmentStatus::FullyAligned);
        assert_eq!(AlignmentStatus::classify(0.7999), AlignmentStatus::PartialMatch);
        assert_eq!(AlignmentStatus::classify(0.60), AlignmentStatus::PartialMatch);
        assert_eq!(AlignmentStatus::classify(0.5999), AlignmentStatus::Missing);
        assert_eq!(AlignmentStatus::classify(1.0), AlignmentStatus::FullyAligned);
        assert_eq!(AlignmentStatus::classify(SIMILARITY_FLOOR), AlignmentStatus::Missing);
    }

    #[test]
    fn records_round_similarity_for_persistence() {
        let record = AlignmentRecord::from_score("loops".into(), Some("iteration".into()), 0.8472);
        assert_eq!(record.similarity, 0.85);
        assert_eq!(record.status, AlignmentStatus::FullyAligned);
    }

    #[test]
    fn statuses_serialize_with_display_labels() {
        let json = serde_json::to_string(&AlignmentStatus::PartialMatch).expect("serializes");
        assert_eq!(json, "\"Partial match\"");
        for status in [
            AlignmentStatus::FullyAligned,
            AlignmentStatus::PartialMatch,
            AlignmentStatus::Missing,
        ] {
            assert_eq!(
                serde_json::to_value(status).expect("serializes"),
                serde_json::Value::String(status.label().to_string())
            );
        }
    }

    #[test]
    fn structured_sets_tolerate_missing_fields() {
        let parsed: StructuredTopicSet =
            serde_json::from_str(r#"{"subject":"CS1","topics":["loops","loops"]}"#)
                .expect("lenient parse");
        assert_eq!(parsed.topics, vec!["loops", "loops"]);
        assert!(parsed.competencies.is_empty());
    }

    #[test]
    fn generated_session_ids_are_short_and_unique() {
        let first = SessionId::generate();
        let second = SessionId::generate();
        assert_eq!(first.as_str().len(), 8);
        assert_ne!(first, second);
        assert!(first.is_valid());
    }

    #[test]
    fn session_ids_must_be_plain_tokens() {
        assert_eq!(SessionId::parse("run-42_b"), Some(SessionId::from("run-42_b")));
        for raw in ["", "../escaped", "a/b", "a\\b", "with space", ".."] {
            assert_eq!(SessionId::parse(raw), None, "{raw:?}");
        }
    }
}
