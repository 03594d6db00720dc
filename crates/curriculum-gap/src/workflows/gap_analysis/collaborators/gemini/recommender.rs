use super::GeminiClient;
use crate::workflows::gap_analysis::collaborators::{CollaboratorError, RecommendationWriter};
use crate::workflows::gap_analysis::domain::{Mapping, StructuredTopicSet};
use async_trait::async_trait;
use std::sync::Arc;

/// Mapping JSON is cut to this many characters to bound prompt size.
const MAPPING_EXCERPT_CHARS: usize = 2000;

#[derive(Debug, Clone)]
pub struct GeminiRecommender {
    client: Arc<GeminiClient>,
}

impl GeminiRecommender {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecommendationWriter for GeminiRecommender {
    async fn write(
        &self,
        mapping: &Mapping,
        curriculum: &StructuredTopicSet,
        standards: &StructuredTopicSet,
    ) -> Result<String, CollaboratorError> {
        let prompt = recommendation_prompt(mapping, curriculum, standards)?;
        self.client.generate(&prompt).await
    }
}

pub(crate) fn recommendation_prompt(
    mapping: &Mapping,
    curriculum: &StructuredTopicSet,
    standards: &StructuredTopicSet,
) -> Result<String, CollaboratorError> {
    let mapping_json = serde_json::to_string_pretty(mapping)
        .map_err(|err| CollaboratorError::MalformedResponse(err.to_string()))?;
    let excerpt: String = mapping_json.chars().take(MAPPING_EXCERPT_CHARS).collect();

    Ok(format!(
        r#"You are an expert instructional designer and curriculum specialist.
Generate a DETAILED, STRUCTURED curriculum gap analysis report.

CURRICULUM SUBJECT: {curriculum_subject}
STANDARDS SUBJECT: {standards_subject}

CURRICULUM-TO-STANDARDS MAPPING DATA:
{excerpt}

Generate a COMPREHENSIVE report with the following EXACT structure:

### OVERALL ANALYSIS & EXECUTIVE SUMMARY
[Provide 2-3 paragraphs summarizing alignment quality, major gaps, and strategic recommendations]

### MISSING LEARNING GOALS ANALYSIS
For EACH standard topic that needs improvement, analyze by Bloom's Taxonomy levels:

1. **Topic: [Standard Topic Name]**
   - Status: [Fully aligned/Partial match/Missing]
   - Closest Curriculum Match: [Matched topic]
   - Similarity Score: [Score]
   - Bloom's Taxonomy Gaps:
     * Remember: [Missing knowledge/recall outcomes]
     * Understand: [Missing comprehension outcomes]
     * Apply: [Missing application outcomes]
     * Analyze: [Missing analysis outcomes]
     * Evaluate: [Missing evaluation outcomes]
     * Create: [Missing creation outcomes]

### SUGGESTED IMPROVEMENTS
[Numbered list of 10-15 specific, actionable improvements]

### TOPIC SEQUENCING RECOMMENDATIONS
[Logical module ordering with rationale]
- Prerequisite chains and dependencies
- Cognitive progression flow
- Recommended sequence with timeline

### REDUNDANCY WARNINGS
[Identify overlapping topics and suggest consolidation]

### IMPLEMENTATION ROADMAP
- Phase 1 (Immediate): [Actions for first month]
- Phase 2 (Short-term): [Actions for 1-3 months]
- Phase 3 (Medium-term): [Actions for 3-6 months]

IMPORTANT RULES:
1. Use complete sentences and paragraphs
2. Be specific and actionable
3. Reference actual topics from the mapping data
4. Include Bloom's Taxonomy analysis for each gap
5. Do NOT use bullet points for the main analysis sections
6. Make this comprehensive and professional
"#,
        curriculum_subject = display_subject(curriculum),
        standards_subject = display_subject(standards),
    ))
}

fn display_subject(set: &StructuredTopicSet) -> &str {
    if set.subject.trim().is_empty() {
        "(unspecified)"
    } else {
        set.subject.as_str()
    }
}
