//! Batch ranking of candidates against one job description

use super::outcome::Degradation;
use super::{Outcome, ResumeInsights, ResumeRag, SemanticMatch};
use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use tracing::info;

const LOW_MATCH: &str = "Low match score - consider if this role is the right fit";
const MODERATE_MATCH: &str = "Moderate match - review specific skill gaps";
const STRONG_MATCH: &str = "Strong match - proceed with detailed evaluation";
const SKILL_ADVICE: &str = "Focus on technical skill alignment with role requirements";
const EXPERIENCE_ADVICE: &str = "Evaluate experience quality and relevance to position";
const RED_FLAG_ADVICE: &str = "Review for potential red flags or inconsistencies";

/// One resume submitted for batch analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResume {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Analysis of one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateAnalysis {
    pub resume_id: String,
    pub resume_metadata: Metadata,
    pub semantic_match: SemanticMatch,
    pub insights: ResumeInsights,
    /// Equal to the match score
    pub overall_score: f64,
    pub recommendations: Vec<String>,
}

/// Advisory lines for a candidate: the score band first, then one line per
/// non-empty insight category in the order skills, experience, red flags.
pub fn generate_recommendations(
    match_result: &SemanticMatch,
    insights: &ResumeInsights,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let band = if match_result.match_score < 30.0 {
        LOW_MATCH
    } else if match_result.match_score < 60.0 {
        MODERATE_MATCH
    } else {
        STRONG_MATCH
    };
    recommendations.push(band.to_string());

    if !insights.skill_insights.is_empty() {
        recommendations.push(SKILL_ADVICE.to_string());
    }
    if !insights.experience_insights.is_empty() {
        recommendations.push(EXPERIENCE_ADVICE.to_string());
    }
    if !insights.red_flags_insights.is_empty() {
        recommendations.push(RED_FLAG_ADVICE.to_string());
    }

    recommendations
}

impl ResumeRag {
    /// Analyze every resume against the job description and rank by score,
    /// highest first. Equal scores keep their input order.
    pub async fn batch_semantic_analysis(
        &self,
        resumes: &[CandidateResume],
        jd_text: &str,
    ) -> Outcome<Vec<CandidateAnalysis>> {
        self.batch_semantic_analysis_with_progress(resumes, jd_text, |_| {})
            .await
    }

    /// Same as [`ResumeRag::batch_semantic_analysis`], reporting each finished candidate
    pub async fn batch_semantic_analysis_with_progress<F>(
        &self,
        resumes: &[CandidateResume],
        jd_text: &str,
        mut on_candidate: F,
    ) -> Outcome<Vec<CandidateAnalysis>>
    where
        F: FnMut(&CandidateAnalysis),
    {
        info!("Analyzing {} resumes against job description", resumes.len());

        let mut degradation = Degradation::default();
        let mut results = Vec::with_capacity(resumes.len());

        for resume in resumes {
            let semantic_match =
                degradation.take(self.semantic_resume_match(&resume.text, jd_text).await);
            let insights = degradation.take(self.get_resume_insights(&resume.text).await);
            let recommendations = generate_recommendations(&semantic_match, &insights);

            let analysis = CandidateAnalysis {
                resume_id: resume.id.clone(),
                resume_metadata: resume.metadata.clone(),
                overall_score: semantic_match.match_score,
                semantic_match,
                insights,
                recommendations,
            };
            on_candidate(&analysis);
            results.push(analysis);
        }

        // Stable sort keeps input order for ties
        results.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));

        degradation.finish(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_with_score(score: f64) -> SemanticMatch {
        SemanticMatch {
            semantic_similarity: score / 100.0,
            match_score: score,
            ..SemanticMatch::default()
        }
    }

    #[test]
    fn test_score_bands() {
        let insights = ResumeInsights::default();

        assert_eq!(
            generate_recommendations(&match_with_score(29.9), &insights),
            vec![LOW_MATCH]
        );
        assert_eq!(
            generate_recommendations(&match_with_score(30.0), &insights),
            vec![MODERATE_MATCH]
        );
        assert_eq!(
            generate_recommendations(&match_with_score(59.99), &insights),
            vec![MODERATE_MATCH]
        );
        assert_eq!(
            generate_recommendations(&match_with_score(60.0), &insights),
            vec![STRONG_MATCH]
        );
    }

    #[test]
    fn test_insight_lines_follow_fixed_order() {
        let insights = ResumeInsights {
            skill_insights: vec!["skills".to_string()],
            experience_insights: vec![],
            red_flags_insights: vec!["flags".to_string()],
            ..ResumeInsights::default()
        };

        assert_eq!(
            generate_recommendations(&match_with_score(75.0), &insights),
            vec![STRONG_MATCH, SKILL_ADVICE, RED_FLAG_ADVICE]
        );

        let all = ResumeInsights {
            experience_insights: vec!["experience".to_string()],
            ..insights
        };
        assert_eq!(
            generate_recommendations(&match_with_score(10.0), &all),
            vec![LOW_MATCH, SKILL_ADVICE, EXPERIENCE_ADVICE, RED_FLAG_ADVICE]
        );
    }

    #[test]
    fn test_candidate_metadata_defaults_to_empty() {
        let candidate: CandidateResume =
            serde_json::from_str(r#"{"id":"r1","text":"Rust developer"}"#).unwrap();
        assert!(candidate.metadata.is_empty());
    }
}
