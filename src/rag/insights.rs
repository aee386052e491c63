//! Per-resume knowledge aggregation

use super::outcome::Degradation;
use super::{DegradedReason, Outcome, ResumeRag};
use crate::store::{Collection, SearchHit};
use serde::Serialize;

const SKILL_QUERY: &str = "technical skills evaluation";
const EXPERIENCE_QUERY: &str = "experience assessment";
const RED_FLAGS_QUERY: &str = "red flags resume";
const INDUSTRY_QUERY: &str = "industry experience requirements";

/// Collection sizes at the time of an insight lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseContext {
    pub total_resumes: usize,
    pub total_jobs: usize,
}

/// Knowledge relevant to reviewing one resume
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumeInsights {
    pub skill_insights: Vec<String>,
    pub experience_insights: Vec<String>,
    pub red_flags_insights: Vec<String>,
    pub similar_resumes: Vec<SearchHit>,
    pub industry_insights: Vec<String>,
    pub database_context: DatabaseContext,
}

impl ResumeRag {
    /// Fixed bundle of knowledge lookups plus similar resumes. Read only.
    pub async fn get_resume_insights(&self, resume_text: &str) -> Outcome<ResumeInsights> {
        let Some(parts) = self.parts() else {
            return Outcome::empty(DegradedReason::NotInitialized);
        };

        let mut degradation = Degradation::default();

        let skill_insights = degradation.take(self.get_relevant_knowledge(SKILL_QUERY, 2).await);
        let experience_insights =
            degradation.take(self.get_relevant_knowledge(EXPERIENCE_QUERY, 2).await);
        let red_flags_insights =
            degradation.take(self.get_relevant_knowledge(RED_FLAGS_QUERY, 2).await);
        let similar_resumes =
            degradation.take(self.search_similar_resumes(resume_text, 3).await);
        let industry_insights =
            degradation.take(self.get_relevant_knowledge(INDUSTRY_QUERY, 1).await);

        let database_context = DatabaseContext {
            total_resumes: degradation.take(self.count(parts, Collection::Resumes).await),
            total_jobs: degradation.take(self.count(parts, Collection::JobDescriptions).await),
        };

        degradation.finish(ResumeInsights {
            skill_insights,
            experience_insights,
            red_flags_insights,
            similar_resumes,
            industry_insights,
            database_context,
        })
    }
}
