//! Resume to job description matching

use super::outcome::Degradation;
use super::{DegradedReason, Outcome, ResumeRag};
use crate::store::{Collection, SearchHit};
use serde::Serialize;
use tracing::{debug, warn};

const MATCH_KNOWLEDGE_QUERY: &str = "resume matching job description skills experience";
const MATCH_KNOWLEDGE_K: usize = 3;
const MATCH_SIMILAR_K: usize = 3;

/// Cosine similarity of two vectors. Zero-norm or mismatched input yields 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Collection sizes at the time of a match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisContext {
    pub total_resumes_in_db: usize,
    pub total_jobs_in_db: usize,
    pub knowledge_items: usize,
}

/// Similarity of one resume to one job description, with supporting context
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SemanticMatch {
    pub semantic_similarity: f64,
    /// `semantic_similarity * 100`
    pub match_score: f64,
    pub relevant_knowledge: Vec<String>,
    /// Stored resumes that look like the job description
    pub similar_resumes: Vec<SearchHit>,
    /// Stored job descriptions that look like the resume
    pub similar_jobs: Vec<SearchHit>,
    pub analysis_context: AnalysisContext,
}

impl ResumeRag {
    /// Score a resume against a job description.
    ///
    /// The similarity is computed point to point between the two embeddings.
    /// Context lookups are cross-directional: resumes are searched with the
    /// job description and jobs with the resume.
    pub async fn semantic_resume_match(
        &self,
        resume_text: &str,
        jd_text: &str,
    ) -> Outcome<SemanticMatch> {
        let Some(parts) = self.parts() else {
            return Outcome::empty(DegradedReason::NotInitialized);
        };

        let embeddings = match parts
            .embedder
            .embed(vec![resume_text.to_string(), jd_text.to_string()])
            .await
        {
            Ok(embeddings) if embeddings.len() == 2 => embeddings,
            Ok(embeddings) => {
                warn!(
                    "Expected 2 embeddings for semantic match, got {}",
                    embeddings.len()
                );
                return Outcome::empty(DegradedReason::Embedding);
            }
            Err(e) => {
                warn!("Error in semantic resume match: {}", e);
                return Outcome::empty(DegradedReason::Embedding);
            }
        };
        let (resume_embedding, jd_embedding) = (&embeddings[0], &embeddings[1]);

        let semantic_similarity = cosine_similarity(resume_embedding, jd_embedding);
        debug!("Semantic similarity {:.4}", semantic_similarity);

        let mut degradation = Degradation::default();

        let relevant_knowledge = degradation.take(
            self.get_relevant_knowledge(MATCH_KNOWLEDGE_QUERY, MATCH_KNOWLEDGE_K)
                .await,
        );
        let similar_resumes = degradation.take(
            self.search_embedding(parts, Collection::Resumes, jd_embedding, MATCH_SIMILAR_K)
                .await,
        );
        let similar_jobs = degradation.take(
            self.search_embedding(
                parts,
                Collection::JobDescriptions,
                resume_embedding,
                MATCH_SIMILAR_K,
            )
            .await,
        );

        let analysis_context = AnalysisContext {
            total_resumes_in_db: degradation.take(self.count(parts, Collection::Resumes).await),
            total_jobs_in_db: degradation
                .take(self.count(parts, Collection::JobDescriptions).await),
            knowledge_items: degradation.take(self.count(parts, Collection::Knowledge).await),
        };

        degradation.finish(SemanticMatch {
            semantic_similarity,
            match_score: semantic_similarity * 100.0,
            relevant_knowledge,
            similar_resumes,
            similar_jobs,
            analysis_context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_is_symmetric() {
        let a = [0.3, -0.7, 0.2, 0.9];
        let b = [0.1, 0.4, -0.5, 0.6];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_similarity_degenerate_input() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
