//! Prompt context assembly
//!
//! Builds the knowledge and similar-case blocks injected into language
//! model prompts for each kind of analysis.

use super::outcome::Degradation;
use super::{DegradedReason, Outcome, ResumeRag};
use crate::store::SearchHit;
use serde::{Deserialize, Serialize};
use std::fmt;

const QUERY_PREFIX_CHARS: usize = 500;
const PREVIEW_CHARS: usize = 200;

/// Which analysis a context is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Resume,
    JdMatch,
    Chat,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Resume => write!(f, "resume"),
            AnalysisKind::JdMatch => write!(f, "jd_match"),
            AnalysisKind::Chat => write!(f, "chat"),
        }
    }
}

/// Input for [`ResumeRag::build_context`]
#[derive(Debug, Clone, PartialEq)]
pub enum ContextRequest {
    Resume { resume_text: String },
    JdMatch { jd_text: String },
    Chat { message: String, resume_text: String },
}

impl ContextRequest {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            ContextRequest::Resume { .. } => AnalysisKind::Resume,
            ContextRequest::JdMatch { .. } => AnalysisKind::JdMatch,
            ContextRequest::Chat { .. } => AnalysisKind::Chat,
        }
    }
}

/// Text blocks ready to be placed in a prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RagContext {
    /// Knowledge texts, one per line
    pub knowledge_base: String,
    /// `Similar case: ...` lines for resumes
    pub similar_cases: String,
    /// `Similar job: ...` lines for job descriptions
    pub similar_jobs: String,
}

impl RagContext {
    pub fn is_empty(&self) -> bool {
        self.knowledge_base.is_empty() && self.similar_cases.is_empty() && self.similar_jobs.is_empty()
    }
}

/// The first `max_chars` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn preview_lines(label: &str, hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("{}: {}...", label, truncate_chars(&hit.text, PREVIEW_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn knowledge_lines(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ResumeRag {
    /// Retrieve the context blocks for one analysis
    pub async fn build_context(&self, request: &ContextRequest) -> Outcome<RagContext> {
        if !self.is_ready() {
            return Outcome::empty(DegradedReason::NotInitialized);
        }

        let mut degradation = Degradation::default();
        let mut context = RagContext::default();

        match request {
            ContextRequest::Resume { resume_text } => {
                let query = format!(
                    "resume analysis best practices for: {}",
                    truncate_chars(resume_text, QUERY_PREFIX_CHARS)
                );
                let knowledge = degradation.take(self.search_knowledge(&query, 5).await);
                let similar = degradation.take(self.search_similar_resumes(resume_text, 3).await);

                context.knowledge_base = knowledge_lines(&knowledge);
                context.similar_cases = preview_lines("Similar case", &similar);
            }
            ContextRequest::JdMatch { jd_text } => {
                let query = format!(
                    "job matching best practices for: {}",
                    truncate_chars(jd_text, QUERY_PREFIX_CHARS)
                );
                let knowledge = degradation.take(self.search_knowledge(&query, 5).await);
                let similar = degradation.take(self.search_similar_jobs(jd_text, 3).await);

                context.knowledge_base = knowledge_lines(&knowledge);
                context.similar_jobs = preview_lines("Similar job", &similar);
            }
            ContextRequest::Chat {
                message,
                resume_text,
            } => {
                // Chat without an uploaded resume gets no retrieval
                if resume_text.trim().is_empty() {
                    return Outcome::ready(context);
                }
                let knowledge = degradation.take(self.search_knowledge(message, 3).await);
                let similar = degradation.take(self.search_similar_resumes(resume_text, 2).await);

                context.knowledge_base = knowledge_lines(&knowledge);
                context.similar_cases = preview_lines("Similar case", &similar);
            }
        }

        degradation.finish(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;

    fn hit(text: &str) -> SearchHit {
        SearchHit {
            id: "id".to_string(),
            text: text.to_string(),
            metadata: Metadata::new(),
            distance: 0.1,
        }
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_preview_lines_format() {
        let long = "x".repeat(250);
        let lines = preview_lines("Similar case", &[hit("Rust engineer"), hit(&long)]);
        let mut iter = lines.lines();

        assert_eq!(iter.next(), Some("Similar case: Rust engineer..."));
        let second = iter.next().unwrap();
        assert_eq!(second.len(), "Similar case: ".len() + 200 + 3);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_knowledge_lines_join() {
        assert_eq!(knowledge_lines(&[hit("a"), hit("b")]), "a\nb");
        assert_eq!(knowledge_lines(&[]), "");
    }

    #[test]
    fn test_request_kind() {
        let request = ContextRequest::JdMatch {
            jd_text: "Senior Rust role".to_string(),
        };
        assert_eq!(request.kind(), AnalysisKind::JdMatch);
        assert_eq!(AnalysisKind::JdMatch.to_string(), "jd_match");
    }
}
