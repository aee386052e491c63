//! Confidence scoring for structured model output

use super::AnalysisKind;
use serde_json::Value;

const RAG_BONUS: u32 = 10;
const MAX_CONFIDENCE: u32 = 100;

/// Presence test used by the scoring rules: null, false, zero, empty
/// strings and empty collections count as absent.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|x| x != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn length(value: Option<&Value>) -> usize {
    match value {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
        _ => 0,
    }
}

/// How complete a model's structured answer is, from 0 to 100.
///
/// Each expected field adds a fixed weight; answers produced with retrieved
/// context get a bonus. Chat answers are not scored.
pub fn confidence_score(kind: AnalysisKind, analytics: &Value, rag_enhanced: bool) -> u32 {
    let field = |name: &str| analytics.get(name);
    let mut confidence = 0;

    match kind {
        AnalysisKind::Resume => {
            if is_present(field("skills")) {
                confidence += 20;
            }
            if is_present(field("experience")) {
                confidence += 20;
            }
            if !matches!(field("score"), None | Some(Value::Null)) {
                confidence += 15;
            }
            if length(field("summary")) > 50 {
                confidence += 15;
            }
            for key in ["leadership_potential", "technical_depth", "career_progression"] {
                if is_present(field(key)) {
                    confidence += 10;
                }
            }
        }
        AnalysisKind::JdMatch => {
            if !matches!(field("score"), None | Some(Value::Null)) {
                confidence += 25;
            }
            for (key, weight) in [
                ("matched_keywords", 20),
                ("skill_gaps", 20),
                ("career_path_suggestions", 15),
                ("salary_estimate", 10),
                ("culture_fit", 10),
            ] {
                if is_present(field(key)) {
                    confidence += weight;
                }
            }
        }
        AnalysisKind::Chat => return 0,
    }

    if rag_enhanced {
        confidence += RAG_BONUS;
    }

    confidence.min(MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_resume_is_capped() {
        let analytics = json!({
            "skills": ["rust", "sql"],
            "experience": ["5 years backend"],
            "score": 82,
            "summary": "Seasoned backend engineer with a strong record of shipping distributed systems.",
            "leadership_potential": "high",
            "technical_depth": "deep",
            "career_progression": "steady"
        });

        assert_eq!(confidence_score(AnalysisKind::Resume, &analytics, false), 100);
        assert_eq!(confidence_score(AnalysisKind::Resume, &analytics, true), 100);
    }

    #[test]
    fn test_partial_resume() {
        let analytics = json!({
            "skills": [],
            "experience": ["intern"],
            "score": 0,
            "summary": "Too short"
        });

        // experience + score (zero still counts as present)
        assert_eq!(confidence_score(AnalysisKind::Resume, &analytics, false), 35);
        assert_eq!(confidence_score(AnalysisKind::Resume, &analytics, true), 45);
    }

    #[test]
    fn test_jd_match_weights() {
        let analytics = json!({
            "score": 64,
            "matched_keywords": ["rust"],
            "skill_gaps": [],
            "salary_estimate": "$120k",
            "culture_fit": null
        });

        assert_eq!(confidence_score(AnalysisKind::JdMatch, &analytics, false), 55);
        assert_eq!(confidence_score(AnalysisKind::JdMatch, &analytics, true), 65);
    }

    #[test]
    fn test_empty_and_chat() {
        assert_eq!(confidence_score(AnalysisKind::Resume, &json!({}), false), 0);
        assert_eq!(confidence_score(AnalysisKind::Resume, &json!({}), true), 10);
        assert_eq!(confidence_score(AnalysisKind::Chat, &json!({"score": 1}), true), 0);
    }
}
