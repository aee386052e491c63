//! Analysis commands: match, insights, batch ranking and prompt context

use super::{degraded_note, read_document};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::progress::{advance_progress, finish_progress, start_progress_bar};
use crate::rag::{
    confidence_score, AnalysisKind, CandidateAnalysis, CandidateResume, ContextRequest, Outcome,
    RagContext, ResumeInsights, ResumeRag, SemanticMatch,
};
use crate::store::SearchHit;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Score one resume file against one job description file
pub async fn cmd_match(
    rag: &ResumeRag,
    resume_path: &Path,
    jd_path: &Path,
) -> Result<Outcome<SemanticMatch>> {
    let resume = read_document(resume_path).await?;
    let jd = read_document(jd_path).await?;
    info!("Matching {} against {}", resume.filename, jd.filename);

    Ok(rag.semantic_resume_match(&resume.text, &jd.text).await)
}

/// Knowledge insights for one resume file
pub async fn cmd_insights(rag: &ResumeRag, resume_path: &Path) -> Result<Outcome<ResumeInsights>> {
    let resume = read_document(resume_path).await?;
    info!("Collecting insights for {}", resume.filename);

    Ok(rag.get_resume_insights(&resume.text).await)
}

/// Rank resume files against one job description file
pub async fn cmd_batch(
    rag: &ResumeRag,
    jd_path: &Path,
    resume_paths: &[PathBuf],
) -> Result<Outcome<Vec<CandidateAnalysis>>> {
    let jd = read_document(jd_path).await?;

    let mut candidates = Vec::with_capacity(resume_paths.len());
    for path in resume_paths {
        let doc = read_document(path).await?;
        let mut metadata = Metadata::new();
        metadata.insert("filename".to_string(), doc.filename.clone().into());
        candidates.push(CandidateResume {
            id: doc.filename,
            text: doc.text,
            metadata,
        });
    }

    let pb = start_progress_bar(candidates.len(), "Analyzing candidates");
    let outcome = rag
        .batch_semantic_analysis_with_progress(&candidates, &jd.text, |analysis| {
            advance_progress(&pb, &analysis.resume_id);
        })
        .await;
    finish_progress(pb, "Candidates ranked");

    Ok(outcome)
}

/// Retrieved prompt context, optionally scored against a model answer
#[derive(Debug, Clone, Serialize)]
pub struct ContextReport {
    pub kind: AnalysisKind,
    pub context: Outcome<RagContext>,
    /// Confidence of the supplied structured answer, if one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u32>,
}

/// Build the prompt context for a request. When `analytics` holds the
/// model's structured answer its confidence is scored as well.
pub async fn cmd_context(
    rag: &ResumeRag,
    request: &ContextRequest,
    analytics: Option<&Value>,
) -> ContextReport {
    let kind = request.kind();
    info!("Building {} context", kind);

    let context = rag.build_context(request).await;
    let rag_enhanced = !context.value().is_empty();
    let confidence = analytics.map(|value| confidence_score(kind, value, rag_enhanced));

    ContextReport {
        kind,
        context,
        confidence,
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}:", title);
    for item in items {
        println!("  • {}", item);
    }
}

fn print_hits(title: &str, hits: &[SearchHit]) {
    if hits.is_empty() {
        return;
    }
    println!("{}:", title);
    for hit in hits {
        println!("  • {} (distance: {:.3})", hit.id, hit.distance);
    }
}

/// Print match result to console
pub fn print_match(outcome: &Outcome<SemanticMatch>) {
    let result = outcome.value();

    println!(
        "\n🎯 Match score: {:.1}/100{}",
        result.match_score,
        degraded_note(outcome)
    );
    println!("   Cosine similarity: {:.4}\n", result.semantic_similarity);

    print_list("Relevant knowledge", &result.relevant_knowledge);
    print_hits("Resumes similar to the job", &result.similar_resumes);
    print_hits("Jobs similar to the resume", &result.similar_jobs);

    let ctx = &result.analysis_context;
    println!(
        "\nDatabase: {} resumes, {} jobs, {} knowledge items",
        ctx.total_resumes_in_db, ctx.total_jobs_in_db, ctx.knowledge_items
    );
}

/// Print insights to console
pub fn print_insights(outcome: &Outcome<ResumeInsights>) {
    let insights = outcome.value();

    println!("\n💡 Resume insights{}\n", degraded_note(outcome));
    print_list("Skills", &insights.skill_insights);
    print_list("Experience", &insights.experience_insights);
    print_list("Red flags", &insights.red_flags_insights);
    print_list("Industry", &insights.industry_insights);
    print_hits("Similar resumes", &insights.similar_resumes);

    println!(
        "\nDatabase: {} resumes, {} jobs",
        insights.database_context.total_resumes, insights.database_context.total_jobs
    );
}

/// Print batch ranking to console
pub fn print_batch(outcome: &Outcome<Vec<CandidateAnalysis>>) {
    let ranked = outcome.value();

    if ranked.is_empty() {
        println!("No candidates analyzed{}", degraded_note(outcome));
        return;
    }

    println!("\n🏆 Candidate ranking{}\n", degraded_note(outcome));
    for (i, analysis) in ranked.iter().enumerate() {
        println!(
            "{}. {} ({:.1}/100)",
            i + 1,
            analysis.resume_id,
            analysis.overall_score
        );
        for recommendation in &analysis.recommendations {
            println!("   - {}", recommendation);
        }
    }
}

/// Print prompt context to console
pub fn print_context(report: &ContextReport) {
    let context = report.context.value();

    println!(
        "\n🧩 {} context{}\n",
        report.kind,
        degraded_note(&report.context)
    );

    if context.is_empty() {
        println!("No context retrieved.");
    }
    for (title, block) in [
        ("Knowledge base", &context.knowledge_base),
        ("Similar cases", &context.similar_cases),
        ("Similar jobs", &context.similar_jobs),
    ] {
        if !block.is_empty() {
            println!("{}:\n{}\n", title, block);
        }
    }

    if let Some(confidence) = report.confidence {
        println!("Confidence: {}/100", confidence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EmbeddingBackend};
    use serde_json::json;
    use tempfile::TempDir;

    async fn hash_rag(tmp: &TempDir) -> ResumeRag {
        let mut config = Config::with_base_dir(tmp.path());
        config.embedding.backend = EmbeddingBackend::Hash;
        config.embedding.dimension = 256;
        ResumeRag::connect(&config).await
    }

    fn write(tmp: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[tokio::test]
    async fn test_match_identical_files_scores_full() {
        let tmp = TempDir::new().unwrap();
        let rag = hash_rag(&tmp).await;
        let resume = write(&tmp, "ada.txt", "Rust engineer with Kafka and Postgres");
        let jd = write(&tmp, "role.txt", "Rust engineer with Kafka and Postgres");

        let outcome = cmd_match(&rag, &resume, &jd).await.unwrap();
        assert!(outcome.is_ready());
        assert!((outcome.value().match_score - 100.0).abs() < 1e-3);
        assert_eq!(outcome.value().analysis_context.knowledge_items, 10);
    }

    #[tokio::test]
    async fn test_batch_ranks_best_candidate_first() {
        let tmp = TempDir::new().unwrap();
        let rag = hash_rag(&tmp).await;
        let jd = write(&tmp, "role.txt", "rust kafka postgres backend engineer");
        let weak = write(&tmp, "weak.txt", "watercolor painting and pottery classes");
        let strong = write(&tmp, "strong.txt", "rust kafka postgres backend engineer");

        let outcome = cmd_batch(&rag, &jd, &[weak, strong]).await.unwrap();
        let ranked = outcome.value();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].resume_id, "strong.txt");
        assert_eq!(
            ranked[0].resume_metadata["filename"].as_str(),
            Some("strong.txt")
        );
        assert!(ranked[0].overall_score >= ranked[1].overall_score);
    }

    #[tokio::test]
    async fn test_insights_for_file() {
        let tmp = TempDir::new().unwrap();
        let rag = hash_rag(&tmp).await;
        let resume = write(&tmp, "ada.txt", "Rust engineer");

        let outcome = cmd_insights(&rag, &resume).await.unwrap();
        assert!(outcome.is_ready());
        assert_eq!(outcome.value().skill_insights.len(), 2);
        assert_eq!(outcome.value().industry_insights.len(), 1);
    }

    #[tokio::test]
    async fn test_context_scores_supplied_answer() {
        let tmp = TempDir::new().unwrap();
        let rag = hash_rag(&tmp).await;

        let request = ContextRequest::Resume {
            resume_text: "Rust engineer".to_string(),
        };
        let answer = json!({ "skills": ["rust"], "experience": "7 years", "score": 80 });

        let report = cmd_context(&rag, &request, Some(&answer)).await;
        assert_eq!(report.kind, AnalysisKind::Resume);
        assert!(!report.context.value().knowledge_base.is_empty());
        // 20 + 20 + 15, plus the retrieval bonus
        assert_eq!(report.confidence, Some(65));

        let report = cmd_context(&rag, &request, None).await;
        assert_eq!(report.confidence, None);
    }
}
