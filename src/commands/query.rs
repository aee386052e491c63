//! Search commands

use super::degraded_note;
use crate::rag::{truncate_chars, Outcome, ResumeRag};
use crate::store::{Collection, SearchHit};
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

const PREVIEW_CHARS: usize = 200;

/// Collection a search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTarget {
    Resumes,
    Jobs,
    Knowledge,
}

impl SearchTarget {
    pub fn collection(&self) -> Collection {
        match self {
            SearchTarget::Resumes => Collection::Resumes,
            SearchTarget::Jobs => Collection::JobDescriptions,
            SearchTarget::Knowledge => Collection::Knowledge,
        }
    }
}

/// Search results with the query that produced them
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub collection: Collection,
    pub results: Outcome<Vec<SearchHit>>,
}

/// Nearest neighbors of `query` in one collection. `k` falls back to the
/// configured default.
pub async fn cmd_search(
    rag: &ResumeRag,
    target: SearchTarget,
    query: &str,
    k: Option<usize>,
) -> SearchResults {
    let k = k.unwrap_or(rag.settings().retrieval.default_k);
    info!("Searching {} for: {} (k={})", target.collection(), query, k);

    let results = match target {
        SearchTarget::Resumes => rag.search_similar_resumes(query, k).await,
        SearchTarget::Jobs => rag.search_similar_jobs(query, k).await,
        SearchTarget::Knowledge => rag.search_knowledge(query, k).await,
    };

    SearchResults {
        query: query.to_string(),
        collection: target.collection(),
        results,
    }
}

/// Knowledge texts relevant to `query`, as injected into prompts
pub async fn cmd_knowledge(rag: &ResumeRag, query: &str, k: Option<usize>) -> Outcome<Vec<String>> {
    let k = k.unwrap_or(rag.settings().retrieval.default_k);
    info!("Looking up knowledge for: {} (k={})", query, k);
    rag.get_relevant_knowledge(query, k).await
}

/// Print search results to console
pub fn print_search_results(results: &SearchResults) {
    let hits = results.results.value();

    if hits.is_empty() {
        println!(
            "No results in {} for '{}'{}",
            results.collection,
            results.query,
            degraded_note(&results.results)
        );
        return;
    }

    println!(
        "\n🔍 {} results in {} for '{}'{}\n",
        hits.len(),
        results.collection,
        results.query,
        degraded_note(&results.results)
    );

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. {} (distance: {:.3})", i + 1, hit.id, hit.distance);

        for (key, value) in &hit.metadata {
            println!("   {}: {}", key, value);
        }

        let preview = truncate_chars(&hit.text, PREVIEW_CHARS);
        let ellipsis = if preview.len() < hit.text.len() { "..." } else { "" };
        println!("   {}{}", preview.replace('\n', " "), ellipsis);
        println!();
    }
}

/// Print knowledge texts to console
pub fn print_knowledge(query: &str, knowledge: &Outcome<Vec<String>>) {
    let texts = knowledge.value();

    if texts.is_empty() {
        println!("No knowledge found for '{}'{}", query, degraded_note(knowledge));
        return;
    }

    println!("\n📚 Knowledge for '{}'{}\n", query, degraded_note(knowledge));
    for text in texts {
        println!("• {}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EmbeddingBackend};
    use tempfile::TempDir;

    #[test]
    fn test_search_target_collections() {
        assert_eq!(SearchTarget::Resumes.collection(), Collection::Resumes);
        assert_eq!(SearchTarget::Jobs.collection(), Collection::JobDescriptions);
        assert_eq!(SearchTarget::Knowledge.collection(), Collection::Knowledge);
    }

    #[tokio::test]
    async fn test_search_knowledge_uses_default_k() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::with_base_dir(tmp.path());
        config.embedding.backend = EmbeddingBackend::Hash;
        config.embedding.dimension = 64;
        config.retrieval.default_k = 4;

        let rag = ResumeRag::connect(&config).await;

        let results = cmd_search(&rag, SearchTarget::Knowledge, "red flags", None).await;
        assert!(results.results.is_ready());
        assert_eq!(results.results.value().len(), 4);

        let results = cmd_search(&rag, SearchTarget::Resumes, "rust", Some(3)).await;
        assert!(results.results.value().is_empty());

        let texts = cmd_knowledge(&rag, "cultural fit", Some(2)).await;
        assert_eq!(texts.value().len(), 2);
    }
}
