//! Search provider (SP): company-scoped or general web search.
//!
//! `SearchBackend` is an enum over concrete backends (see `providers/`).
//! `SearchProvider` adds the scoping policy on top and never fails: backend
//! errors are logged and reported as `None`.

pub mod providers;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

// ── Types ─────────────────────────────────────────────────────────────────────

/// One hit as returned by a backend, before normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHit {
    pub title: String,
    pub body: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchType {
    #[serde(rename = "Casto-Focused")]
    CastoFocused,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    /// Host part of `url`.
    pub source: String,
    pub search_type: SearchType,
    pub original_query: String,
    pub search_query_used: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search response could not be parsed: {0}")]
    Parse(String),
}

// ── Backend enum ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SearchBackend {
    Dummy(providers::dummy::DummySearch),
    DuckDuckGo(providers::duckduckgo::DuckDuckGoSearch),
    Brave(providers::brave::BraveSearch),
}

impl SearchBackend {
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>, SearchError> {
        match self {
            SearchBackend::Dummy(b) => b.search(query, max_results).await,
            SearchBackend::DuckDuckGo(b) => b.search(query, max_results).await,
            SearchBackend::Brave(b) => b.search(query, max_results).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchBackend::Dummy(_) => "dummy",
            SearchBackend::DuckDuckGo(_) => "duckduckgo",
            SearchBackend::Brave(_) => "brave",
        }
    }
}

// ── Provider ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SearchProvider {
    backend: SearchBackend,
    company_name: String,
    keywords: Vec<String>,
    scoped_results: usize,
    general_results: usize,
}

impl SearchProvider {
    /// `keywords` must already be lowercased.
    pub fn new(
        backend: SearchBackend,
        company_name: String,
        keywords: Vec<String>,
        scoped_results: usize,
        general_results: usize,
    ) -> Self {
        Self { backend, company_name, keywords, scoped_results, general_results }
    }

    pub fn backend(&self) -> &SearchBackend {
        &self.backend
    }

    /// True iff at least one company keyword occurs in the lowercased query.
    pub fn is_company_scoped(&self, query: &str) -> bool {
        let lowered = query.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Scope decided by [`Self::is_company_scoped`].
    pub async fn smart_search(&self, query: &str) -> Option<Vec<SearchResult>> {
        let scoped = self.is_company_scoped(query);
        self.run(query, scoped).await
    }

    /// Always general.
    pub async fn general_search(&self, query: &str) -> Option<Vec<SearchResult>> {
        self.run(query, false).await
    }

    /// Always company-scoped.
    pub async fn knowledge_search(&self, query: &str) -> Option<Vec<SearchResult>> {
        self.run(query, true).await
    }

    async fn run(&self, query: &str, scoped: bool) -> Option<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let (search_query, search_type, limit) = if scoped {
            (format!("{} {query}", self.company_name), SearchType::CastoFocused, self.scoped_results)
        } else {
            (query.to_string(), SearchType::General, self.general_results)
        };

        debug!(backend = self.backend.name(), query = %search_query, ?search_type, "web search");
        let hits = match self.backend.search(&search_query, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "web search failed");
                return None;
            }
        };

        Some(
            hits.into_iter()
                .take(limit)
                .map(|hit| SearchResult {
                    source: host_of(&hit.link),
                    title: hit.title,
                    snippet: hit.body,
                    url: hit.link,
                    search_type,
                    original_query: query.to_string(),
                    search_query_used: search_query.clone(),
                })
                .collect(),
        )
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Numbered `title: snippet (url)` lines for prompts and citations.
pub fn format_results(results: &[SearchResult], max: usize) -> String {
    results
        .iter()
        .take(max)
        .enumerate()
        .map(|(i, r)| format!("{}. {}: {} ({})", i + 1, r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) fn test_provider(backend: providers::dummy::DummySearch) -> SearchProvider {
    SearchProvider::new(
        SearchBackend::Dummy(backend),
        "Casto Travel".into(),
        vec!["casto".into(), "castotravel".into(), "maryles casto".into()],
        5,
        8,
    )
}

#[cfg(test)]
mod tests {
    use super::providers::dummy::DummySearch;
    use super::*;

    #[test]
    fn company_scope_is_keyword_presence() {
        let sp = test_provider(DummySearch::default());
        assert!(sp.is_company_scoped("Where is CASTO based"));
        assert!(sp.is_company_scoped("castotravel.com reviews"));
        assert!(!sp.is_company_scoped("capital of France"));
    }

    #[tokio::test]
    async fn scoped_search_prepends_company_and_caps_at_five() {
        let dummy = DummySearch::default();
        let sp = test_provider(dummy.clone());
        let results = sp.smart_search("casto offices").await.unwrap();
        assert_eq!(results.len(), 5);
        let first = &results[0];
        assert_eq!(first.search_type, SearchType::CastoFocused);
        assert_eq!(first.search_query_used, "Casto Travel casto offices");
        assert_eq!(first.original_query, "casto offices");
        assert_eq!(first.source, "example.com");
        assert_eq!(dummy.calls(), 1);
    }

    #[tokio::test]
    async fn general_search_returns_up_to_eight() {
        let sp = test_provider(DummySearch::default());
        let results = sp.smart_search("capital of France").await.unwrap();
        assert_eq!(results.len(), 8);
        assert_eq!(results[0].search_type, SearchType::General);
        assert_eq!(results[0].search_query_used, "capital of France");
    }

    #[tokio::test]
    async fn forced_modes_ignore_keywords() {
        let sp = test_provider(DummySearch::default());
        let general = sp.general_search("casto offices").await.unwrap();
        assert_eq!(general[0].search_type, SearchType::General);
        let knowledge = sp.knowledge_search("offices").await.unwrap();
        assert_eq!(knowledge[0].search_type, SearchType::CastoFocused);
    }

    #[tokio::test]
    async fn backend_error_is_none() {
        let sp = test_provider(DummySearch::failing());
        assert!(sp.smart_search("anything").await.is_none());
    }

    #[test]
    fn search_type_serializes_with_hyphen() {
        assert_eq!(serde_json::to_value(SearchType::CastoFocused).unwrap(), "Casto-Focused");
    }

    #[test]
    fn format_results_numbers_lines() {
        let r = SearchResult {
            title: "T".into(),
            snippet: "S".into(),
            url: "https://x.test/".into(),
            source: "x.test".into(),
            search_type: SearchType::General,
            original_query: "q".into(),
            search_query_used: "q".into(),
        };
        assert_eq!(format_results(&[r], 3), "1. T: S (https://x.test/)");
    }
}
