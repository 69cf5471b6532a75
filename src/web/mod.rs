//! Web fetcher (WF): cached GETs of company pages with section extraction.
//!
//! Failures never surface as errors: they become [`PageExtract::Failed`],
//! which is cached for the TTL like any other result. An expired
//! successful entry is served again when its refetch fails.

pub mod cache;
pub mod extract;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::WebConfig;
use crate::error::AppError;

use cache::{CacheLookup, WebCache};

const NO_MATCH_TEXT: &str = "No relevant information found for this query.";

/// Normalised outcome of one page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageExtract {
    Found { url: String, title: String, sections: Vec<String> },
    NoMatch { url: String, title: String },
    Failed { url: String, reason: String },
}

impl PageExtract {
    pub fn is_found(&self) -> bool {
        matches!(self, PageExtract::Found { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PageExtract::Failed { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            PageExtract::Found { url, .. } | PageExtract::NoMatch { url, .. } | PageExtract::Failed { url, .. } => url,
        }
    }

    /// Extracted sections joined with blank lines; empty unless `Found`.
    pub fn content(&self) -> String {
        match self {
            PageExtract::Found { sections, .. } => sections.join("\n\n"),
            _ => String::new(),
        }
    }

    /// `{title, content}` text blob.
    pub fn to_blob(&self) -> String {
        match self {
            PageExtract::Found { title, .. } => format!("{title}\n\n{}", self.content()),
            PageExtract::NoMatch { title, .. } => format!("{title}\n\n{NO_MATCH_TEXT}"),
            PageExtract::Failed { url, reason } => format!("Error fetching {url}: {reason}"),
        }
    }
}

// ── Fetcher ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WebFetcher {
    client: Client,
    cache: WebCache,
    fetches: AtomicUsize,
}

impl WebFetcher {
    pub fn new(config: &WebConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Config(format!("web client: {e}")))?;
        Ok(Self {
            client,
            cache: WebCache::new(Duration::from_secs(config.cache_seconds)),
            fetches: AtomicUsize::new(0),
        })
    }

    /// Number of network GETs issued so far (cache hits excluded).
    pub fn network_fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Generic extract: sections matching `query`, or title plus readable
    /// text when no query is given.
    pub async fn fetch(&self, url: &str, query: Option<&str>) -> PageExtract {
        self.fetch_at(url, query, Instant::now()).await
    }

    pub async fn fetch_at(&self, url: &str, query: Option<&str>, now: Instant) -> PageExtract {
        let owned_query = query.map(str::to_string);
        self.cached(url, query.unwrap_or_default().to_string(), now, move |doc, url| {
            generic_extract(doc, url, owned_query.as_deref())
        })
        .await
    }

    /// "About Us" extractor: the block anchored on `name`, falling back to
    /// the generic extractor for the same name.
    pub async fn fetch_person(&self, about_url: &str, name: &str) -> PageExtract {
        self.fetch_person_at(about_url, name, Instant::now()).await
    }

    pub async fn fetch_person_at(&self, about_url: &str, name: &str, now: Instant) -> PageExtract {
        let owned_name = name.to_string();
        self.cached(about_url, format!("person:{}", name.to_lowercase()), now, move |doc, url| {
            match extract::person_block(doc, &owned_name) {
                Some(block) => PageExtract::Found {
                    url: url.to_string(),
                    title: extract::page_title(doc),
                    sections: vec![block],
                },
                None => generic_extract(doc, url, Some(&owned_name)),
            }
        })
        .await
    }

    async fn cached<F>(&self, url: &str, key: String, now: Instant, parse: F) -> PageExtract
    where
        F: FnOnce(&Html, &str) -> PageExtract,
    {
        let stale = match self.cache.get_at(url, &key, now) {
            CacheLookup::Fresh(hit) => {
                debug!(url, query = %key, "web cache hit");
                return hit;
            }
            CacheLookup::Stale(value) => Some(value),
            CacheLookup::Miss => None,
        };

        let result = match self.get_body(url).await {
            Ok(body) => {
                let doc = Html::parse_document(&body);
                parse(&doc, url)
            }
            Err(reason) => {
                warn!(url, %reason, "company page fetch failed");
                if let Some(previous) = stale {
                    debug!(url, "serving expired cache entry");
                    return previous;
                }
                PageExtract::Failed { url: url.to_string(), reason }
            }
        };

        self.cache.put_at(url, &key, result.clone(), now);
        result
    }

    async fn get_body(&self, url: &str) -> Result<String, String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() { "timed out".to_string() } else { e.to_string() }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        response.text().await.map_err(|e| e.to_string())
    }
}

fn generic_extract(doc: &Html, url: &str, query: Option<&str>) -> PageExtract {
    let title = extract::page_title(doc);
    let sections = match query {
        Some(q) => extract::sections_matching(doc, q),
        None => {
            let text = extract::readable_text(doc);
            if text.is_empty() { Vec::new() } else { vec![text] }
        }
    };
    if sections.is_empty() {
        PageExtract::NoMatch { url: url.to_string(), title }
    } else {
        PageExtract::Found { url: url.to_string(), title, sections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use axum::{Router, routing::get};

    const PAGE: &str = "<html><head><title>About</title></head><body>\
        <h3>Elaine Randrup</h3><p>Account director.</p>\
        <p>Casto Travel offers corporate travel services worldwide.</p></body></html>";

    fn config() -> WebConfig {
        WebConfig {
            company_urls: vec![],
            cache_seconds: 300,
            timeout_seconds: 2,
            user_agent: "test-agent".into(),
            enrich_company_answers: false,
        }
    }

    /// Serves `PAGE` at `/about` and a 500 at `/broken`, counting hits.
    async fn spawn_site() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new()
            .route(
                "/about",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        axum::response::Html(PAGE)
                    }
                }),
            )
            .route("/broken", get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    #[test]
    fn blob_shapes() {
        let found = PageExtract::Found { url: "u".into(), title: "T".into(), sections: vec!["a".into(), "b".into()] };
        assert_eq!(found.to_blob(), "T\n\na\n\nb");
        let miss = PageExtract::NoMatch { url: "u".into(), title: "T".into() };
        assert!(miss.to_blob().contains("No relevant information"));
        let failed = PageExtract::Failed { url: "u".into(), reason: "timed out".into() };
        assert_eq!(failed.to_blob(), "Error fetching u: timed out");
    }

    #[tokio::test]
    async fn repeated_fetch_within_ttl_hits_network_once() {
        let (base, hits) = spawn_site().await;
        let wf = WebFetcher::new(&config()).unwrap();
        let url = format!("{base}/about");
        let t0 = Instant::now();

        let first = wf.fetch_at(&url, Some("corporate travel"), t0).await;
        let second = wf.fetch_at(&url, Some("corporate travel"), t0 + Duration::from_secs(299)).await;
        assert!(first.is_found());
        assert_eq!(first.to_blob(), second.to_blob());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(wf.network_fetches(), 1);

        wf.fetch_at(&url, Some("corporate travel"), t0 + Duration::from_secs(301)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn person_extractor_returns_anchored_block() {
        let (base, _) = spawn_site().await;
        let wf = WebFetcher::new(&config()).unwrap();
        let got = wf.fetch_person(&format!("{base}/about"), "Elaine Randrup").await;
        assert_eq!(got.content(), "Elaine Randrup\nAccount director.\nCasto Travel offers corporate travel services worldwide.");
    }

    #[tokio::test]
    async fn unmatched_query_is_no_match() {
        let (base, _) = spawn_site().await;
        let wf = WebFetcher::new(&config()).unwrap();
        let got = wf.fetch(&format!("{base}/about"), Some("submarines")).await;
        assert!(matches!(got, PageExtract::NoMatch { .. }));
    }

    #[tokio::test]
    async fn http_error_is_failed_and_cached() {
        let (base, _) = spawn_site().await;
        let wf = WebFetcher::new(&config()).unwrap();
        let url = format!("{base}/broken");
        let t0 = Instant::now();
        let got = wf.fetch_at(&url, None, t0).await;
        assert!(got.is_failed());
        assert!(got.to_blob().contains("HTTP 500"));
        wf.fetch_at(&url, None, t0 + Duration::from_secs(1)).await;
        assert_eq!(wf.network_fetches(), 1);
    }

    #[tokio::test]
    async fn unreachable_host_is_failed() {
        let wf = WebFetcher::new(&config()).unwrap();
        let got = wf.fetch("http://127.0.0.1:9/about", Some("x")).await;
        assert!(got.is_failed());
    }
}
