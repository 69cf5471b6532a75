//! Brave Search API backend (`SEARCH_API_KEY` required).

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::search::{RawHit, SearchError};

#[derive(Debug, Clone)]
pub struct BraveSearch {
    client: Client,
    api_base_url: String,
    api_key: String,
}

impl BraveSearch {
    pub fn new(api_base_url: String, api_key: String, timeout_seconds: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| SearchError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_base_url, api_key })
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>, SearchError> {
        let count = max_results.to_string();
        let url = Url::parse_with_params(&self.api_base_url, &[("q", query), ("count", count.as_str())])
            .map_err(|e| SearchError::Request(e.to_string()))?;
        let response = self
            .client
            .get(url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SearchError::Request(format!("Brave search API error: HTTP {}", response.status())));
        }
        let body: BraveResponse = response.json().await.map_err(|e| SearchError::Parse(e.to_string()))?;
        Ok(into_hits(body, max_results))
    }
}

#[derive(Debug, Default, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Default, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveHit>,
}

#[derive(Debug, Deserialize)]
struct BraveHit {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

fn into_hits(body: BraveResponse, max_results: usize) -> Vec<RawHit> {
    body.web
        .unwrap_or_default()
        .results
        .into_iter()
        .take(max_results)
        .map(|h| RawHit { title: h.title, body: h.description, link: h.url })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_web_results() {
        let body: BraveResponse = serde_json::from_str(
            r#"{"web":{"results":[
                {"title":"A","url":"https://a.test/","description":"first"},
                {"title":"B","url":"https://b.test/"}
            ]}}"#,
        )
        .unwrap();
        let hits = into_hits(body, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].body, "first");
        assert_eq!(hits[1].body, "");
    }

    #[test]
    fn missing_web_section_is_empty() {
        let body: BraveResponse = serde_json::from_str(r#"{"query":{}}"#).unwrap();
        assert!(into_hits(body, 5).is_empty());
    }
}
