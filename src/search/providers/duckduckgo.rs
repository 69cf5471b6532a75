//! DuckDuckGo HTML endpoint backend (no API key).

use std::time::Duration;

use reqwest::{Client, Url};
use scraper::{Html, Selector};

use crate::search::{RawHit, SearchError};

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(user_agent: &str, timeout_seconds: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| SearchError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint: ENDPOINT.to_string() })
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>, SearchError> {
        let url = Url::parse_with_params(&self.endpoint, &[("q", query)])
            .map_err(|e| SearchError::Request(e.to_string()))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SearchError::Request(format!("HTTP {}", response.status())));
        }
        let html = response.text().await.map_err(|e| SearchError::Request(e.to_string()))?;
        parse_results(&html, max_results)
    }
}

/// Parse the `.result` blocks of a DuckDuckGo HTML results page.
fn parse_results(html: &str, max_results: usize) -> Result<Vec<RawHit>, SearchError> {
    let parse = |css: &str| Selector::parse(css).map_err(|e| SearchError::Parse(e.to_string()));
    let result_sel = parse(".result")?;
    let title_sel = parse("a.result__a")?;
    let snippet_sel = parse(".result__snippet")?;

    let document = Html::parse_document(html);
    let hits = document
        .select(&result_sel)
        .filter_map(|result| {
            let anchor = result.select(&title_sel).next()?;
            let title = anchor.text().collect::<String>().trim().to_string();
            let link = decode_link(anchor.value().attr("href")?)?;
            let body = result
                .select(&snippet_sel)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            (!title.is_empty()).then_some(RawHit { title, body, link })
        })
        .take(max_results)
        .collect();
    Ok(hits)
}

/// Result anchors point at a `/l/?uddg=<target>` redirect; unwrap it.
fn decode_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") { format!("https:{href}") } else { href.to_string() };
    let url = Url::parse(&absolute).ok()?;
    match url.query_pairs().find(|(k, _)| k == "uddg") {
        Some((_, target)) => Some(target.into_owned()),
        None => Some(absolute),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
      <div class="result">
        <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FParis&rut=x">Paris - Wikipedia</a></h2>
        <a class="result__snippet">Paris is the capital of France.</a>
      </div>
      <div class="result">
        <h2><a class="result__a" href="https://www.france.fr/">France.fr</a></h2>
      </div>
      <div class="result"><span>no anchor</span></div>
    </body></html>"#;

    #[test]
    fn parses_results_and_unwraps_redirects() {
        let hits = parse_results(PAGE, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Paris - Wikipedia");
        assert_eq!(hits[0].link, "https://en.wikipedia.org/wiki/Paris");
        assert_eq!(hits[0].body, "Paris is the capital of France.");
        assert_eq!(hits[1].link, "https://www.france.fr/");
        assert!(hits[1].body.is_empty());
    }

    #[test]
    fn respects_max_results() {
        assert_eq!(parse_results(PAGE, 1).unwrap().len(), 1);
    }
}
