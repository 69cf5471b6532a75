//! Dummy search backend: deterministic hits, call counting, optional
//! failure mode.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::search::{RawHit, SearchError};

#[derive(Debug, Clone, Default)]
pub struct DummySearch {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl DummySearch {
    /// A backend whose every search errors.
    pub fn failing() -> Self {
        Self { calls: Arc::default(), fail: true }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SearchError::Request("dummy backend configured to fail".into()));
        }
        Ok((1..=max_results)
            .map(|i| RawHit {
                title: format!("Result {i} for {query}"),
                body: format!("Snippet {i} about {query}."),
                link: format!("https://example.com/result/{i}"),
            })
            .collect())
    }
}
