//! Search backend implementations.
//!
//! `build(config, user_agent, api_key)` is the factory, called at startup.

pub mod brave;
pub mod duckduckgo;
pub mod dummy;

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::search::SearchBackend;

pub fn build(config: &SearchConfig, user_agent: &str, api_key: Option<String>) -> Result<SearchBackend, AppError> {
    let backend = match config.provider.as_str() {
        "dummy" => SearchBackend::Dummy(dummy::DummySearch::default()),
        "duckduckgo" => SearchBackend::DuckDuckGo(
            duckduckgo::DuckDuckGoSearch::new(user_agent, config.timeout_seconds)
                .map_err(|e| AppError::Config(e.to_string()))?,
        ),
        "brave" => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("search provider 'brave' requires SEARCH_API_KEY".into())
            })?;
            SearchBackend::Brave(
                brave::BraveSearch::new(config.brave.api_base_url.clone(), key, config.timeout_seconds)
                    .map_err(|e| AppError::Config(e.to_string()))?,
            )
        }
        other => return Err(AppError::Config(format!("unknown search provider: {other}"))),
    };
    Ok(backend)
}
