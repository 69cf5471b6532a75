//! Shared fixture: the shipped config and data files, with dummy search and
//! LLM backends and company URLs pointing at a closed local port.

#![allow(dead_code)]

use casi::bootstrap;
use casi::comms::AppState;
use casi::config::{Config, EnvOverrides, load_from_str};
use casi::llm::LlmProvider;
use casi::search::SearchBackend;

pub const DEAD_URLS: &str = "http://127.0.0.1:9/about-us/,http://127.0.0.1:9/,http://127.0.0.1:9/travel/";

pub fn overrides() -> EnvOverrides {
    EnvOverrides { company_urls: Some(DEAD_URLS.into()), ..EnvOverrides::default() }
}

pub fn config_with(overrides: EnvOverrides, llm: &str) -> Config {
    let manifest = env!("CARGO_MANIFEST_DIR");
    let text = std::fs::read_to_string(format!("{manifest}/config/default.toml"))
        .unwrap()
        .replace("default = \"duckduckgo\"", "default = \"dummy\"")
        .replace("default = \"openai\"", &format!("default = \"{llm}\""))
        .replace("\"config/", &format!("\"{manifest}/config/"));
    load_from_str(&text, &overrides).unwrap()
}

pub fn config() -> Config {
    config_with(overrides(), "dummy")
}

pub fn state() -> AppState {
    bootstrap::assemble(&config()).unwrap()
}

pub fn llm_calls(state: &AppState) -> usize {
    match state.router.llm() {
        Some(LlmProvider::Dummy(p)) => p.calls(),
        _ => 0,
    }
}

pub fn last_preamble(state: &AppState) -> Option<String> {
    match state.router.llm() {
        Some(LlmProvider::Dummy(p)) => p.last_system(),
        _ => None,
    }
}

pub fn search_calls(state: &AppState) -> usize {
    match state.router.search().backend() {
        SearchBackend::Dummy(s) => s.calls(),
        _ => 0,
    }
}
