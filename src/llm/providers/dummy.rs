//! Dummy LLM provider: echoes the user turn back prefixed with `[echo]`.
//! Used for local runs without an API key and as the test double: it counts
//! calls and keeps the last system preamble it was given.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::llm::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    calls: Arc<AtomicUsize>,
    last_system: Arc<Mutex<Option<String>>>,
}

impl DummyProvider {
    pub async fn complete(&self, system_preamble: &str, user_turn: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_system.lock().unwrap_or_else(PoisonError::into_inner) = Some(system_preamble.to_string());
        Ok(format!("[echo] {user_turn}"))
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// System preamble of the most recent completion.
    pub fn last_system(&self) -> Option<String> {
        self.last_system.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
