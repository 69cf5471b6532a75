//! Layered system-preamble builder for the LLM adapter.
//!
//! Layers are plain-text templates under `config/prompts/`, read once at
//! startup. A missing file falls back to built-in text so the identity
//! statement and the company-facts directive are always present.
//!
//! ## Layer ordering convention
//!
//! ```text
//! 0. identity.md      : who the assistant is (always)
//! 1. company_guard.md : KS-only directive for company facts; {{knowledge}}
//! 2. web_context.md   : search snippets; {{web_results}}
//! 3. travel.md / it_support.md: path-specific directive
//! 4. conversation.md  : focus, topics, related questions, preferences
//! ```
//!
//! Variable substitution uses `{{key}}` syntax and is applied once at
//! [`build()`](PromptBuilder::build) time, after all layers are joined.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

const SEPARATOR: &str = "\n\n";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"));

pub const IDENTITY: &str = "identity.md";
pub const COMPANY_GUARD: &str = "company_guard.md";
pub const WEB_CONTEXT: &str = "web_context.md";
pub const TRAVEL: &str = "travel.md";
pub const IT_SUPPORT: &str = "it_support.md";
pub const CONVERSATION: &str = "conversation.md";

const FALLBACKS: &[(&str, &str)] = &[
    (
        IDENTITY,
        "You are CASI — Casto Assistance and Support Intelligence — the virtual assistant of Casto Travel. Always answer as CASI.",
    ),
    (
        COMPANY_GUARD,
        "For any fact about Casto Travel or its people use ONLY the knowledge below and refuse to invent anything it does not contain.\n\n{{knowledge}}",
    ),
    (WEB_CONTEXT, "Web context:\n{{web_results}}"),
    (TRAVEL, "The user is asking a travel question. Give practical travel guidance."),
    (IT_SUPPORT, "The user needs IT support. Give short numbered troubleshooting steps."),
    (
        CONVERSATION,
        "Conversation context:\n- Current focus: {{focus}}\n- Recent topics: {{topics}}\n- Related questions: {{related}}\n- User preferences: {{preferences}}",
    ),
];

/// Preloaded prompt layers keyed by file name.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    layers: HashMap<&'static str, String>,
}

impl PromptLibrary {
    /// Read every known layer from `dir`, falling back per file.
    pub fn load(dir: &Path) -> Self {
        let layers = FALLBACKS
            .iter()
            .map(|(name, fallback)| {
                let path = dir.join(name);
                let text = match fs::read_to_string(&path) {
                    Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                    _ => {
                        debug!("prompt: layer '{}' not found, using built-in text", path.display());
                        fallback.to_string()
                    }
                };
                (*name, text)
            })
            .collect();
        Self { layers }
    }

    /// Built-in layers only.
    pub fn builtin() -> Self {
        Self {
            layers: FALLBACKS.iter().map(|(n, t)| (*n, t.to_string())).collect(),
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.layers.get(name).map(String::as_str)
    }

    /// Builder seeded with the identity layer.
    pub fn preamble(&self) -> PromptBuilder<'_> {
        PromptBuilder::new(self).layer(IDENTITY)
    }
}

/// Fluent builder over a [`PromptLibrary`].
pub struct PromptBuilder<'a> {
    library: &'a PromptLibrary,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(library: &'a PromptLibrary) -> Self {
        Self { library, parts: Vec::new(), vars: HashMap::new() }
    }

    /// Append a named layer. Unknown names are skipped.
    pub fn layer(mut self, name: &str) -> Self {
        if let Some(text) = self.library.get(name) {
            self.parts.push(text.to_string());
        }
        self
    }

    /// Register a single `{{key}}` → `value` substitution.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Join layers with blank lines and apply substitutions in one pass.
    /// Substituted values are not rescanned; unknown placeholders stay.
    pub fn build(self) -> String {
        let prompt = self.parts.join(SEPARATOR);
        PLACEHOLDER
            .replace_all(&prompt, |caps: &Captures<'_>| match self.vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
