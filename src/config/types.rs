//! Resolved configuration types consumed by the rest of the crate.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Socket address the axum channel binds to.
    pub bind: String,
    /// Requests per minute per remote. Reported in health metadata only.
    pub rate_limit_per_minute: u32,
}

/// Per-user conversation state limits.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Inactivity window after which a conversation resets on the next turn.
    pub timeout_seconds: u64,
    /// Exchanges retained per user (oldest dropped first).
    pub max_history: usize,
    /// Follow-up questions retained per user.
    pub max_related_questions: usize,
}

/// Company website fetching.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Ordered company URLs. Index 0 is the "About Us" page, 1 the main
    /// site, 2 the travel page; further entries are listed by `/sources`.
    pub company_urls: Vec<String>,
    pub cache_seconds: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Append a company-site excerpt to direct company answers.
    pub enrich_company_answers: bool,
}

/// Brave search API settings (`[search.brave]`).
#[derive(Debug, Clone)]
pub struct BraveConfig {
    pub api_base_url: String,
}

/// Web search provider configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Active backend: `"dummy"`, `"duckduckgo"` or `"brave"`.
    pub provider: String,
    /// Company name prepended to company-scoped queries.
    pub company_name: String,
    /// Lowercased keywords that make a query company-scoped. The personnel
    /// roster is appended at wiring time.
    pub company_keywords: Vec<String>,
    pub timeout_seconds: u64,
    pub scoped_results: usize,
    pub general_results: usize,
    pub brave: BraveConfig,
}

/// OpenAI / OpenAI-compatible provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// LLM adapter configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"`, `"openai"`).
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// External identity endpoint used to turn access tokens into user ids.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub profile_url: String,
    pub timeout_seconds: u64,
}

/// Rosters and claim lists that drive the routing policy.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Canonical lowercased personnel names, in priority order.
    pub personnel_roster: Vec<String>,
    /// Known misspelling → canonical name.
    pub name_variants: BTreeMap<String, String>,
    /// Names that must never be affirmed as company leadership.
    pub wrong_leadership_claims: Vec<String>,
    /// Canonical founder name (must be on the roster).
    pub founder: String,
    /// Canonical CEO name (must be on the roster).
    pub ceo: String,
    /// Keywords that make a turn company-scoped for the classifier.
    pub company_keywords: Vec<String>,
    /// Names of the people who built the assistant.
    pub creator_names: Vec<String>,
}

/// Locations of the shipped data files.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub knowledge_file: PathBuf,
    pub replies_file: PathBuf,
    pub prompts_dir: PathBuf,
}

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,
    pub log_level: String,
    pub http: HttpConfig,
    pub conversation: ConversationConfig,
    pub web: WebConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub identity: IdentityConfig,
    pub policy: PolicyConfig,
    pub data: DataConfig,
    /// From `LLM_API_KEY`. Never sourced from TOML.
    pub llm_api_key: Option<String>,
    /// From `SEARCH_API_KEY`. Never sourced from TOML.
    pub search_api_key: Option<String>,
}
