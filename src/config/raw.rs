//! Raw TOML shape: `serde` target before resolution.
//!
//! Every section is optional; missing keys fall back to the defaults below.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub casi: RawService,
    #[serde(default)]
    pub http: RawHttp,
    #[serde(default)]
    pub conversation: RawConversation,
    #[serde(default)]
    pub web: RawWeb,
    #[serde(default)]
    pub search: RawSearch,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub identity: RawIdentity,
    #[serde(default)]
    pub policy: RawPolicy,
    #[serde(default)]
    pub data: RawData,
}

#[derive(Deserialize)]
pub(super) struct RawService {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RawService {
    fn default() -> Self {
        Self { name: default_service_name(), log_level: default_log_level() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawHttp {
    #[serde(default = "default_http_bind")]
    pub bind: String,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { bind: default_http_bind(), rate_limit_per_minute: default_rate_limit() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawConversation {
    #[serde(default = "default_conversation_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_max_related")]
    pub max_related_questions: usize,
}

impl Default for RawConversation {
    fn default() -> Self {
        Self {
            timeout_seconds: default_conversation_timeout(),
            max_history: default_max_history(),
            max_related_questions: default_max_related(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawWeb {
    #[serde(default = "default_company_urls")]
    pub company_urls: Vec<String>,
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u64,
    #[serde(default = "default_web_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub enrich_company_answers: bool,
}

impl Default for RawWeb {
    fn default() -> Self {
        Self {
            company_urls: default_company_urls(),
            cache_seconds: default_cache_seconds(),
            timeout_seconds: default_web_timeout(),
            user_agent: default_user_agent(),
            enrich_company_answers: false,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawSearch {
    /// Maps to `default = "..."` in `[search]`.
    #[serde(rename = "default", default = "default_search_provider")]
    pub provider: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default = "default_search_keywords")]
    pub company_keywords: Vec<String>,
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_scoped_results")]
    pub scoped_results: usize,
    #[serde(default = "default_general_results")]
    pub general_results: usize,
    #[serde(default)]
    pub brave: RawBrave,
}

impl Default for RawSearch {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            company_name: default_company_name(),
            company_keywords: default_search_keywords(),
            timeout_seconds: default_search_timeout(),
            scoped_results: default_scoped_results(),
            general_results: default_general_results(),
            brave: RawBrave::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawBrave {
    #[serde(default = "default_brave_url")]
    pub api_base_url: String,
}

impl Default for RawBrave {
    fn default() -> Self {
        Self { api_base_url: default_brave_url() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawIdentity {
    #[serde(default = "default_profile_url")]
    pub profile_url: String,
    #[serde(default = "default_identity_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RawIdentity {
    fn default() -> Self {
        Self { profile_url: default_profile_url(), timeout_seconds: default_identity_timeout() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawPolicy {
    #[serde(default = "default_roster")]
    pub personnel_roster: Vec<String>,
    #[serde(default = "default_name_variants")]
    pub name_variants: BTreeMap<String, String>,
    #[serde(default = "default_wrong_claims")]
    pub wrong_leadership_claims: Vec<String>,
    #[serde(default = "default_founder")]
    pub founder: String,
    #[serde(default = "default_ceo")]
    pub ceo: String,
    #[serde(default = "default_policy_keywords")]
    pub company_keywords: Vec<String>,
    #[serde(default)]
    pub creator_names: Vec<String>,
}

impl Default for RawPolicy {
    fn default() -> Self {
        Self {
            personnel_roster: default_roster(),
            name_variants: default_name_variants(),
            wrong_leadership_claims: default_wrong_claims(),
            founder: default_founder(),
            ceo: default_ceo(),
            company_keywords: default_policy_keywords(),
            creator_names: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawData {
    #[serde(default = "default_knowledge_file")]
    pub knowledge_file: String,
    #[serde(default = "default_replies_file")]
    pub replies_file: String,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
}

impl Default for RawData {
    fn default() -> Self {
        Self {
            knowledge_file: default_knowledge_file(),
            replies_file: default_replies_file(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

// ── defaults ──────────────────────────────────────────────────────────────────

pub(super) fn default_service_name() -> String { "CASI".to_string() }
pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_http_bind() -> String { "127.0.0.1:5000".to_string() }
pub(super) fn default_rate_limit() -> u32 { 30 }
pub(super) fn default_conversation_timeout() -> u64 { 1800 }
pub(super) fn default_max_history() -> usize { 10 }
pub(super) fn default_max_related() -> usize { 5 }
pub(super) fn default_cache_seconds() -> u64 { 300 }
pub(super) fn default_web_timeout() -> u64 { 10 }
pub(super) fn default_search_provider() -> String { "duckduckgo".to_string() }
pub(super) fn default_company_name() -> String { "Casto Travel".to_string() }
pub(super) fn default_search_timeout() -> u64 { 15 }
pub(super) fn default_scoped_results() -> usize { 5 }
pub(super) fn default_general_results() -> usize { 8 }
pub(super) fn default_brave_url() -> String { "https://api.search.brave.com/res/v1/web/search".to_string() }
pub(super) fn default_llm_provider() -> String { "openai".to_string() }
pub(super) fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
pub(super) fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
pub(super) fn default_openai_temperature() -> f32 { 0.7 }
pub(super) fn default_openai_timeout_seconds() -> u64 { 60 }
pub(super) fn default_profile_url() -> String { "https://graph.microsoft.com/v1.0/me".to_string() }
pub(super) fn default_identity_timeout() -> u64 { 10 }
pub(super) fn default_founder() -> String { "maryles casto".to_string() }
pub(super) fn default_ceo() -> String { "marc casto".to_string() }
pub(super) fn default_knowledge_file() -> String { "config/knowledge.json".to_string() }
pub(super) fn default_replies_file() -> String { "config/replies.toml".to_string() }
pub(super) fn default_prompts_dir() -> String { "config/prompts".to_string() }

pub(super) fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

pub(super) fn default_company_urls() -> Vec<String> {
    vec![
        "https://www.castotravel.com/about-us/".to_string(),
        "https://www.castotravel.com/".to_string(),
        "https://www.castotravel.com/travel/".to_string(),
        "https://www.castotravel.ph/".to_string(),
    ]
}

pub(super) fn default_search_keywords() -> Vec<String> {
    vec!["casto".to_string(), "castotravel".to_string(), "casto travel".to_string()]
}

pub(super) fn default_policy_keywords() -> Vec<String> {
    [
        "casto", "castotravel", "casto travel", "founder", "ceo", "president",
        "your company", "the company", "our company", "leadership",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub(super) fn default_roster() -> Vec<String> {
    vec![
        "maryles casto".to_string(),
        "marc casto".to_string(),
        "elaine randrup".to_string(),
    ]
}

pub(super) fn default_name_variants() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("maryle casto".to_string(), "maryles casto".to_string()),
        ("marylez casto".to_string(), "maryles casto".to_string()),
        ("mark casto".to_string(), "marc casto".to_string()),
        ("elaine randru".to_string(), "elaine randrup".to_string()),
        ("elain randrup".to_string(), "elaine randrup".to_string()),
    ])
}

pub(super) fn default_wrong_claims() -> Vec<String> {
    vec!["michael s. pastrana".to_string(), "michael pastrana".to_string()]
}
