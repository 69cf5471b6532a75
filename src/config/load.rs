//! Loading logic: read TOML, apply env overrides, resolve paths, validate.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

use super::raw::RawConfig;
use super::types::*;

/// Environment overrides, collected once so tests can pass them explicitly
/// instead of mutating process env.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub bind: Option<String>,
    pub conversation_timeout: Option<String>,
    pub max_conversation_history: Option<String>,
    pub cache_duration: Option<String>,
    pub company_urls: Option<String>,
    pub personnel_roster: Option<String>,
    pub name_variants: Option<String>,
    pub wrong_leadership_claims: Option<String>,
    pub rate_limit: Option<String>,
    pub llm_api_key: Option<String>,
    pub search_api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("CASI_LOG_LEVEL").ok(),
            bind: env::var("CASI_BIND").ok(),
            conversation_timeout: env::var("CONVERSATION_TIMEOUT").ok(),
            max_conversation_history: env::var("MAX_CONVERSATION_HISTORY").ok(),
            cache_duration: env::var("CACHE_DURATION").ok(),
            company_urls: env::var("COMPANY_URLS").ok(),
            personnel_roster: env::var("PERSONNEL_ROSTER").ok(),
            name_variants: env::var("NAME_VARIANTS").ok(),
            wrong_leadership_claims: env::var("WRONG_LEADERSHIP_CLAIMS").ok(),
            rate_limit: env::var("RATE_LIMIT").ok(),
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            search_api_key: env::var("SEARCH_API_KEY").ok().filter(|k| !k.trim().is_empty()),
        }
    }
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. With no path and no default file, built-in defaults
/// are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();
    match config_path {
        Some(path) => load_from(Path::new(path), &overrides),
        None => {
            let default_path = Path::new("config/default.toml");
            if default_path.exists() {
                load_from(default_path, &overrides)
            } else {
                resolve(RawConfig::default(), &overrides)
            }
        }
    }
}

/// Load from an explicit path with explicit overrides.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    load_from_str(&text, overrides)
        .map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
}

/// Parse TOML text and resolve it.
pub fn load_from_str(text: &str, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let raw: RawConfig =
        toml::from_str(text).map_err(|e| AppError::Config(format!("parse error: {e}")))?;
    resolve(raw, overrides)
}

fn resolve(raw: RawConfig, o: &EnvOverrides) -> Result<Config, AppError> {
    let log_level = o.log_level.clone().unwrap_or(raw.casi.log_level);

    let conversation = ConversationConfig {
        timeout_seconds: override_num(o.conversation_timeout.as_deref(), "CONVERSATION_TIMEOUT")?
            .unwrap_or(raw.conversation.timeout_seconds),
        max_history: override_num(o.max_conversation_history.as_deref(), "MAX_CONVERSATION_HISTORY")?
            .unwrap_or(raw.conversation.max_history),
        max_related_questions: raw.conversation.max_related_questions,
    };

    let web = WebConfig {
        company_urls: o
            .company_urls
            .as_deref()
            .map(split_list)
            .unwrap_or(raw.web.company_urls),
        cache_seconds: override_num(o.cache_duration.as_deref(), "CACHE_DURATION")?
            .unwrap_or(raw.web.cache_seconds),
        timeout_seconds: raw.web.timeout_seconds,
        user_agent: raw.web.user_agent,
        enrich_company_answers: raw.web.enrich_company_answers,
    };

    let policy = PolicyConfig {
        personnel_roster: o
            .personnel_roster
            .as_deref()
            .map(split_list)
            .unwrap_or(raw.policy.personnel_roster)
            .into_iter()
            .map(|n| normalise_name(&n))
            .collect(),
        name_variants: match o.name_variants.as_deref() {
            Some(s) => parse_variants(s)?,
            None => raw.policy.name_variants,
        }
        .into_iter()
        .map(|(k, v)| (normalise_name(&k), normalise_name(&v)))
        .collect(),
        wrong_leadership_claims: o
            .wrong_leadership_claims
            .as_deref()
            .map(split_list)
            .unwrap_or(raw.policy.wrong_leadership_claims)
            .into_iter()
            .map(|n| normalise_name(&n))
            .collect(),
        founder: normalise_name(&raw.policy.founder),
        ceo: normalise_name(&raw.policy.ceo),
        company_keywords: raw.policy.company_keywords.iter().map(|k| k.to_lowercase()).collect(),
        creator_names: raw.policy.creator_names.iter().map(|n| normalise_name(n)).collect(),
    };

    let config = Config {
        service_name: raw.casi.name,
        log_level,
        http: HttpConfig {
            bind: o.bind.clone().unwrap_or(raw.http.bind),
            rate_limit_per_minute: override_num(o.rate_limit.as_deref(), "RATE_LIMIT")?
                .unwrap_or(raw.http.rate_limit_per_minute),
        },
        conversation,
        web,
        search: SearchConfig {
            provider: raw.search.provider,
            company_name: raw.search.company_name,
            company_keywords: raw.search.company_keywords.iter().map(|k| k.to_lowercase()).collect(),
            timeout_seconds: raw.search.timeout_seconds,
            scoped_results: raw.search.scoped_results,
            general_results: raw.search.general_results,
            brave: BraveConfig { api_base_url: raw.search.brave.api_base_url },
        },
        llm: LlmConfig {
            provider: raw.llm.provider,
            openai: OpenAiConfig {
                api_base_url: raw.llm.openai.api_base_url,
                model: raw.llm.openai.model,
                temperature: raw.llm.openai.temperature,
                timeout_seconds: raw.llm.openai.timeout_seconds,
            },
        },
        identity: IdentityConfig {
            profile_url: raw.identity.profile_url,
            timeout_seconds: raw.identity.timeout_seconds,
        },
        policy,
        data: DataConfig {
            knowledge_file: expand_home(&raw.data.knowledge_file),
            replies_file: expand_home(&raw.data.replies_file),
            prompts_dir: expand_home(&raw.data.prompts_dir),
        },
        llm_api_key: o.llm_api_key.clone(),
        search_api_key: o.search_api_key.clone(),
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), AppError> {
    let policy = &config.policy;
    if policy.personnel_roster.is_empty() {
        return Err(AppError::Config("personnel_roster must not be empty".into()));
    }
    for required in [&policy.founder, &policy.ceo] {
        if !policy.personnel_roster.contains(required) {
            return Err(AppError::Config(format!(
                "'{required}' must appear in personnel_roster"
            )));
        }
    }
    for (variant, canonical) in &policy.name_variants {
        if !policy.personnel_roster.contains(canonical) {
            return Err(AppError::Config(format!(
                "name variant '{variant}' maps to '{canonical}', which is not on the roster"
            )));
        }
    }
    if config.conversation.max_history == 0 {
        return Err(AppError::Config("max_history must be at least 1".into()));
    }
    if config.web.company_urls.len() < 3 {
        return Err(AppError::Config(
            "company_urls needs at least the About Us, main and travel pages".into(),
        ));
    }
    Ok(())
}

fn override_num<T: std::str::FromStr>(value: Option<&str>, name: &str) -> Result<Option<T>, AppError> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| AppError::Config(format!("{name} must be a number, got '{v}'")))
        })
        .transpose()
}

/// Split a comma-separated env value, dropping blanks.
fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `variant=canonical,variant=canonical`.
fn parse_variants(s: &str) -> Result<BTreeMap<String, String>, AppError> {
    split_list(s)
        .into_iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(v, c)| (v.trim().to_string(), c.trim().to_string()))
                .filter(|(v, c)| !v.is_empty() && !c.is_empty())
                .ok_or_else(|| AppError::Config(format!("NAME_VARIANTS entry '{pair}' is not variant=canonical")))
        })
        .collect()
}

/// Lowercase and collapse whitespace.
pub fn normalise_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
