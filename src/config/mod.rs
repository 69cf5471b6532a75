//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies env overrides.
//!
//! # Module layout
//!
//! - **types**: resolved configuration structs consumed by the service.
//! - **raw**: TOML deserialization shapes with serde defaults; private.
//! - **load**: `load`, `load_from`, env overrides, validation, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{EnvOverrides, expand_home, load, load_from, load_from_str, normalise_name};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[casi]
name = "CASI"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.service_name, "CASI");
        assert_eq!(cfg.conversation.timeout_seconds, 1800);
        assert_eq!(cfg.conversation.max_history, 10);
        assert_eq!(cfg.web.cache_seconds, 300);
        assert_eq!(cfg.web.timeout_seconds, 10);
        assert!((cfg.llm.openai.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.policy.founder, "maryles casto");
        assert!(cfg.llm_api_key.is_none());
    }

    #[test]
    fn shipped_default_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let cfg = load_from(&path, &EnvOverrides::default()).unwrap();
        assert!(cfg.policy.personnel_roster.contains(&"marc casto".to_string()));
        assert!(cfg.web.company_urls[0].contains("about"));
    }

    #[test]
    fn env_overrides_win_over_toml() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides {
            log_level: Some("debug".into()),
            conversation_timeout: Some("60".into()),
            max_conversation_history: Some("4".into()),
            cache_duration: Some("5".into()),
            company_urls: Some("https://a.test/about, https://a.test/ ,https://a.test/travel".into()),
            rate_limit: Some("12".into()),
            llm_api_key: Some("sk-test".into()),
            ..EnvOverrides::default()
        };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.conversation.timeout_seconds, 60);
        assert_eq!(cfg.conversation.max_history, 4);
        assert_eq!(cfg.web.cache_seconds, 5);
        assert_eq!(cfg.web.company_urls, vec![
            "https://a.test/about".to_string(),
            "https://a.test/".to_string(),
            "https://a.test/travel".to_string(),
        ]);
        assert_eq!(cfg.http.rate_limit_per_minute, 12);
        assert_eq!(cfg.llm_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn roster_and_variants_from_env_are_normalised() {
        let overrides = EnvOverrides {
            personnel_roster: Some("Maryles  Casto,Marc Casto".into()),
            name_variants: Some("Mark Casto=Marc Casto".into()),
            ..EnvOverrides::default()
        };
        let cfg = load_from_str(MINIMAL_TOML, &overrides).unwrap();
        assert_eq!(cfg.policy.personnel_roster, vec!["maryles casto", "marc casto"]);
        assert_eq!(cfg.policy.name_variants.get("mark casto").map(String::as_str), Some("marc casto"));
    }

    #[test]
    fn malformed_variant_pair_errors() {
        let overrides = EnvOverrides {
            name_variants: Some("no-equals-sign".into()),
            ..EnvOverrides::default()
        };
        let err = load_from_str(MINIMAL_TOML, &overrides).unwrap_err();
        assert!(err.to_string().contains("NAME_VARIANTS"));
    }

    #[test]
    fn non_numeric_override_errors() {
        let overrides = EnvOverrides {
            conversation_timeout: Some("soon".into()),
            ..EnvOverrides::default()
        };
        assert!(load_from_str(MINIMAL_TOML, &overrides).is_err());
    }

    #[test]
    fn founder_must_be_on_roster() {
        let toml = r#"
[policy]
personnel_roster = ["marc casto"]
founder = "maryles casto"
ceo = "marc casto"
"#;
        let err = load_from_str(toml, &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("maryles casto"));
    }

    #[test]
    fn variant_to_unknown_name_errors() {
        let toml = r#"
[policy.name_variants]
"jon doe" = "john doe"
"#;
        assert!(load_from_str(toml, &EnvOverrides::default()).is_err());
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &EnvOverrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.casi/knowledge.json");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("knowledge.json"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("config/prompts"), PathBuf::from("config/prompts"));
    }
}
