//! Canonical scripted replies, loaded from `config/replies.toml`.
//!
//! Every key is required so a half-edited file fails at startup rather
//! than mid-conversation. Templates use `{{var}}` placeholders.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::intent::IntentLabel;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedReplies {
    pub identity_prefix: String,
    pub identity: String,
    pub creator: String,
    pub specific_creator: String,
    pub greeting: String,
    pub farewell: String,
    pub clarification: String,
    pub incorrect_leadership: String,
    pub personnel_unavailable: String,
    pub company_leadership: String,
    pub company_services: String,
    pub company_history: String,
    pub company_accreditations: String,
    pub company_overview: String,
}

impl ScriptedReplies {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::Replies(format!("cannot read {}: {e}", path.display())))?;
        let replies = Self::from_toml(&text)
            .map_err(|e| AppError::Replies(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "scripted replies loaded");
        Ok(replies)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Template for a label answered without consulting any source.
    pub fn for_label(&self, label: IntentLabel) -> Option<&str> {
        let template = match label {
            IntentLabel::Greeting => &self.greeting,
            IntentLabel::Farewell => &self.farewell,
            IntentLabel::IdentityQuestion => &self.identity,
            IntentLabel::CreatorQuestion => &self.creator,
            IntentLabel::SpecificCreatorQuestion => &self.specific_creator,
            IntentLabel::Clarification => &self.clarification,
            _ => return None,
        };
        Some(template)
    }
}

/// Substitute `{{key}}` placeholders and trim surrounding whitespace.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.trim().to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

#[cfg(test)]
pub(crate) fn test_replies() -> ScriptedReplies {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/replies.toml");
    ScriptedReplies::load(&path).expect("shipped replies.toml must load")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_file_loads() {
        let r = test_replies();
        assert!(r.identity.contains("Casto Assistance and Support Intelligence"));
        assert!(r.incorrect_leadership.contains("{{claim}}"));
    }

    #[test]
    fn scripted_labels_have_templates() {
        let r = test_replies();
        for label in [
            IntentLabel::Greeting,
            IntentLabel::Farewell,
            IntentLabel::IdentityQuestion,
            IntentLabel::CreatorQuestion,
            IntentLabel::SpecificCreatorQuestion,
            IntentLabel::Clarification,
        ] {
            assert!(r.for_label(label).is_some(), "{label}");
        }
        assert!(r.for_label(IntentLabel::GeneralQuestion).is_none());
    }

    #[test]
    fn render_substitutes_and_trims() {
        let out = render("\n  Hi {{name}}, from {{company}}.\n", &[("name", "Ana"), ("company", "Casto Travel")]);
        assert_eq!(out, "Hi Ana, from Casto Travel.");
    }

    #[test]
    fn missing_key_fails() {
        assert!(ScriptedReplies::from_toml("greeting = \"hi\"").is_err());
    }
}
