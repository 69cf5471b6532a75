//! Response composer (RC): identity preamble, linkification, follow-up
//! suggestions and the compact context summary returned with every reply.

pub mod linkify;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::conversation::Conversation;
use crate::intent::{Classification, IntentLabel};
use crate::knowledge::display_name;

pub use linkify::linkify;

/// Identity must appear within this many chars of the start.
const PREAMBLE_WINDOW: usize = 200;
const MAX_SUGGESTIONS: usize = 3;
const SUMMARY_TOPICS: usize = 5;

static IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:i['’]m|i am|as) casi\b").expect("identity regex is valid")
});
// A repeated identity clause plus its trailing punctuation.
static IDENTITY_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:i['’]m|i am|as) casi\b[,.;:!]?\s*").expect("identity clause regex is valid")
});

/// Compact view of the conversation attached to `/chat` replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub current_focus: Option<String>,
    pub conversation_depth: usize,
    pub recent_topics: Vec<String>,
}

impl From<&Conversation> for ContextSummary {
    fn from(conv: &Conversation) -> Self {
        Self {
            current_focus: conv.current_focus.clone(),
            conversation_depth: conv.conversation_depth,
            recent_topics: conv.recent_topics(SUMMARY_TOPICS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseComposer {
    identity_prefix: String,
    company_name: String,
}

impl ResponseComposer {
    pub fn new(identity_prefix: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self { identity_prefix: identity_prefix.into(), company_name: company_name.into() }
    }

    /// Normalise outgoing text. With `require_identity`, a missing preamble
    /// is prepended; in every case at most one identity clause survives.
    pub fn finalize(&self, text: &str, require_identity: bool) -> String {
        let text = text.trim();
        let with_identity = if require_identity && !has_leading_identity(text) {
            format!("{} {text}", self.identity_prefix.trim())
        } else {
            text.to_string()
        };
        linkify(&dedupe_identity(&with_identity))
    }

    /// Up to three deterministic follow-up questions for the turn.
    pub fn suggestions(&self, turn: &str, classification: &Classification, conv: &Conversation) -> Vec<String> {
        let company = &self.company_name;
        let roster_entity = classification
            .entities
            .first()
            .filter(|_| classification.label == IntentLabel::PersonSearch);

        let candidates: Vec<String> = match classification.label {
            IntentLabel::PersonSearch => {
                let name = roster_entity.map(|e| display_name(e)).unwrap_or_else(|| "them".into());
                vec![
                    format!("What is {name}'s role at {company}?"),
                    format!("Who else is on the {company} leadership team?"),
                    format!("What services does {company} offer?"),
                ]
            }
            IntentLabel::CastoQuestion => vec![
                format!("Who founded {company}?"),
                format!("What services does {company} offer?"),
                format!("Where does {company} operate?"),
                format!("What is the history of {company}?"),
            ],
            IntentLabel::TravelQuestion => vec![
                "What documents do I need for international travel?".into(),
                format!("How can {company} help me book a trip?"),
                "What should I do if my flight is delayed?".into(),
            ],
            IntentLabel::ItTroubleshooting => vec![
                "How do I reset my password?".into(),
                "How do I connect to the VPN?".into(),
                "How do I contact the IT help desk?".into(),
            ],
            IntentLabel::Greeting
            | IntentLabel::IdentityQuestion
            | IntentLabel::CreatorQuestion
            | IntentLabel::SpecificCreatorQuestion
            | IntentLabel::Clarification => vec![
                "What does CASI stand for?".into(),
                format!("Who founded {company}?"),
                format!("What services does {company} offer?"),
            ],
            IntentLabel::Farewell => Vec::new(),
            _ => match &conv.current_focus {
                Some(focus) => vec![
                    format!("Tell me more about {focus}"),
                    format!("What else should I know about {focus}?"),
                    format!("What services does {company} offer?"),
                ],
                None => vec![
                    format!("What services does {company} offer?"),
                    format!("Who founded {company}?"),
                ],
            },
        };

        let asked = normalise_question(turn);
        candidates
            .into_iter()
            .filter(|s| normalise_question(s) != asked)
            .take(MAX_SUGGESTIONS)
            .collect()
    }
}

fn has_leading_identity(text: &str) -> bool {
    IDENTITY_RE.find(text).is_some_and(|m| text[..m.start()].chars().count() < PREAMBLE_WINDOW)
}

/// Drop every identity clause after the first, re-capitalising a sentence
/// that started with a removed clause.
fn dedupe_identity(text: &str) -> String {
    let Some(first) = IDENTITY_CLAUSE_RE.find(text) else {
        return text.to_string();
    };
    let mut out = text[..first.end()].to_string();
    let mut rest = &text[first.end()..];
    while let Some(m) = IDENTITY_CLAUSE_RE.find(rest) {
        out.push_str(&rest[..m.start()]);
        rest = &rest[m.end()..];
        let before = out.trim_end();
        let sentence_start = before.is_empty() || before.ends_with(['.', '!', '?', ':']);
        if sentence_start {
            if let Some(c) = rest.chars().next() {
                out.extend(c.to_uppercase());
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn normalise_question(s: &str) -> String {
    s.trim().trim_end_matches(['?', '.', '!']).to_lowercase()
}
