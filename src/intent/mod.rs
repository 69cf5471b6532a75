//! Intent classifier (IC) and person extractor (PE).
//!
//! Rule-based: one [`IntentLabel`] per turn, first matching rule wins.
//!
//! 1. roster name, name variant or wrong-leadership claim → `person_search`;
//!    identity / creator phrases → their own labels; person-lookup phrase →
//!    `person_search` unless a company keyword is also present.
//! 2. company keyword → `casto_question`.
//! 3. interrogative opener → `general_question`.
//! 4. travel keyword → `travel_question`.
//! 5. greeting / farewell (short turns only), clarification, IT trouble,
//!    follow-up, comparison, request; otherwise `general`.

pub mod keywords;
pub mod person;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;
use crate::knowledge::PolicyTable;

pub use person::extract_person;

use keywords::*;

// ── Labels ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    CastoQuestion,
    PersonSearch,
    GeneralQuestion,
    TravelQuestion,
    Greeting,
    Farewell,
    Clarification,
    IdentityQuestion,
    CreatorQuestion,
    SpecificCreatorQuestion,
    ItTroubleshooting,
    FollowUp,
    Comparison,
    Request,
    General,
}

impl IntentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentLabel::CastoQuestion => "casto_question",
            IntentLabel::PersonSearch => "person_search",
            IntentLabel::GeneralQuestion => "general_question",
            IntentLabel::TravelQuestion => "travel_question",
            IntentLabel::Greeting => "greeting",
            IntentLabel::Farewell => "farewell",
            IntentLabel::Clarification => "clarification",
            IntentLabel::IdentityQuestion => "identity_question",
            IntentLabel::CreatorQuestion => "creator_question",
            IntentLabel::SpecificCreatorQuestion => "specific_creator_question",
            IntentLabel::ItTroubleshooting => "it_troubleshooting",
            IntentLabel::FollowUp => "follow_up",
            IntentLabel::Comparison => "comparison",
            IntentLabel::Request => "request",
            IntentLabel::General => "general",
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextClue {
    CastoFocus,
    KnowledgeSeeking,
    TravelFocus,
    PersonInquiry,
    FollowUp,
    PronounReference,
}

/// Everything the classifier derives from one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: IntentLabel,
    pub clues: Vec<ContextClue>,
    pub is_follow_up: bool,
    /// Topic labels in first-seen order.
    pub topics: Vec<String>,
    /// Normalised entity names in first-seen order.
    pub entities: Vec<String>,
    /// Extracted person name for `person_search` turns.
    pub person: Option<String>,
}

impl Classification {
    pub fn has_clue(&self, clue: ContextClue) -> bool {
        self.clues.contains(&clue)
    }
}

// ── Turn text ─────────────────────────────────────────────────────────────────

/// Lowercased, whitespace-collapsed turn plus its word list.
pub(crate) struct TurnText {
    pub norm: String,
    pub words: Vec<String>,
}

impl TurnText {
    pub fn new(turn: &str) -> Self {
        let norm = turn.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        let words = norm
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self { norm, words }
    }

    /// Whole-word match for plain words, substring match for phrases.
    pub fn has(&self, keyword: &str) -> bool {
        if keyword.chars().all(|c| c.is_alphanumeric() || c == '\'') {
            self.words.iter().any(|w| w == keyword)
        } else {
            self.norm.contains(keyword)
        }
    }

    pub fn has_any(&self, table: &[&str]) -> bool {
        table.iter().any(|k| self.has(k))
    }

    /// `phrase` opens the turn and ends on a word boundary.
    pub fn starts_with(&self, phrase: &str) -> bool {
        self.norm.starts_with(phrase)
            && self.norm[phrase.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric())
    }
}

// ── Classifier ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct IntentClassifier {
    policy: Arc<PolicyTable>,
    creator_names: Vec<String>,
}

impl IntentClassifier {
    pub fn new(policy: Arc<PolicyTable>, creator_names: Vec<String>) -> Self {
        Self { policy, creator_names }
    }

    /// Classify `turn` given the user's prior conversation, if any.
    pub fn classify(&self, turn: &str, prior: Option<&Conversation>) -> Classification {
        let text = TurnText::new(turn);
        let has_history = prior.is_some_and(|c| !c.history.is_empty());

        let roster_hit = self.policy.personnel_in(&text.norm);
        let claim_hit = self.policy.wrong_claim_in(&text.norm);
        let person_phrase = text.has_any(PERSON_LOOKUP_PHRASES);
        let company = self.policy.company_keywords().iter().any(|k| text.has(k));

        let label = self.label(&text, roster_hit.is_some() || claim_hit.is_some(), person_phrase, company);

        let person = (label == IntentLabel::PersonSearch)
            .then(|| extract_person(turn))
            .flatten();

        let entities = self.entities(&text, person.as_deref());
        let topics = topics(&text, &entities, roster_hit.is_some());

        let pronoun = text.has_any(PRONOUNS);
        let is_follow_up = text.has_any(FOLLOW_UP_CONNECTIVES)
            || pronoun
            || text.words.len() <= 3
            || prior.is_some_and(|c| c.topics.iter().any(|t| text.has(t)));

        let mut clues = Vec::new();
        if company || roster_hit.is_some() {
            clues.push(ContextClue::CastoFocus);
        }
        if text.norm.contains('?') || GENERAL_INTERROGATIVES.iter().any(|p| text.starts_with(p)) {
            clues.push(ContextClue::KnowledgeSeeking);
        }
        if text.has_any(TRAVEL_KEYWORDS) {
            clues.push(ContextClue::TravelFocus);
        }
        if person_phrase || roster_hit.is_some() || claim_hit.is_some() {
            clues.push(ContextClue::PersonInquiry);
        }
        if is_follow_up {
            clues.push(ContextClue::FollowUp);
        }
        if has_history && pronoun {
            clues.push(ContextClue::PronounReference);
        }

        Classification { label, clues, is_follow_up, topics, entities, person }
    }

    fn label(&self, text: &TurnText, named_person: bool, person_phrase: bool, company: bool) -> IntentLabel {
        if named_person {
            return IntentLabel::PersonSearch;
        }
        if text.has_any(SPECIFIC_CREATOR_PHRASES)
            || (text.has_any(CREATOR_PHRASES) && self.creator_names.iter().any(|n| text.norm.contains(n.as_str())))
        {
            return IntentLabel::SpecificCreatorQuestion;
        }
        if text.has_any(CREATOR_PHRASES) {
            return IntentLabel::CreatorQuestion;
        }
        if text.has_any(IDENTITY_PHRASES) {
            return IntentLabel::IdentityQuestion;
        }
        if person_phrase && !company {
            return IntentLabel::PersonSearch;
        }
        if company {
            return IntentLabel::CastoQuestion;
        }
        if GENERAL_INTERROGATIVES.iter().any(|p| text.starts_with(p)) {
            return IntentLabel::GeneralQuestion;
        }
        if text.has_any(TRAVEL_KEYWORDS) {
            return IntentLabel::TravelQuestion;
        }

        let short = text.words.len() <= 5;
        if short && text.has_any(GREETINGS) {
            IntentLabel::Greeting
        } else if short && text.has_any(FAREWELLS) {
            IntentLabel::Farewell
        } else if text.has_any(CLARIFICATIONS) {
            IntentLabel::Clarification
        } else if text.has_any(IT_KEYWORDS) {
            IntentLabel::ItTroubleshooting
        } else if FOLLOW_UP_OPENERS.iter().any(|p| text.starts_with(p)) || text.has_any(FOLLOW_UP_PHRASES) {
            IntentLabel::FollowUp
        } else if text.has_any(COMPARISON_PHRASES) {
            IntentLabel::Comparison
        } else if text.has_any(REQUEST_PHRASES) {
            IntentLabel::Request
        } else {
            IntentLabel::General
        }
    }

    fn entities(&self, text: &TurnText, person: Option<&str>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for name in self.policy.roster() {
            if text.norm.contains(name.as_str()) {
                push_unique(&mut out, name);
            }
        }
        for canonical in self.policy.variants_in(&text.norm) {
            push_unique(&mut out, canonical);
        }
        if let Some(claim) = self.policy.wrong_claim_in(&text.norm) {
            push_unique(&mut out, claim);
        }
        if let Some(person) = person {
            let resolved = match self.policy.canonical_for(person) {
                Some(canonical) => canonical.to_string(),
                None => crate::config::normalise_name(person),
            };
            // Skip the extracted residue when it merely restates a claim.
            if !out.iter().any(|e| resolved.contains(e.as_str())) {
                push_unique(&mut out, &resolved);
            }
        }
        out
    }
}

fn topics(text: &TurnText, entities: &[String], personnel: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (keyword, topic) in TOPIC_KEYWORDS {
        if text.has(keyword) {
            push_unique(&mut out, topic);
        }
    }
    for entity in entities {
        push_unique(&mut out, entity);
    }
    if personnel {
        push_unique(&mut out, "casto");
    }
    out
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
