//! Conversation store (CS): rolling per-user state.
//!
//! One coarse `Mutex<HashMap>` guards all conversations. Every write
//! replaces a user's value as a whole inside the lock, so readers only ever
//! see complete states, and the lock is never held across I/O.
//!
//! Timestamps are seconds (f64) since the store was created. The `*_at`
//! variants take an explicit `Instant` so timeouts can be tested without
//! sleeping.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::intent::{Classification, IntentLabel};

const PREFERENCE_MARKERS: &[&str] = &[
    "i prefer",
    "i like",
    "i love",
    "i'm interested in",
    "i am interested in",
    "i usually",
    "i always",
];
const PREFERENCE_MAX_CHARS: usize = 60;

// ── State types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub user_input: String,
    pub response: String,
    pub timestamp: f64,
    pub intent: IntentLabel,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub user_id: String,
    /// Oldest first, newest at the tail.
    pub history: Vec<Exchange>,
    pub last_updated: f64,
    /// Accumulated topics in first-seen order.
    pub topics: Vec<String>,
    /// Accumulated entities in first-seen order.
    pub entities: Vec<String>,
    pub current_focus: Option<String>,
    pub conversation_depth: usize,
    pub related_questions: Vec<String>,
    pub user_preferences: Vec<String>,
    /// Last label that was not a follow-up or clarification.
    pub intent: Option<IntentLabel>,
}

impl Conversation {
    fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            history: Vec::new(),
            last_updated: 0.0,
            topics: Vec::new(),
            entities: Vec::new(),
            current_focus: None,
            conversation_depth: 0,
            related_questions: Vec::new(),
            user_preferences: Vec::new(),
            intent: None,
        }
    }

    /// Up to `n` most recent distinct topics, newest first.
    pub fn recent_topics(&self, n: usize) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for exchange in self.history.iter().rev() {
            for topic in exchange.topics.iter().rev() {
                if out.len() == n {
                    return out;
                }
                if !out.contains(topic) {
                    out.push(topic.clone());
                }
            }
        }
        out
    }
}

/// Conversation plus its age, as returned by `/conversation/context`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub seconds_since_update: f64,
}

/// What the router learned about a turn, recorded with the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnAnalysis {
    pub intent: IntentLabel,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
    pub is_follow_up: bool,
}

impl From<&Classification> for TurnAnalysis {
    fn from(c: &Classification) -> Self {
        Self {
            intent: c.label,
            topics: c.topics.clone(),
            entities: c.entities.clone(),
            is_follow_up: c.is_follow_up,
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ConversationStore {
    conversations: Mutex<HashMap<String, Conversation>>,
    epoch: Instant,
    timeout_seconds: f64,
    max_history: usize,
    max_related: usize,
}

impl ConversationStore {
    pub fn new(timeout_seconds: u64, max_history: usize, max_related: usize) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            epoch: Instant::now(),
            timeout_seconds: timeout_seconds as f64,
            max_history: max_history.max(1),
            max_related,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Conversation>> {
        self.conversations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn secs(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.epoch).as_secs_f64()
    }

    fn expired(&self, conv: &Conversation, now_secs: f64) -> bool {
        !conv.history.is_empty() && now_secs - conv.last_updated > self.timeout_seconds
    }

    /// Current state for `user_id`, regardless of age.
    pub fn load(&self, user_id: &str) -> Option<Conversation> {
        self.lock().get(user_id).cloned()
    }

    /// State as the next turn will see it: `None` once the timeout elapsed.
    pub fn load_active(&self, user_id: &str) -> Option<Conversation> {
        self.load_active_at(user_id, Instant::now())
    }

    pub fn load_active_at(&self, user_id: &str, now: Instant) -> Option<Conversation> {
        let now_secs = self.secs(now);
        self.lock()
            .get(user_id)
            .filter(|c| !self.expired(c, now_secs))
            .cloned()
    }

    pub fn snapshot_at(&self, user_id: &str, now: Instant) -> Option<ConversationSnapshot> {
        let now_secs = self.secs(now);
        self.load_active_at(user_id, now).map(|conversation| ConversationSnapshot {
            seconds_since_update: (now_secs - conversation.last_updated).max(0.0),
            conversation,
        })
    }

    /// Snapshot for `user_id`; an empty conversation when none is active.
    pub fn snapshot(&self, user_id: &str) -> ConversationSnapshot {
        self.snapshot_at(user_id, Instant::now()).unwrap_or_else(|| ConversationSnapshot {
            conversation: Conversation::new(user_id),
            seconds_since_update: 0.0,
        })
    }

    /// Record one exchange and return the updated conversation.
    pub fn update(&self, user_id: &str, turn: &str, response: &str, analysis: TurnAnalysis) -> Conversation {
        self.update_at(user_id, turn, response, analysis, Instant::now())
    }

    pub fn update_at(
        &self,
        user_id: &str,
        turn: &str,
        response: &str,
        analysis: TurnAnalysis,
        now: Instant,
    ) -> Conversation {
        let now_secs = self.secs(now);
        let mut map = self.lock();

        let before = map.len();
        map.retain(|id, c| id == user_id || !self.expired(c, now_secs));
        if map.len() < before {
            debug!(pruned = before - map.len(), "expired conversations dropped");
        }

        let mut conv = match map.get(user_id) {
            Some(existing) if !self.expired(existing, now_secs) => existing.clone(),
            Some(_) => {
                debug!(user_id, "conversation timed out; resetting");
                Conversation::new(user_id)
            }
            None => Conversation::new(user_id),
        };

        for topic in &analysis.topics {
            push_unique(&mut conv.topics, topic);
        }
        for entity in &analysis.entities {
            push_unique(&mut conv.entities, entity);
        }

        conv.history.push(Exchange {
            user_input: turn.to_string(),
            response: response.to_string(),
            timestamp: now_secs,
            intent: analysis.intent,
            topics: analysis.topics,
            entities: analysis.entities,
        });
        if conv.history.len() > self.max_history {
            let overflow = conv.history.len() - self.max_history;
            conv.history.drain(..overflow);
        }

        conv.conversation_depth = conv.history.len();
        conv.current_focus = focus(&conv.history);
        conv.last_updated = now_secs;

        if analysis.is_follow_up {
            conv.related_questions.push(turn.to_string());
            if conv.related_questions.len() > self.max_related {
                let overflow = conv.related_questions.len() - self.max_related;
                conv.related_questions.drain(..overflow);
            }
        }
        for pref in preferences(turn) {
            push_unique(&mut conv.user_preferences, &pref);
        }
        if !matches!(analysis.intent, IntentLabel::FollowUp | IntentLabel::Clarification) {
            conv.intent = Some(analysis.intent);
        }

        map.insert(user_id.to_string(), conv.clone());
        conv
    }

    /// Drop a user's conversation. Returns whether one existed.
    pub fn clear(&self, user_id: &str) -> bool {
        self.lock().remove(user_id).is_some()
    }

    /// Conversations that have not timed out.
    pub fn active_count(&self) -> usize {
        let now_secs = self.secs(Instant::now());
        self.lock().values().filter(|c| !self.expired(c, now_secs)).count()
    }
}

/// Most frequent topic across `history`; ties go to the most recent mention.
fn focus(history: &[Exchange]) -> Option<String> {
    let mut stats: HashMap<&str, (usize, (usize, usize))> = HashMap::new();
    for (i, exchange) in history.iter().enumerate() {
        for (j, topic) in exchange.topics.iter().enumerate() {
            let entry = stats.entry(topic.as_str()).or_insert((0, (i, j)));
            entry.0 += 1;
            entry.1 = (i, j);
        }
    }
    stats
        .into_iter()
        .max_by_key(|(_, stat)| *stat)
        .map(|(topic, _)| topic.to_string())
}

/// Preference phrases following a marker, lowercased.
fn preferences(turn: &str) -> Vec<String> {
    let lowered = turn.to_lowercase();
    PREFERENCE_MARKERS
        .iter()
        .filter_map(|marker| {
            let at = lowered.find(marker)? + marker.len();
            let phrase: String = lowered[at..]
                .chars()
                .take_while(|c| !matches!(c, '.' | ',' | '!' | '?' | ';'))
                .take(PREFERENCE_MAX_CHARS)
                .collect();
            let phrase = phrase.trim().to_string();
            (!phrase.is_empty()).then_some(phrase)
        })
        .collect()
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|e| e == item) {
        list.push(item.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn analysis(intent: IntentLabel, topics: &[&str], follow_up: bool) -> TurnAnalysis {
        TurnAnalysis {
            intent,
            topics: topics.iter().map(|s| s.to_string()).collect(),
            entities: vec![],
            is_follow_up: follow_up,
        }
    }

    #[test]
    fn first_update_creates_conversation() {
        let store = ConversationStore::new(1800, 10, 5);
        assert!(store.load("u").is_none());
        let conv = store.update("u", "hello", "hi", analysis(IntentLabel::Greeting, &[], false));
        assert_eq!(conv.conversation_depth, 1);
        assert_eq!(conv.intent, Some(IntentLabel::Greeting));
        assert_eq!(store.load("u").unwrap().history.len(), 1);
    }

    #[test]
    fn history_is_capped_and_drops_oldest() {
        let store = ConversationStore::new(1800, 10, 5);
        for i in 0..13 {
            store.update("u", &format!("turn {i}"), "r", analysis(IntentLabel::General, &[], false));
        }
        let conv = store.load("u").unwrap();
        assert_eq!(conv.history.len(), 10);
        assert_eq!(conv.conversation_depth, 10);
        assert_eq!(conv.history[0].user_input, "turn 3");
        assert_eq!(conv.history[9].user_input, "turn 12");
    }

    #[test]
    fn timeout_resets_before_append() {
        let store = ConversationStore::new(1800, 10, 5);
        let t0 = Instant::now();
        store.update_at("u", "Who is Marc Casto?", "r", analysis(IntentLabel::PersonSearch, &["marc casto"], false), t0);
        store.update_at("u", "hello", "r", analysis(IntentLabel::Greeting, &[], false), t0 + Duration::from_secs(10));

        let later = t0 + Duration::from_secs(10 + 1801);
        assert!(store.load_active_at("u", later).is_none());

        let conv = store.update_at("u", "hi", "r", analysis(IntentLabel::Greeting, &[], false), later);
        assert_eq!(conv.history.len(), 1);
        assert!(conv.topics.is_empty());
        assert_eq!(conv.user_id, "u");
    }

    #[test]
    fn within_timeout_keeps_history() {
        let store = ConversationStore::new(1800, 10, 5);
        let t0 = Instant::now();
        store.update_at("u", "a", "r", analysis(IntentLabel::General, &[], false), t0);
        let conv = store.update_at("u", "b", "r", analysis(IntentLabel::General, &[], false), t0 + Duration::from_secs(1799));
        assert_eq!(conv.history.len(), 2);
    }

    #[test]
    fn topics_accumulate_and_focus_is_most_frequent() {
        let store = ConversationStore::new(1800, 10, 5);
        store.update("u", "a", "r", analysis(IntentLabel::General, &["travel", "casto"], false));
        store.update("u", "b", "r", analysis(IntentLabel::General, &["casto"], false));
        let conv = store.update("u", "c", "r", analysis(IntentLabel::General, &["services"], false));
        assert_eq!(conv.topics, vec!["travel", "casto", "services"]);
        assert_eq!(conv.current_focus.as_deref(), Some("casto"));
    }

    #[test]
    fn focus_tie_goes_to_most_recent() {
        let store = ConversationStore::new(1800, 10, 5);
        store.update("u", "a", "r", analysis(IntentLabel::General, &["travel"], false));
        let conv = store.update("u", "b", "r", analysis(IntentLabel::General, &["services"], false));
        assert_eq!(conv.current_focus.as_deref(), Some("services"));
    }

    #[test]
    fn related_questions_only_for_follow_ups_and_capped() {
        let store = ConversationStore::new(1800, 10, 2);
        store.update("u", "first", "r", analysis(IntentLabel::General, &[], false));
        for q in ["q1", "q2", "q3"] {
            store.update("u", q, "r", analysis(IntentLabel::FollowUp, &[], true));
        }
        let conv = store.load("u").unwrap();
        assert_eq!(conv.related_questions, vec!["q2", "q3"]);
        assert_eq!(conv.intent, Some(IntentLabel::General));
    }

    #[test]
    fn preferences_are_extracted() {
        let store = ConversationStore::new(1800, 10, 5);
        let conv = store.update(
            "u",
            "I prefer window seats, and I'm interested in Japan trips.",
            "r",
            analysis(IntentLabel::TravelQuestion, &["travel"], false),
        );
        assert_eq!(conv.user_preferences, vec!["window seats", "japan trips"]);
    }

    #[test]
    fn clear_and_active_count() {
        let store = ConversationStore::new(1800, 10, 5);
        store.update("a", "x", "r", analysis(IntentLabel::General, &[], false));
        store.update("b", "x", "r", analysis(IntentLabel::General, &[], false));
        assert_eq!(store.active_count(), 2);
        assert!(store.clear("a"));
        assert!(!store.clear("a"));
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn expired_conversations_are_dropped_on_update() {
        let store = ConversationStore::new(60, 10, 5);
        let t0 = Instant::now();
        store.update_at("old", "x", "r", analysis(IntentLabel::General, &[], false), t0);
        store.update_at("recent", "x", "r", analysis(IntentLabel::General, &[], false), t0 + Duration::from_secs(30));

        store.update_at("new", "x", "r", analysis(IntentLabel::General, &[], false), t0 + Duration::from_secs(61));
        assert!(store.load("old").is_none());
        assert!(store.load("recent").is_some());
        assert!(store.load("new").is_some());
    }

    #[test]
    fn recent_topics_newest_first() {
        let store = ConversationStore::new(1800, 10, 5);
        store.update("u", "a", "r", analysis(IntentLabel::General, &["travel"], false));
        let conv = store.update("u", "b", "r", analysis(IntentLabel::General, &["casto", "leadership"], false));
        assert_eq!(conv.recent_topics(5), vec!["leadership", "casto", "travel"]);
        assert_eq!(conv.recent_topics(1), vec!["leadership"]);
    }

    #[test]
    fn snapshot_reports_age() {
        let store = ConversationStore::new(1800, 10, 5);
        let t0 = Instant::now();
        store.update_at("u", "a", "r", analysis(IntentLabel::General, &[], false), t0);
        let snap = store.snapshot_at("u", t0 + Duration::from_secs(30)).unwrap();
        assert!((snap.seconds_since_update - 30.0).abs() < 0.5);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["user_id"], "u");
        assert_eq!(json["conversation_depth"], 1);
    }
}
