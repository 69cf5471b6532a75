//! Knowledge store (KS): curated question/answer records about company
//! entities, loaded once at startup and read-only afterwards.
//!
//! Record order is significant: every lookup returns the first match.

pub mod policy;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

pub use policy::{PolicyTable, display_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub question: String,
    pub answer: String,
}

/// A record matched for a specific canonical personnel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityAnswer<'a> {
    pub name: &'a str,
    pub record: &'a KnowledgeRecord,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    records: Vec<KnowledgeRecord>,
    // Lowercased (question, answer) pairs, index-aligned with `records`.
    lowered: Vec<(String, String)>,
}

impl KnowledgeStore {
    pub fn from_records(records: Vec<KnowledgeRecord>) -> Self {
        let lowered = records
            .iter()
            .map(|r| (r.question.to_lowercase(), r.answer.to_lowercase()))
            .collect();
        Self { records, lowered }
    }

    /// Load a JSON array of `{question, answer}` objects.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::Knowledge(format!("cannot read {}: {e}", path.display())))?;
        let records: Vec<KnowledgeRecord> = serde_json::from_str(&text)
            .map_err(|e| AppError::Knowledge(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), records = records.len(), "knowledge store loaded");
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[KnowledgeRecord] {
        &self.records
    }

    /// First record whose lowercased question or answer contains `name`.
    fn first_mentioning(&self, name: &str) -> Option<&KnowledgeRecord> {
        self.lowered
            .iter()
            .position(|(q, a)| q.contains(name) || a.contains(name))
            .map(|i| &self.records[i])
    }

    /// Roster-driven entity lookup over a raw user turn.
    ///
    /// Each canonical roster name found in the turn is tried in roster order;
    /// only when no canonical name produced a record are the variants tried.
    /// Pure function of `(turn, store, policy)`; never touches the network.
    pub fn find_entity_answer<'a>(&'a self, turn: &str, policy: &'a PolicyTable) -> Option<EntityAnswer<'a>> {
        let lowered = turn.to_lowercase();

        for name in policy.roster() {
            if lowered.contains(name.as_str()) {
                if let Some(record) = self.first_mentioning(name) {
                    return Some(EntityAnswer { name, record });
                }
            }
        }

        policy.variants_in(&lowered).find_map(|canonical| {
            self.first_mentioning(canonical)
                .map(|record| EntityAnswer { name: canonical, record })
        })
    }

    /// Lookup for a name produced by the person extractor.
    ///
    /// Roster names and variants resolve to their canonical form. Other
    /// names only match when they look like a full name (two or more words),
    /// so short residues such as "it" never hit arbitrary records.
    pub fn find_for_name(&self, name: &str, policy: &PolicyTable) -> Option<&KnowledgeRecord> {
        if let Some(canonical) = policy.canonical_for(name) {
            return self.first_mentioning(canonical);
        }
        let normalised = crate::config::normalise_name(name);
        if normalised.split(' ').filter(|w| w.len() > 1).count() < 2 {
            return None;
        }
        self.first_mentioning(&normalised)
    }

    /// Serialize every record as `Q:`/`A:` pairs for the LLM preamble.
    pub fn serialize_context(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("Q: {}\nA: {}", r.question, r.answer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> KnowledgeStore {
    let rec = |q: &str, a: &str| KnowledgeRecord { question: q.into(), answer: a.into() };
    KnowledgeStore::from_records(vec![
        rec("Who is Maryles Casto?", "MARYLES CASTO — Founder and Chairman of Casto Travel."),
        rec("Who is Marc Casto?", "MARC CASTO — President and CEO of Casto Travel."),
        rec("Who is Elaine Randrup?", "ELAINE RANDRUP — member of the leadership team."),
        rec("Who founded Casto Travel?", "Founded by Maryles Casto; Marc Casto is CEO."),
    ])
}

#[cfg(test)]
mod tests {
    use super::policy::test_policy;
    use super::*;
    use std::io::Write;

    #[test]
    fn canonical_name_returns_first_matching_record() {
        let ks = test_store();
        let policy = test_policy();
        let hit = ks.find_entity_answer("Who is Maryles Casto?", &policy).unwrap();
        assert_eq!(hit.name, "maryles casto");
        assert!(hit.record.answer.starts_with("MARYLES CASTO"));
    }

    #[test]
    fn variant_lookup_uses_canonical() {
        let ks = test_store();
        let policy = test_policy();
        let hit = ks.find_entity_answer("what does mark casto do", &policy).unwrap();
        assert_eq!(hit.name, "marc casto");
        assert!(hit.record.answer.starts_with("MARC CASTO"));
    }

    #[test]
    fn order_is_preserved_for_shared_mentions() {
        // Both the Marc record and the "who founded" record mention marc casto;
        // the earlier one wins.
        let ks = test_store();
        let record = ks.find_for_name("Marc Casto", &test_policy()).unwrap();
        assert_eq!(record.question, "Who is Marc Casto?");
    }

    #[test]
    fn no_roster_name_is_none() {
        assert!(test_store().find_entity_answer("what is the weather", &test_policy()).is_none());
    }

    #[test]
    fn roster_name_without_record_is_none() {
        let ks = KnowledgeStore::from_records(vec![]);
        assert!(ks.find_entity_answer("who is marc casto", &test_policy()).is_none());
    }

    #[test]
    fn lookup_is_idempotent() {
        let ks = test_store();
        let policy = test_policy();
        let a = ks.find_entity_answer("Tell me about Elaine Randrup", &policy);
        let b = ks.find_entity_answer("Tell me about Elaine Randrup", &policy);
        assert_eq!(a, b);
    }

    #[test]
    fn short_extracted_names_never_match() {
        let ks = test_store();
        assert!(ks.find_for_name("it", &test_policy()).is_none());
        assert!(ks.find_for_name("Casto", &test_policy()).is_none());
    }

    #[test]
    fn serialize_context_lists_all_records() {
        let ctx = test_store().serialize_context();
        assert_eq!(ctx.matches("Q: ").count(), 4);
        assert!(ctx.contains("A: MARC CASTO"));
    }

    #[test]
    fn load_reads_json_array() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"[{"question":"q1","answer":"a1"},{"question":"q2","answer":"a2"}]"#).unwrap();
        let ks = KnowledgeStore::load(f.path()).unwrap();
        assert_eq!(ks.len(), 2);
        assert_eq!(ks.records()[1].answer, "a2");
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"{not json").unwrap();
        let err = KnowledgeStore::load(f.path()).unwrap_err();
        assert!(err.to_string().contains("knowledge error"));
    }
}
