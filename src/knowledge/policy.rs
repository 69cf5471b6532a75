//! Routing policy tables: personnel roster, name variants, wrong
//! leadership claims and company-scope keywords.
//!
//! All names are stored normalised (lowercase, single spaces). Lookups take
//! the already-lowercased turn.

use std::collections::BTreeMap;

use crate::config::PolicyConfig;

#[derive(Debug, Clone)]
pub struct PolicyTable {
    roster: Vec<String>,
    variants: BTreeMap<String, String>,
    wrong_claims: Vec<String>,
    founder: String,
    ceo: String,
    company_keywords: Vec<String>,
    company_name: String,
}

impl PolicyTable {
    pub fn new(config: &PolicyConfig, company_name: &str) -> Self {
        Self {
            roster: config.personnel_roster.clone(),
            variants: config.name_variants.clone(),
            wrong_claims: config.wrong_leadership_claims.clone(),
            founder: config.founder.clone(),
            ceo: config.ceo.clone(),
            company_keywords: config.company_keywords.clone(),
            company_name: company_name.to_string(),
        }
    }

    /// Canonical roster name mentioned in `lowered`: canonical substrings
    /// first (roster order), then known variants.
    pub fn personnel_in(&self, lowered: &str) -> Option<&str> {
        if let Some(name) = self.roster.iter().find(|n| lowered.contains(n.as_str())) {
            return Some(name);
        }
        self.variants
            .iter()
            .find(|(variant, _)| lowered.contains(variant.as_str()))
            .map(|(_, canonical)| canonical.as_str())
    }

    /// Canonical names for every variant mentioned in `lowered`.
    pub fn variants_in<'a>(&'a self, lowered: &str) -> impl Iterator<Item = &'a str> {
        self.variants
            .iter()
            .filter(move |(variant, _)| lowered.contains(variant.as_str()))
            .map(|(_, canonical)| canonical.as_str())
    }

    /// Roster entry `name` resolves to, directly or via a variant.
    pub fn canonical_for(&self, name: &str) -> Option<&str> {
        let lowered = name.to_lowercase();
        self.personnel_in(&lowered)
    }

    /// First wrong-leadership claim mentioned in `lowered`.
    pub fn wrong_claim_in(&self, lowered: &str) -> Option<&str> {
        self.wrong_claims
            .iter()
            .find(|c| lowered.contains(c.as_str()))
            .map(String::as_str)
    }

    /// True when any company-scope keyword or roster name occurs.
    pub fn mentions_company(&self, lowered: &str) -> bool {
        self.company_keywords.iter().any(|k| lowered.contains(k.as_str()))
            || self.personnel_in(lowered).is_some()
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn founder(&self) -> &str {
        &self.founder
    }

    pub fn ceo(&self) -> &str {
        &self.ceo
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn company_keywords(&self) -> &[String] {
        &self.company_keywords
    }
}

/// Title-case a normalised name for display: `"michael s. pastrana"` →
/// `"Michael S. Pastrana"`.
pub fn display_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
pub(crate) fn test_policy() -> PolicyTable {
    let config = PolicyConfig {
        personnel_roster: vec!["maryles casto".into(), "marc casto".into(), "elaine randrup".into()],
        name_variants: [
            ("maryle casto", "maryles casto"),
            ("mark casto", "marc casto"),
            ("elaine randru", "elaine randrup"),
        ]
        .into_iter()
        .map(|(v, c)| (v.to_string(), c.to_string()))
        .collect(),
        wrong_leadership_claims: vec!["michael s. pastrana".into(), "michael pastrana".into()],
        founder: "maryles casto".into(),
        ceo: "marc casto".into(),
        company_keywords: ["casto", "founder", "ceo", "the company"].iter().map(|s| s.to_string()).collect(),
        creator_names: vec![],
    };
    PolicyTable::new(&config, "Casto Travel")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_found() {
        let p = test_policy();
        assert_eq!(p.personnel_in("who is marc casto?"), Some("marc casto"));
    }

    #[test]
    fn variant_resolves_to_canonical() {
        let p = test_policy();
        assert_eq!(p.personnel_in("tell me about mark casto"), Some("marc casto"));
        assert_eq!(p.personnel_in("who is elaine randru"), Some("elaine randrup"));
    }

    #[test]
    fn canonical_checked_before_variants() {
        let p = test_policy();
        // "maryle casto" is not a substring of "maryles casto", so only the canonical hits.
        assert_eq!(p.personnel_in("maryles casto and mark casto"), Some("maryles casto"));
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(test_policy().personnel_in("who is ada lovelace").is_none());
    }

    #[test]
    fn wrong_claim_detected() {
        let p = test_policy();
        assert_eq!(p.wrong_claim_in("is michael s. pastrana the ceo?"), Some("michael s. pastrana"));
        assert_eq!(p.wrong_claim_in("michael pastrana"), Some("michael pastrana"));
        assert!(p.wrong_claim_in("michael jordan").is_none());
    }

    #[test]
    fn company_mention_via_keyword_or_name() {
        let p = test_policy();
        assert!(p.mentions_company("who is the ceo"));
        assert!(p.mentions_company("elaine randrup"));
        assert!(!p.mentions_company("capital of france"));
    }

    #[test]
    fn display_name_title_cases() {
        assert_eq!(display_name("michael s. pastrana"), "Michael S. Pastrana");
        assert_eq!(display_name("maryles  casto"), "Maryles Casto");
    }
}
