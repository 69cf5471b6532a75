//! Rule-based company direct composer.
//!
//! Maps a company-scoped turn to one of the canned company answers. Returns
//! `None` when the turn has no recognisable topic and is not a general
//! "about the company" question, leaving it to later steps.

use crate::intent::TurnText;
use crate::knowledge::{PolicyTable, display_name};

use super::replies::{ScriptedReplies, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyTopic {
    Leadership,
    Services,
    History,
    Accreditations,
    Overview,
}

impl CompanyTopic {
    /// Term used when enriching the answer from the company site.
    pub fn site_query(self) -> &'static str {
        match self {
            CompanyTopic::Leadership => "founder",
            CompanyTopic::Services => "services",
            CompanyTopic::History => "history",
            CompanyTopic::Accreditations => "accredit",
            CompanyTopic::Overview => "about",
        }
    }
}

const LEADERSHIP: &[&str] = &[
    "founder", "who founded", "founded by", "ceo", "president", "chairman", "owner", "owns",
    "leadership", "leader", "leads", "who runs", "in charge", "head of",
];
const SERVICES: &[&str] = &[
    "services", "service", "offer", "offers", "provide", "provides", "what do you do",
    "what does casto do", "products",
];
const HISTORY: &[&str] = &[
    "history", "founded", "started", "established", "how long", "when was", "since when", "origin",
    "background",
];
const ACCREDITATIONS: &[&str] = &[
    "accredited", "accreditation", "accreditations", "certified", "certification", "certifications",
    "iata", "arc", "license", "licensed", "member of",
];
const OVERVIEW: &[&str] = &[
    "about", "what is", "what's", "who is", "who are", "tell me", "overview", "describe", "explain",
];

pub(crate) fn classify_topic(text: &TurnText) -> Option<CompanyTopic> {
    if text.has_any(LEADERSHIP) {
        Some(CompanyTopic::Leadership)
    } else if text.has_any(ACCREDITATIONS) {
        Some(CompanyTopic::Accreditations)
    } else if text.has_any(SERVICES) {
        Some(CompanyTopic::Services)
    } else if text.has_any(HISTORY) {
        Some(CompanyTopic::History)
    } else if text.has_any(OVERVIEW) || text.words.len() <= 3 {
        Some(CompanyTopic::Overview)
    } else {
        None
    }
}

/// Canned answer for a company-scoped turn.
pub fn compose(turn: &str, replies: &ScriptedReplies, policy: &PolicyTable) -> Option<(CompanyTopic, String)> {
    let text = TurnText::new(turn);
    let topic = classify_topic(&text)?;
    let template = match topic {
        CompanyTopic::Leadership => &replies.company_leadership,
        CompanyTopic::Services => &replies.company_services,
        CompanyTopic::History => &replies.company_history,
        CompanyTopic::Accreditations => &replies.company_accreditations,
        CompanyTopic::Overview => &replies.company_overview,
    };
    let founder = display_name(policy.founder());
    let ceo = display_name(policy.ceo());
    let answer = render(
        template,
        &[("company", policy.company_name()), ("founder", founder.as_str()), ("ceo", ceo.as_str())],
    );
    Some((topic, answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::policy::test_policy;
    use crate::router::replies::test_replies;

    fn topic(turn: &str) -> Option<CompanyTopic> {
        classify_topic(&TurnText::new(turn))
    }

    #[test]
    fn topics_by_keyword() {
        assert_eq!(topic("Who is the CEO of Casto?"), Some(CompanyTopic::Leadership));
        assert_eq!(topic("Who founded Casto Travel?"), Some(CompanyTopic::Leadership));
        assert_eq!(topic("What services does Casto offer?"), Some(CompanyTopic::Services));
        assert_eq!(topic("When was Casto established?"), Some(CompanyTopic::History));
        assert_eq!(topic("Is Casto IATA accredited?"), Some(CompanyTopic::Accreditations));
        assert_eq!(topic("tell me about casto"), Some(CompanyTopic::Overview));
    }

    #[test]
    fn unrecognised_company_turn_is_none() {
        assert_eq!(topic("does casto have parking near the office building"), None);
    }

    #[test]
    fn leadership_answer_names_founder_and_ceo() {
        let (t, answer) = compose("Who is the CEO of Casto?", &test_replies(), &test_policy()).unwrap();
        assert_eq!(t, CompanyTopic::Leadership);
        assert!(answer.contains("Maryles Casto"));
        assert!(answer.contains("Marc Casto"));
        assert!(!answer.contains("{{"));
    }
}
