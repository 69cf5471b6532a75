//! Person extractor (PE): pull a candidate name out of a person-lookup turn.

use super::keywords::PERSON_LOOKUP_PHRASES;

const TRAILING: &[char] = &['?', '!', '.', ',', ';', ':', '"', '\''];

/// Candidate personal name in `turn`, original casing preserved.
///
/// The text after the last lookup phrase wins; otherwise capitalised
/// tokens longer than two characters are joined.
pub fn extract_person(turn: &str) -> Option<String> {
    // ASCII lowering keeps byte offsets aligned with `turn`.
    let lowered = turn.to_ascii_lowercase();

    let after_prefix = PERSON_LOOKUP_PHRASES
        .iter()
        .filter_map(|phrase| lowered.find(phrase).map(|at| at + phrase.len()))
        .max()
        .map(|end| clean(&turn[end..]))
        .filter(|residue| !residue.is_empty());
    if after_prefix.is_some() {
        return after_prefix;
    }

    let capitalised: Vec<&str> = turn
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| TRAILING.contains(&c)))
        .filter(|t| t.chars().count() > 2 && t.chars().next().is_some_and(char::is_uppercase))
        .collect();
    if capitalised.is_empty() {
        None
    } else {
        Some(capitalised.join(" "))
    }
}

fn clean(residue: &str) -> String {
    residue
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(TRAILING)
        .trim()
        .to_string()
}
