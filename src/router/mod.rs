//! Router (R): the per-turn priority ladder.
//!
//! Each inbound turn is classified, then walked down [`LADDER`] until a step
//! produces a [`Candidate`]. Steps consult sources strictly in priority
//! order (knowledge store, company websites, web search, LLM) and the first
//! authoritative answer short-circuits everything below it.
//!
//! Every candidate then passes the source gate: text that was composed from
//! the web or generated by the model is never emitted for a recognised
//! personnel name. The knowledge store answer (or the fixed "unavailable"
//! reply) replaces it.
//!
//! The conversation store is read once before the ladder and written once
//! after the reply is composed; no lock is held across any network call.

pub mod direct;
pub mod preamble;
pub mod replies;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::compose::{ContextSummary, ResponseComposer};
use crate::config::normalise_name;
use crate::conversation::{Conversation, ConversationStore, TurnAnalysis};
use crate::intent::keywords::PERSONAL_PRONOUNS;
use crate::intent::{Classification, ContextClue, IntentClassifier, IntentLabel, TurnText};
use crate::knowledge::{KnowledgeStore, PolicyTable, display_name};
use crate::llm::LlmProvider;
use crate::search::{SearchProvider, format_results};
use crate::web::WebFetcher;

pub use preamble::PromptLibrary;
pub use replies::ScriptedReplies;

use replies::render;

const CITED_SEARCH_RESULTS: usize = 3;
const PREAMBLE_SEARCH_RESULTS: usize = 5;

// ── Source tags and steps ─────────────────────────────────────────────────────

/// Where a candidate answer came from, in priority order (lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Scripted,
    Knowledge,
    CompanySite,
    WebSearch,
    Model,
}

impl AnswerSource {
    /// Text composed from fetched pages or generated by the model.
    pub fn is_derived(self) -> bool {
        self >= AnswerSource::CompanySite
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStep {
    Scripted,
    PersonAuthority,
    PersonnelGate,
    ClaimCorrection,
    CompanyDirect,
    FollowUpContext,
    PersonEnrichment,
    GeneralKnowledge,
    Travel,
    ItSupport,
    Fallback,
}

/// Steps in the order they are tried.
pub const LADDER: [RouteStep; 11] = [
    RouteStep::Scripted,
    RouteStep::PersonAuthority,
    RouteStep::PersonnelGate,
    RouteStep::ClaimCorrection,
    RouteStep::CompanyDirect,
    RouteStep::FollowUpContext,
    RouteStep::PersonEnrichment,
    RouteStep::GeneralKnowledge,
    RouteStep::Travel,
    RouteStep::ItSupport,
    RouteStep::Fallback,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub source: AnswerSource,
    /// Normalised entity the answer is about, when known.
    pub entity: Option<String>,
    pub step: RouteStep,
}

enum StepOutcome {
    Answer(Candidate),
    Continue,
}

fn answer(text: String, source: AnswerSource, entity: Option<String>, step: RouteStep) -> StepOutcome {
    StepOutcome::Answer(Candidate { text, source, entity, step })
}

// ── Errors and replies ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("completion service not configured")]
    CompletionNotConfigured,
    #[error("completion service failed: {0}")]
    Completion(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub intent: IntentLabel,
    pub source: AnswerSource,
    pub follow_up_suggestions: Vec<String>,
    pub conversation_context: ContextSummary,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Everything the router needs, wired once at startup.
pub struct RouterDeps {
    pub knowledge: Arc<KnowledgeStore>,
    pub policy: Arc<PolicyTable>,
    pub classifier: IntentClassifier,
    pub conversations: Arc<ConversationStore>,
    pub web: Arc<WebFetcher>,
    pub search: SearchProvider,
    /// `None` when no completion service is configured.
    pub llm: Option<LlmProvider>,
    pub replies: Arc<ScriptedReplies>,
    pub prompts: Arc<PromptLibrary>,
    pub composer: ResponseComposer,
    /// About Us, main site, travel page, then extra sources.
    pub company_urls: Vec<String>,
    pub enrich_company_answers: bool,
}

pub struct Router {
    deps: RouterDeps,
}

/// Per-turn view shared by every step.
struct Turn<'a> {
    user_id: &'a str,
    text: &'a str,
    lowered: String,
    classification: Classification,
    prior: Option<Conversation>,
}

impl Router {
    pub fn new(deps: RouterDeps) -> Self {
        Self { deps }
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.deps.knowledge
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.deps.policy
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.deps.conversations
    }

    pub fn web(&self) -> &WebFetcher {
        &self.deps.web
    }

    pub fn search(&self) -> &SearchProvider {
        &self.deps.search
    }

    pub fn llm(&self) -> Option<&LlmProvider> {
        self.deps.llm.as_ref()
    }

    pub fn company_urls(&self) -> &[String] {
        &self.deps.company_urls
    }

    /// Route one turn for `user_id` and record the exchange.
    pub async fn handle(&self, user_id: &str, message: &str) -> Result<ChatReply, RouteError> {
        let text = message.trim();
        if text.is_empty() {
            return Err(RouteError::EmptyMessage);
        }

        let prior = self.deps.conversations.load_active(user_id);
        let classification = self.deps.classifier.classify(text, prior.as_ref());
        debug!(
            user_id,
            intent = %classification.label,
            follow_up = classification.is_follow_up,
            person = ?classification.person,
            "turn classified"
        );
        let turn = Turn { user_id, text, lowered: text.to_lowercase(), classification, prior };

        let mut chosen = None;
        for step in LADDER {
            if let StepOutcome::Answer(candidate) = self.run_step(step, &turn).await? {
                chosen = Some(candidate);
                break;
            }
        }
        let candidate = chosen.ok_or_else(|| RouteError::Internal("routing ladder produced no answer".into()))?;
        let candidate = self.gate(&turn, candidate);
        info!(
            user_id = turn.user_id,
            intent = %turn.classification.label,
            step = ?candidate.step,
            source = ?candidate.source,
            "turn answered"
        );

        let response = self.deps.composer.finalize(&candidate.text, candidate.source.is_derived());
        let mut analysis = TurnAnalysis::from(&turn.classification);
        if let Some(entity) = &candidate.entity {
            // A follow-up answered about a prior entity keeps that entity in focus.
            for list in [&mut analysis.entities, &mut analysis.topics] {
                if !list.contains(entity) {
                    list.push(entity.clone());
                }
            }
        }
        let conv = self.deps.conversations.update(user_id, text, &response, analysis);
        let follow_up_suggestions = self.deps.composer.suggestions(text, &turn.classification, &conv);

        Ok(ChatReply {
            response,
            intent: turn.classification.label,
            source: candidate.source,
            follow_up_suggestions,
            conversation_context: ContextSummary::from(&conv),
        })
    }

    async fn run_step(&self, step: RouteStep, turn: &Turn<'_>) -> Result<StepOutcome, RouteError> {
        match step {
            RouteStep::Scripted => Ok(self.scripted(turn)),
            RouteStep::PersonAuthority => Ok(self.person_authority(turn)),
            RouteStep::PersonnelGate => Ok(self.personnel_gate(turn)),
            RouteStep::ClaimCorrection => Ok(self.claim_correction(turn)),
            RouteStep::CompanyDirect => Ok(self.company_direct(turn).await),
            RouteStep::FollowUpContext => Ok(self.follow_up_context(turn)),
            RouteStep::PersonEnrichment => Ok(self.person_enrichment(turn).await),
            RouteStep::GeneralKnowledge => self.web_backed_completion(turn, IntentLabel::GeneralQuestion, None, step).await,
            RouteStep::Travel => {
                self.web_backed_completion(turn, IntentLabel::TravelQuestion, Some(preamble::TRAVEL), step).await
            }
            RouteStep::ItSupport => self.it_support(turn).await,
            RouteStep::Fallback => self.fallback(turn).await,
        }
    }

    // ── Deterministic steps ───────────────────────────────────────────────────

    fn scripted(&self, turn: &Turn<'_>) -> StepOutcome {
        match self.deps.replies.for_label(turn.classification.label) {
            Some(template) => answer(
                render(template, &[("company", self.deps.policy.company_name())]),
                AnswerSource::Scripted,
                None,
                RouteStep::Scripted,
            ),
            None => StepOutcome::Continue,
        }
    }

    fn person_authority(&self, turn: &Turn<'_>) -> StepOutcome {
        if turn.classification.label != IntentLabel::PersonSearch {
            return StepOutcome::Continue;
        }
        let Some(person) = turn.classification.person.as_deref() else {
            return StepOutcome::Continue;
        };
        match self.deps.knowledge.find_for_name(person, &self.deps.policy) {
            Some(record) => answer(
                record.answer.clone(),
                AnswerSource::Knowledge,
                Some(self.entity_for(person)),
                RouteStep::PersonAuthority,
            ),
            None => StepOutcome::Continue,
        }
    }

    fn personnel_gate(&self, turn: &Turn<'_>) -> StepOutcome {
        match self.deps.policy.personnel_in(&turn.lowered) {
            Some(name) => StepOutcome::Answer(self.personnel_answer(turn.text, name, RouteStep::PersonnelGate)),
            None => StepOutcome::Continue,
        }
    }

    fn claim_correction(&self, turn: &Turn<'_>) -> StepOutcome {
        let policy = &self.deps.policy;
        let Some(claim) = policy.wrong_claim_in(&turn.lowered) else {
            return StepOutcome::Continue;
        };
        let claim_display = display_name(claim);
        let founder = display_name(policy.founder());
        let ceo = display_name(policy.ceo());
        let text = render(
            &self.deps.replies.incorrect_leadership,
            &[
                ("claim", claim_display.as_str()),
                ("founder", founder.as_str()),
                ("ceo", ceo.as_str()),
                ("company", policy.company_name()),
            ],
        );
        answer(text, AnswerSource::Knowledge, Some(claim.to_string()), RouteStep::ClaimCorrection)
    }

    async fn company_direct(&self, turn: &Turn<'_>) -> StepOutcome {
        if turn.classification.label != IntentLabel::CastoQuestion {
            return StepOutcome::Continue;
        }
        let Some((topic, mut text)) = direct::compose(turn.text, &self.deps.replies, &self.deps.policy) else {
            return StepOutcome::Continue;
        };
        if self.deps.enrich_company_answers {
            if let Some(url) = self.deps.company_urls.get(1) {
                let page = self.deps.web.fetch(url, Some(topic.site_query())).await;
                if page.is_found() {
                    text.push_str(&format!("\n\nFrom {url}:\n{}", page.content()));
                }
            }
        }
        answer(text, AnswerSource::Knowledge, None, RouteStep::CompanyDirect)
    }

    /// A back-reference ("and his role?") resolves against a personnel
    /// entity named in the previous exchange. Anything else falls through
    /// to the model with the conversation layer.
    fn follow_up_context(&self, turn: &Turn<'_>) -> StepOutcome {
        let c = &turn.classification;
        if !c.has_clue(ContextClue::PronounReference)
            || !matches!(c.label, IntentLabel::FollowUp | IntentLabel::General | IntentLabel::Request)
            || !TurnText::new(turn.text).has_any(PERSONAL_PRONOUNS)
        {
            return StepOutcome::Continue;
        }
        let policy = &self.deps.policy;
        let Some(name) = turn
            .prior
            .as_ref()
            .and_then(|conv| conv.history.last())
            .and_then(|last| last.entities.iter().rev().find(|e| policy.roster().contains(e)))
            .map(String::as_str)
        else {
            return StepOutcome::Continue;
        };
        if let Some(residue) = name_residue(turn.text, policy.company_keywords()) {
            let resolved = policy
                .canonical_for(&residue)
                .map(str::to_string)
                .unwrap_or_else(|| normalise_name(&residue));
            if !name.contains(resolved.as_str()) {
                debug!(user_id = turn.user_id, entity = name, residue = %residue, "turn names someone else");
                return StepOutcome::Continue;
            }
        }
        debug!(user_id = turn.user_id, entity = name, "follow-up resolved against prior entity");
        let candidate = match self.deps.knowledge.find_for_name(name, policy) {
            Some(record) => Candidate {
                text: record.answer.clone(),
                source: AnswerSource::Knowledge,
                entity: Some(name.to_string()),
                step: RouteStep::FollowUpContext,
            },
            None => self.unavailable(name, RouteStep::FollowUpContext),
        };
        StepOutcome::Answer(candidate)
    }

    /// Company pages in priority order (About Us block, main, travel), then
    /// web search. Composed directly; the model is bypassed.
    async fn person_enrichment(&self, turn: &Turn<'_>) -> StepOutcome {
        if turn.classification.label != IntentLabel::PersonSearch {
            return StepOutcome::Continue;
        }
        let Some(person) = turn.classification.person.as_deref() else {
            return StepOutcome::Continue;
        };
        let company = self.deps.policy.company_name();
        let entity = Some(self.entity_for(person));
        let urls = &self.deps.company_urls;

        for (priority, url) in urls.iter().take(3).enumerate() {
            let page = if priority == 0 {
                self.deps.web.fetch_person(url, person).await
            } else {
                self.deps.web.fetch(url, Some(person)).await
            };
            debug!(url, priority = priority + 1, found = page.is_found(), "company source checked");
            if page.is_found() {
                let text = format!(
                    "Here's what I found about {person} on the {company} website ({}):\n\n{}",
                    page.url(),
                    page.content()
                );
                return answer(text, AnswerSource::CompanySite, entity, RouteStep::PersonEnrichment);
            }
        }

        match self.deps.search.smart_search(person).await {
            Some(results) if !results.is_empty() => {
                let text = format!(
                    "I couldn't find {person} on the {company} websites. Here's what a web search found:\n\n{}",
                    format_results(&results, CITED_SEARCH_RESULTS)
                );
                answer(text, AnswerSource::WebSearch, entity, RouteStep::PersonEnrichment)
            }
            _ => StepOutcome::Continue,
        }
    }

    // ── Completion steps ──────────────────────────────────────────────────────

    async fn web_backed_completion(
        &self,
        turn: &Turn<'_>,
        label: IntentLabel,
        directive: Option<&str>,
        step: RouteStep,
    ) -> Result<StepOutcome, RouteError> {
        if turn.classification.label != label {
            return Ok(StepOutcome::Continue);
        }
        let results = self.deps.search.smart_search(turn.text).await.unwrap_or_default();
        let web = (!results.is_empty()).then(|| format_results(&results, PREAMBLE_SEARCH_RESULTS));
        let preamble = self.preamble(turn, false, web.as_deref(), directive);
        self.complete(turn, &preamble, step).await
    }

    async fn it_support(&self, turn: &Turn<'_>) -> Result<StepOutcome, RouteError> {
        if turn.classification.label != IntentLabel::ItTroubleshooting {
            return Ok(StepOutcome::Continue);
        }
        let preamble = self.preamble(turn, false, None, Some(preamble::IT_SUPPORT));
        self.complete(turn, &preamble, RouteStep::ItSupport).await
    }

    async fn fallback(&self, turn: &Turn<'_>) -> Result<StepOutcome, RouteError> {
        let preamble = self.preamble(turn, true, None, None);
        self.complete(turn, &preamble, RouteStep::Fallback).await
    }

    fn preamble(&self, turn: &Turn<'_>, with_knowledge: bool, web: Option<&str>, directive: Option<&str>) -> String {
        let mut builder = self.deps.prompts.preamble();

        let company_context = with_knowledge || turn.classification.has_clue(ContextClue::CastoFocus);
        if company_context && !self.deps.knowledge.is_empty() {
            builder = builder
                .layer(preamble::COMPANY_GUARD)
                .var("knowledge", self.deps.knowledge.serialize_context());
        }
        if let Some(web) = web {
            builder = builder.layer(preamble::WEB_CONTEXT).var("web_results", web);
        }
        if let Some(directive) = directive {
            builder = builder.layer(directive);
        }
        if let Some(conv) = turn.prior.as_ref().filter(|c| !c.history.is_empty()) {
            builder = builder
                .layer(preamble::CONVERSATION)
                .var("focus", conv.current_focus.clone().unwrap_or_else(|| "none".into()))
                .var("topics", list_or_none(&conv.recent_topics(5)))
                .var("related", list_or_none(&conv.related_questions))
                .var("preferences", list_or_none(&conv.user_preferences));
        }
        builder.build()
    }

    async fn complete(&self, turn: &Turn<'_>, preamble: &str, step: RouteStep) -> Result<StepOutcome, RouteError> {
        let Some(llm) = &self.deps.llm else {
            warn!(user_id = turn.user_id, ?step, "completion needed but no provider configured");
            return Err(RouteError::CompletionNotConfigured);
        };
        debug!(provider = llm.name(), ?step, preamble_len = preamble.len(), "invoking completion");
        let text = llm.complete(preamble, turn.text).await.map_err(|e| {
            warn!(user_id = turn.user_id, error = %e, "completion failed");
            RouteError::Completion(e.to_string())
        })?;
        Ok(answer(text, AnswerSource::Model, None, step))
    }

    // ── Gate and shared helpers ───────────────────────────────────────────────

    /// Final safety net: a derived answer never reaches the user when the
    /// turn (or the candidate's entity) names recognised personnel.
    fn gate(&self, turn: &Turn<'_>, candidate: Candidate) -> Candidate {
        if !candidate.source.is_derived() {
            return candidate;
        }
        let policy = &self.deps.policy;
        let name = policy
            .personnel_in(&turn.lowered)
            .or_else(|| candidate.entity.as_deref().and_then(|e| policy.canonical_for(e)));
        let Some(name) = name else {
            return candidate;
        };
        warn!(
            user_id = turn.user_id,
            step = ?candidate.step,
            source = ?candidate.source,
            entity = name,
            "discarding derived answer for recognised personnel"
        );
        match self.deps.knowledge.find_entity_answer(turn.text, policy) {
            Some(hit) => Candidate {
                text: hit.record.answer.clone(),
                source: AnswerSource::Knowledge,
                entity: Some(hit.name.to_string()),
                step: candidate.step,
            },
            None => match self.deps.knowledge.find_for_name(name, policy) {
                Some(record) => Candidate {
                    text: record.answer.clone(),
                    source: AnswerSource::Knowledge,
                    entity: Some(name.to_string()),
                    step: candidate.step,
                },
                None => self.unavailable(name, candidate.step),
            },
        }
    }

    fn personnel_answer(&self, turn_text: &str, name: &str, step: RouteStep) -> Candidate {
        match self.deps.knowledge.find_entity_answer(turn_text, &self.deps.policy) {
            Some(hit) => Candidate {
                text: hit.record.answer.clone(),
                source: AnswerSource::Knowledge,
                entity: Some(hit.name.to_string()),
                step,
            },
            None => self.unavailable(name, step),
        }
    }

    fn unavailable(&self, name: &str, step: RouteStep) -> Candidate {
        let display = display_name(name);
        let text = render(
            &self.deps.replies.personnel_unavailable,
            &[("name", display.as_str()), ("company", self.deps.policy.company_name())],
        );
        Candidate { text, source: AnswerSource::Scripted, entity: Some(name.to_string()), step }
    }

    fn entity_for(&self, person: &str) -> String {
        match self.deps.policy.canonical_for(person) {
            Some(canonical) => canonical.to_string(),
            None => normalise_name(person),
        }
    }
}

/// Capitalised words after the opening one, e.g. "Elaine" in "and what
/// does Elaine do?". Acronyms and company keywords are not names.
fn name_residue(text: &str, company_keywords: &[String]) -> Option<String> {
    let names: Vec<&str> = text
        .split_whitespace()
        .skip(1)
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().count() > 2 && t.chars().next().is_some_and(char::is_uppercase))
        .filter(|t| !t.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()))
        .filter(|t| !company_keywords.iter().any(|k| k.eq_ignore_ascii_case(t)))
        .collect();
    (!names.is_empty()).then(|| names.join(" "))
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() { "none".to_string() } else { items.join("; ") }
}
