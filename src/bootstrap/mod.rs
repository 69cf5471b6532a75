//! Startup wiring: turn a resolved [`Config`] into a ready [`AppState`].

pub mod logger;

use std::sync::Arc;

use tracing::{info, warn};

use crate::comms::AppState;
use crate::compose::ResponseComposer;
use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::error::AppError;
use crate::identity::IdentityResolver;
use crate::intent::IntentClassifier;
use crate::knowledge::{KnowledgeStore, PolicyTable};
use crate::llm::providers as llm_providers;
use crate::router::{PromptLibrary, Router, RouterDeps, ScriptedReplies};
use crate::search::SearchProvider;
use crate::search::providers as search_providers;
use crate::web::WebFetcher;

/// Load data files and build every component.
pub fn assemble(config: &Config) -> Result<AppState, AppError> {
    let knowledge = KnowledgeStore::load(&config.data.knowledge_file)?;
    if knowledge.is_empty() {
        warn!(path = %config.data.knowledge_file.display(), "knowledge store is empty");
    }
    let replies = ScriptedReplies::load(&config.data.replies_file)?;
    let prompts = PromptLibrary::load(&config.data.prompts_dir);

    let company_name = config.search.company_name.as_str();
    let policy = Arc::new(PolicyTable::new(&config.policy, company_name));

    let mut keywords = config.search.company_keywords.clone();
    for name in policy.roster() {
        if !keywords.contains(name) {
            keywords.push(name.clone());
        }
    }
    let backend = search_providers::build(&config.search, &config.web.user_agent, config.search_api_key.clone())?;
    let search = SearchProvider::new(
        backend,
        company_name.to_string(),
        keywords,
        config.search.scoped_results,
        config.search.general_results,
    );

    let llm = llm_providers::build(&config.llm, config.llm_api_key.clone())?;
    let web = WebFetcher::new(&config.web)?;
    let conversations = ConversationStore::new(
        config.conversation.timeout_seconds,
        config.conversation.max_history,
        config.conversation.max_related_questions,
    );

    info!(
        knowledge_records = knowledge.len(),
        search_backend = search.backend().name(),
        llm = llm.as_ref().map_or("none", |p| p.name()),
        company_urls = config.web.company_urls.len(),
        "components assembled"
    );

    let composer = ResponseComposer::new(replies.identity_prefix.clone(), company_name);
    let router = Router::new(RouterDeps {
        knowledge: Arc::new(knowledge),
        classifier: IntentClassifier::new(policy.clone(), config.policy.creator_names.clone()),
        policy,
        conversations: Arc::new(conversations),
        web: Arc::new(web),
        search,
        llm,
        replies: Arc::new(replies),
        prompts: Arc::new(prompts),
        composer,
        company_urls: config.web.company_urls.clone(),
        enrich_company_answers: config.web.enrich_company_answers,
    });
    let identity = IdentityResolver::new(&config.identity)?;

    Ok(AppState::new(router, identity, config))
}
