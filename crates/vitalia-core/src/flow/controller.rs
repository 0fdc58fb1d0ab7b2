//! The flow controller: per-session dialogue state machine.
//!
//! Sole owner of the conversation flow. It consumes context signals,
//! drives state transitions, calls the external collaborators with bounded
//! timeouts, and commits both turns plus the updated session state back to
//! the memory store in one step. Turns for the same user are handled
//! strictly one at a time; different users proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use vitalia_types::config::EngineConfig;
use vitalia_types::context::{ContextSignal, Intent};
use vitalia_types::error::{ConfigError, SearchError};
use vitalia_types::event::EngagementEvent;
use vitalia_types::flow::{ConversationState, FlowDecision, FlowOutcome};
use vitalia_types::recommend::Candidate;
use vitalia_types::session::{ConversationSession, Turn};

use crate::analytics::AnalyticsSink;
use crate::cache::{CacheStats, ResponseCache};
use crate::context::{ContextAnalyzer, matcher};
use crate::llm::LlmClient;
use crate::memory::MemoryStore;
use crate::recommend::{RecommendationScorer, SynergyTable};
use crate::search::SearchProvider;

use super::responses;

/// Relevance assigned to complements injected into a synergy answer.
const SYNERGY_POOL_RELEVANCE: f64 = 0.5;
/// Relevance assigned to previously discussed products in a degraded answer.
const FALLBACK_DISCUSSED_RELEVANCE: f64 = 0.5;
/// Relevance assigned to catalog products in a degraded answer.
const FALLBACK_CATALOG_RELEVANCE: f64 = 0.25;

/// Everything a dispatch branch decides before the commit step.
struct Step {
    decision: FlowDecision,
    offer_consultation: bool,
    next_state: ConversationState,
    /// Replacement for the session's `last_offered`, when the decision
    /// put new products on the table.
    offered: Option<Vec<String>>,
}

impl Step {
    fn new(decision: FlowDecision, next_state: ConversationState) -> Self {
        Self {
            decision,
            offer_consultation: false,
            next_state,
            offered: None,
        }
    }
}

/// Orchestrates one user message end to end.
///
/// Generic over the three external collaborators so tests can substitute
/// deterministic fakes.
pub struct FlowController<S, L, A> {
    config: EngineConfig,
    store: Arc<MemoryStore>,
    cache: ResponseCache<Vec<Candidate>>,
    analyzer: ContextAnalyzer,
    scorer: RecommendationScorer,
    search: S,
    llm: L,
    analytics: A,
    session_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S, L, A> FlowController<S, L, A>
where
    S: SearchProvider,
    L: LlmClient,
    A: AnalyticsSink,
{
    pub fn new(
        config: EngineConfig,
        synergy: SynergyTable,
        store: Arc<MemoryStore>,
        search: S,
        llm: L,
        analytics: A,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = ResponseCache::new(
            config.cache.capacity,
            Duration::from_secs(config.cache.default_ttl_secs),
        );
        let scorer = RecommendationScorer::new(config.scoring.clone(), synergy)?;
        Ok(Self {
            config,
            store,
            cache,
            analyzer: ContextAnalyzer::new(),
            scorer,
            search,
            llm,
            analytics,
            session_locks: DashMap::new(),
        })
    }

    /// The session store, shared with the background sweeper.
    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Handle one user message and produce a flow outcome.
    ///
    /// Infallible by contract: collaborator failures degrade to canned
    /// replies and the offline candidate list, never to an error.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn handle_message(&self, user_id: &str, message: &str) -> FlowOutcome {
        let lock = self.session_lock(user_id);
        let outcome = {
            let _guard = lock.lock().await;

            let session = self.store.get_session(user_id);
            let signal = self.analyzer.analyze(message, &session);
            info!(
                intent = %signal.intent,
                state = %session.state,
                "handling message"
            );

            let step = self.dispatch(user_id, message, &session, &signal).await;
            self.commit(user_id, message, &signal, &step);

            FlowOutcome {
                decision: step.decision,
                offer_consultation: step.offer_consultation,
            }
        };
        drop(lock);
        self.release_session_lock(user_id);
        outcome
    }

    /// Close and purge a user's session. Returns whether one existed.
    pub async fn reset(&self, user_id: &str) -> bool {
        let lock = self.session_lock(user_id);
        let existed = {
            let _guard = lock.lock().await;
            debug!(user_id, "resetting session");
            self.store.reset(user_id)
        };
        drop(lock);
        self.release_session_lock(user_id);
        existed
    }

    async fn dispatch(
        &self,
        user_id: &str,
        message: &str,
        session: &ConversationSession,
        signal: &ContextSignal,
    ) -> Step {
        match signal.intent {
            Intent::Smalltalk if session.state == ConversationState::Selecting => {
                self.follow_up_after_selection(session).await
            }
            Intent::Greeting => {
                let text = self
                    .phrase(
                        responses::GREETING_PROMPT,
                        session,
                        responses::GREETING_FALLBACK.to_string(),
                    )
                    .await;
                Step::new(
                    FlowDecision::AnswerDirectly {
                        text,
                        candidates: vec![],
                    },
                    ConversationState::Engaged,
                )
            }
            Intent::Smalltalk => {
                let text = self
                    .phrase(
                        responses::SMALLTALK_PROMPT,
                        session,
                        responses::SMALLTALK_FALLBACK.to_string(),
                    )
                    .await;
                Step::new(
                    FlowDecision::AnswerDirectly {
                        text,
                        candidates: vec![],
                    },
                    ConversationState::Engaged,
                )
            }
            Intent::Selection => self.handle_selection(user_id, message, session, signal),
            Intent::LinkRequest => self.handle_link_request(user_id, message, session, signal),
            Intent::Clarification => {
                if session.state == ConversationState::Clarifying {
                    let query = accumulated_query(session, message);
                    return self.recommend(user_id, &query, session, signal).await;
                }
                if let Some(product) = signal.referenced_product.clone() {
                    let query = format!("{product} {message}");
                    return self.recommend(user_id, &query, session, signal).await;
                }
                Step::new(
                    FlowDecision::AskClarifyingQuestion {
                        text: responses::clarifying_question(&signal.topics),
                    },
                    ConversationState::Clarifying,
                )
            }
            Intent::ProductQuery | Intent::SynergyRequest => {
                if session.state == ConversationState::Clarifying {
                    let query = accumulated_query(session, message);
                    return self.recommend(user_id, &query, session, signal).await;
                }
                if self.too_vague(message) {
                    return Step::new(
                        FlowDecision::AskClarifyingQuestion {
                            text: responses::clarifying_question(&signal.topics),
                        },
                        ConversationState::Clarifying,
                    );
                }
                self.recommend(user_id, message, session, signal).await
            }
        }
    }

    /// Ranked answer via search (or the offline fallback pool), the
    /// scorer, and LLM phrasing.
    async fn recommend(
        &self,
        user_id: &str,
        query: &str,
        session: &ConversationSession,
        signal: &ContextSignal,
    ) -> Step {
        let cache_key = format!("{}:{}", signal.intent, matcher::normalize(query));
        let fetched = self
            .cache
            .get_or_compute(&cache_key, self.cache.default_ttl(), || {
                self.search_with_timeout(query, signal.intent)
            })
            .await;

        let mut pool = match fetched {
            Ok(pool) if !pool.is_empty() => pool,
            Ok(_) => {
                debug!("search returned no candidates, using offline pool");
                self.fallback_pool(session)
            }
            Err(err) => {
                warn!(error = %err, "search failed, using offline pool");
                self.fallback_pool(session)
            }
        };

        if signal.intent == Intent::SynergyRequest {
            if let Some(referenced) = signal.referenced_product.as_deref() {
                for partner in self.scorer.synergy().complements(referenced) {
                    if !pool.iter().any(|c| c.product_id == *partner) {
                        pool.push(Candidate::new(partner.clone(), SYNERGY_POOL_RELEVANCE));
                    }
                }
            }
        }

        let scored = self.scorer.score(pool, session, signal);
        let text = self
            .phrase(
                &responses::answer_prompt(query, &scored),
                session,
                responses::ranked_answer(&scored),
            )
            .await;
        self.analytics
            .record(EngagementEvent::recommendation_served(user_id, scored.len()));

        let offered: Vec<String> = scored.iter().map(|c| c.product_id.clone()).collect();
        let mut step = Step::new(
            FlowDecision::AnswerDirectly {
                text,
                candidates: scored,
            },
            ConversationState::Engaged,
        );
        step.offered = Some(offered);
        step
    }

    fn handle_selection(
        &self,
        user_id: &str,
        message: &str,
        session: &ConversationSession,
        signal: &ContextSignal,
    ) -> Step {
        let by_ordinal = signal
            .ordinal
            .and_then(|n| session.last_offered.get(n - 1).cloned());
        let by_name = self
            .scorer
            .synergy()
            .extract_entities(message)
            .into_iter()
            .find(|e| session.last_offered.contains(e));

        match by_ordinal.or(by_name) {
            Some(product) => {
                self.analytics
                    .record(EngagementEvent::product_selected(user_id, &product));
                Step::new(
                    FlowDecision::HandleSelection {
                        text: responses::selection_ack(&product),
                        product_id: product,
                    },
                    ConversationState::Selecting,
                )
            }
            // Out-of-range ordinal or nothing on the table: ask instead
            // of guessing.
            None => Step::new(
                FlowDecision::AskClarifyingQuestion {
                    text: responses::WHICH_ONE.to_string(),
                },
                session.state,
            ),
        }
    }

    fn handle_link_request(
        &self,
        user_id: &str,
        message: &str,
        session: &ConversationSession,
        signal: &ContextSignal,
    ) -> Step {
        let named = self
            .scorer
            .synergy()
            .extract_entities(message)
            .into_iter()
            .next();
        let product = named
            .or_else(|| signal.referenced_product.clone())
            .or_else(|| session.last_offered.first().cloned());

        let Some(product) = product else {
            return Step::new(
                FlowDecision::AskClarifyingQuestion {
                    text: responses::WHICH_ONE.to_string(),
                },
                ConversationState::Clarifying,
            );
        };

        self.analytics.record(EngagementEvent::link_requested(
            user_id,
            &product,
            signal.purchase_intent_score,
        ));

        let offer_consultation =
            signal.purchase_intent_score > self.config.purchase_intent_threshold;
        let mut text = responses::link_text(&product);
        if offer_consultation {
            self.analytics.record(EngagementEvent::consultation_offered(
                user_id,
                signal.purchase_intent_score,
            ));
            text.push(' ');
            text.push_str(&responses::consultation_offer());
        }

        let mut step = Step::new(
            FlowDecision::HandleLinkRequest {
                text,
                product_id: product,
            },
            ConversationState::Selecting,
        );
        step.offer_consultation = offer_consultation;
        step
    }

    /// After a selection, a social acknowledgement gets a complementary
    /// product suggestion instead of plain smalltalk.
    async fn follow_up_after_selection(&self, session: &ConversationSession) -> Step {
        let complement = session
            .last_mentioned()
            .and_then(|product| {
                self.scorer
                    .synergy()
                    .complements(product)
                    .first()
                    .map(|c| (product.to_string(), c.clone()))
            });

        match complement {
            Some((product, complement)) => {
                let mut step = Step::new(
                    FlowDecision::OfferFollowUp {
                        text: responses::follow_up(&complement, &product),
                        product_id: complement.clone(),
                    },
                    ConversationState::Engaged,
                );
                step.offered = Some(vec![complement]);
                step
            }
            None => {
                let text = self
                    .phrase(
                        responses::SMALLTALK_PROMPT,
                        session,
                        responses::SMALLTALK_FALLBACK.to_string(),
                    )
                    .await;
                Step::new(
                    FlowDecision::AnswerDirectly {
                        text,
                        candidates: vec![],
                    },
                    ConversationState::Engaged,
                )
            }
        }
    }

    /// Append both turns and write back the updated session state, under
    /// the session entry lock.
    fn commit(&self, user_id: &str, message: &str, signal: &ContextSignal, step: &Step) {
        let mut user_entities = self.scorer.synergy().extract_entities(message);
        if let FlowDecision::HandleSelection { product_id, .. } = &step.decision {
            if !user_entities.contains(product_id) {
                user_entities.push(product_id.clone());
            }
        }
        self.store.append(user_id, Turn::user(message, user_entities));

        let assistant_entities = match &step.decision {
            FlowDecision::AnswerDirectly { candidates, .. } => {
                candidates.iter().map(|c| c.product_id.clone()).collect()
            }
            FlowDecision::OfferFollowUp { product_id, .. }
            | FlowDecision::HandleSelection { product_id, .. }
            | FlowDecision::HandleLinkRequest { product_id, .. } => vec![product_id.clone()],
            FlowDecision::AskClarifyingQuestion { .. } => vec![],
        };
        self.store.append(
            user_id,
            Turn::assistant(step.decision.text(), assistant_entities),
        );

        self.store.with_session(user_id, |s| {
            s.state = step.next_state;
            s.purchase_intent = signal.purchase_intent_score;
            for topic in &signal.topics {
                s.health_focus.insert(topic.clone());
            }
            if let Some(offered) = &step.offered {
                s.last_offered = offered.clone();
            }
        });
    }

    async fn search_with_timeout(
        &self,
        query: &str,
        intent: Intent,
    ) -> Result<Vec<Candidate>, SearchError> {
        let budget = Duration::from_millis(self.config.search_timeout_ms);
        match tokio::time::timeout(budget, self.search.search(query, intent)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(self.config.search_timeout_ms)),
        }
    }

    /// Phrase text through the LLM with a bounded timeout; any failure
    /// falls back to the canned template.
    async fn phrase(&self, prompt: &str, session: &ConversationSession, fallback: String) -> String {
        let budget = Duration::from_millis(self.config.llm_timeout_ms);
        let context = responses::history_digest(session);
        match tokio::time::timeout(budget, self.llm.generate(prompt, &context)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => fallback,
            Ok(Err(err)) => {
                warn!(error = %err, "language model failed, using canned reply");
                fallback
            }
            Err(_) => {
                warn!("language model timed out, using canned reply");
                fallback
            }
        }
    }

    /// Offline candidate pool: recently discussed products first, then the
    /// local catalog.
    fn fallback_pool(&self, session: &ConversationSession) -> Vec<Candidate> {
        let mut pool: Vec<Candidate> = session
            .entity_set()
            .into_iter()
            .map(|e| Candidate::new(e, FALLBACK_DISCUSSED_RELEVANCE))
            .collect();
        for id in self
            .scorer
            .synergy()
            .fallback_candidates(self.config.scoring.max_candidates)
        {
            if !pool.iter().any(|c| c.product_id == id) {
                pool.push(Candidate::new(id, FALLBACK_CATALOG_RELEVANCE));
            }
        }
        pool
    }

    fn too_vague(&self, message: &str) -> bool {
        let words = message.split_whitespace().count();
        words < self.config.specificity_threshold || matcher::is_ambiguous(message)
    }

    fn session_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.session_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry once no handler holds a clone of it, so the
    /// table tracks in-flight users rather than every user ever seen.
    ///
    /// `remove_if` runs its check under the shard write lock, so a
    /// concurrent `session_lock` cannot clone an entry that is being
    /// removed.
    fn release_session_lock(&self, user_id: &str) {
        self.session_locks
            .remove_if(user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn accumulated_query(session: &ConversationSession, message: &str) -> String {
    match session.last_user_text() {
        Some(previous) => format!("{previous} {message}"),
        None => message.to_string(),
    }
}
