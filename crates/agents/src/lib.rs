pub mod dispatch;
pub mod model;
pub mod policy;
pub mod toolbelt;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{Duration, Utc};
use scout_core::{ChatInput, ConversationSession, ConversationTurn, TurnError, TurnResult};
use scout_observability::AppMetrics;
use scout_providers::ProviderSet;
use scout_storage::SessionRepository;
use tracing::info;
use uuid::Uuid;

pub use dispatch::{Dispatcher, KeywordRouter, ModelRouter, RoutePolicy, TurnRouter};
pub use model::{ModelClient, ModelConfig};
pub use policy::{ModelPolicy, Planner, PolicyReply, ResponderPolicy, RulePolicy};
pub use toolbelt::ToolBelt;

const MAX_RETAINED_TURNS: usize = 40;
const SESSION_TTL_HOURS: i64 = 24;

/// A finished turn: the structured result plus the session it belongs to.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: String,
    pub responder: &'static str,
    pub result: TurnResult,
}

/// Runs one turn to completion: dispatch to a responder, let the policy
/// drive lookups through a recording ToolBelt, validate the three-field
/// output contract, append the turn to the session log.
#[derive(Clone)]
pub struct TurnExecutor<P, T, S>
where
    P: ResponderPolicy,
    T: ProviderSet,
    S: SessionRepository,
{
    dispatcher: Dispatcher,
    policy: P,
    providers: Arc<T>,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<P, T, S> TurnExecutor<P, T, S>
where
    P: ResponderPolicy,
    T: ProviderSet,
    S: SessionRepository,
{
    pub fn new(
        dispatcher: Dispatcher,
        policy: P,
        providers: Arc<T>,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            dispatcher,
            policy,
            providers,
            store,
            metrics,
        }
    }

    pub async fn handle_turn(&self, input: ChatInput) -> Result<TurnOutcome, TurnError> {
        let started = Instant::now();
        self.metrics.inc_turn();

        let (profile, decision) = self.dispatcher.select(&input.message).await;
        let belt = ToolBelt::new(self.providers.as_ref(), profile);

        let reply = match self.policy.respond(profile, &input.message, &belt).await {
            Ok(reply) => reply,
            Err(error) => {
                self.metrics.inc_failed_turn();
                return Err(error);
            }
        };

        if reply.response.trim().is_empty() {
            self.metrics.inc_failed_turn();
            return Err(TurnError::malformed("responder produced an empty response"));
        }

        let invocations = belt.into_invocations();
        self.metrics.add_provider_calls(invocations.len());

        let session_id = input
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let result = TurnResult {
            reasoning: reply.reasoning,
            invocations,
            response: reply.response,
        };

        if let Err(error) = self
            .persist_turn(&session_id, profile.name, &input.message, &result)
            .await
        {
            self.metrics.inc_failed_turn();
            return Err(TurnError::Unhandled(error));
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            responder = profile.name,
            rationale = %decision.rationale,
            invocations = result.invocations.len(),
            "turn handled"
        );

        Ok(TurnOutcome {
            session_id,
            responder: profile.name,
            result,
        })
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.store.purge_expired(Utc::now()).await
    }

    async fn persist_turn(
        &self,
        session_id: &str,
        responder: &str,
        user_text: &str,
        result: &TurnResult,
    ) -> Result<()> {
        let mut session = self
            .store
            .load_session(session_id)
            .await?
            .unwrap_or_else(|| ConversationSession {
                session_id: session_id.to_string(),
                expires_at: Utc::now() + Duration::hours(SESSION_TTL_HOURS),
                turns: Vec::new(),
            });

        session.expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        session.turns.push(ConversationTurn {
            at: Utc::now(),
            responder: responder.to_string(),
            user_text: user_text.to_string(),
            assistant_text: result.response.clone(),
            invocations: result.invocations.clone(),
        });

        if session.turns.len() > MAX_RETAINED_TURNS {
            let keep_from = session.turns.len() - MAX_RETAINED_TURNS;
            session.turns = session.turns.split_off(keep_from);
        }

        self.store.upsert_session(&session).await
    }
}
