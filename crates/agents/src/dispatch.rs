use std::sync::Arc;

use scout_core::{
    classify_message, ResponderKind, ResponderProfile, ResponderRegistry, RouteDecision,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::ModelClient;

const DISPATCH_INSTRUCTIONS: &str = r#"Your only job is to decide which responder should handle the request.
- If the user asks about a city or place, choose "place_summary".
- If the user wants advice, discussion, or planning for a trip, choose "trip_discussion".
- Never answer the question yourself.
Reply with JSON: {"responder": "place_summary" or "trip_discussion", "reason": "one line"}"#;

/// Classification seam: given a message, pick exactly one responder.
pub trait RoutePolicy: Send + Sync {
    async fn classify(&self, message: &str) -> RouteDecision;
}

/// Deterministic keyword classification; the default when no model is
/// configured, and the fallback when model classification fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRouter;

impl RoutePolicy for KeywordRouter {
    async fn classify(&self, message: &str) -> RouteDecision {
        classify_message(message)
    }
}

/// Model-backed classification. Falls back to keyword rules on any failure
/// so a turn always resolves to exactly one responder.
#[derive(Clone)]
pub struct ModelRouter {
    client: ModelClient,
}

#[derive(Debug, Deserialize)]
struct RoutePayload {
    responder: String,
    #[serde(default)]
    reason: String,
}

impl ModelRouter {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }
}

impl RoutePolicy for ModelRouter {
    async fn classify(&self, message: &str) -> RouteDecision {
        match self.client.complete(DISPATCH_INSTRUCTIONS, message).await {
            Ok(raw) => match parse_route(&raw) {
                Some(decision) => decision,
                None => {
                    warn!(model = self.client.model(), "unusable route from model, using keyword rules");
                    classify_message(message)
                }
            },
            Err(error) => {
                warn!(%error, "model routing failed, using keyword rules");
                classify_message(message)
            }
        }
    }
}

fn parse_route(raw: &str) -> Option<RouteDecision> {
    let payload: RoutePayload = serde_json::from_str(raw.trim()).ok()?;
    let responder = ResponderKind::parse(&payload.responder)?;

    Some(RouteDecision {
        responder,
        rationale: if payload.reason.trim().is_empty() {
            "model classification".to_string()
        } else {
            payload.reason
        },
    })
}

#[derive(Clone)]
pub enum TurnRouter {
    Keyword(KeywordRouter),
    Model(ModelRouter),
}

impl RoutePolicy for TurnRouter {
    async fn classify(&self, message: &str) -> RouteDecision {
        match self {
            Self::Keyword(router) => router.classify(message).await,
            Self::Model(router) => router.classify(message).await,
        }
    }
}

/// Resolves each turn to exactly one responder profile and logs the choice.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ResponderRegistry>,
    router: TurnRouter,
}

impl Dispatcher {
    pub fn new(registry: Arc<ResponderRegistry>, router: TurnRouter) -> Self {
        Self { registry, router }
    }

    pub async fn select(&self, message: &str) -> (&ResponderProfile, RouteDecision) {
        let decision = self.router.classify(message).await;
        let profile = self.registry.profile(decision.responder);

        info!(
            responder = profile.name,
            rationale = %decision.rationale,
            "turn dispatched"
        );

        (profile, decision)
    }
}
