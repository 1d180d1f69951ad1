use scout_core::{
    extract_place, parse_responder_output, ProviderKind, ResponderKind, ResponderProfile,
    TurnError,
};
use scout_providers::ProviderSet;
use tracing::warn;

use crate::model::ModelClient;
use crate::toolbelt::ToolBelt;

/// What a responder produced for one turn, before the executor assembles the
/// final structured result. The invocation list lives in the ToolBelt.
#[derive(Debug, Clone)]
pub struct PolicyReply {
    pub reasoning: String,
    pub response: String,
}

/// The responder's opaque decision process: given the profile, the message
/// and a lookup surface, produce reasoning and response text, invoking
/// lookups as it sees fit.
pub trait ResponderPolicy: Send + Sync {
    async fn respond<T: ProviderSet>(
        &self,
        profile: &ResponderProfile,
        message: &str,
        tools: &ToolBelt<'_, T>,
    ) -> Result<PolicyReply, TurnError>;
}

/// Deterministic offline composition, used when no model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulePolicy;

impl ResponderPolicy for RulePolicy {
    async fn respond<T: ProviderSet>(
        &self,
        profile: &ResponderProfile,
        message: &str,
        tools: &ToolBelt<'_, T>,
    ) -> Result<PolicyReply, TurnError> {
        match profile.kind {
            ResponderKind::PlaceSummary => {
                let place = extract_place(message);
                let facts = tools.lookup(ProviderKind::PlaceSummary, &place).await;
                let weather = tools.lookup(ProviderKind::Weather, &place).await;
                let time = tools.lookup(ProviderKind::LocalTime, &place).await;

                Ok(PolicyReply {
                    reasoning: format!(
                        "The message is about {place}; gathered facts, weather and local time before answering."
                    ),
                    response: format!(
                        "{facts} {weather} {time} Would you like to know more about {place}?"
                    ),
                })
            }
            ResponderKind::TripDiscussion => Ok(PolicyReply {
                reasoning: "The message asks for trip planning discussion; no lookups are needed."
                    .to_string(),
                response: "Start with the one or two places you care about most, block rough days \
                           for each, and keep an evening free for something spontaneous. Fix your \
                           budget and travel style early, then book the long-distance legs first \
                           and fill in the rest as you go. What kind of trip are you leaning \
                           towards?"
                    .to_string(),
            }),
        }
    }
}

/// Model-backed responder: one completion plans the turn (three-field JSON),
/// the declared calls run in listed order, and when lookups ran a follow-up
/// completion composes the final response from their results.
#[derive(Clone)]
pub struct ModelPolicy {
    client: ModelClient,
}

impl ModelPolicy {
    pub fn new(client: ModelClient) -> Self {
        Self { client }
    }
}

impl ResponderPolicy for ModelPolicy {
    async fn respond<T: ProviderSet>(
        &self,
        profile: &ResponderProfile,
        message: &str,
        tools: &ToolBelt<'_, T>,
    ) -> Result<PolicyReply, TurnError> {
        let raw = self
            .client
            .complete(&profile.instructions, message)
            .await
            .map_err(TurnError::Unhandled)?;
        let plan = parse_responder_output(&raw)?;

        let mut results = Vec::new();
        for call in &plan.function_calls {
            let Some(kind) = ProviderKind::parse(&call.tool) else {
                warn!(tool = %call.tool, "responder requested an unknown tool, skipping");
                continue;
            };

            let place = call.place().unwrap_or(message);
            let text = tools.lookup(kind, place).await;
            results.push(format!("{}: {text}", kind.as_name()));
        }

        if results.is_empty() {
            return Ok(PolicyReply {
                reasoning: plan.thinking,
                response: plan.response,
            });
        }

        let follow_up = format!(
            "{message}\n\nTool results:\n{}\n\nUsing these results, produce the final output \
             JSON with an empty function_calls list.",
            results.join("\n")
        );
        let raw = self
            .client
            .complete(&profile.instructions, &follow_up)
            .await
            .map_err(TurnError::Unhandled)?;
        let composed = parse_responder_output(&raw)?;

        Ok(PolicyReply {
            reasoning: plan.thinking,
            response: composed.response,
        })
    }
}

#[derive(Clone)]
pub enum Planner {
    Rules(RulePolicy),
    Model(ModelPolicy),
}

impl ResponderPolicy for Planner {
    async fn respond<T: ProviderSet>(
        &self,
        profile: &ResponderProfile,
        message: &str,
        tools: &ToolBelt<'_, T>,
    ) -> Result<PolicyReply, TurnError> {
        match self {
            Self::Rules(policy) => policy.respond(profile, message, tools).await,
            Self::Model(policy) => policy.respond(profile, message, tools).await,
        }
    }
}
