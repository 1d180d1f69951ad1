use std::sync::Arc;

use scout_agents::{
    Dispatcher, KeywordRouter, PolicyReply, ResponderPolicy, RulePolicy, ToolBelt, TurnExecutor,
    TurnRouter,
};
use scout_core::{ChatInput, ProviderKind, ResponderProfile, ResponderRegistry, TurnError};
use scout_observability::AppMetrics;
use scout_providers::ProviderSet;
use scout_storage::{SessionRepository, Store};

/// Providers that answer instantly with recognizable text.
struct StubProviders;

impl ProviderSet for StubProviders {
    async fn lookup(&self, kind: ProviderKind, place: &str) -> String {
        format!("{} for {place}", kind.as_name())
    }
}

/// Providers that behave like real ones whose downstream calls all failed.
struct DegradedProviders;

impl ProviderSet for DegradedProviders {
    async fn lookup(&self, kind: ProviderKind, _place: &str) -> String {
        match kind {
            ProviderKind::Weather => "Weather information is currently unavailable.".to_string(),
            ProviderKind::LocalTime => "Time information is currently unavailable.".to_string(),
            ProviderKind::PlaceSummary => "City facts are currently unavailable.".to_string(),
        }
    }
}

/// A responder that performs a fixed sequence of lookups.
struct ScriptedPolicy {
    calls: Vec<ProviderKind>,
    response: Option<String>,
}

impl ResponderPolicy for ScriptedPolicy {
    async fn respond<T: ProviderSet>(
        &self,
        _profile: &ResponderProfile,
        message: &str,
        tools: &ToolBelt<'_, T>,
    ) -> Result<PolicyReply, TurnError> {
        let mut gathered = Vec::new();
        for kind in &self.calls {
            gathered.push(tools.lookup(*kind, message).await);
        }

        Ok(PolicyReply {
            reasoning: "scripted reasoning".to_string(),
            response: self.response.clone().unwrap_or_else(|| gathered.join(" ")),
        })
    }
}

fn executor<P, T>(policy: P, providers: T, store: Arc<Store>) -> TurnExecutor<P, T, Store>
where
    P: ResponderPolicy,
    T: ProviderSet,
{
    TurnExecutor::new(
        Dispatcher::new(
            Arc::new(ResponderRegistry::standard()),
            TurnRouter::Keyword(KeywordRouter),
        ),
        policy,
        Arc::new(providers),
        store,
        AppMetrics::shared(),
    )
}

fn input(session_id: Option<&str>, message: &str) -> ChatInput {
    ChatInput {
        session_id: session_id.map(ToString::to_string),
        message: message.to_string(),
    }
}

#[tokio::test]
async fn invocation_order_matches_call_order() {
    let executor = executor(
        ScriptedPolicy {
            calls: vec![ProviderKind::Weather, ProviderKind::PlaceSummary],
            response: None,
        },
        StubProviders,
        Arc::new(Store::memory()),
    );

    let outcome = executor.handle_turn(input(None, "Tokyo")).await.unwrap();

    let tools: Vec<&str> = outcome
        .result
        .invocations
        .iter()
        .map(|invocation| invocation.tool.as_str())
        .collect();
    assert_eq!(tools, vec!["weather", "place_summary"]);
}

#[tokio::test]
async fn disallowed_lookup_is_refused_and_unrecorded() {
    let executor = executor(
        ScriptedPolicy {
            calls: vec![ProviderKind::Weather],
            response: Some("No lookups were possible here.".to_string()),
        },
        StubProviders,
        Arc::new(Store::memory()),
    );

    // Trip-discussion profile allows no providers.
    let outcome = executor
        .handle_turn(input(None, "plan a weekend trip"))
        .await
        .unwrap();

    assert_eq!(outcome.responder, "trip discussion responder");
    assert!(outcome.result.invocations.is_empty());
    assert!(!outcome.result.response.is_empty());
}

#[tokio::test]
async fn empty_response_fails_as_malformed_output() {
    let executor = executor(
        ScriptedPolicy {
            calls: Vec::new(),
            response: Some("   ".to_string()),
        },
        StubProviders,
        Arc::new(Store::memory()),
    );

    let error = executor.handle_turn(input(None, "Tokyo")).await.unwrap_err();
    assert!(matches!(error, TurnError::MalformedOutput(_)));
}

#[tokio::test]
async fn degraded_providers_still_produce_a_successful_turn() {
    let executor = executor(RulePolicy, DegradedProviders, Arc::new(Store::memory()));

    let outcome = executor.handle_turn(input(None, "Tokyo")).await.unwrap();

    assert_eq!(outcome.result.invocations.len(), 3);
    assert!(outcome
        .result
        .response
        .contains("Weather information is currently unavailable."));
    assert!(outcome.result.response.ends_with('?'));
}

#[tokio::test]
async fn rule_policy_composes_place_reply_from_lookups() {
    let executor = executor(RulePolicy, StubProviders, Arc::new(Store::memory()));

    let outcome = executor
        .handle_turn(input(None, "Tell me about Tokyo?"))
        .await
        .unwrap();

    assert!(outcome.result.response.contains("place_summary for Tokyo"));
    assert!(outcome.result.response.contains("weather for Tokyo"));
    assert!(outcome.result.response.ends_with('?'));
    assert!(!outcome.result.reasoning.is_empty());
}

#[tokio::test]
async fn turns_accumulate_in_the_session_log() {
    let store = Arc::new(Store::memory());
    let executor = executor(RulePolicy, StubProviders, store.clone());

    executor
        .handle_turn(input(Some("s-1"), "Tokyo"))
        .await
        .unwrap();
    executor
        .handle_turn(input(Some("s-1"), "Oslo"))
        .await
        .unwrap();

    let session = store.load_session("s-1").await.unwrap().unwrap();
    assert_eq!(session.turns.len(), 2);
    assert_eq!(session.turns[0].user_text, "Tokyo");
    assert_eq!(session.turns[1].user_text, "Oslo");
    assert_eq!(session.turns[0].responder, "place summary responder");
}

#[tokio::test]
async fn missing_session_id_mints_a_fresh_one() {
    let executor = executor(RulePolicy, StubProviders, Arc::new(Store::memory()));

    let outcome = executor.handle_turn(input(None, "Tokyo")).await.unwrap();
    assert!(!outcome.session_id.is_empty());
}
