use parking_lot::Mutex;
use scout_core::{ProviderKind, ResponderProfile, ToolInvocation};
use scout_providers::ProviderSet;
use serde_json::{Map, Value};
use tracing::warn;

/// The lookup surface handed to a responder policy for one turn. Records
/// every executed lookup in call order and refuses providers outside the
/// profile's allowed set; a refused lookup is never recorded.
pub struct ToolBelt<'a, T: ProviderSet> {
    providers: &'a T,
    profile: &'a ResponderProfile,
    issued: Mutex<Vec<ToolInvocation>>,
}

impl<'a, T: ProviderSet> ToolBelt<'a, T> {
    pub fn new(providers: &'a T, profile: &'a ResponderProfile) -> Self {
        Self {
            providers,
            profile,
            issued: Mutex::new(Vec::new()),
        }
    }

    pub async fn lookup(&self, kind: ProviderKind, place: &str) -> String {
        if !self.profile.allows(kind) {
            warn!(
                responder = self.profile.name,
                tool = kind.as_name(),
                "lookup refused, provider not in the responder's allowed set"
            );
            return format!(
                "The {} lookup is not available to the {}.",
                kind.as_name(),
                self.profile.name
            );
        }

        let text = self.providers.lookup(kind, place).await;

        let mut parameters = Map::new();
        parameters.insert("place".to_string(), Value::String(place.to_string()));
        self.issued.lock().push(ToolInvocation {
            tool: kind.as_name().to_string(),
            parameters,
        });

        text
    }

    pub fn into_invocations(self) -> Vec<ToolInvocation> {
        self.issued.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::{ResponderKind, ResponderRegistry};

    struct EchoProviders;

    impl ProviderSet for EchoProviders {
        async fn lookup(&self, kind: ProviderKind, place: &str) -> String {
            format!("{} for {place}", kind.as_name())
        }
    }

    #[tokio::test]
    async fn records_lookups_in_call_order() {
        let registry = ResponderRegistry::standard();
        let profile = registry.profile(ResponderKind::PlaceSummary);
        let belt = ToolBelt::new(&EchoProviders, profile);

        belt.lookup(ProviderKind::Weather, "Tokyo").await;
        belt.lookup(ProviderKind::PlaceSummary, "Tokyo").await;

        let invocations = belt.into_invocations();
        let tools: Vec<&str> = invocations.iter().map(|i| i.tool.as_str()).collect();
        assert_eq!(tools, vec!["weather", "place_summary"]);
        assert_eq!(
            invocations[0].parameters.get("place").and_then(|v| v.as_str()),
            Some("Tokyo")
        );
    }

    #[tokio::test]
    async fn refuses_and_skips_disallowed_provider() {
        let registry = ResponderRegistry::standard();
        let profile = registry.profile(ResponderKind::TripDiscussion);
        let belt = ToolBelt::new(&EchoProviders, profile);

        let text = belt.lookup(ProviderKind::Weather, "Tokyo").await;
        assert!(text.contains("not available"));
        assert!(belt.into_invocations().is_empty());
    }
}
