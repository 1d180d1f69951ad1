use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Weather,
    LocalTime,
    PlaceSummary,
}

impl ProviderKind {
    pub fn as_name(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::LocalTime => "local_time",
            Self::PlaceSummary => "place_summary",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "weather" | "weather_tool" => Some(Self::Weather),
            "local_time" | "time" | "time_tool" => Some(Self::LocalTime),
            "place_summary" | "city_facts" | "facts" | "city_facts_tool" => {
                Some(Self::PlaceSummary)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderKind {
    PlaceSummary,
    TripDiscussion,
}

impl ResponderKind {
    pub fn as_name(self) -> &'static str {
        match self {
            Self::PlaceSummary => "place_summary",
            Self::TripDiscussion => "trip_discussion",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "place_summary" | "place summary" | "city_summary" => Some(Self::PlaceSummary),
            "trip_discussion" | "trip discussion" | "trip" => Some(Self::TripDiscussion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponderProfile {
    pub kind: ResponderKind,
    pub name: &'static str,
    pub instructions: String,
    pub allowed_providers: Vec<ProviderKind>,
}

impl ResponderProfile {
    pub fn allows(&self, provider: ProviderKind) -> bool {
        self.allowed_providers.contains(&provider)
    }
}

/// The full responder set, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ResponderRegistry {
    place_summary: ResponderProfile,
    trip_discussion: ResponderProfile,
}

impl ResponderRegistry {
    pub fn standard() -> Self {
        Self {
            place_summary: ResponderProfile {
                kind: ResponderKind::PlaceSummary,
                name: "place summary responder",
                instructions: PLACE_SUMMARY_INSTRUCTIONS.to_string(),
                allowed_providers: vec![
                    ProviderKind::PlaceSummary,
                    ProviderKind::Weather,
                    ProviderKind::LocalTime,
                ],
            },
            trip_discussion: ResponderProfile {
                kind: ResponderKind::TripDiscussion,
                name: "trip discussion responder",
                instructions: TRIP_DISCUSSION_INSTRUCTIONS.to_string(),
                allowed_providers: Vec::new(),
            },
        }
    }

    pub fn profile(&self, kind: ResponderKind) -> &ResponderProfile {
        match kind {
            ResponderKind::PlaceSummary => &self.place_summary,
            ResponderKind::TripDiscussion => &self.trip_discussion,
        }
    }
}

const PLACE_SUMMARY_INSTRUCTIONS: &str = r#"You are a city information assistant.
Fetch information using these tools: place_summary, weather, local_time.
Reply in one line, and always end with a question.
Output format:
{
    "thinking": "Explain reasoning",
    "function_calls": [
        { "tool": "tool name", "parameters": { "place": "..." } }
    ],
    "response": "response in one line, ending with a question"
}
Only answer questions related to your task."#;

const TRIP_DISCUSSION_INSTRUCTIONS: &str = r#"You are a travel planning assistant.
Discuss ideas to plan a trip.
Be very brief, less than 100 words.
Output format:
{
    "thinking": "Explain reasoning",
    "function_calls": [],
    "response": "response here"
}
If no tools are used function_calls is [].
Only answer questions related to your task."#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub parameters: Map<String, Value>,
}

/// The structured outcome of one turn. `response` is always non-empty;
/// `invocations` preserves actual call order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub reasoning: String,
    pub invocations: Vec<ToolInvocation>,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub responder: ResponderKind,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub at: DateTime<Utc>,
    pub responder: String,
    pub user_text: String,
    pub assistant_text: String,
    pub invocations: Vec<ToolInvocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoCoordinate {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn resolved(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
