use crate::models::{ResponderKind, RouteDecision};

/// Keyword rules for selecting a responder. The dispatcher never answers a
/// message itself, so an ambiguous message still resolves to one responder:
/// trip-planning vocabulary wins, everything else reads as a place subject.
pub fn classify_message(text: &str) -> RouteDecision {
    let lower = text.to_lowercase();

    if contains_any(
        &lower,
        &[
            "plan",
            "trip",
            "travel",
            "itinerary",
            "advice",
            "recommend",
            "suggest",
            "should i",
            "should we",
            "ideas",
            "evening",
            "tonight",
            "weekend",
            "activity",
            "activities",
            "things to do",
        ],
    ) {
        return RouteDecision {
            responder: ResponderKind::TripDiscussion,
            rationale: "message asks for trip planning, advice or discussion".to_string(),
        };
    }

    RouteDecision {
        responder: ResponderKind::PlaceSummary,
        rationale: "message is primarily about a place".to_string(),
    }
}

/// Best-effort place extraction for the rule-composed responder: strip
/// common lead-in phrases and trailing punctuation, keep the rest.
pub fn extract_place(message: &str) -> String {
    let trimmed = message.trim().trim_end_matches(['?', '!', '.']).trim();
    let lower = trimmed.to_lowercase();

    for lead_in in [
        "tell me about",
        "what do you know about",
        "what about",
        "what is",
        "what's",
        "where is",
        "facts about",
        "info on",
        "information on",
        "summary of",
    ] {
        if lower.starts_with(lead_in) {
            let rest = trimmed[lead_in.len()..].trim();
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }

    trimmed.to_string()
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
