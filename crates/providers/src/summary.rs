use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::ProviderConfig;

pub const FACTS_UNAVAILABLE: &str = "City facts are currently unavailable.";

/// One-sentence encyclopedia fact about a place. No geocoding involved.
#[derive(Clone)]
pub struct PlaceSummaryProvider {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    extract: Option<String>,
}

impl PlaceSummaryProvider {
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: config.summary_url.clone(),
        }
    }

    pub async fn lookup(&self, place: &str) -> String {
        let title = place.trim().replace(' ', "_");
        let url = format!("{}/{title}", self.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<SummaryPayload>().await {
                    Ok(payload) => match payload.extract.as_deref().filter(|e| !e.is_empty()) {
                        Some(extract) => {
                            info!(%place, "place summary lookup succeeded");
                            first_sentence(extract)
                        }
                        None => {
                            warn!(%place, "no extract in summary payload");
                            format!("No facts found for {place}.")
                        }
                    },
                    Err(error) => {
                        warn!(%place, %error, "summary payload could not be parsed");
                        FACTS_UNAVAILABLE.to_string()
                    }
                }
            }
            Ok(response) => {
                warn!(%place, status = %response.status(), "summary request rejected");
                FACTS_UNAVAILABLE.to_string()
            }
            Err(error) => {
                warn!(%place, %error, "summary request failed");
                FACTS_UNAVAILABLE.to_string()
            }
        }
    }
}

/// First sentence of an extract: split on the literal period, re-append it.
pub fn first_sentence(extract: &str) -> String {
    match extract.split('.').next() {
        Some(sentence) => format!("{sentence}."),
        None => extract.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_first_sentence() {
        assert_eq!(
            first_sentence("Tokyo is the capital of Japan. It has many districts."),
            "Tokyo is the capital of Japan."
        );
    }

    #[test]
    fn single_sentence_extract_is_unchanged() {
        assert_eq!(
            first_sentence("Oslo is the capital of Norway."),
            "Oslo is the capital of Norway."
        );
    }
}
