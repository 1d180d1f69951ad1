use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::geo::GeoResolver;
use crate::{coordinates_not_found, ProviderConfig};

pub const WEATHER_UNAVAILABLE: &str = "Weather information is currently unavailable.";

/// Current weather for a place: geocode first, then one conditions request.
#[derive(Clone)]
pub struct WeatherProvider {
    http: Client,
    geo: GeoResolver,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherPayload {
    pub main: WeatherMain,
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherMain {
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub struct WeatherCondition {
    pub description: String,
}

impl WeatherProvider {
    pub fn new(http: Client, geo: GeoResolver, config: &ProviderConfig) -> Self {
        Self {
            http,
            geo,
            api_key: config.openweather_api_key.clone(),
            base_url: config.weather_url.clone(),
        }
    }

    pub async fn lookup(&self, place: &str) -> String {
        let Some((lat, lon)) = self.geo.resolve(place).await.resolved() else {
            warn!(%place, "weather lookup skipped, coordinates not found");
            return coordinates_not_found(place);
        };

        let request = self.http.get(&self.base_url).query(&[
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<WeatherPayload>().await {
                    Ok(payload) => match weather_sentence(place, &payload) {
                        Some(sentence) => {
                            info!(%place, "weather lookup succeeded");
                            sentence
                        }
                        None => {
                            warn!(%place, "weather payload had no conditions");
                            WEATHER_UNAVAILABLE.to_string()
                        }
                    },
                    Err(error) => {
                        warn!(%place, %error, "weather payload could not be parsed");
                        WEATHER_UNAVAILABLE.to_string()
                    }
                }
            }
            Ok(response) => {
                warn!(%place, status = %response.status(), "weather request rejected");
                WEATHER_UNAVAILABLE.to_string()
            }
            Err(error) => {
                warn!(%place, %error, "weather request failed");
                WEATHER_UNAVAILABLE.to_string()
            }
        }
    }
}

pub fn weather_sentence(place: &str, payload: &WeatherPayload) -> Option<String> {
    let condition = payload.weather.first()?;

    Some(format!(
        "The weather in {place} is {}°C with {}.",
        payload.main.temp,
        capitalize(&condition.description)
    ))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(temp: f64, description: &str) -> WeatherPayload {
        WeatherPayload {
            main: WeatherMain { temp },
            weather: vec![WeatherCondition {
                description: description.to_string(),
            }],
        }
    }

    #[test]
    fn composes_one_sentence() {
        let sentence = weather_sentence("Tokyo", &payload(21.5, "light rain")).unwrap();
        assert_eq!(sentence, "The weather in Tokyo is 21.5°C with Light rain.");
    }

    #[test]
    fn empty_conditions_yield_nothing() {
        let payload = WeatherPayload {
            main: WeatherMain { temp: 3.0 },
            weather: Vec::new(),
        };

        assert!(weather_sentence("Oslo", &payload).is_none());
    }
}
