use reqwest::Client;
use scout_core::GeoCoordinate;
use serde::Deserialize;
use tracing::warn;

use crate::ProviderConfig;

/// Resolves a place name to coordinates. Every failure mode (network,
/// non-2xx, unparseable payload, empty result array) yields an unresolved
/// coordinate; callers treat that as "not found", never as fatal.
#[derive(Clone)]
pub struct GeoResolver {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GeoHit {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl GeoResolver {
    pub fn new(http: Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            api_key: config.openweather_api_key.clone(),
            base_url: config.geocoding_url.clone(),
        }
    }

    pub async fn resolve(&self, place: &str) -> GeoCoordinate {
        let request = self
            .http
            .get(&self.base_url)
            .query(&[("q", place), ("limit", "1"), ("appid", self.api_key.as_str())]);

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<GeoHit>>().await {
                    Ok(hits) => coordinate_from_hits(&hits),
                    Err(error) => {
                        warn!(%place, %error, "geocoding payload could not be parsed");
                        GeoCoordinate::not_found()
                    }
                }
            }
            Ok(response) => {
                warn!(%place, status = %response.status(), "geocoding request rejected");
                GeoCoordinate::not_found()
            }
            Err(error) => {
                warn!(%place, %error, "geocoding request failed");
                GeoCoordinate::not_found()
            }
        }
    }
}

pub fn coordinate_from_hits(hits: &[GeoHit]) -> GeoCoordinate {
    match hits.first() {
        Some(hit) => GeoCoordinate {
            latitude: hit.lat,
            longitude: hit.lon,
        },
        None => GeoCoordinate::not_found(),
    }
}
