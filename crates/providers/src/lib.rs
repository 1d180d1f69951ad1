pub mod geo;
pub mod localtime;
pub mod summary;
pub mod weather;

use std::env;

use reqwest::Client;
use scout_core::ProviderKind;

pub use geo::GeoResolver;
pub use localtime::LocalTimeProvider;
pub use summary::PlaceSummaryProvider;
pub use weather::WeatherProvider;

/// Endpoint and credential configuration for all outbound lookups. Base URLs
/// are overridable so tests can point them at a closed port.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openweather_api_key: String,
    pub timezonedb_api_key: String,
    pub geocoding_url: String,
    pub weather_url: String,
    pub timezone_url: String,
    pub summary_url: String,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self {
            openweather_api_key: env::var("OPENWEATHER_API_KEY").unwrap_or_default(),
            timezonedb_api_key: env::var("TIMEZONEDB_API_KEY").unwrap_or_default(),
            geocoding_url: env::var("SCOUT_GEOCODING_URL")
                .unwrap_or_else(|_| "http://api.openweathermap.org/geo/1.0/direct".to_string()),
            weather_url: env::var("SCOUT_WEATHER_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5/weather".to_string()),
            timezone_url: env::var("SCOUT_TIMEZONE_URL")
                .unwrap_or_else(|_| "http://api.timezonedb.com/v2.1/get-time-zone".to_string()),
            summary_url: env::var("SCOUT_SUMMARY_URL")
                .unwrap_or_else(|_| "https://en.wikipedia.org/api/rest_v1/page/summary".to_string()),
        }
    }
}

/// Execution seam for information lookups. Every lookup returns a sentence:
/// failures are absorbed into fixed degraded-service text, never errors.
pub trait ProviderSet: Send + Sync {
    async fn lookup(&self, kind: ProviderKind, place: &str) -> String;
}

#[derive(Clone)]
pub struct ProviderRegistry {
    geo: GeoResolver,
    weather: WeatherProvider,
    local_time: LocalTimeProvider,
    place_summary: PlaceSummaryProvider,
}

impl ProviderRegistry {
    pub fn new(http: Client, config: ProviderConfig) -> Self {
        let geo = GeoResolver::new(http.clone(), &config);

        Self {
            weather: WeatherProvider::new(http.clone(), geo.clone(), &config),
            local_time: LocalTimeProvider::new(http.clone(), geo.clone(), &config),
            place_summary: PlaceSummaryProvider::new(http, &config),
            geo,
        }
    }

    pub fn geo(&self) -> &GeoResolver {
        &self.geo
    }
}

impl ProviderSet for ProviderRegistry {
    async fn lookup(&self, kind: ProviderKind, place: &str) -> String {
        match kind {
            ProviderKind::Weather => self.weather.lookup(place).await,
            ProviderKind::LocalTime => self.local_time.lookup(place).await,
            ProviderKind::PlaceSummary => self.place_summary.lookup(place).await,
        }
    }
}

/// Shared geocoding-miss sentence for the coordinate-dependent providers.
pub fn coordinates_not_found(place: &str) -> String {
    format!("Sorry, I couldn't find the coordinates for {place}.")
}
