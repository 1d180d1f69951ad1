use chrono::{DateTime, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::geo::GeoResolver;
use crate::{coordinates_not_found, ProviderConfig};

pub const TIME_UNAVAILABLE: &str = "Time information is currently unavailable.";

/// Local wall-clock time for a place via a timezone-by-position lookup.
#[derive(Clone)]
pub struct LocalTimeProvider {
    http: Client,
    geo: GeoResolver,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TimezonePayload {
    formatted: Option<String>,
}

impl LocalTimeProvider {
    pub fn new(http: Client, geo: GeoResolver, config: &ProviderConfig) -> Self {
        Self {
            http,
            geo,
            api_key: config.timezonedb_api_key.clone(),
            base_url: config.timezone_url.clone(),
        }
    }

    pub async fn lookup(&self, place: &str) -> String {
        let Some((lat, lon)) = self.geo.resolve(place).await.resolved() else {
            warn!(%place, "time lookup skipped, coordinates not found");
            return coordinates_not_found(place);
        };

        let request = self.http.get(&self.base_url).query(&[
            ("key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("by", "position".to_string()),
            ("lat", lat.to_string()),
            ("lng", lon.to_string()),
        ]);

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<TimezonePayload>().await {
                    Ok(payload) => {
                        let time = payload.formatted.as_deref().and_then(local_hhmm);
                        match time {
                            Some(hhmm) => {
                                info!(%place, %hhmm, "time lookup succeeded");
                                format!("The local time in {place} is {hhmm}.")
                            }
                            None => {
                                warn!(%place, "time missing from timezone payload");
                                TIME_UNAVAILABLE.to_string()
                            }
                        }
                    }
                    Err(error) => {
                        warn!(%place, %error, "timezone payload could not be parsed");
                        TIME_UNAVAILABLE.to_string()
                    }
                }
            }
            Ok(response) => {
                warn!(%place, status = %response.status(), "timezone request rejected");
                TIME_UNAVAILABLE.to_string()
            }
            Err(error) => {
                warn!(%place, %error, "timezone request failed");
                TIME_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Extract `HH:MM` from a formatted local datetime, dropping seconds and
/// zone. The timezone service reports `YYYY-MM-DD HH:MM:SS`; RFC 3339 is
/// accepted too.
pub fn local_hhmm(formatted: &str) -> Option<String> {
    let trimmed = formatted.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.format("%H:%M").to_string());
    }

    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(datetime.format("%H:%M").to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_hhmm_from_service_format() {
        assert_eq!(local_hhmm("2024-01-01 13:45:00").as_deref(), Some("13:45"));
    }

    #[test]
    fn extracts_hhmm_from_rfc3339() {
        assert_eq!(
            local_hhmm("2024-01-01T13:45:00+09:00").as_deref(),
            Some("13:45")
        );
    }

    #[test]
    fn short_or_garbled_timestamps_are_rejected() {
        assert_eq!(local_hhmm("13:45"), None);
        assert_eq!(local_hhmm(""), None);
        assert_eq!(local_hhmm("not a timestamp"), None);
    }
}
