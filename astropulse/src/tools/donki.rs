//! NASA DONKI and NOAA SWPC fetchers with caching and fallback data.
//!
//! Both fetch paths are infallible by design: when the upstream APIs are
//! unreachable or return garbage, the client degrades to canned fallback
//! records so downstream heuristics and the reasoning loop always have
//! something to work with. The fallback is marked in the payload.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::ToolError;

/// Default NASA DONKI base URL.
pub const DONKI_BASE_URL: &str = "https://api.nasa.gov/DONKI";

const KP_PRIMARY_URL: &str = "https://services.swpc.noaa.gov/json/planetary_k_index_1d.json";
const KP_BACKUP_URL: &str = "https://services.swpc.noaa.gov/json/planetary_k_index_1m.json";

/// Options for the space-weather fetch client.
#[derive(Debug, Clone)]
pub struct DonkiConfig {
    /// NASA API key; the public `DEMO_KEY` works at low rate limits.
    pub api_key: String,
    /// DONKI base URL.
    pub base_url: String,
    /// Kp-index feed URLs, tried in order.
    pub kp_urls: Vec<String>,
    /// Whether flare responses are cached per date range.
    pub cache_enabled: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for DonkiConfig {
    fn default() -> Self {
        Self {
            api_key: "DEMO_KEY".to_string(),
            base_url: DONKI_BASE_URL.to_string(),
            kp_urls: vec![KP_PRIMARY_URL.to_string(), KP_BACKUP_URL.to_string()],
            cache_enabled: true,
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl DonkiConfig {
    /// Builds the fetch configuration from `NASA_API_KEY` and `ENABLE_CACHE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = env::var("NASA_API_KEY") {
            config.api_key = key;
        }
        if let Ok(raw) = env::var("ENABLE_CACHE") {
            config.cache_enabled = raw.to_lowercase() == "true";
        }
        config
    }
}

/// HTTP client over the DONKI flare feed and the SWPC Kp feeds.
#[derive(Debug)]
pub struct DonkiClient {
    http: reqwest::Client,
    config: DonkiConfig,
    cache: RwLock<HashMap<String, Value>>,
}

impl DonkiClient {
    /// Creates a client with the given options.
    pub fn new(config: DonkiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches solar flares from the last `days_back` days (clamped to
    /// 1..=30). Never fails: upstream errors degrade to a single canned
    /// fallback record, as the live dashboards expect some data to render.
    pub async fn fetch_solar_flares(&self, days_back: i64) -> Value {
        let days_back = days_back.clamp(1, 30);
        let end = Utc::now();
        let start = end - chrono::Duration::days(days_back);
        let start_str = start.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();
        let cache_key = format!("flares_{start_str}_{end_str}");

        if self.config.cache_enabled {
            if let Some(cached) = self.cache.read().await.get(&cache_key) {
                info!("using cached flare data {start_str} -> {end_str}");
                return cached.clone();
            }
        }

        match self.request_flares(&start_str, &end_str).await {
            Ok(flares) => {
                info!(
                    count = flares.as_array().map(Vec::len).unwrap_or(0),
                    "retrieved flares from DONKI"
                );
                if self.config.cache_enabled {
                    self.cache
                        .write()
                        .await
                        .insert(cache_key, flares.clone());
                }
                flares
            }
            Err(e) => {
                warn!(error = %e, "DONKI fetch failed, using fallback flare record");
                json!([{
                    "flareID": "FALLBACK",
                    "classType": "M2.1",
                    "peakTime": Utc::now().to_rfc3339(),
                    "sourceLocation": "N10W15",
                    "note": "Fallback data used."
                }])
            }
        }
    }

    async fn request_flares(&self, start: &str, end: &str) -> Result<Value, ToolError> {
        let url = format!("{}/FLR", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.request_timeout)
            .query(&[
                ("startDate", start),
                ("endDate", end),
                ("api_key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| ToolError::Upstream(e.to_string()))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;
        let records = data
            .as_array()
            .ok_or_else(|| ToolError::Upstream("DONKI returned a non-array body".to_string()))?;

        let flares: Vec<Value> = records
            .iter()
            .map(|f| {
                json!({
                    "flareID": str_field(f, "flrID", "Unknown"),
                    "beginTime": str_field(f, "beginTime", ""),
                    "peakTime": str_field(f, "peakTime", ""),
                    "classType": str_field(f, "classType", "Unknown"),
                    "sourceLocation": str_field(f, "sourceLocation", "Unknown"),
                    "activeRegionNum": f.get("activeRegionNum").and_then(Value::as_i64).unwrap_or(0),
                })
            })
            .collect();
        Ok(Value::Array(flares))
    }

    /// Fetches the most recent planetary Kp index. Tries each configured
    /// feed in order; when all fail, returns the static fallback reading so
    /// vulnerability assessments stay possible offline.
    pub async fn fetch_kp_index(&self, days_back: i64) -> Value {
        let _ = days_back; // the SWPC feeds are fixed-window; kept for API symmetry

        let mut last_error = String::from("no Kp feed configured");
        for url in &self.config.kp_urls {
            match self.request_kp(url).await {
                Ok(Some(latest)) => {
                    let kp_value = kp_from_row(&latest);
                    info!(kp = kp_value, "using Kp reading from SWPC");
                    return json!({
                        "kp_index": kp_value,
                        "source": "NOAA SWPC",
                        "timestamp": str_field(&latest, "time_tag", &Utc::now().to_rfc3339()),
                    });
                }
                Ok(None) => {
                    last_error = format!("{url} returned an empty dataset");
                    warn!("{last_error}");
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(error = %last_error, %url, "Kp feed failed");
                }
            }
        }

        warn!(error = %last_error, "live Kp fetch failed, returning static data");
        let static_rows = json!([
            {"time_tag": "2025-11-04T18:00:00Z", "kp": 7.00, "observed": "true"},
            {"time_tag": "2025-11-04T21:00:00Z", "kp": 7.33, "observed": "true"},
            {"time_tag": "2025-11-05T00:00:00Z", "kp": 6.67, "observed": "true"},
        ]);
        let latest = static_rows
            .as_array()
            .and_then(|rows| rows.last())
            .cloned()
            .unwrap_or(Value::Null);
        let kp_value = kp_from_row(&latest);
        json!({
            "kp_index": kp_value,
            "source": "STATIC FALLBACK",
            "timestamp": str_field(&latest, "time_tag", "2025-11-05T00:00:00Z"),
            "error_details": last_error,
            "note": format!("Defaulted to static Kp={kp_value} due to live data fetch error."),
        })
    }

    async fn request_kp(&self, url: &str) -> Result<Option<Value>, ToolError> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ToolError::Upstream(format!(
                "{url} answered {}",
                response.status()
            )));
        }
        let rows: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;
        Ok(rows.as_array().and_then(|rows| rows.last()).cloned())
    }
}

fn str_field(record: &Value, key: &str, default: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Reads a Kp value from a feed row; the feeds disagree on field name and
/// sometimes encode numbers as strings.
fn kp_from_row(row: &Value) -> f64 {
    for key in ["kp_index", "kp"] {
        if let Some(field) = row.get(key) {
            if let Some(n) = field.as_f64() {
                return n;
            }
            if let Some(parsed) = field.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
                return parsed;
            }
        }
    }
    5.0
}
