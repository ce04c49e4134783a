//! The six space-weather tools exposed to the reasoning loop.
//!
//! Argument extraction is deliberately lenient: the normalizer guarantees a
//! mapping-shaped bag, but the model may have put a value under its proper
//! key, under the `value` wrapper, or under a sibling spelling (`classType`
//! for `flare_class`). Each tool pulls what it needs and defaults the rest.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::donki::DonkiClient;
use super::heuristics;
use super::{RegistryError, Tool, ToolError, ToolRegistry};

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn arg_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key)
        .and_then(value_as_i64)
        .or_else(|| args.get("value").and_then(value_as_i64))
}

fn arg_str<'a>(args: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .chain(std::iter::once(&"value"))
        .find_map(|key| args.get(key).and_then(Value::as_str))
}

/// Pulls a flare record list out of an argument bag: a wrapped sequence, a
/// named field, or a JSON-encoded string under `value`.
fn flares_from_args(args: &Value) -> Vec<Value> {
    if let Some(list) = args.as_array() {
        return list.clone();
    }
    for key in ["list", "flares", "flares_json"] {
        if let Some(list) = args.get(key).and_then(Value::as_array) {
            return list.clone();
        }
    }
    if let Some(raw) = args.get("value").and_then(Value::as_str) {
        if let Ok(Value::Array(list)) = serde_json::from_str::<Value>(raw) {
            return list;
        }
    }
    Vec::new()
}

/// Fetches recent flares from NASA DONKI.
pub struct FetchSolarFlaresTool {
    donki: Arc<DonkiClient>,
}

#[async_trait]
impl Tool for FetchSolarFlaresTool {
    fn name(&self) -> &str {
        "FetchNASASolarFlares"
    }

    fn description(&self) -> &str {
        "Fetches recent solar flare data from NASA DONKI."
    }

    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let days_back = arg_i64(args, "days_back").unwrap_or(7);
        Ok(self.donki.fetch_solar_flares(days_back).await)
    }
}

/// Analyzes flare trend and risk level.
pub struct AnalyzeFlareEscalationTool;

#[async_trait]
impl Tool for AnalyzeFlareEscalationTool {
    fn name(&self) -> &str {
        "AnalyzeFlareEscalation"
    }

    fn description(&self) -> &str {
        "Analyzes solar flare trends and risk levels."
    }

    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        Ok(heuristics::analyze_flare_escalation(&flares_from_args(args)))
    }
}

/// Predicts magnetosphere impact from a flare class and source location.
pub struct PredictMagnetosphereImpactTool;

#[async_trait]
impl Tool for PredictMagnetosphereImpactTool {
    fn name(&self) -> &str {
        "PredictMagnetosphereImpact"
    }

    fn description(&self) -> &str {
        "Predicts magnetosphere impact from a flare class and source."
    }

    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let flare_class = arg_str(args, &["flare_class", "classType"]).unwrap_or("M1.0");
        let source_location = arg_str(args, &["source_location", "sourceLocation"])
            .unwrap_or("N10W10");
        Ok(heuristics::predict_magnetosphere_impact(
            flare_class,
            source_location,
        ))
    }
}

/// Fetches the latest planetary Kp index.
pub struct FetchKpIndexTool {
    donki: Arc<DonkiClient>,
}

#[async_trait]
impl Tool for FetchKpIndexTool {
    fn name(&self) -> &str {
        "FetchNASA_KpIndex"
    }

    fn description(&self) -> &str {
        "Fetches the most recent Kp geomagnetic index reading."
    }

    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let days_back = arg_i64(args, "days_back").unwrap_or(1);
        Ok(self.donki.fetch_kp_index(days_back).await)
    }
}

/// Assesses LEO/MEO/GEO satellite risk.
pub struct SatelliteVulnerabilityTool;

#[async_trait]
impl Tool for SatelliteVulnerabilityTool {
    fn name(&self) -> &str {
        "CalculateSatelliteVulnerability"
    }

    fn description(&self) -> &str {
        "Assesses LEO/MEO/GEO satellite risks based on flare strength and Kp index."
    }

    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let flare_class = arg_str(args, &["flare_class", "classType"]).unwrap_or("M1.0");
        let kp_index = arg_i64(args, "kp_index");
        Ok(heuristics::calculate_satellite_vulnerability(
            flare_class,
            kp_index,
        ))
    }
}

/// Produces an actionable operator alert.
pub struct OperationalAlertTool;

#[async_trait]
impl Tool for OperationalAlertTool {
    fn name(&self) -> &str {
        "GenerateOperationalAlert"
    }

    fn description(&self) -> &str {
        "Generates actionable space-weather alert messages."
    }

    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        let risk_level = arg_str(args, &["risk_level"]).unwrap_or("MODERATE");
        let flare_class = arg_str(args, &["flare_class", "classType"]).unwrap_or("M5.0");
        let impact_hours = arg_i64(args, "impact_hours").unwrap_or(48);
        Ok(heuristics::generate_operational_alert(
            risk_level,
            flare_class,
            impact_hours,
        ))
    }
}

/// The standard tool set in its canonical registration order.
pub fn standard_tools(donki: Arc<DonkiClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(FetchSolarFlaresTool {
            donki: Arc::clone(&donki),
        }),
        Arc::new(AnalyzeFlareEscalationTool),
        Arc::new(PredictMagnetosphereImpactTool),
        Arc::new(FetchKpIndexTool { donki }),
        Arc::new(SatelliteVulnerabilityTool),
        Arc::new(OperationalAlertTool),
    ]
}

/// Builds a registry holding the standard tool set.
pub fn standard_registry(donki: Arc<DonkiClient>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    for tool in standard_tools(donki) {
        registry.register(tool)?;
    }
    Ok(registry)
}
