//! HTTP surface: the agent endpoint plus raw tool routes.
//!
//! Thin glue over the core. Every route answers with a tagged JSON envelope;
//! faults never leave as panics or bare stack traces.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::agent::SolarAnalystAgent;
use crate::assembler::{ReportMode, ResultAssembler};
use crate::models::{ChatCompletionClient, ChatMessage};
use crate::tools::{heuristics, DonkiClient};

/// Session used when a request does not name one. Callers sharing it see
/// each other's history.
pub const DEFAULT_SESSION: &str = "global";

/// Shared state behind the router.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<SolarAnalystAgent>,
    pub assembler: Arc<ResultAssembler>,
    pub model: Arc<dyn ChatCompletionClient>,
    pub donki: Arc<DonkiClient>,
}

/// Builds the full route table over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .route("/agent", post(agent_endpoint))
        .route("/kp-index", get(kp_index))
        .route("/nasa/flares", get(solar_flares))
        .route("/nasa/analysis", get(flare_analysis))
        .route("/nasa/impact", get(impact))
        .route("/nasa/vulnerability", get(vulnerability))
        .route("/nasa/alert", get(alert))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "AstroPulse backend active (Gemini + NASA tools)" }))
}

#[derive(Debug, Deserialize)]
pub struct UserMessage {
    pub message: String,
    /// Optional conversation key; omitted requests share [`DEFAULT_SESSION`].
    #[serde(default)]
    pub session_id: Option<String>,
}

async fn chat(State(state): State<AppState>, Json(body): Json<UserMessage>) -> Json<Value> {
    let request = [ChatMessage::user(body.message)];
    match state.model.complete(&request).await {
        Ok(reply) => Json(json!({ "reply": reply })),
        Err(e) => {
            error!(error = %e, "chat endpoint failed");
            Json(json!({ "error": e.to_string() }))
        }
    }
}

fn default_brief() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct AgentParams {
    /// Condense the report through a secondary model call.
    #[serde(default = "default_brief")]
    brief: bool,
    /// Attach the reasoning trace for frontend visualization.
    #[serde(default)]
    trace: bool,
}

async fn agent_endpoint(
    State(state): State<AppState>,
    Query(params): Query<AgentParams>,
    Json(body): Json<UserMessage>,
) -> Json<Value> {
    let session = body.session_id.as_deref().unwrap_or(DEFAULT_SESSION);
    let episode = state.agent.query(&body.message, session).await;
    if !episode.is_success() {
        let reason = episode
            .error
            .unwrap_or_else(|| "Unknown failure".to_string());
        return Json(json!({ "status": "error", "error": reason }));
    }

    let mode = if params.brief {
        ReportMode::Brief
    } else {
        ReportMode::Full
    };
    match state.assembler.assemble(&episode, mode).await {
        Ok(report) => {
            let mut response = json!({
                "status": "success",
                "report": report,
                "steps": episode.steps.len(),
                "mode": mode.as_str(),
            });
            if params.trace {
                response["trace"] = json!(episode.steps);
            }
            Json(response)
        }
        Err(e) => {
            error!(error = %e, "report assembly failed");
            Json(json!({ "status": "failed", "error": e.to_string() }))
        }
    }
}

fn default_kp_days() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct KpParams {
    #[serde(default = "default_kp_days")]
    days_back: i64,
}

async fn kp_index(State(state): State<AppState>, Query(params): Query<KpParams>) -> Json<Value> {
    let data = state.donki.fetch_kp_index(params.days_back).await;
    Json(json!({ "status": "success", "data": data }))
}

fn default_flare_days() -> i64 {
    7
}

#[derive(Debug, Deserialize)]
struct FlareParams {
    #[serde(default = "default_flare_days")]
    days_back: i64,
}

async fn solar_flares(
    State(state): State<AppState>,
    Query(params): Query<FlareParams>,
) -> Json<Value> {
    Json(state.donki.fetch_solar_flares(params.days_back).await)
}

async fn flare_analysis(
    State(state): State<AppState>,
    Query(params): Query<FlareParams>,
) -> Json<Value> {
    let flares = state.donki.fetch_solar_flares(params.days_back).await;
    let records = flares.as_array().cloned().unwrap_or_default();
    Json(heuristics::analyze_flare_escalation(&records))
}

fn default_impact_class() -> String {
    "M5.2".to_string()
}

fn default_impact_location() -> String {
    "N10W30".to_string()
}

#[derive(Debug, Deserialize)]
struct ImpactParams {
    #[serde(default = "default_impact_class")]
    flare_class: String,
    #[serde(default = "default_impact_location")]
    source_location: String,
}

async fn impact(Query(params): Query<ImpactParams>) -> Json<Value> {
    Json(heuristics::predict_magnetosphere_impact(
        &params.flare_class,
        &params.source_location,
    ))
}

fn default_kp_index() -> i64 {
    5
}

#[derive(Debug, Deserialize)]
struct VulnerabilityParams {
    #[serde(default = "default_impact_class")]
    flare_class: String,
    #[serde(default = "default_kp_index")]
    kp_index: i64,
}

async fn vulnerability(Query(params): Query<VulnerabilityParams>) -> Json<Value> {
    Json(heuristics::calculate_satellite_vulnerability(
        &params.flare_class,
        Some(params.kp_index),
    ))
}

fn default_risk_level() -> String {
    "HIGH".to_string()
}

fn default_impact_hours() -> i64 {
    48
}

#[derive(Debug, Deserialize)]
struct AlertParams {
    #[serde(default = "default_risk_level")]
    risk_level: String,
    #[serde(default = "default_impact_class")]
    flare_class: String,
    #[serde(default = "default_impact_hours")]
    impact_hours: i64,
}

async fn alert(Query(params): Query<AlertParams>) -> Json<Value> {
    Json(heuristics::generate_operational_alert(
        &params.risk_level,
        &params.flare_class,
        params.impact_hours,
    ))
}
