//! HTTP scoring server.
//!
//! Exposes the health-score pipeline over two POST endpoints plus health and
//! index routes. Requests are stateless: every call carries its own
//! telemetry and is scored against the model registry loaded at startup.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};

use rulcast_core::{
    HealthScoreRequest, ModelRegistry, ScoringConfig, ScoringError, add_rul_prediction,
    calculate_health_score,
};

/// Shared server state. The registry and config are immutable after
/// startup, so handlers share them without locking.
struct AppState {
    registry: ModelRegistry,
    config: ScoringConfig,
}

/// Stamp the response with generation time: `__dt` wall-clock string and
/// `__ts` epoch seconds. The double underscore sorts these above the data
/// fields in serialized output.
fn add_response_identity(mut response: serde_json::Value) -> serde_json::Value {
    let now = chrono::Local::now();
    if let Some(map) = response.as_object_mut() {
        map.insert(
            "__dt".to_string(),
            serde_json::Value::from(now.format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        map.insert("__ts".to_string(), serde_json::Value::from(now.timestamp()));
    }
    response
}

fn status_for(err: &ScoringError) -> StatusCode {
    match err {
        ScoringError::UnknownModel { .. } => StatusCode::NOT_FOUND,
        ScoringError::Artifact { .. }
        | ScoringError::PipelineMismatch { .. }
        | ScoringError::MissingScoreColumn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ScoringError::InvalidShape
        | ScoringError::MissingField(_)
        | ScoringError::InvalidTimestamp(_) => StatusCode::BAD_REQUEST,
    }
}

fn error_body(err: &ScoringError) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": false,
        "error": err.to_string(),
    }))
}

/// Shared scoring path for both endpoints. `with_rul` additionally projects
/// per-unit RUL from the smoothed series.
fn score_request(
    state: &AppState,
    payload: serde_json::Value,
    with_rul: bool,
) -> Result<serde_json::Value, ScoringError> {
    let request = HealthScoreRequest::from_json(payload)?;
    let mut response = calculate_health_score(request, &state.registry, &state.config)?;
    if with_rul {
        add_rul_prediction(&mut response, &state.config);
    }
    // Serializing a response we just built cannot fail; treat it as a
    // pipeline invariant rather than a client error.
    serde_json::to_value(&response).map_err(|e| ScoringError::Artifact {
        path: "<response>".to_string(),
        reason: e.to_string(),
    })
}

async fn handle_health_score(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    match score_request(&state, payload, false) {
        Ok(response) => (StatusCode::OK, Json(add_response_identity(response))),
        Err(err) => {
            log::warn!("health-score request rejected: {err}");
            (status_for(&err), error_body(&err))
        }
    }
}

async fn handle_rul(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    match score_request(&state, payload, true) {
        Ok(response) => (StatusCode::OK, Json(add_response_identity(response))),
        Err(err) => {
            log::warn!("rul request rejected: {err}");
            (status_for(&err), error_body(&err))
        }
    }
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": if state.registry.is_empty() { "degraded" } else { "healthy" },
        "models_loaded": state.registry.len(),
    }))
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let models: Vec<String> = state
        .registry
        .list()
        .iter()
        .map(|m| m.model_id())
        .collect();

    Json(serde_json::json!({
        "name": "rulcast Server",
        "version": rulcast_core::VERSION,
        "models": models,
        "endpoints": {
            "/": "This API index",
            "/api/v1/health-score": {
                "method": "POST",
                "description": "Compute the smoothed health-score series",
                "body": {
                    "unit_model": "Equipment model (resolves the scoring bundle)",
                    "component": "Component name (resolves the scoring bundle)",
                    "vhms": "Telemetry record or array of records",
                    "pap": "Optional lab sample record or array of records",
                }
            },
            "/api/v1/rul": {
                "method": "POST",
                "description": "Health-score series plus per-unit RUL predictions",
            },
            "/health": "Registry health check",
        },
    }))
}

/// Build the axum router.
fn build_router(registry: ModelRegistry, config: ScoringConfig) -> Router {
    let state = Arc::new(AppState { registry, config });

    Router::new()
        .route("/", get(handle_index))
        .route("/api/v1/health-score", post(handle_health_score))
        .route("/api/v1/rul", post(handle_rul))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP scoring server.
pub async fn run_server(
    registry: ModelRegistry,
    config: ScoringConfig,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let app = build_router(registry, config);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("rulcast server listening on {addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_fields_are_stamped() {
        let stamped = add_response_identity(serde_json::json!({"_unit_model": "PC300"}));
        let map = stamped.as_object().unwrap();
        assert!(map["__dt"].is_string());
        assert!(map["__ts"].is_i64());
        assert_eq!(map["_unit_model"], "PC300");
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(
            status_for(&ScoringError::MissingField("vhms")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ScoringError::UnknownModel {
                model_id: "pc300_engine".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ScoringError::MissingScoreColumn("health_score")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn score_request_end_to_end() {
        let state = AppState {
            registry: ModelRegistry::from_manifests([serde_json::from_value(serde_json::json!({
                "unit_model": "PC300",
                "component": "engine",
                "scoring": {"stages": [{"type": "linear_score",
                    "weights": {"wear": -1.0}, "intercept": 100.0,
                    "min": 0.0, "max": 100.0}]}
            }))
            .unwrap()]),
            config: ScoringConfig::default(),
        };
        let payload = serde_json::json!({
            "unit_model": "pc300",
            "component": "engine",
            "vhms": {"serial_number": "A1", "smr": 100.0,
                     "timestamp": "2024-03-01 08:00:00", "wear": 25.0},
        });

        let response = score_request(&state, payload, true).unwrap();
        assert_eq!(response["_unit_model"], "PC300");
        assert_eq!(response["health_score_data"][0]["health_score"], 75.0);
        assert_eq!(response["rul_prediction"], serde_json::json!([]));
    }
}
