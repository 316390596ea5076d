use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use gpio::{create_pwm_output, LedController};
use registry::{DeviceRegistry, LedDevice, ScenarioRegistry};
use server_api::ApiContext;
use shared::{
    domain::{DeviceInfo, LedState},
    error::{ApiError, ErrorCode},
    protocol::{
        Scenario, ScenarioUpsertRequest, SetBrightnessRequest, SetPowerRequest, StatusResponse,
        TriggerOutcome,
    },
};
use tracing::{info, warn};

mod auth;
mod config;

use auth::require_bearer;
use config::{load_settings, validate_settings, Settings};

const SERVICE_NAME: &str = "nightlight";

struct AppState {
    api: ApiContext,
    settings: Settings,
    started_at: DateTime<Utc>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.clone())
        .init();
    validate_settings(&settings)?;

    let devices = Arc::new(build_registry(&settings)?);
    let scenarios = Arc::new(ScenarioRegistry::new());
    let state = Arc::new(AppState {
        api: ApiContext {
            devices: Arc::clone(&devices),
            scenarios,
        },
        settings: settings.clone(),
        started_at: Utc::now(),
    });
    let app = build_router(state);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, backend = %settings.gpio_backend, "nightlight listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down, closing devices");
    devices.close();
    Ok(())
}

/// Wires configuration to hardware: picks the GPIO backend, builds the PWM
/// output and controller, registers the configured device. An unknown
/// backend or missing driver aborts startup here.
fn build_registry(settings: &Settings) -> anyhow::Result<DeviceRegistry> {
    let pwm = create_pwm_output(
        &settings.gpio_backend,
        settings.led_gpio_pin,
        settings.pwm_frequency_hz,
    )?;
    let registry = DeviceRegistry::new();
    registry.register_led(LedDevice::new(
        settings.device_id.clone(),
        LedController::new(pwm),
    ));
    Ok(registry)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/status", get(http_status))
        .route("/metrics", get(http_metrics))
        .route("/api/v1/devices", get(http_list_devices))
        .route("/api/v1/devices/:device_id/state", get(http_device_state))
        .route("/api/v1/devices/:device_id/power", post(http_set_power))
        .route(
            "/api/v1/devices/:device_id/brightness",
            post(http_set_brightness),
        )
        .route("/api/v1/scenarios", get(http_list_scenarios))
        .route("/api/v1/scenarios/:scenario_id", put(http_upsert_scenario))
        .route(
            "/api/v1/scenarios/:scenario_id/trigger",
            post(http_trigger_scenario),
        )
        .with_state(state)
}

fn error_status(error: &ApiError) -> StatusCode {
    match error.code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(error: ApiError) -> (StatusCode, Json<ApiError>) {
    (error_status(&error), Json(error))
}

/// Single-page control UI; token entry, power and brightness. Compiled in
/// so the binary stays self-contained on the device.
async fn index() -> Html<&'static str> {
    Html(include_str!("../web/index.html"))
}

/// Liveness probe; deliberately unauthenticated and trivial.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn http_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<StatusResponse> {
    require_bearer(&headers, &state.settings.api_token)?;

    let devices = server_api::list_devices(&state.api);
    let mut led_states = HashMap::new();
    for device in &devices {
        if device.device_type != "led" {
            continue;
        }
        if let Ok(snapshot) = server_api::device_state(&state.api, &device.device_id) {
            led_states.insert(device.device_id.clone(), snapshot);
        }
    }

    let uptime = Utc::now().signed_duration_since(state.started_at);
    Ok(Json(StatusResponse {
        service: SERVICE_NAME.to_string(),
        uptime_s: uptime.num_milliseconds() as f64 / 1000.0,
        started_at: state.started_at,
        gpio_backend: state.settings.gpio_backend.clone(),
        devices,
        led_states,
    }))
}

/// Minimal Prometheus text exposition, rendered by hand.
async fn http_metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    require_bearer(&headers, &state.settings.api_token)?;

    let mut lines = Vec::new();
    for device in server_api::list_devices(&state.api) {
        if device.device_type != "led" {
            continue;
        }
        if let Ok(snapshot) = server_api::device_state(&state.api, &device.device_id) {
            lines.push(format!(
                "nightlight_led_on{{device_id=\"{}\"}} {}",
                device.device_id,
                u8::from(snapshot.is_on)
            ));
            lines.push(format!(
                "nightlight_led_brightness{{device_id=\"{}\"}} {:.6}",
                device.device_id, snapshot.brightness
            ));
        }
    }
    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

async fn http_list_devices(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<DeviceInfo>> {
    require_bearer(&headers, &state.settings.api_token)?;
    Ok(Json(server_api::list_devices(&state.api)))
}

async fn http_device_state(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<LedState> {
    require_bearer(&headers, &state.settings.api_token)?;
    let snapshot = server_api::device_state(&state.api, &device_id).map_err(reject)?;
    Ok(Json(snapshot))
}

async fn http_set_power(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SetPowerRequest>,
) -> ApiResult<LedState> {
    require_bearer(&headers, &state.settings.api_token)?;
    let snapshot =
        server_api::set_device_power(&state.api, &device_id, req.is_on).map_err(reject)?;
    Ok(Json(snapshot))
}

async fn http_set_brightness(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SetBrightnessRequest>,
) -> ApiResult<LedState> {
    require_bearer(&headers, &state.settings.api_token)?;
    let snapshot = server_api::set_device_brightness(&state.api, &device_id, req.brightness)
        .map_err(reject)?;
    Ok(Json(snapshot))
}

async fn http_list_scenarios(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<Scenario>> {
    require_bearer(&headers, &state.settings.api_token)?;
    Ok(Json(server_api::list_scenarios(&state.api)))
}

async fn http_upsert_scenario(
    State(state): State<Arc<AppState>>,
    Path(scenario_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ScenarioUpsertRequest>,
) -> ApiResult<Scenario> {
    require_bearer(&headers, &state.settings.api_token)?;
    let scenario = server_api::upsert_scenario(&state.api, &scenario_id, &req.name, req.actions)
        .map_err(reject)?;
    Ok(Json(scenario))
}

async fn http_trigger_scenario(
    State(state): State<Arc<AppState>>,
    Path(scenario_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<TriggerOutcome> {
    require_bearer(&headers, &state.settings.api_token)?;
    let outcome = server_api::trigger_scenario(&state.api, &scenario_id).map_err(reject)?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use gpio::MockPwmOutput;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token-0123456789";

    fn test_app() -> Router {
        let settings = Settings {
            api_token: TOKEN.into(),
            ..Settings::default()
        };
        let devices = DeviceRegistry::new();
        devices.register_led(LedDevice::new(
            "nightlight",
            LedController::new(Box::new(MockPwmOutput::new())),
        ));
        build_router(Arc::new(AppState {
            api: ApiContext {
                devices: Arc::new(devices),
                scenarios: Arc::new(ScenarioRegistry::new()),
            },
            settings,
            started_at: Utc::now(),
        }))
    }

    fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
        request.header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn device_routes_require_a_token() {
        let response = test_app()
            .oneshot(
                Request::get("/api/v1/devices")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn lists_the_registered_device() {
        let response = test_app()
            .oneshot(
                authed(Request::get("/api/v1/devices"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!([{"device_id": "nightlight", "device_type": "led"}])
        );
    }

    #[tokio::test]
    async fn power_round_trips_through_the_controller() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                authed(Request::post("/api/v1/devices/nightlight/power"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"is_on":true}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"is_on": true, "brightness": 1.0}));

        let response = app
            .oneshot(
                authed(Request::get("/api/v1/devices/nightlight/state"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["is_on"], true);
    }

    #[tokio::test]
    async fn brightness_is_clamped_over_http() {
        let response = test_app()
            .oneshot(
                authed(Request::post("/api/v1/devices/nightlight/brightness"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"brightness":1.5}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["brightness"], 1.0);
    }

    #[tokio::test]
    async fn unknown_device_is_404() {
        let response = test_app()
            .oneshot(
                authed(Request::get("/api/v1/devices/ghost/state"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn scenario_upsert_then_trigger() {
        let app = test_app();
        let actions = r#"{
            "name": "Evening",
            "actions": [
                {"type": "noop", "device_id": ""},
                {"type": "set_power", "device_id": "nightlight", "is_on": true},
                {"type": "set_brightness", "device_id": "nightlight", "brightness": 0.4}
            ]
        }"#;
        let response = app
            .clone()
            .oneshot(
                authed(Request::put("/api/v1/scenarios/evening"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(actions))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                authed(Request::post("/api/v1/scenarios/evening/trigger"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["scenario_id"], "evening");
        let executed = body["executed"].as_array().expect("executed");
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[1]["state"]["brightness"], 0.4);
    }

    #[tokio::test]
    async fn triggering_a_missing_scenario_is_404() {
        let response = test_app()
            .oneshot(
                authed(Request::post("/api/v1/scenarios/missing_scenario/trigger"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_render_gauges_per_device() {
        let app = test_app();
        app.clone()
            .oneshot(
                authed(Request::post("/api/v1/devices/nightlight/brightness"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"brightness":0.4}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        let response = app
            .oneshot(
                authed(Request::get("/metrics"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(body.contains("nightlight_led_on{device_id=\"nightlight\"} 1"));
        assert!(body.contains("nightlight_led_brightness{device_id=\"nightlight\"} 0.400000"));
    }

    #[tokio::test]
    async fn status_reports_devices_and_states() {
        let response = test_app()
            .oneshot(
                authed(Request::get("/status"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["service"], "nightlight");
        assert_eq!(body["gpio_backend"], "mock");
        assert_eq!(body["led_states"]["nightlight"]["is_on"], false);
    }
}
