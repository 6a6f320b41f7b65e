mod rate_limit;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use guide_agents::GuideAgent;
use guide_core::scoring;
use guide_core::{AccessibilityBreakdown, ItineraryRequest, Location};
use guide_dataset::DatasetIndex;
use guide_ml::GenerativeStack;
use guide_observability::{AppMetrics, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use crate::rate_limit::IpRateLimiter;

const MIN_DURATION_DAYS: i64 = 1;
const MAX_DURATION_DAYS: i64 = 14;
const MAX_BODY_BYTES: usize = 64 * 1024;
const DEFAULT_DATASET_PATH: &str = "data/travel_planner_clean.json";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub dataset_path: PathBuf,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub allowed_origins: Vec<String>,
    pub score_seed: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 80,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            score_seed: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let dataset_path = env::var("GUIDE_DATASET_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.dataset_path);
        let rate_limit_window = env::var("GUIDE_API_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_limit_window);
        let rate_limit_max = env::var("GUIDE_API_RATE_LIMIT_MAX")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(defaults.rate_limit_max);
        let allowed_origins = env::var("GUIDE_ALLOWED_ORIGINS")
            .ok()
            .map(|value| parse_origins(&value))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);
        let score_seed = env::var("GUIDE_SCORE_SEED")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());

        Self {
            dataset_path,
            rate_limit_window,
            rate_limit_max,
            allowed_origins,
            score_seed,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<GuideAgent>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

impl ApiState {
    pub fn new(config: &ApiConfig, dataset: DatasetIndex, models: GenerativeStack) -> Self {
        let metrics = AppMetrics::shared();
        let agent = GuideAgent::new(Arc::new(dataset), models, metrics.clone())
            .with_score_seed(config.score_seed);

        Self {
            agent: Arc::new(agent),
            metrics,
            limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
            allowed_origins: Arc::new(config.allowed_origins.clone()),
        }
    }
}

/// Loads the dataset and the model backend from the environment and builds
/// the full router.
pub fn build_app(config: ApiConfig) -> Router {
    build_app_with_models(config, GenerativeStack::load_default())
}

pub fn build_app_with_models(config: ApiConfig, models: GenerativeStack) -> Router {
    let dataset = DatasetIndex::load(&config.dataset_path);
    let stats = dataset.stats();
    info!(
        path = %config.dataset_path.display(),
        records = stats.records,
        with_plan = stats.records_with_plan,
        generative_model = models.is_enabled(),
        "api state initialised"
    );

    build_router(ApiState::new(&config, dataset, models))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/itinerary/generate", post(generate_itinerary))
        .route("/api/map/rank", post(rank_locations))
        .route("/api/map/filter", post(filter_locations))
        .route("/api/map/score", post(score_location))
        .route("/api/sign-language/translate", post(translate_sign))
        .route("/api/sign-language/centers", get(interpreter_centers))
        .fallback(not_found)
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    version: &'static str,
    metrics: MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthCapabilities {
    dataset_records: usize,
    generative_model: bool,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            dataset_records: state.agent.dataset().len(),
            generative_model: state.agent.model_enabled(),
        },
    };
    (StatusCode::OK, Json(payload))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateItineraryBody {
    destination: Option<Value>,
    duration: Option<Value>,
    #[serde(default)]
    accessibility_needs: Vec<String>,
    #[serde(default)]
    mobility_details: String,
    #[serde(default)]
    vision_details: String,
    #[serde(default)]
    hearing_details: String,
    #[serde(default)]
    cognitive_details: String,
}

async fn generate_itinerary(
    State(state): State<ApiState>,
    body: Result<Json<GenerateItineraryBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let destination = body
        .destination
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if destination.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Destination is required",
            Some("MISSING_DESTINATION"),
        );
    }

    let Some(duration) = parse_duration(body.duration.as_ref()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Duration must be between 1 and 14 days",
            Some("INVALID_DURATION"),
        );
    };

    let request = ItineraryRequest {
        destination: destination.to_string(),
        duration,
        accessibility_needs: body.accessibility_needs,
        mobility_details: body.mobility_details,
        vision_details: body.vision_details,
        hearing_details: body.hearing_details,
        cognitive_details: body.cognitive_details,
    };

    let itinerary = state.agent.generate_itinerary(&request).await;
    (StatusCode::OK, Json(itinerary)).into_response()
}

/// Absent or null means one day. Anything else must be a whole number of
/// days inside the accepted range.
fn parse_duration(raw: Option<&Value>) -> Option<u32> {
    let days = match raw {
        None | Some(Value::Null) => MIN_DURATION_DAYS,
        Some(value) => {
            let number = value.as_f64()?;
            if number.fract() != 0.0 {
                return None;
            }
            number as i64
        }
    };

    (MIN_DURATION_DAYS..=MAX_DURATION_DAYS)
        .contains(&days)
        .then_some(days as u32)
}

#[derive(Debug, Deserialize)]
struct LocationsBody {
    locations: Vec<Location>,
    #[serde(default)]
    needs: Vec<String>,
}

async fn rank_locations(body: Result<Json<LocationsBody>, JsonRejection>) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let ranked = scoring::rank(&body.locations, &body.needs);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": ranked.len(),
            "locations": ranked,
        })),
    )
        .into_response()
}

async fn filter_locations(body: Result<Json<LocationsBody>, JsonRejection>) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let filtered = scoring::filter_by_needs(&body.locations, &body.needs);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": filtered.len(),
            "locations": filtered,
        })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct ScoreBody {
    location: Location,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    accessibility_score: u8,
    breakdown: AccessibilityBreakdown,
}

async fn score_location(body: Result<Json<ScoreBody>, JsonRejection>) -> Response {
    let Json(ScoreBody { location }) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let payload = ScoreResponse {
        accessibility_score: scoring::score(&location),
        breakdown: scoring::breakdown(&location),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
struct TranslateBody {
    text: Option<Value>,
}

async fn translate_sign(
    State(state): State<ApiState>,
    body: Result<Json<TranslateBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    let Some(text) = body
        .text
        .as_ref()
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Text is required", None);
    };

    let explanation = state.agent.explain_sign(text).await;
    (
        StatusCode::OK,
        Json(json!({
            "original": text,
            "explanation": explanation,
            "message": "Translation processed successfully",
        })),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct InterpreterCenter {
    id: u32,
    name: &'static str,
    address: &'static str,
    phone: &'static str,
    status: &'static str,
}

const INTERPRETER_CENTERS: [InterpreterCenter; 2] = [
    InterpreterCenter {
        id: 1,
        name: "Deaf Community Services",
        address: "123 Main St, Central City",
        phone: "(555) 123-4567",
        status: "Open",
    },
    InterpreterCenter {
        id: 2,
        name: "Access Interpreting",
        address: "456 Oak Ave, Westside",
        phone: "(555) 987-6543",
        status: "Available 24/7",
    },
];

async fn interpreter_centers() -> impl IntoResponse {
    (StatusCode::OK, Json(INTERPRETER_CENTERS))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Endpoint not found", None)
}

fn error_response(status: StatusCode, message: &str, code: Option<&str>) -> Response {
    let body = match code {
        Some(code) => json!({ "error": message, "code": code }),
        None => json!({ "error": message }),
    };
    (status, Json(body)).into_response()
}

fn invalid_body(rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "rejected request body");
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, &rejection.body_text(), Some("INVALID_BODY"))
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if let Err(retry_after) = state.limiter.check(&ip) {
        warn!(ip = %ip, path = %request.uri().path(), "rate limit exceeded");
        let seconds = retry_after.as_secs().max(1);
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Too many requests, please try again later.",
                "code": "RATE_LIMITED"
            })),
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(self), microphone=(), geolocation=(self)"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'; base-uri 'none'"),
    );

    response
}
