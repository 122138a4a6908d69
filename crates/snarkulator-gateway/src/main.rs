//! Snarkulator Gateway — JSON API for the sarcastic calculator, plus the built client if present.
//! Calculations and persona replies live in memory only; a restart forgets everything.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use snarkulator_core::{
    judge_expression, AiResponse, CalculateRequest, CalculateResponse, Calculation,
    CommentaryProvider, ErrorBody, GatewayConfig, GeminiBridge, JudgeError, MemStorage, Storage,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Longest request log line before it is cut with an ellipsis.
const LOG_LINE_MAX: usize = 80;

#[derive(Clone)]
struct AppState {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn CommentaryProvider>,
    config: Arc<GatewayConfig>,
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    limit: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[snarkulator-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GatewayConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("[SNARKULATOR] Config load failed: {}", e);
            std::process::exit(1);
        }
    };
    if !config.has_api_key() {
        tracing::warn!(
            "[SNARKULATOR] No GEMINI_API_KEY / GOOGLE_AI_API_KEY set; every reply will be the fallback."
        );
    }

    let addr = config.bind_addr();
    let state = AppState {
        storage: Arc::new(MemStorage::new()),
        provider: Arc::new(GeminiBridge::from_config(&config)),
        config: Arc::new(config),
    };
    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("[SNARKULATOR] Cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("[SNARKULATOR] serving on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("[SNARKULATOR] server error: {}", e);
        std::process::exit(1);
    }
}

fn build_app(state: AppState) -> Router {
    // The web client runs on a dev server during development (Vite: 5173, or 3000-3099).
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let s = origin.to_str().unwrap_or("");
            let port = s
                .rsplit(':')
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(0);
            (s.starts_with("http://localhost") || s.starts_with("http://127.0.0.1"))
                && (port == 5173 || (3000..=3099).contains(&port))
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    let static_dir = state
        .config
        .static_dir
        .clone()
        .filter(|d| std::path::Path::new(d).is_dir());

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/calculations", get(list_calculations_handler))
        .route("/api/calculations/:id/responses", get(responses_handler))
        .with_state(state);

    if let Some(dir) = static_dir {
        tracing::info!("[SNARKULATOR] serving client from {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(axum::middleware::from_fn(log_api_traffic))
        .layer(cors)
}

/// Logs `/api` traffic as `METHOD path status in Nms :: body`, cut to [`LOG_LINE_MAX`].
async fn log_api_traffic(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if !path.starts_with("/api") {
        return response;
    }

    let elapsed_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();
    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("[SNARKULATOR] {} {} {}: body unreadable: {}", method, path, status, e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut line = format!("{} {} {} in {}ms", method, path, status, elapsed_ms);
    if !bytes.is_empty() {
        line.push_str(" :: ");
        line.push_str(&String::from_utf8_lossy(&bytes));
    }
    tracing::info!("{}", truncate_log_line(&line));

    Response::from_parts(parts, Body::from(bytes))
}

fn truncate_log_line(line: &str) -> String {
    if line.chars().count() > LOG_LINE_MAX {
        let cut: String = line.chars().take(LOG_LINE_MAX - 1).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}

async fn health() -> &'static str {
    "OK"
}

/// POST /api/calculate: persona reply for one expression, stored with the calculation.
/// Unreadable bodies get the same 400 as a missing expression.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>, (StatusCode, Json<ErrorBody>)> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!("[SNARKULATOR] calculate body rejected: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new(JudgeError::MissingExpression.to_string())),
        )
    })?;
    let out = judge_expression(
        state.storage.as_ref(),
        state.provider.as_ref(),
        body.expression.as_deref(),
        state.config.history_window,
    )
    .await
    .map_err(|e| match e {
        JudgeError::MissingExpression => {
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new(e.to_string())))
        }
    })?;
    Ok(Json(out))
}

/// GET /api/calculations?limit=N: newest first.
async fn list_calculations_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Calculation>> {
    let limit = params
        .limit
        .as_deref()
        .and_then(parse_limit)
        .unwrap_or(state.config.default_list_limit);
    Json(state.storage.get_recent_calculations(limit).await)
}

/// Leading run of digits, so `5abc` is 5 and `2.5` is 2. Zero, negative or
/// digit-less values yield `None`.
fn parse_limit(raw: &str) -> Option<usize> {
    let s = raw.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse::<usize>().ok().filter(|&n| n > 0)
}

/// GET /api/calculations/:id/responses: oldest first, empty for unknown ids.
async fn responses_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let responses: Vec<AiResponse> = state.storage.get_ai_responses_by_calculation_id(&id).await;
    Json(responses)
}
