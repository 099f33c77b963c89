pub mod types;
pub mod config;
pub mod error;
pub mod payload;
pub mod summary;
pub mod detect;
pub mod legacy;
pub mod unified;
pub mod normalize;
pub mod setup;
pub mod feed;
pub mod theme;
pub mod viewport;

use types::*;
use config::*;
use error::SummaryError;
use normalize::{canonicalize, normalize_payload};
use setup::new_match_summary;
use theme::ThemeName;

use axum::{
    extract::State as AxumState,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::{fs, path::PathBuf};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ── Error responses ────────────────────────────────────────────────────

fn summary_error_response(err: &SummaryError) -> Response {
    let status = match err {
        SummaryError::SchemaValidation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SummaryError::UnrecognizedSchema { .. } => StatusCode::BAD_REQUEST,
    };
    (status, Json(err.to_body())).into_response()
}

fn feed_error_response(err: &feed::FeedError) -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({ "kind": "LifecycleError", "reason": err.to_string() })),
    )
        .into_response()
}

// ── Match endpoints ────────────────────────────────────────────────────

async fn post_match(AxumState(state): AxumState<OverlayServerState>, Json(payload): Json<Value>) -> Response {
    let summary = match normalize_payload(&payload) {
        Ok(summary) => summary,
        Err(err) => return summary_error_response(&err),
    };
    let mut feed = state.feed.lock().unwrap_or_else(|e| e.into_inner());
    match feed.ingest(summary) {
        Ok(current) => Json(current.clone()).into_response(),
        Err(err) => feed_error_response(&err),
    }
}

async fn post_match_unified(Json(payload): Json<Value>) -> Response {
    match normalize_payload(&payload) {
        Ok(summary) => Json(canonicalize(&summary)).into_response(),
        Err(err) => summary_error_response(&err),
    }
}

async fn post_new_match(AxumState(state): AxumState<OverlayServerState>, Json(payload): Json<Value>) -> Response {
    let summary = match new_match_summary(&payload) {
        Ok(summary) => summary,
        Err(err) => return summary_error_response(&err),
    };
    let mut feed = state.feed.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(previous) = feed.reset() {
        info!(previous = previous.status.as_str(), "replacing match with new setup");
    }
    match feed.ingest(summary) {
        Ok(current) => Json(current.clone()).into_response(),
        Err(err) => feed_error_response(&err),
    }
}

async fn delete_match(AxumState(state): AxumState<OverlayServerState>) -> StatusCode {
    let mut feed = state.feed.lock().unwrap_or_else(|e| e.into_inner());
    if feed.reset().is_some() {
        info!("match feed reset");
    }
    StatusCode::NO_CONTENT
}

// ── Theme and viewport endpoints ───────────────────────────────────────

fn theme_response(applied: theme::AppliedTheme) -> Response {
    let mut headers = HeaderMap::new();
    for cookie in &applied.set_cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => error!("invalid theme cookie {cookie:?}: {e}"),
        }
    }
    (headers, Json(applied.presentation)).into_response()
}

async fn get_theme(AxumState(state): AxumState<OverlayServerState>, headers: HeaderMap) -> Response {
    let cookie_header = headers.get(header::COOKIE).and_then(|value| value.to_str().ok());
    let mut guard = state.theme.lock().unwrap_or_else(|e| e.into_inner());
    if cookie_header.is_some() {
        *guard = theme::ThemeState::load(cookie_header);
    }
    theme_response(guard.apply(chrono::Utc::now()))
}

async fn post_theme(
    AxumState(state): AxumState<OverlayServerState>,
    Json(update): Json<ThemeUpdate>,
) -> Response {
    let theme = match update.theme.as_deref() {
        Some(raw) => match ThemeName::parse(raw) {
            Some(theme) => Some(theme),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "kind": "ThemeError", "reason": format!("unknown theme {raw:?}") })),
                )
                    .into_response();
            }
        },
        None => None,
    };
    let mut guard = state.theme.lock().unwrap_or_else(|e| e.into_inner());
    if guard.update(theme, update.night_mode) {
        info!(
            theme = guard.current_theme.as_str(),
            night_mode = guard.night_mode,
            "theme changed"
        );
    }
    theme_response(guard.apply(chrono::Utc::now()))
}

async fn post_viewport(
    AxumState(state): AxumState<OverlayServerState>,
    Json(report): Json<ViewportReport>,
) -> Json<ViewportState> {
    let changed = state.viewport.on_resize(report.width);
    Json(ViewportState {
        is_narrow_viewport: state.viewport.is_narrow_viewport(),
        changed,
    })
}

// ── Overlay HTTP server ────────────────────────────────────────────────

fn build_overlay_state(state: &OverlayServerState) -> OverlayState {
    let current_match = {
        let guard = state.feed.lock().unwrap_or_else(|e| e.into_inner());
        guard.current().cloned()
    };
    let theme = {
        let guard = state.theme.lock().unwrap_or_else(|e| e.into_inner());
        guard.presentation()
    };
    OverlayState {
        current_match,
        theme,
        is_narrow_viewport: state.viewport.is_narrow_viewport(),
    }
}

async fn get_overlay_state_json(AxumState(state): AxumState<OverlayServerState>) -> impl IntoResponse {
    let payload = build_overlay_state(&state);
    let body = serde_json::to_string(&payload).unwrap_or_else(|e| {
        warn!("failed to serialize overlay state: {e}");
        "{}".to_string()
    });
    (
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
        ],
        body,
    )
}

fn overlay_router(state: OverlayServerState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/state.json", get(get_overlay_state_json))
        .route("/api/match", post(post_match).delete(delete_match))
        .route("/api/match/new", post(post_new_match))
        .route("/api/match/unified", post(post_match_unified))
        .route("/api/theme", get(get_theme).post(post_theme))
        .route("/api/viewport", post(post_viewport))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

async fn start_overlay_server(state: OverlayServerState, static_dir: PathBuf, addr: &str) {
    let app = overlay_router(state, static_dir);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("overlay server failed to bind {addr}: {e}");
            return;
        }
    };
    info!("overlay server listening at http://{addr}/");
    if let Err(e) = axum::serve(listener, app).await {
        error!("overlay server error: {e}");
    }
}

// ── Entry point ────────────────────────────────────────────────────────

pub fn run() {
    load_env_file();
    let (config, config_error) = match load_config_inner() {
        Ok(config) => (config, None),
        Err(e) => (apply_env_defaults(AppConfig::default()), Some(e)),
    };

    // Initialize tracing with file output
    let logs_dir = resolve_repo_path(&config.log_dir);
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Tennis scoreboard starting");
    match config_error {
        Some(e) => error!("falling back to default config: {e}"),
        None => match write_default_config(&config_path(), &config) {
            Ok(true) => info!("wrote default config to {}", config_path().display()),
            Ok(false) => {}
            Err(e) => warn!("could not write default config: {e}"),
        },
    }
    log_config_warnings(&config);

    let state = OverlayServerState::new(config.narrow_viewport_px);
    let overlay_dir = resolve_repo_path(&config.overlay_dir);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start async runtime: {e}");
            return;
        }
    };
    runtime.block_on(start_overlay_server(state, overlay_dir, &config.bind_addr));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::tests::{legacy_doubles_payload, legacy_singles_payload};
    use crate::unified::tests::unified_mixed_payload;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_match_stores_canonical_summary() {
        let state = OverlayServerState::new(768);
        let response = post_match(AxumState(state.clone()), Json(unified_mixed_payload())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["meta"]["matchType"], "mixed-doubles");

        let overlay = build_overlay_state(&state);
        assert!(overlay.current_match.is_some());
        assert_eq!(overlay.theme.primary_color, "#006400");
    }

    #[tokio::test]
    async fn test_emitted_match_can_be_posted_back() {
        let state = OverlayServerState::new(768);
        let first = post_match(AxumState(state.clone()), Json(legacy_doubles_payload())).await;
        let emitted = body_json(first).await;

        let overlay = serde_json::to_value(build_overlay_state(&state)).unwrap();
        assert_eq!(overlay["match"], emitted);

        let again = post_match(AxumState(state.clone()), Json(emitted.clone())).await;
        assert_eq!(again.status(), StatusCode::OK);
        assert_eq!(body_json(again).await, emitted);
    }

    #[tokio::test]
    async fn test_post_match_rejects_unrecognized() {
        let state = OverlayServerState::new(768);
        let response = post_match(AxumState(state.clone()), Json(json!({ "score": {} }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "UnrecognizedSchemaError");
        assert!(build_overlay_state(&state).current_match.is_none());
    }

    #[tokio::test]
    async fn test_post_match_reports_validation_path() {
        let state = OverlayServerState::new(768);
        let mut payload = legacy_singles_payload();
        payload["player1"]["stats"]["break_point_won"] = json!(10);
        let response = post_match(AxumState(state), Json(payload)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["path"], "participants.1.stats.returning.breakPointsWon");
    }

    #[tokio::test]
    async fn test_completed_match_cannot_resume() {
        let state = OverlayServerState::new(768);
        let done = post_match(AxumState(state.clone()), Json(legacy_doubles_payload())).await;
        assert_eq!(done.status(), StatusCode::OK);

        let mut resumed = legacy_doubles_payload();
        resumed.as_object_mut().unwrap().remove("winner");
        let response = post_match(AxumState(state.clone()), Json(resumed.clone())).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        assert_eq!(delete_match(AxumState(state.clone())).await, StatusCode::NO_CONTENT);
        let response = post_match(AxumState(state), Json(resumed)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_new_match_replaces_completed_match() {
        let state = OverlayServerState::new(768);
        let done = post_match(AxumState(state.clone()), Json(legacy_doubles_payload())).await;
        assert_eq!(done.status(), StatusCode::OK);

        let setup = json!({
            "matchType": "doubles",
            "team1": ["Ana", "Ben"],
            "team2": ["Cleo", "Dan"],
            "selectedSets": 3
        });
        let response = post_new_match(AxumState(state.clone()), Json(setup)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["meta"]["status"], "not-started");
        assert_eq!(body["participants"]["2"]["info"]["players"]["a"]["id"], "2a");

        let current = build_overlay_state(&state).current_match.unwrap();
        assert_eq!(current.status, summary::MatchStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_new_match_rejects_bad_setup() {
        let state = OverlayServerState::new(768);
        let setup = json!({ "matchType": "singles", "player1": "A", "selectedSets": 3 });
        let response = post_new_match(AxumState(state.clone()), Json(setup)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["path"], "player2");
        assert!(build_overlay_state(&state).current_match.is_none());
    }

    #[tokio::test]
    async fn test_unified_migration_endpoint() {
        let response = post_match_unified(Json(legacy_singles_payload())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["participants"]["1"]["info"]["name"], "Swiatek");
        assert_eq!(body["score"]["server"]["current"], "2");
    }

    #[tokio::test]
    async fn test_theme_cookie_round_trip() {
        let state = OverlayServerState::new(768);
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("tennisjs_theme=hard; tennisjs_night=true"));
        let response = get_theme(AxumState(state.clone()), headers).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(|raw| raw.to_string()))
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("tennisjs_theme=hard-a;path=/;max-age=31536000"));
        let body = body_json(response).await;
        assert_eq!(body["theme"], "hard-a");
        assert_eq!(body["night"], "true");
    }

    #[tokio::test]
    async fn test_post_theme_updates_shared_state() {
        let state = OverlayServerState::new(768);
        let update = ThemeUpdate {
            theme: Some("clay".to_string()),
            night_mode: None,
        };
        let response = post_theme(AxumState(state.clone()), Json(update)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(build_overlay_state(&state).theme.primary_color, "#b35940");

        let bad = ThemeUpdate {
            theme: Some("carpet".to_string()),
            night_mode: Some(true),
        };
        let response = post_theme(AxumState(state.clone()), Json(bad)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(build_overlay_state(&state).theme.night, "false");
    }

    #[tokio::test]
    async fn test_viewport_report() {
        let state = OverlayServerState::new(768);
        let Json(report) = post_viewport(AxumState(state.clone()), Json(ViewportReport { width: 400 })).await;
        assert!(report.is_narrow_viewport);
        assert!(report.changed);
        assert!(build_overlay_state(&state).is_narrow_viewport);
    }
}
