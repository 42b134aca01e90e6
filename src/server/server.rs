use anyhow::{Context, Result};
use std::time::Duration;

use chrono::{FixedOffset, Utc};
use tower_http::services::ServeDir;
use tracing::info;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{http_cache, log_requests, no_cache, state::*, ApiError, ServerConfig};
use crate::page::PageState;
use crate::reviews::{intake, ReviewDraft, ReviewSummary};
use crate::storefront_store::{ConfigKind, LikeMode, Review};

const MAX_ANONYMOUS_ID_LEN: usize = 64;
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub version: &'static str,
    pub like_mode: LikeMode,
}

#[derive(Serialize)]
struct ReviewsResponse {
    reviews: Vec<Review>,
    summary: ReviewSummary,
}

/// Query of `/v1/page`. The offset is the visitor's, in minutes east of UTC
/// (-360 for UTC-6). Day labels use UTC when it is missing.
#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    utc_offset_minutes: Option<i32>,
}

#[derive(Serialize)]
struct ReconcileResponse {
    repaired: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn check_anonymous_id(anonymous_id: &str) -> Result<(), ApiError> {
    let well_formed = !anonymous_id.is_empty()
        && anonymous_id.len() <= MAX_ANONYMOUS_ID_LEN
        && anonymous_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "invalid_anonymous_id",
            "Anonymous id must be 1-64 characters of [A-Za-z0-9_-]",
        ))
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        version: env!("CARGO_PKG_VERSION"),
        like_mode: state.config.like_mode,
    };
    Json(stats)
}

fn visitor_offset(minutes: Option<i32>) -> Result<FixedOffset, ApiError> {
    let minutes = minutes.unwrap_or(0);
    if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(invalid_offset(minutes));
    }
    FixedOffset::east_opt(minutes * 60).ok_or_else(|| invalid_offset(minutes))
}

fn invalid_offset(minutes: i32) -> ApiError {
    ApiError::bad_request(
        "invalid_utc_offset",
        format!("UTC offset must be within ±14h, got {} minutes", minutes),
    )
}

async fn get_page(
    State(store): State<GuardedStorefrontStore>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageState>, ApiError> {
    let offset = visitor_offset(query.utc_offset_minutes)?;
    let now = Utc::now().with_timezone(&offset);
    Ok(Json(PageState::load(store.as_ref(), None, now).await))
}

async fn get_reviews(State(store): State<GuardedStorefrontStore>) -> Result<Response, ApiError> {
    let reviews = store.fetch_approved_reviews().await?;
    let summary = ReviewSummary::from_reviews(&reviews);
    Ok(Json(ReviewsResponse { reviews, summary }).into_response())
}

async fn post_review(
    State(store): State<GuardedStorefrontStore>,
    Json(draft): Json<ReviewDraft>,
) -> Result<Response, ApiError> {
    let review = intake::submit(store.as_ref(), &draft).await?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

async fn set_like(
    store: GuardedStorefrontStore,
    review_id: String,
    anonymous_id: String,
    liked: bool,
) -> Result<Response, ApiError> {
    check_anonymous_id(&anonymous_id)?;
    let mutation = store.set_like(&review_id, &anonymous_id, liked).await?;
    Ok(Json(mutation).into_response())
}

async fn put_like(
    State(store): State<GuardedStorefrontStore>,
    Path((review_id, anonymous_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    set_like(store, review_id, anonymous_id, true).await
}

async fn delete_like(
    State(store): State<GuardedStorefrontStore>,
    Path((review_id, anonymous_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    set_like(store, review_id, anonymous_id, false).await
}

async fn get_config(
    State(store): State<GuardedStorefrontStore>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let kind = ConfigKind::from_str(&kind)
        .ok_or_else(|| ApiError::not_found(format!("Unknown config kind {}", kind)))?;
    let payload = store.fetch_config(kind).await?;
    Ok(Json(payload).into_response())
}

async fn post_reconcile_likes(
    State(store): State<GuardedStorefrontStore>,
) -> Result<Response, ApiError> {
    let repaired = store.reconcile_like_counts().await?;
    Ok(Json(ReconcileResponse { repaired }).into_response())
}

pub fn make_app(config: ServerConfig, store: GuardedStorefrontStore) -> Result<Router> {
    let state = ServerState::new(config.clone(), store);

    // Review data changes with every like and approval.
    let live_routes: Router = Router::new()
        .route("/page", get(get_page))
        .route("/reviews", get(get_reviews).post(post_review))
        .route(
            "/reviews/{id}/likes/{anonymous_id}",
            put(put_like).delete(delete_like),
        )
        .route("/likes/reconcile", post(post_reconcile_likes))
        .layer(middleware::from_fn(no_cache))
        .with_state(state.clone());

    let config_routes: Router = Router::new()
        .route("/config/{kind}", get(get_config))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let api_routes = live_routes.merge(config_routes);

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router.nest("/v1", api_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(config: ServerConfig, store: GuardedStorefrontStore) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
