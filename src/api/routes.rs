use axum::{
    routing::get,
    Router,
    extract::{Query, State, rejection::QueryRejection},
    Json,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::models::{
    AccessibilityResult, AnalyzeQuery, ContentResult, FetchParams, FetchQuery, HealthStatus,
};
use crate::content::{decode_body, shape_content, word_count};
use crate::error::{AppError, Result};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/fetch", get(fetch_handler))
        .route("/analyze", get(analyze_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Query parameters in order of appearance.
type QueryPairs = std::result::Result<Query<Vec<(String, String)>>, QueryRejection>;

fn reject_query(rejection: QueryRejection) -> AppError {
    AppError::validation("query", rejection.body_text())
}

async fn fetch_handler(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<ContentResult>> {
    let Query(pairs) = query.map_err(reject_query)?;
    let params = FetchQuery::from_pairs(&pairs).validate()?;
    info!(url = %params.url, "fetch requested");

    match process_fetch_request(&state, &params).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            warn!(url = %params.url, error = %err, "fetch failed");
            Err(err)
        }
    }
}

async fn process_fetch_request(state: &AppState, params: &FetchParams) -> Result<ContentResult> {
    let fetched = state
        .http
        .fetch(&params.url, params.follow_redirects, params.timeout)
        .await?;

    let url = params.url.to_string();
    let text = decode_body(fetched.bytes);
    let shaped = shape_content(text, &fetched.content_type, params.extract_text, &url);

    Ok(ContentResult {
        word_count: word_count(&shaped.content),
        url,
        title: shaped.title,
        content: shaped.content,
        content_type: fetched.content_type,
        status_code: fetched.status_code,
        metadata: shaped.metadata,
    })
}

/// Input errors are rejected; everything after validation is reported in the body.
async fn analyze_handler(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<AccessibilityResult>> {
    let Query(pairs) = query.map_err(reject_query)?;
    let params = AnalyzeQuery::from_pairs(&pairs).validate()?;
    info!(url = %params.url, "analyze requested");

    Ok(Json(state.http.analyze(&params.url, params.timeout).await))
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: "url-access-api",
    })
}
