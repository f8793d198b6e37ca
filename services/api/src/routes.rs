use crate::infra::{AppState, ListingStore};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Extension, Json, Router};
use iv_housing::error::AppError;
use iv_housing::listings::assemble::encode_dataset;
use iv_housing::listings::dashboard::{
    build_view, filter_options, select, DashboardView, FilterOptions, FilterState,
};
use serde_json::json;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Dashboard pages and JSON API plus the service probes.
pub(crate) fn dashboard_app(store: ListingStore, state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/v1/listings", get(listings_endpoint))
        .route("/api/v1/listings.csv", get(listings_csv_endpoint))
        .route("/api/v1/filters", get(filter_options_endpoint))
        .with_state(store)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn listings_endpoint(
    State(store): State<ListingStore>,
    Query(filter): Query<FilterState>,
) -> Json<DashboardView> {
    Json(build_view(store.records(), &filter))
}

pub(crate) async fn listings_csv_endpoint(
    State(store): State<ListingStore>,
    Query(filter): Query<FilterState>,
) -> Result<impl IntoResponse, AppError> {
    let body = encode_dataset(select(store.records(), &filter))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"iv_listings.csv\"",
            ),
        ],
        body,
    ))
}

pub(crate) async fn filter_options_endpoint(
    State(store): State<ListingStore>,
) -> Json<FilterOptions> {
    Json(filter_options(store.records()))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
