//! HTTP scrape endpoint.
//!
//! `GET /metrics` freshens the snapshot (re-measuring if the cache expired)
//! and renders it; `GET /` is a static welcome page.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::application::exporter::Exporter;

pub fn router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(exporter)
}

async fn metrics(State(exporter): State<Arc<Exporter>>) -> impl IntoResponse {
    match exporter.ensure_fresh().await {
        Ok(freshness) => debug!(
            "Serving /metrics ({:?}, snapshot age {:?})",
            freshness,
            exporter.age().await
        ),
        Err(e) => warn!("Serving last snapshot after failed refresh: {:#}", e),
    }
    ([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], exporter.render())
}

async fn index() -> Html<&'static str> {
    Html(
        "<h1>Welcome to Speedtest-Exporter.</h1>\
         Click <a href='/metrics'>here</a> to see metrics.",
    )
}
