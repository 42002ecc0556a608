use crate::{
    collectors::Orchestrator,
    http::{
        error::AppError,
        exposition,
    },
};
use axum::{
    extract::State,
    http::header,
    response::{
        Html,
        IntoResponse,
    },
    routing::get,
    Router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub telemetry_path: Arc<str>,
}

pub fn create_router(orchestrator: Arc<Orchestrator>, telemetry_path: &str) -> Router {
    let state = AppState {
        orchestrator,
        telemetry_path: telemetry_path.into(),
    };

    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(landing))
        .route(telemetry_path, get(metrics))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn landing(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>Minecraft Exporter</title></head>\n<body>\n<h1>Minecraft Exporter</h1>\n<p><a \
         href=\"{path}\">Metrics</a></p>\n</body>\n</html>\n",
        path = state.telemetry_path
    ))
}

/// Runs one scrape per request. A client that disconnects early drops the
/// scrape along with every collector still running.
async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let samples = state.orchestrator.run_scrape().await;
    let body = exposition::encode_samples(samples)?;
    Ok(([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body))
}
