mod cache;
mod config;
mod metrics;
mod retry;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use extract::{OllamaClient, TextGenerator};
use pipeline::{AgenticRagRequest, AgenticRagResponse, ProcessError, Processor, Stage};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use cache::{Cache, CacheStats, CachingGenerator};
use config::AppConfig;
use metrics::{Metrics, MetricsSnapshot, TimedOperation};
use retry::{RetryPolicy, RetryingGenerator};

struct AppState {
    processor: Arc<Processor>,
    ollama: OllamaClient,
    metrics: Arc<Metrics>,
    cache: Option<Arc<Cache>>,
    limiter: Arc<Semaphore>,
    config: AppConfig,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    mode: config::OperationMode,
    model: String,
    ollama: String,
}

#[derive(Serialize)]
struct MetricsResponse {
    requests: MetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<CacheStats>,
}

/// JSON error body with the HTTP status it maps to.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    stage: Option<Stage>,
}

impl ApiError {
    fn timeout(secs: u64) -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            message: format!("request timed out after {secs}s"),
            stage: None,
        }
    }

    fn body(&self) -> serde_json::Value {
        json!({
            "error": self.message,
            "stage": self.stage.map(|stage| stage.to_string()),
        })
    }

    fn unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "server is shutting down".to_string(),
            stage: None,
        }
    }
}

impl From<ProcessError> for ApiError {
    fn from(error: ProcessError) -> Self {
        let status = match error.stage {
            Stage::DocumentLoading => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
            stage: Some(error.stage),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        (self.status, Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env();
    info!(mode = ?config.mode, model = %config.ollama_model, "Loaded configuration");

    let ollama = OllamaClient::new(config.ollama_url.clone(), config.ollama_model.clone());

    // Retry sits under the cache so only fresh calls are retried
    let mut generator: Arc<dyn TextGenerator> = Arc::new(RetryingGenerator::new(
        Arc::new(ollama.clone()),
        RetryPolicy::from_config(&config.retry),
    ));
    let cache = if config.cache.enabled {
        let cache = Arc::new(Cache::new(config.cache.max_entries));
        generator = Arc::new(CachingGenerator::new(generator, cache.clone()));
        Some(cache)
    } else {
        None
    };

    let processor = Arc::new(Processor::new(generator, config.processor.clone()));
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState {
        processor,
        ollama,
        metrics: Metrics::new(),
        cache,
        limiter: Arc::new(Semaphore::new(config.concurrency.max_concurrent_requests.max(1))),
        config,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_check).post(health_check))
        .route("/process", post(process))
        .route("/process/stream", post(process_stream))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, ollama) = match state.ollama.health().await {
        Ok(()) => ("ok", "ok".to_string()),
        Err(e) => ("degraded", format!("error: {:#}", e)),
    };

    Json(HealthResponse {
        status: status.to_string(),
        mode: state.config.mode,
        model: state.ollama.model().to_string(),
        ollama,
    })
}

async fn process(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AgenticRagRequest>,
) -> Result<Json<AgenticRagResponse>, ApiError> {
    run_process(state, request).await.map(Json)
}

/// Emits a single `response` or `error` event, then ends the stream.
async fn process_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AgenticRagRequest>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = ReceiverStream::new(spawn_process(state, request)).map(|result| match result {
        Ok(response) => Event::default().event("response").json_data(&response),
        Err(error) => Event::default().event("error").json_data(error.body()),
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Run the request on its own task. The task keeps its permit until the
/// processor finishes, even if the receiver is dropped.
fn spawn_process(
    state: Arc<AppState>,
    request: AgenticRagRequest,
) -> mpsc::Receiver<Result<AgenticRagResponse, ApiError>> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let result = run_process(state, request).await;
        if tx.send(result).await.is_err() {
            debug!("stream client went away before the response was ready");
        }
    });

    rx
}

/// One request under the concurrency limit and timeout, in a `request_id` span.
async fn run_process(
    state: Arc<AppState>,
    request: AgenticRagRequest,
) -> Result<AgenticRagResponse, ApiError> {
    let span = tracing::info_span!("process", request_id = %Uuid::new_v4());

    async move {
        let _permit = state.limiter.acquire().await.map_err(|_| ApiError::unavailable())?;
        let timeout_secs = state.config.concurrency.request_timeout_secs;
        let timer = TimedOperation::start();

        let outcome = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            state.processor.process(request),
        )
        .await;

        match outcome {
            Ok(Ok(response)) => {
                state.metrics.record_request(true);
                state.metrics.record_process(timer.elapsed(), &response.processing_metadata);
                info!(
                    chunks = response.relevant_chunks.len(),
                    model_calls = response.processing_metadata.model_calls,
                    "Request processed"
                );
                Ok(response)
            }
            Ok(Err(e)) => {
                state.metrics.record_request(false);
                warn!(stage = %e.stage, error = %e, "Request failed");
                Err(e.into())
            }
            Err(_) => {
                state.metrics.record_timeout();
                warn!(timeout_secs, "Request timed out");
                Err(ApiError::timeout(timeout_secs))
            }
        }
    }
    .instrument(span)
    .await
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        requests: state.metrics.snapshot(),
        cache: state.cache.as_ref().map(|cache| cache.stats()),
    })
}
