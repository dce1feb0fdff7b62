// Main entry point for the radiomic feature extraction API

use radiomics_backend::{
    core::{types::*, Config},
    orchestration::{BatchOrchestrator, ExtractionPipeline},
    services::engine::ExtractionEngine,
    utils::Metrics,
    PipelineError,
};

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// The extraction stack behind every feature endpoint. Absent when the
/// engine failed to initialize at startup.
#[derive(Clone)]
struct ExtractionTool {
    pipeline: Arc<ExtractionPipeline>,
    orchestrator: Arc<BatchOrchestrator>,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    tool: Option<ExtractionTool>,
    metrics: Metrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::new().expect("Failed to load configuration"));

    // Initialize logging
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new(format!(
        "radiomics_backend={}",
        match config.log_level() {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        }
    ));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== RADIOMIC FEATURE EXTRACTION API ===");
    info!(
        "Config: settings={} concurrency={} batch_root={}",
        config.engine_settings_path().display(),
        config.max_concurrent_extractions(),
        config
            .batch_root()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unrestricted".to_string()),
    );

    // Build the engine once; a failure leaves the service running with
    // every extraction endpoint failing fast.
    let tool = match ExtractionEngine::from_settings_file(config.engine_settings_path()) {
        Ok(engine) => {
            info!("✓ Extraction engine initialized");
            let pipeline = Arc::new(ExtractionPipeline::new(Arc::new(engine)));
            let orchestrator = Arc::new(BatchOrchestrator::new(
                Arc::clone(&pipeline),
                &config,
            ));
            Some(ExtractionTool {
                pipeline,
                orchestrator,
            })
        }
        Err(e) => {
            error!("Extraction engine initialization failed: {}", e);
            None
        }
    };

    let state = AppState {
        tool,
        metrics: Metrics::new(),
    };

    // Setup CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/stats", get(stats_endpoint))
        .route("/extract-single", post(extract_single))
        .route("/extract-batch", post(extract_batch))
        .with_state(state)
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024)) // 50MB for large images
        .layer(cors);

    let addr = format!("{}:{}", config.server_host(), config.server_port());
    info!("Server starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /               - Health check");
    info!("  GET  /stats          - Service statistics");
    info!("  POST /extract-single - Extract features (multipart/form-data)");
    info!("  POST /extract-batch  - Batch extraction (JSON path pairs)");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Error payload shape shared by every non-2xx response: `{detail: ...}`.
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }

    fn not_initialized() -> Self {
        Self::internal("extraction engine is not initialized")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.is_client_error() {
            ApiError::bad_request(err.to_string())
        } else {
            ApiError::internal(format!("processing failed: {err}"))
        }
    }
}

/// Health check endpoint
async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "tool_initialized": state.tool.is_some(),
    }))
}

/// Service statistics endpoint (JSON)
async fn stats_endpoint(
    State(state): State<AppState>,
) -> Json<radiomics_backend::utils::metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Extract features for one uploaded image/mask pair
///
/// # Request Format:
/// - multipart/form-data
/// - Field "image_file": the 2D image (PNG/JPG)
/// - Field "mask_file": the ROI mask (PNG/JPG, ROI is any non-zero pixel)
async fn extract_single(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.metrics.record_single_request();

    let tool = state.tool.as_ref().ok_or_else(ApiError::not_initialized)?;

    let mut image_bytes: Option<Vec<u8>> = None;
    let mut mask_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read field {name}: {e}")))?;

        match name.as_str() {
            "image_file" => image_bytes = Some(data.to_vec()),
            "mask_file" => mask_bytes = Some(data.to_vec()),
            _ => {}
        }
    }

    let image_bytes =
        image_bytes.ok_or_else(|| ApiError::bad_request("missing file field: image_file"))?;
    let mask_bytes =
        mask_bytes.ok_or_else(|| ApiError::bad_request("missing file field: mask_file"))?;

    info!(
        "Received extract-single request ({} image bytes, {} mask bytes)",
        image_bytes.len(),
        mask_bytes.len()
    );

    let pipeline = Arc::clone(&tool.pipeline);
    let start_time = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        pipeline.extract_single(
            &ImageSource::Memory(image_bytes),
            &ImageSource::Memory(mask_bytes),
        )
    })
    .await
    .map_err(|e| ApiError::internal(format!("extraction task panicked: {e}")))?;

    state
        .metrics
        .record_extraction(result.is_ok(), start_time.elapsed());

    let extraction = result.map_err(|e| {
        warn!("extract-single failed: {}", e);
        ApiError::from(e)
    })?;

    let (height, width) = extraction.image_shape;
    info!(
        "extract-single complete in {:.2}ms: {} features over {} ROI pixels",
        start_time.elapsed().as_secs_f64() * 1000.0,
        extraction.features.len(),
        extraction.roi_pixel_count
    );

    Ok(Json(serde_json::json!({
        "status": "success",
        "image_info": { "size": format!("{height}×{width}") },
        "roi_info": { "pixel_count": extraction.roi_pixel_count },
        "features": extraction.features,
    })))
}

/// Batch extraction over local path pairs
///
/// # Request Format:
/// - JSON body: `[["image1.png", "mask1.png"], ["image2.png", "mask2.png"]]`
///
/// Structural validation happens at deserialization: any element that is
/// not exactly a pair of strings is rejected with 400 before the batch
/// starts.
async fn extract_batch(
    State(state): State<AppState>,
    payload: Result<Json<Vec<ImageMaskPair>>, JsonRejection>,
) -> Result<Json<BatchSummary>, ApiError> {
    state.metrics.record_batch_request();

    let Json(pairs) = payload.map_err(|rejection| {
        ApiError::bad_request(format!(
            "invalid batch payload, expected [[image_path, mask_path], ...]: {rejection}"
        ))
    })?;

    let tool = state.tool.as_ref().ok_or_else(ApiError::not_initialized)?;

    info!("Received extract-batch request with {} pairs", pairs.len());

    let start_time = Instant::now();
    let results = tool.orchestrator.process_batch(pairs).await;

    if !results.is_empty() {
        let per_item = start_time.elapsed() / results.len() as u32;
        for item in &results {
            state.metrics.record_extraction(item.is_success(), per_item);
        }
    }

    let summary = BatchSummary::from_results(results);
    info!(
        "extract-batch complete in {:.2}s: {}/{} succeeded",
        start_time.elapsed().as_secs_f64(),
        summary.success_count,
        summary.total
    );

    Ok(Json(summary))
}
