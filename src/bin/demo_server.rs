// Standalone demo server: exercises the upload/preprocess pipeline shape
// and returns fabricated feature values, so frontend integration can be
// tested without the extraction engine.

use radiomics_backend::core::types::ImageSource;
use radiomics_backend::services::preprocess;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("radiomics_backend=info,demo_server=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/mock-extract-radiomics", post(mock_extract_radiomics))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(cors);

    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8000);
    let addr = format!("{host}:{port}");

    info!("Radiomics demo server starting on http://{}", addr);
    info!("  POST /mock-extract-radiomics - placeholder feature extraction");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

struct DemoError(String);

impl IntoResponse for DemoError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": self.0 })),
        )
            .into_response()
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "tool_initialized": false,
        "tip": "upload a PNG/JPG image and mask to /mock-extract-radiomics",
    }))
}

/// Placeholder feature values standing in for real engine output.
fn mock_features() -> serde_json::Value {
    serde_json::json!({
        "mean_intensity": 25.68,
        "texture_entropy": 3.21,
        "roi_area": 1256,
        "intensity_stddev": 8.92,
        "texture_contrast": 4.57,
    })
}

/// Decode both uploads through the real preprocessing path, then skip
/// extraction entirely and answer with canned features.
async fn mock_extract_radiomics(
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, DemoError> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut roi_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DemoError(format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| DemoError(format!("failed to read field {name}: {e}")))?;
        match name.as_str() {
            "image_file" => image_bytes = Some(data.to_vec()),
            "roi_file" => roi_bytes = Some(data.to_vec()),
            _ => {}
        }
    }

    let image_bytes =
        image_bytes.ok_or_else(|| DemoError("missing file field: image_file".into()))?;
    let roi_bytes =
        roi_bytes.ok_or_else(|| DemoError("missing file field: roi_file".into()))?;

    let image = preprocess::load_intensity_grid(&ImageSource::Memory(image_bytes))
        .map_err(|e| DemoError(format!("image preprocessing failed: {e}")))?;
    let roi = preprocess::load_binary_mask(&ImageSource::Memory(roi_bytes))
        .map_err(|e| DemoError(format!("mask preprocessing failed: {e}")))?;

    let (height, width) = image.dim();
    let (roi_height, roi_width) = roi.dim();
    let min = image.iter().copied().min().unwrap_or(0);
    let max = image.iter().copied().max().unwrap_or(0);
    let roi_pixel_count = roi.iter().filter(|&&v| v > 0).count();

    info!(
        "mock extraction: image {}x{}, intensity range {}-{}, {} ROI pixels",
        height, width, min, max, roi_pixel_count
    );

    Ok(Json(serde_json::json!({
        "message": "mock feature extraction succeeded (real engine not linked)",
        "image_info": {
            "size": format!("{height}×{width}"),
            "intensity_range": format!("{min}-{max}"),
        },
        "roi_info": {
            "size": format!("{roi_height}×{roi_width}"),
            "pixel_count": roi_pixel_count,
        },
        "extracted_features": mock_features(),
    })))
}
