// Wire and domain types shared across the extraction workflow

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A raster source for the preprocessing stage: either a local file or
/// the bytes of an uploaded file.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

impl ImageSource {
    /// Human-readable description for log and error messages.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(p) => p.display().to_string(),
            ImageSource::Memory(bytes) => format!("<{} uploaded bytes>", bytes.len()),
        }
    }
}

/// One batch work item: an image path paired with its mask path.
///
/// Deserialized from a 2-element JSON array, so a batch payload whose
/// elements are not exactly two strings is rejected at the boundary
/// before it ever reaches the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMaskPair(pub String, pub String);

impl ImageMaskPair {
    pub fn image_path(&self) -> &str {
        &self.0
    }

    pub fn mask_path(&self) -> &str {
        &self.1
    }
}

/// A feature value in transport form: plain numerics only, no
/// engine-native wrapper types survive to this boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Scalar(f64),
    List(Vec<f64>),
    Text(String),
}

/// Filtered, normalized feature mapping keyed by feature name.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Result of one successful single-item extraction.
#[derive(Debug, Clone, Serialize)]
pub struct SingleExtraction {
    /// (height, width) of the decoded image
    pub image_shape: (usize, usize),
    pub roi_pixel_count: usize,
    pub features: FeatureMap,
}

/// Per-item batch outcome. `index` always equals the item's position in
/// the input sequence; a failed item never disturbs its neighbours.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItemResult {
    Success {
        index: usize,
        image_path: String,
        mask_path: String,
        result: SingleExtraction,
    },
    Failed {
        index: usize,
        image_path: String,
        mask_path: String,
        error: String,
    },
}

impl BatchItemResult {
    pub fn index(&self) -> usize {
        match self {
            BatchItemResult::Success { index, .. } => *index,
            BatchItemResult::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchItemResult::Success { .. })
    }
}

/// Whole-batch response payload.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success_count: usize,
    pub results: Vec<BatchItemResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<BatchItemResult>) -> Self {
        Self {
            total: results.len(),
            success_count: results.iter().filter(|r| r.is_success()).count(),
            results,
        }
    }
}
