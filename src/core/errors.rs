// Custom error types for better error handling and debugging
//
// Using thiserror for ergonomic error definitions with:
// - Context preservation
// - Type-safe error matching
// - Automatic Display/Error trait implementations
// - Source error chaining

use thiserror::Error;

/// Image/mask preprocessing errors (decode stage).
///
/// These are client-caused (bad upload, bad path) and map to HTTP 400,
/// unlike [`ExtractionError`] which maps to 500.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("path escapes the configured batch root: {0}")]
    OutsideBatchRoot(String),
}

/// Image/mask consistency validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("image/mask shape mismatch: image {image:?} vs mask {mask:?}")]
    ShapeMismatch {
        image: (usize, usize),
        mask: (usize, usize),
    },

    #[error("mask contains no positive ROI pixels")]
    EmptyRoi,
}

/// Feature engine invocation errors.
///
/// Not retried: extraction is deterministic, so retrying with identical
/// input cannot change the outcome.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("engine rejected calibrated input: {0}")]
    InvalidInput(String),

    #[error("feature computation failed: {0}")]
    Computation(String),
}

/// Engine construction errors (startup only).
///
/// The process keeps running after one of these; extraction endpoints
/// fail fast with a "not initialized" response instead.
#[derive(Debug, Error)]
pub enum EngineInitError {
    #[error("engine settings file not found: {0}")]
    SettingsMissing(String),

    #[error("failed to read engine settings {path}: {source}")]
    SettingsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse engine settings: {0}")]
    SettingsParse(#[from] serde_yaml::Error),

    #[error("invalid engine settings: {0}")]
    InvalidSettings(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server config: {0}")]
    InvalidServerConfig(String),

    #[error("extraction concurrency must be > 0, got {0}")]
    InvalidConcurrency(usize),

    #[error("batch root does not exist: {0}")]
    InvalidBatchRoot(String),

    #[error("environment variable parsing failed: {0}")]
    EnvVarError(String),
}

/// Single-item pipeline errors: the tagged union every stage failure
/// propagates through. The HTTP facade maps the stage to a status code.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("feature extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

impl PipelineError {
    /// Whether the failure was caused by client input (decode or
    /// validation) as opposed to an engine-side defect.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Preprocess(_) | PipelineError::Validation(_)
        )
    }
}

// Convenience type aliases for Results
pub type PreprocessResult<T> = Result<T, PreprocessError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ExtractionResult<T> = Result<T, ExtractionError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
