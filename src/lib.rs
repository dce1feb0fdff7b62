// Library exports for the radiomic feature extraction backend

// Core modules
pub mod core;
pub mod orchestration;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use crate::core::{
    config::Config,
    errors::{
        ConfigError, EngineInitError, ExtractionError, PipelineError, PreprocessError,
        ValidationError,
    },
    types::{
        BatchItemResult, BatchSummary, FeatureMap, FeatureValue, ImageMaskPair,
        ImageSource, SingleExtraction,
    },
};

pub use crate::orchestration::{BatchOrchestrator, ExtractionPipeline};

pub use crate::services::{engine::ExtractionEngine, CalibratedImage, IntensityGrid};

pub use crate::utils::Metrics;
