pub mod engine;
pub mod features;
pub mod preprocess;

// Re-export commonly used items
pub use engine::{CalibratedImage, ExtractionEngine, RawFeatureMap, RawValue};
pub use preprocess::IntensityGrid;
