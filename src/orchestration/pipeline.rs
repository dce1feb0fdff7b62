// Single-item extraction pipeline: decode, binarize, validate, extract,
// filter. The unit of work both endpoints are built from.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::core::errors::PipelineResult;
use crate::core::types::{ImageSource, SingleExtraction};
use crate::services::engine::{CalibratedImage, ExtractionEngine};
use crate::services::{features, preprocess};

/// Isotropic spacing attached to both grids so the engine interprets
/// them as physical 2D images.
const PIXEL_SPACING: (f64, f64) = (1.0, 1.0);

/// Stateless composition of the preprocessing, validation, extraction
/// and filtering stages around the shared engine instance.
pub struct ExtractionPipeline {
    engine: Arc<ExtractionEngine>,
}

impl ExtractionPipeline {
    pub fn new(engine: Arc<ExtractionEngine>) -> Self {
        Self { engine }
    }

    /// Run the full pipeline for one image/mask pair.
    ///
    /// Fails fast: the first stage error propagates and no partial
    /// result is produced. Synchronous and CPU-bound; callers running
    /// inside the async runtime should move this onto the blocking pool.
    #[instrument(skip(self, image_source, mask_source))]
    pub fn extract_single(
        &self,
        image_source: &ImageSource,
        mask_source: &ImageSource,
    ) -> PipelineResult<SingleExtraction> {
        let image = preprocess::load_intensity_grid(image_source)?;
        let mask = preprocess::load_binary_mask(mask_source)?;
        let roi_pixel_count = preprocess::validate_pair(&image, &mask)?;
        let image_shape = image.dim();

        debug!(
            image = %image_source.describe(),
            mask = %mask_source.describe(),
            ?image_shape,
            roi_pixel_count,
            "pair validated, invoking engine"
        );

        let calibrated_image = CalibratedImage::new(image, PIXEL_SPACING);
        let calibrated_mask = CalibratedImage::new(mask, PIXEL_SPACING);
        let raw = self.engine.execute(&calibrated_image, &calibrated_mask)?;
        let features = features::filter_features(raw);

        Ok(SingleExtraction {
            image_shape,
            roi_pixel_count,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::PipelineError;
    use crate::core::types::FeatureValue;
    use crate::services::engine::settings::EngineSettings;
    use image::{ImageFormat, Luma};
    use ndarray::Array2;
    use std::io::Cursor;

    fn png_from(grid: &Array2<i16>) -> Vec<u8> {
        let (h, w) = grid.dim();
        let mut img = image::GrayImage::new(w as u32, h as u32);
        for ((y, x), &v) in grid.indexed_iter() {
            img.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn pipeline() -> ExtractionPipeline {
        ExtractionPipeline::new(Arc::new(ExtractionEngine::with_settings(
            EngineSettings::default(),
        )))
    }

    fn ramp_image() -> Vec<u8> {
        png_from(&Array2::from_shape_fn((64, 64), |(y, x)| {
            ((y * 4 + x) % 256) as i16
        }))
    }

    fn square_mask() -> Vec<u8> {
        png_from(&Array2::from_shape_fn((64, 64), |(y, x)| {
            if (20..30).contains(&y) && (20..30).contains(&x) {
                255
            } else {
                0
            }
        }))
    }

    #[test]
    fn extracts_features_for_valid_pair() {
        let result = pipeline()
            .extract_single(
                &ImageSource::Memory(ramp_image()),
                &ImageSource::Memory(square_mask()),
            )
            .unwrap();

        assert_eq!(result.image_shape, (64, 64));
        assert_eq!(result.roi_pixel_count, 100);
        for tag in ["shape2D", "firstorder", "glcm", "glrlm", "glszm", "ngtdm", "gldm"] {
            assert!(
                result.features.keys().any(|k| k.contains(tag)),
                "missing family {tag}"
            );
        }
        assert!(result
            .features
            .values()
            .all(|v| matches!(v, FeatureValue::Scalar(_) | FeatureValue::List(_))));
    }

    #[test]
    fn repeated_extraction_is_identical() {
        let pipeline = pipeline();
        let image = ImageSource::Memory(ramp_image());
        let mask = ImageSource::Memory(square_mask());

        let first = pipeline.extract_single(&image, &mask).unwrap();
        let second = pipeline.extract_single(&image, &mask).unwrap();
        assert_eq!(first.features, second.features);
        assert_eq!(first.roi_pixel_count, second.roi_pixel_count);
    }

    #[test]
    fn shape_mismatch_propagates_with_both_shapes() {
        let small_mask = png_from(&Array2::from_elem((32, 32), 1i16));
        let err = pipeline()
            .extract_single(
                &ImageSource::Memory(ramp_image()),
                &ImageSource::Memory(small_mask),
            )
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        let msg = err.to_string();
        assert!(msg.contains("(64, 64)"));
        assert!(msg.contains("(32, 32)"));
    }

    #[test]
    fn empty_mask_propagates_empty_roi() {
        let empty_mask = png_from(&Array2::zeros((64, 64)));
        let err = pipeline()
            .extract_single(
                &ImageSource::Memory(ramp_image()),
                &ImageSource::Memory(empty_mask),
            )
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn corrupt_image_propagates_preprocess_error() {
        let err = pipeline()
            .extract_single(
                &ImageSource::Memory(vec![0xde, 0xad]),
                &ImageSource::Memory(square_mask()),
            )
            .unwrap_err();

        assert!(matches!(err, PipelineError::Preprocess(_)));
        assert!(err.is_client_error());
    }
}
