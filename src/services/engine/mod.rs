// Radiomic feature computation engine.
//
// The engine is constructed once at startup from a settings file and is
// read-only afterwards, so a single instance can serve concurrent
// extractions. It consumes calibrated grids and returns a raw named-value
// mapping; filtering and transport normalization happen downstream.

pub mod settings;

mod firstorder;
mod gldm;
mod glcm;
mod glrlm;
mod glszm;
mod ngtdm;
mod shape2d;

use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::errors::{EngineInitError, ExtractionError};
use crate::services::preprocess::IntensityGrid;

pub use settings::{EngineSettings, FeatureClass};

/// An intensity or mask grid annotated with physical pixel spacing.
/// The engine refuses to interpret a bare array as an image.
#[derive(Debug, Clone)]
pub struct CalibratedImage {
    data: IntensityGrid,
    spacing: (f64, f64),
}

impl CalibratedImage {
    pub fn new(data: IntensityGrid, spacing: (f64, f64)) -> Self {
        Self { data, spacing }
    }

    pub fn data(&self) -> &IntensityGrid {
        &self.data
    }

    pub fn spacing(&self) -> (f64, f64) {
        self.spacing
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Engine-native result value. `Vector` carries an ndarray handle and
/// `Text` carries diagnostic strings; neither may cross the service
/// boundary without normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(f64),
    Vector(Array1<f64>),
    Text(String),
}

/// Raw named-value mapping produced by one extraction call.
pub type RawFeatureMap = BTreeMap<String, RawValue>;

/// View of the masked region handed to the feature-class modules.
pub(crate) struct RoiView<'a> {
    /// Binary indicator grid, 1 inside the ROI
    pub mask: &'a Array2<i16>,
    /// Gray levels 1..=levels inside the ROI, 0 outside
    pub quantized: &'a Array2<usize>,
    pub levels: usize,
    /// Raw intensities of the ROI pixels, grid iteration order
    pub intensities: &'a [f64],
    pub spacing: (f64, f64),
}

/// The process-wide feature extraction engine.
pub struct ExtractionEngine {
    settings: EngineSettings,
}

impl ExtractionEngine {
    pub fn from_settings_file(path: &Path) -> Result<Self, EngineInitError> {
        let settings = EngineSettings::from_file(path)?;
        Ok(Self { settings })
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Compute all enabled feature classes over the masked region.
    ///
    /// The mask is interpreted against the configured ROI label. Input
    /// defects at this level (shape disagreement, empty ROI) are engine
    /// errors: callers are expected to have validated already.
    pub fn execute(
        &self,
        image: &CalibratedImage,
        mask: &CalibratedImage,
    ) -> Result<RawFeatureMap, ExtractionError> {
        if image.shape() != mask.shape() {
            return Err(ExtractionError::InvalidInput(format!(
                "image {:?} and mask {:?} disagree in shape",
                image.shape(),
                mask.shape()
            )));
        }

        let label = self.settings.setting.roi_label;
        let roi_mask = mask.data().mapv(|v| i16::from(v == label));
        let intensities: Vec<f64> = image
            .data()
            .iter()
            .zip(roi_mask.iter())
            .filter(|(_, &m)| m == 1)
            .map(|(&v, _)| f64::from(v))
            .collect();

        if intensities.is_empty() {
            return Err(ExtractionError::InvalidInput(format!(
                "mask has no pixels with label {label}"
            )));
        }

        let (quantized, levels) =
            quantize(image.data(), &roi_mask, self.settings.setting.bin_width);

        let view = RoiView {
            mask: &roi_mask,
            quantized: &quantized,
            levels,
            intensities: &intensities,
            spacing: image.spacing(),
        };

        let mut out = RawFeatureMap::new();
        self.insert_diagnostics(&mut out, image, intensities.len());

        for class in &self.settings.feature_classes {
            let features = match class {
                FeatureClass::Shape2D => shape2d::features(&view),
                FeatureClass::FirstOrder => firstorder::features(&view),
                FeatureClass::Glcm => glcm::features(&view),
                FeatureClass::Glrlm => glrlm::features(&view),
                FeatureClass::Glszm => glszm::features(&view),
                FeatureClass::Ngtdm => ngtdm::features(&view),
                FeatureClass::Gldm => gldm::features(&view),
            };
            for (name, value) in features {
                out.insert(
                    format!("original_{}_{}", class.tag(), name),
                    RawValue::Scalar(value),
                );
            }
        }

        Ok(out)
    }

    fn insert_diagnostics(
        &self,
        out: &mut RawFeatureMap,
        image: &CalibratedImage,
        roi_pixel_count: usize,
    ) {
        let (h, w) = image.shape();
        let (sx, sy) = image.spacing();
        out.insert(
            "diagnostics_Versions_Engine".to_string(),
            RawValue::Text(env!("CARGO_PKG_VERSION").to_string()),
        );
        out.insert(
            "diagnostics_Configuration_BinWidth".to_string(),
            RawValue::Scalar(self.settings.setting.bin_width),
        );
        out.insert(
            "diagnostics_Image-original_Spacing".to_string(),
            RawValue::Vector(Array1::from(vec![sx, sy])),
        );
        out.insert(
            "diagnostics_Image-original_Size".to_string(),
            RawValue::Vector(Array1::from(vec![w as f64, h as f64])),
        );
        out.insert(
            "diagnostics_Mask-original_VoxelNum".to_string(),
            RawValue::Scalar(roi_pixel_count as f64),
        );
    }
}

/// Quantize ROI intensities into gray levels 1..=n by fixed bin width.
/// Cells outside the ROI are 0.
fn quantize(
    image: &IntensityGrid,
    roi_mask: &Array2<i16>,
    bin_width: f64,
) -> (Array2<usize>, usize) {
    let min = image
        .iter()
        .zip(roi_mask.iter())
        .filter(|(_, &m)| m == 1)
        .map(|(&v, _)| f64::from(v))
        .fold(f64::INFINITY, f64::min);

    let mut levels = 0usize;
    let quantized = Array2::from_shape_fn(image.dim(), |idx| {
        if roi_mask[idx] != 1 {
            return 0;
        }
        let level = ((f64::from(image[idx]) - min) / bin_width).floor() as usize + 1;
        levels = levels.max(level);
        level
    });

    (quantized, levels)
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use ndarray::Array2;

    /// 64x64 ramp image with a 10x10 square ROI, the canonical pair used
    /// across engine tests.
    pub fn ramp_with_square_roi() -> (CalibratedImage, CalibratedImage) {
        let image = Array2::from_shape_fn((64, 64), |(y, x)| ((y * 4 + x) % 256) as i16);
        let mask = Array2::from_shape_fn((64, 64), |(y, x)| {
            i16::from((20..30).contains(&y) && (20..30).contains(&x))
        });
        (
            CalibratedImage::new(image, (1.0, 1.0)),
            CalibratedImage::new(mask, (1.0, 1.0)),
        )
    }

    pub fn view_of<'a>(
        roi_mask: &'a Array2<i16>,
        quantized: &'a Array2<usize>,
        levels: usize,
        intensities: &'a [f64],
    ) -> RoiView<'a> {
        RoiView {
            mask: roi_mask,
            quantized,
            levels,
            intensities,
            spacing: (1.0, 1.0),
        }
    }
}
