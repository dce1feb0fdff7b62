// Engine settings file handling. The YAML schema is owned by the engine:
// the service just passes a path through from its own configuration.

use serde::Deserialize;
use std::path::Path;

use crate::core::errors::EngineInitError;

/// Feature classes the engine knows how to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FeatureClass {
    #[serde(rename = "shape2D")]
    Shape2D,
    #[serde(rename = "firstorder")]
    FirstOrder,
    #[serde(rename = "glcm")]
    Glcm,
    #[serde(rename = "glrlm")]
    Glrlm,
    #[serde(rename = "glszm")]
    Glszm,
    #[serde(rename = "ngtdm")]
    Ngtdm,
    #[serde(rename = "gldm")]
    Gldm,
}

impl FeatureClass {
    /// The family tag used in emitted feature names
    /// (`original_<tag>_<Name>`).
    pub fn tag(&self) -> &'static str {
        match self {
            FeatureClass::Shape2D => "shape2D",
            FeatureClass::FirstOrder => "firstorder",
            FeatureClass::Glcm => "glcm",
            FeatureClass::Glrlm => "glrlm",
            FeatureClass::Glszm => "glszm",
            FeatureClass::Ngtdm => "ngtdm",
            FeatureClass::Gldm => "gldm",
        }
    }

    pub fn all() -> Vec<FeatureClass> {
        vec![
            FeatureClass::Shape2D,
            FeatureClass::FirstOrder,
            FeatureClass::Glcm,
            FeatureClass::Glrlm,
            FeatureClass::Glszm,
            FeatureClass::Ngtdm,
            FeatureClass::Gldm,
        ]
    }
}

/// Scalar acquisition settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionSettings {
    /// Intensity bin width used for gray-level quantization
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,
    /// Mask value identifying the ROI
    #[serde(default = "default_roi_label")]
    pub roi_label: i16,
}

fn default_bin_width() -> f64 {
    25.0
}

fn default_roi_label() -> i16 {
    1
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            bin_width: default_bin_width(),
            roi_label: default_roi_label(),
        }
    }
}

/// Parsed engine settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    #[serde(default)]
    pub setting: AcquisitionSettings,
    #[serde(default = "FeatureClass::all")]
    pub feature_classes: Vec<FeatureClass>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            setting: AcquisitionSettings::default(),
            feature_classes: FeatureClass::all(),
        }
    }
}

impl EngineSettings {
    pub fn from_file(path: &Path) -> Result<Self, EngineInitError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                EngineInitError::SettingsMissing(path.display().to_string())
            } else {
                EngineInitError::SettingsRead {
                    path: path.display().to_string(),
                    source,
                }
            }
        })?;

        let settings: EngineSettings = serde_yaml::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), EngineInitError> {
        if !self.setting.bin_width.is_finite() || self.setting.bin_width <= 0.0 {
            return Err(EngineInitError::InvalidSettings(format!(
                "binWidth must be a positive number, got {}",
                self.setting.bin_width
            )));
        }
        if self.feature_classes.is_empty() {
            return Err(EngineInitError::InvalidSettings(
                "featureClasses must name at least one class".to_string(),
            ));
        }
        Ok(())
    }

    pub fn enables(&self, class: FeatureClass) -> bool {
        self.feature_classes.contains(&class)
    }
}
