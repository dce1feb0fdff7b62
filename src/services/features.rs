// Feature post-processing: family whitelist filtering and normalization
// of engine-native values into transport-safe numerics.

use crate::core::types::{FeatureMap, FeatureValue};
use crate::services::engine::{RawFeatureMap, RawValue};

/// The feature families kept at the service boundary. Keys are matched
/// by exact segment membership, not substring scanning, so a family tag
/// can never match accidentally inside another token.
pub const FEATURE_FAMILY_TAGS: [&str; 7] = [
    "shape2D",
    "firstorder",
    "glcm",
    "glrlm",
    "glszm",
    "ngtdm",
    "gldm",
];

/// Whether a raw feature key belongs to a whitelisted family.
pub fn is_whitelisted(key: &str) -> bool {
    key.split('_')
        .any(|segment| FEATURE_FAMILY_TAGS.contains(&segment))
}

/// Coerce an engine-native value into its transport form. Closed set of
/// cases: numeric scalar, sequence of numerics, pass-through.
pub fn normalize_value(raw: RawValue) -> FeatureValue {
    match raw {
        RawValue::Scalar(v) => FeatureValue::Scalar(v),
        RawValue::Vector(values) => FeatureValue::List(values.to_vec()),
        RawValue::Text(text) => FeatureValue::Text(text),
    }
}

/// Reduce a raw engine mapping to the whitelisted families with every
/// value normalized. Never fails: the input is the engine's own output.
pub fn filter_features(raw: RawFeatureMap) -> FeatureMap {
    raw.into_iter()
        .filter(|(key, _)| is_whitelisted(key))
        .map(|(key, value)| (key, normalize_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn family_tags_are_whitelisted() {
        assert!(is_whitelisted("original_firstorder_Mean"));
        assert!(is_whitelisted("original_glcm_Contrast"));
        assert!(is_whitelisted("original_shape2D_Perimeter"));
    }

    #[test]
    fn diagnostics_keys_are_dropped() {
        assert!(!is_whitelisted("diagnostics_Versions_Engine"));
        assert!(!is_whitelisted("diagnostics_Image-original_Spacing"));
    }

    #[test]
    fn tags_do_not_match_inside_other_tokens() {
        // A substring scan would keep this one
        assert!(!is_whitelisted("original_glcmlike_Contrast"));
    }

    #[test]
    fn normalizes_scalar() {
        assert_eq!(
            normalize_value(RawValue::Scalar(3.5)),
            FeatureValue::Scalar(3.5)
        );
    }

    #[test]
    fn normalizes_sequence_elementwise() {
        let raw = RawValue::Vector(Array1::from(vec![1.0, 2.0, 3.0]));
        assert_eq!(
            normalize_value(raw),
            FeatureValue::List(vec![1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn passes_text_through_unchanged() {
        assert_eq!(
            normalize_value(RawValue::Text("v0.1.0".into())),
            FeatureValue::Text("v0.1.0".into())
        );
    }

    #[test]
    fn filter_keeps_only_whitelisted_families() {
        let mut raw = RawFeatureMap::new();
        raw.insert(
            "original_firstorder_Mean".into(),
            RawValue::Scalar(12.0),
        );
        raw.insert(
            "original_ngtdm_Coarseness".into(),
            RawValue::Scalar(0.5),
        );
        raw.insert(
            "diagnostics_Image-original_Size".into(),
            RawValue::Vector(Array1::from(vec![64.0, 64.0])),
        );
        raw.insert(
            "diagnostics_Versions_Engine".into(),
            RawValue::Text("0.1.0".into()),
        );

        let filtered = filter_features(raw);
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            filtered["original_firstorder_Mean"],
            FeatureValue::Scalar(12.0)
        );
        assert!(!filtered.contains_key("diagnostics_Versions_Engine"));
    }
}
