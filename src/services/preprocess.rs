// Image and mask preprocessing: decode, grayscale collapse, binarization,
// and the consistency checks that gate the feature engine.

use image::DynamicImage;
use ndarray::Array2;
use std::path::Path;

use crate::core::errors::{PreprocessError, ValidationError};
use crate::core::types::ImageSource;

/// Grayscale sample grid, shape (height, width).
///
/// Samples are widened to i16 so mask arithmetic can rely on signed
/// zero/non-zero comparisons across the full 8-bit luma range.
pub type IntensityGrid = Array2<i16>;

fn decode(source: &ImageSource) -> Result<DynamicImage, PreprocessError> {
    match source {
        ImageSource::Path(path) => Ok(image::open(path)?),
        ImageSource::Memory(bytes) => Ok(image::load_from_memory(bytes)?),
    }
}

fn to_grid(img: &DynamicImage) -> IntensityGrid {
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    let samples = luma.as_raw();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        samples[y * width as usize + x] as i16
    })
}

/// Decode a source into a single-channel intensity grid. Color inputs
/// are collapsed to grayscale; no resizing or resampling happens here.
pub fn load_intensity_grid(source: &ImageSource) -> Result<IntensityGrid, PreprocessError> {
    Ok(to_grid(&decode(source)?))
}

/// Decode a source through the same path as [`load_intensity_grid`],
/// then threshold every originally-positive sample to 1.
pub fn load_binary_mask(source: &ImageSource) -> Result<IntensityGrid, PreprocessError> {
    Ok(binarize(&to_grid(&decode(source)?)))
}

/// Elementwise `v > 0 -> 1 else 0`. Idempotent on already-binary grids.
pub fn binarize(grid: &IntensityGrid) -> IntensityGrid {
    grid.mapv(|v| i16::from(v > 0))
}

/// Verify that an image/mask pair is extractable: identical shapes and a
/// non-empty ROI. Returns the ROI pixel count on success.
///
/// Runs before the engine is invoked so failures carry explicit,
/// distinguishable messages instead of whatever the engine would emit.
pub fn validate_pair(
    image: &IntensityGrid,
    mask: &IntensityGrid,
) -> Result<usize, ValidationError> {
    if image.dim() != mask.dim() {
        return Err(ValidationError::ShapeMismatch {
            image: image.dim(),
            mask: mask.dim(),
        });
    }

    let roi_pixel_count = mask.iter().filter(|&&v| v > 0).count();
    if roi_pixel_count == 0 {
        return Err(ValidationError::EmptyRoi);
    }

    Ok(roi_pixel_count)
}

/// Resolve a client-supplied batch path, enforcing the optional sandbox
/// root. Canonicalization also rejects paths that do not exist, which
/// surfaces as an ordinary preprocessing failure for that item.
pub fn resolve_batch_path(
    raw: &str,
    batch_root: Option<&Path>,
) -> Result<ImageSource, PreprocessError> {
    let Some(root) = batch_root else {
        return Ok(ImageSource::Path(raw.into()));
    };

    let resolved = Path::new(raw)
        .canonicalize()
        .map_err(|source| PreprocessError::Read {
            path: raw.to_string(),
            source,
        })?;

    if !resolved.starts_with(root) {
        return Err(PreprocessError::OutsideBatchRoot(raw.to_string()));
    }

    Ok(ImageSource::Path(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma};
    use ndarray::array;
    use std::io::Cursor;

    fn encode_gray_png(pixels: &IntensityGrid) -> Vec<u8> {
        let (h, w) = pixels.dim();
        let mut img = image::GrayImage::new(w as u32, h as u32);
        for ((y, x), &v) in pixels.indexed_iter() {
            img.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_grayscale_png_to_grid() {
        let grid = array![[0i16, 128], [255, 7]];
        let png = encode_gray_png(&grid);

        let decoded = load_intensity_grid(&ImageSource::Memory(png)).unwrap();
        assert_eq!(decoded, grid);
    }

    #[test]
    fn corrupt_bytes_fail_as_preprocess_error() {
        let result = load_intensity_grid(&ImageSource::Memory(vec![1, 2, 3, 4]));
        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }

    #[test]
    fn missing_path_fails_as_preprocess_error() {
        let result =
            load_intensity_grid(&ImageSource::Path("/no/such/file.png".into()));
        assert!(result.is_err());
    }

    #[test]
    fn binarize_thresholds_positive_values() {
        let grid = array![[0i16, 1], [200, 0]];
        assert_eq!(binarize(&grid), array![[0i16, 1], [1, 0]]);
    }

    #[test]
    fn binarize_is_idempotent() {
        let grid = array![[0i16, 37], [255, 0]];
        let once = binarize(&grid);
        assert_eq!(binarize(&once), once);
    }

    #[test]
    fn mask_loading_binarizes() {
        let grid = array![[0i16, 9], [255, 0]];
        let png = encode_gray_png(&grid);
        let mask = load_binary_mask(&ImageSource::Memory(png)).unwrap();
        assert_eq!(mask, array![[0i16, 1], [1, 0]]);
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        let image = Array2::<i16>::zeros((64, 64));
        let mask = Array2::<i16>::ones((32, 32));
        let err = validate_pair(&image, &mask).unwrap_err();
        assert!(err.to_string().contains("(64, 64)"));
        assert!(err.to_string().contains("(32, 32)"));
    }

    #[test]
    fn validate_rejects_empty_roi() {
        let image = Array2::<i16>::zeros((8, 8));
        let mask = Array2::<i16>::zeros((8, 8));
        assert!(matches!(
            validate_pair(&image, &mask),
            Err(ValidationError::EmptyRoi)
        ));
    }

    #[test]
    fn validate_counts_roi_pixels() {
        let image = Array2::<i16>::zeros((8, 8));
        let mut mask = Array2::<i16>::zeros((8, 8));
        mask[[1, 1]] = 1;
        mask[[2, 3]] = 1;
        assert_eq!(validate_pair(&image, &mask).unwrap(), 2);
    }

    #[test]
    fn batch_path_passes_through_without_root() {
        let source = resolve_batch_path("anything.png", None).unwrap();
        assert!(matches!(source, ImageSource::Path(_)));
    }

    #[test]
    fn batch_path_outside_root_is_rejected() {
        let root = std::env::temp_dir().canonicalize().unwrap();
        let result = resolve_batch_path("/etc/hostname", Some(&root));
        assert!(matches!(
            result,
            Err(PreprocessError::OutsideBatchRoot(_)) | Err(PreprocessError::Read { .. })
        ));
    }
}
