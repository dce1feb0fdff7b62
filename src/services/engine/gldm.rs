// Gray-level dependence matrix statistics. A pixel's dependence count is
// itself plus the 8-neighbours inside the ROI sharing its gray level.

use ndarray::Array2;

use super::RoiView;

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) fn features(view: &RoiView) -> Vec<(&'static str, f64)> {
    let matrix = dependence_matrix(view);
    let nz: f64 = matrix.iter().sum();

    if nz == 0.0 {
        return vec![
            ("SmallDependenceEmphasis", 0.0),
            ("LargeDependenceEmphasis", 0.0),
            ("DependenceNonUniformity", 0.0),
            ("DependenceEntropy", 0.0),
        ];
    }

    let mut sde = 0.0;
    let mut lde = 0.0;
    let mut entropy = 0.0;
    for ((_, j), &count) in matrix.indexed_iter() {
        if count == 0.0 {
            continue;
        }
        let dependence = (j + 1) as f64;
        sde += count / (dependence * dependence);
        lde += count * dependence * dependence;
        let p = count / nz;
        entropy -= p * p.log2();
    }

    let mut dnu = 0.0;
    for col in matrix.columns() {
        let col_sum: f64 = col.sum();
        dnu += col_sum * col_sum;
    }

    vec![
        ("SmallDependenceEmphasis", sde / nz),
        ("LargeDependenceEmphasis", lde / nz),
        ("DependenceNonUniformity", dnu / nz),
        ("DependenceEntropy", entropy),
    ]
}

/// Matrix indexed by (gray level - 1, dependence count - 1). Every ROI
/// pixel contributes exactly one entry, so the matrix total equals the
/// ROI pixel count.
fn dependence_matrix(view: &RoiView) -> Array2<f64> {
    let (h, w) = view.quantized.dim();
    let mut matrix = Array2::<f64>::zeros((view.levels, 9));

    for ((y, x), &level) in view.quantized.indexed_iter() {
        if level == 0 {
            continue;
        }
        let mut dependence = 1usize;
        for &(dy, dx) in &NEIGHBOURS {
            let ny = y as isize + dy;
            let nx = x as isize + dx;
            if ny < 0 || nx < 0 || ny >= h as isize || nx >= w as isize {
                continue;
            }
            if view.quantized[[ny as usize, nx as usize]] == level {
                dependence += 1;
            }
        }
        matrix[[level - 1, dependence - 1]] += 1.0;
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::super::test_fixtures::view_of;
    use super::*;
    use ndarray::array;

    fn get(features: &[(&'static str, f64)], name: &str) -> f64 {
        features
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .unwrap()
    }

    #[test]
    fn matrix_total_equals_roi_pixel_count() {
        let mask = array![[1i16, 1], [1, 1]];
        let quantized = array![[1usize, 2], [2, 1]];
        let intensities = [0.0; 4];
        let view = view_of(&mask, &quantized, 2, &intensities);

        let matrix = dependence_matrix(&view);
        assert_eq!(matrix.iter().sum::<f64>(), 4.0);
    }

    #[test]
    fn uniform_block_maximizes_dependence() {
        let mask = array![[1i16, 1, 1], [1, 1, 1], [1, 1, 1]];
        let quantized = array![[1usize; 3], [1; 3], [1; 3]];
        let intensities = [0.0; 9];
        let view = view_of(&mask, &quantized, 1, &intensities);

        let matrix = dependence_matrix(&view);
        // The centre pixel depends on all 8 neighbours plus itself
        assert_eq!(matrix[[0, 8]], 1.0);

        let features = features(&view);
        assert!(get(&features, "LargeDependenceEmphasis") > 1.0);
    }

    #[test]
    fn heterogeneous_block_has_higher_entropy_than_flat() {
        let mask = array![[1i16, 1], [1, 1]];
        let flat = array![[1usize, 1], [1, 1]];
        let mixed = array![[1usize, 2], [2, 1]];
        let intensities = [0.0; 4];

        let flat_entropy = get(
            &features(&view_of(&mask, &flat, 1, &intensities)),
            "DependenceEntropy",
        );
        let mixed_entropy = get(
            &features(&view_of(&mask, &mixed, 2, &intensities)),
            "DependenceEntropy",
        );
        assert!(mixed_entropy > flat_entropy);
    }
}
