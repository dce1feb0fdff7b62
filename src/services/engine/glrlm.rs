// Gray-level run-length matrix statistics, accumulated over the four 2D
// directions. A run is a maximal straight sequence of ROI pixels sharing
// one gray level; non-ROI cells break runs.

use ndarray::Array2;

use super::RoiView;

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

pub(crate) fn features(view: &RoiView) -> Vec<(&'static str, f64)> {
    let matrix = run_length_matrix(view);
    let nr: f64 = matrix.iter().sum();
    let np = view.intensities.len() as f64;

    if nr == 0.0 {
        return vec![
            ("ShortRunEmphasis", 0.0),
            ("LongRunEmphasis", 0.0),
            ("GrayLevelNonUniformity", 0.0),
            ("RunLengthNonUniformity", 0.0),
            ("RunPercentage", 0.0),
        ];
    }

    let mut sre = 0.0;
    let mut lre = 0.0;
    for ((_, j), &count) in matrix.indexed_iter() {
        let length = (j + 1) as f64;
        sre += count / (length * length);
        lre += count * length * length;
    }

    let mut gln = 0.0;
    for row in matrix.rows() {
        let row_sum: f64 = row.sum();
        gln += row_sum * row_sum;
    }
    let mut rln = 0.0;
    for col in matrix.columns() {
        let col_sum: f64 = col.sum();
        rln += col_sum * col_sum;
    }

    vec![
        ("ShortRunEmphasis", sre / nr),
        ("LongRunEmphasis", lre / nr),
        ("GrayLevelNonUniformity", gln / nr),
        ("RunLengthNonUniformity", rln / nr),
        ("RunPercentage", nr / (np * DIRECTIONS.len() as f64)),
    ]
}

/// Matrix indexed by (gray level - 1, run length - 1).
fn run_length_matrix(view: &RoiView) -> Array2<f64> {
    let (h, w) = view.quantized.dim();
    let max_run = h.max(w);
    let mut matrix = Array2::<f64>::zeros((view.levels, max_run));

    for &(dy, dx) in &DIRECTIONS {
        for y in 0..h {
            for x in 0..w {
                // Only start a walk at line origins for this direction
                let py = y as isize - dy;
                let px = x as isize - dx;
                let has_predecessor =
                    py >= 0 && px >= 0 && py < h as isize && px < w as isize;
                if has_predecessor {
                    continue;
                }

                let mut run_level = 0usize;
                let mut run_length = 0usize;
                let (mut cy, mut cx) = (y as isize, x as isize);
                while cy >= 0 && cx >= 0 && cy < h as isize && cx < w as isize {
                    let level = view.quantized[[cy as usize, cx as usize]];
                    if level == run_level {
                        run_length += 1;
                    } else {
                        if run_level > 0 {
                            matrix[[run_level - 1, run_length - 1]] += 1.0;
                        }
                        run_level = level;
                        run_length = 1;
                    }
                    cy += dy;
                    cx += dx;
                }
                if run_level > 0 {
                    matrix[[run_level - 1, run_length - 1]] += 1.0;
                }
            }
        }
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
    fn uniform_row_is_one_long_horizontal_run() {
        let mask = array![[1i16, 1, 1, 1]];
        let quantized = array![[1usize, 1, 1, 1]];
        let intensities = [2.0; 4];
        let view = view_of(&mask, &quantized, 1, &intensities);

        let matrix = run_length_matrix(&view);
        // Horizontal: one run of 4. Vertical and both diagonals: four
        // runs of 1 each.
        assert_eq!(matrix[[0, 3]], 1.0);
        assert_eq!(matrix[[0, 0]], 12.0);
    }

    #[test]
    fn runs_break_at_roi_boundary() {
        let mask = array![[1i16, 0, 1]];
        let quantized = array![[2usize, 0, 2]];
        let intensities = [9.0, 9.0];
        let view = view_of(&mask, &quantized, 2, &intensities);

        let matrix = run_length_matrix(&view);
        // The gap splits the horizontal line into two runs of 1
        assert_eq!(matrix[[1, 1]], 0.0);
        assert!(matrix[[1, 0]] > 0.0);
    }

    #[test]
    fn long_runs_raise_lre_over_sre() {
        let mask = array![[1i16; 8]];
        let quantized = array![[3usize; 8]];
        let intensities = [1.0; 8];
        let view = view_of(&mask, &quantized, 3, &intensities);

        let features = features(&view);
        assert!(get(&features, "LongRunEmphasis") > get(&features, "ShortRunEmphasis"));
        assert!(get(&features, "RunPercentage") <= 1.0);
    }
}
