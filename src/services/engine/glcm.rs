// Gray-level co-occurrence matrix statistics. One symmetric matrix is
// accumulated over the four 2D directions at distance 1.

use ndarray::Array2;

use super::RoiView;

const OFFSETS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

pub(crate) fn features(view: &RoiView) -> Vec<(&'static str, f64)> {
    let matrix = cooccurrence_matrix(view);
    let total: f64 = matrix.iter().sum();

    if total == 0.0 {
        // Degenerate ROI with no co-occurring pairs (e.g. a single pixel)
        return vec![
            ("Contrast", 0.0),
            ("Correlation", 1.0),
            ("JointEnergy", 0.0),
            ("JointEntropy", 0.0),
            ("Idm", 0.0),
            ("SumAverage", 0.0),
        ];
    }

    let p = matrix.mapv(|v| v / total);

    // Marginal mean/variance; the matrix is symmetric so the row and
    // column marginals coincide.
    let mut mean = 0.0;
    for ((i, _), &pij) in p.indexed_iter() {
        mean += (i + 1) as f64 * pij;
    }
    let mut variance = 0.0;
    for ((i, _), &pij) in p.indexed_iter() {
        variance += ((i + 1) as f64 - mean).powi(2) * pij;
    }

    let mut contrast = 0.0;
    let mut joint_energy = 0.0;
    let mut joint_entropy = 0.0;
    let mut idm = 0.0;
    let mut sum_average = 0.0;
    let mut cross = 0.0;

    for ((i, j), &pij) in p.indexed_iter() {
        if pij == 0.0 {
            continue;
        }
        let gi = (i + 1) as f64;
        let gj = (j + 1) as f64;
        let diff = gi - gj;
        contrast += diff * diff * pij;
        joint_energy += pij * pij;
        joint_entropy -= pij * pij.log2();
        idm += pij / (1.0 + diff * diff);
        sum_average += (gi + gj) * pij;
        cross += gi * gj * pij;
    }

    let correlation = if variance > 0.0 {
        (cross - mean * mean) / variance
    } else {
        1.0
    };

    vec![
        ("Contrast", contrast),
        ("Correlation", correlation),
        ("JointEnergy", joint_energy),
        ("JointEntropy", joint_entropy),
        ("Idm", idm),
        ("SumAverage", sum_average),
    ]
}

fn cooccurrence_matrix(view: &RoiView) -> Array2<f64> {
    let (h, w) = view.quantized.dim();
    let mut matrix = Array2::<f64>::zeros((view.levels, view.levels));

    for ((y, x), &level) in view.quantized.indexed_iter() {
        if level == 0 {
            continue;
        }
        for &(dy, dx) in &OFFSETS {
            let ny = y as isize + dy;
            let nx = x as isize + dx;
            if ny < 0 || nx < 0 || ny >= h as isize || nx >= w as isize {
                continue;
            }
            let neighbour = view.quantized[[ny as usize, nx as usize]];
            if neighbour == 0 {
                continue;
            }
            // Symmetric accumulation
            matrix[[level - 1, neighbour - 1]] += 1.0;
            matrix[[neighbour - 1, level - 1]] += 1.0;
        }
    }

    matrix
}
