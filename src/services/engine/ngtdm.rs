// Neighbouring gray-tone difference matrix statistics. For each gray
// level: how far pixels of that level sit from the mean of their ROI
// neighbourhood.

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

/// Coarseness denominator guard, mirroring the engine convention of
/// capping the reciprocal for perfectly flat regions.
const COARSENESS_CAP: f64 = 1e6;

pub(crate) fn features(view: &RoiView) -> Vec<(&'static str, f64)> {
    let (h, w) = view.quantized.dim();
    let mut s = vec![0.0f64; view.levels];
    let mut n = vec![0usize; view.levels];
    let mut nvp = 0usize;

    for ((y, x), &level) in view.quantized.indexed_iter() {
        if level == 0 {
            continue;
        }
        let mut sum = 0.0;
        let mut count = 0usize;
        for &(dy, dx) in &NEIGHBOURS {
            let ny = y as isize + dy;
            let nx = x as isize + dx;
            if ny < 0 || nx < 0 || ny >= h as isize || nx >= w as isize {
                continue;
            }
            let neighbour = view.quantized[[ny as usize, nx as usize]];
            if neighbour == 0 {
                continue;
            }
            sum += neighbour as f64;
            count += 1;
        }
        if count == 0 {
            continue;
        }
        nvp += 1;
        n[level - 1] += 1;
        s[level - 1] += (level as f64 - sum / count as f64).abs();
    }

    if nvp == 0 {
        return vec![
            ("Coarseness", COARSENESS_CAP),
            ("Contrast", 0.0),
            ("Busyness", 0.0),
            ("Complexity", 0.0),
            ("Strength", 0.0),
        ];
    }

    let nvp_f = nvp as f64;
    let p: Vec<f64> = n.iter().map(|&c| c as f64 / nvp_f).collect();
    let ngp = n.iter().filter(|&&c| c > 0).count() as f64;
    let s_total: f64 = s.iter().sum();

    let coarseness_denominator: f64 = p
        .iter()
        .zip(&s)
        .map(|(&pi, &si)| pi * si)
        .sum();
    let coarseness = if coarseness_denominator > 0.0 {
        (1.0 / coarseness_denominator).min(COARSENESS_CAP)
    } else {
        COARSENESS_CAP
    };

    let mut pair_diff_sq = 0.0;
    let mut busyness_denominator = 0.0;
    let mut complexity = 0.0;
    let mut strength_numerator = 0.0;
    for i in 0..view.levels {
        if n[i] == 0 {
            continue;
        }
        let gi = (i + 1) as f64;
        for j in 0..view.levels {
            if n[j] == 0 {
                continue;
            }
            let gj = (j + 1) as f64;
            pair_diff_sq += p[i] * p[j] * (gi - gj).powi(2);
            busyness_denominator += (gi * p[i] - gj * p[j]).abs();
            complexity +=
                (gi - gj).abs() * (p[i] * s[i] + p[j] * s[j]) / (p[i] + p[j]);
            strength_numerator += (p[i] + p[j]) * (gi - gj).powi(2);
        }
    }

    let contrast = if ngp > 1.0 {
        pair_diff_sq / (ngp * (ngp - 1.0)) * s_total / nvp_f
    } else {
        0.0
    };
    let busyness = if busyness_denominator > 0.0 {
        coarseness_denominator / busyness_denominator
    } else {
        0.0
    };
    let strength = if s_total > 0.0 {
        strength_numerator / s_total
    } else {
        0.0
    };

    vec![
        ("Coarseness", coarseness),
        ("Contrast", contrast),
        ("Busyness", busyness),
        ("Complexity", complexity / nvp_f),
        ("Strength", strength),
    ]
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
    fn flat_roi_hits_the_coarseness_cap() {
        let mask = array![[1i16, 1], [1, 1]];
        let quantized = array![[2usize, 2], [2, 2]];
        let intensities = [30.0; 4];
        let view = view_of(&mask, &quantized, 2, &intensities);

        let features = features(&view);
        assert_eq!(get(&features, "Coarseness"), COARSENESS_CAP);
        assert_eq!(get(&features, "Contrast"), 0.0);
        assert_eq!(get(&features, "Busyness"), 0.0);
    }

    #[test]
    fn textured_roi_has_positive_contrast() {
        let mask = array![[1i16, 1, 1], [1, 1, 1], [1, 1, 1]];
        let quantized = array![[1usize, 3, 1], [3, 1, 3], [1, 3, 1]];
        let intensities = [0.0; 9];
        let view = view_of(&mask, &quantized, 3, &intensities);

        let features = features(&view);
        assert!(get(&features, "Contrast") > 0.0);
        assert!(get(&features, "Coarseness") < COARSENESS_CAP);
        assert!(get(&features, "Complexity") > 0.0);
    }

    #[test]
    fn isolated_pixel_has_no_valid_neighbourhood() {
        let mask = array![[1i16]];
        let quantized = array![[1usize]];
        let intensities = [4.0];
        let view = view_of(&mask, &quantized, 1, &intensities);

        let features = features(&view);
        assert_eq!(get(&features, "Coarseness"), COARSENESS_CAP);
        assert_eq!(get(&features, "Strength"), 0.0);
    }
}
