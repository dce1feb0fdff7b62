// Gray-level size-zone matrix statistics. A zone is an 8-connected
// region of ROI pixels sharing one gray level.

use ndarray::Array2;
use std::collections::VecDeque;

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
    let zones = find_zones(view);
    let nz = zones.len() as f64;
    let np = view.intensities.len() as f64;

    if zones.is_empty() {
        return vec![
            ("SmallAreaEmphasis", 0.0),
            ("LargeAreaEmphasis", 0.0),
            ("GrayLevelNonUniformity", 0.0),
            ("ZonePercentage", 0.0),
        ];
    }

    let mut sae = 0.0;
    let mut lae = 0.0;
    let mut zones_per_level = vec![0usize; view.levels];
    for &(level, size) in &zones {
        let area = size as f64;
        sae += 1.0 / (area * area);
        lae += area * area;
        zones_per_level[level - 1] += 1;
    }

    let gln = zones_per_level
        .iter()
        .map(|&count| (count * count) as f64)
        .sum::<f64>();

    vec![
        ("SmallAreaEmphasis", sae / nz),
        ("LargeAreaEmphasis", lae / nz),
        ("GrayLevelNonUniformity", gln / nz),
        ("ZonePercentage", nz / np),
    ]
}

/// All (gray level, zone size) pairs, found by flood fill over
/// same-level 8-connected components. Sparse on purpose: a dense
/// level-by-size matrix would scale with the ROI pixel count.
fn find_zones(view: &RoiView) -> Vec<(usize, usize)> {
    let (h, w) = view.quantized.dim();
    let mut zones = Vec::new();
    let mut visited = Array2::<bool>::from_elem((h, w), false);
    let mut queue = VecDeque::new();

    for y in 0..h {
        for x in 0..w {
            let level = view.quantized[[y, x]];
            if level == 0 || visited[[y, x]] {
                continue;
            }

            let mut size = 0usize;
            visited[[y, x]] = true;
            queue.push_back((y, x));
            while let Some((cy, cx)) = queue.pop_front() {
                size += 1;
                for &(dy, dx) in &NEIGHBOURS {
                    let ny = cy as isize + dy;
                    let nx = cx as isize + dx;
                    if ny < 0 || nx < 0 || ny >= h as isize || nx >= w as isize {
                        continue;
                    }
                    let (ny, nx) = (ny as usize, nx as usize);
                    if visited[[ny, nx]] || view.quantized[[ny, nx]] != level {
                        continue;
                    }
                    visited[[ny, nx]] = true;
                    queue.push_back((ny, nx));
                }
            }

            zones.push((level, size));
        }
    }

    zones
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
    fn one_zone_per_connected_level_region() {
        let mask = array![[1i16, 1, 1], [1, 1, 1]];
        let quantized = array![[1usize, 1, 2], [1, 2, 2]];
        let intensities = [0.0; 6];
        let view = view_of(&mask, &quantized, 2, &intensities);

        let mut zones = find_zones(&view);
        zones.sort_unstable();
        assert_eq!(zones, vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn diagonal_pixels_connect() {
        let mask = array![[1i16, 0], [0, 1]];
        let quantized = array![[3usize, 0], [0, 3]];
        let intensities = [1.0, 1.0];
        let view = view_of(&mask, &quantized, 3, &intensities);

        assert_eq!(find_zones(&view), vec![(3, 2)]);
    }

    #[test]
    fn fragmented_roi_raises_zone_percentage() {
        let mask = array![[1i16, 1, 1, 1]];
        let solid = array![[1usize, 1, 1, 1]];
        let broken = array![[1usize, 2, 1, 2]];
        let intensities = [0.0; 4];

        let solid_view = view_of(&mask, &solid, 2, &intensities);
        let broken_view = view_of(&mask, &broken, 2, &intensities);

        let solid_zp = get(&features(&solid_view), "ZonePercentage");
        let broken_zp = get(&features(&broken_view), "ZonePercentage");
        assert!(broken_zp > solid_zp);
        assert_eq!(broken_zp, 1.0);
    }
}
