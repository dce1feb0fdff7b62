// 2D shape descriptors of the ROI, computed in physical units from the
// binary mask and pixel spacing.

use std::f64::consts::PI;

use super::RoiView;

pub(crate) fn features(view: &RoiView) -> Vec<(&'static str, f64)> {
    let (sy, sx) = (view.spacing.0, view.spacing.1);
    let (h, w) = view.mask.dim();

    let mut pixel_count = 0usize;
    let mut perimeter = 0.0;
    let mut boundary: Vec<(usize, usize)> = Vec::new();
    let mut coords: Vec<(f64, f64)> = Vec::new();

    for ((y, x), &m) in view.mask.indexed_iter() {
        if m != 1 {
            continue;
        }
        pixel_count += 1;
        coords.push((y as f64 * sy, x as f64 * sx));

        // An exposed edge is a 4-neighbour outside the grid or outside
        // the ROI; vertical neighbours expose a horizontal edge (length
        // sx) and vice versa.
        let mut exposed = false;
        if y == 0 || view.mask[[y - 1, x]] != 1 {
            perimeter += sx;
            exposed = true;
        }
        if y + 1 >= h || view.mask[[y + 1, x]] != 1 {
            perimeter += sx;
            exposed = true;
        }
        if x == 0 || view.mask[[y, x - 1]] != 1 {
            perimeter += sy;
            exposed = true;
        }
        if x + 1 >= w || view.mask[[y, x + 1]] != 1 {
            perimeter += sy;
            exposed = true;
        }
        if exposed {
            boundary.push((y, x));
        }
    }

    let surface = pixel_count as f64 * sx * sy;
    let sphericity = 2.0 * (PI * surface).sqrt() / perimeter;

    let mut max_diameter = 0.0f64;
    for (i, &(y1, x1)) in boundary.iter().enumerate() {
        for &(y2, x2) in boundary.iter().skip(i + 1) {
            let dy = (y1 as f64 - y2 as f64) * sy;
            let dx = (x1 as f64 - x2 as f64) * sx;
            max_diameter = max_diameter.max((dy * dy + dx * dx).sqrt());
        }
    }

    let (major_axis, minor_axis) = principal_axes(&coords);
    let elongation = if major_axis > 0.0 {
        minor_axis / major_axis
    } else {
        1.0
    };

    vec![
        ("PixelSurface", surface),
        ("Perimeter", perimeter),
        ("PerimeterSurfaceRatio", perimeter / surface),
        ("Sphericity", sphericity),
        ("MaximumDiameter", max_diameter),
        ("MajorAxisLength", major_axis),
        ("MinorAxisLength", minor_axis),
        ("Elongation", elongation),
    ]
}

/// Axis lengths from the eigenvalues of the coordinate covariance
/// matrix, 4*sqrt(lambda) per axis.
fn principal_axes(coords: &[(f64, f64)]) -> (f64, f64) {
    let n = coords.len() as f64;
    let mean_y = coords.iter().map(|c| c.0).sum::<f64>() / n;
    let mean_x = coords.iter().map(|c| c.1).sum::<f64>() / n;

    let mut cyy = 0.0;
    let mut cxx = 0.0;
    let mut cxy = 0.0;
    for &(y, x) in coords {
        let dy = y - mean_y;
        let dx = x - mean_x;
        cyy += dy * dy;
        cxx += dx * dx;
        cxy += dy * dx;
    }
    cyy /= n;
    cxx /= n;
    cxy /= n;

    // Closed-form eigenvalues of a symmetric 2x2 matrix
    let trace = cyy + cxx;
    let det = cyy * cxx - cxy * cxy;
    let disc = (trace * trace / 4.0 - det).max(0.0).sqrt();
    let lambda_major = (trace / 2.0 + disc).max(0.0);
    let lambda_minor = (trace / 2.0 - disc).max(0.0);

    (4.0 * lambda_major.sqrt(), 4.0 * lambda_minor.sqrt())
}
