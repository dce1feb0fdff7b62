// First-order (histogram) statistics over the raw ROI intensities.

use super::RoiView;

pub(crate) fn features(view: &RoiView) -> Vec<(&'static str, f64)> {
    let x = view.intensities;
    let n = x.len() as f64;

    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mean = x.iter().sum::<f64>() / n;
    let energy = x.iter().map(|v| v * v).sum::<f64>();
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let skewness = if std_dev > 0.0 {
        x.iter().map(|v| ((v - mean) / std_dev).powi(3)).sum::<f64>() / n
    } else {
        0.0
    };
    let kurtosis = if std_dev > 0.0 {
        x.iter().map(|v| ((v - mean) / std_dev).powi(4)).sum::<f64>() / n
    } else {
        0.0
    };

    let (entropy, uniformity) = binned_entropy_uniformity(view);

    vec![
        ("Mean", mean),
        ("Median", percentile(&sorted, 50.0)),
        ("Minimum", min),
        ("Maximum", max),
        ("Range", max - min),
        ("Variance", variance),
        ("Skewness", skewness),
        ("Kurtosis", kurtosis),
        ("Energy", energy),
        ("RootMeanSquared", (energy / n).sqrt()),
        ("Entropy", entropy),
        ("Uniformity", uniformity),
        ("10Percentile", percentile(&sorted, 10.0)),
        ("90Percentile", percentile(&sorted, 90.0)),
        (
            "InterquartileRange",
            percentile(&sorted, 75.0) - percentile(&sorted, 25.0),
        ),
    ]
}

/// Linear-interpolated percentile over pre-sorted samples.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

/// Shannon entropy and uniformity over the quantized gray-level
/// histogram, matching the discretization the texture matrices use.
fn binned_entropy_uniformity(view: &RoiView) -> (f64, f64) {
    let mut counts = vec![0usize; view.levels];
    for &level in view.quantized.iter().filter(|&&l| l > 0) {
        counts[level - 1] += 1;
    }
    let total = counts.iter().sum::<usize>() as f64;

    let mut entropy = 0.0;
    let mut uniformity = 0.0;
    for &c in &counts {
        if c == 0 {
            continue;
        }
        let p = c as f64 / total;
        entropy -= p * p.log2();
        uniformity += p * p;
    }
    (entropy, uniformity)
}
