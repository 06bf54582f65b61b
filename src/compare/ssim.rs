//! Otsu binarisation and windowed structural similarity.

use crate::error::{Result, RoadwatchError};
use image::GrayImage;
use imageproc::contrast::otsu_level;
use ndarray::{Array2, Zip};

const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Thresholds a grayscale image at its own Otsu level.
///
/// Pixels strictly brighter than the level become `1.0`. Each image gets its
/// own level, so two renderings with different stroke density may be cut at
/// different grey values. A single-valued image is cut at that value and
/// comes out all `0.0`.
pub fn binarize(image: &GrayImage) -> (Array2<f64>, u8) {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    let level = if min == max { max } else { otsu_level(image) };
    let (width, height) = image.dimensions();
    let binary = Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        if image.get_pixel(col as u32, row as u32).0[0] > level {
            1.0
        } else {
            0.0
        }
    });
    (binary, level)
}

/// Summed-area table with a zero top row and left column.
fn integral(values: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = values.dim();
    let mut table = Array2::<f64>::zeros((rows + 1, cols + 1));
    for r in 0..rows {
        let mut running = 0.0;
        for c in 0..cols {
            running += values[[r, c]];
            table[[r + 1, c + 1]] = table[[r, c + 1]] + running;
        }
    }
    table
}

fn window_sum(table: &Array2<f64>, r: usize, c: usize, size: usize) -> f64 {
    table[[r + size, c + size]] - table[[r, c + size]] - table[[r + size, c]] + table[[r, c]]
}

/// Mean structural similarity over every full `window x window` patch.
///
/// Uniform weights and sample covariance; `data_range` is the distance
/// between the darkest and brightest possible value.
pub fn structural_similarity(
    a: &Array2<f64>,
    b: &Array2<f64>,
    window: usize,
    data_range: f64,
) -> Result<f64> {
    if a.dim() != b.dim() {
        return Err(RoadwatchError::Render(format!(
            "image shapes differ: {:?} vs {:?}",
            a.dim(),
            b.dim()
        )));
    }
    if window < 3 || window % 2 == 0 {
        return Err(RoadwatchError::Render(format!(
            "window must be odd and at least 3, got {window}"
        )));
    }
    let (rows, cols) = a.dim();
    if rows < window || cols < window {
        return Err(RoadwatchError::Render(format!(
            "{rows}x{cols} image is smaller than the {window}x{window} window"
        )));
    }

    let sum_a = integral(a);
    let sum_b = integral(b);
    let sum_aa = integral(&(a * a));
    let sum_bb = integral(&(b * b));
    let sum_ab = integral(&(a * b));

    let n = (window * window) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;
    for r in 0..=rows - window {
        for c in 0..=cols - window {
            let mu_a = window_sum(&sum_a, r, c, window) / n;
            let mu_b = window_sum(&sum_b, r, c, window) / n;
            let var_a = cov_norm * (window_sum(&sum_aa, r, c, window) / n - mu_a * mu_a);
            let var_b = cov_norm * (window_sum(&sum_bb, r, c, window) / n - mu_b * mu_b);
            let cov = cov_norm * (window_sum(&sum_ab, r, c, window) / n - mu_a * mu_b);

            let numerator = (2.0 * mu_a * mu_b + c1) * (2.0 * cov + c2);
            let denominator = (mu_a * mu_a + mu_b * mu_b + c1) * (var_a + var_b + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    Ok(total / count as f64)
}

/// Per-pixel absolute difference.
pub fn abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    Zip::from(a).and(b).map_collect(|x, y| (x - y).abs())
}

/// Rounds a score to four decimal digits for reporting.
pub fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}
