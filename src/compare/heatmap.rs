//! Heat-coloured rendering of a difference image.

use crate::error::Result;
use image::{Rgb, RgbImage};
use ndarray::Array2;
use std::path::Path;

/// The black-red-yellow-white "hot" colour map, `t` in `[0, 1]`.
pub fn hot(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([
        channel(t / 0.365_079),
        channel((t - 0.365_079) / 0.376_984),
        channel((t - 0.746_032) / 0.253_968),
    ])
}

/// Colours `values` after stretching them to their own min..max range.
///
/// A constant image maps entirely to the bottom of the scale.
pub fn heatmap(values: &Array2<f64>) -> RgbImage {
    let (rows, cols) = values.dim();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = values[[y as usize, x as usize]];
        let t = if span > 0.0 { (v - min) / span } else { 0.0 };
        hot(t)
    })
}

/// Writes the heat-coloured difference as an image; format follows the extension.
pub fn save_heatmap(values: &Array2<f64>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    heatmap(values).save(path)?;
    Ok(())
}
