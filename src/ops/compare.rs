// ============================================================================
// BEFORE / AFTER SPLIT — side-by-side comparison composite
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::CompareError;

/// First column that shows the processed image for a split at `position`
/// percent of `width`.  Matches a clip of `inset(0 0 0 position%)`.
pub fn split_column(width: u32, position: f32) -> u32 {
    let pos = if position.is_finite() { position.clamp(0.0, 100.0) } else { 50.0 };
    ((width as f32 * pos / 100.0).round() as u32).min(width)
}

/// Original pixels left of the split, processed pixels from the split onward.
pub fn split_compare(
    original: &RgbaImage,
    processed: &RgbaImage,
    position: f32,
) -> Result<RgbaImage, CompareError> {
    if original.dimensions() != processed.dimensions() {
        return Err(CompareError::SizeMismatch {
            original: original.dimensions(),
            processed: processed.dimensions(),
        });
    }

    let (w, h) = original.dimensions();
    let split = split_column(w, position) as usize * 4;
    let stride = w as usize * 4;
    let before = original.as_raw();
    let after = processed.as_raw();
    let mut out = vec![0u8; stride * h as usize];

    out.par_chunks_mut(stride.max(1)).enumerate().for_each(|(y, row)| {
        let base = y * stride;
        row[..split].copy_from_slice(&before[base..base + split]);
        row[split..].copy_from_slice(&after[base + split..base + stride]);
    });

    Ok(RgbaImage::from_raw(w, h, out).unwrap_or_else(|| RgbaImage::new(w, h)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    #[test]
    fn halves_come_from_each_side() {
        let out = split_compare(&solid(10, 2, 0), &solid(10, 2, 200), 30.0).unwrap();
        assert_eq!(out.get_pixel(2, 1)[0], 0);
        assert_eq!(out.get_pixel(3, 1)[0], 200);
        assert_eq!(out.get_pixel(9, 0)[0], 200);
    }

    #[test]
    fn position_is_clamped() {
        let all_before = split_compare(&solid(4, 1, 10), &solid(4, 1, 90), 250.0).unwrap();
        assert!(all_before.pixels().all(|p| p[0] == 10));
        let all_after = split_compare(&solid(4, 1, 10), &solid(4, 1, 90), -5.0).unwrap();
        assert!(all_after.pixels().all(|p| p[0] == 90));
    }

    #[test]
    fn size_mismatch_is_an_error() {
        assert!(matches!(
            split_compare(&solid(4, 4, 0), &solid(4, 3, 0), 50.0),
            Err(CompareError::SizeMismatch { .. })
        ));
    }
}
