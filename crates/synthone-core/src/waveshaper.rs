//! Symmetric fold-back / clamp waveshaper.

use libm::fmodf;

/// Fold samples beyond `±flip_level` back into range, then clamp to `±dist_level`.
///
/// Reflection mirrors the excess around the flip threshold
/// (`x → 2·flip − x`), repeating for excursions wider than one fold, so the
/// folded signal is a triangle-wave function of the input. `flip_level` is
/// expected to be `>= dist_level`; a non-positive `flip_level` disables
/// folding.
///
/// # Example
///
/// ```rust
/// use synthone_core::distort;
///
/// assert_eq!(distort(0.5, 1.0, 1.0), 0.5);
/// assert!((distort(1.5, 1.0, 1.2) - 0.9).abs() < 1e-6);
/// assert_eq!(distort(1.1, 1.0, 1.2), 1.0);
/// ```
#[inline]
pub fn distort(sample: f32, dist_level: f32, flip_level: f32) -> f32 {
    let folded = if flip_level > 0.0 && sample.abs() > flip_level {
        let period = 4.0 * flip_level;
        let mut t = fmodf(sample + flip_level, period);
        if t < 0.0 {
            t += period;
        }
        if t < 2.0 * flip_level {
            t - flip_level
        } else {
            3.0 * flip_level - t
        }
    } else {
        sample
    };

    folded.clamp(-dist_level, dist_level)
}
