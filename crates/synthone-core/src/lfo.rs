//! Stateless low-frequency oscillator.

use core::f32::consts::TAU;

/// Cosine LFO evaluated at an absolute frame: `cos(2π·freq·frame/sr)`.
///
/// The phase is reduced modulo one period in `f64` before the cosine, so the
/// result stays accurate for frame counters far beyond `f32` precision.
#[inline]
pub fn cosine_lfo(frame: i64, sample_rate: f32, freq: f32) -> f32 {
    let cycles = f64::from(freq) * frame as f64 / f64::from(sample_rate);
    let phase = cycles - libm::floor(cycles);
    libm::cosf(TAU * phase as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        assert!((cosine_lfo(0, 44100.0, 3.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn half_period_is_minus_one() {
        // 1 Hz at 100 Hz sample rate: frame 50 is half a cycle
        assert!((cosine_lfo(50, 100.0, 1.0) + 1.0).abs() < 1e-5);
    }

    #[test]
    fn stable_at_large_frames() {
        let late = cosine_lfo(44100 * 3600 * 24, 44100.0, 1.0);
        assert!((late - 1.0).abs() < 1e-4, "got {late}");
    }

    #[test]
    fn zero_frequency_is_constant() {
        assert_eq!(cosine_lfo(12345, 44100.0, 0.0), 1.0);
    }
}
