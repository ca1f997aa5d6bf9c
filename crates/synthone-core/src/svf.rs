//! Two-pole state-variable low-pass filter.
//!
//! Trapezoidal-integration (TPT) state-variable filter after Zavalishin,
//! "The Art of VA Filter Design". The two integrator registers are the only
//! per-sample memory; the coefficients are a pure function of cutoff,
//! resonance and sample rate.
//!
//! Cutoff is normally re-derived from envelope and LFO modulation on every
//! sample, so [`LowPassSvf::configure`] is cheap and allocation-free and is
//! expected to run once per sample per voice. The TPT form stays stable under
//! that kind of audio-rate sweeping.

use core::f32::consts::PI;
use libm::tanf;

/// State-variable low-pass filter (12 dB/oct).
///
/// ## Parameters
///
/// - `cutoff`: Hz, strictly between 0 and Nyquist
/// - `resonance`: 0.0 (no peak) up to just below 1.0; stable up to ~0.98
///
/// # Example
///
/// ```rust
/// use synthone_core::LowPassSvf;
///
/// let mut filter = LowPassSvf::new(44100.0);
/// filter.configure(1000.0, 0.0, 44100.0);
///
/// // DC passes through a low-pass unchanged once settled
/// let mut out = 0.0;
/// for _ in 0..2000 {
///     out = filter.process(1.0);
/// }
/// assert!((out - 1.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct LowPassSvf {
    g: f32,
    a1: f32,
    a2: f32,
    ic1eq: f32,
    ic2eq: f32,
    cutoff: f32,
}

impl LowPassSvf {
    /// Create a filter with a 1 kHz cutoff and no resonance.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            g: 0.0,
            a1: 0.0,
            a2: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff: 1000.0,
        };
        filter.configure(1000.0, 0.0, sample_rate);
        filter
    }

    /// Recompute coefficients for the given cutoff, resonance and sample rate.
    ///
    /// `g = tan(π·cutoff/sr)`, `k = 2 − 2·resonance`,
    /// `a1 = 1/(1 + g·(g + k))`, `a2 = g·a1`.
    #[inline]
    pub fn configure(&mut self, cutoff: f32, resonance: f32, sample_rate: f32) {
        let g = tanf(PI * cutoff / sample_rate);
        let k = 2.0 - 2.0 * resonance;
        self.g = g;
        self.a1 = 1.0 / (1.0 + g * (g + k));
        self.a2 = g * self.a1;
        self.cutoff = cutoff;
    }

    /// Filter one sample and return the low-pass output.
    #[inline]
    pub fn process(&mut self, v0: f32) -> f32 {
        let v1 = self.a1 * self.ic1eq + self.a2 * (v0 - self.ic2eq);
        let v2 = self.ic2eq + self.g * v1;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }

    /// Cutoff used by the last [`configure`](Self::configure) call.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Clear the integrator registers.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

impl Default for LowPassSvf {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn rms_of_sine(filter: &mut LowPassSvf, freq: f32) -> f32 {
        let n = 8820;
        let mut sum = 0.0;
        for i in 0..n {
            let x = libm::sinf(2.0 * PI * freq * i as f32 / SR);
            let y = filter.process(x);
            // skip the transient
            if i >= n / 2 {
                sum += y * y;
            }
        }
        libm::sqrtf(sum / (n / 2) as f32)
    }

    #[test]
    fn passes_dc() {
        let mut filter = LowPassSvf::new(SR);
        filter.configure(500.0, 0.2, SR);
        let mut out = 0.0;
        for _ in 0..5000 {
            out = filter.process(0.5);
        }
        assert!((out - 0.5).abs() < 1e-3, "DC output {out}");
    }

    #[test]
    fn attenuates_above_cutoff() {
        let mut low = LowPassSvf::new(SR);
        low.configure(200.0, 0.0, SR);
        let passed = rms_of_sine(&mut low, 50.0);

        let mut high = LowPassSvf::new(SR);
        high.configure(200.0, 0.0, SR);
        let stopped = rms_of_sine(&mut high, 5000.0);

        assert!(stopped < passed * 0.05, "passed {passed}, stopped {stopped}");
    }

    #[test]
    fn resonance_boosts_cutoff_region() {
        let mut flat = LowPassSvf::new(SR);
        flat.configure(1000.0, 0.0, SR);
        let flat_rms = rms_of_sine(&mut flat, 1000.0);

        let mut peaky = LowPassSvf::new(SR);
        peaky.configure(1000.0, 0.9, SR);
        let peak_rms = rms_of_sine(&mut peaky, 1000.0);

        assert!(peak_rms > flat_rms * 2.0, "flat {flat_rms}, resonant {peak_rms}");
    }

    #[test]
    fn reset_clears_state() {
        let mut filter = LowPassSvf::new(SR);
        for _ in 0..100 {
            filter.process(1.0);
        }
        filter.reset();
        assert_eq!(filter.process(0.0), 0.0);
    }
}
