//! Control parameters shared between the control side and the renderer.
//!
//! [`ControlParameter`] is the single surface through which every tunable is
//! exposed: a label, a range, a default, and an optional integer quantization.
//! The value is stored as `f32` bits in an [`AtomicU32`], so the control side
//! can write while the audio side reads, without locks and without torn reads.
//!
//! [`GlideParam`] is a rate-limited glide used for pitch bend: it moves toward
//! its target by a fixed step each time it is advanced.

use core::sync::atomic::{AtomicU32, Ordering};

/// A bounded, optionally quantized, lock-free parameter.
///
/// Writes are clamped to `[min, max]` and rounded to the nearest integer
/// when quantized, so every read already yields a value ready for use.
///
/// # Example
///
/// ```rust
/// use synthone_core::ControlParameter;
///
/// let count = ControlParameter::new("OSC COUNT", 1.0, 1.0, 4.0, true);
/// assert_eq!(count.set(2.6), 3.0);
/// assert_eq!(count.set(9.0), 4.0);
/// assert_eq!(count.get(), 4.0);
/// ```
#[derive(Debug)]
pub struct ControlParameter {
    label: &'static str,
    default: f32,
    min: f32,
    max: f32,
    quantized: bool,
    bits: AtomicU32,
}

impl ControlParameter {
    /// Create a parameter holding `default`.
    pub fn new(label: &'static str, default: f32, min: f32, max: f32, quantized: bool) -> Self {
        let param = Self {
            label,
            default,
            min,
            max,
            quantized,
            bits: AtomicU32::new(0),
        };
        param.reset();
        param
    }

    /// Label used for display and in settings files.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Lower bound.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Value restored by [`reset`](Self::reset).
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// Whether values are rounded to integers.
    pub fn is_quantized(&self) -> bool {
        self.quantized
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Current value as an index, for quantized selectors.
    #[inline]
    pub fn get_index(&self) -> usize {
        self.get().max(0.0) as usize
    }

    /// Clamp (and round, if quantized) `value`, store it, and return what was stored.
    ///
    /// NaN is rejected and leaves the current value in place.
    pub fn set(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.get();
        }
        let value = self.normalize(value);
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        value
    }

    /// Restore the default value.
    pub fn reset(&self) {
        self.set(self.default);
    }

    /// Position of the current value within the range, 0.0 to 1.0.
    pub fn fraction(&self) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            (self.get() - self.min) / span
        }
    }

    fn normalize(&self, value: f32) -> f32 {
        let value = value.clamp(self.min, self.max);
        if self.quantized {
            libm::roundf(value)
        } else {
            value
        }
    }
}

/// Linear glide toward a target by a fixed step per advance.
///
/// Once within one step of the target the value snaps onto it.
///
/// # Example
///
/// ```rust
/// use synthone_core::GlideParam;
///
/// let mut bend = GlideParam::new(1.0, 0.001);
/// bend.set_target(1.0025);
/// bend.advance();
/// bend.advance();
/// assert!(!bend.is_settled());
/// bend.advance();
/// assert!(bend.is_settled());
/// assert_eq!(bend.get(), 1.0025);
/// ```
#[derive(Debug, Clone)]
pub struct GlideParam {
    current: f32,
    target: f32,
    step: f32,
}

impl GlideParam {
    /// Create a settled glide at `initial`.
    pub fn new(initial: f32, step: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: step.abs(),
        }
    }

    /// Set the value to glide toward.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to `value` without gliding.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    /// Take one step toward the target and return the new value.
    pub fn advance(&mut self) -> f32 {
        let diff = self.target - self.current;
        if diff.abs() <= self.step {
            self.current = self.target;
        } else if diff > 0.0 {
            self.current += self.step;
        } else {
            self.current -= self.step;
        }
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the current value has reached the target.
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }
}

impl Default for GlideParam {
    fn default() -> Self {
        Self::new(1.0, 0.001)
    }
}
