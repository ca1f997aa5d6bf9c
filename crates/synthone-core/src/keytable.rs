//! Equal-temperament key to frequency lookup.
//!
//! Keys are piano-key indices (0..88) relative to a reference key of 49,
//! which sounds at 440 Hz. Detune is expressed as a cent offset applied on
//! top of the tabulated key frequency.

/// Number of piano keys covered by the table.
pub const NBR_KEYS: usize = 88;

/// Key index that sounds at [`REFERENCE_HZ`].
pub const REFERENCE_KEY: i32 = 49;

/// Frequency of the reference key in Hz.
pub const REFERENCE_HZ: f32 = 440.0;

/// Convert cents to frequency ratio.
///
/// 100 cents = 1 semitone.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    libm::powf(2.0, cents / 1200.0)
}

/// Precomputed key frequencies.
///
/// Built once at startup; lookups are pure and total over `0..NBR_KEYS`.
/// Out-of-range keys saturate to the nearest table entry.
///
/// # Example
///
/// ```rust
/// use synthone_core::KeyTable;
///
/// let table = KeyTable::new();
/// assert!((table.frequency(49, 0.0) - 440.0).abs() < 1e-3);
/// assert!((table.frequency(61, 0.0) - 880.0).abs() < 1e-2);
/// ```
#[derive(Debug, Clone)]
pub struct KeyTable {
    freqs: [f32; NBR_KEYS],
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyTable {
    /// Build the table: `440 * 2^((key - 49) / 12)` for every key.
    pub fn new() -> Self {
        Self {
            freqs: core::array::from_fn(|key| {
                REFERENCE_HZ * libm::powf(2.0, (key as i32 - REFERENCE_KEY) as f32 / 12.0)
            }),
        }
    }

    /// Frequency in Hz of `key` offset by `cents`.
    ///
    /// Equivalent to `440 * 2^((key - 49 + cents / 100) / 12)`.
    #[inline]
    pub fn frequency(&self, key: u8, cents: f32) -> f32 {
        let base = self.freqs[(key as usize).min(NBR_KEYS - 1)];
        if cents == 0.0 {
            base
        } else {
            base * cents_to_ratio(cents)
        }
    }
}
