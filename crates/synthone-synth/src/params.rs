//! Parameter registry.
//!
//! [`SynthParams`] holds every tunable of the synthesizer as a
//! [`ControlParameter`], laid out in a fixed group order:
//!
//! | Group | Parameters |
//! |-------|------------|
//! | Tone | `LINEAR GAIN`, `PULSE/SAW/FM`, `OCTAVE`, `OSC COUNT`, `DETUNE CENTS`, `ENV TO AMP`, `BEND` |
//! | Envelope | `A`, `D`, `S`, `R` |
//! | Filter | `CUTOFF`, `RESONANCE`, `ENV TO CUTOFF`, `KEY TO CUTOFF`, `CUTOFF LFO FREQ`, `CUTOFF LFO AMP` |
//! | Pulse width | `PULSE WIDTH`, `PWM FREQ`, `PWM AMOUNT` |
//! | Distortion | `DIST THRESHOLD`, `FLIP THRESHOLD` |
//! | Delay | `DELAY FEEDBACK`, `DELAY [MS]` |
//! | Chorus | `CHORUS AMOUNT`, `CHORUS FREQ` |
//! | FM | `FM ALGORITHM`, `OP1 AMP`, `OP1 FREQ`, … `OP8 AMP`, `OP8 FREQ` |
//!
//! The registry is shared between the control side and the renderer behind an
//! `Arc`; every value is an atomic, so no lock is needed to read or write it.

use synthone_core::{ControlParameter, EnvelopeSettings};

use crate::fm::{FmOperators, MAX_OPERATORS};
use crate::oscillator::{MAX_OSC_COUNT, MAX_WIDTH, MIN_WIDTH};

/// Identifier of a fixed (non per-operator) parameter.
///
/// Discriminants are indices into the registry, in group order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ParamId {
    /// Output gain.
    Gain,
    /// Oscillator type selector (see [`OscType`]).
    OscType,
    /// Keyboard octave transpose.
    Octave,
    /// Unison oscillator count.
    OscCount,
    /// Cents between adjacent unison oscillators.
    DetuneCents,
    /// Envelope to amplitude blend.
    EnvToAmp,
    /// Pitch bend target multiplier.
    Bend,
    /// Attack time in ms.
    Attack,
    /// Decay time in ms.
    Decay,
    /// Sustain level.
    Sustain,
    /// Release time in ms.
    Release,
    /// Base filter cutoff in Hz.
    Cutoff,
    /// Filter resonance.
    Resonance,
    /// Envelope to cutoff amount in Hz.
    EnvToCutoff,
    /// Key frequency to cutoff tracking.
    KeyToCutoff,
    /// Cutoff LFO rate in Hz.
    CutoffLfoFreq,
    /// Cutoff LFO depth in Hz.
    CutoffLfoAmp,
    /// Base pulse width.
    PulseWidth,
    /// Pulse width LFO rate in Hz.
    PwmFreq,
    /// Pulse width LFO depth.
    PwmAmount,
    /// Distortion clamp threshold.
    DistThreshold,
    /// Distortion fold threshold.
    FlipThreshold,
    /// Echo feedback gain.
    DelayFeedback,
    /// Echo time in ms.
    DelayMs,
    /// Chorus tap gain.
    ChorusAmount,
    /// Chorus LFO rate in Hz.
    ChorusFreq,
    /// FM algorithm index.
    FmAlgorithm,
}

/// Index of the first per-operator parameter.
const FM_OP_BASE: usize = ParamId::FmAlgorithm as usize + 1;

/// Total number of parameters in the registry.
pub const PARAM_COUNT: usize = FM_OP_BASE + 2 * MAX_OPERATORS;

/// Oscillator type selected by [`ParamId::OscType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscType {
    /// Pulse wave with PWM.
    Pulse,
    /// Saw wave.
    Saw,
    /// FM operator graph.
    Fm,
}

impl OscType {
    /// Decode a selector value.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Pulse),
            1 => Some(Self::Saw),
            2 => Some(Self::Fm),
            _ => None,
        }
    }
}

/// Parameter groups, in settings-file order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamGroup {
    /// Gain, oscillator selection, unison, bend.
    Tone,
    /// ADSR times and sustain level.
    Envelope,
    /// Filter cutoff, resonance and modulation.
    Filter,
    /// Pulse width and PWM.
    PulseWidth,
    /// Waveshaper thresholds.
    Distortion,
    /// Echo.
    Delay,
    /// Chorus.
    Chorus,
    /// FM algorithm and operators.
    Fm,
}

impl ParamGroup {
    /// Every group in order.
    pub const ALL: [ParamGroup; 8] = [
        Self::Tone,
        Self::Envelope,
        Self::Filter,
        Self::PulseWidth,
        Self::Distortion,
        Self::Delay,
        Self::Chorus,
        Self::Fm,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Tone => "tone",
            Self::Envelope => "envelope",
            Self::Filter => "filter",
            Self::PulseWidth => "pulse width",
            Self::Distortion => "distortion",
            Self::Delay => "delay",
            Self::Chorus => "chorus",
            Self::Fm => "fm",
        }
    }

    fn range(self) -> core::ops::Range<usize> {
        let (first, end) = match self {
            Self::Tone => (ParamId::Gain, ParamId::Attack as usize),
            Self::Envelope => (ParamId::Attack, ParamId::Cutoff as usize),
            Self::Filter => (ParamId::Cutoff, ParamId::PulseWidth as usize),
            Self::PulseWidth => (ParamId::PulseWidth, ParamId::DistThreshold as usize),
            Self::Distortion => (ParamId::DistThreshold, ParamId::DelayFeedback as usize),
            Self::Delay => (ParamId::DelayFeedback, ParamId::ChorusAmount as usize),
            Self::Chorus => (ParamId::ChorusAmount, ParamId::FmAlgorithm as usize),
            Self::Fm => (ParamId::FmAlgorithm, PARAM_COUNT),
        };
        first as usize..end
    }
}

/// (label, default, min, max, quantized)
type Descriptor = (&'static str, f32, f32, f32, bool);

const DESCRIPTORS: [Descriptor; PARAM_COUNT] = [
    // tone
    ("LINEAR GAIN", 0.7, 0.1, 3.0, false),
    ("PULSE/SAW/FM", 0.0, 0.0, 2.0, true),
    ("OCTAVE", 0.0, 0.0, 5.0, true),
    ("OSC COUNT", 1.0, 1.0, MAX_OSC_COUNT as f32, true),
    ("DETUNE CENTS", 0.0, 0.0, 50.0, false),
    ("ENV TO AMP", 1.0, 0.0, 1.0, false),
    ("BEND", 1.0, -2.0, 2.0, false),
    // envelope
    ("A", 0.1, 0.1, 500.0, false),
    ("D", 25.0, 0.1, 500.0, false),
    ("S", 1.0, 0.0, 1.0, false),
    ("R", 0.0, 0.0, 1000.0, false),
    // filter
    ("CUTOFF", 17000.0, 50.0, 17000.0, false),
    ("RESONANCE", 0.0, 0.0, 0.98, false),
    ("ENV TO CUTOFF", 0.0, 0.0, 10000.0, false),
    ("KEY TO CUTOFF", 0.0, 0.0, 1.0, false),
    ("CUTOFF LFO FREQ", 0.0, 0.0, 5.0, false),
    ("CUTOFF LFO AMP", 0.0, 0.0, 5000.0, false),
    // pulse width
    ("PULSE WIDTH", 0.5, MIN_WIDTH, MAX_WIDTH, false),
    ("PWM FREQ", 0.3, 0.001, 10.0, false),
    ("PWM AMOUNT", 0.0, 0.0, 0.5, false),
    // distortion
    ("DIST THRESHOLD", 1.0, 0.01, 1.0, false),
    ("FLIP THRESHOLD", 1.1, 0.01, 1.1, false),
    // delay
    ("DELAY FEEDBACK", 0.0, 0.0, 0.9, false),
    ("DELAY [MS]", 600.0, 0.0, 1000.0, false),
    // chorus
    ("CHORUS AMOUNT", 0.0, 0.0, 1.0, false),
    ("CHORUS FREQ", 1.0, 0.1, 5.0, false),
    // fm
    ("FM ALGORITHM", 1.0, 0.0, 8.0, true),
    ("OP1 AMP", 1.0, 0.0, 1.0, false),
    ("OP1 FREQ", 1.0, 0.001, 8.0, false),
    ("OP2 AMP", 0.5, 0.0, 1.0, false),
    ("OP2 FREQ", 2.0, 0.001, 8.0, false),
    ("OP3 AMP", 0.5, 0.0, 1.0, false),
    ("OP3 FREQ", 1.0, 0.001, 8.0, false),
    ("OP4 AMP", 0.5, 0.0, 1.0, false),
    ("OP4 FREQ", 3.0, 0.001, 8.0, false),
    ("OP5 AMP", 0.5, 0.0, 1.0, false),
    ("OP5 FREQ", 1.0, 0.001, 8.0, false),
    ("OP6 AMP", 0.5, 0.0, 1.0, false),
    ("OP6 FREQ", 0.5, 0.001, 8.0, false),
    ("OP7 AMP", 0.5, 0.0, 1.0, false),
    ("OP7 FREQ", 2.0, 0.001, 8.0, false),
    ("OP8 AMP", 0.5, 0.0, 1.0, false),
    ("OP8 FREQ", 0.01, 0.001, 8.0, false),
];

/// Registry of every synthesizer parameter.
///
/// # Example
///
/// ```rust
/// use synthone_synth::{ParamId, SynthParams};
///
/// let params = SynthParams::new();
/// assert_eq!(params.get(ParamId::Cutoff), 17000.0);
///
/// params.set(ParamId::Cutoff, 20.0);
/// assert_eq!(params.get(ParamId::Cutoff), 50.0); // clamped
///
/// let label = params.by_label("RESONANCE").map(|p| p.label());
/// assert_eq!(label, Some("RESONANCE"));
/// ```
#[derive(Debug)]
pub struct SynthParams {
    params: [ControlParameter; PARAM_COUNT],
}

impl Default for SynthParams {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthParams {
    /// Create a registry with every parameter at its default.
    pub fn new() -> Self {
        Self {
            params: core::array::from_fn(|i| {
                let (label, default, min, max, quantized) = DESCRIPTORS[i];
                ControlParameter::new(label, default, min, max, quantized)
            }),
        }
    }

    /// Parameter for `id`.
    #[inline]
    pub fn param(&self, id: ParamId) -> &ControlParameter {
        &self.params[id as usize]
    }

    /// Current value of `id`.
    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.param(id).get()
    }

    /// Current value of `id` as an index (for quantized selectors).
    #[inline]
    pub fn get_index(&self, id: ParamId) -> usize {
        self.param(id).get_index()
    }

    /// Set `id`, returning the stored (clamped) value.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        self.param(id).set(value)
    }

    /// Amplitude parameter of FM operator `op` (0-based).
    pub fn op_amp(&self, op: usize) -> &ControlParameter {
        &self.params[FM_OP_BASE + 2 * op]
    }

    /// Frequency ratio parameter of FM operator `op` (0-based).
    pub fn op_ratio(&self, op: usize) -> &ControlParameter {
        &self.params[FM_OP_BASE + 2 * op + 1]
    }

    /// Snapshot of every FM operator's amplitude and ratio.
    pub fn fm_operators(&self) -> FmOperators {
        FmOperators {
            amp: core::array::from_fn(|op| self.op_amp(op).get()),
            ratio: core::array::from_fn(|op| self.op_ratio(op).get()),
        }
    }

    /// Current ADSR settings.
    pub fn envelope(&self) -> EnvelopeSettings {
        EnvelopeSettings {
            attack_ms: self.get(ParamId::Attack),
            decay_ms: self.get(ParamId::Decay),
            sustain: self.get(ParamId::Sustain),
            release_ms: self.get(ParamId::Release),
        }
    }

    /// Parameters belonging to `group`, in order.
    pub fn group(&self, group: ParamGroup) -> &[ControlParameter] {
        &self.params[group.range()]
    }

    /// Every parameter in group order.
    pub fn iter(&self) -> impl Iterator<Item = &ControlParameter> {
        self.params.iter()
    }

    /// Find a parameter by its exact label.
    pub fn by_label(&self, label: &str) -> Option<&ControlParameter> {
        self.params.iter().find(|p| p.label() == label)
    }

    /// Restore every default.
    pub fn reset(&self) {
        for p in &self.params {
            p.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique() {
        let params = SynthParams::new();
        for (i, a) in params.iter().enumerate() {
            for b in params.iter().skip(i + 1) {
                assert_ne!(a.label(), b.label());
            }
        }
    }

    #[test]
    fn groups_cover_every_parameter_once() {
        let params = SynthParams::new();
        let total: usize = ParamGroup::ALL.iter().map(|&g| params.group(g).len()).sum();
        assert_eq!(total, PARAM_COUNT);
        assert_eq!(params.group(ParamGroup::Envelope)[0].label(), "A");
        assert_eq!(params.group(ParamGroup::Fm)[0].label(), "FM ALGORITHM");
        assert_eq!(params.group(ParamGroup::Chorus).len(), 2);
    }

    #[test]
    fn ids_match_labels() {
        let params = SynthParams::new();
        assert_eq!(params.param(ParamId::DelayMs).label(), "DELAY [MS]");
        assert_eq!(params.param(ParamId::Bend).label(), "BEND");
        assert_eq!(params.op_amp(0).label(), "OP1 AMP");
        assert_eq!(params.op_ratio(7).label(), "OP8 FREQ");
    }

    #[test]
    fn defaults_are_in_range() {
        for (label, default, min, max, _) in DESCRIPTORS {
            assert!(min <= default && default <= max, "{label}");
        }
    }

    #[test]
    fn osc_type_decodes() {
        assert_eq!(OscType::from_index(0), Some(OscType::Pulse));
        assert_eq!(OscType::from_index(2), Some(OscType::Fm));
        assert_eq!(OscType::from_index(3), None);
    }

    #[test]
    fn envelope_snapshot() {
        let params = SynthParams::new();
        params.set(ParamId::Sustain, 0.25);
        let adsr = params.envelope();
        assert_eq!(adsr.sustain, 0.25);
        assert_eq!(adsr.decay_ms, 25.0);
    }
}
