//! FM operator graph.
//!
//! An [`Algorithm`] wires up to [`MAX_OPERATORS`] cosine operators. Each
//! operator lists the operators that modulate it (its inputs) and optionally
//! one feedback source. Inputs always point at higher-numbered operators, so
//! the input edges form a DAG that is evaluated recursively.
//!
//! Feedback edges are never traversed. A feedback source contributes the
//! output it produced on its previous evaluation, read from a per-voice
//! [`FmState`] cache. This is what lets an operator modulate itself (or an
//! earlier operator in its own chain) without recursing forever.
//!
//! ```text
//! modulation(op) = Σ 0.1·eval(input) + 0.1·cache[feedback]
//! eval(op)       = amp[op] · cos(2π·(freq·ratio[op] + modulation(op))·t)
//! sample         = mean(eval(carrier) for each carrier)
//! ```
//!
//! # Algorithms
//!
//! | # | Name | Carriers | Wiring |
//! |---|------|----------|--------|
//! | 0 | Sine | 1 | 1 |
//! | 1 | Pair | 1 | 2→1 |
//! | 2 | Pair feedback | 1 | 2→1, 2↺2 |
//! | 3 | Stack | 1 | 4→3→2→1, 4↺4 |
//! | 4 | Twin pairs | 1, 3 | 2→1, 4→3, 4↺4 |
//! | 5 | Three into one | 1 | 2,3,4→1, 4↺4 |
//! | 6 | Cross feedback | 1 | 2→1, 1↺2 |
//! | 7 | Twin stacks | 1, 5 | 4→3→2→1, 8→7→6→5, 4↺4, 8↺8 |
//! | 8 | Four pairs | 1, 3, 5, 7 | 2→1, 4→3, 6→5, 8→7, 8↺8 |
//!
//! Operator numbers in the table are 1-based, matching the `OPn` parameter
//! labels; the code indexes them from 0.

use core::f64::consts::TAU;

/// Maximum number of operators in any algorithm.
pub const MAX_OPERATORS: usize = 8;

/// Scale applied to every modulation and feedback contribution.
pub const MOD_INDEX: f32 = 0.1;

/// Wiring of a single operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSlot {
    /// Operators whose current output modulates this one.
    pub inputs: &'static [usize],
    /// Operator whose previous output is fed back into this one.
    pub feedback: Option<usize>,
}

impl OperatorSlot {
    const fn new(inputs: &'static [usize], feedback: Option<usize>) -> Self {
        Self { inputs, feedback }
    }
}

/// A fixed operator topology.
#[derive(Debug, PartialEq, Eq)]
pub struct Algorithm {
    /// Display name.
    pub name: &'static str,
    /// Operator wiring; the slice length is the operator count.
    pub operators: &'static [OperatorSlot],
    /// Operators whose outputs are averaged into the voice signal.
    pub carriers: &'static [usize],
}

const fn op(inputs: &'static [usize]) -> OperatorSlot {
    OperatorSlot::new(inputs, None)
}

const fn fb(inputs: &'static [usize], source: usize) -> OperatorSlot {
    OperatorSlot::new(inputs, Some(source))
}

/// Every available algorithm, indexed by the `FM ALGORITHM` parameter.
pub static ALGORITHMS: [Algorithm; 9] = [
    Algorithm {
        name: "Sine",
        operators: &[op(&[])],
        carriers: &[0],
    },
    Algorithm {
        name: "Pair",
        operators: &[op(&[1]), op(&[])],
        carriers: &[0],
    },
    Algorithm {
        name: "Pair feedback",
        operators: &[op(&[1]), fb(&[], 1)],
        carriers: &[0],
    },
    Algorithm {
        name: "Stack",
        operators: &[op(&[1]), op(&[2]), op(&[3]), fb(&[], 3)],
        carriers: &[0],
    },
    Algorithm {
        name: "Twin pairs",
        operators: &[op(&[1]), op(&[]), op(&[3]), fb(&[], 3)],
        carriers: &[0, 2],
    },
    Algorithm {
        name: "Three into one",
        operators: &[op(&[1, 2, 3]), op(&[]), op(&[]), fb(&[], 3)],
        carriers: &[0],
    },
    Algorithm {
        name: "Cross feedback",
        operators: &[op(&[1]), fb(&[], 0)],
        carriers: &[0],
    },
    Algorithm {
        name: "Twin stacks",
        operators: &[
            op(&[1]),
            op(&[2]),
            op(&[3]),
            fb(&[], 3),
            op(&[5]),
            op(&[6]),
            op(&[7]),
            fb(&[], 7),
        ],
        carriers: &[0, 4],
    },
    Algorithm {
        name: "Four pairs",
        operators: &[
            op(&[1]),
            op(&[]),
            op(&[3]),
            op(&[]),
            op(&[5]),
            op(&[]),
            op(&[7]),
            fb(&[], 7),
        ],
        carriers: &[0, 2, 4, 6],
    },
];

/// Look up an algorithm by index.
pub fn algorithm(index: usize) -> Option<&'static Algorithm> {
    ALGORITHMS.get(index)
}

/// Per-operator amplitude and frequency ratio, snapshotted once per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmOperators {
    /// Output amplitude of each operator.
    pub amp: [f32; MAX_OPERATORS],
    /// Frequency of each operator relative to the note frequency.
    pub ratio: [f32; MAX_OPERATORS],
}

impl Default for FmOperators {
    fn default() -> Self {
        Self {
            amp: [1.0; MAX_OPERATORS],
            ratio: [1.0; MAX_OPERATORS],
        }
    }
}

/// Per-voice cache of each operator's most recent output.
#[derive(Debug, Clone, Default)]
pub struct FmState {
    outputs: [f32; MAX_OPERATORS],
}

impl FmState {
    /// Create a cache with every output at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent output of operator `op`.
    pub fn output(&self, op: usize) -> f32 {
        self.outputs[op]
    }

    /// Most recent output of every operator slot.
    pub fn outputs(&self) -> &[f32; MAX_OPERATORS] {
        &self.outputs
    }

    /// Clear the cache.
    pub fn reset(&mut self) {
        self.outputs = [0.0; MAX_OPERATORS];
    }
}

impl Algorithm {
    /// Number of operators used.
    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    /// Whether `op` contributes directly to the output.
    pub fn is_carrier(&self, op: usize) -> bool {
        self.carriers.contains(&op)
    }

    /// Render the voice signal at `frame`: the mean of the carrier outputs.
    pub fn render(
        &self,
        state: &mut FmState,
        ops: &FmOperators,
        freq: f32,
        frame: i64,
        sample_rate: f32,
    ) -> f32 {
        if self.carriers.is_empty() {
            return 0.0;
        }
        let time = frame as f64 / f64::from(sample_rate);
        let sum: f32 = self
            .carriers
            .iter()
            .map(|&carrier| self.evaluate(carrier, state, ops, freq, time))
            .sum();
        sum / self.carriers.len() as f32
    }

    /// Evaluate operator `op` at `time` seconds and cache its output.
    fn evaluate(
        &self,
        op: usize,
        state: &mut FmState,
        ops: &FmOperators,
        freq: f32,
        time: f64,
    ) -> f32 {
        let slot = &self.operators[op];

        let mut modulation = 0.0;
        for &input in slot.inputs {
            modulation += MOD_INDEX * self.evaluate(input, state, ops, freq, time);
        }
        if let Some(source) = slot.feedback {
            modulation += MOD_INDEX * state.outputs[source];
        }

        // Reduce the phase to one cycle in f64 so long-running frame
        // counters keep their precision.
        let cycles = (f64::from(freq) * f64::from(ops.ratio[op]) + f64::from(modulation)) * time;
        let phase = cycles - libm::floor(cycles);
        let output = ops.amp[op] * libm::cos(TAU * phase) as f32;

        state.outputs[op] = output;
        output
    }
}
