//! Integration tests for synthone-synth crate.
//!
//! Tests cover voice allocation and stealing, the FM graph against its
//! closed form, the render pipeline, and parameter effects on the output.

use std::sync::Arc;

use synthone_synth::{
    FmOperators, FmState, MAX_OPERATORS, NBR_VOICES, NEVER, ParamId, Synth, SynthParams,
    VoiceManager, fm,
};

const SR: f32 = 44100.0;

fn synth_with(params: &Arc<SynthParams>) -> Synth {
    Synth::new(SR, Arc::clone(params))
}

fn peak(block: &[f32]) -> f32 {
    block.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

// ---------------------------------------------------------------------------
// 1. Voice allocation and stealing
// ---------------------------------------------------------------------------

#[test]
fn ninth_note_steals_oldest_pressed() {
    let mut mgr = VoiceManager::new(SR);
    for i in 0..NBR_VOICES {
        mgr.note_on(10 + i as u8, 1.0, 100 + i as i64);
    }

    // Every voice held: the one pressed first (key 10) goes
    let slot = mgr.note_on(30, 1.0, 200);
    assert_eq!(slot, Some(0));
    assert!(!mgr.voices().iter().any(|v| v.key() == 10));
    assert_eq!(mgr.held_voice_count(), NBR_VOICES);
}

#[test]
fn ninth_note_prefers_released_voice() {
    let mut mgr = VoiceManager::new(SR);
    for i in 0..NBR_VOICES {
        mgr.note_on(10 + i as u8, 1.0, 100 + i as i64);
    }
    mgr.note_off(15, 300);
    mgr.note_off(12, 310);

    // Key 15 was released first, so its voice is taken even though
    // key 10 was pressed earlier
    let slot = mgr.note_on(40, 1.0, 400);
    assert_eq!(slot, Some(5));
    assert!(mgr.voices().iter().any(|v| v.key() == 10));
    assert!(mgr.voices().iter().any(|v| v.key() == 12));
    assert!(!mgr.voices().iter().any(|v| v.key() == 15));

    let slot = mgr.note_on(41, 1.0, 401);
    assert_eq!(slot, Some(2));
}

#[test]
fn held_and_released_markers_are_exclusive() {
    let mut mgr = VoiceManager::new(SR);
    mgr.note_on(20, 1.0, 5);
    let v = &mgr.voices()[0];
    assert_eq!((v.pressed(), v.released()), (5, NEVER));

    mgr.note_off(20, 9);
    let v = &mgr.voices()[0];
    assert_eq!((v.pressed(), v.released()), (NEVER, 9));
}

#[test]
fn pool_never_exhausts() {
    let mut mgr = VoiceManager::new(SR);
    for i in 0..200i64 {
        let key = 1 + (i % 80) as u8;
        mgr.note_off(key, i);
        assert!(
            mgr.note_on(key, 1.0, i).is_some() || mgr.voices().iter().any(|v| v.key() == key),
            "key {key} not sounding at frame {i}"
        );
    }
    assert!(mgr.active_voice_count() <= NBR_VOICES);
}

// ---------------------------------------------------------------------------
// 2. FM operator graph
// ---------------------------------------------------------------------------

#[test]
fn two_operator_fm_matches_closed_form() {
    let alg = fm::algorithm(1).unwrap();
    assert_eq!(alg.operator_count(), 2);

    let mut ops = FmOperators::default();
    ops.amp[0] = 0.8;
    ops.ratio[0] = 1.0;
    ops.amp[1] = 0.6;
    ops.ratio[1] = 2.0;

    let freq = 220.0f64;
    let mut state = FmState::new();
    for frame in [0i64, 1, 37, 441, 12345, 44100] {
        let t = frame as f64 / f64::from(SR);
        let modulator = 0.6 * (2.0 * std::f64::consts::PI * freq * 2.0 * t).cos();
        let expected = 0.8 * (2.0 * std::f64::consts::PI * (freq + 0.1 * modulator) * t).cos();

        let got = alg.render(&mut state, &ops, freq as f32, frame, SR);
        assert!(
            (f64::from(got) - expected).abs() < 1e-4,
            "frame {frame}: got {got}, expected {expected}"
        );
        assert!((f64::from(state.output(1)) - modulator).abs() < 1e-4);
    }
}

#[test]
fn feedback_cycle_terminates_and_stays_bounded() {
    // Cross feedback: carrier feeds back into its own modulator
    let alg = fm::algorithm(6).unwrap();
    let ops = FmOperators::default();
    let mut state = FmState::new();
    for frame in 0..10_000 {
        let out = alg.render(&mut state, &ops, 330.0, frame, SR);
        assert!(out.is_finite() && out.abs() <= 1.0);
    }
}

#[test]
fn every_algorithm_renders() {
    let ops = FmOperators {
        amp: [0.5; MAX_OPERATORS],
        ratio: [1.5; MAX_OPERATORS],
    };
    for (index, alg) in fm::ALGORITHMS.iter().enumerate() {
        let mut state = FmState::new();
        let mut energy = 0.0;
        for frame in 0..2000 {
            let out = alg.render(&mut state, &ops, 440.0, frame, SR);
            assert!(out.is_finite(), "algorithm {index}");
            energy += out * out;
        }
        assert!(energy > 1.0, "algorithm {index} ({}) is silent", alg.name);
    }
}

// ---------------------------------------------------------------------------
// 3. Render pipeline
// ---------------------------------------------------------------------------

#[test]
fn release_fades_to_silence() {
    let params = Arc::new(SynthParams::new());
    params.set(ParamId::OscType, 1.0);
    params.set(ParamId::Release, 10.0);
    let mut synth = synth_with(&params);

    synth.note_on(30, 1.0);
    let mut block = vec![0.0f32; 4410];
    synth.render_block(&mut block);
    assert!(peak(&block) > 0.05);

    synth.note_off(30);
    synth.render_block(&mut block);
    // 10 ms release plus filter ring-out
    let tail = &block[2205..];
    assert!(peak(tail) < 1e-3, "tail peak {}", peak(tail));
}

#[test]
fn env_to_amp_zero_ignores_envelope() {
    let params = Arc::new(SynthParams::new());
    params.set(ParamId::OscType, 1.0);
    params.set(ParamId::EnvToAmp, 0.0);
    let mut synth = synth_with(&params);

    synth.note_on(30, 1.0);
    synth.render_block(&mut [0.0f32; 100]);
    synth.note_off(30);

    // Released with R = 0, but the envelope no longer gates the amplitude
    let mut block = vec![0.0f32; 4410];
    synth.render_block(&mut block);
    assert!(peak(&block[2000..]) > 0.05);
}

#[test]
fn cutoff_is_clamped() {
    let params = Arc::new(SynthParams::new());
    params.set(ParamId::Cutoff, 17000.0);
    params.set(ParamId::EnvToCutoff, 10000.0);
    params.set(ParamId::KeyToCutoff, 1.0);

    let mut synth = synth_with(&params);
    synth.note_on(40, 1.0);
    synth.render_block(&mut [0.0f32; 64]);
    let voice = &synth.voices().voices()[0];
    assert_eq!(voice.filter().cutoff(), 17000.0);

    // Low sample rates tighten the ceiling to stay below Nyquist
    let mut low = Synth::new(22050.0, Arc::clone(&params));
    low.note_on(40, 1.0);
    low.render_block(&mut [0.0f32; 64]);
    let cutoff = low.voices().voices()[0].filter().cutoff();
    assert!((cutoff - 0.45 * 22050.0).abs() < 1e-2, "cutoff {cutoff}");

    params.set(ParamId::Cutoff, 50.0);
    params.set(ParamId::EnvToCutoff, 0.0);
    params.set(ParamId::KeyToCutoff, 0.0);
    params.set(ParamId::CutoffLfoAmp, 5000.0);
    params.set(ParamId::CutoffLfoFreq, 5.0);
    // Half an LFO period later the LFO term is -5000 Hz
    let mut synth = synth_with(&params);
    synth.note_on(40, 1.0);
    synth.render_block(&mut vec![0.0f32; 4411]);
    assert_eq!(synth.voices().voices()[0].filter().cutoff(), 50.0);
}

#[test]
fn echo_repeats_after_delay_time() {
    let params = Arc::new(SynthParams::new());
    params.set(ParamId::OscType, 1.0);
    params.set(ParamId::DelayFeedback, 0.5);
    params.set(ParamId::DelayMs, 100.0);
    let mut synth = synth_with(&params);

    synth.note_on(30, 1.0);
    synth.render_block(&mut [0.0f32; 441]);
    synth.note_off(30);

    // R = 0 silences the dry signal, the echo carries on
    let mut block = vec![0.0f32; 4410];
    synth.render_block(&mut block);
    assert!(peak(&block[500..]) > 0.01, "no echo");
}

#[test]
fn full_effects_stay_within_limiter() {
    let params = Arc::new(SynthParams::new());
    params.set(ParamId::Gain, 3.0);
    params.set(ParamId::OscCount, 4.0);
    params.set(ParamId::DetuneCents, 50.0);
    params.set(ParamId::Resonance, 0.98);
    params.set(ParamId::DelayFeedback, 0.9);
    params.set(ParamId::DelayMs, 1000.0);
    params.set(ParamId::ChorusAmount, 1.0);
    params.set(ParamId::PwmAmount, 0.5);
    let mut synth = synth_with(&params);

    for key in [20, 24, 27, 32, 36, 39, 44, 48] {
        synth.note_on(key, 1.0);
    }
    let mut block = vec![0.0f32; 44100];
    synth.render_block(&mut block);
    assert!(block.iter().all(|s| s.is_finite() && s.abs() <= 0.999));
}

#[test]
fn nan_velocity_does_not_poison_the_delay_line() {
    let params = Arc::new(SynthParams::new());
    let mut synth = synth_with(&params);

    synth.note_on(30, f32::NAN);
    let mut block = vec![0.0f32; 512];
    synth.render_block(&mut block);
    assert!(block.iter().all(|s| s.is_finite()));
    synth.note_off(30);

    for key in 40..48 {
        synth.note_on(key, 1.0);
    }
    let mut block = vec![0.0f32; 44100];
    synth.render_block(&mut block);
    assert!(block.iter().all(|s| s.is_finite()));
    assert!(peak(&block) > 0.01);
}

#[test]
fn parameters_can_change_between_blocks() {
    let params = Arc::new(SynthParams::new());
    let mut synth = synth_with(&params);
    synth.note_on(35, 1.0);

    let mut block = vec![0.0f32; 1024];
    for osc_type in [0.0, 1.0, 2.0, 0.0] {
        params.set(ParamId::OscType, osc_type);
        synth.render_block(&mut block);
        assert!(peak(&block) > 0.01, "osc type {osc_type}");
    }
}
