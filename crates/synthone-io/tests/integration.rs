//! Integration tests for the real-time path, run without an audio device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use synthone_io::{
    AudioQueue, Engine, EngineConfig, MidiEvent, MidiParser, StepSequencer, pcm_queue,
    spawn_filler,
};
use synthone_synth::{ParamId, SynthParams};

fn config(buffer_frames: usize) -> EngineConfig {
    EngineConfig {
        buffer_frames,
        vis_width: 32,
        ..EngineConfig::default()
    }
}

#[test]
fn producer_keeps_queue_at_target_depth() {
    let config = config(512);
    let (producer, mut consumer) = pcm_queue(config.queue_capacity());
    let engine = Engine::new(config, Arc::new(SynthParams::new()), producer);
    engine.note_on(40, 1.0);

    assert_eq!(engine.prefill(), 256);
    assert_eq!(consumer.queued_frames(), 256);

    // Simulate the device draining 128 frames between ticks
    let mut out = [0.0f32; 128];
    for _ in 0..20 {
        engine.fill();
        assert!(engine.with_state(|s| s.queue().queued_frames()) <= 512);
        consumer.fill(&mut out, 1);
    }
    assert_eq!(consumer.underruns(), 0);
    assert!(out.iter().any(|s| *s != 0.0));
}

#[test]
fn consumer_plays_what_the_synth_rendered() {
    let config = config(64);
    let params = Arc::new(SynthParams::new());
    params.set(ParamId::OscType, 1.0);

    let (producer, mut consumer) = pcm_queue(config.queue_capacity());
    let engine = Engine::new(config, Arc::clone(&params), producer);
    engine.note_on(45, 1.0);
    engine.prefill();

    let mut reference = synthone_synth::Synth::new(44100.0, params);
    reference.note_on(45, 1.0);
    let mut expected = [0.0f32; 32];
    reference.render_block(&mut expected);

    let mut out = [0.0f32; 64];
    assert_eq!(consumer.fill(&mut out, 2), 32);
    for (i, &e) in expected.iter().enumerate() {
        let pcm = synthone_io::to_pcm(e);
        let played = f32::from(pcm) / f32::from(i16::MAX);
        assert_eq!(out[2 * i], played);
        assert_eq!(out[2 * i + 1], played);
    }
}

#[test]
fn realtime_task_fills_until_abort() {
    let config = config(256);
    let engine = Engine::new(config, Arc::new(SynthParams::new()), Vec::new());
    let abort = Arc::new(AtomicBool::new(false));

    let task = spawn_filler(engine.clone(), Arc::clone(&abort)).unwrap();
    // Vec never drains, so the producer stops at the target depth
    while engine.with_state(|s| s.queue().queued_frames()) < 256 {
        thread::sleep(Duration::from_millis(1));
    }
    abort.store(true, Ordering::Relaxed);
    while !task.is_finished() {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(engine.frame(), 256);
    assert!(task.ticks() >= 2);
}

#[test]
fn note_events_interleave_with_the_producer() {
    let config = config(256);
    let engine = Engine::new(config, Arc::new(SynthParams::new()), Vec::new());
    let abort = Arc::new(AtomicBool::new(false));

    let drain = engine.clone();
    let task = spawn_filler(engine.clone(), Arc::clone(&abort)).unwrap();
    for key in 1..=60u8 {
        engine.note_on(key, 0.5);
        drain.with_state(|s| s.queue_mut().clear());
        thread::sleep(Duration::from_micros(200));
        engine.note_off(key);
    }
    drop(task);

    assert!(engine.frame() > 0);
    let active = engine.with_state(|s| s.synth().voices().active_voice_count());
    assert_eq!(active, 8);
}

#[test]
fn midi_drives_the_engine() {
    let engine = Engine::new(config(64), Arc::new(SynthParams::new()), Vec::new());
    let mut parser = MidiParser::new();

    let bytes = [0x90, 30, 127, 0x90, 35, 64];
    for event in parser.parse(&bytes) {
        if let MidiEvent::NoteOn { key, velocity } = event {
            engine.note_on(key, velocity);
        }
    }
    engine.fill();

    for event in parser.parse(&[0x80, 30, 0]) {
        if let MidiEvent::NoteOff { key } = event {
            engine.note_off(key);
        }
    }

    let (held, lowest) = engine.with_state(|s| {
        (
            s.synth().voices().held_voice_count(),
            s.synth().lowest_held_key(),
        )
    });
    assert_eq!(held, 1);
    assert_eq!(lowest, Some(35));
}

#[test]
fn sequencer_steps_through_the_engine() {
    let engine = Engine::new(config(64), Arc::new(SynthParams::new()), Vec::new());
    let mut seq = StepSequencer::new();
    seq.toggle_run();

    for _ in 0..5 {
        if let Some(change) = seq.step() {
            engine.note_change(change.on_key, change.off_key);
        }
        engine.with_state(|s| s.queue_mut().clear());
        engine.fill();
    }
    // Step 5 of the initial pattern holds key 6
    assert_eq!(
        engine.with_state(|s| s.synth().lowest_held_key()),
        Some(seq.steps()[5])
    );

    seq.toggle_run();
    let change = seq.step().unwrap();
    engine.note_change(change.on_key, change.off_key);
    assert_eq!(engine.with_state(|s| s.synth().lowest_held_key()), None);
}

#[test]
fn visualization_windows_keep_coming() {
    let engine = Engine::new(config(4096), Arc::new(SynthParams::new()), Vec::new());
    engine.note_on(30, 1.0);

    let mut windows = 0;
    for _ in 0..40 {
        engine.with_state(|s| s.queue_mut().clear());
        engine.fill();
        if let Some(window) = engine.take_visualization() {
            assert_eq!(window.len(), 32);
            assert!(window.iter().all(|y| (0.0..=768.0).contains(y)));
            windows += 1;
        }
    }
    assert!(windows >= 10, "only {windows} windows");
}
