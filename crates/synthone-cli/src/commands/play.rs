//! Interactive play command.
//!
//! Wires the engine to the output device and runs three periodic tasks:
//! the buffer filler, the step sequencer and (optionally) the text scope.
//! Control input arrives as lines on stdin and, with `--midi`, as raw MIDI
//! bytes from a device node or pipe.

use std::fs::File;
use std::io::{BufRead, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Args;
use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use parking_lot::Mutex;
use synthone_config::{load_settings_or_defaults, resolve_settings_path, save_settings};
use synthone_io::{
    Engine, EngineConfig, MidiEvent, MidiParser, OutputStream, PcmProducer, RealtimeTask,
    StepSequencer, StreamConfig, pcm_queue, spawn_filler,
};
use synthone_synth::{ParamId, SynthParams};

use crate::input::{self, Input};
use crate::scope;

#[derive(Args)]
pub struct PlayArgs {
    /// Settings file to load at start and save on exit (defaults to ./saved_settings.txt)
    #[arg(value_name = "SETTINGS")]
    settings: Option<PathBuf>,

    /// Output device name or index
    #[arg(short, long)]
    device: Option<String>,

    /// Sample rate
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Device buffer size in frames
    #[arg(long, default_value = "1024")]
    buffer_frames: usize,

    /// Raw MIDI input (e.g. /dev/snd/midiC1D0)
    #[arg(long)]
    midi: Option<PathBuf>,

    /// Sequencer tempo in beats per minute
    #[arg(long, default_value = "120")]
    bpm: f32,

    /// Draw the waveform to stderr
    #[arg(long)]
    scope: bool,

    /// Do not write settings on exit
    #[arg(long)]
    no_save: bool,
}

type SharedEngine = Engine<PcmProducer>;

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let params = Arc::new(SynthParams::new());
    let settings_path = resolve_settings_path(args.settings.as_deref());
    let summary = load_settings_or_defaults(&params, &settings_path);
    tracing::info!(
        path = %settings_path.display(),
        applied = summary.applied,
        skipped = summary.skipped.len(),
        "settings loaded"
    );

    let config = EngineConfig {
        sample_rate: args.sample_rate,
        buffer_frames: args.buffer_frames.max(2),
        ..EngineConfig::default()
    };
    let (producer, consumer) = pcm_queue(config.queue_capacity());
    let engine = Engine::new(config, Arc::clone(&params), producer);
    engine.prefill();

    let stream_config = StreamConfig {
        device: args.device.clone(),
        ..StreamConfig::from(&config)
    };
    let stream = OutputStream::open(&stream_config, consumer)?;

    println!("Playing on {} at {} Hz", stream.device_name(), stream.sample_rate());
    print_help();

    let abort = Arc::new(AtomicBool::new(false));
    let a = Arc::clone(&abort);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        a.store(true, Ordering::SeqCst);
    })?;

    let filler = spawn_filler(engine.clone(), Arc::clone(&abort))?;

    let sequencer = Arc::new(Mutex::new(StepSequencer::new()));
    sequencer.lock().set_bpm(args.bpm);
    let sequencer_task = spawn_sequencer(&engine, &sequencer, &abort)?;

    let scope_task = if args.scope {
        Some(spawn_scope(&engine, &abort)?)
    } else {
        None
    };

    if let Some(path) = &args.midi {
        spawn_midi(path.clone(), engine.clone(), Arc::clone(&abort))?;
    }

    let lines = spawn_stdin_reader();
    control_loop(&engine, &sequencer, &lines, &abort);

    abort.store(true, Ordering::SeqCst);
    drop(scope_task);
    drop(sequencer_task);
    drop(filler);
    engine.all_notes_off();

    if stream.underruns() > 0 {
        tracing::warn!(underruns = stream.underruns(), "output ran dry during playback");
    }
    drop(stream);

    if !args.no_save {
        save_settings(&params, &settings_path)?;
        println!("Settings saved to {}", settings_path.display());
    }

    Ok(())
}

fn print_help() {
    println!();
    println!("Type piano keys and press Enter to play a chord; an empty line releases it:");
    println!("   s d   g h j   2 3   5 6 7   9 0");
    println!("  z x c v b n m q w e r t y u i o p");
    println!();
    println!("Commands: on KEY [VEL] | off KEY | set LABEL VALUE | get LABEL");
    println!("          seq | edit | panic | quit");
    println!("Press Ctrl+C to stop...\n");
}

fn spawn_sequencer(
    engine: &SharedEngine,
    sequencer: &Arc<Mutex<StepSequencer>>,
    abort: &Arc<AtomicBool>,
) -> anyhow::Result<RealtimeTask> {
    let interval = sequencer.lock().step_interval();
    let engine = engine.clone();
    let sequencer = Arc::clone(sequencer);
    let task = RealtimeTask::spawn("synthone-sequencer", interval, Arc::clone(abort), move || {
        let change = sequencer.lock().step();
        if let Some(change) = change {
            engine.note_change(change.on_key, change.off_key);
        }
    })?;
    Ok(task)
}

fn spawn_scope(engine: &SharedEngine, abort: &Arc<AtomicBool>) -> anyhow::Result<RealtimeTask> {
    let engine = engine.clone();
    let height = engine.config().vis_height;
    let task = RealtimeTask::spawn(
        "synthone-scope",
        Duration::from_millis(100),
        Arc::clone(abort),
        move || {
            if let Some(points) = engine.take_visualization() {
                eprint!("\x1b[2J\x1b[H{}", scope::render(&points, height, 64, 12));
            }
        },
    )?;
    Ok(task)
}

/// Read raw MIDI bytes on a detached thread; it ends at EOF, on a read
/// error, or on the first read after abort.
fn spawn_midi(path: PathBuf, engine: SharedEngine, abort: Arc<AtomicBool>) -> anyhow::Result<()> {
    let mut file = File::open(&path)
        .map_err(|e| anyhow::anyhow!("cannot open MIDI input {}: {}", path.display(), e))?;
    tracing::info!(path = %path.display(), "MIDI input opened");

    thread::Builder::new()
        .name("synthone-midi".to_string())
        .spawn(move || {
            let mut parser = MidiParser::new();
            let mut buf = [0u8; 64];
            while !abort.load(Ordering::Relaxed) {
                let n = match file.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(error = %e, "MIDI read failed");
                        break;
                    }
                };
                for event in parser.parse(&buf[..n]) {
                    match event {
                        MidiEvent::NoteOn { key, velocity } => {
                            engine.note_on(key, velocity);
                        }
                        MidiEvent::NoteOff { key } => {
                            engine.note_off(key);
                        }
                    }
                }
            }
            tracing::debug!("MIDI input closed");
        })?;
    Ok(())
}

/// Forward stdin lines to a channel so the control loop can poll the abort flag.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    let spawned = thread::Builder::new()
        .name("synthone-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "keyboard input unavailable");
    }
    rx
}

fn control_loop(
    engine: &SharedEngine,
    sequencer: &Mutex<StepSequencer>,
    lines: &Receiver<String>,
    abort: &AtomicBool,
) {
    let mut chord: Vec<u8> = Vec::new();

    while !abort.load(Ordering::SeqCst) {
        let line = match lines.recv_timeout(Duration::from_millis(50)) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            // Stdin closed: keep playing until Ctrl+C
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
        };

        let input = match input::parse(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match input {
            Input::Quit => break,
            Input::Keys(keys) => {
                release_chord(engine, &mut chord);
                let octave = engine.params().get_index(ParamId::Octave);
                let mut seq = sequencer.lock();
                for key in keys {
                    let key = input::transpose(key, octave);
                    seq.input(key);
                    if key != 0 && engine.note_on(key, 1.0).is_some() {
                        chord.push(key);
                    }
                }
            }
            Input::Release => release_chord(engine, &mut chord),
            Input::On { key, velocity } => {
                if engine.note_on(key, velocity).is_none() {
                    println!("key {key} not started (out of range or already held)");
                }
            }
            Input::Off(key) => {
                engine.note_off(key);
            }
            Input::Set { label, value } => match engine.params().by_label(&label) {
                Some(param) => println!("{} = {}", param.label(), param.set(value)),
                None => println!("unknown parameter '{label}'"),
            },
            Input::Get(label) => match engine.params().by_label(&label) {
                Some(param) => println!("{} = {}", param.label(), param.get()),
                None => println!("unknown parameter '{label}'"),
            },
            Input::Seq => {
                let running = sequencer.lock().toggle_run();
                println!("sequencer {}", if running { "running" } else { "stopped" });
            }
            Input::Edit => {
                let editing = sequencer.lock().toggle_edit();
                println!("pattern edit {}", if editing { "on" } else { "off" });
            }
            Input::Panic => {
                chord.clear();
                engine.all_notes_off();
            }
        }
    }
}

fn release_chord(engine: &SharedEngine, chord: &mut Vec<u8>) {
    for key in chord.drain(..) {
        engine.note_off(key);
    }
}
