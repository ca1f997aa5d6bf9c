//! Minimal MIDI byte-stream parser for note messages.
//!
//! Only note-on (`0x9n`) and note-off (`0x8n`) are understood, on any
//! channel. Every other status byte resets the parser and the data bytes
//! that follow it are ignored. Running status is honoured: after a note
//! status, further key/velocity pairs are parsed as the same message type
//! until another status byte arrives.

/// A parsed note message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiEvent {
    /// Key pressed with a velocity in `(0, 1]`.
    NoteOn {
        /// MIDI key number.
        key: u8,
        /// Velocity scaled from `1..=127`.
        velocity: f32,
    },
    /// Key released.
    NoteOff {
        /// MIDI key number.
        key: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    None,
    NoteOn,
    NoteOff,
}

/// Incremental parser; feed it bytes as they arrive.
///
/// # Example
///
/// ```rust
/// use synthone_io::{MidiEvent, MidiParser};
///
/// let mut parser = MidiParser::new();
/// let events: Vec<_> = parser.parse(&[0x91, 60, 127, 62, 0]).collect();
/// assert_eq!(
///     events,
///     vec![
///         MidiEvent::NoteOn { key: 60, velocity: 1.0 },
///         // Running status, velocity 0
///         MidiEvent::NoteOff { key: 62 },
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MidiParser {
    status: Status,
    key: Option<u8>,
}

impl Default for MidiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiParser {
    /// Create a parser waiting for a status byte.
    pub fn new() -> Self {
        Self {
            status: Status::None,
            key: None,
        }
    }

    /// Consume one byte, returning an event when a message completes.
    pub fn push(&mut self, byte: u8) -> Option<MidiEvent> {
        if byte & 0x80 != 0 {
            self.status = match byte >> 4 {
                0x9 => Status::NoteOn,
                0x8 => Status::NoteOff,
                _ => Status::None,
            };
            self.key = None;
            return None;
        }

        if self.status == Status::None {
            return None;
        }

        let Some(key) = self.key.take() else {
            self.key = Some(byte);
            return None;
        };

        let event = match self.status {
            Status::NoteOn if byte != 0 => MidiEvent::NoteOn {
                key,
                velocity: f32::from(byte) / 127.0,
            },
            _ => MidiEvent::NoteOff { key },
        };
        Some(event)
    }

    /// Parse a chunk of bytes, yielding each completed event.
    pub fn parse<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = MidiEvent> + 'a {
        bytes.iter().filter_map(move |&b| self.push(b))
    }

    /// Forget any partial message.
    pub fn reset(&mut self) {
        self.status = Status::None;
        self.key = None;
    }
}
