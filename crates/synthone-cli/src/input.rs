//! Line-based control input for the `play` command.
//!
//! A line is either a command (`on 40`, `set CUTOFF 800`, `seq`, ...) or a
//! run of piano characters played as a chord. The piano layout spans two
//! rows of a QWERTY keyboard, lowest note first:
//!
//! ```text
//!  s d   g h j   2 3   5 6 7   9 0
//! z x c v b n m q w e r t y u i o p
//! ```
//!
//! `.` is a rest, only meaningful while editing the sequencer pattern.

/// Piano characters in key order; the character at index `i` plays key `i + 1`.
pub const PIANO_LAYOUT: &str = "zsxdcvgbhnjmq2w3er5t6y7ui9o0p";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Piano characters as keys before octave transpose; 0 is a rest.
    Keys(Vec<u8>),
    /// Press a key.
    On {
        /// Absolute key number.
        key: u8,
        /// Velocity, 0.0 to 1.0.
        velocity: f32,
    },
    /// Release a key.
    Off(u8),
    /// Set a parameter by label.
    Set {
        /// Parameter label, e.g. `PULSE WIDTH`.
        label: String,
        /// New value before clamping.
        value: f32,
    },
    /// Print a parameter's value.
    Get(String),
    /// Toggle sequencer playback.
    Seq,
    /// Toggle sequencer edit mode.
    Edit,
    /// Release every key.
    Panic,
    /// Release the chord played by the previous line.
    Release,
    /// Stop playing.
    Quit,
}

/// Key for a piano character.
pub fn piano_key(ch: char) -> Option<u8> {
    PIANO_LAYOUT
        .chars()
        .position(|c| c == ch.to_ascii_lowercase())
        .map(|i| i as u8 + 1)
}

/// Apply the octave transpose to a piano key; rests stay rests.
pub fn transpose(key: u8, octave: usize) -> u8 {
    if key == 0 {
        return 0;
    }
    let shifted = usize::from(key) + 12 * octave;
    u8::try_from(shifted).unwrap_or(u8::MAX)
}

/// Parse one line of input.
pub fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Release);
    }

    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    match word.to_ascii_lowercase().as_str() {
        "on" => {
            let mut args = rest.split_whitespace();
            let key = parse_key(args.next())?;
            let velocity = match args.next() {
                Some(v) => v
                    .parse::<f32>()
                    .map_err(|_| format!("invalid velocity '{v}'"))?,
                None => 1.0,
            };
            Ok(Input::On { key, velocity })
        }
        "off" => Ok(Input::Off(parse_key(rest.split_whitespace().next())?)),
        "set" => {
            // Labels contain spaces, so the value is the last word
            let (label, value) = rest
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| "usage: set LABEL VALUE".to_string())?;
            let value = value
                .parse::<f32>()
                .map_err(|_| format!("invalid value '{value}'"))?;
            Ok(Input::Set {
                label: label.trim().to_ascii_uppercase(),
                value,
            })
        }
        "get" if !rest.is_empty() => Ok(Input::Get(rest.to_ascii_uppercase())),
        "seq" => Ok(Input::Seq),
        "edit" => Ok(Input::Edit),
        "panic" => Ok(Input::Panic),
        "quit" | "exit" => Ok(Input::Quit),
        _ => parse_keys(line),
    }
}

fn parse_key(arg: Option<&str>) -> Result<u8, String> {
    let arg = arg.ok_or_else(|| "missing key".to_string())?;
    arg.parse::<u8>()
        .map_err(|_| format!("invalid key '{arg}'"))
}

fn parse_keys(line: &str) -> Result<Input, String> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '.' => Ok(0),
            _ => piano_key(c).ok_or_else(|| format!("unknown command or key '{c}'")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Input::Keys)
}
