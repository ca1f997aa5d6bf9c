//! `LABEL = value` settings files.
//!
//! One parameter per line, written in registry group order:
//!
//! ```text
//! LINEAR GAIN = 0.7
//! PULSE/SAW/FM = 0
//! ...
//! ```
//!
//! Values are written with Rust's shortest round-trip float formatting, so a
//! save followed by a load reproduces every value exactly. The loader applies
//! each line whose label exactly matches a parameter; blank lines are skipped,
//! and unknown labels or malformed values are reported and skipped without
//! affecting the rest of the file.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use synthone_synth::SynthParams;

use crate::ConfigError;

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "saved_settings.txt";

/// Outcome of applying a settings text.
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Number of parameters set.
    pub applied: usize,
    /// Lines that were skipped, with the reason.
    pub skipped: Vec<ConfigError>,
}

impl LoadSummary {
    /// Whether every non-blank line was applied.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Render every parameter as `LABEL = value` lines, in group order.
pub fn format_settings(params: &SynthParams) -> String {
    let mut out = String::new();
    for param in params.iter() {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{} = {}", param.label(), param.get());
    }
    out
}

/// Split one line into label and value.
///
/// Returns `Ok(None)` for blank lines. `line_number` is 1-based and only used
/// for error reporting.
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<(&str, f32)>, ConfigError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (label, value) = line
        .split_once('=')
        .ok_or_else(|| ConfigError::parse(line_number, format!("missing '=' in \"{line}\"")))?;

    let label = label.trim_end();
    let value = value.trim();
    let value: f32 = value
        .parse()
        .map_err(|e| ConfigError::parse(line_number, format!("bad value \"{value}\": {e}")))?;

    Ok(Some((label, value)))
}

/// Apply a settings text to `params`, reporting every skipped line.
pub fn apply_settings(params: &SynthParams, text: &str) -> LoadSummary {
    let mut summary = LoadSummary::default();

    for (index, line) in text.lines().enumerate() {
        let result = parse_line(line, index + 1).and_then(|parsed| {
            let Some((label, value)) = parsed else {
                return Ok(false);
            };
            let param = params
                .by_label(label)
                .ok_or_else(|| ConfigError::UnknownParameter(label.to_string()))?;
            let stored = param.set(value);
            tracing::debug!(label, value = stored, "setting applied");
            Ok(true)
        });

        match result {
            Ok(true) => summary.applied += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("skipping settings line: {e}");
                summary.skipped.push(e);
            }
        }
    }

    summary
}

/// Load settings from `path` into `params`.
///
/// A missing or unreadable file is an error; the caller decides whether to
/// carry on with the defaults.
pub fn load_settings(params: &SynthParams, path: impl AsRef<Path>) -> Result<LoadSummary, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let summary = apply_settings(params, &text);
    tracing::info!(
        path = %path.display(),
        applied = summary.applied,
        skipped = summary.skipped.len(),
        "settings loaded"
    );
    Ok(summary)
}

/// Load settings if possible, otherwise report and keep the current values.
pub fn load_settings_or_defaults(params: &SynthParams, path: impl AsRef<Path>) -> LoadSummary {
    match load_settings(params, path) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("{e}; keeping default settings");
            LoadSummary::default()
        }
    }
}

/// Write every parameter to `path`, creating parent directories as needed.
pub fn save_settings(params: &SynthParams, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }
    fs::write(path, format_settings(params)).map_err(|e| ConfigError::write_file(path, e))?;
    tracing::info!(path = %path.display(), "settings saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthone_synth::{PARAM_COUNT, ParamId};

    #[test]
    fn format_writes_every_parameter_in_order() {
        let params = SynthParams::new();
        let text = format_settings(&params);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), PARAM_COUNT);
        assert_eq!(lines[0], "LINEAR GAIN = 0.7");
        assert_eq!(lines[1], "PULSE/SAW/FM = 0");
        assert!(lines.contains(&"DELAY [MS] = 600"));
    }

    #[test]
    fn parse_line_variants() {
        assert!(matches!(parse_line("   ", 1), Ok(None)));
        assert_eq!(parse_line("CUTOFF = 1200.5", 1).unwrap(), Some(("CUTOFF", 1200.5)));
        assert_eq!(parse_line("S=0.25\r", 1).unwrap(), Some(("S", 0.25)));
        assert!(matches!(
            parse_line("CUTOFF 1200", 7),
            Err(ConfigError::Parse { line: 7, .. })
        ));
        assert!(matches!(
            parse_line("CUTOFF = loud", 2),
            Err(ConfigError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn apply_skips_bad_lines_and_keeps_going() {
        let params = SynthParams::new();
        let text = "A = 12\nWOBBLE = 3\nD = nope\n\nRESONANCE = 0.5\n";
        let summary = apply_settings(&params, text);

        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped.len(), 2);
        assert!(!summary.is_clean());
        assert_eq!(params.get(ParamId::Attack), 12.0);
        assert_eq!(params.get(ParamId::Decay), 25.0);
        assert_eq!(params.get(ParamId::Resonance), 0.5);
    }

    #[test]
    fn apply_clamps_and_quantizes() {
        let params = SynthParams::new();
        apply_settings(&params, "OSC COUNT = 2.7\nCUTOFF = 99999\n");
        assert_eq!(params.get(ParamId::OscCount), 3.0);
        assert_eq!(params.get(ParamId::Cutoff), 17000.0);
    }

    #[test]
    fn label_must_match_exactly() {
        let params = SynthParams::new();
        let summary = apply_settings(&params, "CUTOFF LFO = 2\n");
        assert_eq!(summary.applied, 0);
        assert_eq!(params.get(ParamId::CutoffLfoFreq), 0.0);
    }
}
