//! Settings persistence for the synthone synthesizer.
//!
//! Parameters are stored as plain text, one `LABEL = value` pair per line, in
//! the registry's group order. Loading is forgiving: unknown labels and
//! malformed values are reported through `tracing` and skipped, and a missing
//! file leaves the defaults in place.
//!
//! # Example
//!
//! ```rust,no_run
//! use synthone_config::{load_settings_or_defaults, paths, save_settings};
//! use synthone_synth::SynthParams;
//!
//! let params = SynthParams::new();
//! let path = paths::default_settings_path();
//!
//! load_settings_or_defaults(&params, &path);
//! // ... play ...
//! save_settings(&params, &path).unwrap();
//! ```

mod error;
mod settings;

/// Platform-specific settings locations.
pub mod paths;

pub use error::ConfigError;
pub use settings::{
    DEFAULT_SETTINGS_FILE, LoadSummary, apply_settings, format_settings, load_settings,
    load_settings_or_defaults, parse_line, save_settings,
};
pub use paths::{default_settings_path, resolve_settings_path, user_config_dir, user_settings_path};
