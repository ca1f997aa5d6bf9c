//! Parameter listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use std::path::PathBuf;

use clap::Args;
use synthone_config::{load_settings, resolve_settings_path};
use synthone_synth::{ParamGroup, SynthParams};

#[derive(Args)]
pub struct ParamsArgs {
    /// Settings file to show values from (defaults to ./saved_settings.txt)
    #[arg(value_name = "SETTINGS")]
    settings: Option<PathBuf>,

    /// Show built-in defaults instead of loading a settings file
    #[arg(long)]
    defaults: bool,
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let params = SynthParams::new();

    if !args.defaults {
        let path = resolve_settings_path(args.settings.as_deref());
        match load_settings(&params, &path) {
            Ok(summary) => println!("Values from {} ({} applied)\n", path.display(), summary.applied),
            Err(e) if args.settings.is_some() => return Err(e.into()),
            Err(_) => println!("No settings at {}, showing defaults\n", path.display()),
        }
    }

    for group in ParamGroup::ALL {
        println!("{}", group.name());
        println!("{}", "=".repeat(group.name().len()));
        println!(
            "  {:16}  {:>10}  {:>10}  {:>20}",
            "Label", "Value", "Default", "Range"
        );
        for param in params.group(group) {
            let range = format!("{} .. {}", param.min(), param.max());
            let quantized = if param.is_quantized() { " (steps)" } else { "" };
            println!(
                "  {:16}  {:>10}  {:>10}  {:>20}{}",
                param.label(),
                param.get(),
                param.default_value(),
                range,
                quantized
            );
        }
        println!();
    }

    Ok(())
}
