//! Audio output device listing command.

use clap::Args;
use synthone_io::list_output_devices;

#[derive(Args)]
pub struct DevicesArgs {
    /// Only show the default output device
    #[arg(long)]
    default: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_output_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    println!("Output Devices:");
    for device in devices.iter().filter(|d| !args.default || d.is_default) {
        let marker = if device.is_default { " (default)" } else { "" };
        println!(
            "  [{}] {} ({} Hz, {} ch){}",
            device.index, device.name, device.default_sample_rate, device.channels, marker
        );
    }
    println!();
    println!("Tip: select a device by index or partial name:");
    println!("  synthone play --device 0");
    println!("  synthone play --device \"USB\"");

    Ok(())
}
