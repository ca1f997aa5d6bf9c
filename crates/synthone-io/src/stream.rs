//! Audio output via cpal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, Stream};

use crate::engine::EngineConfig;
use crate::queue::PcmConsumer;
use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone)]
pub struct OutputDevice {
    /// Position in the host's device list; usable as a selector.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default channel count.
    pub channels: u16,
    /// Whether this is the host's default output.
    pub is_default: bool,
}

/// Output stream configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Device buffer size in frames.
    pub buffer_frames: u32,
    /// Output device name or index (uses default if `None`).
    pub device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for StreamConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            buffer_frames: config.buffer_frames as u32,
            device: None,
        }
    }
}

/// List all output devices.
pub fn list_output_devices() -> Result<Vec<OutputDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let outputs = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;

    let mut devices = Vec::new();
    for (index, device) in outputs.enumerate() {
        let Ok(name) = device_name(&device) else {
            continue;
        };
        let (default_sample_rate, channels) = device
            .default_output_config()
            .map(|c| (c.sample_rate(), c.channels()))
            .unwrap_or((44100, 2));

        devices.push(OutputDevice {
            index,
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
            default_sample_rate,
            channels,
        });
    }

    Ok(devices)
}

/// Get the default output device info.
pub fn default_output_device() -> Result<Option<OutputDevice>> {
    Ok(list_output_devices()?.into_iter().find(|d| d.is_default))
}

/// Find an output device by index, exact name, or case-insensitive partial name.
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();

    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                devices.len()
            ))
        });
    }

    if let Some(device) = devices
        .iter()
        .find(|d| device_name(d).is_ok_and(|n| n == name_or_index))
    {
        return Ok(device.clone());
    }

    let search_lower = name_or_index.to_lowercase();
    let mut matches: Vec<_> = devices
        .iter()
        .filter_map(|d| {
            device_name(d)
                .ok()
                .filter(|name| name.to_lowercase().contains(&search_lower))
                .map(|name| (d.clone(), name))
        })
        .collect();

    match matches.len() {
        0 => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            name_or_index
        ))),
        1 => Ok(matches.remove(0).0),
        _ => {
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                search = name_or_index,
                ?names,
                "multiple output devices match, using the first"
            );
            Ok(matches.remove(0).0)
        }
    }
}

/// A playing output stream fed from a [`PcmConsumer`].
///
/// The stream plays until dropped.
pub struct OutputStream {
    _stream: Stream,
    device_name: String,
    channels: u16,
    sample_rate: u32,
    underruns: Arc<AtomicU64>,
}

impl OutputStream {
    /// Open the configured device and start playing `consumer`.
    pub fn open(config: &StreamConfig, mut consumer: PcmConsumer) -> Result<Self> {
        let host = cpal::default_host();
        let device = match &config.device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        let device_name = device_name(&device).unwrap_or_else(|_| "<unknown>".to_string());

        let sample_rate = config.sample_rate;
        let channels = device
            .supported_output_configs()
            .map_err(|e| Error::Stream(e.to_string()))?
            .filter(|c| {
                c.sample_format() == SampleFormat::F32
                    && c.min_sample_rate() <= sample_rate
                    && sample_rate <= c.max_sample_rate()
            })
            .map(|c| c.channels())
            .min()
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "{} does not play f32 at {} Hz",
                    device_name, sample_rate
                ))
            })?;

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_frames),
        };

        let underruns = consumer.underrun_counter();
        let out_channels = usize::from(channels);
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    consumer.fill(data, out_channels);
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        tracing::info!(
            device = %device_name,
            sample_rate,
            channels,
            buffer_frames = config.buffer_frames,
            "output stream started"
        );

        Ok(Self {
            _stream: stream,
            device_name,
            channels,
            sample_rate,
            underruns,
        })
    }

    /// Name of the device being played.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Channel count of the device stream; the mono signal is copied to each.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Callbacks so far that found the queue short.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_config_follows_engine() {
        let engine = EngineConfig {
            sample_rate: 48000,
            buffer_frames: 256,
            ..EngineConfig::default()
        };
        let config = StreamConfig::from(&engine);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_frames, 256);
        assert!(config.device.is_none());
    }

    #[test]
    fn default_stream_config() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.buffer_frames, 1024);
    }
}
