//! Real-time audio output via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default channel count.
    pub channels: u16,
}

impl AudioDevice {
    fn from_device(device: &Device) -> Option<Self> {
        let name = device_name(device).ok()?;
        let (default_sample_rate, channels) = device
            .default_output_config()
            .map(|c| (c.sample_rate(), c.channels()))
            .unwrap_or((polywave_synth::DEFAULT_SAMPLE_RATE, 2));
        Some(Self {
            name,
            default_sample_rate,
            channels,
        })
    }
}

/// Output stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Buffer size in frames.
    pub buffer_size: u32,
    /// Output device: index, exact name or partial name (default device if `None`).
    pub output_device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: polywave_synth::DEFAULT_SAMPLE_RATE,
            buffer_size: 512,
            output_device: None,
        }
    }
}

/// List all audio output devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .filter_map(|d| AudioDevice::from_device(&d))
        .collect();
    Ok(devices)
}

/// The system default output device, if any.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host
        .default_output_device()
        .and_then(|d| AudioDevice::from_device(&d)))
}

/// A running output stream.
///
/// Audio plays while this value is alive; dropping it stops the stream.
pub struct OutputStream {
    _stream: Stream,
    device: String,
    sample_rate: u32,
    channels: u16,
}

impl std::fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStream")
            .field("device", &self.device)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl OutputStream {
    /// Open and start an f32 output stream.
    ///
    /// `render` is called from the audio thread with an interleaved buffer
    /// and the device channel count, and must fill every sample. It must not
    /// block.
    pub fn start<F>(config: &StreamConfig, mut render: F) -> Result<Self>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();
        let device = match &config.output_device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        let name = device_name(&device).unwrap_or_else(|_| String::from("<unnamed>"));

        let channels = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .channels();

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let frame_channels = usize::from(channels);
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render(data, frame_channels);
                },
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            device = %name,
            channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "output stream started"
        );

        Ok(Self {
            _stream: stream,
            device: name,
            sample_rate: config.sample_rate,
            channels,
        })
    }

    /// Name of the device the stream plays on.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Stream sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Find an output device by index, exact name, or partial name.
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    let names: Vec<Option<String>> = devices.iter().map(|d| device_name(d).ok()).collect();

    let index = select_by_name(&names, name_or_index)?;
    devices
        .get(index)
        .cloned()
        .ok_or_else(|| Error::DeviceNotFound(name_or_index.to_string()))
}

/// Pick an entry from `names` by numeric index, exact match, or
/// case-insensitive substring (first match wins).
pub(crate) fn select_by_name(names: &[Option<String>], name_or_index: &str) -> Result<usize> {
    if let Ok(index) = name_or_index.parse::<usize>() {
        if index < names.len() {
            return Ok(index);
        }
        return Err(Error::DeviceNotFound(format!(
            "index {} (only {} available)",
            index,
            names.len()
        )));
    }

    if let Some(index) = names
        .iter()
        .position(|n| n.as_deref() == Some(name_or_index))
    {
        return Ok(index);
    }

    let search_lower = name_or_index.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| {
            n.as_ref()
                .is_some_and(|n| n.to_lowercase().contains(&search_lower))
        })
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "nothing matching '{name_or_index}'"
        ))),
        [only] => Ok(*only),
        [first, ..] => {
            tracing::warn!(
                search = name_or_index,
                matches = matches.len(),
                "multiple matches, using the first"
            );
            Ok(*first)
        }
    }
}
