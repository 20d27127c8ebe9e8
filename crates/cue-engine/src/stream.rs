//! Output device resolution and stream construction (cpal)

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SupportedStreamConfig};
use parking_lot::Mutex;

use crate::mixer::MixerState;
use crate::{EngineConfig, EngineError, EngineResult};

/// Keeps the cpal stream alive for the engine's lifetime.
///
/// `cpal::Stream` is neither `Send` nor `Sync`; the holder is never
/// accessed from more than one thread at a time (the audio callback runs
/// on cpal's own thread and does not see the holder).
pub(crate) struct StreamHolder(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for StreamHolder {}
unsafe impl Sync for StreamHolder {}

/// Open the configured output device, start the stream and hand back the
/// mixer state shared with its callback.
pub(crate) fn open_output(
    config: &EngineConfig,
) -> EngineResult<(StreamHolder, Arc<Mutex<MixerState>>)> {
    let (device, supported) = resolve_output(config)?;
    let sample_rate = config.sample_rate.unwrap_or(supported.sample_rate());
    let channels = supported.channels();

    let shared = Arc::new(Mutex::new(MixerState::new(sample_rate)));
    let stream = build_output_stream(&device, &supported, sample_rate, Arc::clone(&shared))?;
    stream
        .play()
        .map_err(|e| EngineError::StreamError(e.to_string()))?;

    log::info!(
        "audio output started: '{}', {} Hz, {} ch, {:?}",
        device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate,
        channels,
        supported.sample_format()
    );

    Ok((StreamHolder(stream), shared))
}

fn resolve_output(config: &EngineConfig) -> EngineResult<(Device, SupportedStreamConfig)> {
    let host = cpal::default_host();

    let device = match &config.output_device {
        Some(name) => host
            .output_devices()
            .map_err(|e| EngineError::ConfigError(e.to_string()))?
            .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(name.clone()))?,
        None => host.default_output_device().ok_or(EngineError::NoDevice)?,
    };

    let supported = device
        .default_output_config()
        .map_err(|e| EngineError::ConfigError(e.to_string()))?;

    Ok((device, supported))
}

fn build_output_stream(
    device: &Device,
    supported: &SupportedStreamConfig,
    sample_rate: u32,
    shared: Arc<Mutex<MixerState>>,
) -> EngineResult<cpal::Stream> {
    let channels = supported.channels() as usize;
    let stream_config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    fn err_fn(e: cpal::StreamError) {
        log::error!("audio stream error: {e}");
    }

    let stream = match supported.sample_format() {
        SampleFormat::F32 => {
            let mut scratch = Vec::new();
            device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    write_frames(&shared, &mut scratch, data, channels, |s| s);
                },
                err_fn,
                None,
            )
        }
        SampleFormat::I16 => {
            let mut scratch = Vec::new();
            device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    write_frames(&shared, &mut scratch, data, channels, |s| {
                        (s * 32767.0).clamp(-32768.0, 32767.0) as i16
                    });
                },
                err_fn,
                None,
            )
        }
        SampleFormat::U16 => {
            let mut scratch = Vec::new();
            device.build_output_stream(
                &stream_config,
                move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                    write_frames(&shared, &mut scratch, data, channels, |s| {
                        ((s.clamp(-1.0, 1.0) * 0.5 + 0.5) * 65535.0) as u16
                    });
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(EngineError::ConfigError(format!(
                "unsupported sample format {other:?}"
            )));
        }
    }
    .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

    Ok(stream)
}

/// Render a stereo block and fan it out to the device's channel layout.
fn write_frames<T: Copy>(
    shared: &Arc<Mutex<MixerState>>,
    scratch: &mut Vec<f32>,
    data: &mut [T],
    channels: usize,
    convert: impl Fn(f32) -> T,
) {
    let frames = data.len() / channels.max(1);
    scratch.resize(frames * 2, 0.0);
    shared.lock().render(scratch);

    for i in 0..frames {
        let l = scratch[i * 2];
        let r = scratch[i * 2 + 1];
        if channels == 1 {
            data[i] = convert((l + r) * 0.5);
        } else {
            data[i * channels] = convert(l);
            data[i * channels + 1] = convert(r);
            for c in 2..channels {
                data[i * channels + c] = convert(0.0);
            }
        }
    }
}
