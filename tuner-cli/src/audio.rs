//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects the default input device, opens a stream near 44.1 kHz and
//! slices the incoming samples into fixed-size mono frames for the tuner.
//!
//! ## Features
//! - Automatic audio device selection
//! - Closest supported sample rate to the target
//! - Down-mixing of interleaved multi-channel input to mono
//! - Frames dropped, never queued without bound, when analysis falls behind

use anyhow::{Context, Result, anyhow, ensure};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

/// Sample rate requested from the device when it supports it.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// A running input stream and the sample rate it was opened at.
///
/// Dropping the capture closes the stream.
pub struct Capture {
    pub stream: cpal::Stream,
    pub sample_rate: u32,
}

/// Starts audio capture from the default input device.
///
/// Every `frame_size` mono samples are sent as one frame through `sender`.
/// When the channel is full the frame is discarded so the audio callback
/// never blocks.
///
/// # Returns
/// * `Ok(capture)` - Playing stream and its sample rate
/// * `Err(e)` - Zero frame size, no device, no f32 input format, or stream setup failed
pub fn start_audio_capture(sender: Sender<Vec<f32>>, frame_size: usize) -> Result<Capture> {
    ensure!(frame_size > 0, "frame size must be positive");

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    let device_name = device.name()?;
    tracing::info!(device = %device_name, "using audio input device");

    let configs = device
        .supported_input_configs()
        .context("querying supported input configs")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = closest_rate(&supported_config, TARGET_SAMPLE_RATE);
    let config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();
    let channels = usize::from(config.channels.max(1));

    tracing::info!(sample_rate, channels, frame_size, "selected input format");

    let err_fn =
        |err: cpal::StreamError| tracing::error!("an error occurred on the audio stream: {err}");

    // Accumulates mono samples across callbacks until a full frame exists.
    let mut audio_buffer: Vec<f32> = Vec::with_capacity(frame_size.saturating_mul(2));

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                audio_buffer.extend(downmix(data, channels));

                while audio_buffer.len() >= frame_size {
                    let frame: Vec<f32> = audio_buffer.drain(..frame_size).collect();
                    if sender.try_send(frame).is_err() {
                        tracing::trace!("analysis behind, dropping frame");
                    }
                }
            },
            err_fn,
            None,
        )
        .context("building input stream")?;

    stream.play().context("starting input stream")?;

    Ok(Capture {
        stream,
        sample_rate,
    })
}

/// Averages each interleaved group of `channels` samples into one.
fn downmix(data: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    data.chunks(channels)
        .map(move |group| group.iter().sum::<f32>() / group.len() as f32)
}

/// Picks the f32 configuration whose rate range comes closest to `target_rate`,
/// preferring fewer channels on a tie.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate = closest_rate(c, target_rate);
            (rate.abs_diff(target_rate), c.channels())
        })
}

fn closest_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}
