//! Audible output through the default render device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use audio_studio_core::processing::offline_mixer::resample_linear;
use audio_studio_core::traits::audio_sink::AudioSink;

use crate::error::CpalError;

/// About one second of stereo audio at 96 kHz.
const RING_CAPACITY: usize = 96_000 * 2;

/// An `AudioSink` playing through the default output device.
///
/// Blocks are converted to the device's channel layout and rate and queued
/// in a lock-free ring drained by the output callback. When the ring is full
/// the newest samples are dropped.
pub struct CpalOutput {
    producer: Mutex<HeapProd<f32>>,
    sample_rate: u32,
    channels: u16,
    running: Arc<AtomicBool>,
    output_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalOutput {
    pub fn open_default() -> Result<Self, CpalError> {
        let (producer, consumer) = HeapRb::<f32>::new(RING_CAPACITY).split();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let handle = thread::Builder::new()
            .name("cpal-output".into())
            .spawn(move || {
                let (stream, rate, channels) = match build_output_stream(consumer) {
                    Ok(built) => built,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok((rate, channels)));
                while thread_running.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(20));
                }
                drop(stream);
            })
            .map_err(|e| CpalError::Thread(format!("failed to spawn output thread: {}", e)))?;

        let (sample_rate, channels) = ready_rx
            .recv()
            .map_err(|_| CpalError::Thread("output thread exited before starting".into()))??;
        log::info!("Audio output ready: {} Hz, {} ch", sample_rate, channels);

        Ok(Self {
            producer: Mutex::new(producer),
            sample_rate,
            channels,
            running,
            output_handle: Mutex::new(Some(handle)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn close(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.output_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl AudioSink for CpalOutput {
    fn write(&self, samples: &[f32], sample_rate: u32, channels: u16) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }
        let block = conform_block(samples, sample_rate, channels, self.sample_rate, self.channels);
        let mut producer = self.producer.lock();
        for sample in block {
            if producer.try_push(sample).is_err() {
                break;
            }
        }
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.close();
    }
}

/// Convert an interleaved block to the device layout.
///
/// Mono spreads to every device channel; otherwise channel `i` feeds device
/// channel `i` and extra device channels stay silent.
pub fn conform_block(
    samples: &[f32],
    source_rate: u32,
    source_channels: u16,
    target_rate: u32,
    target_channels: u16,
) -> Vec<f32> {
    let source_channels = source_channels.max(1) as usize;
    let target_channels = target_channels.max(1) as usize;
    let frames = samples.len() / source_channels;
    if frames == 0 || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }
    let output_frames = (frames as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;

    let planar: Vec<Vec<f32>> = (0..source_channels)
        .map(|c| {
            let channel: Vec<f32> = samples
                .chunks_exact(source_channels)
                .map(|frame| frame[c])
                .collect();
            resample_linear(&channel, source_rate, target_rate, output_frames)
        })
        .collect();

    let mut out = vec![0.0; output_frames * target_channels];
    for (frame, slot) in out.chunks_exact_mut(target_channels).enumerate() {
        for (c, sample) in slot.iter_mut().enumerate() {
            let source = if source_channels == 1 { Some(0) } else { (c < source_channels).then_some(c) };
            if let Some(source) = source {
                *sample = planar[source][frame];
            }
        }
    }
    out
}

fn build_output_stream(mut consumer: HeapCons<f32>) -> Result<(cpal::Stream, u32, u16), CpalError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(CpalError::NoDevice("output"))?;
    let config = device.default_output_config()?;
    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(CpalError::UnsupportedFormat(format!("{:?}", config.sample_format())));
    }
    let rate = config.sample_rate().0;
    let channels = config.channels();

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for sample in data.iter_mut() {
                *sample = consumer.try_pop().unwrap_or(0.0);
            }
        },
        |err| log::error!("Audio output error: {}", err),
        None,
    )?;
    stream.play()?;
    Ok((stream, rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_spreads_to_stereo() {
        let out = conform_block(&[0.1, 0.2], 48000, 1, 48000, 2);
        assert_eq!(out, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn extra_device_channels_are_silent() {
        let out = conform_block(&[0.1, -0.1], 44100, 2, 44100, 4);
        assert_eq!(out, vec![0.1, -0.1, 0.0, 0.0]);
    }

    #[test]
    fn upsampling_lengthens_block() {
        let out = conform_block(&[0.0; 441], 44100, 1, 48000, 1);
        assert_eq!(out.len(), 480);
    }

    #[test]
    fn partial_frames_are_ignored() {
        assert!(conform_block(&[0.5], 48000, 2, 48000, 2).is_empty());
    }
}
