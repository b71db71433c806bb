//! Microphone level monitor
//!
//! Captures the default input device with cpal and posts loudness samples to
//! the simulation through a bounded channel. The audio callback only measures
//! and `try_send`s; it never blocks and never touches simulation state.
//!
//! Capture is best-effort: a missing device or a failed stream is logged and
//! the monitor simply stays silent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use super::level::{LevelMeter, LoudnessSample};
use crate::consts::{ANALYSIS_WINDOW, SILENCE_FLOOR_DB};

/// Producer half of the audio → simulation hand-off
#[derive(Debug, Clone)]
pub struct LevelSender {
    tx: Sender<LoudnessSample>,
    dropped: Arc<AtomicU64>,
}

impl LevelSender {
    /// Post a sample without blocking; returns false if it was not queued
    pub fn send(&self, sample: LoudnessSample) -> bool {
        match self.tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            // Receiver gone: the session was torn down
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half, drained by the simulation loop at tick start
#[derive(Debug)]
pub struct LevelReceiver {
    rx: Receiver<LoudnessSample>,
    dropped: Arc<AtomicU64>,
}

impl LevelReceiver {
    /// Everything queued since the last drain, oldest first
    pub fn drain(&self) -> impl Iterator<Item = LoudnessSample> + '_ {
        self.rx.try_iter()
    }

    /// Throw away queued samples, returning how many were discarded
    pub fn discard(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Samples lost because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a bounded hand-off channel
pub fn level_channel(capacity: usize) -> (LevelSender, LevelReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        LevelSender {
            tx,
            dropped: dropped.clone(),
        },
        LevelReceiver { rx, dropped },
    )
}

/// Anything that can feed loudness samples into a session
pub trait LoudnessSource {
    /// Begin producing samples into `sink`; no-op if already active
    fn start(&mut self, sink: LevelSender);
    /// Stop producing and release any held resource; safe to call repeatedly
    fn stop(&mut self);
    /// Whether samples may currently be produced
    fn is_active(&self) -> bool;
}

/// Why capture could not be opened
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no default input device")]
    NoInputDevice,
    #[error("unsupported sample format {0:?}")]
    UnsupportedFormat(SampleFormat),
    #[error("failed to query input config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start input stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// Live microphone monitor
///
/// Holds the input stream between `start` and `stop`; dropping the stream is
/// what releases the device, so `Drop` covers abnormal teardown too.
pub struct AudioLevelMonitor {
    floor_db: f32,
    window: usize,
    stream: Option<Stream>,
}

impl Default for AudioLevelMonitor {
    fn default() -> Self {
        Self::new(SILENCE_FLOOR_DB)
    }
}

impl AudioLevelMonitor {
    pub fn new(floor_db: f32) -> Self {
        Self {
            floor_db,
            window: ANALYSIS_WINDOW,
            stream: None,
        }
    }

    fn open_stream(&self, sink: LevelSender) -> Result<Stream, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;
        let supported = device.default_input_config()?;
        let format = supported.sample_format();
        let config: StreamConfig = supported.config();

        log::info!(
            "Opening microphone '{}' ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate.0,
            config.channels,
            format
        );

        let meter = LevelMeter::new(self.window, self.floor_db);
        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, meter, sink)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, meter, sink)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, meter, sink)?,
            other => return Err(CaptureError::UnsupportedFormat(other)),
        };
        stream.play()?;
        Ok(stream)
    }
}

/// Build an input stream that meters the first channel of each frame
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut meter: LevelMeter,
    sink: LevelSender,
) -> Result<Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            meter_input(data, channels, &mut meter, &sink);
        },
        |err| log::warn!("Microphone stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// Meter the first channel of an interleaved buffer and post loud windows
fn meter_input<T>(data: &[T], channels: usize, meter: &mut LevelMeter, sink: &LevelSender)
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mono = data
        .iter()
        .step_by(channels.max(1))
        .map(|&s| f32::from_sample_(s));
    meter.push(mono, |sample| {
        sink.send(sample);
    });
}

impl LoudnessSource for AudioLevelMonitor {
    fn start(&mut self, sink: LevelSender) {
        if self.stream.is_some() {
            return;
        }
        match self.open_stream(sink) {
            Ok(stream) => {
                self.stream = Some(stream);
                log::info!("Microphone capture started");
            }
            Err(e) => log::warn!("Microphone unavailable, running silent: {}", e),
        }
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            log::info!("Microphone capture stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for AudioLevelMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
