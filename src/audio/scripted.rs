//! Synthetic voice for running without a microphone

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use super::level::LoudnessSample;
use super::monitor::{LevelSender, LoudnessSource};

/// Plays a fixed loudness pattern (dB per slot) from its own thread
///
/// Slots at or below the silence floor are skipped, the same way the
/// microphone meter never emits silence.
pub struct ScriptedVoice {
    pattern: Vec<f32>,
    interval: Duration,
    repeat: bool,
    floor_db: f32,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ScriptedVoice {
    pub fn new(pattern: Vec<f32>, interval: Duration) -> Self {
        Self {
            pattern,
            interval,
            repeat: true,
            floor_db: crate::consts::SILENCE_FLOOR_DB,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Play the pattern once instead of looping
    pub fn once(mut self) -> Self {
        self.repeat = false;
        self
    }

    /// Skip slots at or below `floor_db` instead of the default floor
    pub fn with_floor(mut self, floor_db: f32) -> Self {
        self.floor_db = floor_db;
        self
    }

    /// A steady walker: mostly small hops with an occasional shout
    pub fn demo() -> Self {
        Self::new(
            vec![-30.0, -60.0, -25.0, -60.0, -15.0, -60.0, -60.0, -5.0, -60.0, -35.0],
            Duration::from_millis(120),
        )
    }
}

impl LoudnessSource for ScriptedVoice {
    fn start(&mut self, sink: LevelSender) {
        if self.is_active() {
            return;
        }
        // A finished one-shot pattern can be replayed
        if let Some(done) = self.worker.take() {
            let _ = done.join();
        }
        self.running.store(true, Ordering::Release);

        let running = self.running.clone();
        let pattern = self.pattern.clone();
        let interval = self.interval;
        let repeat = self.repeat;
        let floor_db = self.floor_db;
        self.worker = Some(std::thread::spawn(move || {
            loop {
                for &db in &pattern {
                    if !running.load(Ordering::Acquire) {
                        return;
                    }
                    if db > floor_db {
                        sink.send(LoudnessSample(db));
                    }
                    std::thread::sleep(interval);
                }
                if !repeat || pattern.is_empty() {
                    return;
                }
            }
        }));
        log::info!("Scripted voice started ({} slots)", self.pattern.len());
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Scripted voice thread panicked");
            }
            log::info!("Scripted voice stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for ScriptedVoice {
    fn drop(&mut self) {
        self.stop();
    }
}
