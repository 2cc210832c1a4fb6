//! The dispatcher owns the [`PointerEngine`]. It is the only task that
//! touches sensor state, so the engine needs no locking: producers send
//! whole values over a channel and a ticker drives frame rebuilds.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_graceful_shutdown::SubsystemHandle;
use waymark_core::{AudioCueTracker, Frame, PointerEngine, SensorUpdate, TickOutcome};

use crate::render::{AudioPlayer, FrameSink};
use crate::sensors::Clock;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

pub struct Dispatcher {
    key: String,
    engine: PointerEngine,
    rx: mpsc::Receiver<SensorUpdate>,
    sink: Box<dyn FrameSink>,
    player: Box<dyn AudioPlayer>,
    cues: AudioCueTracker,
    clock: Clock,
    /// A sensor value was accepted since the last frame
    dirty: bool,
    frames: u64,
}

impl Dispatcher {
    pub fn new(
        engine: PointerEngine,
        rx: mpsc::Receiver<SensorUpdate>,
        sink: Box<dyn FrameSink>,
        player: Box<dyn AudioPlayer>,
        clock: Clock,
    ) -> Self {
        Dispatcher {
            key: String::from("dispatcher"),
            engine,
            rx,
            sink,
            player,
            cues: AudioCueTracker::new(),
            clock,
            dirty: false,
            frames: 0,
        }
    }

    fn apply(&mut self, update: SensorUpdate) {
        match self.engine.apply(update, self.clock.now_ms()) {
            Ok(change) => {
                log::trace!("{}: {:?} updated", self.key, change);
                self.dirty = true;
            }
            Err(e) => log::warn!("{}: rejected update: {}", self.key, e),
        }
    }

    fn tick(&mut self) -> Result<(), DispatchError> {
        let now_ms = self.clock.now_ms();
        if self.engine.take_fix_overdue(now_ms) {
            log::warn!(
                "{}: no position fix after {} ms",
                self.key,
                self.engine.config().fix.timeout_ms
            );
        }

        if !self.dirty {
            self.sink.unchanged(now_ms)?;
            return Ok(());
        }

        match self.engine.tick(now_ms) {
            TickOutcome::Rebuilt(frame) => self.show(&frame)?,
            TickOutcome::Throttled | TickOutcome::AwaitingSensors => {
                self.sink.unchanged(now_ms)?;
            }
        }
        Ok(())
    }

    fn show(&mut self, frame: &Frame) -> Result<(), DispatchError> {
        self.dirty = false;
        self.frames += 1;
        log::trace!(
            "{}: frame {} with {} segments",
            self.key,
            self.frames,
            frame.segments.len()
        );

        self.sink.frame(frame)?;
        for action in self.cues.update(frame.aligned.as_ref()) {
            self.player.perform(&action);
        }
        Ok(())
    }

    /// Render whatever the sources left behind
    fn finish(&mut self) -> Result<(), DispatchError> {
        if self.dirty {
            if let Some(frame) = self.engine.rebuild(self.clock.now_ms()) {
                self.show(&frame)?;
            }
        }
        if let Some(action) = self.cues.stop() {
            self.player.perform(&action);
        }
        log::debug!("{}: {} frames rendered", self.key, self.frames);
        Ok(())
    }

    pub async fn run(mut self, subsys: SubsystemHandle) -> Result<(), DispatchError> {
        log::debug!(
            "{}: {} landmarks, refresh every {} ms",
            self.key,
            self.engine.landmarks().len(),
            self.engine.config().refresh_interval_ms
        );

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.engine.config().refresh_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("{}: shutdown", self.key);
                    return self.finish();
                },

                r = self.rx.recv() => {
                    match r {
                        Some(update) => self.apply(update),
                        None => {
                            log::debug!("{}: all sensor sources ended", self.key);
                            let result = self.finish();
                            subsys.request_shutdown();
                            return result;
                        }
                    }
                },

                _ = ticker.tick() => {
                    self.tick()?;
                }
            }
        }
    }
}
