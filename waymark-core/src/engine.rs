//! Pointer Engine
//!
//! Owns everything that changes over time: the sensor state, the cached
//! observations and the refresh throttle. The caller is a single
//! dispatcher that feeds sensor updates in and calls [`PointerEngine::tick`]
//! at a fixed interval.
//!
//! ```rust,ignore
//! let mut engine = PointerEngine::new(config, catalog.landmarks, now_ms())?;
//!
//! engine.apply(SensorUpdate::Heading(92.0), now_ms())?;
//!
//! if let TickOutcome::Rebuilt(frame) = engine.tick(now_ms()) {
//!     renderer.draw(&frame.draw_commands());
//! }
//! ```

use std::sync::Arc;

use crate::config::{ConfigError, RadarConfig};
use crate::frame::{Frame, FrameBuilder};
use crate::landmark::{observe_all, Landmark, Observation};
use crate::state::{
    RefreshThrottle, SensorChange, SensorError, SensorSnapshot, SensorState, SensorUpdate,
};

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A new frame was built
    Rebuilt(Frame),
    /// Too soon after the previous rebuild
    Throttled,
    /// Position or heading not known yet
    AwaitingSensors,
}

/// Stateful driver of the layout pipeline
#[derive(Debug)]
pub struct PointerEngine {
    config: RadarConfig,
    landmarks: Arc<[Landmark]>,
    builder: FrameBuilder,
    state: SensorState,
    throttle: RefreshThrottle,
    /// Observations for the current position, refreshed on position change
    observations: Vec<Observation>,
}

impl PointerEngine {
    /// Create an engine. Fails if the configuration is invalid.
    pub fn new(
        config: RadarConfig,
        landmarks: impl Into<Arc<[Landmark]>>,
        now_ms: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(PointerEngine {
            builder: FrameBuilder::new(&config),
            state: SensorState::new(config.fix, now_ms),
            throttle: RefreshThrottle::new(config.refresh_interval_ms),
            landmarks: landmarks.into(),
            observations: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    /// Shared read-only catalog
    pub fn landmarks(&self) -> &Arc<[Landmark]> {
        &self.landmarks
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn snapshot(&self) -> Option<SensorSnapshot> {
        self.state.snapshot()
    }

    /// Apply a sensor update. Observations are recomputed when the
    /// position changes.
    pub fn apply(&mut self, update: SensorUpdate, now_ms: u64) -> Result<SensorChange, SensorError> {
        let change = self.state.apply(update, now_ms)?;
        if change == SensorChange::Position {
            if let Some(fix) = self.state.position() {
                self.observations = observe_all(&self.landmarks, &fix.point);
            }
        }
        Ok(change)
    }

    /// See [`SensorState::take_fix_overdue`]
    pub fn take_fix_overdue(&mut self, now_ms: u64) -> bool {
        self.state.take_fix_overdue(now_ms)
    }

    /// Rebuild the frame if both sensors are known and the refresh
    /// interval has passed. Never blocks.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let Some(snapshot) = self.state.snapshot() else {
            return TickOutcome::AwaitingSensors;
        };
        if !self.throttle.ready(now_ms) {
            return TickOutcome::Throttled;
        }

        TickOutcome::Rebuilt(self.build(snapshot, now_ms))
    }

    /// Build a frame now, ignoring the refresh interval. Used for the last
    /// frame when the sensor sources have ended.
    pub fn rebuild(&mut self, now_ms: u64) -> Option<Frame> {
        let snapshot = self.state.snapshot()?;
        self.throttle.mark(now_ms);
        Some(self.build(snapshot, now_ms))
    }

    fn build(&self, snapshot: SensorSnapshot, now_ms: u64) -> Frame {
        self.builder.build(
            &self.landmarks,
            &self.observations,
            snapshot.heading_deg,
            now_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{GeoPoint, LandmarkId};
    use crate::state::PositionFix;

    fn engine() -> PointerEngine {
        let landmarks = vec![
            Landmark::new(LandmarkId(0), "North", GeoPoint::new(1.0, 0.0)),
            Landmark::new(LandmarkId(1), "East", GeoPoint::new(0.0, 1.0)),
        ];
        PointerEngine::new(RadarConfig::default(), landmarks, 0).unwrap()
    }

    fn position(lat: f64, lon: f64, timestamp_ms: u64) -> SensorUpdate {
        SensorUpdate::Position(PositionFix {
            point: GeoPoint::new(lat, lon),
            timestamp_ms,
        })
    }

    #[test]
    fn test_no_frame_before_sensors() {
        let mut engine = engine();
        assert_eq!(engine.tick(0), TickOutcome::AwaitingSensors);

        engine.apply(SensorUpdate::Heading(0.0), 0).unwrap();
        assert_eq!(engine.tick(100), TickOutcome::AwaitingSensors);
    }

    #[test]
    fn test_frame_after_sensors() {
        let mut engine = engine();
        engine.apply(position(0.0, 0.0, 0), 0).unwrap();
        engine.apply(SensorUpdate::Heading(90.0), 0).unwrap();

        let TickOutcome::Rebuilt(frame) = engine.tick(10) else {
            panic!("expected a frame");
        };
        assert_eq!(frame.heading_deg, 90.0);
        assert_eq!(frame.segments.len(), 2);
        assert_eq!(frame.aligned.unwrap().titles, vec!["East"]);
    }

    #[test]
    fn test_rebuilds_are_throttled() {
        let mut engine = engine();
        engine.apply(position(0.0, 0.0, 0), 0).unwrap();
        engine.apply(SensorUpdate::Heading(0.0), 0).unwrap();

        assert!(matches!(engine.tick(0), TickOutcome::Rebuilt(_)));
        assert_eq!(engine.tick(30), TickOutcome::Throttled);
        assert!(matches!(engine.tick(60), TickOutcome::Rebuilt(_)));

        // A forced rebuild ignores the interval but restarts it
        assert!(engine.rebuild(70).is_some());
        assert_eq!(engine.tick(125), TickOutcome::Throttled);
        assert!(matches!(engine.tick(130), TickOutcome::Rebuilt(_)));
    }

    #[test]
    fn test_rebuild_needs_sensors() {
        let mut engine = engine();
        assert!(engine.rebuild(0).is_none());
    }

    #[test]
    fn test_observations_follow_position() {
        let mut engine = engine();
        assert!(engine.observations().is_empty());

        engine.apply(position(0.0, 0.0, 0), 0).unwrap();
        let first = engine.observations()[0].distance_km;

        engine.apply(position(0.5, 0.0, 100), 100).unwrap();
        let second = engine.observations()[0].distance_km;
        assert!(second < first);

        // Heading changes leave observations alone
        engine.apply(SensorUpdate::Heading(10.0), 200).unwrap();
        assert_eq!(engine.observations()[0].distance_km, second);
    }

    #[test]
    fn test_rejected_update_keeps_state() {
        let mut engine = engine();
        engine.apply(position(0.0, 0.0, 0), 0).unwrap();
        assert!(engine.apply(position(0.5, 0.0, 0), 6_000).is_err());
        assert_eq!(engine.snapshot(), None);
        assert_eq!(engine.observations().len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RadarConfig {
            cluster_spacing_deg: -1.0,
            ..Default::default()
        };
        assert!(PointerEngine::new(config, Vec::new(), 0).is_err());
    }
}
