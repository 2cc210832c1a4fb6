//! Sensor State Tracking
//!
//! Holds the latest user position and heading. Producers replace whole
//! values; the frame builder reads an immutable [`SensorSnapshot`] once
//! per tick. There is no history and no coordination between the two
//! fields: each is simply the latest accepted value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::normalize_bearing;
use crate::landmark::GeoPoint;

/// Position acquisition windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixPolicy {
    /// How long to wait for a first fix before reporting it overdue
    pub timeout_ms: u64,
    /// Oldest fix accepted while no position is known yet
    pub initial_max_age_ms: u64,
    /// Oldest fix accepted once a position is known
    pub continuous_max_age_ms: u64,
}

impl Default for FixPolicy {
    fn default() -> Self {
        FixPolicy {
            timeout_ms: 10_000,
            initial_max_age_ms: 10_000,
            continuous_max_age_ms: 5_000,
        }
    }
}

impl FixPolicy {
    /// Age limit for the next fix
    pub fn max_age_ms(&self, have_fix: bool) -> u64 {
        if have_fix {
            self.continuous_max_age_ms
        } else {
            self.initial_max_age_ms
        }
    }
}

/// A position reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    pub point: GeoPoint,
    /// When the fix was taken, on the engine clock (ms)
    pub timestamp_ms: u64,
}

/// A replace-operation submitted by a producer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorUpdate {
    Position(PositionFix),
    /// Degrees clockwise from north
    Heading(f64),
}

/// Rejected sensor updates
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SensorError {
    #[error("position {latitude}, {longitude} is not a valid coordinate")]
    InvalidPosition { latitude: f64, longitude: f64 },

    #[error("heading {0} is not a finite angle")]
    InvalidHeading(f64),

    #[error("position fix is {age_ms} ms old, limit is {max_age_ms} ms")]
    StaleFix { age_ms: u64, max_age_ms: u64 },
}

/// What an accepted update changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChange {
    Position,
    Heading,
}

/// Consistent view of the sensors for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub position: PositionFix,
    pub heading_deg: f64,
}

/// Latest accepted position and heading
#[derive(Debug, Clone)]
pub struct SensorState {
    policy: FixPolicy,
    position: Option<PositionFix>,
    heading: Option<f64>,
    started_ms: u64,
    overdue_reported: bool,
}

impl SensorState {
    pub fn new(policy: FixPolicy, now_ms: u64) -> Self {
        SensorState {
            policy,
            position: None,
            heading: None,
            started_ms: now_ms,
            overdue_reported: false,
        }
    }

    pub fn position(&self) -> Option<&PositionFix> {
        self.position.as_ref()
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    /// Validate and apply one update, replacing the previous value
    pub fn apply(&mut self, update: SensorUpdate, now_ms: u64) -> Result<SensorChange, SensorError> {
        match update {
            SensorUpdate::Position(fix) => {
                if !fix.point.is_valid() {
                    return Err(SensorError::InvalidPosition {
                        latitude: fix.point.latitude,
                        longitude: fix.point.longitude,
                    });
                }

                let age_ms = now_ms.saturating_sub(fix.timestamp_ms);
                let max_age_ms = self.policy.max_age_ms(self.position.is_some());
                if age_ms > max_age_ms {
                    return Err(SensorError::StaleFix { age_ms, max_age_ms });
                }

                self.position = Some(fix);
                Ok(SensorChange::Position)
            }
            SensorUpdate::Heading(heading) => {
                if !heading.is_finite() {
                    return Err(SensorError::InvalidHeading(heading));
                }
                self.heading = Some(normalize_bearing(heading));
                Ok(SensorChange::Heading)
            }
        }
    }

    /// Both position and heading, if both have been seen
    pub fn snapshot(&self) -> Option<SensorSnapshot> {
        Some(SensorSnapshot {
            position: self.position?,
            heading_deg: self.heading?,
        })
    }

    /// True exactly once, when the first fix has not arrived within the
    /// acquisition timeout.
    pub fn take_fix_overdue(&mut self, now_ms: u64) -> bool {
        if self.position.is_some() || self.overdue_reported {
            return false;
        }
        if now_ms.saturating_sub(self.started_ms) >= self.policy.timeout_ms {
            self.overdue_reported = true;
            return true;
        }
        false
    }
}

/// Enforces a minimum interval between frame rebuilds
#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    min_interval_ms: u64,
    last_ms: Option<u64>,
}

impl RefreshThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        RefreshThrottle {
            min_interval_ms,
            last_ms: None,
        }
    }

    /// Whether a rebuild may run now. Records the rebuild if so.
    pub fn ready(&mut self, now_ms: u64) -> bool {
        match self.last_ms {
            Some(last) if now_ms.saturating_sub(last) < self.min_interval_ms => false,
            _ => {
                self.mark(now_ms);
                true
            }
        }
    }

    /// Record a rebuild that happened outside [`RefreshThrottle::ready`]
    pub fn mark(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }
}
