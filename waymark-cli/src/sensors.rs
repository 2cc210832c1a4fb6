//! Sensor producers
//!
//! Position and heading arrive as JSON lines, one record per line:
//!
//! ```text
//! {"at_ms": 0, "position": {"latitude": 52.37, "longitude": 4.89}, "age_ms": 0}
//! {"at_ms": 50, "heading": 92}
//! ```
//!
//! A track file is replayed on its own `at_ms` timeline; stdin is applied
//! as it arrives. Each producer runs as its own subsystem and hands whole
//! values to the dispatcher over an mpsc channel.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;
use waymark_core::geo::normalize_bearing;
use waymark_core::{GeoPoint, PositionFix, SensorUpdate};

/// Interval between simulated compass readings
const COMPASS_INTERVAL: Duration = Duration::from_millis(50);

/// Milliseconds since the program started; the time base shared by the
/// producers and the engine.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn instant_at(&self, ms: u64) -> Instant {
        self.start + Duration::from_millis(ms)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: record has neither position nor heading")]
    Empty { line: usize },
}

/// One line of a track
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackRecord {
    /// Offset from the start of the track
    #[serde(default)]
    pub at_ms: u64,
    #[serde(default)]
    pub position: Option<GeoPoint>,
    /// How old the position fix already was when it was reported
    #[serde(default)]
    pub age_ms: u64,
    #[serde(default)]
    pub heading: Option<f64>,
}

impl TrackRecord {
    /// Parse one line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: usize, text: &str) -> Result<Option<TrackRecord>, TrackError> {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(None);
        }

        let record: TrackRecord = serde_json::from_str(text).map_err(|e| TrackError::Parse {
            line,
            message: e.to_string(),
        })?;
        if record.position.is_none() && record.heading.is_none() {
            return Err(TrackError::Empty { line });
        }
        Ok(Some(record))
    }

    /// The updates carried by this record, fix timestamps on `now_ms`'s clock
    pub fn updates(&self, now_ms: u64) -> Vec<SensorUpdate> {
        let mut updates = Vec::with_capacity(2);
        if let Some(point) = self.position {
            updates.push(SensorUpdate::Position(PositionFix {
                point,
                timestamp_ms: now_ms.saturating_sub(self.age_ms),
            }));
        }
        if let Some(heading) = self.heading {
            updates.push(SensorUpdate::Heading(heading));
        }
        updates
    }
}

/// How a track is fed to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Wait until each record's `at_ms`
    Replay,
    /// Forward records as soon as they are read
    Live,
}

/// Reads a JSON-lines track and forwards its updates
pub struct TrackReader<R> {
    key: String,
    lines: Lines<R>,
    line: usize,
    pacing: Pacing,
    clock: Clock,
    /// Drop heading records, another producer owns the heading
    skip_heading: bool,
    tx: mpsc::Sender<SensorUpdate>,
}

impl<R: AsyncBufRead + Unpin> TrackReader<R> {
    pub fn new(
        key: impl Into<String>,
        reader: R,
        pacing: Pacing,
        clock: Clock,
        tx: mpsc::Sender<SensorUpdate>,
    ) -> Self {
        TrackReader {
            key: key.into(),
            lines: reader.lines(),
            line: 0,
            pacing,
            clock,
            skip_heading: false,
            tx,
        }
    }

    pub fn skip_heading(mut self, skip: bool) -> Self {
        self.skip_heading = skip;
        self
    }

    /// Read up to the next usable record and wait until it is due.
    /// Returns `None` at the end of the track. Malformed lines are logged
    /// and skipped.
    pub async fn next_updates(&mut self) -> Result<Option<Vec<SensorUpdate>>, TrackError> {
        loop {
            let Some(text) = self.lines.next_line().await? else {
                return Ok(None);
            };
            self.line += 1;

            let mut record = match TrackRecord::parse(self.line, &text) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("{}: {}", self.key, e);
                    continue;
                }
            };
            if self.skip_heading && record.heading.take().is_some() {
                log::trace!("{}: line {}: heading ignored", self.key, self.line);
                if record.position.is_none() {
                    continue;
                }
            }

            if self.pacing == Pacing::Replay {
                sleep_until(self.clock.instant_at(record.at_ms)).await;
            }
            return Ok(Some(record.updates(self.clock.now_ms())));
        }
    }

    pub async fn run(mut self, subsys: SubsystemHandle) -> Result<(), TrackError> {
        log::debug!("{}: reading track ({:?})", self.key, self.pacing);

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("{}: shutdown", self.key);
                    return Ok(());
                },

                r = self.next_updates() => {
                    match r? {
                        Some(updates) => {
                            for update in updates {
                                if self.tx.send(update).await.is_err() {
                                    log::debug!("{}: dispatcher gone", self.key);
                                    return Ok(());
                                }
                            }
                        }
                        None => {
                            log::debug!("{}: end of track after {} lines", self.key, self.line);
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

/// A compass that turns at a constant rate, for trying the radar without
/// a heading source.
pub struct SpinningCompass {
    key: String,
    start_deg: f64,
    deg_per_s: f64,
    clock: Clock,
    tx: mpsc::Sender<SensorUpdate>,
}

impl SpinningCompass {
    pub fn new(
        key: impl Into<String>,
        deg_per_s: f64,
        clock: Clock,
        tx: mpsc::Sender<SensorUpdate>,
    ) -> Self {
        SpinningCompass {
            key: key.into(),
            start_deg: 0.0,
            deg_per_s,
            clock,
            tx,
        }
    }

    /// Heading after `elapsed_ms`, in [0, 360)
    pub fn heading_at(&self, elapsed_ms: u64) -> f64 {
        normalize_bearing(self.start_deg + self.deg_per_s * elapsed_ms as f64 / 1000.0)
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), TrackError> {
        log::debug!("{}: spinning at {} deg/s", self.key, self.deg_per_s);

        let mut interval = tokio::time::interval(COMPASS_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("{}: shutdown", self.key);
                    return Ok(());
                },

                _ = interval.tick() => {
                    let heading = self.heading_at(self.clock.now_ms());
                    if self.tx.send(SensorUpdate::Heading(heading)).await.is_err() {
                        log::debug!("{}: dispatcher gone", self.key);
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &'static str) -> (TrackReader<&'static [u8]>, mpsc::Receiver<SensorUpdate>) {
        let (tx, rx) = mpsc::channel(8);
        let reader = TrackReader::new("test", text.as_bytes(), Pacing::Live, Clock::new(), tx);
        (reader, rx)
    }

    #[test]
    fn test_parse_position_record() {
        let record = TrackRecord::parse(
            1,
            r#"{"at_ms": 20, "position": {"latitude": 52.0, "longitude": 4.5}, "age_ms": 300}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(record.at_ms, 20);
        assert_eq!(record.position, Some(GeoPoint::new(52.0, 4.5)));

        let updates = record.updates(1_000);
        assert_eq!(
            updates,
            vec![SensorUpdate::Position(PositionFix {
                point: GeoPoint::new(52.0, 4.5),
                timestamp_ms: 700,
            })]
        );
    }

    #[test]
    fn test_parse_skips_blank_and_comment() {
        assert_eq!(TrackRecord::parse(1, "   ").unwrap(), None);
        assert_eq!(TrackRecord::parse(2, "# start").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            TrackRecord::parse(3, "{not json"),
            Err(TrackError::Parse { line: 3, .. })
        ));
        assert!(matches!(
            TrackRecord::parse(4, r#"{"at_ms": 5}"#),
            Err(TrackError::Empty { line: 4 })
        ));
    }

    #[test]
    fn test_age_larger_than_clock() {
        let record = TrackRecord::parse(1, r#"{"position": {"latitude": 1, "longitude": 2}, "age_ms": 500}"#)
            .unwrap()
            .unwrap();
        match record.updates(100)[0] {
            SensorUpdate::Position(fix) => assert_eq!(fix.timestamp_ms, 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reader_yields_records_in_order() {
        let (mut reader, _rx) = reader(concat!(
            "{\"heading\": 90}\n",
            "garbage\n",
            "\n",
            "{\"position\": {\"latitude\": 1, \"longitude\": 2}, \"heading\": 370}\n",
        ));

        assert_eq!(
            reader.next_updates().await.unwrap(),
            Some(vec![SensorUpdate::Heading(90.0)])
        );

        let updates = reader.next_updates().await.unwrap().unwrap();
        assert_eq!(updates.len(), 2);
        assert!(matches!(updates[0], SensorUpdate::Position(_)));
        assert_eq!(updates[1], SensorUpdate::Heading(370.0));

        assert_eq!(reader.next_updates().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reader_skips_heading() {
        let (reader, _rx) = reader(concat!(
            "{\"heading\": 90}\n",
            "{\"position\": {\"latitude\": 1, \"longitude\": 2}, \"heading\": 10}\n",
        ));
        let mut reader = reader.skip_heading(true);

        let updates = reader.next_updates().await.unwrap().unwrap();
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], SensorUpdate::Position(_)));
        assert_eq!(reader.next_updates().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_replay_waits_for_timestamp() {
        let (tx, _rx) = mpsc::channel(8);
        let clock = Clock::new();
        let mut reader = TrackReader::new(
            "test",
            "{\"at_ms\": 40, \"heading\": 1}\n".as_bytes(),
            Pacing::Replay,
            clock,
            tx,
        );

        reader.next_updates().await.unwrap();
        assert!(clock.now_ms() >= 40);
    }

    #[test]
    fn test_spinning_compass_heading() {
        let (tx, _rx) = mpsc::channel(1);
        let compass = SpinningCompass::new("compass", 90.0, Clock::new(), tx);
        assert_eq!(compass.heading_at(0), 0.0);
        assert_eq!(compass.heading_at(1_000), 90.0);
        assert_eq!(compass.heading_at(5_000), 90.0);

        let (tx, _rx) = mpsc::channel(1);
        let compass = SpinningCompass::new("compass", -30.0, Clock::new(), tx);
        assert_eq!(compass.heading_at(1_000), 330.0);
    }
}
