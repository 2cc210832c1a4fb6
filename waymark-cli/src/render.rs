//! Output sinks for frames and audio cues

use std::io::{self, Write};
use std::sync::Arc;

use serde::Serialize;
use waymark_core::frame::format_distance;
use waymark_core::{
    AlignedGroup, AudioAction, DrawCommand, Frame, Landmark, LandmarkId, SegmentStyle,
};

/// Receives every tick's result
pub trait FrameSink: Send {
    fn frame(&mut self, frame: &Frame) -> io::Result<()>;

    /// A tick that rebuilt nothing
    fn unchanged(&mut self, _now_ms: u64) -> io::Result<()> {
        Ok(())
    }
}

/// Human readable output: a summary line per frame and one line per
/// landmark. Frames identical to the previous one are not repeated.
pub struct TextSink<W> {
    out: W,
    landmarks: Arc<[Landmark]>,
    last: Option<String>,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, landmarks: Arc<[Landmark]>) -> Self {
        TextSink {
            out,
            landmarks,
            last: None,
        }
    }

    fn title(&self, id: LandmarkId) -> &str {
        self.landmarks
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.title.as_str())
            .unwrap_or("?")
    }

    fn render(&self, frame: &Frame) -> String {
        let mut text = format!("heading {:5.1}", frame.heading_deg);
        match &frame.aligned {
            Some(group) => {
                text += &format!(
                    " | pointing at {} ({})",
                    group.titles.join(", "),
                    format_distance(group.nearest_distance_km)
                );
            }
            None => text += " | -",
        }
        if frame.hidden > 0 {
            text += &format!(" | {} hidden", frame.hidden);
        }
        text.push('\n');

        for segment in &frame.segments {
            text += &format!(
                "  {} {:>7.1} {:>8}  {}\n",
                if segment.aligned { '>' } else { ' ' },
                segment.display_angle,
                segment.label,
                self.title(segment.landmark),
            );
        }
        text
    }
}

impl<W: Write + Send> FrameSink for TextSink<W> {
    fn frame(&mut self, frame: &Frame) -> io::Result<()> {
        let text = self.render(frame);
        if self.last.as_deref() == Some(text.as_str()) {
            return Ok(());
        }
        write!(self.out, "[{:>8} ms] {}", frame.timestamp_ms, text)?;
        self.out.flush()?;
        self.last = Some(text);
        Ok(())
    }

    fn unchanged(&mut self, now_ms: u64) -> io::Result<()> {
        log::trace!("{} ms: unchanged", now_ms);
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StyleRecord {
    stroke_width: f64,
    color: &'static str,
}

impl From<SegmentStyle> for StyleRecord {
    fn from(style: SegmentStyle) -> Self {
        StyleRecord {
            stroke_width: style.stroke_width(),
            color: style.color(),
        }
    }
}

/// How the `style` names in the draw commands are painted
#[derive(Serialize)]
struct Styles {
    highlighted: StyleRecord,
    muted: StyleRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameRecord<'a> {
    timestamp_ms: u64,
    heading_deg: f64,
    aligned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection: Option<&'a AlignedGroup>,
    hidden: usize,
    styles: Styles,
    commands: Vec<DrawCommand>,
}

/// One JSON object per frame
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        JsonSink { out }
    }
}

impl<W: Write + Send> FrameSink for JsonSink<W> {
    fn frame(&mut self, frame: &Frame) -> io::Result<()> {
        let record = FrameRecord {
            timestamp_ms: frame.timestamp_ms,
            heading_deg: frame.heading_deg,
            aligned: frame.is_aligned(),
            selection: frame.aligned.as_ref(),
            hidden: frame.hidden,
            styles: Styles {
                highlighted: SegmentStyle::Highlighted.into(),
                muted: SegmentStyle::Muted.into(),
            },
            commands: frame.draw_commands(),
        };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

/// Plays audio cues
pub trait AudioPlayer: Send {
    fn perform(&mut self, action: &AudioAction);
}

/// Stands in for a real audio device by logging what would be played
pub struct LoggingAudioPlayer;

impl AudioPlayer for LoggingAudioPlayer {
    fn perform(&mut self, action: &AudioAction) {
        match action {
            AudioAction::Play { landmark, audio } => {
                log::info!("audio: play {} for landmark {}", audio, landmark)
            }
            AudioAction::Stop { landmark } => log::info!("audio: stop landmark {}", landmark),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_core::{GeoPoint, PointerEngine, PositionFix, RadarConfig, SensorUpdate, TickOutcome};

    fn frame() -> (Frame, Arc<[Landmark]>) {
        let landmarks: Arc<[Landmark]> = vec![
            Landmark::new(LandmarkId(0), "Lighthouse", GeoPoint::new(0.1, 0.0)),
            Landmark::new(LandmarkId(1), "Church", GeoPoint::new(0.0, 0.1)),
        ]
        .into();
        let mut engine = PointerEngine::new(RadarConfig::default(), landmarks.clone(), 0).unwrap();
        engine
            .apply(
                SensorUpdate::Position(PositionFix {
                    point: GeoPoint::new(0.0, 0.0),
                    timestamp_ms: 0,
                }),
                0,
            )
            .unwrap();
        engine.apply(SensorUpdate::Heading(0.0), 0).unwrap();
        let TickOutcome::Rebuilt(frame) = engine.tick(0) else {
            panic!("expected a frame");
        };
        (frame, landmarks)
    }

    #[test]
    fn test_text_sink_output() {
        let (frame, landmarks) = frame();
        let mut out = Vec::new();
        {
            let mut sink = TextSink::new(&mut out, landmarks);
            sink.frame(&frame).unwrap();
            // Identical frame is not printed twice
            sink.frame(&frame).unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("heading").count(), 1);
        assert!(text.contains("pointing at Lighthouse (11 km)"));
        assert!(text.contains("Church"));
        assert!(text.lines().any(|l| l.starts_with("  >") && l.ends_with("Lighthouse")));
    }

    #[test]
    fn test_json_sink_output() {
        let (frame, _) = frame();
        let mut out = Vec::new();
        JsonSink::new(&mut out).frame(&frame).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["aligned"], true);
        assert_eq!(value["selection"]["titles"][0], "Lighthouse");
        assert_eq!(value["commands"].as_array().unwrap().len(), 6);
        assert_eq!(value["commands"][0]["kind"], "line");
        assert_eq!(value["commands"][0]["style"], "highlighted");
        assert_eq!(value["styles"]["highlighted"]["strokeWidth"], 3.0);
        assert_eq!(value["styles"]["muted"]["color"], "#9e9e9e");
    }
}
