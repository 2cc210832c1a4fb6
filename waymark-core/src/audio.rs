//! Audio Cues
//!
//! Decides when the audio of the pointed-at landmark should start and stop.
//! Playing the audio is up to the caller; this module only turns the
//! sequence of aligned selections into play/stop actions.

use serde::Serialize;

use crate::alignment::AlignedGroup;
use crate::landmark::LandmarkId;

/// Instruction for the audio player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AudioAction {
    Play { landmark: LandmarkId, audio: String },
    Stop { landmark: LandmarkId },
}

/// Tracks which landmark's audio is playing
#[derive(Debug, Clone, Default)]
pub struct AudioCueTracker {
    playing: Option<LandmarkId>,
}

impl AudioCueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing(&self) -> Option<LandmarkId> {
        self.playing
    }

    /// Feed the aligned selection of the latest frame.
    ///
    /// The nearest aligned landmark with audio is played. Nothing happens
    /// while it stays the same; when it changes or disappears the previous
    /// audio is stopped first.
    pub fn update(&mut self, aligned: Option<&AlignedGroup>) -> Vec<AudioAction> {
        let target = aligned.and_then(|g| g.audio.as_ref().map(|audio| (g.nearest, audio)));

        if target.map(|(id, _)| id) == self.playing {
            return Vec::new();
        }

        let mut actions = Vec::with_capacity(2);
        if let Some(landmark) = self.playing.take() {
            actions.push(AudioAction::Stop { landmark });
        }
        if let Some((landmark, audio)) = target {
            actions.push(AudioAction::Play {
                landmark,
                audio: audio.clone(),
            });
            self.playing = Some(landmark);
        }
        actions
    }

    /// Stop whatever is playing
    pub fn stop(&mut self) -> Option<AudioAction> {
        self.playing
            .take()
            .map(|landmark| AudioAction::Stop { landmark })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(nearest: u32, audio: Option<&str>) -> AlignedGroup {
        AlignedGroup {
            cluster: 0,
            members: vec![LandmarkId(nearest)],
            titles: vec![format!("L{}", nearest)],
            nearest: LandmarkId(nearest),
            nearest_distance_km: 1.0,
            audio: audio.map(String::from),
        }
    }

    #[test]
    fn test_play_on_alignment() {
        let mut tracker = AudioCueTracker::new();
        let actions = tracker.update(Some(&group(1, Some("a.mp3"))));
        assert_eq!(
            actions,
            vec![AudioAction::Play {
                landmark: LandmarkId(1),
                audio: "a.mp3".to_string()
            }]
        );
        assert_eq!(tracker.playing(), Some(LandmarkId(1)));
    }

    #[test]
    fn test_no_repeat_while_aligned() {
        let mut tracker = AudioCueTracker::new();
        tracker.update(Some(&group(1, Some("a.mp3"))));
        assert!(tracker.update(Some(&group(1, Some("a.mp3")))).is_empty());
    }

    #[test]
    fn test_switch_target() {
        let mut tracker = AudioCueTracker::new();
        tracker.update(Some(&group(1, Some("a.mp3"))));
        let actions = tracker.update(Some(&group(2, Some("b.mp3"))));
        assert_eq!(
            actions,
            vec![
                AudioAction::Stop {
                    landmark: LandmarkId(1)
                },
                AudioAction::Play {
                    landmark: LandmarkId(2),
                    audio: "b.mp3".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_stop_when_alignment_lost() {
        let mut tracker = AudioCueTracker::new();
        tracker.update(Some(&group(1, Some("a.mp3"))));
        assert_eq!(
            tracker.update(None),
            vec![AudioAction::Stop {
                landmark: LandmarkId(1)
            }]
        );
        assert!(tracker.update(None).is_empty());
    }

    #[test]
    fn test_silent_landmark_stops_previous() {
        let mut tracker = AudioCueTracker::new();
        tracker.update(Some(&group(1, Some("a.mp3"))));
        let actions = tracker.update(Some(&group(2, None)));
        assert_eq!(
            actions,
            vec![AudioAction::Stop {
                landmark: LandmarkId(1)
            }]
        );
        assert_eq!(tracker.playing(), None);
        assert!(tracker.stop().is_none());
    }
}
