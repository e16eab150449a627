//! Score event types
//!
//! Every part stores events with explicit rational start times measured
//! from the beginning of its section, so flattening a composition is pure
//! offset arithmetic with no accumulated drift.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::time::Beats;
use crate::types::Note;

/// A single pitched event: where it starts, how long it lasts, what sounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub start: Beats,
    pub duration: Beats,
    pub note: Note,
    pub velocity: f32,
}

/// Melody note with the lyric syllable it carries, when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyNote {
    pub event: NoteEvent,
    pub syllable: Option<String>,
    /// True when the note landed on a strong beat of its rhythm pattern.
    pub stressed: bool,
}

/// Guitar articulation events: single picked notes or a block strum of the
/// whole chord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuitarEvent {
    Picked(NoteEvent),
    Strum {
        start: Beats,
        duration: Beats,
        notes: Vec<Note>,
        velocity: f32,
    },
}

impl GuitarEvent {
    pub fn start(&self) -> Beats {
        match self {
            GuitarEvent::Picked(e) => e.start,
            GuitarEvent::Strum { start, .. } => *start,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

/// Piano events carry several simultaneous notes (left-hand voicings) or a
/// single melody doubling (right hand).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PianoEvent {
    pub hand: Hand,
    pub start: Beats,
    pub duration: Beats,
    pub notes: Vec<Note>,
    pub velocity: f32,
}

/// One drum hit on a lane's grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrumHit {
    pub start: Beats,
    pub velocity: f32,
}

/// The three drum lanes of a section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DrumTrack {
    pub kick: Vec<DrumHit>,
    pub snare: Vec<DrumHit>,
    pub hihat: Vec<DrumHit>,
}

impl DrumTrack {
    pub fn hit_count(&self) -> usize {
        self.kick.len() + self.snare.len() + self.hihat.len()
    }
}

/// Percussion lanes with their General MIDI note numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumSound {
    Kick,
    Snare,
    HiHat,
}

impl DrumSound {
    /// General MIDI percussion note number (channel 10).
    pub fn midi_note(&self) -> u8 {
        match self {
            DrumSound::Kick => 36,
            DrumSound::Snare => 38,
            DrumSound::HiHat => 42,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DrumSound::Kick => "kick",
            DrumSound::Snare => "snare",
            DrumSound::HiHat => "hihat",
        }
    }
}

impl fmt::Display for DrumSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Identifies a part both in the mixer and in exported note files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartId {
    Melody,
    Bass,
    Guitar,
    Piano,
    Drums,
}

impl PartId {
    pub fn from_name(s: &str) -> Option<PartId> {
        match s.to_lowercase().as_str() {
            "melody" => Some(PartId::Melody),
            "bass" => Some(PartId::Bass),
            "guitar" => Some(PartId::Guitar),
            "piano" => Some(PartId::Piano),
            "drums" => Some(PartId::Drums),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PartId::Melody => "melody",
            PartId::Bass => "bass",
            PartId::Guitar => "guitar",
            PartId::Piano => "piano",
            PartId::Drums => "drums",
        }
    }

    pub const ALL: [PartId; 5] = [
        PartId::Melody,
        PartId::Bass,
        PartId::Guitar,
        PartId::Piano,
        PartId::Drums,
    ];
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A flattened event with its absolute start beat in the whole composition.
/// This is the sole shape the playback scheduler and the MIDI writer
/// consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub part: PartId,
    pub start: Beats,
    pub duration: Beats,
    pub kind: ScoreEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoreEventKind {
    Note { note: Note, velocity: f32 },
    Drum { sound: DrumSound, velocity: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gm_drum_numbers() {
        assert_eq!(DrumSound::Kick.midi_note(), 36);
        assert_eq!(DrumSound::Snare.midi_note(), 38);
        assert_eq!(DrumSound::HiHat.midi_note(), 42);
    }

    #[test]
    fn test_part_parsing() {
        assert_eq!(PartId::from_name("Bass"), Some(PartId::Bass));
        assert_eq!(PartId::from_name("vocals"), None);
    }
}
