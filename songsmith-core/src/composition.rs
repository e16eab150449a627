//! The composition document
//!
//! A `Composition` is the assembled, serializable score: song parameters,
//! the analyzed lyrics, and one fully-generated `Section` per entry in the
//! genre's structure template. It is created once at generation time and
//! is read-only during playback; the scheduler and the exporters both work
//! from `flatten()`.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::generate::harmony::HarmonicSlot;
use crate::generate::progression::ChordProgression;
use crate::generate::structure;
use crate::genre::{Genre, SectionType};
use crate::lyrics::{LyricAnalysis, LyricLine};
use crate::theory::Mode;
use crate::types::time::{bar_beats, whole_beats, Beats};
use crate::types::{
    DrumSound, DrumTrack, GuitarEvent, MelodyNote, Note, NoteEvent, PartId, PianoEvent,
    ScoreEvent, ScoreEventKind,
};

/// User-facing song parameters. Unknown genre, key, or mode names degrade
/// to defaults when set through the string setters; generation never fails
/// on bad input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongParams {
    pub title: String,
    pub genre: Genre,
    /// Key center as a pitch class (0 = C).
    pub key: u8,
    pub mode: Mode,
    pub tempo: f32,
    pub instruments: Vec<String>,
    /// Index into the genre's progression template catalog.
    pub variation: usize,
}

impl Default for SongParams {
    fn default() -> Self {
        SongParams {
            title: String::new(),
            genre: Genre::default(),
            key: 0,
            mode: Mode::Major,
            tempo: 120.0,
            instruments: vec![
                "piano".to_string(),
                "bass".to_string(),
                "drums".to_string(),
                "guitar".to_string(),
            ],
            variation: 0,
        }
    }
}

impl SongParams {
    /// Set the key from a note name; unparseable names fall back to C.
    pub fn set_key(&mut self, name: &str) {
        self.key = name
            .parse::<Note>()
            .map(|n| n.pitch_class())
            .unwrap_or(0);
    }

    pub fn key_name(&self) -> String {
        Note::new(self.key)
            .map(|n| n.to_string())
            .unwrap_or_else(|_| "C".to_string())
    }
}

/// One generated song section with all of its parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionType,
    pub bars: u32,
    pub lyric_lines: Vec<LyricLine>,
    pub chords: ChordProgression,
    pub harmonic_rhythm: Vec<HarmonicSlot>,
    pub melody: Vec<MelodyNote>,
    pub bass: Vec<NoteEvent>,
    pub guitar: Vec<GuitarEvent>,
    pub piano: Vec<PianoEvent>,
    pub drums: DrumTrack,
}

impl Section {
    pub fn beats(&self) -> Beats {
        bar_beats(self.bars as i64)
    }
}

/// The whole score document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub params: SongParams,
    pub lyric_analysis: Option<LyricAnalysis>,
    pub sections: Vec<Section>,
}

/// Generation result: the score plus the human-readable log the REPL
/// prints.
#[derive(Debug, Clone)]
pub struct Generation {
    pub composition: Composition,
    pub log: Vec<String>,
}

impl Composition {
    /// Generate a complete composition from parameters and optional lyric
    /// text. Pure and deterministic: the same inputs always yield the same
    /// score.
    pub fn generate(params: SongParams, lyrics_text: Option<&str>) -> Generation {
        structure::assemble(params, lyrics_text)
    }

    /// Total length in beats: the sum of `bars * 4` over all sections.
    pub fn total_beats(&self) -> Beats {
        self.sections
            .iter()
            .map(|s| s.beats())
            .fold(whole_beats(0), |acc, b| acc + b)
    }

    /// Flatten every part into absolute-time score events, sorted by start
    /// beat. Drum hits become short one-shot events; strums and piano
    /// voicings fan out into one event per sounding note.
    pub fn flatten(&self) -> Vec<ScoreEvent> {
        let mut events = Vec::new();
        let mut offset = whole_beats(0);

        for section in &self.sections {
            for m in &section.melody {
                events.push(note_event(PartId::Melody, offset, &m.event));
            }
            for b in &section.bass {
                events.push(note_event(PartId::Bass, offset, b));
            }
            for g in &section.guitar {
                match g {
                    GuitarEvent::Picked(e) => events.push(note_event(PartId::Guitar, offset, e)),
                    GuitarEvent::Strum {
                        start,
                        duration,
                        notes,
                        velocity,
                    } => {
                        for &note in notes {
                            events.push(ScoreEvent {
                                part: PartId::Guitar,
                                start: offset + *start,
                                duration: *duration,
                                kind: ScoreEventKind::Note {
                                    note,
                                    velocity: *velocity,
                                },
                            });
                        }
                    }
                }
            }
            for p in &section.piano {
                for &note in &p.notes {
                    events.push(ScoreEvent {
                        part: PartId::Piano,
                        start: offset + p.start,
                        duration: p.duration,
                        kind: ScoreEventKind::Note {
                            note,
                            velocity: p.velocity,
                        },
                    });
                }
            }
            for (lane, hits) in [
                (DrumSound::Kick, &section.drums.kick),
                (DrumSound::Snare, &section.drums.snare),
                (DrumSound::HiHat, &section.drums.hihat),
            ] {
                for hit in hits {
                    events.push(ScoreEvent {
                        part: PartId::Drums,
                        start: offset + hit.start,
                        duration: crate::types::time::beats(1, 8),
                        kind: ScoreEventKind::Drum {
                            sound: lane,
                            velocity: hit.velocity,
                        },
                    });
                }
            }

            offset += section.beats();
        }

        events.sort_by(|a, b| a.start.cmp(&b.start));
        events
    }

    /// Check the document invariants: non-empty progressions and every
    /// flattened event starting inside `[0, total_beats)`.
    pub fn validate(&self) -> Result<()> {
        let total = self.total_beats();
        for section in &self.sections {
            if section.chords.is_empty() {
                bail!("section {} has an empty progression", section.kind);
            }
        }
        for event in self.flatten() {
            if event.start < whole_beats(0) || event.start >= total {
                bail!(
                    "event at beat {} outside [0, {})",
                    crate::types::time::to_f64(event.start),
                    crate::types::time::to_f64(total)
                );
            }
        }
        Ok(())
    }
}

fn note_event(part: PartId, offset: Beats, e: &NoteEvent) -> ScoreEvent {
    ScoreEvent {
        part,
        start: offset + e.start,
        duration: e.duration,
        kind: ScoreEventKind::Note {
            note: e.note,
            velocity: e.velocity,
        },
    }
}
