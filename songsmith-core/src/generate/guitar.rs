//! Guitar part generation
//!
//! Articulation is genre-conditioned: up-tempo genres arpeggiate chord
//! tones on a sixteenth grid, ballads strike the whole chord once per bar,
//! and everything else falls back to a root-fifth-third-fifth fingerpicking
//! figure.

use crate::generate::progression::ChordProgression;
use crate::genre::{Genre, GuitarStyle};
use crate::types::time::{bar_beats, beats, whole_beats, Beats};
use crate::types::{GuitarEvent, Note, NoteEvent};

const GUITAR_VELOCITY: f32 = 0.7;
const SIXTEENTH: (i64, i64) = (1, 4);

/// Generate the guitar part for one section.
pub fn generate(progression: &ChordProgression, genre: Genre) -> Vec<GuitarEvent> {
    match genre.guitar_style() {
        GuitarStyle::Arpeggiated => arpeggiate(progression),
        GuitarStyle::Strummed => strum(progression),
        GuitarStyle::Fingerpicked => fingerpick(progression),
    }
}

/// Chord tones laid out one per sixteenth, climbing through the registers.
fn arpeggiate(progression: &ChordProgression) -> Vec<GuitarEvent> {
    let mut events = Vec::new();
    for (bar, chord) in progression.chords().iter().enumerate() {
        let bar_start = bar_beats(bar as i64);
        let mut offset = whole_beats(0);
        for (i, &pc) in chord.tones().iter().enumerate() {
            let octave = 3 + (i / 2) as i8;
            events.push(picked(bar_start + offset, pc, octave));
            offset += beats(SIXTEENTH.0, SIXTEENTH.1);
        }
    }
    events
}

/// One full-voicing strum per chord, held for the bar.
fn strum(progression: &ChordProgression) -> Vec<GuitarEvent> {
    progression
        .chords()
        .iter()
        .enumerate()
        .map(|(bar, chord)| {
            let notes: Vec<Note> = chord
                .tones()
                .iter()
                .map(|&pc| Note::with_octave(pc, 3).expect("valid pitch class"))
                .collect();
            GuitarEvent::Strum {
                start: bar_beats(bar as i64),
                duration: whole_beats(4),
                notes,
                velocity: GUITAR_VELOCITY,
            }
        })
        .collect()
}

/// Root-fifth-third-fifth figure, one pass per chord.
fn fingerpick(progression: &ChordProgression) -> Vec<GuitarEvent> {
    let mut events = Vec::new();
    for (bar, chord) in progression.chords().iter().enumerate() {
        let bar_start = bar_beats(bar as i64);
        let figure = [
            chord.root,
            chord.fifth_pitch_class(),
            chord.third_pitch_class(),
            chord.fifth_pitch_class(),
        ];
        let mut offset = whole_beats(0);
        for pc in figure {
            events.push(picked(bar_start + offset, pc, 3));
            offset += beats(SIXTEENTH.0, SIXTEENTH.1);
        }
    }
    events
}

fn picked(start: Beats, pitch_class: u8, octave: i8) -> GuitarEvent {
    GuitarEvent::Picked(NoteEvent {
        start,
        duration: beats(SIXTEENTH.0, SIXTEENTH.1),
        note: Note::with_octave(pitch_class, octave).expect("valid pitch class"),
        velocity: GUITAR_VELOCITY,
    })
}
