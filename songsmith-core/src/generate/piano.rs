//! Piano part generation
//!
//! Left hand sustains the full voice-led chord voicing once per bar; right
//! hand doubles the melody wherever a melody exists.

use crate::generate::progression::ChordProgression;
use crate::types::time::{bar_beats, whole_beats};
use crate::types::{Hand, MelodyNote, PianoEvent};

const LEFT_VELOCITY: f32 = 0.6;

/// Generate the piano part for one section.
pub fn generate(progression: &ChordProgression, melody: &[MelodyNote]) -> Vec<PianoEvent> {
    let mut piano = Vec::new();

    for (bar, chord) in progression.chords().iter().enumerate() {
        piano.push(PianoEvent {
            hand: Hand::Left,
            start: bar_beats(bar as i64),
            duration: whole_beats(4),
            notes: chord.voicing().to_vec(),
            velocity: LEFT_VELOCITY,
        });
    }

    for note in melody {
        piano.push(PianoEvent {
            hand: Hand::Right,
            start: note.event.start,
            duration: note.event.duration,
            notes: vec![note.event.note],
            velocity: note.event.velocity,
        });
    }

    piano
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::melody;
    use crate::genre::Genre;
    use crate::lyrics;
    use crate::rng::SongRng;
    use crate::theory::Mode;

    #[test]
    fn test_left_hand_holds_voicings() {
        let prog = ChordProgression::for_genre(Genre::CountryBallad, 0, 0, Mode::Major, 4);
        let piano = generate(&prog, &[]);
        assert_eq!(piano.len(), 4);
        for (bar, event) in piano.iter().enumerate() {
            assert_eq!(event.hand, Hand::Left);
            assert_eq!(event.start, bar_beats(bar as i64));
            assert_eq!(event.duration, whole_beats(4));
            assert_eq!(event.notes, prog[bar].voicing());
        }
    }

    #[test]
    fn test_right_hand_doubles_melody() {
        let prog = ChordProgression::for_genre(Genre::CountryBallad, 0, 0, Mode::Major, 4);
        let analysis = lyrics::analyze("shadows fall across the field tonight");
        let mut rng = SongRng::new(4);
        let mel = melody::generate(
            &prog,
            &analysis.lines,
            Genre::CountryBallad,
            0,
            Mode::Major,
            &mut rng,
        );
        assert!(!mel.is_empty());

        let piano = generate(&prog, &mel);
        let right: Vec<&PianoEvent> = piano.iter().filter(|e| e.hand == Hand::Right).collect();
        assert_eq!(right.len(), mel.len());
        for (event, note) in right.iter().zip(&mel) {
            assert_eq!(event.start, note.event.start);
            assert_eq!(event.notes, vec![note.event.note]);
        }
    }

    #[test]
    fn test_no_melody_means_left_hand_only() {
        let prog = ChordProgression::for_genre(Genre::FolkPop, 0, 2, Mode::Major, 2);
        let piano = generate(&prog, &[]);
        assert!(piano.iter().all(|e| e.hand == Hand::Left));
    }
}
