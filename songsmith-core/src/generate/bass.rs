//! Bass line generation
//!
//! One pitch per slot of the genre's bass rhythm: the bar opens on the
//! chord root, interior slots cycle root/third/fifth, and the final slot
//! walks a half step into the next chord when the two roots sit a semitone
//! apart (otherwise it lands on the fifth).

use crate::generate::progression::ChordProgression;
use crate::genre::Genre;
use crate::types::time::{bar_beats, beats, whole_beats};
use crate::types::{Note, NoteEvent};

const BASS_OCTAVE: i8 = 2;
const BASS_VELOCITY: f32 = 0.85;

/// Generate the bass part for one section.
pub fn generate(progression: &ChordProgression, genre: Genre) -> Vec<NoteEvent> {
    let rhythm = genre.bass_rhythm();
    let chords = progression.chords();
    let mut bass = Vec::new();

    for (bar, chord) in chords.iter().enumerate() {
        let root = chord.root;
        let third = chord.third_pitch_class();
        let fifth = chord.fifth_pitch_class();
        let next_root = chords[(bar + 1) % chords.len()].root;

        let bar_start = bar_beats(bar as i64);
        let mut offset = whole_beats(0);

        for (slot, &(num, den)) in rhythm.iter().enumerate() {
            let pitch_class = if slot == 0 {
                root
            } else if slot == rhythm.len() - 1 {
                leading_tone(root, next_root).unwrap_or(fifth)
            } else {
                [root, third, fifth][slot % 3]
            };

            let duration = beats(num, den);
            bass.push(NoteEvent {
                start: bar_start + offset,
                duration,
                note: Note::with_octave(pitch_class, BASS_OCTAVE).expect("valid pitch class"),
                velocity: BASS_VELOCITY,
            });
            offset += duration;
        }
    }

    bass
}

/// Half-step approach into the next root, when the two roots are a
/// semitone apart in either direction.
fn leading_tone(root: u8, next_root: u8) -> Option<u8> {
    match (next_root as i8 - root as i8).rem_euclid(12) {
        1 => Some((root + 11) % 12), // approach from below
        11 => Some((root + 1) % 12), // approach from above
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::Mode;

    #[test]
    fn test_bar_opens_on_root() {
        let prog = ChordProgression::for_genre(Genre::Bluegrass, 0, 7, Mode::Major, 4);
        let bass = generate(&prog, Genre::Bluegrass);
        // Four quarter-note slots per bar in bluegrass
        assert_eq!(bass.len(), 16);
        assert_eq!(bass[0].note.pitch_class(), 7); // G
        assert_eq!(bass[4].note.pitch_class(), 0); // C
    }

    #[test]
    fn test_last_slot_is_fifth_without_semitone_motion() {
        // G -> C roots are a fourth apart, so the walk lands on the fifth
        let prog = ChordProgression::for_genre(Genre::Bluegrass, 0, 7, Mode::Major, 4);
        let bass = generate(&prog, Genre::Bluegrass);
        assert_eq!(bass[3].note.pitch_class(), 2); // D, fifth of G
    }

    #[test]
    fn test_leading_tone_on_semitone_roots() {
        // iii (E) to IV (F): roots one semitone apart, bar of E ends on F's
        // lower neighbor (E itself approached from below is D#... the walk
        // uses the half step below the target, which is E natural's sharp
        // neighbor). Direction up: (root + 11) % 12.
        let prog = ChordProgression::from_template(&["iii", "IV"], 0, Mode::Major, 2);
        let bass = generate(&prog, Genre::Bluegrass);
        // Bar 0 is E minor; its last slot approaches F from below: E + 11 = D#
        assert_eq!(bass[3].note.pitch_class(), (4 + 11) % 12);
    }

    #[test]
    fn test_interior_slots_cycle_chord_tones() {
        let prog = ChordProgression::for_genre(Genre::Bluegrass, 0, 0, Mode::Major, 1);
        let bass = generate(&prog, Genre::Bluegrass);
        let chord = &prog[0];
        for event in &bass[1..bass.len() - 1] {
            let pc = event.note.pitch_class();
            assert!(
                pc == chord.root
                    || pc == chord.third_pitch_class()
                    || pc == chord.fifth_pitch_class()
            );
        }
    }

    #[test]
    fn test_bass_sits_in_low_octave() {
        let prog = ChordProgression::for_genre(Genre::CountryBallad, 0, 0, Mode::Major, 2);
        let bass = generate(&prog, Genre::CountryBallad);
        assert!(bass.iter().all(|e| e.note.octave() == BASS_OCTAVE));
    }
}
