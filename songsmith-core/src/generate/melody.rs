//! Melody generation
//!
//! The melody is sung text: each chord consumes one rhythm pattern from the
//! genre catalog and walks the current lyric line's syllables left to
//! right. Strong pattern beats land on chord tones, weak beats move by
//! scale step from the previous note, and the octave follows a three-part
//! phrase arc (start low, lift through the middle of the line, resolve
//! low). Sections without lyric lines get no melody at all.

use crate::generate::progression::ChordProgression;
use crate::genre::Genre;
use crate::lyrics::LyricLine;
use crate::rng::SongRng;
use crate::theory::Mode;
use crate::types::time::{bar_beats, beats, whole_beats};
use crate::types::{MelodyNote, Note, NoteEvent};

const STRONG_VELOCITY: f32 = 0.8;
const WEAK_VELOCITY: f32 = 0.6;

/// Generate the melody for one section.
pub fn generate(
    progression: &ChordProgression,
    lines: &[LyricLine],
    genre: Genre,
    key: u8,
    mode: Mode,
    rng: &mut SongRng,
) -> Vec<MelodyNote> {
    if lines.is_empty() {
        return Vec::new();
    }

    let scale = mode.scale(key);
    let patterns = genre.melody_rhythms();
    let mut melody = Vec::new();

    let mut line_index = 0usize;
    let mut prev_degree = 0usize; // scale index of the previous melody note

    for (bar, chord) in progression.chords().iter().enumerate() {
        if line_index >= lines.len() {
            break;
        }
        let line = &lines[line_index];
        let pattern = patterns[bar % patterns.len()];
        let bar_start = bar_beats(bar as i64);

        let mut offset = whole_beats(0);
        let mut syllable = 0usize;

        for (step, &(num, den)) in pattern.iter().enumerate() {
            if syllable >= line.total_syllables {
                break;
            }

            let strong = step % 4 == 0;
            let degree = if strong {
                // Chord tone, folded back onto the scale for the next
                // neighbor-motion step
                let pc = *rng.pick(chord.tones());
                scale.iter().position(|&s| s == pc).unwrap_or(prev_degree)
            } else {
                let candidates = [prev_degree, (prev_degree + 1) % 7, (prev_degree + 6) % 7];
                *rng.pick(&candidates)
            };

            // Phrase arc over the line's syllable budget
            let progress = syllable as f32 / line.total_syllables as f32;
            let octave = if progress < 0.3 {
                4
            } else if progress < 0.7 {
                if rng.unit() > 0.4 { 5 } else { 4 }
            } else {
                4
            };

            let note = Note::with_octave(scale[degree], octave).expect("scale degree is valid");
            let duration = beats(num, den);

            melody.push(MelodyNote {
                event: NoteEvent {
                    start: bar_start + offset,
                    duration,
                    note,
                    velocity: if strong { STRONG_VELOCITY } else { WEAK_VELOCITY },
                },
                syllable: syllable_text(line, syllable),
                stressed: strong,
            });

            offset += duration;
            prev_degree = degree;
            syllable += 1;
        }

        // The line only advances once its syllable budget is spent
        if syllable >= line.total_syllables {
            line_index += 1;
        }
    }

    melody
}

/// The word owning the nth syllable of the line.
fn syllable_text(line: &LyricLine, syllable: usize) -> Option<String> {
    let mut remaining = syllable;
    for (word, &count) in line.words.iter().zip(&line.syllables) {
        if remaining < count {
            return Some(word.clone());
        }
        remaining -= count;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics;

    fn setup(text: &str) -> (ChordProgression, Vec<LyricLine>) {
        let prog = ChordProgression::for_genre(Genre::CountryBallad, 0, 0, Mode::Major, 4);
        let analysis = lyrics::analyze(text);
        (prog, analysis.lines)
    }

    #[test]
    fn test_no_lyrics_no_melody() {
        let prog = ChordProgression::for_genre(Genre::CountryBallad, 0, 0, Mode::Major, 4);
        let mut rng = SongRng::new(1);
        let melody = generate(&prog, &[], Genre::CountryBallad, 0, Mode::Major, &mut rng);
        assert!(melody.is_empty());
    }

    #[test]
    fn test_strong_beats_take_chord_tones() {
        let (prog, lines) = setup("riding down the old dirt road tonight my dear");
        let mut rng = SongRng::new(5);
        let melody = generate(&prog, &lines, Genre::CountryBallad, 0, Mode::Major, &mut rng);
        assert!(!melody.is_empty());

        // The first note of each chord's pattern is a strong beat
        let first = &melody[0];
        assert!(first.stressed);
        assert!(prog[0].tones().contains(&first.event.note.pitch_class()));
    }

    #[test]
    fn test_syllable_budget_stops_generation() {
        let (prog, lines) = setup("cat");
        let mut rng = SongRng::new(2);
        let melody = generate(&prog, &lines, Genre::CountryBallad, 0, Mode::Major, &mut rng);
        // One syllable, one line: a single note, then the line is spent and
        // no further lines exist.
        assert_eq!(melody.len(), 1);
        assert_eq!(melody[0].syllable.as_deref(), Some("cat"));
    }

    #[test]
    fn test_octaves_follow_phrase_arc() {
        let (prog, lines) = setup("every little thing you say becomes another song we play");
        let mut rng = SongRng::new(3);
        let melody = generate(&prog, &lines, Genre::CountryBallad, 0, Mode::Major, &mut rng);
        for note in &melody {
            let octave = note.event.note.octave();
            assert!(octave == 4 || octave == 5);
        }
        // Line openings sit in the home octave
        assert_eq!(melody[0].event.note.octave(), 4);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let (prog, lines) = setup("same old song\nsame old tune");
        let a = generate(
            &prog,
            &lines,
            Genre::CountryBallad,
            0,
            Mode::Major,
            &mut SongRng::new(11),
        );
        let b = generate(
            &prog,
            &lines,
            Genre::CountryBallad,
            0,
            Mode::Major,
            &mut SongRng::new(11),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_notes_stay_inside_their_bars() {
        let (prog, lines) = setup("a long line of words that keeps on going and going forever more");
        let mut rng = SongRng::new(8);
        let melody = generate(&prog, &lines, Genre::CountryBallad, 0, Mode::Major, &mut rng);
        for note in &melody {
            let start = note.event.start;
            let end = start + note.event.duration;
            assert!(end <= whole_beats(16), "note runs past the section");
        }
    }
}
