//! Chord progression generation
//!
//! A progression maps each bar to a roman numeral drawn from a genre
//! template (cycling when the section outlasts the template), translates
//! the numerals through the mode's scale-degree table, then voice-leads
//! every chord against its predecessor.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::genre::Genre;
use crate::theory::{voicing, Mode};
use crate::types::Chord;

/// An ordered chord sequence, one chord per bar. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordProgression {
    chords: Vec<Chord>,
}

impl ChordProgression {
    /// Generate from an explicit roman-numeral template. A numeral the
    /// chord table cannot read degrades to the tonic rather than failing.
    pub fn from_template(template: &[&str], key: u8, mode: Mode, bars: u32) -> ChordProgression {
        let bars = bars.max(1) as usize;
        let mut chords: Vec<Chord> = Vec::with_capacity(bars);

        for bar in 0..bars {
            let numeral = template[bar % template.len()];
            let mut chord = Chord::from_numeral(numeral, key, mode)
                .unwrap_or_else(|| Chord::from_numeral("I", key, mode).expect("tonic always parses"));

            let (tones, voiced) = match chords.last() {
                Some(prev) => voicing::lead(prev.voicing(), chord.tones()),
                None => {
                    let tones = chord.tones().to_vec();
                    let voiced = voicing::initial_voicing(&tones);
                    (tones, voiced)
                }
            };
            chord.set_voicing(tones, voiced);
            chords.push(chord);
        }

        ChordProgression { chords }
    }

    /// Generate from a genre's template catalog. `variation` indexes the
    /// catalog (0 is the genre's signature progression) and wraps, so any
    /// value is safe.
    pub fn for_genre(
        genre: Genre,
        variation: usize,
        key: u8,
        mode: Mode,
        bars: u32,
    ) -> ChordProgression {
        let templates = genre.progression_templates();
        let template = templates[variation % templates.len()];
        Self::from_template(template, key, mode, bars)
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn get(&self, bar: usize) -> &Chord {
        &self.chords[bar]
    }

    /// Roman numeral summary, e.g. `I - IV - I - V`.
    pub fn symbols(&self) -> String {
        self.chords
            .iter()
            .map(|c| c.symbol())
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

impl fmt::Display for ChordProgression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbols())
    }
}

impl std::ops::Index<usize> for ChordProgression {
    type Output = Chord;

    fn index(&self, bar: usize) -> &Chord {
        &self.chords[bar]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Note;

    #[test]
    fn test_bluegrass_in_g_major() {
        // The signature bluegrass template over 8 bars: I IV I V repeated,
        // roots G C G D.
        let prog = ChordProgression::for_genre(Genre::Bluegrass, 0, 7, Mode::Major, 8);
        assert_eq!(prog.len(), 8);
        let roots: Vec<u8> = prog.chords().iter().map(|c| c.root).collect();
        assert_eq!(roots, vec![7, 0, 7, 2, 7, 0, 7, 2]);
    }

    #[test]
    fn test_template_cycles() {
        let prog = ChordProgression::from_template(&["I", "V"], 0, Mode::Major, 5);
        let roots: Vec<u8> = prog.chords().iter().map(|c| c.root).collect();
        assert_eq!(roots, vec![0, 7, 0, 7, 0]);
    }

    #[test]
    fn test_voicing_invariant_holds() {
        let prog = ChordProgression::for_genre(Genre::CountryBallad, 0, 0, Mode::Major, 8);
        for chord in prog.chords() {
            assert_eq!(chord.voicing().len(), chord.tones().len());
            for (pc, note) in chord.tones().iter().zip(chord.voicing()) {
                assert_eq!(*pc, note.pitch_class());
            }
        }
    }

    #[test]
    fn test_adjacent_voicings_are_minimal() {
        // Exhaustive oracle: for every adjacent pair, the chosen voicing's
        // total movement is <= every rotation and octave assignment.
        let prog = ChordProgression::for_genre(Genre::FolkPop, 0, 2, Mode::Major, 6);
        for pair in prog.chords().windows(2) {
            let prev = pair[0].voicing();
            let chosen = voicing::total_movement(prev, pair[1].voicing());

            for rotation in voicing::rotations(pair[1].tones()) {
                let octaves: Vec<i8> = (voicing::OCTAVE_LOW..=voicing::OCTAVE_HIGH).collect();
                for &o0 in &octaves {
                    for &o1 in &octaves {
                        for &o2 in &octaves {
                            let candidate = vec![
                                Note::with_octave(rotation[0], o0).unwrap(),
                                Note::with_octave(rotation[1], o1).unwrap(),
                                Note::with_octave(rotation[2], o2).unwrap(),
                            ];
                            assert!(chosen <= voicing::total_movement(prev, &candidate));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_bad_numeral_degrades_to_tonic() {
        let prog = ChordProgression::from_template(&["XI"], 7, Mode::Major, 2);
        assert_eq!(prog[0].root, 7);
    }

    #[test]
    fn test_zero_bars_still_non_empty() {
        let prog = ChordProgression::from_template(&["I"], 0, Mode::Major, 0);
        assert!(!prog.is_empty());
    }

    #[test]
    fn test_variation_wraps() {
        let a = ChordProgression::for_genre(Genre::Bluegrass, 0, 7, Mode::Major, 4);
        let b = ChordProgression::for_genre(Genre::Bluegrass, 3, 7, Mode::Major, 4);
        assert_eq!(a, b);
    }
}
