use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A concrete pitch: chromatic pitch class (0-11) plus octave.
/// 0=C, 1=C#/Db, 2=D, 3=D#/Eb, 4=E, 5=F, 6=F#/Gb, 7=G, 8=G#/Ab, 9=A, 10=A#/Bb, 11=B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pitch_class: u8,
    octave: i8, // scientific pitch notation, 4 = the octave of middle C
    flat_spelling: bool,
}

impl Note {
    /// Create a note in the default octave (4).
    pub fn new(pitch_class: u8) -> Result<Self> {
        Self::with_octave(pitch_class, 4)
    }

    /// Create a note with an explicit octave.
    pub fn with_octave(pitch_class: u8, octave: i8) -> Result<Self> {
        if pitch_class > 11 {
            return Err(anyhow!("Pitch class must be 0-11, got {}", pitch_class));
        }
        Ok(Note {
            pitch_class,
            octave,
            flat_spelling: false,
        })
    }

    /// Prefer the flat spelling (Db rather than C#) when displayed.
    pub fn spelled_flat(mut self) -> Self {
        self.flat_spelling = true;
        self
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Piano-key semitone index (MIDI numbering, middle C = 60).
    pub fn midi(&self) -> i16 {
        (self.octave as i16 + 1) * 12 + self.pitch_class as i16
    }

    /// Equal-tempered frequency, A4 = 440 Hz.
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.midi() as f32 - 69.0) / 12.0)
    }

    /// Transpose by a signed number of semitones, carrying the octave.
    pub fn transpose(self, semitones: i32) -> Note {
        let absolute = self.pitch_class as i32 + semitones;
        Note {
            pitch_class: absolute.rem_euclid(12) as u8,
            octave: self.octave + absolute.div_euclid(12) as i8,
            flat_spelling: self.flat_spelling,
        }
    }

    fn is_natural(pitch_class: u8) -> bool {
        matches!(pitch_class, 0 | 2 | 4 | 5 | 7 | 9 | 11)
    }

    fn name(&self) -> &'static str {
        const SHARP: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        const FLAT: [&str; 12] = [
            "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
        ];
        if self.flat_spelling && !Self::is_natural(self.pitch_class) {
            FLAT[self.pitch_class as usize]
        } else {
            SHARP[self.pitch_class as usize]
        }
    }
}

impl FromStr for Note {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| anyhow!("Empty note name"))?
            .to_ascii_uppercase();

        let base = match letter {
            'C' => 0i16,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(anyhow!("Invalid note name: {}", s)),
        };

        let rest: String = chars.collect();
        let (accidental, octave_part, flat) = match rest.chars().next() {
            Some('#') => (1i16, &rest[1..], false),
            Some('b') => (-1, &rest[1..], true),
            _ => (0, rest.as_str(), false),
        };

        let octave = if octave_part.is_empty() {
            4
        } else {
            octave_part
                .parse::<i8>()
                .map_err(|_| anyhow!("Invalid octave: {}", octave_part))?
        };

        let pitch_class = (base + accidental).rem_euclid(12) as u8;
        let mut note = Note::with_octave(pitch_class, octave)?;
        if flat {
            note = note.spelled_flat();
        }
        Ok(note)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        // Octave 4 is the unmarked default for terse chord listings
        if self.octave != 4 {
            write!(f, "{}", self.octave)?;
        }
        Ok(())
    }
}

impl Add<i32> for Note {
    type Output = Note;

    fn add(self, semitones: i32) -> Note {
        self.transpose(semitones)
    }
}

impl Sub<i32> for Note {
    type Output = Note;

    fn sub(self, semitones: i32) -> Note {
        self.transpose(-semitones)
    }
}
