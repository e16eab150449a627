use crate::theory::Mode;
use crate::types::Note;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based scale degree with its roman numeral spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

impl Degree {
    pub fn index(&self) -> usize {
        match self {
            Degree::I => 0,
            Degree::II => 1,
            Degree::III => 2,
            Degree::IV => 3,
            Degree::V => 4,
            Degree::VI => 5,
            Degree::VII => 6,
        }
    }

    fn numeral(&self) -> &'static str {
        match self {
            Degree::I => "I",
            Degree::II => "II",
            Degree::III => "III",
            Degree::IV => "IV",
            Degree::V => "V",
            Degree::VI => "VI",
            Degree::VII => "VII",
        }
    }
}

/// Triad quality. Lower-case numerals in a template force minor; the
/// diminished form only appears on vii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Major,
    Minor,
    Diminished,
}

impl Quality {
    /// Interval of the chord third in semitones.
    fn third(&self) -> u8 {
        match self {
            Quality::Major => 4,
            Quality::Minor | Quality::Diminished => 3,
        }
    }

    /// Interval of the chord fifth in semitones.
    fn fifth(&self) -> u8 {
        match self {
            Quality::Diminished => 6,
            _ => 7,
        }
    }
}

/// A chord in a progression: root pitch class, roman-numeral label, quality,
/// its unvoiced tones, and the concrete octave-assigned voicing chosen by
/// voice leading.
///
/// Invariant: `voicing.len() == tones.len()` and `voicing[i]`'s pitch class
/// equals `tones[i]`. Rotating the voicing rotates the tone list with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub root: u8,
    pub degree: Degree,
    pub quality: Quality,
    tones: Vec<u8>,
    voicing: Vec<Note>,
}

impl Chord {
    /// Build an unvoiced chord from a roman numeral template entry in the
    /// given key and mode. Returns `None` for a numeral the templates never
    /// produce. A trailing `7` adds the minor seventh.
    pub fn from_numeral(numeral: &str, key: u8, mode: Mode) -> Option<Chord> {
        let (body, seventh) = match numeral.strip_suffix('7') {
            Some(body) => (body, true),
            None => (numeral, false),
        };

        let degree = match body.to_uppercase().as_str() {
            "I" => Degree::I,
            "II" => Degree::II,
            "III" => Degree::III,
            "IV" => Degree::IV,
            "V" => Degree::V,
            "VI" => Degree::VI,
            "VII" => Degree::VII,
            _ => return None,
        };

        // Case carries the quality: "vi" is minor, "IV" is major.
        let quality = if body.chars().all(|c| c.is_lowercase()) {
            if degree == Degree::VII {
                Quality::Diminished
            } else {
                Quality::Minor
            }
        } else {
            Quality::Major
        };

        let root = mode.degree_pitch_class(key, degree.index());
        let mut tones = vec![
            root,
            (root + quality.third()) % 12,
            (root + quality.fifth()) % 12,
        ];
        if seventh {
            tones.push((root + 10) % 12);
        }

        Some(Chord {
            root,
            degree,
            quality,
            tones,
            voicing: Vec::new(),
        })
    }

    /// Unvoiced pitch classes, in voicing order.
    pub fn tones(&self) -> &[u8] {
        &self.tones
    }

    /// Concrete voiced pitches. Empty until voice leading runs.
    pub fn voicing(&self) -> &[Note] {
        &self.voicing
    }

    /// Pitch class of the chord third (root-relative, not voicing order).
    pub fn third_pitch_class(&self) -> u8 {
        (self.root + self.quality.third()) % 12
    }

    /// Pitch class of the chord fifth.
    pub fn fifth_pitch_class(&self) -> u8 {
        (self.root + self.quality.fifth()) % 12
    }

    /// Install a voicing together with the tone rotation that produced it.
    /// Panics in debug builds if the pairing breaks the chord invariant.
    pub fn set_voicing(&mut self, tones: Vec<u8>, voicing: Vec<Note>) {
        debug_assert_eq!(tones.len(), voicing.len());
        debug_assert!(
            tones
                .iter()
                .zip(&voicing)
                .all(|(pc, note)| *pc == note.pitch_class()),
            "voiced pitch classes must match tone order"
        );
        self.tones = tones;
        self.voicing = voicing;
    }

    /// Roman numeral label, lower-cased for minor and diminished chords.
    pub fn symbol(&self) -> String {
        let numeral = self.degree.numeral();
        match self.quality {
            Quality::Major => numeral.to_string(),
            Quality::Minor => numeral.to_lowercase(),
            Quality::Diminished => format!("{}\u{00b0}", numeral.to_lowercase()),
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())?;
        if !self.voicing.is_empty() {
            let notes: Vec<String> = self.voicing.iter().map(|n| n.to_string()).collect();
            write!(f, " [{}]", notes.join(", "))?;
        }
        Ok(())
    }
}
