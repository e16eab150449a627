//! Scale modes as ordered semitone-interval sets

use serde::{Deserialize, Serialize};
use std::fmt;

/// The modes the generators understand. Each is an ordered set of seven
/// semitone offsets from the key center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
    Dorian,
    Mixolydian,
}

impl Mode {
    /// Parse a mode name. Unknown names fall back to major rather than
    /// failing; generation must always produce something playable.
    pub fn from_name(s: &str) -> Mode {
        match s.to_lowercase().as_str() {
            "major" | "ionian" => Mode::Major,
            "minor" | "aeolian" => Mode::Minor,
            "dorian" => Mode::Dorian,
            "mixolydian" => Mode::Mixolydian,
            _ => Mode::Major,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
            Mode::Dorian => "dorian",
            Mode::Mixolydian => "mixolydian",
        }
    }

    /// Semitone offsets of the seven scale degrees.
    pub fn intervals(&self) -> [u8; 7] {
        match self {
            Mode::Major => [0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => [0, 2, 3, 5, 7, 8, 10],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
        }
    }

    /// The seven scale pitch classes for a given key center.
    pub fn scale(&self, key: u8) -> [u8; 7] {
        let mut out = [0u8; 7];
        for (slot, interval) in out.iter_mut().zip(self.intervals()) {
            *slot = (key + interval) % 12;
        }
        out
    }

    /// Pitch class of a zero-based scale degree in the given key.
    pub fn degree_pitch_class(&self, key: u8, degree: usize) -> u8 {
        self.scale(key)[degree % 7]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_scale_of_g() {
        // G A B C D E F#
        assert_eq!(Mode::Major.scale(7), [7, 9, 11, 0, 2, 4, 6]);
    }

    #[test]
    fn test_minor_scale_of_a() {
        // A B C D E F G
        assert_eq!(Mode::Minor.scale(9), [9, 11, 0, 2, 4, 5, 7]);
    }

    #[test]
    fn test_unknown_mode_falls_back_to_major() {
        assert_eq!(Mode::from_name("phrygian-ish"), Mode::Major);
        assert_eq!(Mode::from_name("DORIAN"), Mode::Dorian);
    }

    #[test]
    fn test_degree_lookup_wraps() {
        assert_eq!(Mode::Major.degree_pitch_class(0, 0), 0); // C
        assert_eq!(Mode::Major.degree_pitch_class(0, 4), 7); // G
        assert_eq!(Mode::Major.degree_pitch_class(0, 7), 0); // wraps to C
    }
}
