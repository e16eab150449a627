//! Genre catalogs
//!
//! Each genre bundles the material the generators draw from: roman-numeral
//! progression templates, a fixed song-structure template, rhythm pattern
//! catalogs for melody and bass, an 8-slot drum grid, a tempo range, and a
//! guitar articulation style.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::theory::Mode;

/// Song section kinds, in the vocabulary the structure templates use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Intro,
    Verse,
    Chorus,
    Bridge,
    Outro,
    Instrumental,
}

impl SectionType {
    /// Default section length in bars: verses and choruses run long, the
    /// connective sections stay short.
    pub fn default_bars(&self) -> u32 {
        match self {
            SectionType::Verse | SectionType::Chorus => 8,
            _ => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SectionType::Intro => "intro",
            SectionType::Verse => "verse",
            SectionType::Chorus => "chorus",
            SectionType::Bridge => "bridge",
            SectionType::Outro => "outro",
            SectionType::Instrumental => "instrumental",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How the guitar part articulates chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuitarStyle {
    /// Chord tones spread across a sixteenth-note grid.
    Arpeggiated,
    /// All chord tones struck together, one hit per chord.
    Strummed,
    /// Fixed root-fifth-third-fifth picking figure.
    Fingerpicked,
}

/// Boolean 8-slot (eighth-note) drum grid for one bar, plus the fixed
/// per-lane velocities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumGrid {
    pub kick: [bool; 8],
    pub snare: [bool; 8],
    pub hihat: [bool; 8],
}

pub const KICK_VELOCITY: f32 = 0.8;
pub const SNARE_VELOCITY: f32 = 0.7;
pub const HIHAT_VELOCITY: f32 = 0.4;

/// Melody/bass rhythm step duration as an exact fraction of a beat.
pub type RhythmStep = (i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    #[default]
    CountryBallad,
    Bluegrass,
    FolkPop,
}

impl Genre {
    /// Parse a genre name. Unknown genres fall back to the country ballad
    /// rules instead of failing.
    pub fn from_name(s: &str) -> Genre {
        match s.to_lowercase().as_str() {
            "country-ballad" | "country" | "ballad" => Genre::CountryBallad,
            "bluegrass" => Genre::Bluegrass,
            "folk-pop" | "folk" | "pop" => Genre::FolkPop,
            _ => Genre::CountryBallad,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Genre::CountryBallad => "country-ballad",
            Genre::Bluegrass => "bluegrass",
            Genre::FolkPop => "folk-pop",
        }
    }

    /// Roman-numeral progression templates, signature template first.
    pub fn progression_templates(&self) -> &'static [&'static [&'static str]] {
        match self {
            Genre::CountryBallad => &[
                &["I", "V", "vi", "IV"],
                &["I", "IV", "V", "I"],
                &["I", "V", "vi", "iii", "IV", "I", "IV", "V"],
                &["vi", "IV", "I", "V"],
            ],
            Genre::Bluegrass => &[
                &["I", "IV", "I", "V"],
                &["I", "V", "I", "IV", "I", "V", "I"],
                &["I", "IV", "I", "V", "I"],
            ],
            Genre::FolkPop => &[
                &["I", "V", "vi", "IV"],
                &["vi", "IV", "I", "V"],
                &["I", "IV", "vi", "V"],
            ],
        }
    }

    /// Fixed ordered section-type template.
    pub fn structure(&self) -> &'static [SectionType] {
        use SectionType::*;
        match self {
            Genre::CountryBallad => &[
                Intro, Verse, Verse, Chorus, Verse, Chorus, Bridge, Chorus, Outro,
            ],
            Genre::Bluegrass => &[Intro, Verse, Chorus, Instrumental, Verse, Chorus, Outro],
            Genre::FolkPop => &[Intro, Verse, Chorus, Verse, Chorus, Bridge, Chorus, Outro],
        }
    }

    /// Melody rhythm pattern catalog; one pattern is consumed per chord,
    /// cycling through the catalog.
    pub fn melody_rhythms(&self) -> &'static [&'static [RhythmStep]] {
        match self {
            Genre::CountryBallad => &[
                &[(1, 2), (1, 2), (1, 1), (1, 2), (1, 2)],
                &[(1, 4), (1, 4), (1, 2), (1, 2), (1, 1), (1, 2)],
                &[(1, 1), (1, 2), (1, 2), (1, 2), (1, 2)],
            ],
            Genre::Bluegrass => &[
                &[(1, 4), (1, 4), (1, 4), (1, 4), (1, 2), (1, 2)],
                &[(1, 2), (1, 4), (1, 4), (1, 2), (1, 2)],
            ],
            Genre::FolkPop => &[
                &[(1, 2), (1, 2), (1, 2), (1, 2), (1, 1)],
                &[(1, 1), (1, 2), (1, 2), (1, 2), (1, 2)],
            ],
        }
    }

    /// Bass rhythm pattern: one pitch per step, tiled across each bar.
    pub fn bass_rhythm(&self) -> &'static [RhythmStep] {
        match self {
            // Half notes
            Genre::CountryBallad => &[(2, 1), (2, 1)],
            // Walking quarters
            Genre::Bluegrass => &[(1, 1), (1, 1), (1, 1), (1, 1)],
            Genre::FolkPop => &[(1, 1), (1, 1), (1, 1), (1, 1)],
        }
    }

    /// Per-genre drum grid (kick / snare / hi-hat lanes).
    pub fn drum_grid(&self) -> DrumGrid {
        const ON: bool = true;
        const OFF: bool = false;
        match self {
            Genre::CountryBallad => DrumGrid {
                kick: [ON, OFF, OFF, ON, OFF, OFF, ON, OFF],
                snare: [OFF, OFF, ON, OFF, OFF, OFF, ON, OFF],
                hihat: [ON; 8],
            },
            Genre::Bluegrass => DrumGrid {
                kick: [ON, OFF, ON, OFF, ON, OFF, ON, OFF],
                snare: [OFF, ON, OFF, ON, OFF, ON, OFF, ON],
                hihat: [ON; 8],
            },
            Genre::FolkPop => DrumGrid {
                kick: [ON, OFF, OFF, ON, OFF, ON, OFF, OFF],
                snare: [OFF, OFF, ON, OFF, OFF, OFF, ON, OFF],
                hihat: [ON; 8],
            },
        }
    }

    /// Inclusive tempo range the genre normally lives in.
    pub fn tempo_range(&self) -> (f32, f32) {
        match self {
            Genre::CountryBallad => (60.0, 90.0),
            Genre::Bluegrass => (120.0, 180.0),
            Genre::FolkPop => (90.0, 120.0),
        }
    }

    /// Guitar articulation: arpeggiated picking for the up-tempo genre,
    /// block strums for ballads, fingerpicking otherwise.
    pub fn guitar_style(&self) -> GuitarStyle {
        match self {
            Genre::Bluegrass => GuitarStyle::Arpeggiated,
            Genre::CountryBallad => GuitarStyle::Strummed,
            Genre::FolkPop => GuitarStyle::Fingerpicked,
        }
    }

    pub fn preferred_mode(&self) -> Mode {
        Mode::Major
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_genre_falls_back() {
        assert_eq!(Genre::from_name("death-metal"), Genre::CountryBallad);
        assert_eq!(Genre::from_name("Bluegrass"), Genre::Bluegrass);
    }

    #[test]
    fn test_bluegrass_signature_template() {
        assert_eq!(
            Genre::Bluegrass.progression_templates()[0],
            &["I", "IV", "I", "V"]
        );
    }

    #[test]
    fn test_structures_bounded_by_section_vocab() {
        for genre in [Genre::CountryBallad, Genre::Bluegrass, Genre::FolkPop] {
            assert!(!genre.structure().is_empty());
            assert_eq!(genre.structure()[0], SectionType::Intro);
        }
    }

    #[test]
    fn test_melody_rhythms_fill_at_most_two_bars() {
        for genre in [Genre::CountryBallad, Genre::Bluegrass, Genre::FolkPop] {
            for pattern in genre.melody_rhythms() {
                let total: f64 = pattern.iter().map(|(n, d)| *n as f64 / *d as f64).sum();
                assert!(total <= 8.0);
            }
        }
    }

    #[test]
    fn test_section_bar_defaults() {
        assert_eq!(SectionType::Verse.default_bars(), 8);
        assert_eq!(SectionType::Bridge.default_bars(), 4);
        assert_eq!(SectionType::Intro.default_bars(), 4);
    }

    #[test]
    fn test_drum_grid_has_backbeat() {
        let grid = Genre::CountryBallad.drum_grid();
        assert!(grid.snare[2]);
        assert!(grid.snare[6]);
        assert!(grid.hihat.iter().all(|&h| h));
    }
}
