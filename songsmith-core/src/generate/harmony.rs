//! Harmonic rhythm
//!
//! How fast the harmony moves, independent of melodic rhythm. Each section
//! type has a chord-duration strategy: intros change slowly and evenly,
//! verses breathe, choruses drive, bridges contrast, outros stretch out.

use serde::{Deserialize, Serialize};

use crate::genre::SectionType;

/// One span of held harmony inside a section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicSlot {
    /// Index into the section's chord progression.
    pub chord_index: usize,
    /// Bar at which the span begins, relative to the section.
    pub start_bar: u32,
    /// How many bars the chord holds.
    pub bars: u32,
}

fn strategy(kind: SectionType) -> &'static [u32] {
    match kind {
        SectionType::Intro => &[2, 2, 2, 2],
        SectionType::Verse => &[1, 1, 2, 1, 1, 2],
        SectionType::Chorus => &[1, 1, 1, 1],
        SectionType::Bridge => &[2, 1, 1, 2],
        SectionType::Outro => &[2, 2, 4],
        SectionType::Instrumental => &[1, 1, 1, 1],
    }
}

/// Lay the section's chords over its bars following the section-type
/// strategy. Spans never extend past the section boundary.
pub fn harmonic_rhythm(kind: SectionType, bars: u32, chord_count: usize) -> Vec<HarmonicSlot> {
    let steps = strategy(kind);
    let mut slots = Vec::new();
    let mut position = 0u32;
    let mut index = 0usize;

    while position < bars {
        let held = steps[index % steps.len()].min(bars - position);
        slots.push(HarmonicSlot {
            chord_index: if chord_count == 0 {
                0
            } else {
                index % chord_count
            },
            start_bar: position,
            bars: held,
        });
        position += held;
        index += 1;
    }

    slots
}
