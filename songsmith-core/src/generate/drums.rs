//! Drum part generation
//!
//! The genre's boolean 8-slot grid is tiled once per bar with exact
//! rational arithmetic: slot `s` of bar `b` lands at `b*4 + s/2` beats.
//! Tiling is pure math over the grid, so three bars of a pattern contain
//! exactly three bars' worth of hits and nothing drifts.

use crate::genre::{Genre, HIHAT_VELOCITY, KICK_VELOCITY, SNARE_VELOCITY};
use crate::types::time::{bar_beats, beats};
use crate::types::{DrumHit, DrumTrack};

/// Tile the genre's drum grid across `bars` bars.
pub fn generate(genre: Genre, bars: u32) -> DrumTrack {
    let grid = genre.drum_grid();
    let mut track = DrumTrack::default();

    for bar in 0..bars as i64 {
        let bar_start = bar_beats(bar);
        for slot in 0..8i64 {
            let start = bar_start + beats(slot, 2);
            if grid.kick[slot as usize] {
                track.kick.push(DrumHit {
                    start,
                    velocity: KICK_VELOCITY,
                });
            }
            if grid.snare[slot as usize] {
                track.snare.push(DrumHit {
                    start,
                    velocity: SNARE_VELOCITY,
                });
            }
            if grid.hihat[slot as usize] {
                track.hihat.push(DrumHit {
                    start,
                    velocity: HIHAT_VELOCITY,
                });
            }
        }
    }

    track
}
