//! Rational beat arithmetic
//!
//! Score times are kept as exact rationals (beats from the start of the
//! composition) so that grid tilings and section offsets never accumulate
//! floating-point drift. Conversion to seconds happens only at the edge,
//! when an event is handed to the real-time scheduler.

use num_rational::Ratio;

/// A point or span in musical time, measured in beats (quarter notes in 4/4).
pub type Beats = Ratio<i64>;

/// Beats per bar in 4/4 time.
pub const BEATS_PER_BAR: i64 = 4;

/// Construct an exact beat value n/d.
#[inline]
pub fn beats(n: i64, d: i64) -> Beats {
    Ratio::new(n, d)
}

/// Construct a whole number of beats.
#[inline]
pub fn whole_beats(n: i64) -> Beats {
    Ratio::from_integer(n)
}

/// Beats spanned by `bars` whole bars.
#[inline]
pub fn bar_beats(bars: i64) -> Beats {
    Ratio::from_integer(bars * BEATS_PER_BAR)
}

/// Lossy conversion for the audio clock.
#[inline]
pub fn to_f64(t: Beats) -> f64 {
    *t.numer() as f64 / *t.denom() as f64
}

/// Seconds a beat span occupies at the given tempo.
#[inline]
pub fn to_seconds(t: Beats, bpm: f32) -> f64 {
    to_f64(t) * 60.0 / bpm as f64
}

/// Beats covered by a wall-clock duration at the given tempo.
#[inline]
pub fn seconds_to_beats(seconds: f64, bpm: f32) -> f64 {
    seconds * bpm as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_addition() {
        let a = beats(1, 8);
        let b = beats(3, 8);
        assert_eq!(a + b, beats(1, 2));
    }

    #[test]
    fn test_bar_beats() {
        assert_eq!(bar_beats(2), whole_beats(8));
    }

    #[test]
    fn test_seconds_at_tempo() {
        // One beat at 120 BPM is half a second
        assert_eq!(to_seconds(whole_beats(1), 120.0), 0.5);
        // A whole bar at 60 BPM is four seconds
        assert_eq!(to_seconds(bar_beats(1), 60.0), 4.0);
    }

    #[test]
    fn test_eighth_grid_is_exact() {
        // Summing eighths never drifts
        let mut t = whole_beats(0);
        for _ in 0..24 {
            t += beats(1, 2);
        }
        assert_eq!(t, whole_beats(12));
    }
}
