//! Voice leading
//!
//! Chooses concrete octave-assigned voicings across a progression so that
//! each voice moves as little as possible from chord to chord. For every
//! cyclic rotation ("inversion") of the new chord's tone list, each voice
//! independently takes the octave closest to the previous chord's
//! same-index voice; the rotation with the smallest summed semitone
//! movement wins, first rotation enumerated winning ties.

use crate::types::Note;

/// Octave window searched when fitting a tone against the previous voice.
pub const OCTAVE_LOW: i8 = 2;
pub const OCTAVE_HIGH: i8 = 5;

/// Voicing for the first chord of a progression: stack the tones upward
/// from octave 3 so the triad opens naturally.
pub fn initial_voicing(tones: &[u8]) -> Vec<Note> {
    tones
        .iter()
        .enumerate()
        .map(|(i, &pc)| {
            Note::with_octave(pc, 3 + i as i8).expect("pitch class is already validated")
        })
        .collect()
}

/// All cyclic rotations of a tone list, starting with the original order.
pub fn rotations(tones: &[u8]) -> Vec<Vec<u8>> {
    (0..tones.len())
        .map(|i| {
            let mut rotated = tones[i..].to_vec();
            rotated.extend_from_slice(&tones[..i]);
            rotated
        })
        .collect()
}

/// The octave placement of `pitch_class` nearest to `target`, searching the
/// fixed octave window bottom-up (ties keep the lower octave).
fn nearest_octave(pitch_class: u8, target: Note) -> (Note, i32) {
    let mut best = Note::with_octave(pitch_class, OCTAVE_LOW).expect("valid pitch class");
    let mut best_distance = i32::MAX;
    for octave in OCTAVE_LOW..=OCTAVE_HIGH {
        let candidate = Note::with_octave(pitch_class, octave).expect("valid pitch class");
        let distance = (candidate.midi() as i32 - target.midi() as i32).abs();
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }
    (best, best_distance)
}

/// Total semitone movement between two equal-length voicings.
pub fn total_movement(from: &[Note], to: &[Note]) -> i32 {
    from.iter()
        .zip(to)
        .map(|(a, b)| (b.midi() as i32 - a.midi() as i32).abs())
        .sum()
}

/// Voice the tones of a chord against the previous chord's voicing.
/// Returns the winning tone rotation together with its voiced notes, so the
/// caller can keep tones and voicing aligned.
pub fn lead(previous: &[Note], tones: &[u8]) -> (Vec<u8>, Vec<Note>) {
    if previous.is_empty() || tones.is_empty() {
        return (tones.to_vec(), initial_voicing(tones));
    }

    let mut best: Option<(i32, Vec<u8>, Vec<Note>)> = None;

    for rotation in rotations(tones) {
        let mut voiced = Vec::with_capacity(rotation.len());
        let mut total = 0i32;

        for (i, &pc) in rotation.iter().enumerate() {
            // A four-note chord after a triad pins its extra voice to the
            // top previous voice
            let target = previous[i.min(previous.len() - 1)];
            let (note, distance) = nearest_octave(pc, target);
            voiced.push(note);
            total += distance;
        }

        let replace = match &best {
            Some((best_total, _, _)) => total < *best_total,
            None => true,
        };
        if replace {
            best = Some((total, rotation, voiced));
        }
    }

    let (_, tones, voicing) = best.expect("at least one rotation exists");
    (tones, voicing)
}
