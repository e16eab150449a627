//! Standard MIDI File export
//!
//! One track per requested part at 480 ticks per quarter note, tempo meta
//! from the song parameters, note-on/note-off pairs with variable-length
//! delta times. Type 0 for a single part, type 1 otherwise. Drum lanes go
//! out on channel 10 with their General MIDI note numbers.

use anyhow::{Result, bail};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};
use num_rational::Ratio;

use crate::composition::Composition;
use crate::types::time::Beats;
use crate::types::{PartId, ScoreEvent, ScoreEventKind};

/// Ticks per quarter note.
pub const TICKS_PER_BEAT: u16 = 480;

/// Render the chosen parts of a composition as an SMF byte stream.
pub fn export(composition: &Composition, parts: &[PartId]) -> Result<Vec<u8>> {
    if parts.is_empty() {
        bail!("No parts requested for note-file export");
    }

    let format = if parts.len() == 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    };
    let header = Header {
        format,
        timing: Timing::Metrical(TICKS_PER_BEAT.into()),
    };

    let events = composition.flatten();
    let mut smf = Smf::new(header);

    for (index, &part) in parts.iter().enumerate() {
        let with_tempo = index == 0;
        smf.tracks
            .push(build_track(&events, part, composition.params.tempo, with_tempo));
    }

    let mut out = Vec::new();
    smf.write(&mut out)
        .map_err(|e| anyhow::anyhow!("Failed to write MIDI stream: {}", e))?;
    Ok(out)
}

fn channel_for(part: PartId) -> u8 {
    match part {
        PartId::Melody => 0,
        PartId::Bass => 1,
        PartId::Guitar => 2,
        PartId::Piano => 3,
        PartId::Drums => 9, // GM percussion channel
    }
}

fn beats_to_ticks(b: Beats) -> u32 {
    let scaled = b * Ratio::from_integer(TICKS_PER_BEAT as i64);
    let ticks = *scaled.numer() as f64 / *scaled.denom() as f64;
    ticks.round().max(0.0) as u32
}

fn velocity_to_midi(v: f32) -> u8 {
    ((v * 127.0).round() as i32).clamp(1, 127) as u8
}

fn build_track<'a>(
    events: &[ScoreEvent],
    part: PartId,
    tempo: f32,
    with_tempo: bool,
) -> Vec<TrackEvent<'a>> {
    let channel = channel_for(part);
    let mut track: Vec<TrackEvent> = Vec::new();

    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(part.name().as_bytes())),
    });
    if with_tempo {
        let microseconds_per_beat = (60_000_000.0 / tempo) as u32;
        track.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(microseconds_per_beat.into())),
        });
    }

    // Absolute ticks first, deltas after sorting
    for event in events.iter().filter(|e| e.part == part) {
        let start = beats_to_ticks(event.start);
        let end = start + beats_to_ticks(event.duration).max(1);
        let (key, velocity) = match &event.kind {
            ScoreEventKind::Note { note, velocity } => {
                ((note.midi().clamp(0, 127)) as u8, velocity_to_midi(*velocity))
            }
            ScoreEventKind::Drum { sound, velocity } => {
                (sound.midi_note(), velocity_to_midi(*velocity))
            }
        };

        track.push(TrackEvent {
            delta: start.into(),
            kind: TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOn {
                    key: key.into(),
                    vel: velocity.into(),
                },
            },
        });
        track.push(TrackEvent {
            delta: end.into(),
            kind: TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOff {
                    key: key.into(),
                    vel: 0.into(),
                },
            },
        });
    }

    // Stable sort keeps each note's off ahead of the next on at equal ticks
    track.sort_by_key(|e| e.delta.as_int());
    to_delta_times(&mut track);

    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

/// Rewrite absolute tick times as deltas from the previous event.
fn to_delta_times(track: &mut [TrackEvent]) {
    let mut previous = 0u32;
    for event in track.iter_mut() {
        let absolute = event.delta.as_int();
        event.delta = absolute.saturating_sub(previous).into();
        previous = absolute;
    }
}
