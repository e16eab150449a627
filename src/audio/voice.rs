//! Per-note voice lifecycle
//!
//! A `Voice` pairs one built synthesis chain with one amplitude envelope
//! and owns the note's teardown. The lifecycle runs Sounding to Released;
//! release fires exactly once, guarded by the voice's own state rather
//! than wall-clock time, so a natural-expiry timer and an explicit stop
//! can race without double-firing.

use songsmith_core::{Note, PartId};

use crate::audio::adsr::Envelope;
use crate::audio::instrument::Chain;

/// Opaque per-note identifier, unique within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Sounding,
    Released,
}

pub struct Voice {
    id: VoiceId,
    part: PartId,
    instrument: String,
    note: Note,
    velocity: f32,
    /// Absolute beat of the note-on, used as the eviction age.
    started_at: f64,
    chain: Chain,
    envelope: Envelope,
    state: VoiceState,
}

impl Voice {
    pub(crate) fn new(
        id: VoiceId,
        part: PartId,
        instrument: String,
        note: Note,
        velocity: f32,
        started_at: f64,
        chain: Chain,
        mut envelope: Envelope,
    ) -> Self {
        envelope.trigger();
        Self {
            id,
            part,
            instrument,
            note,
            velocity: velocity.clamp(0.0, 1.0),
            started_at,
            chain,
            envelope,
            state: VoiceState::Sounding,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn part(&self) -> PartId {
        self.part
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn note(&self) -> Note {
        self.note
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Begin teardown: enter the envelope's release stage. Returns true
    /// only the first time; every later call is a no-op.
    pub fn release(&mut self) -> bool {
        if self.state == VoiceState::Released {
            return false;
        }
        self.state = VoiceState::Released;
        self.envelope.release();
        true
    }

    /// True once the release tail has faded out. A sounding voice is never
    /// finished, whatever its chain is doing.
    pub fn is_finished(&self) -> bool {
        self.state == VoiceState::Released && self.envelope.is_finished()
    }

    pub fn next_sample(&mut self) -> f32 {
        self.chain.next_sample() * self.envelope.next_sample() * self.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::adsr::EnvelopeParams;
    use crate::audio::instrument::InstrumentProfile;

    const SAMPLE_RATE: f32 = 44100.0;

    fn voice(id: u64) -> Voice {
        let profile = InstrumentProfile::StruckString {
            detune: 0.001,
            hammer_level: 0.3,
        };
        let chain = profile.build(261.63, 0.8, SAMPLE_RATE).unwrap();
        let envelope = Envelope::new(EnvelopeParams::keys(), SAMPLE_RATE);
        Voice::new(
            VoiceId(id),
            PartId::Piano,
            "piano".to_string(),
            "C4".parse().unwrap(),
            0.8,
            0.0,
            chain,
            envelope,
        )
    }

    #[test]
    fn test_new_voice_is_sounding() {
        let v = voice(1);
        assert_eq!(v.state(), VoiceState::Sounding);
        assert!(!v.is_finished());
    }

    #[test]
    fn test_release_fires_exactly_once() {
        let mut v = voice(2);
        assert!(v.release());
        assert!(!v.release());
        assert!(!v.release());
        assert_eq!(v.state(), VoiceState::Released);
    }

    #[test]
    fn test_released_voice_fades_to_finished() {
        let mut v = voice(3);
        for _ in 0..2000 {
            v.next_sample();
        }
        v.release();
        // keys() releases in 0.6 s; give it a full second
        for _ in 0..44100 {
            v.next_sample();
        }
        assert!(v.is_finished());
    }

    #[test]
    fn test_sounding_voice_produces_signal() {
        let mut v = voice(4);
        let mut peak = 0.0f32;
        for _ in 0..4000 {
            peak = peak.max(v.next_sample().abs());
        }
        assert!(peak > 0.01);
    }
}
