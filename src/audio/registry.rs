//! Voice registry
//!
//! The registry exclusively owns every currently-sounding voice. All
//! membership changes go through `admit`, `release`, `release_all`, and
//! `sweep`, which keeps the exactly-once teardown invariant enforceable in
//! one place. The polyphony cap is hard: when a note-on arrives at the
//! cap, the oldest voice is released and removed before the new one is
//! admitted (evict-oldest, documented in DESIGN.md), so `len() <= cap`
//! holds at every instant.

use songsmith_core::{Note, PartId};

use crate::audio::adsr::Envelope;
use crate::audio::instrument::Chain;
use crate::audio::voice::{Voice, VoiceId};

/// Default advisory ceiling on simultaneously sounding notes.
pub const POLYPHONY_CAP: usize = 512;

pub struct VoiceRegistry {
    /// Admission order, which is also note-on order.
    voices: Vec<Voice>,
    next_id: u64,
    cap: usize,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::with_cap(POLYPHONY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            voices: Vec::new(),
            next_id: 0,
            cap: cap.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Admit a new voice, evicting the oldest first if the registry is at
    /// the cap. Returns the new voice's id.
    #[allow(clippy::too_many_arguments)]
    pub fn admit(
        &mut self,
        part: PartId,
        instrument: &str,
        note: Note,
        velocity: f32,
        started_at: f64,
        chain: Chain,
        envelope: Envelope,
    ) -> VoiceId {
        while self.voices.len() >= self.cap {
            let mut oldest = self.voices.remove(0);
            oldest.release();
        }

        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.push(Voice::new(
            id,
            part,
            instrument.to_string(),
            note,
            velocity,
            started_at,
            chain,
            envelope,
        ));
        id
    }

    /// Release one voice by id. Returns true if this call was the one that
    /// fired its teardown; false if the voice was already released or is
    /// gone.
    pub fn release(&mut self, id: VoiceId) -> bool {
        self.voices
            .iter_mut()
            .find(|v| v.id() == id)
            .map(|v| v.release())
            .unwrap_or(false)
    }

    /// Release every voice. Safe to call repeatedly; already-released
    /// voices are untouched.
    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    /// Drop voices whose release tails have faded out.
    pub fn sweep(&mut self) {
        self.voices.retain(|v| !v.is_finished());
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }
}

impl Default for VoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
