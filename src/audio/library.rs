//! Instrument and sample library
//!
//! The scheduler resolves `(instrument name, pitch)` to a patch: either a
//! parametric synthesis profile or a recorded sample buffer keyed by MIDI
//! note. A built-in parametric bank covers the stock band; imported
//! samples, when registered, win over the parametric fallback for their
//! instrument.

use std::collections::HashMap;
use std::sync::Arc;

use songsmith_core::Note;

use crate::audio::adsr::EnvelopeParams;
use crate::audio::dsp::Waveform;
use crate::audio::instrument::{InstrumentProfile, OscLayer};

/// A decoded recording of one pitch of an instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// MIDI note the recording was made at.
    pub root_midi: u8,
    pub sample_rate: f32,
    pub frames: Vec<f32>,
}

impl SampleBuffer {
    /// Frequency of the recorded pitch.
    pub fn root_frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.root_midi as f32 - 69.0) / 12.0)
    }
}

/// What `resolve` hands back for one note.
pub enum Patch {
    Profile {
        profile: InstrumentProfile,
        envelope: EnvelopeParams,
    },
    Sample(Arc<SampleBuffer>),
}

/// Keyed lookup from instrument names to patches.
pub struct InstrumentBank {
    samples: HashMap<String, HashMap<u8, Arc<SampleBuffer>>>,
}

impl InstrumentBank {
    pub fn new() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }

    /// Register an imported sample for an instrument at a given MIDI note.
    pub fn register_sample(&mut self, instrument: &str, buffer: SampleBuffer) {
        self.samples
            .entry(instrument.to_lowercase())
            .or_default()
            .insert(buffer.root_midi, Arc::new(buffer));
    }

    /// Resolve an instrument and pitch to a patch. Samples recorded at the
    /// exact pitch win; otherwise the parametric bank answers, with the
    /// generic profile as the final fallback so lookup never fails.
    pub fn resolve(&self, instrument: &str, note: Note) -> Patch {
        let name = instrument.to_lowercase();

        if let Some(buffers) = self.samples.get(&name) {
            let midi = note.midi().clamp(0, 127) as u8;
            if let Some(buffer) = buffers.get(&midi) {
                return Patch::Sample(buffer.clone());
            }
        }

        let profile = Self::profile_for(&name);
        let envelope = profile.envelope();
        Patch::Profile { profile, envelope }
    }

    fn profile_for(name: &str) -> InstrumentProfile {
        match name {
            "guitar" | "acoustic-guitar" | "banjo" | "dobro" => InstrumentProfile::PluckedString {
                brightness: 0.8,
                damping: 0.996,
            },
            "fiddle" | "violin" | "strings" => InstrumentProfile::BowedString {
                vibrato_rate: 6.5,
                vibrato_depth: 0.015,
                bow_noise: 0.02,
            },
            "piano" => InstrumentProfile::StruckString {
                detune: 0.001,
                hammer_level: 0.3,
            },
            "bass" => InstrumentProfile::Generic {
                layers: vec![
                    OscLayer {
                        waveform: Waveform::Triangle,
                        gain: 0.6,
                        detune_cents: 0.0,
                        freq_ratio: 1.0,
                    },
                    OscLayer {
                        waveform: Waveform::Sine,
                        gain: 0.4,
                        detune_cents: 0.0,
                        freq_ratio: 0.5,
                    },
                ],
                cutoff: 900.0,
                resonance: 0.8,
            },
            _ => InstrumentProfile::Generic {
                layers: vec![
                    OscLayer {
                        waveform: Waveform::Saw,
                        gain: 0.4,
                        detune_cents: -4.0,
                        freq_ratio: 1.0,
                    },
                    OscLayer {
                        waveform: Waveform::Saw,
                        gain: 0.4,
                        detune_cents: 4.0,
                        freq_ratio: 1.0,
                    },
                    OscLayer {
                        waveform: Waveform::Triangle,
                        gain: 0.2,
                        detune_cents: 0.0,
                        freq_ratio: 2.0,
                    },
                ],
                cutoff: 2800.0,
                resonance: 0.7,
            },
        }
    }
}

impl Default for InstrumentBank {
    fn default() -> Self {
        Self::new()
    }
}
