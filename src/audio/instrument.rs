//! Instrument synthesis graphs
//!
//! Each instrument maps to a tagged profile variant: a small
//! physical-modeling chain for plucked, bowed, and struck strings, or a
//! generic detuned-oscillator stack when no specialized model exists.
//! Dispatch is a pattern match on the variant; there are no string
//! comparisons in the signal path. Building a chain can fail (bad
//! frequency, empty layer stack); the scheduler logs and skips that single
//! voice instead of dying.

use anyhow::{Result, bail};
use std::sync::Arc;

use crate::audio::adsr::EnvelopeParams;
use crate::audio::dsp::{Noise, Oscillator, ResonantLowPass, Waveform};
use crate::audio::library::SampleBuffer;

/// One oscillator layer of the generic fallback stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscLayer {
    pub waveform: Waveform,
    pub gain: f32,
    pub detune_cents: f32,
    pub freq_ratio: f32,
}

/// Parametric synthesis profile for an instrument family.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentProfile {
    /// Noise-burst excitation circulating through a damped delay line
    /// (Karplus-Strong), then body filtering.
    PluckedString { brightness: f32, damping: f32 },
    /// Harmonic oscillator mix with continuous low-frequency vibrato and a
    /// trace of bow noise.
    BowedString {
        vibrato_rate: f32,
        vibrato_depth: f32,
        bow_noise: f32,
    },
    /// Three detuned strings struck by a short hammer burst.
    StruckString { detune: f32, hammer_level: f32 },
    /// 2-3 detuned oscillators through a resonant low-pass.
    Generic {
        layers: Vec<OscLayer>,
        cutoff: f32,
        resonance: f32,
    },
}

impl InstrumentProfile {
    /// The envelope family that matches the excitation model.
    pub fn envelope(&self) -> EnvelopeParams {
        match self {
            InstrumentProfile::PluckedString { .. } => EnvelopeParams::pluck(),
            InstrumentProfile::BowedString { .. } => EnvelopeParams::bowed(),
            InstrumentProfile::StruckString { .. } => EnvelopeParams::keys(),
            InstrumentProfile::Generic { .. } => EnvelopeParams::plain(),
        }
    }

    /// Build the per-note sample generator.
    pub fn build(&self, frequency: f32, velocity: f32, sample_rate: f32) -> Result<Chain> {
        if !frequency.is_finite() || frequency <= 0.0 {
            bail!("Unplayable frequency: {}", frequency);
        }

        match self {
            InstrumentProfile::PluckedString {
                brightness,
                damping,
            } => {
                let period = (sample_rate / frequency).round() as usize;
                if period < 2 {
                    bail!("Frequency {} Hz too high for the string model", frequency);
                }
                let mut noise = Noise::new(frequency.to_bits());
                let line: Vec<f32> = (0..period)
                    .map(|_| noise.next_sample() * velocity.clamp(0.0, 1.0))
                    .collect();
                Ok(Chain::Plucked(KarplusStrong {
                    line,
                    position: 0,
                    damping: damping.clamp(0.8, 0.9999),
                    body: ResonantLowPass::new(3000.0 * brightness, 5.0, sample_rate),
                }))
            }
            InstrumentProfile::BowedString {
                vibrato_rate,
                vibrato_depth,
                bow_noise,
            } => Ok(Chain::Bowed(BowedChain {
                frequency,
                fundamental: Oscillator::new(Waveform::Saw, frequency, sample_rate),
                second: Oscillator::new(Waveform::Sine, frequency * 2.0, sample_rate),
                third: Oscillator::new(Waveform::Triangle, frequency * 3.0, sample_rate),
                vibrato: Oscillator::new(Waveform::Sine, *vibrato_rate, sample_rate),
                vibrato_depth: frequency * vibrato_depth,
                noise: Noise::new(frequency.to_bits() ^ 0x5eed),
                noise_level: *bow_noise,
                wood: ResonantLowPass::new(300.0 + frequency * 4.0, 1.2, sample_rate),
            })),
            InstrumentProfile::StruckString {
                detune,
                hammer_level,
            } => {
                let spread = 1.0 + detune;
                Ok(Chain::Struck(StruckChain {
                    strings: [
                        Oscillator::new(Waveform::Triangle, frequency, sample_rate),
                        Oscillator::new(Waveform::Triangle, frequency * spread, sample_rate),
                        Oscillator::new(Waveform::Triangle, frequency / spread, sample_rate),
                    ],
                    hammer: Noise::new(frequency.to_bits() ^ 0x4a77),
                    hammer_level: hammer_level * velocity.clamp(0.0, 1.0),
                    hammer_samples: (sample_rate * 0.01) as usize,
                    elapsed: 0,
                    damper: ResonantLowPass::new(8000.0, 0.7, sample_rate),
                }))
            }
            InstrumentProfile::Generic {
                layers,
                cutoff,
                resonance,
            } => {
                if layers.is_empty() {
                    bail!("Generic profile has no oscillator layers");
                }
                let oscs = layers
                    .iter()
                    .map(|layer| {
                        let detune = 2f32.powf(layer.detune_cents / 1200.0);
                        (
                            Oscillator::new(
                                layer.waveform,
                                frequency * layer.freq_ratio * detune,
                                sample_rate,
                            ),
                            layer.gain,
                        )
                    })
                    .collect();
                Ok(Chain::Stack(OscStack {
                    oscs,
                    filter: ResonantLowPass::new(*cutoff, *resonance, sample_rate),
                }))
            }
        }
    }
}

/// A built per-note signal chain. Every variant produces one sample per
/// call; amplitude enveloping happens in the owning voice.
pub enum Chain {
    Plucked(KarplusStrong),
    Bowed(BowedChain),
    Struck(StruckChain),
    Stack(OscStack),
    Sample(SamplePlayer),
}

impl Chain {
    pub fn next_sample(&mut self) -> f32 {
        match self {
            Chain::Plucked(c) => c.next_sample(),
            Chain::Bowed(c) => c.next_sample(),
            Chain::Struck(c) => c.next_sample(),
            Chain::Stack(c) => c.next_sample(),
            Chain::Sample(c) => c.next_sample(),
        }
    }
}

/// Damped delay-line string.
pub struct KarplusStrong {
    line: Vec<f32>,
    position: usize,
    damping: f32,
    body: ResonantLowPass,
}

impl KarplusStrong {
    fn next_sample(&mut self) -> f32 {
        let len = self.line.len();
        let current = self.line[self.position];
        let next = self.line[(self.position + 1) % len];
        self.line[self.position] = self.damping * 0.5 * (current + next);
        self.position = (self.position + 1) % len;
        self.body.process(current)
    }
}

/// Bowed-string harmonic mix with vibrato.
pub struct BowedChain {
    frequency: f32,
    fundamental: Oscillator,
    second: Oscillator,
    third: Oscillator,
    vibrato: Oscillator,
    vibrato_depth: f32,
    noise: Noise,
    noise_level: f32,
    wood: ResonantLowPass,
}

impl BowedChain {
    fn next_sample(&mut self) -> f32 {
        let wobble = self.vibrato.next_sample() * self.vibrato_depth;
        self.fundamental.set_frequency(self.frequency + wobble);

        let mix = self.fundamental.next_sample()
            + self.second.next_sample() * 0.3
            + self.third.next_sample() * 0.15
            + self.noise.next_sample() * self.noise_level;
        self.wood.process(mix * 0.6)
    }
}

/// Detuned string trio with a percussive hammer burst.
pub struct StruckChain {
    strings: [Oscillator; 3],
    hammer: Noise,
    hammer_level: f32,
    hammer_samples: usize,
    elapsed: usize,
    damper: ResonantLowPass,
}

impl StruckChain {
    fn next_sample(&mut self) -> f32 {
        let strings = self.strings[0].next_sample() * 0.4
            + self.strings[1].next_sample() * 0.35
            + self.strings[2].next_sample() * 0.35;

        let hammer = if self.elapsed < self.hammer_samples {
            let t = self.elapsed as f32 / self.hammer_samples as f32;
            self.hammer.next_sample() * self.hammer_level * (1.0 - t)
        } else {
            0.0
        };
        self.elapsed += 1;

        self.damper.process(strings * 0.8 + hammer * 0.3)
    }
}

/// Generic oscillator stack through a resonant low-pass.
pub struct OscStack {
    oscs: Vec<(Oscillator, f32)>,
    filter: ResonantLowPass,
}

impl OscStack {
    fn next_sample(&mut self) -> f32 {
        let sum: f32 = self
            .oscs
            .iter_mut()
            .map(|(osc, gain)| osc.next_sample() * *gain)
            .sum();
        self.filter.process(sum)
    }
}

/// Recorded sample played back at a pitch-shifting rate ratio.
pub struct SamplePlayer {
    buffer: Arc<SampleBuffer>,
    position: f64,
    rate: f64,
}

impl SamplePlayer {
    pub fn new(buffer: Arc<SampleBuffer>, frequency: f32) -> Result<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            bail!("Unplayable frequency: {}", frequency);
        }
        if buffer.frames.is_empty() {
            bail!("Empty sample buffer");
        }
        let rate = frequency as f64 / buffer.root_frequency() as f64;
        Ok(Self {
            buffer,
            position: 0.0,
            rate,
        })
    }

    fn next_sample(&mut self) -> f32 {
        let frames = &self.buffer.frames;
        let i = self.position as usize;
        if i + 1 >= frames.len() {
            return 0.0;
        }
        let frac = (self.position - i as f64) as f32;
        let value = frames[i] * (1.0 - frac) + frames[i + 1] * frac;
        self.position += self.rate;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    fn peak(chain: &mut Chain, samples: usize) -> f32 {
        (0..samples).fold(0.0f32, |p, _| p.max(chain.next_sample().abs()))
    }

    #[test]
    fn test_plucked_string_rings_and_decays() {
        let profile = InstrumentProfile::PluckedString {
            brightness: 1.0,
            damping: 0.995,
        };
        let mut chain = profile.build(220.0, 0.9, SAMPLE_RATE).unwrap();
        let early = peak(&mut chain, 4000);
        assert!(early > 0.01, "string never spoke");
        // Skip ahead and confirm the loop is losing energy
        for _ in 0..80000 {
            chain.next_sample();
        }
        let late = peak(&mut chain, 4000);
        assert!(late < early);
    }

    #[test]
    fn test_bowed_string_sustains() {
        let profile = InstrumentProfile::BowedString {
            vibrato_rate: 6.5,
            vibrato_depth: 0.015,
            bow_noise: 0.02,
        };
        let mut chain = profile.build(330.0, 0.8, SAMPLE_RATE).unwrap();
        for _ in 0..10000 {
            chain.next_sample();
        }
        // Still producing signal ten thousand samples in
        assert!(peak(&mut chain, 2000) > 0.05);
    }

    #[test]
    fn test_struck_string_produces_finite_output() {
        let profile = InstrumentProfile::StruckString {
            detune: 0.001,
            hammer_level: 0.5,
        };
        let mut chain = profile.build(261.63, 0.7, SAMPLE_RATE).unwrap();
        for _ in 0..20000 {
            assert!(chain.next_sample().is_finite());
        }
    }

    #[test]
    fn test_generic_stack_requires_layers() {
        let profile = InstrumentProfile::Generic {
            layers: vec![],
            cutoff: 2000.0,
            resonance: 0.7,
        };
        assert!(profile.build(440.0, 0.8, SAMPLE_RATE).is_err());
    }

    #[test]
    fn test_bad_frequency_is_rejected() {
        let profile = InstrumentProfile::PluckedString {
            brightness: 1.0,
            damping: 0.995,
        };
        assert!(profile.build(0.0, 0.8, SAMPLE_RATE).is_err());
        assert!(profile.build(f32::NAN, 0.8, SAMPLE_RATE).is_err());
        assert!(profile.build(-50.0, 0.8, SAMPLE_RATE).is_err());
        // Above Nyquist the delay line has no room
        assert!(profile.build(40000.0, 0.8, SAMPLE_RATE).is_err());
    }

    #[test]
    fn test_sample_player_pitch_ratio() {
        let buffer = Arc::new(SampleBuffer {
            root_midi: 69, // A4 = 440 Hz
            sample_rate: SAMPLE_RATE,
            frames: vec![0.5; 1000],
        });
        let same = SamplePlayer::new(buffer.clone(), 440.0).unwrap();
        assert!((same.rate - 1.0).abs() < 1e-6);
        let octave_up = SamplePlayer::new(buffer, 880.0).unwrap();
        assert!((octave_up.rate - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_player_finishes_silent() {
        let buffer = Arc::new(SampleBuffer {
            root_midi: 69,
            sample_rate: SAMPLE_RATE,
            frames: vec![0.3; 16],
        });
        let mut chain = Chain::Sample(SamplePlayer::new(buffer, 440.0).unwrap());
        for _ in 0..64 {
            chain.next_sample();
        }
        assert_eq!(chain.next_sample(), 0.0);
    }
}
