//! One-shot percussion synthesis
//!
//! Drum hits are short noise/tone bursts with fixed exponential decay.
//! They live outside the pitched-voice envelope model: a hit plays to the
//! end of its burst and is swept from the mixer, with no release stage and
//! no registry entry. The metronome click is the same kind of one-shot.

use std::f32::consts::PI;

use songsmith_core::DrumSound;

use crate::audio::dsp::Noise;

enum Percussion {
    Kick,
    Snare,
    HiHat,
    /// Metronome tick; strong on bar starts.
    Click { strong: bool },
}

/// A single percussion hit rendering itself sample by sample.
pub struct DrumVoice {
    model: Percussion,
    sample_rate: f32,
    sample_count: usize,
    max_samples: usize,
    velocity: f32,
    noise: Noise,
    last_noise: f32,
    hp_state: f32,
}

impl DrumVoice {
    pub fn new(sound: DrumSound, velocity: f32, sample_rate: f32) -> Self {
        let (model, max_ms) = match sound {
            DrumSound::Kick => (Percussion::Kick, 300.0),
            DrumSound::Snare => (Percussion::Snare, 200.0),
            DrumSound::HiHat => (Percussion::HiHat, 80.0),
        };
        Self::build(model, max_ms, velocity, sample_rate, sound.midi_note() as u32)
    }

    /// Metronome tick: a high blip on bar starts, a lower one elsewhere.
    pub fn click(strong: bool, sample_rate: f32) -> Self {
        let velocity = if strong { 0.5 } else { 0.3 };
        Self::build(Percussion::Click { strong }, 40.0, velocity, sample_rate, 0x71c)
    }

    fn build(
        model: Percussion,
        max_ms: f32,
        velocity: f32,
        sample_rate: f32,
        seed: u32,
    ) -> Self {
        Self {
            model,
            sample_rate,
            sample_count: 0,
            max_samples: (max_ms * sample_rate / 1000.0) as usize,
            velocity: velocity.clamp(0.0, 1.0),
            noise: Noise::new(seed.wrapping_mul(7919).max(1)),
            last_noise: 0.0,
            hp_state: 0.0,
        }
    }

    #[inline]
    fn time(&self) -> f32 {
        self.sample_count as f32 / self.sample_rate
    }

    pub fn is_finished(&self) -> bool {
        self.sample_count >= self.max_samples
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.is_finished() {
            return 0.0;
        }

        let sample = match self.model {
            Percussion::Kick => self.kick(),
            Percussion::Snare => self.snare(),
            Percussion::HiHat => self.hihat(),
            Percussion::Click { strong } => self.blip(strong),
        };

        self.sample_count += 1;
        sample * self.velocity
    }

    /// Sine with a fast downward pitch sweep and a trace of beater click.
    fn kick(&self) -> f32 {
        let t = self.time();
        let pitch = 150.0 * (-t * 25.0).exp() + 50.0;
        let amp = (-t * 10.0).exp();
        let click = if t < 0.005 {
            (2.0 * PI * 2000.0 * t).sin() * (1.0 - t / 0.005)
        } else {
            0.0
        };
        (2.0 * PI * pitch * t).sin() * amp * 0.8 + click * 0.2
    }

    /// Tonal drum body under a wider noise burst (the wires).
    fn snare(&mut self) -> f32 {
        let t = self.time();
        let body = (2.0 * PI * 200.0 * t).sin() * (-t * 30.0).exp();
        let wires = self.noise.next_sample() * (-t * 15.0).exp();
        body * 0.3 + wires * 0.7
    }

    /// High-passed noise with a hard decay.
    fn hihat(&mut self) -> f32 {
        let t = self.time();
        let amp = (-t * 50.0).exp();
        let noise = self.noise.next_sample();
        self.hp_state = 0.8 * (self.hp_state + noise - self.last_noise);
        self.last_noise = noise;
        self.hp_state * amp * 0.5
    }

    fn blip(&self, strong: bool) -> f32 {
        let t = self.time();
        let freq = if strong { 1500.0 } else { 1000.0 };
        (2.0 * PI * freq * t).sin() * (-t * 60.0).exp()
    }
}
