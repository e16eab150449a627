//! Small DSP building blocks shared by the synthesis chains: a phase
//! oscillator, an xorshift noise source, a resonant low-pass, and the
//! output-bus limiter.

use std::f32::consts::PI;

/// Basic waveforms for the oscillator stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
    Triangle,
}

/// Phase-accumulating oscillator.
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
    sample_rate: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Retune without resetting phase (used by vibrato).
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    pub fn next_sample(&mut self) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Saw => 2.0 * self.phase - 1.0,
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        };

        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }
}

/// Xorshift white-noise source; audio range [-1, 1).
pub struct Noise {
    state: u32,
}

impl Noise {
    pub fn new(seed: u32) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_sample(&mut self) -> f32 {
        (self.next_u32() as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// Two-pole resonant low-pass (RBJ cookbook biquad).
pub struct ResonantLowPass {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl ResonantLowPass {
    pub fn new(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let cutoff = cutoff_hz.clamp(10.0, sample_rate * 0.45);
        let q = q.max(0.1);
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 - cos_w0) / 2.0) / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: ((1.0 - cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// Soft output limiter for the shared bus. Linear below the threshold,
/// tanh-shaped above it, so stacked voices saturate instead of clipping.
pub struct Limiter {
    threshold: f32,
}

impl Limiter {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.1, 1.0),
        }
    }

    pub fn process(&self, x: f32) -> f32 {
        let t = self.threshold;
        if x.abs() <= t {
            x
        } else {
            x.signum() * (t + (1.0 - t) * ((x.abs() - t) / (1.0 - t)).tanh())
        }
    }
}

impl Default for Limiter {
    fn default() -> Self {
        // Roughly the -8 dBFS knee the mix bus was tuned around
        Self::new(0.4)
    }
}
