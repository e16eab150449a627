//! Per-voice amplitude envelopes
//!
//! Every pitched synthesis chain ends in one of these. The four parameters
//! are floor-clamped on construction so no stage ever asks for a
//! zero-duration ramp, and the exponential segments are precomputed as
//! per-sample coefficients.

/// Envelope stage, in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Attack/decay/release in seconds, sustain as a level. Construction
/// clamps each to a safe floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(0.001),
            decay: decay.max(0.01),
            sustain: sustain.clamp(0.1, 1.0),
            release: release.max(0.05),
        }
    }

    /// Sharp front, quick fade; plucked and picked strings.
    pub fn pluck() -> Self {
        Self::new(0.003, 0.25, 0.35, 0.7)
    }

    /// Slow bloom and long tail; bowed strings.
    pub fn bowed() -> Self {
        Self::new(0.08, 0.15, 0.75, 0.5)
    }

    /// Hammer strike with a singing sustain; struck strings and keys.
    pub fn keys() -> Self {
        Self::new(0.002, 0.3, 0.4, 0.6)
    }

    /// All-purpose shape for the generic oscillator fallback.
    pub fn plain() -> Self {
        Self::new(0.01, 0.1, 0.7, 0.2)
    }

    /// Wall-clock seconds a note will sound when held for
    /// `sustain_seconds`: attack + decay + hold + release.
    pub fn natural_length(&self, sustain_seconds: f32) -> f32 {
        self.attack + self.decay + sustain_seconds.max(0.0) + self.release
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::plain()
    }
}

/// Sample-rate-aware envelope state.
#[derive(Clone)]
pub struct Envelope {
    params: EnvelopeParams,
    stage: Stage,
    level: f32,
    attack_coeff: f32,
    decay_coeff: f32,
    release_coeff: f32,
}

/// Convergence constant: exp(-6.9) ~ 0.001, i.e. each segment covers 99.9%
/// of its distance within the configured time.
const CURVE: f32 = 6.9;

fn coefficient(seconds: f32, sample_rate: f32) -> f32 {
    1.0 - (-CURVE / (seconds * sample_rate)).exp()
}

impl Envelope {
    pub fn new(params: EnvelopeParams, sample_rate: f32) -> Self {
        Self {
            params,
            stage: Stage::Idle,
            level: 0.0,
            attack_coeff: coefficient(params.attack, sample_rate),
            decay_coeff: coefficient(params.decay, sample_rate),
            release_coeff: coefficient(params.release, sample_rate),
        }
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Begin the attack. Level is not reset, so retriggering a releasing
    /// envelope stays click-free.
    pub fn trigger(&mut self) {
        self.stage = Stage::Attack;
    }

    /// Enter the release stage. Idempotent: releasing an already-releasing
    /// or idle envelope changes nothing.
    pub fn release(&mut self) {
        if self.stage != Stage::Idle {
            self.stage = Stage::Release;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Idle || (self.stage == Stage::Release && self.level < 1e-4)
    }

    /// Next amplitude sample in [0, 1].
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                self.level += (1.0 - self.level) * self.attack_coeff;
                if self.level >= 0.999 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                let target = self.params.sustain;
                self.level += (target - self.level) * self.decay_coeff;
                if (self.level - target).abs() < 1e-3 {
                    self.level = target;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {
                self.level = self.params.sustain;
            }
            Stage::Release => {
                self.level -= self.level * self.release_coeff;
                if self.level < 1e-4 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn test_params_are_floor_clamped() {
        let p = EnvelopeParams::new(0.0, 0.0, 0.0, 0.0);
        assert!(p.attack > 0.0);
        assert!(p.decay > 0.0);
        assert!(p.sustain > 0.0);
        assert!(p.release > 0.0);
    }

    #[test]
    fn test_natural_length() {
        let p = EnvelopeParams::new(0.01, 0.1, 0.7, 0.2);
        let length = p.natural_length(1.0);
        assert!((length - 1.31).abs() < 1e-6);
    }

    #[test]
    fn test_attack_rises_then_decays() {
        let mut env = Envelope::new(EnvelopeParams::new(0.01, 0.05, 0.5, 0.1), SAMPLE_RATE);
        env.trigger();
        let mut peak = 0.0f32;
        for _ in 0..4000 {
            peak = peak.max(env.next_sample());
        }
        assert!(peak >= 0.999);
        assert!(matches!(env.stage(), Stage::Decay | Stage::Sustain));
    }

    #[test]
    fn test_sustain_holds_until_release() {
        let mut env = Envelope::new(EnvelopeParams::new(0.001, 0.01, 0.6, 0.05), SAMPLE_RATE);
        env.trigger();
        for _ in 0..20000 {
            env.next_sample();
        }
        assert_eq!(env.stage(), Stage::Sustain);
        assert!((env.next_sample() - 0.6).abs() < 0.01);
        assert!(!env.is_finished());
    }

    #[test]
    fn test_release_fades_to_silence() {
        let mut env = Envelope::new(EnvelopeParams::new(0.001, 0.01, 0.6, 0.05), SAMPLE_RATE);
        env.trigger();
        for _ in 0..10000 {
            env.next_sample();
        }
        env.release();
        for _ in 0..20000 {
            env.next_sample();
        }
        assert!(env.is_finished());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut env = Envelope::new(EnvelopeParams::default(), SAMPLE_RATE);
        env.trigger();
        for _ in 0..1000 {
            env.next_sample();
        }
        env.release();
        let level = env.next_sample();
        env.release();
        let again = env.next_sample();
        assert!(again <= level);
        assert_eq!(env.stage(), Stage::Release);
    }

    #[test]
    fn test_output_stays_in_unit_range() {
        let mut env = Envelope::new(EnvelopeParams::pluck(), SAMPLE_RATE);
        env.trigger();
        for i in 0..30000 {
            if i == 15000 {
                env.release();
            }
            let s = env.next_sample();
            assert!((0.0..=1.0).contains(&s));
        }
    }
}
