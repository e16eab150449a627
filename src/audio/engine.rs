//! Output engine: mixer state and the cpal stream
//!
//! All live signal sources meet here: the voice registry, drum one-shots,
//! and metronome clicks, each routed through a per-part channel strip
//! (volume / mute / solo) into a master gain and the output limiter. The
//! audio callback only steps DSP state; registry membership changes stay
//! on the conductor's scheduling loop, which locks the same mixer.

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use songsmith_core::PartId;

use crate::audio::drums::DrumVoice;
use crate::audio::dsp::Limiter;
use crate::audio::registry::VoiceRegistry;

/// Per-part mixer settings. Solo overrides mute: when any strip is
/// soloed, only soloed strips sound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStrip {
    pub volume: f32,
    pub muted: bool,
    pub solo: bool,
}

impl Default for ChannelStrip {
    fn default() -> Self {
        Self {
            volume: 0.8,
            muted: false,
            solo: false,
        }
    }
}

fn strip_index(part: PartId) -> usize {
    match part {
        PartId::Melody => 0,
        PartId::Bass => 1,
        PartId::Guitar => 2,
        PartId::Piano => 3,
        PartId::Drums => 4,
    }
}

/// Everything the audio callback reads, behind one mutex.
pub struct MixerState {
    pub registry: VoiceRegistry,
    drums: Vec<DrumVoice>,
    clicks: Vec<DrumVoice>,
    strips: [ChannelStrip; 5],
    master: f32,
    limiter: Limiter,
}

impl MixerState {
    pub fn new() -> Self {
        Self {
            registry: VoiceRegistry::new(),
            drums: Vec::new(),
            clicks: Vec::new(),
            strips: [ChannelStrip::default(); 5],
            master: 0.5,
            limiter: Limiter::default(),
        }
    }

    pub fn strip(&self, part: PartId) -> ChannelStrip {
        self.strips[strip_index(part)]
    }

    pub fn set_volume(&mut self, part: PartId, volume: f32) {
        self.strips[strip_index(part)].volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, part: PartId, muted: bool) {
        self.strips[strip_index(part)].muted = muted;
    }

    pub fn set_solo(&mut self, part: PartId, solo: bool) {
        self.strips[strip_index(part)].solo = solo;
    }

    pub fn add_drum(&mut self, hit: DrumVoice) {
        self.drums.push(hit);
    }

    pub fn add_click(&mut self, click: DrumVoice) {
        self.clicks.push(click);
    }

    /// Effective gain of one part under the current strip settings.
    pub fn gain_for(&self, part: PartId) -> f32 {
        let any_solo = self.strips.iter().any(|s| s.solo);
        let strip = self.strips[strip_index(part)];
        if any_solo {
            if strip.solo { strip.volume } else { 0.0 }
        } else if strip.muted {
            0.0
        } else {
            strip.volume
        }
    }

    /// One mixed output sample: voices and drums through their strips,
    /// clicks straight to master, everything limited.
    pub fn next_sample(&mut self) -> f32 {
        let gains: [f32; 5] = [
            self.gain_for(PartId::Melody),
            self.gain_for(PartId::Bass),
            self.gain_for(PartId::Guitar),
            self.gain_for(PartId::Piano),
            self.gain_for(PartId::Drums),
        ];

        let mut sum = 0.0;
        for voice in self.registry.iter_mut() {
            sum += voice.next_sample() * gains[strip_index(voice.part())];
        }
        let drum_gain = gains[strip_index(PartId::Drums)];
        for hit in &mut self.drums {
            sum += hit.next_sample() * drum_gain;
        }
        for click in &mut self.clicks {
            sum += click.next_sample();
        }

        self.limiter.process(sum * self.master)
    }

    /// Drop finished voices and spent one-shots. Called from the
    /// scheduling loop, never from the audio callback.
    pub fn sweep(&mut self) {
        self.registry.sweep();
        self.drums.retain(|d| !d.is_finished());
        self.clicks.retain(|c| !c.is_finished());
    }

    /// Tear down all sound: release every voice and discard one-shots.
    pub fn stop_all(&mut self) {
        self.registry.release_all();
        self.drums.clear();
        self.clicks.clear();
    }

    #[cfg(test)]
    pub(crate) fn live_one_shots(&self) -> usize {
        self.drums.len() + self.clicks.len()
    }
}

impl Default for MixerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the cpal output stream. Creating one opens the default device and
/// starts pulling samples immediately; the stream is silent until the
/// conductor admits voices into the shared mixer.
pub struct AudioEngine {
    _stream: Stream,
    mixer: Arc<Mutex<MixerState>>,
    sample_rate: f32,
}

impl AudioEngine {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;
        let config = device.default_output_config()?;

        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        let sample_rate = config.sample_rate.0 as f32;

        let mixer = Arc::new(Mutex::new(MixerState::new()));
        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, mixer.clone())?,
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, mixer.clone())?,
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, mixer.clone())?,
            _ => return Err(anyhow!("Unsupported sample format: {:?}", sample_format)),
        };
        stream
            .play()
            .map_err(|e| anyhow!("Failed to start output stream: {}", e))?;

        Ok(Self {
            _stream: stream,
            mixer,
            sample_rate,
        })
    }

    pub fn mixer(&self) -> Arc<Mutex<MixerState>> {
        self.mixer.clone()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        mixer: Arc<Mutex<MixerState>>,
    ) -> Result<Stream>
    where
        T: Sample + SizedSample + Send + 'static + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let err_fn = |err| eprintln!("output stream error: {:?}", err);

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut mixer = match mixer.lock() {
                        Ok(guard) => guard,
                        Err(_) => {
                            data.fill(T::EQUILIBRIUM);
                            return;
                        }
                    };
                    for frame in data.chunks_mut(channels) {
                        let value: T = cpal::Sample::from_sample(mixer.next_sample());
                        for sample in frame.iter_mut() {
                            *sample = value;
                        }
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| anyhow!("Failed to build output stream: {}", e))?;

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::adsr::{Envelope, EnvelopeParams};
    use crate::audio::instrument::InstrumentProfile;
    use songsmith_core::DrumSound;

    const SAMPLE_RATE: f32 = 44100.0;

    fn admit_sine(mixer: &mut MixerState, part: PartId) {
        let profile = InstrumentProfile::Generic {
            layers: vec![crate::audio::instrument::OscLayer {
                waveform: crate::audio::dsp::Waveform::Sine,
                gain: 0.8,
                detune_cents: 0.0,
                freq_ratio: 1.0,
            }],
            cutoff: 4000.0,
            resonance: 0.7,
        };
        let chain = profile.build(440.0, 0.9, SAMPLE_RATE).unwrap();
        let envelope = Envelope::new(EnvelopeParams::plain(), SAMPLE_RATE);
        mixer.registry.admit(
            part,
            "fiddle",
            "A4".parse().unwrap(),
            0.9,
            0.0,
            chain,
            envelope,
        );
    }

    fn peak(mixer: &mut MixerState, samples: usize) -> f32 {
        (0..samples).fold(0.0f32, |p, _| p.max(mixer.next_sample().abs()))
    }

    #[test]
    fn test_empty_mixer_is_silent() {
        let mut mixer = MixerState::new();
        assert_eq!(peak(&mut mixer, 256), 0.0);
    }

    #[test]
    fn test_voice_sounds_through_its_strip() {
        let mut mixer = MixerState::new();
        admit_sine(&mut mixer, PartId::Melody);
        assert!(peak(&mut mixer, 4000) > 0.01);
    }

    #[test]
    fn test_mute_silences_a_part() {
        let mut mixer = MixerState::new();
        admit_sine(&mut mixer, PartId::Melody);
        mixer.set_muted(PartId::Melody, true);
        assert_eq!(peak(&mut mixer, 2000), 0.0);
    }

    #[test]
    fn test_solo_overrides_other_parts() {
        let mut mixer = MixerState::new();
        admit_sine(&mut mixer, PartId::Melody);
        admit_sine(&mut mixer, PartId::Bass);
        mixer.set_solo(PartId::Bass, true);
        // Melody contributes nothing while bass is soloed
        mixer.set_volume(PartId::Bass, 0.0);
        assert_eq!(peak(&mut mixer, 2000), 0.0);
    }

    #[test]
    fn test_drum_hits_route_through_drum_strip() {
        let mut mixer = MixerState::new();
        mixer.add_drum(DrumVoice::new(DrumSound::Snare, 0.8, SAMPLE_RATE));
        mixer.set_muted(PartId::Drums, true);
        assert_eq!(peak(&mut mixer, 1000), 0.0);
    }

    #[test]
    fn test_clicks_ignore_strips() {
        let mut mixer = MixerState::new();
        mixer.add_click(DrumVoice::click(true, SAMPLE_RATE));
        mixer.set_muted(PartId::Drums, true);
        assert!(peak(&mut mixer, 1000) > 0.0);
    }

    #[test]
    fn test_sweep_drops_spent_one_shots() {
        let mut mixer = MixerState::new();
        mixer.add_drum(DrumVoice::new(DrumSound::HiHat, 0.5, SAMPLE_RATE));
        mixer.add_click(DrumVoice::click(false, SAMPLE_RATE));
        // Hi-hat runs 80 ms, the click 40 ms
        for _ in 0..8000 {
            mixer.next_sample();
        }
        mixer.sweep();
        assert_eq!(mixer.live_one_shots(), 0);
    }

    #[test]
    fn test_stop_all_releases_everything() {
        let mut mixer = MixerState::new();
        admit_sine(&mut mixer, PartId::Guitar);
        mixer.add_drum(DrumVoice::new(DrumSound::Kick, 0.8, SAMPLE_RATE));
        mixer.stop_all();
        assert_eq!(mixer.live_one_shots(), 0);
        assert!(mixer
            .registry
            .iter()
            .all(|v| v.state() == crate::audio::voice::VoiceState::Released));
    }

    #[test]
    fn test_output_is_limited() {
        let mut mixer = MixerState::new();
        for _ in 0..64 {
            admit_sine(&mut mixer, PartId::Piano);
        }
        for _ in 0..8000 {
            assert!(mixer.next_sample().abs() <= 1.0);
        }
    }

    #[test]
    fn test_engine_creation() {
        // Expected to fail on machines without an audio device (CI)
        match AudioEngine::new() {
            Ok(engine) => assert!(engine.sample_rate() > 0.0),
            Err(_) => println!("Skipping engine test - no audio device available"),
        }
    }
}
