//! Real-time audio runtime
//!
//! The playback half of Songsmith: a cpal output stream fed by a shared
//! mixer, a 24-PPQN master clock, and the conductor thread that turns a
//! flattened score into voices under the polyphony cap.

pub mod adsr;
pub mod clock;
pub mod conductor;
pub mod drums;
pub mod dsp;
pub mod engine;
pub mod instrument;
pub mod library;
pub mod registry;
pub mod voice;

pub use clock::MasterClock;
pub use conductor::Conductor;
pub use engine::{AudioEngine, MixerState};
pub use registry::{POLYPHONY_CAP, VoiceRegistry};
