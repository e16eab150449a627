//! # Songsmith
//!
//! Songsmith turns a handful of song parameters (genre, key, mode, tempo,
//! optional lyrics) into a structured multi-part score and renders it in
//! real time through per-note synthesis graphs under a hard polyphony
//! cap.
//!
//! The composition engine lives in the `songsmith-core` crate: music
//! theory, lyric analysis, part generators, the score document, and JSON
//! and MIDI export. This crate is the runtime around it.
//!
//! ## Modules
//!
//! - `audio`: the real-time half - cpal output engine and mixer, master
//!   clock, the conductor (lookahead scheduler and loop drivers), the
//!   voice registry with its exactly-once teardown, instrument synthesis
//!   graphs, and one-shot drum synthesis.
//! - `commands`: the REPL command registry (song setup, playback, mixer,
//!   export).
//! - `repl`: the interactive rustyline front-end.

pub mod audio;
pub mod commands;
pub mod repl;

// Re-export commonly used types for convenience
pub use crate::audio::{AudioEngine, Conductor, MasterClock, MixerState, VoiceRegistry};
pub use songsmith_core::{Composition, Genre, Mode, SongParams};
