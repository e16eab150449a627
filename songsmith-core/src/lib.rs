//! # Songsmith core
//!
//! The composition half of Songsmith: pure, deterministic code that turns
//! a small set of song parameters (genre, key, mode, tempo, optional
//! lyrics) into a structured multi-part score, and serializes that score
//! as a JSON document or a Standard MIDI File.
//!
//! Nothing in this crate touches an audio device, a clock, or a thread;
//! the real-time half (voice scheduling and synthesis) lives in the
//! `songsmith` package and consumes the score produced here.
//!
//! ## Modules
//!
//! - `types`: notes, chords, rational beat time, and score event shapes.
//! - `theory`: scale modes and the voice-leading search.
//! - `lyrics`: syllable counting and rhyme-scheme detection (heuristic).
//! - `genre`: per-genre templates, rhythm catalogs, and drum grids.
//! - `generate`: the part generators and the song-structure assembler.
//! - `composition`: the assembled score document and its flattening.
//! - `export`: JSON document round-trip and MIDI note-file export.

pub mod composition;
pub mod export;
pub mod generate;
pub mod genre;
pub mod lyrics;
pub mod rng;
pub mod theory;
pub mod types;

pub use composition::{Composition, Generation, Section, SongParams};
pub use generate::ChordProgression;
pub use genre::{Genre, GuitarStyle, SectionType};
pub use lyrics::LyricAnalysis;
pub use theory::Mode;
pub use types::{Beats, Chord, DrumSound, Note, PartId, ScoreEvent, ScoreEventKind};
