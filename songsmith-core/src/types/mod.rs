pub mod chord;
pub mod event;
pub mod note;
pub mod time;

pub use chord::{Chord, Degree, Quality};
pub use event::{
    DrumHit, DrumSound, DrumTrack, GuitarEvent, Hand, MelodyNote, NoteEvent, PartId, PianoEvent,
    ScoreEvent, ScoreEventKind,
};
pub use note::Note;
pub use time::Beats;
