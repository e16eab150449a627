pub mod bass;
pub mod drums;
pub mod guitar;
pub mod harmony;
pub mod melody;
pub mod piano;
pub mod progression;
pub mod structure;

pub use progression::ChordProgression;
