pub mod document;
pub mod midi;
