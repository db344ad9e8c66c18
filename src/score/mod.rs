//! Notation adapter: reads recognized MusicXML into measures of notes,
//! chords and rests, and writes measures back out as MusicXML.

pub mod data;
pub mod error;
mod reader;
mod writer;

pub use self::reader::{parse_score, read_score};
pub use self::writer::write_musicxml;
