use serde::{Deserialize, Serialize};

/// A performance instant. Serialized with the variant name as the key,
/// e.g. `{"NoteOn": {"note": 60, "velocity": 90, "channel": 0}}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceEvent {
    NoteOn { note: u8, velocity: u8, channel: u8 },
    NoteOff { note: u8, channel: u8 },
}

impl PerformanceEvent {
    pub fn note(&self) -> u8 {
        match *self {
            PerformanceEvent::NoteOn { note, .. } | PerformanceEvent::NoteOff { note, .. } => note,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            PerformanceEvent::NoteOn { channel, .. }
            | PerformanceEvent::NoteOff { channel, .. } => channel,
        }
    }
}

/// An event and its timestamp in quarter-note steps from the start of the
/// composition. Serialized as a two-element array.
pub type TimedEvent = (f64, PerformanceEvent);

#[derive(Debug, Clone)]
pub struct LoweringOptions {
    pub velocity: u8,
    pub channel: u8,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        LoweringOptions {
            velocity: 90,
            channel: 0,
        }
    }
}
