//! Turns recognized sheet music into playable pieces.
//!
//! A stream of measures, possibly spanning many scanned pages, is split into
//! compositions at `final` and `double` barlines. Each composition is then
//! lowered into a truth record: a flat, timestamp-ordered list of note
//! on/off events plus the engine parameters a synthesizer needs to replay it.

pub mod collaborators;
pub mod colors;
pub mod error;
pub mod lowering;
pub mod metadata;
pub mod midi_generation;
pub mod params;
pub mod pipeline;
pub mod score;
pub mod segmenting;
pub mod status;
pub mod truth;

pub use crate::error::Error;
pub use crate::midi_generation::data::MidiGenerationOptions;
pub use crate::pipeline::{Pipeline, PipelineOptions, WrittenComposition};
pub use crate::segmenting::{segment, Composition, Segmenter};
pub use crate::truth::{synthesize, RecordingTruth, SynthesisOptions};

use crate::score::data::Score;

/// Segments `scores`, in order, and synthesizes a truth record for every
/// composition found.
pub fn convert_scores<I>(scores: I, options: &SynthesisOptions) -> Vec<(Composition, RecordingTruth)>
where
    I: IntoIterator<Item = Score>,
{
    segment(scores.into_iter().flat_map(Score::into_measures))
        .into_iter()
        .map(|composition| {
            let truth = synthesize(&composition, options);
            (composition, truth)
        })
        .collect()
}
