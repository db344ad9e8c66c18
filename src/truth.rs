use serde::{Deserialize, Serialize};

use crate::lowering::{self, data::*};
use crate::metadata::{self, DEFAULT_BPM};
use crate::params::MusicalParams;
use crate::segmenting::Composition;

/// Schema version of truth records made from recognized notation.
pub const TRUTH_VERSION: &str = "0.1.0-omr";
pub const UNKNOWN_GIT_SHA: &str = "unknown";
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// The canonical performance recording of one composition, as read by the
/// synthesis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingTruth {
    pub version: String,
    pub git_sha: String,
    pub params: MusicalParams,
    pub events: Vec<TimedEvent>,
    pub sample_rate: u32,
}

#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub sample_rate: u32,
    pub fallback_bpm: f64,
    pub lowering: LoweringOptions,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        SynthesisOptions {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fallback_bpm: DEFAULT_BPM,
            lowering: LoweringOptions::default(),
        }
    }
}

pub fn synthesize(composition: &Composition, options: &SynthesisOptions) -> RecordingTruth {
    let metadata = metadata::extract_metadata(composition, options.fallback_bpm);

    RecordingTruth {
        version: TRUTH_VERSION.to_owned(),
        git_sha: UNKNOWN_GIT_SHA.to_owned(),
        params: MusicalParams::with_tempo_and_key(metadata.bpm, metadata.key_root),
        events: lowering::lower(composition, &options.lowering),
        sample_rate: options.sample_rate,
    }
}

impl RecordingTruth {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// `NoteOn` events (by index) with no `NoteOff` for the same note and
    /// channel at or after them. Each `NoteOff` releases at most one
    /// earlier `NoteOn`.
    pub fn unmatched_note_ons(&self) -> Vec<usize> {
        let mut held: Vec<(u8, u8, usize)> = Vec::new();

        for (index, &(_, event)) in self.events.iter().enumerate() {
            match event {
                PerformanceEvent::NoteOn { note, channel, .. } => held.push((note, channel, index)),
                PerformanceEvent::NoteOff { note, channel } => {
                    if let Some(position) = held
                        .iter()
                        .position(|&(n, c, _)| n == note && c == channel)
                    {
                        held.remove(position);
                    }
                }
            }
        }

        held.into_iter().map(|(_, _, index)| index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OMR_DEFAULTS;
    use crate::score::data::*;
    use pretty_assertions::assert_eq;

    fn middle_c_at_100_in_c_major() -> Composition {
        Composition::new(vec![Measure {
            tempo: Some(100.0),
            key: Some(KeySignature {
                fifths: 0,
                mode: Some(Mode::Major),
            }),
            elements: vec![Element::note(0.0, 1.0, Pitch::from_midi(60))],
            ..Measure::default()
        }])
    }

    #[test]
    fn synthesizes_a_single_note() {
        let truth = synthesize(&middle_c_at_100_in_c_major(), &SynthesisOptions::default());

        assert_eq!(truth.version, "0.1.0-omr");
        assert_eq!(truth.git_sha, "unknown");
        assert_eq!(truth.sample_rate, 44_100);
        assert_eq!(truth.params.bpm, 100.0);
        assert_eq!(truth.params.key_root, 0);

        let json: serde_json::Value = serde_json::from_str(&truth.to_json().unwrap()).unwrap();
        assert_eq!(
            json["events"],
            serde_json::json!([
                [0.0, {"NoteOn": {"note": 60, "velocity": 90, "channel": 0}}],
                [1.0, {"NoteOff": {"note": 60, "channel": 0}}]
            ])
        );
    }

    #[test]
    fn falls_back_to_the_given_tempo() {
        let composition = Composition::new(vec![Measure {
            elements: vec![Element::note(0.0, 1.0, Pitch::from_midi(67))],
            ..Measure::default()
        }]);
        let options = SynthesisOptions {
            sample_rate: 48_000,
            fallback_bpm: 84.0,
            ..SynthesisOptions::default()
        };

        let truth = synthesize(&composition, &options);
        assert_eq!(truth.params.bpm, 84.0);
        assert_eq!(truth.params.key_root, 0);
        assert_eq!(truth.sample_rate, 48_000);
    }

    #[test]
    fn params_other_than_tempo_and_key_are_defaults() {
        let truth = synthesize(&middle_c_at_100_in_c_major(), &SynthesisOptions::default());
        assert_eq!(
            MusicalParams {
                bpm: OMR_DEFAULTS.bpm,
                ..truth.params
            },
            OMR_DEFAULTS
        );
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let third = 1.0 / 3.0;
        let composition = Composition::new(vec![Measure {
            tempo: Some(72.5),
            key: Some(KeySignature {
                fifths: 3,
                mode: Some(Mode::Minor),
            }),
            elements: vec![
                Element::chord(0.0, third, vec![Pitch::from_midi(54), Pitch::from_midi(57)]),
                Element::note(third, 2.0 * third, Pitch::from_midi(61)),
            ],
            ..Measure::default()
        }]);

        let truth = synthesize(&composition, &SynthesisOptions::default());
        let parsed = RecordingTruth::from_json(&truth.to_json().unwrap()).unwrap();

        assert_eq!(parsed, truth);
        assert_eq!(parsed.params.key_root, 6);
    }

    #[test]
    fn reads_the_engine_schema() {
        let mut params = serde_json::to_value(&OMR_DEFAULTS).unwrap();
        params["bpm"] = serde_json::json!(90.0);

        let json = serde_json::json!({
            "version": "0.1.0-omr",
            "git_sha": "unknown",
            "params": params,
            "events": [
                [0, {"NoteOn": {"note": 64, "velocity": 90, "channel": 0}}],
                [0.5, {"NoteOff": {"note": 64, "channel": 0}}]
            ],
            "sample_rate": 44100
        });

        let truth = RecordingTruth::from_json(&json.to_string()).unwrap();
        assert_eq!(truth.params.bpm, 90.0);
        assert_eq!(
            truth.events,
            vec![
                (
                    0.0,
                    PerformanceEvent::NoteOn {
                        note: 64,
                        velocity: 90,
                        channel: 0
                    }
                ),
                (0.5, PerformanceEvent::NoteOff { note: 64, channel: 0 }),
            ]
        );
    }

    #[test]
    fn finds_unreleased_notes() {
        let mut truth = synthesize(&middle_c_at_100_in_c_major(), &SynthesisOptions::default());
        assert!(truth.unmatched_note_ons().is_empty());

        truth.events.pop();
        truth.events.push((
            2.0,
            PerformanceEvent::NoteOff {
                note: 60,
                channel: 1,
            },
        ));
        assert_eq!(truth.unmatched_note_ons(), vec![0]);
    }
}
