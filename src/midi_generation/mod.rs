pub mod data;

use std::collections::{HashMap, VecDeque};

use self::data::*;

use crate::lowering::data::PerformanceEvent;
use crate::truth::RecordingTruth;

/// Renders a truth record as a two-track Standard MIDI File: a conductor
/// track with tempo and key, and one track holding the note events.
pub fn generate_midi(truth: &RecordingTruth, options: &MidiGenerationOptions) -> Option<Vec<u8>> {
    use rimd::*;

    let smf = {
        const MICROSECONDS_PER_MIN: f64 = 60_000_000.0;

        let bpm = if truth.params.bpm > 0.0 {
            f64::from(truth.params.bpm)
        } else {
            f64::from(crate::params::OMR_DEFAULTS.bpm)
        };
        let tempo = (MICROSECONDS_PER_MIN / bpm).round() as u32;

        let track0 = Track {
            copyright: None,
            name: None,
            events: vec![
                TrackEvent {
                    vtime: 0,
                    event: Event::Meta(MetaEvent::text_event("conductor track".into())),
                },
                TrackEvent {
                    vtime: 0,
                    event: Event::Meta(MetaEvent::tempo_setting(tempo)),
                },
                TrackEvent {
                    vtime: 0,
                    event: Event::Meta(MetaEvent::key_signature(
                        major_key_fifths(truth.params.key_root) as u8,
                        0,
                    )),
                },
                TrackEvent {
                    vtime: 0,
                    event: Event::Meta(MetaEvent::time_signature(4, 2, 24, 8)),
                },
            ],
        };

        let ticks_per_beat = f64::from(options.ticks_per_beat.max(1));

        let split_notes = {
            let mut split_notes = Vec::new();
            // Onset ticks of sounding notes, per (note, channel), oldest first.
            let mut held: HashMap<(u8, u8), VecDeque<u64>> = HashMap::new();

            for &(timestamp, event) in &truth.events {
                let ticks = (timestamp.max(0.0) * ticks_per_beat).round() as u64;
                match event {
                    PerformanceEvent::NoteOn {
                        note,
                        velocity,
                        channel,
                    } => {
                        held.entry((note, channel)).or_default().push_back(ticks);
                        split_notes.push((true, note, ticks, velocity, channel))
                    }
                    // Released one tick early so a repeated note does not
                    // overlap its own release, but never before its onset.
                    PerformanceEvent::NoteOff { note, channel } => {
                        let onset = held
                            .get_mut(&(note, channel))
                            .and_then(VecDeque::pop_front)
                            .unwrap_or(0);
                        let release = ticks.saturating_sub(1).max(onset);
                        split_notes.push((false, note, release, 0, channel))
                    }
                }
            }

            // Sort by start time
            split_notes.sort_by_key(|note| note.2);

            split_notes
        };

        let mut events = vec![TrackEvent {
            vtime: 0,
            event: Event::Meta(MetaEvent::text_event("note track".into())),
        }];

        let mut cursor = 0;
        for note in split_notes {
            let (on, midi_note, pos_ticks, vel, channel) = note;
            let vtime = pos_ticks - cursor;
            let message = {
                if on {
                    MidiMessage::note_on(midi_note, vel, channel)
                } else {
                    MidiMessage::note_off(midi_note, vel, channel)
                }
            };

            events.push(TrackEvent {
                vtime,
                event: Event::Midi(message),
            });

            cursor = pos_ticks;
        }

        SMF {
            format: SMFFormat::MultiTrack,
            division: options.ticks_per_beat,
            tracks: vec![
                track0,
                Track {
                    copyright: None,
                    name: None,
                    events,
                },
            ],
        }
    };

    let writer = SMFWriter::from_smf(smf);

    let buffer = {
        let mut buffer = Vec::new();
        writer.write_all(&mut buffer).ok()?;
        buffer
    };

    Some(buffer)
}

/// Signed fifths count of the major key on `key_root`, between -5 and 6.
fn major_key_fifths(key_root: u8) -> i8 {
    let fifths = (i32::from(key_root % 12) * 7) % 12;
    if fifths > 6 {
        (fifths - 12) as i8
    } else {
        fifths as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::data::*;
    use crate::segmenting::Composition;
    use crate::truth::{synthesize, SynthesisOptions};
    use pretty_assertions::assert_eq;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn writes_conductor_and_note_tracks() {
        let composition = Composition::new(vec![Measure {
            tempo: Some(100.0),
            elements: vec![
                Element::note(0.0, 1.0, Pitch::from_midi(60)),
                Element::note(1.0, 1.0, Pitch::from_midi(60)),
            ],
            ..Measure::default()
        }]);
        let truth = synthesize(&composition, &SynthesisOptions::default());

        let midi = generate_midi(&truth, &MidiGenerationOptions::default()).unwrap();

        assert_eq!(&midi[0..4], b"MThd");
        assert_eq!(count(&midi, b"MTrk"), 2);
        // 600000 microseconds per quarter at 100 bpm.
        assert_eq!(count(&midi, &[0xFF, 0x51, 0x03, 0x09, 0x27, 0xC0]), 1);
    }

    #[test]
    fn zero_length_notes_are_released_after_their_onset() {
        let composition = Composition::new(vec![Measure {
            elements: vec![
                Element::note(0.0, 1.0, Pitch::from_midi(62)),
                Element::note(1.0, 0.0, Pitch::from_midi(60)),
            ],
            ..Measure::default()
        }]);
        let truth = synthesize(&composition, &SynthesisOptions::default());

        let midi = generate_midi(&truth, &MidiGenerationOptions::default()).unwrap();
        let position = |bytes: &[u8]| {
            midi.windows(bytes.len())
                .position(|w| w == bytes)
                .unwrap()
        };

        assert!(position(&[0x90, 60, 90]) < position(&[0x80, 60, 0]));
        // D4 still ends one tick before the beat.
        assert!(position(&[0x80, 62, 0]) < position(&[0x90, 60, 90]));
    }

    #[test]
    fn key_roots_map_to_signed_fifths() {
        assert_eq!(major_key_fifths(0), 0);
        assert_eq!(major_key_fifths(7), 1);
        assert_eq!(major_key_fifths(2), 2);
        assert_eq!(major_key_fifths(5), -1);
        assert_eq!(major_key_fifths(10), -2);
        assert_eq!(major_key_fifths(6), 6);
    }
}
