pub mod data;

use self::data::*;

use crate::segmenting::Composition;

/// Flattens a composition into note on/off events ordered by timestamp.
///
/// Every pitch of every note or chord gets a `NoteOn` at its onset and a
/// `NoteOff` at onset + duration. The sort is stable and keyed on the
/// timestamp alone, so coincident events keep the order they were emitted in.
pub fn lower(composition: &Composition, options: &LoweringOptions) -> Vec<TimedEvent> {
    let mut events = Vec::new();

    for placed in composition.elements() {
        let onset = placed.offset;
        let release = onset + placed.element.duration;

        for pitch in placed.element.pitches() {
            let note = pitch.midi();
            events.push((
                onset,
                PerformanceEvent::NoteOn {
                    note,
                    velocity: options.velocity,
                    channel: options.channel,
                },
            ));
            events.push((
                release,
                PerformanceEvent::NoteOff {
                    note,
                    channel: options.channel,
                },
            ));
        }
    }

    events.sort_by(|a, b| a.0.total_cmp(&b.0));
    events
}
