use super::data::*;

const EPSILON: f64 = 1e-6;

/// Serializes measures as a single-part `score-partwise` MusicXML document.
pub fn write_musicxml(title: &str, measures: &[Measure]) -> String {
    let mut writer = XmlWriter::default();

    writer.line(r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#);
    writer.line(
        r#"<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 3.1 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">"#,
    );
    writer.open(r#"score-partwise version="3.1""#);

    writer.open("work");
    writer.leaf("work-title", &xml_escape(title));
    writer.close("work");

    writer.open("part-list");
    writer.open(r#"score-part id="P1""#);
    writer.leaf("part-name", "Music");
    writer.close("score-part");
    writer.close("part-list");

    writer.open(r#"part id="P1""#);
    let mut divisions = None;
    for (index, measure) in measures.iter().enumerate() {
        let measure_divisions = divisions_for(measure);
        let divisions_changed = divisions != Some(measure_divisions);
        divisions = Some(measure_divisions);

        writer.open(&format!(r#"measure number="{}""#, index + 1));
        write_attributes(&mut writer, measure, divisions_changed.then(|| measure_divisions));
        if let Some(tempo) = measure.tempo {
            write_tempo(&mut writer, tempo);
        }
        write_voices(&mut writer, measure, measure_divisions);
        if let Some(barline) = measure.barline {
            writer.open(r#"barline location="right""#);
            writer.leaf("bar-style", barline.bar_style());
            writer.close("barline");
        }
        writer.close("measure");
    }
    writer.close("part");
    writer.close("score-partwise");

    writer.out
}

#[derive(Default)]
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Opens `tag`, which may carry attributes.
    fn open(&mut self, tag: &str) {
        self.line(&format!("<{}>", tag));
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{}>", name));
    }

    fn leaf(&mut self, name: &str, text: &str) {
        self.line(&format!("<{0}>{1}</{0}>", name, text));
    }

    fn empty(&mut self, name: &str) {
        self.line(&format!("<{}/>", name));
    }
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn is_whole(value: f64) -> bool {
    (value - value.round()).abs() < EPSILON
}

/// Smallest multiple of the measure's own divisions that expresses every
/// offset and duration in whole ticks.
fn divisions_for(measure: &Measure) -> u32 {
    let base = measure.divisions.max(1);
    let fits = |divisions: u32| {
        let divisions = f64::from(divisions);
        measure
            .elements
            .iter()
            .all(|e| is_whole(e.offset * divisions) && is_whole(e.duration * divisions))
    };

    (1..=16)
        .map(|factor| base * factor)
        .find(|&divisions| fits(divisions))
        .unwrap_or(base * 16)
}

fn ticks(quarters: f64, divisions: u32) -> i64 {
    (quarters * f64::from(divisions)).round() as i64
}

fn write_attributes(writer: &mut XmlWriter, measure: &Measure, divisions: Option<u32>) {
    if divisions.is_none() && measure.key.is_none() && measure.time.is_none() {
        return;
    }

    writer.open("attributes");
    if let Some(divisions) = divisions {
        writer.leaf("divisions", &divisions.to_string());
    }
    if let Some(key) = measure.key {
        writer.open("key");
        writer.leaf("fifths", &key.fifths.to_string());
        match key.mode {
            Some(Mode::Major) => writer.leaf("mode", "major"),
            Some(Mode::Minor) => writer.leaf("mode", "minor"),
            None => {}
        }
        writer.close("key");
    }
    if let Some(time) = measure.time {
        writer.open("time");
        writer.leaf("beats", &time.beats.to_string());
        writer.leaf("beat-type", &time.beat_type.to_string());
        writer.close("time");
    }
    writer.close("attributes");
}

fn write_tempo(writer: &mut XmlWriter, tempo: f64) {
    writer.open(r#"direction placement="above""#);
    writer.open("direction-type");
    writer.open("metronome");
    writer.leaf("beat-unit", "quarter");
    writer.leaf("per-minute", &tempo.to_string());
    writer.close("metronome");
    writer.close("direction-type");
    writer.empty(&format!(r#"sound tempo="{}""#, tempo));
    writer.close("direction");
}

fn write_voices(writer: &mut XmlWriter, measure: &Measure, divisions: u32) {
    let mut voices: Vec<u8> = Vec::new();
    for element in &measure.elements {
        if !voices.contains(&element.voice) {
            voices.push(element.voice);
        }
    }

    let mut cursor = 0;
    for (index, &voice) in voices.iter().enumerate() {
        if index > 0 && cursor > 0 {
            writer.open("backup");
            writer.leaf("duration", &cursor.to_string());
            writer.close("backup");
            cursor = 0;
        }

        for element in measure.elements.iter().filter(|e| e.voice == voice) {
            let onset = ticks(element.offset, divisions);
            if onset > cursor {
                writer.open("forward");
                writer.leaf("duration", &(onset - cursor).to_string());
                writer.close("forward");
            } else if onset < cursor {
                writer.open("backup");
                writer.leaf("duration", &(cursor - onset).to_string());
                writer.close("backup");
            }

            let duration = ticks(element.duration, divisions);
            write_element(writer, element, duration);
            cursor = onset + duration;
        }
    }
}

fn write_element(writer: &mut XmlWriter, element: &Element, duration: i64) {
    let note_type = note_type(element.duration);
    let grace = element.is_note_bearing() && duration == 0;

    let mut write_note = |pitch: Option<&Pitch>, in_chord: bool| {
        writer.open("note");
        if grace {
            writer.empty("grace");
        }
        if in_chord {
            writer.empty("chord");
        }
        match pitch {
            Some(pitch) => {
                writer.open("pitch");
                writer.leaf("step", pitch.step().as_str());
                if pitch.alter() != 0 {
                    writer.leaf("alter", &pitch.alter().to_string());
                }
                writer.leaf("octave", &pitch.octave().to_string());
                writer.close("pitch");
            }
            None => writer.empty("rest"),
        }
        if !grace {
            writer.leaf("duration", &duration.to_string());
        }
        writer.leaf("voice", &element.voice.to_string());
        if let Some((name, dotted)) = note_type {
            writer.leaf("type", name);
            if dotted {
                writer.empty("dot");
            }
        }
        writer.close("note");
    };

    match element.kind {
        ElementKind::Rest => write_note(None, false),
        _ => {
            for (index, pitch) in element.pitches().iter().enumerate() {
                write_note(Some(pitch), index > 0);
            }
        }
    }
}

fn note_type(duration: f64) -> Option<(&'static str, bool)> {
    const TYPES: [(f64, &str, bool); 12] = [
        (6.0, "whole", true),
        (4.0, "whole", false),
        (3.0, "half", true),
        (2.0, "half", false),
        (1.5, "quarter", true),
        (1.0, "quarter", false),
        (0.75, "eighth", true),
        (0.5, "eighth", false),
        (0.375, "16th", true),
        (0.25, "16th", false),
        (0.1875, "32nd", true),
        (0.125, "32nd", false),
    ];

    TYPES
        .iter()
        .find(|(length, _, _)| (length - duration).abs() < EPSILON)
        .map(|&(_, name, dotted)| (name, dotted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::reader::parse_score;
    use pretty_assertions::assert_eq;

    fn pitch(step: Step, alter: i8, octave: i8) -> Pitch {
        Pitch::new(step, alter, octave).unwrap()
    }

    fn two_voice_measure() -> Measure {
        Measure {
            divisions: 2,
            length: 4.0,
            tempo: Some(90.0),
            key: Some(KeySignature {
                fifths: 2,
                mode: Some(Mode::Major),
            }),
            time: Some(TimeSignature::default()),
            barline: Some(BarlineKind::Final),
            elements: vec![
                Element::note(0.0, 1.5, pitch(Step::F, 1, 5)),
                Element::note(1.5, 0.5, pitch(Step::E, 0, 5)),
                Element::rest(2.0, 2.0),
                Element {
                    voice: 2,
                    ..Element::chord(1.0, 3.0, vec![pitch(Step::D, 0, 3), pitch(Step::A, 0, 3)])
                },
            ],
            ..Measure::default()
        }
    }

    #[test]
    fn written_measures_read_back_unchanged() {
        let original = two_voice_measure();
        let xml = write_musicxml("carol_001", &[original.clone()]);
        let score = parse_score(&xml, None).unwrap();

        assert_eq!(score.title.as_deref(), Some("carol_001"));
        let measures: Vec<Measure> = score.into_measures().collect();
        assert_eq!(measures.len(), 1);

        let read = &measures[0];
        assert_eq!(read.elements, original.elements);
        assert_eq!(read.tempo, original.tempo);
        assert_eq!(read.key, original.key);
        assert_eq!(read.time, original.time);
        assert_eq!(read.barline, original.barline);
        assert_eq!(read.length, 4.0);
    }

    #[test]
    fn grace_notes_are_written_without_duration() {
        let measure = Measure {
            elements: vec![
                Element::note(0.0, 0.0, pitch(Step::B, 0, 3)),
                Element::note(0.0, 1.0, pitch(Step::C, 0, 4)),
            ],
            ..Measure::default()
        };
        let xml = write_musicxml("piece", &[measure.clone()]);

        assert_eq!(xml.matches("<grace/>").count(), 1);
        assert_eq!(xml.matches("<duration>").count(), 1);

        let read: Vec<Measure> = parse_score(&xml, None).unwrap().into_measures().collect();
        assert_eq!(read[0].elements, measure.elements);
    }

    #[test]
    fn measures_are_renumbered() {
        let measures = vec![
            Measure {
                number: String::from("17"),
                ..Measure::default()
            },
            Measure {
                number: String::from("18"),
                ..Measure::default()
            },
        ];
        let xml = write_musicxml("piece", &measures);

        assert!(xml.contains(r#"<measure number="1">"#));
        assert!(xml.contains(r#"<measure number="2">"#));
        assert!(!xml.contains(r#"number="17""#));
    }

    #[test]
    fn divisions_grow_to_fit_triplets() {
        let measure = Measure {
            divisions: 1,
            elements: vec![
                Element::note(0.0, 1.0 / 3.0, pitch(Step::C, 0, 4)),
                Element::note(1.0 / 3.0, 1.0 / 3.0, pitch(Step::D, 0, 4)),
                Element::note(2.0 / 3.0, 1.0 / 3.0, pitch(Step::E, 0, 4)),
            ],
            ..Measure::default()
        };

        assert_eq!(divisions_for(&measure), 3);
    }

    #[test]
    fn titles_are_escaped() {
        let xml = write_musicxml("Rock & <Roll>", &[]);
        assert!(xml.contains("<work-title>Rock &amp; &lt;Roll&gt;</work-title>"));
    }
}
