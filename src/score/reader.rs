use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node, ParsingOptions};

use super::data::*;
use super::error::{ErrorType, ScoreError};

pub fn read_score(path: &Path) -> Result<Score, ScoreError> {
    let source = std::fs::read_to_string(path)
        .map_err(|err| ScoreError::new(Some(path), ErrorType::Io(err)))?;

    parse_score(&source, Some(path))
}

pub fn parse_score(source: &str, path: Option<&Path>) -> Result<Score, ScoreError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(source, options)
        .map_err(|err| ScoreError::new(path, ErrorType::Xml(err)))?;

    let root = document.root_element();
    if !root.has_tag_name("score-partwise") {
        return Err(ScoreError::new(
            path,
            ErrorType::NotPartwise {
                root: root.tag_name().name().to_owned(),
            },
        ));
    }

    let title = child(root, "work")
        .and_then(|work| child_text(work, "work-title"))
        .or_else(|| child_text(root, "movement-title"))
        .map(str::to_owned);

    let part_names: HashMap<&str, &str> = child(root, "part-list")
        .into_iter()
        .flat_map(|list| list.children().filter(|n| n.has_tag_name("score-part")))
        .filter_map(|part| Some((part.attribute("id")?, child_text(part, "part-name")?)))
        .collect();

    let mut parts = Vec::new();
    for part_node in root.children().filter(|n| n.has_tag_name("part")) {
        let id = part_node.attribute("id").unwrap_or_default().to_owned();
        let mut reader = PartReader::new(path);

        let mut measures = Vec::new();
        for measure_node in part_node.children().filter(|n| n.has_tag_name("measure")) {
            measures.push(reader.read_measure(measure_node)?);
        }

        parts.push(Part {
            name: part_names.get(id.as_str()).map(|name| (*name).to_owned()),
            id,
            measures,
        });
    }

    Ok(Score {
        source: path.map(Path::to_owned),
        title,
        parts,
    })
}

/// Position of the note reader inside one measure.
#[derive(Default)]
struct Cursor {
    position: f64,
    /// Onset of the last non-chord note; `<chord/>` notes start here.
    chord_onset: f64,
    /// Whether the last element pushed can take `<chord/>` pitches.
    chord_open: bool,
}

impl Cursor {
    fn jump(&mut self, position: f64) {
        self.position = position;
        self.chord_open = false;
    }
}

/// Attributes that carry over from one measure of a part to the next.
struct PartReader<'p> {
    path: Option<&'p Path>,
    divisions: u32,
    time: TimeSignature,
}

impl<'p> PartReader<'p> {
    fn new(path: Option<&'p Path>) -> Self {
        PartReader {
            path,
            divisions: 1,
            time: TimeSignature::default(),
        }
    }

    fn error(&self, error: ErrorType) -> ScoreError {
        ScoreError::new(self.path, error)
    }

    fn number<T: FromStr>(&self, element: &'static str, text: &str) -> Result<T, ScoreError> {
        text.trim().parse().map_err(|_| {
            self.error(ErrorType::InvalidNumber {
                element,
                text: text.to_owned(),
            })
        })
    }

    fn read_measure(&mut self, node: Node) -> Result<Measure, ScoreError> {
        let mut measure = Measure {
            number: node.attribute("number").unwrap_or_default().to_owned(),
            ..Measure::default()
        };

        let mut cursor = Cursor::default();
        let mut furthest: f64 = 0.0;

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "attributes" => self.read_attributes(child, &mut measure)?,
                "direction" => {
                    if measure.tempo.is_none() {
                        measure.tempo = direction_tempo(child);
                    }
                }
                "sound" => {
                    if measure.tempo.is_none() {
                        measure.tempo = sound_tempo(child);
                    }
                }
                "backup" => {
                    let back = self.duration_of(child)?;
                    cursor.jump((cursor.position - back).max(0.0));
                }
                "forward" => {
                    let ahead = self.duration_of(child)?;
                    cursor.jump(cursor.position + ahead);
                }
                "note" => self.read_note(child, &mut measure, &mut cursor)?,
                "barline" => {
                    if child.attribute("location").unwrap_or("right") == "right" {
                        measure.barline = match child_text(child, "bar-style") {
                            Some(style) => BarlineKind::from_bar_style(style),
                            None => Some(BarlineKind::Regular),
                        };
                    }
                }
                _ => {}
            }

            furthest = furthest.max(cursor.position);
        }

        measure.divisions = self.divisions;
        measure.length = if furthest > 0.0 {
            furthest
        } else {
            self.time.bar_length()
        };

        Ok(measure)
    }

    fn read_attributes(&mut self, node: Node, measure: &mut Measure) -> Result<(), ScoreError> {
        if let Some(text) = child_text(node, "divisions") {
            let divisions: u32 = self.number("divisions", text)?;
            if divisions == 0 {
                return Err(self.error(ErrorType::InvalidNumber {
                    element: "divisions",
                    text: text.to_owned(),
                }));
            }
            self.divisions = divisions;
        }

        if let Some(key) = child(node, "key") {
            if let Some(fifths) = child_text(key, "fifths") {
                let fifths = self.number("fifths", fifths)?;
                let mode = match child_text(key, "mode").map(str::trim) {
                    Some("major") => Some(Mode::Major),
                    Some("minor") => Some(Mode::Minor),
                    _ => None,
                };
                measure.key.get_or_insert(KeySignature { fifths, mode });
            }
        }

        if let Some(time) = child(node, "time") {
            if let (Some(beats), Some(beat_type)) =
                (child_text(time, "beats"), child_text(time, "beat-type"))
            {
                // Composite meters like `3+2`.
                let mut total = 0;
                for part in beats.split('+') {
                    total += self.number::<u32>("beats", part)?;
                }
                let time = TimeSignature {
                    beats: total,
                    beat_type: self.number("beat-type", beat_type)?,
                };
                self.time = time;
                measure.time.get_or_insert(time);
            }
        }

        Ok(())
    }

    fn duration_of(&self, node: Node) -> Result<f64, ScoreError> {
        match child_text(node, "duration") {
            Some(text) => {
                let ticks: f64 = self.number("duration", text)?;
                Ok(ticks / f64::from(self.divisions))
            }
            None => Ok(0.0),
        }
    }

    fn read_note(
        &self,
        node: Node,
        measure: &mut Measure,
        cursor: &mut Cursor,
    ) -> Result<(), ScoreError> {
        // Grace notes sound at the following note's onset and take no time.
        let duration = if has_child(node, "grace") {
            0.0
        } else {
            self.duration_of(node)?
        };
        let voice = child_text(node, "voice")
            .and_then(|text| text.trim().parse().ok())
            .unwrap_or(1);
        let in_chord = has_child(node, "chord");
        let onset = if in_chord {
            cursor.chord_onset
        } else {
            cursor.position
        };

        if let Some(pitch_node) = child(node, "pitch") {
            let pitch = self.read_pitch(pitch_node)?;

            let extended = in_chord
                && cursor.chord_open
                && match measure.elements.last_mut() {
                    Some(last) if last.is_note_bearing() => {
                        add_to_chord(last, pitch);
                        true
                    }
                    _ => false,
                };

            if !extended {
                measure.elements.push(Element {
                    offset: onset,
                    duration,
                    voice,
                    kind: ElementKind::Note(pitch),
                });
            }
            cursor.chord_open = true;
        } else {
            if has_child(node, "rest") && !in_chord {
                measure.elements.push(Element {
                    offset: onset,
                    duration,
                    voice,
                    kind: ElementKind::Rest,
                });
            }
            cursor.chord_open = false;
        }

        if !in_chord {
            cursor.chord_onset = cursor.position;
            cursor.position += duration;
        }

        Ok(())
    }

    fn read_pitch(&self, node: Node) -> Result<Pitch, ScoreError> {
        let step_text = child_text(node, "step").unwrap_or_default();
        let alter = match child_text(node, "alter") {
            Some(text) => self.number::<f64>("alter", text)?.round() as i8,
            None => 0,
        };
        let octave = match child_text(node, "octave") {
            Some(text) => self.number("octave", text)?,
            None => 4,
        };

        Step::parse(step_text)
            .and_then(|step| Pitch::new(step, alter, octave))
            .ok_or_else(|| {
                self.error(ErrorType::InvalidPitch {
                    step: step_text.to_owned(),
                    alter,
                    octave,
                })
            })
    }
}

fn add_to_chord(element: &mut Element, pitch: Pitch) {
    if let ElementKind::Note(first) = element.kind {
        element.kind = ElementKind::Chord(vec![first, pitch]);
    } else if let ElementKind::Chord(ref mut pitches) = element.kind {
        pitches.push(pitch);
    }
}

fn direction_tempo(node: Node) -> Option<f64> {
    node.descendants()
        .filter(|n| n.has_tag_name("metronome"))
        .find_map(|metronome| child_text(metronome, "per-minute")?.trim().parse().ok())
        .or_else(|| child(node, "sound").and_then(sound_tempo))
}

fn sound_tempo(node: Node) -> Option<f64> {
    node.attribute("tempo")?.trim().parse().ok()
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text())
}

fn has_child(node: Node, name: &str) -> bool {
    child(node, name).is_some()
}
