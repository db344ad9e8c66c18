use std::path::PathBuf;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    pub fn parse(text: &str) -> Option<Step> {
        match text.trim() {
            "C" => Some(Step::C),
            "D" => Some(Step::D),
            "E" => Some(Step::E),
            "F" => Some(Step::F),
            "G" => Some(Step::G),
            "A" => Some(Step::A),
            "B" => Some(Step::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
            Step::A => "A",
            Step::B => "B",
        }
    }

    fn semitones(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }
}

/// A spelled pitch whose MIDI number is known to lie in `0..=127`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pitch {
    step: Step,
    alter: i8,
    octave: i8,
}

impl Pitch {
    pub fn new(step: Step, alter: i8, octave: i8) -> Option<Pitch> {
        let midi = (i32::from(octave) + 1) * 12 + step.semitones() + i32::from(alter);
        if (0..=127).contains(&midi) {
            Some(Pitch {
                step,
                alter,
                octave,
            })
        } else {
            None
        }
    }

    /// Spells a MIDI note number using sharps.
    pub fn from_midi(midi: u8) -> Pitch {
        const SPELLINGS: [(Step, i8); 12] = [
            (Step::C, 0),
            (Step::C, 1),
            (Step::D, 0),
            (Step::D, 1),
            (Step::E, 0),
            (Step::F, 0),
            (Step::F, 1),
            (Step::G, 0),
            (Step::G, 1),
            (Step::A, 0),
            (Step::A, 1),
            (Step::B, 0),
        ];

        let midi = midi.min(127);
        let (step, alter) = SPELLINGS[usize::from(midi % 12)];
        Pitch {
            step,
            alter,
            octave: (midi / 12) as i8 - 1,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn alter(&self) -> i8 {
        self.alter
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn midi(&self) -> u8 {
        let midi =
            (i32::from(self.octave) + 1) * 12 + self.step.semitones() + i32::from(self.alter);
        midi.clamp(0, 127) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Note(Pitch),
    Chord(Vec<Pitch>),
    Rest,
}

/// A note, chord or rest placed inside its measure.
///
/// `offset` and `duration` are quarter-note lengths; `offset` is measured
/// from the start of the owning measure.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub offset: f64,
    pub duration: f64,
    pub voice: u8,
    pub kind: ElementKind,
}

impl Element {
    pub fn note(offset: f64, duration: f64, pitch: Pitch) -> Self {
        Element {
            offset,
            duration,
            voice: 1,
            kind: ElementKind::Note(pitch),
        }
    }

    pub fn chord(offset: f64, duration: f64, pitches: Vec<Pitch>) -> Self {
        Element {
            offset,
            duration,
            voice: 1,
            kind: ElementKind::Chord(pitches),
        }
    }

    pub fn rest(offset: f64, duration: f64) -> Self {
        Element {
            offset,
            duration,
            voice: 1,
            kind: ElementKind::Rest,
        }
    }

    pub fn pitches(&self) -> &[Pitch] {
        match &self.kind {
            ElementKind::Note(pitch) => std::slice::from_ref(pitch),
            ElementKind::Chord(pitches) => pitches,
            ElementKind::Rest => &[],
        }
    }

    pub fn is_note_bearing(&self) -> bool {
        !self.pitches().is_empty()
    }
}

/// The right-hand barline of a measure, named the way notation libraries
/// name MusicXML bar styles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BarlineKind {
    Regular,
    Dotted,
    Dashed,
    Heavy,
    Double,
    Final,
    HeavyLight,
    HeavyHeavy,
    Tick,
    Short,
    None,
}

impl BarlineKind {
    pub fn from_bar_style(style: &str) -> Option<BarlineKind> {
        match style.trim() {
            "regular" => Some(BarlineKind::Regular),
            "dotted" => Some(BarlineKind::Dotted),
            "dashed" => Some(BarlineKind::Dashed),
            "heavy" => Some(BarlineKind::Heavy),
            "light-light" => Some(BarlineKind::Double),
            "light-heavy" => Some(BarlineKind::Final),
            "heavy-light" => Some(BarlineKind::HeavyLight),
            "heavy-heavy" => Some(BarlineKind::HeavyHeavy),
            "tick" => Some(BarlineKind::Tick),
            "short" => Some(BarlineKind::Short),
            "none" => Some(BarlineKind::None),
            _ => None,
        }
    }

    pub fn bar_style(self) -> &'static str {
        match self {
            BarlineKind::Regular => "regular",
            BarlineKind::Dotted => "dotted",
            BarlineKind::Dashed => "dashed",
            BarlineKind::Heavy => "heavy",
            BarlineKind::Double => "light-light",
            BarlineKind::Final => "light-heavy",
            BarlineKind::HeavyLight => "heavy-light",
            BarlineKind::HeavyHeavy => "heavy-heavy",
            BarlineKind::Tick => "tick",
            BarlineKind::Short => "short",
            BarlineKind::None => "none",
        }
    }

    /// `final` and `double` barlines end a piece.
    pub fn ends_piece(self) -> bool {
        matches!(self, BarlineKind::Final | BarlineKind::Double)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeySignature {
    pub fifths: i8,
    pub mode: Option<Mode>,
}

impl KeySignature {
    /// Pitch class (0-11) of the tonic. A signature without a mode is read
    /// as major.
    pub fn tonic_pitch_class(&self) -> u8 {
        let major_tonic = i32::from(self.fifths) * 7;
        let tonic = match self.mode {
            Some(Mode::Minor) => major_tonic + 9,
            Some(Mode::Major) | None => major_tonic,
        };
        tonic.rem_euclid(12) as u8
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

impl TimeSignature {
    pub fn bar_length(&self) -> f64 {
        f64::from(self.beats) * 4.0 / f64::from(self.beat_type.max(1))
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature {
            beats: 4,
            beat_type: 4,
        }
    }
}

/// One bar of one part. `key`, `time` and `tempo` are only set on the
/// measure where the marking appears.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub number: String,
    pub divisions: u32,
    pub length: f64,
    pub elements: Vec<Element>,
    pub barline: Option<BarlineKind>,
    pub tempo: Option<f64>,
    pub key: Option<KeySignature>,
    pub time: Option<TimeSignature>,
}

impl Default for Measure {
    fn default() -> Self {
        Measure {
            number: String::from("1"),
            divisions: 1,
            length: 4.0,
            elements: Vec::new(),
            barline: None,
            tempo: None,
            key: None,
            time: None,
        }
    }
}

impl Measure {
    pub fn note_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_note_bearing()).count()
    }

    pub fn ends_piece(&self) -> bool {
        self.barline.map_or(false, BarlineKind::ends_piece)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: String,
    pub name: Option<String>,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    pub source: Option<PathBuf>,
    pub title: Option<String>,
    pub parts: Vec<Part>,
}

impl Score {
    /// Flattens the score into one measure stream, part after part.
    pub fn into_measures(self) -> impl Iterator<Item = Measure> {
        self.parts.into_iter().flat_map(|part| part.measures)
    }
}
