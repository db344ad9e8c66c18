use std::fmt::{Display, Error, Formatter};
use std::path::{Path, PathBuf};

use crate::error;

#[derive(Debug)]
pub struct ScoreError {
    pub path: Option<PathBuf>,
    pub error: ErrorType,
}

#[derive(Debug)]
pub enum ErrorType {
    Io(std::io::Error),

    Xml(roxmltree::Error),

    NotPartwise { root: String },

    InvalidNumber { element: &'static str, text: String },

    InvalidPitch { step: String, alter: i8, octave: i8 },
}

impl ScoreError {
    pub fn new(path: Option<&Path>, error: ErrorType) -> Self {
        ScoreError {
            path: path.map(Path::to_owned),
            error,
        }
    }

    pub fn filename(&self) -> String {
        self.path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| String::from("<memory>"))
    }
}

impl Display for ScoreError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        use self::ErrorType::*;

        let error_message = match self.error {
            Io(ref err) => format!("Could not read notation file: {}", err),
            Xml(ref err) => format!("Malformed MusicXML: {}", err),
            NotPartwise { ref root } => format!(
                "Expected a `score-partwise` document but found `{}`.",
                root
            ),
            InvalidNumber { element, ref text } => {
                format!("Invalid number `{}` in `<{}>`.", text, element)
            }
            InvalidPitch {
                ref step,
                alter,
                octave,
            } => format!(
                "Pitch step `{}` alter {} octave {} is not a valid MIDI note.",
                step, alter, octave
            ),
        };

        error::fmt_simple_error(f, &error_message, &self.filename())
    }
}

impl std::error::Error for ScoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.error {
            ErrorType::Io(ref err) => Some(err),
            ErrorType::Xml(ref err) => Some(err),
            _ => None,
        }
    }
}
