use std::path::{Path, PathBuf};
use std::process::Command;

use super::{failure_reason, Recognizer};
use crate::error::Error;

/// The `oemer` optical music recognizer, run once per page image.
#[derive(Debug, Clone)]
pub struct Oemer {
    pub program: PathBuf,
    pub use_tf: bool,
}

impl Oemer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Oemer {
            program: program.into(),
            use_tf: false,
        }
    }

    pub fn output_path(image: &Path, out_dir: &Path) -> PathBuf {
        let mut name = image.file_stem().unwrap_or_default().to_os_string();
        name.push(".musicxml");
        out_dir.join(name)
    }

    fn command(&self, image: &Path, out_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(image).arg("-o").arg(out_dir).arg("-d");
        if self.use_tf {
            command.arg("--use-tf");
        }

        // CPU inference only.
        command
            .env("CUDA_VISIBLE_DEVICES", "-1")
            .env("ONNXRUNTIME_QUIET", "1")
            .env("ORT_COREML_FLAGS", "0")
            .env("TF_USE_LEGACY_KERAS", "1");
        if std::env::var_os("INFERENCE_WITH_TF").is_none() {
            command.env("INFERENCE_WITH_TF", if self.use_tf { "1" } else { "0" });
        }

        command
    }
}

impl Recognizer for Oemer {
    fn recognize(&self, image: &Path, out_dir: &Path) -> Result<PathBuf, Error> {
        let output = self
            .command(image, out_dir)
            .output()
            .map_err(|err| Error::RecognitionFailure {
                page: image.to_owned(),
                reason: format!("could not run {:?}: {}", self.program, err),
            })?;

        if !output.status.success() {
            return Err(Error::RecognitionFailure {
                page: image.to_owned(),
                reason: failure_reason(&output),
            });
        }

        let expected = Oemer::output_path(image, out_dir);
        if expected.is_file() {
            Ok(expected)
        } else {
            Err(Error::MissingRecognitionOutput {
                page: image.to_owned(),
                expected,
            })
        }
    }
}
