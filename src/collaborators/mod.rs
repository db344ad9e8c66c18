//! External tools the pipeline delegates to: a PDF rasterizer and an
//! optical music recognizer. Both run as blocking subprocesses.

mod oemer;
mod pdftoppm;

pub use self::oemer::Oemer;
pub use self::pdftoppm::PdfToPpm;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Output;

use crate::error::Error;

pub const OMR_ENV: &str = "TRUTHSHEET_OMR";
pub const RASTERIZER_ENV: &str = "TRUTHSHEET_RASTERIZER";

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Turns a document into page images.
pub trait Rasterizer: Sync {
    /// Writes page images into `out_dir` and returns them in page order.
    fn rasterize(&self, document: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, Error>;
}

/// Recognizes the notation on one page image.
pub trait Recognizer: Sync {
    /// Writes exactly one notation file for `image` into `out_dir` and
    /// returns its path.
    fn recognize(&self, image: &Path, out_dir: &Path) -> Result<PathBuf, Error>;
}

/// Resolves the program named by `env_var`, or `default` when unset, to
/// an executable path. Fails with `MissingCollaborator` if nothing runnable
/// is found.
pub fn locate_tool(env_var: &str, default: &str, hint: &'static str) -> Result<PathBuf, Error> {
    let program = std::env::var_os(env_var).unwrap_or_else(|| OsString::from(default));

    find_executable(&program).ok_or_else(|| Error::MissingCollaborator {
        tool: program.to_string_lossy().into_owned(),
        hint,
    })
}

fn find_executable(program: &OsStr) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_owned());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let candidate = candidate.with_extension("exe");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    })
}

/// Page images directly inside `dir`, in lexicographic filename order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    list_files(dir, IMAGE_EXTENSIONS)
}

/// Files directly inside `dir` whose extension is one of `extensions`
/// (case-insensitive), sorted by filename.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, Error> {
    let entries = std::fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| Error::io(dir, err))?.path();
        let matches = path
            .extension()
            .and_then(OsStr::to_str)
            .map_or(false, |ext| {
                extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted))
            });

        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last_line = stderr.lines().rev().find(|line| !line.trim().is_empty());

    match last_line {
        Some(line) => format!("{} ({})", output.status, line.trim()),
        None => output.status.to_string(),
    }
}
