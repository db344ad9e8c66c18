use std::path::{Path, PathBuf};
use std::process::Command;

use super::{failure_reason, list_images, Rasterizer};
use crate::error::Error;

pub const DPI: u32 = 300;

/// Poppler's `pdftoppm`, writing one PNG per page.
#[derive(Debug, Clone)]
pub struct PdfToPpm {
    pub program: PathBuf,
    pub dpi: u32,
}

impl PdfToPpm {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        PdfToPpm {
            program: program.into(),
            dpi: DPI,
        }
    }
}

impl Rasterizer for PdfToPpm {
    fn rasterize(&self, document: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let failure = |reason: String| Error::RasterizationFailure {
            path: document.to_owned(),
            reason,
        };

        // Page numbers are zero-padded to a common width, so filename order
        // is page order.
        let output = Command::new(&self.program)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(document)
            .arg(out_dir.join("page"))
            .output()
            .map_err(|err| failure(format!("could not run {:?}: {}", self.program, err)))?;

        if !output.status.success() {
            return Err(failure(failure_reason(&output)));
        }

        list_images(out_dir)
    }
}
