use std::path::{Path, PathBuf};

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::collaborators::{list_files, list_images, Rasterizer, Recognizer};
use crate::colors::{CYAN, GREEN};
use crate::error::Error;
use crate::midi_generation::{self, data::MidiGenerationOptions};
use crate::score;
use crate::segmenting::{Composition, Segmenter};
use crate::status;
use crate::truth::{self, SynthesisOptions};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// Reuse notation files already in the temporary directory.
    pub skip_omr: bool,
    /// Pages recognized at once. Recognition results still reach the
    /// segmenter in page order.
    pub jobs: usize,
    pub synthesis: SynthesisOptions,
    pub midi: Option<MidiGenerationOptions>,
    pub quiet: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            output_dir: PathBuf::from("./output_carols"),
            temp_dir: PathBuf::from("./temp_omr"),
            skip_omr: false,
            jobs: 1,
            synthesis: SynthesisOptions::default(),
            midi: None,
            quiet: false,
        }
    }
}

/// The files written for one composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenComposition {
    pub number: usize,
    pub notation: PathBuf,
    pub truth: PathBuf,
    pub midi: Option<PathBuf>,
}

/// `carol_001`, `carol_002`, ...
pub fn file_stem(number: usize) -> String {
    format!("carol_{:03}", number)
}

/// Rasterize, recognize, segment and synthesize, one page at a time.
///
/// Any failure ends the run. Files already written stay on disk.
pub struct Pipeline<'a> {
    pub options: PipelineOptions,
    rasterizer: &'a dyn Rasterizer,
    recognizer: &'a dyn Recognizer,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        options: PipelineOptions,
        rasterizer: &'a dyn Rasterizer,
        recognizer: &'a dyn Recognizer,
    ) -> Self {
        Pipeline {
            options,
            rasterizer,
            recognizer,
        }
    }

    pub fn image_dir(&self) -> PathBuf {
        self.options.temp_dir.join("images")
    }

    pub fn xml_dir(&self) -> PathBuf {
        self.options.temp_dir.join("xml")
    }

    fn log(&self, color: ansi_term::Style, prefix: &str, message: &str) {
        if !self.options.quiet {
            status::log(color, prefix, message);
        }
    }

    pub fn run(&self, input: Option<&Path>) -> Result<Vec<WrittenComposition>, Error> {
        let xml_dir = self.xml_dir();
        for dir in [&self.options.output_dir, &self.image_dir(), &xml_dir] {
            std::fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
        }

        if !self.options.skip_omr {
            let input = input.ok_or_else(|| Error::InvalidInput {
                path: PathBuf::new(),
            })?;
            let pages = self.collect_pages(input)?;
            self.recognize_pages(&pages, &xml_dir)?;
        }

        self.split_and_convert(&xml_dir)
    }

    /// Page images for `input`: a PDF is rasterized into the temporary
    /// image directory, a directory is used as is.
    pub fn collect_pages(&self, input: &Path) -> Result<Vec<PathBuf>, Error> {
        if input.is_file() && is_pdf(input) {
            self.log(CYAN, "Rasterizing", &input.display().to_string());
            self.rasterizer.rasterize(input, &self.image_dir())
        } else if input.is_dir() {
            self.log(CYAN, "Using", &format!("images from {}", input.display()));
            list_images(input)
        } else {
            Err(Error::InvalidInput {
                path: input.to_owned(),
            })
        }
    }

    /// Recognizes every page, returning notation files in page order. The
    /// first failing page in page order is reported.
    pub fn recognize_pages(&self, pages: &[PathBuf], xml_dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let jobs = self.options.jobs.clamp(1, pages.len().max(1));

        if jobs == 1 {
            return pages
                .iter()
                .map(|page| self.recognize_page(page, xml_dir))
                .collect();
        }

        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        let results: Vec<Result<PathBuf, Error>> = pool.install(|| {
            pages
                .par_iter()
                .map(|page| self.recognize_page(page, xml_dir))
                .collect()
        });

        results.into_iter().collect()
    }

    fn recognize_page(&self, page: &Path, xml_dir: &Path) -> Result<PathBuf, Error> {
        let name = page.file_name().unwrap_or_default().to_string_lossy();
        self.log(CYAN, "Recognizing", &name);
        self.recognizer.recognize(page, xml_dir)
    }

    /// Feeds every notation file in `xml_dir`, in filename order, through
    /// the segmenter and saves each finished composition.
    pub fn split_and_convert(&self, xml_dir: &Path) -> Result<Vec<WrittenComposition>, Error> {
        let mut segmenter = Segmenter::new();
        let mut written = Vec::new();

        for file in list_files(xml_dir, &["musicxml"])? {
            let name = file.file_name().unwrap_or_default().to_string_lossy();
            self.log(CYAN, "Splitting", &name);

            let score = score::read_score(&file)?;
            for measure in score.into_measures() {
                if let Some(composition) = segmenter.push(measure) {
                    written.push(self.save(written.len() + 1, &composition)?);
                }
            }
        }

        if let Some(composition) = segmenter.finish() {
            written.push(self.save(written.len() + 1, &composition)?);
        }

        Ok(written)
    }

    /// Writes `carol_NNN.musicxml`, `carol_NNN.truth.json` and, when MIDI
    /// output is on, `carol_NNN.mid`.
    pub fn save(&self, number: usize, composition: &Composition) -> Result<WrittenComposition, Error> {
        let stem = file_stem(number);
        self.log(GREEN, "Saving", &stem);

        let dir = &self.options.output_dir;
        let write = |path: &Path, contents: &[u8]| {
            std::fs::write(path, contents).map_err(|err| Error::io(path, err))
        };

        let notation = dir.join(format!("{}.musicxml", stem));
        write(
            &notation,
            score::write_musicxml(&stem, composition.measures()).as_bytes(),
        )?;

        let record = truth::synthesize(composition, &self.options.synthesis);
        let truth = dir.join(format!("{}.truth.json", stem));
        write(&truth, record.to_json()?.as_bytes())?;

        let midi = match self.options.midi {
            Some(ref options) => {
                let bytes = midi_generation::generate_midi(&record, options)
                    .ok_or_else(|| Error::Midi(stem.clone()))?;
                let path = dir.join(format!("{}.mid", stem));
                write(&path, &bytes)?;
                Some(path)
            }
            None => None,
        };

        Ok(WrittenComposition {
            number,
            notation,
            truth,
            midi,
        })
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
}
