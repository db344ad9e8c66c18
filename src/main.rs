use std::path::{Path, PathBuf};

use color_eyre::eyre::Result;
use structopt::StructOpt;

use truthsheet::collaborators::{self, Oemer, PdfToPpm, OMR_ENV, RASTERIZER_ENV};
use truthsheet::colors::{GREEN, RED};
use truthsheet::status::log;
use truthsheet::{
    MidiGenerationOptions, Pipeline, PipelineOptions, SynthesisOptions,
};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "truthsheet",
    about = "Split scanned sheet music into pieces and write MusicXML and truth files.\n\
             The OMR tool defaults to `oemer`; set `TRUTHSHEET_OMR` to change it.\n\
             PDFs are rasterized with `pdftoppm`; set `TRUTHSHEET_RASTERIZER` to change it."
)]
struct Args {
    #[structopt(
        help = "PDF file or directory of page images. Not needed with --skip-omr.",
        parse(from_os_str),
        required_unless = "skip-omr"
    )]
    input: Option<PathBuf>,

    #[structopt(
        short = "o",
        long = "output",
        help = "Output directory.",
        default_value = "./output_carols",
        parse(from_os_str)
    )]
    output: PathBuf,

    #[structopt(
        short = "t",
        long = "temp",
        help = "Working directory for page images and recognized notation.",
        default_value = "./temp_omr",
        parse(from_os_str)
    )]
    temp: PathBuf,

    #[structopt(
        long = "skip-omr",
        help = "Skip recognition and reuse notation files already in the working directory."
    )]
    skip_omr: bool,

    #[structopt(
        long = "sample-rate",
        help = "Sample rate stamped into truth files.",
        default_value = "44100"
    )]
    sample_rate: u32,

    #[structopt(
        long = "bpm",
        help = "Tempo used when a piece has no tempo marking.",
        default_value = "120"
    )]
    bpm: f64,

    #[structopt(long = "midi", help = "Also write a MIDI file for every piece.")]
    midi: bool,

    #[structopt(
        short = "d",
        long = "division",
        help = "MIDI ticks per beat.",
        default_value = "480"
    )]
    ticks_per_beat: i16,

    #[structopt(
        short = "j",
        long = "jobs",
        help = "Pages to recognize in parallel.",
        default_value = "1"
    )]
    jobs: usize,

    #[structopt(long = "use-tf", help = "Ask the OMR tool to use its TensorFlow backend.")]
    use_tf: bool,

    #[structopt(short = "q", long = "quiet", help = "Only print errors.")]
    quiet: bool,
}

fn main() {
    let args = Args::from_args();

    if let Err(err) = run(args) {
        eprintln!("{}", err);
        log(RED, "error:", "Run failed.");
        std::process::exit(1)
    }
}

fn run(args: Args) -> Result<()> {
    color_eyre::install()?;

    let input = args.input.as_deref();

    // Tools are checked before any work starts.
    let mut oemer = Oemer::new("oemer");
    let mut pdftoppm = PdfToPpm::new("pdftoppm");
    if !args.skip_omr {
        oemer.program = collaborators::locate_tool(
            OMR_ENV,
            "oemer",
            "Install it with `pip install oemer`.",
        )?;
        oemer.use_tf = args.use_tf;

        if input.map_or(false, is_pdf_file) {
            pdftoppm.program = collaborators::locate_tool(
                RASTERIZER_ENV,
                "pdftoppm",
                "Install poppler to rasterize PDFs.",
            )?;
        }
    }

    let options = PipelineOptions {
        output_dir: args.output,
        temp_dir: args.temp,
        skip_omr: args.skip_omr,
        jobs: args.jobs,
        synthesis: SynthesisOptions {
            sample_rate: args.sample_rate,
            fallback_bpm: args.bpm,
            ..SynthesisOptions::default()
        },
        midi: args.midi.then(|| MidiGenerationOptions {
            ticks_per_beat: args.ticks_per_beat,
        }),
        quiet: args.quiet,
    };

    let pipeline = Pipeline::new(options, &pdftoppm, &oemer);
    let written = pipeline.run(input)?;

    if !args.quiet {
        log(
            GREEN,
            "Done!",
            &format!(
                "Wrote {} pieces to {}",
                written.len(),
                pipeline.options.output_dir.display()
            ),
        );
    }

    Ok(())
}

fn is_pdf_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
}
