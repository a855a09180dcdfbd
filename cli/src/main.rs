//! flowpage CLI - HTML to paginated DOCX conversion tool

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use flowpage::detect::read_html_file;
use flowpage::surface::SnapshotEngine;
use flowpage::{
    ConvertOptions, ConvertResult, HighFidelityConverter, ImageFormat, JsonFormat, Orientation,
    PageFormat, RenderEngine,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "flowpage")]
#[command(version)]
#[command(about = "Convert HTML to paginated DOCX with per-page backgrounds", long_about = None)]
struct Cli {
    /// Input HTML file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output DOCX file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert HTML to DOCX
    Convert {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to <FILE stem>.docx or .pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output document type
        #[arg(long, value_enum, default_value = "docx")]
        to: OutputArg,

        #[command(flatten)]
        page: PageArgs,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Capture page backgrounds as PNG instead of JPEG
        #[arg(long)]
        png: bool,

        /// JPEG quality (1-100)
        #[arg(long, default_value = "90", conflicts_with = "png")]
        quality: u8,

        /// Font family forced on every text run
        #[arg(long, default_value = "Arial")]
        font: String,

        /// Page load timeout in seconds
        #[arg(long, default_value = "60", env = "FLOWPAGE_TIMEOUT")]
        timeout: u64,

        /// Replay a recorded measurement instead of launching a browser
        #[arg(long, value_name = "JSON", conflicts_with = "to")]
        snapshot: Option<PathBuf>,

        /// Print conversion statistics as JSON
        #[arg(long)]
        stats: bool,
    },

    /// Print the measured layout as JSON
    Inspect {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        page: PageArgs,

        /// Replay a recorded measurement instead of launching a browser
        #[arg(long, value_name = "JSON")]
        snapshot: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Record a browser measurement for later replay with --snapshot
    Record {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Check that a file is acceptable HTML input
    Validate {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args, Clone, Copy)]
struct PageArgs {
    /// Page format
    #[arg(long, value_enum, default_value = "a4")]
    format: FormatArg,

    /// Swap A4 width and height
    #[arg(long)]
    landscape: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    /// Editable DOCX with per-page backgrounds
    Docx,
    /// PDF printed by the browser
    Pdf,
}

impl OutputArg {
    fn extension(self) -> &'static str {
        match self {
            OutputArg::Docx => "docx",
            OutputArg::Pdf => "pdf",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// A4 (794x1123 px)
    A4,
    /// 16:9 slide (960x540 px)
    Slide,
}

impl From<FormatArg> for PageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::A4 => PageFormat::A4,
            FormatArg::Slide => PageFormat::Slide,
        }
    }
}

impl PageArgs {
    fn options(&self) -> ConvertOptions {
        let orientation = if self.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        ConvertOptions::new()
            .with_format(self.format.into())
            .with_orientation(orientation)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            to,
            page,
            title,
            png,
            quality,
            font,
            timeout,
            snapshot,
            stats,
        }) => {
            let image_format = if png {
                ImageFormat::Png
            } else {
                ImageFormat::Jpeg { quality }
            };
            let mut options = page
                .options()
                .with_image_format(image_format)
                .with_fallback_font(font)
                .with_load_timeout(Duration::from_secs(timeout));
            if let Some(title) = title {
                options = options.with_title(title);
            }
            let output = output.unwrap_or_else(|| default_output(&input, to));
            match to {
                OutputArg::Docx => {
                    cmd_convert(&input, &output, options, snapshot.as_deref(), stats)
                }
                OutputArg::Pdf => cmd_pdf(&input, &output, options, stats),
            }
        }
        Some(Commands::Inspect {
            input,
            page,
            snapshot,
            compact,
        }) => cmd_inspect(&input, page.options(), snapshot.as_deref(), compact),
        Some(Commands::Record {
            input,
            output,
            page,
        }) => cmd_record(&input, output.as_deref(), page.options()),
        Some(Commands::Validate { input }) => cmd_validate(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                let output = cli
                    .output
                    .unwrap_or_else(|| default_output(&input, OutputArg::Docx));
                cmd_convert(&input, &output, ConvertOptions::default(), None, false)
            } else {
                println!("{}", "Usage: flowpage <FILE> [OUTPUT]".yellow());
                println!("       flowpage --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn default_output(input: &Path, to: OutputArg) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}.{}", stem, to.extension()))
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    options: ConvertOptions,
    snapshot: Option<&Path>,
    stats: bool,
) -> CliResult {
    match snapshot {
        Some(path) => convert_with(SnapshotEngine::from_path(path)?, input, output, options, stats),
        #[cfg(feature = "chrome")]
        None => convert_with(flowpage::ChromeEngine::new(), input, output, options, stats),
        #[cfg(not(feature = "chrome"))]
        None => Err(no_browser()),
    }
}

fn convert_with<E: RenderEngine>(
    engine: E,
    input: &Path,
    output: &Path,
    options: ConvertOptions,
    print_stats: bool,
) -> CliResult {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Reading HTML...");
    let html = read_html_file(input)?;
    log::debug!("read {} bytes from {}", html.len(), input.display());

    pb.set_message(format!("Rendering with {}...", engine.name()));
    let converter = HighFidelityConverter::new(engine);
    let result = converter.convert_html(&html, &options)?;

    pb.set_message("Writing DOCX...");
    result.save(output)?;
    pb.finish_and_clear();

    report_saved(output, &result, print_stats)
}

#[cfg(feature = "chrome")]
fn cmd_pdf(input: &Path, output: &Path, options: ConvertOptions, print_stats: bool) -> CliResult {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Reading HTML...");
    let html = read_html_file(input)?;

    pb.set_message("Printing with chrome...");
    let result = flowpage::PdfConverter::default().convert_html(&html, &options)?;

    pb.set_message("Writing PDF...");
    result.save(output)?;
    pb.finish_and_clear();

    report_saved(output, &result, print_stats)
}

#[cfg(not(feature = "chrome"))]
fn cmd_pdf(_input: &Path, _output: &Path, _options: ConvertOptions, _stats: bool) -> CliResult {
    Err(no_browser())
}

fn report_saved(output: &Path, result: &ConvertResult, print_stats: bool) -> CliResult {
    println!(
        "{} {} ({} pages, {} bytes)",
        "Saved to".green(),
        output.display(),
        result.page_count(),
        result.len()
    );

    if print_stats {
        println!("{}", serde_json::to_string_pretty(&result.stats)?);
    }

    Ok(())
}

fn cmd_inspect(
    input: &Path,
    options: ConvertOptions,
    snapshot: Option<&Path>,
    compact: bool,
) -> CliResult {
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let html = read_html_file(input)?;
    log::debug!("inspecting {} at {:?}", input.display(), options.page_size());
    let report = match snapshot {
        Some(path) => {
            HighFidelityConverter::new(SnapshotEngine::from_path(path)?).inspect(&html, &options)?
        }
        #[cfg(feature = "chrome")]
        None => HighFidelityConverter::new(flowpage::ChromeEngine::new()).inspect(&html, &options)?,
        #[cfg(not(feature = "chrome"))]
        None => return Err(no_browser()),
    };

    println!("{}", flowpage::render::to_json(&report, format)?);
    Ok(())
}

#[cfg(feature = "chrome")]
fn cmd_record(input: &Path, output: Option<&Path>, options: ConvertOptions) -> CliResult {
    let html = read_html_file(input)?;
    let converter = HighFidelityConverter::new(flowpage::ChromeEngine::new());
    let json = converter.record(&html, &options)?.to_json()?;

    if let Some(path) = output {
        std::fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

#[cfg(not(feature = "chrome"))]
fn cmd_record(_input: &Path, _output: Option<&Path>, _options: ConvertOptions) -> CliResult {
    Err(no_browser())
}

#[cfg(not(feature = "chrome"))]
fn no_browser() -> Box<dyn std::error::Error> {
    "this build has no browser engine; pass --snapshot <JSON> or rebuild with the chrome feature"
        .into()
}

fn cmd_validate(input: &Path) -> CliResult {
    let html = read_html_file(input)?;
    println!(
        "{} {} ({} bytes)",
        "Valid HTML:".green(),
        input.display(),
        html.len()
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "flowpage".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("HTML to paginated DOCX conversion tool");
    println!();
    let engine = if cfg!(feature = "chrome") {
        "headless Chromium"
    } else {
        "snapshot replay only"
    };
    println!("Render engine: {}", engine.dimmed());
    println!("License: MIT");
}
