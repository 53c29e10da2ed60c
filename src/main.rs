use clap::Parser;
use iwb2pdf::{AssemblyBuilder, AssemblyError, EnginePreference, SizingMode, ToolCommand};
use log::{LevelFilter, error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;

/// Assembles a directory of `page_<N>.svg` drawings into a single PDF.
#[derive(Parser, Debug)]
#[command(name = "iwb2pdf", version, about)]
struct Cli {
    /// Directory holding the page files.
    page_dir: PathBuf,

    /// Output PDF path.
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Give every page the size of the largest drawing, content centered.
    #[arg(long, conflicts_with = "independent_size")]
    uniform_size: bool,

    /// Size each page to its own drawing (default).
    #[arg(long)]
    independent_size: bool,

    /// Rendering engine: auto, external or builtin.
    #[arg(long, default_value_t = EnginePreference::Auto)]
    engine: EnginePreference,

    /// Padding around each drawing.
    #[arg(long, default_value_t = iwb2pdf::DEFAULT_PADDING)]
    padding: f32,

    /// Time limit in seconds for converting one page with the external tool.
    #[arg(long, default_value_t = iwb2pdf::DEFAULT_TOOL_TIMEOUT.as_secs())]
    timeout: u64,

    /// Path to the external converter, skipping the search.
    #[arg(long)]
    converter: Option<PathBuf>,

    /// Extension of the page files.
    #[arg(long, default_value = "svg")]
    ext: String,

    /// Do not scan for installed fonts (SVG text is then not drawn in-process).
    #[arg(long)]
    no_system_fonts: bool,

    /// Print the assembly report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_module("iwb2pdf", level)
        .filter_module("iwb2pdf_core", level)
        .filter_module("iwb2pdf_render_lopdf", level)
        .filter_module("iwb2pdf_pdf_composer", level)
        .filter_module("iwb2pdf_layout", level)
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let sizing_mode = if cli.uniform_size && !cli.independent_size {
        SizingMode::Uniform
    } else {
        SizingMode::Independent
    };

    let mut builder = AssemblyBuilder::new()
        .with_sizing_mode(sizing_mode)
        .with_engine_preference(cli.engine)
        .with_padding(cli.padding)
        .with_page_extension(cli.ext)
        .with_tool_timeout(Duration::from_secs(cli.timeout))
        .with_system_fonts(!cli.no_system_fonts);
    if let Some(converter) = cli.converter {
        builder = builder.with_tool_command(ToolCommand::new(converter));
    }

    let report = builder.build()?.assemble_directory(&cli.page_dir, &cli.output)?;

    if report.degraded {
        log::warn!("{} is incomplete: only the first page was kept", report.output.display());
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    info!("Wrote {} page(s) to {}", report.pages_written, report.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
