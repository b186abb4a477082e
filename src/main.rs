//! folio - split a single HTML page into an EPUB

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use folio::{BuildConfig, Source, pipeline};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Split a single HTML page into a sectioned EPUB", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio                                   Build Effective Go.epub from golang.org
    folio --input effective_go.html         Build from a saved copy
    folio --config book.toml -o book.epub   Build with a configuration file")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source page URL
    #[arg(long, value_name = "URL", conflicts_with = "input")]
    url: Option<String>,

    /// Read the page from a local file instead of fetching it
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output EPUB path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Book title
    #[arg(long)]
    title: Option<String>,

    /// Tag that starts a new section
    #[arg(long, value_name = "TAG")]
    boundary_tag: Option<String>,

    /// Don't look for a footer to move onto the title page
    #[arg(long)]
    no_footer: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            LevelFilter::Error
        } else if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match build(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e.summary());
            ExitCode::FAILURE
        }
    }
}

fn build(cli: Cli) -> folio::Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            log::info!("loading configuration from {}", path.display());
            BuildConfig::from_file(path)?
        }
        None => BuildConfig::default(),
    };

    if let Some(url) = cli.url {
        config.source_url = url;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(title) = cli.title {
        config.title = title;
    }
    if let Some(tag) = cli.boundary_tag {
        config.boundary_tag = tag;
    }
    if cli.no_footer {
        config.footer = None;
    }

    let source = match cli.input {
        Some(path) => Source::File(path),
        None => Source::Url(config.source_url.clone()),
    };

    let report = pipeline::run(&config, &source)?;
    if !report.dangling.is_empty() {
        log::warn!(
            "{} internal links point nowhere and were left unchanged",
            report.dangling.len()
        );
    }
    Ok(())
}
