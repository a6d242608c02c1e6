mod batch;
mod config;
mod dump;
mod error;
mod filter;
mod fonts;
mod headings;
mod lang;
mod layout;
mod levels;
mod merge;
mod outline;
mod pdf;
mod reconstruct;
mod title;
mod types;
mod zones;

#[cfg(test)]
mod testutil;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use batch::{Batch, BatchOptions};
use config::Config;
use outline::OutlineExtractor;
use types::Page;

#[derive(Parser)]
#[command(name = "pdf-outline", about = "Extract a title and H1-H4 outline from PDF layout")]
struct Cli {
    /// PDF files, layout dumps (.json), or directories of them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write <stem>.json per input into this directory instead of stdout
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Show block classification per page (debug)
    #[arg(long)]
    debug_layout: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override pdfium library path
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_path: Option<String>,

    /// Per-document wall-clock budget in seconds
    #[arg(long)]
    budget_secs: Option<u64>,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = config::load(cli.config.as_deref())?;
    if cli.sequential {
        config.parallel = false;
    }

    let inputs = batch::collect_inputs(&cli.inputs);
    let options = BatchOptions {
        output_dir: cli.output_dir,
        pretty: cli.pretty,
        debug_layout: cli.debug_layout,
        pdfium_path: cli.pdfium_path,
        budget: cli.budget_secs.map(Duration::from_secs),
    };
    let report = Batch::new(&config, options).run(&inputs);
    info!(processed = report.processed, failed = report.failed, "batch finished");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn print_debug_layout(path: &Path, pages: &[Page], config: &Config) {
    let extractor = OutlineExtractor::new(config);
    println!("# {}", path.display());
    for page in pages {
        for report in extractor.block_reports(page) {
            let region = if report.title_candidate {
                format!("{}+title", report.region.label())
            } else {
                report.region.label().to_string()
            };
            let size = report.main_size.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
            let preview: String = report.text.chars().take(80).collect();
            println!(
                "p{}.{:<3} [{:<12}] y={:6.1} fs={:>5} {:<12} | {}",
                page.index,
                report.index,
                region,
                report.top,
                size,
                report.class.label(),
                preview
            );
        }
    }
}
