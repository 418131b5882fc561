use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use booksum_align::{PipelineConfig, run};

const DEFAULT_RAW_TEXTS: &str = "raw_texts.json";
const DEFAULT_SPLITS: &str = "splits.json";
const DEFAULT_OUT_DIR: &str = "raw_splits";

/// Align scraped chapter summaries with Gutenberg raw text and write the
/// train/val/test splits.
#[derive(Debug, Parser)]
#[command(name = "booksum-align", version, about)]
struct Cli {
    /// Raw texts keyed by book title.
    #[arg(long, env = "BOOKSUM_RAW_TEXTS", default_value = DEFAULT_RAW_TEXTS)]
    raw_texts: PathBuf,

    /// Provider summary files, aligned in the order given.
    #[arg(
        long = "summaries",
        env = "BOOKSUM_SUMMARIES",
        value_delimiter = ',',
        required = true
    )]
    summaries: Vec<PathBuf>,

    /// Train/val/test title lists.
    #[arg(long, env = "BOOKSUM_SPLITS", default_value = DEFAULT_SPLITS)]
    splits: PathBuf,

    #[arg(long, env = "BOOKSUM_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Correction table replacing the built-in one.
    #[arg(long, env = "BOOKSUM_CORRECTIONS")]
    corrections: Option<PathBuf>,

    /// Pair ids of a previous run to diff against.
    #[arg(long, env = "BOOKSUM_PAIR_IDS_EXPECTED")]
    pair_ids_expected: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    info!("using raw texts at {}", cli.raw_texts.display());
    info!("using splits at {}", cli.splits.display());
    match &cli.corrections {
        Some(path) => info!("using corrections at {}", path.display()),
        None => info!("using built-in corrections"),
    }

    let config = PipelineConfig {
        raw_texts: cli.raw_texts,
        summaries: cli.summaries,
        splits: cli.splits,
        out_dir: cli.out_dir,
        corrections: cli.corrections,
        expected_pair_ids: cli.pair_ids_expected,
    };

    let start = Instant::now();
    let report = run(&config)?;
    info!(
        "{} sections written to {} in {} ms",
        report.sections,
        config.out_dir.display(),
        start.elapsed().as_millis()
    );
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
