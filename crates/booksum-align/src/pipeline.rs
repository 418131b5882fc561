//! File-to-file batch run: load inputs, align every provider book, compose,
//! partition by split and write the outputs.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use booksum_sections::{Corrections, TitleNormalizer};
use booksum_types::{ProviderBook, SectionRecord, Split};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::engine::{AlignError, Aligner};
use crate::library::RawLibrary;
use crate::pairs::{PairDiff, load_expected, pair_ids};
use crate::provider::prepare;
use crate::report::BatchReport;
use crate::splits::Splits;

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub raw_texts: PathBuf,
    pub summaries: Vec<PathBuf>,
    pub splits: PathBuf,
    pub out_dir: PathBuf,
    /// Built-in table when unset.
    pub corrections: Option<PathBuf>,
    pub expected_pair_ids: Option<PathBuf>,
}

/// Records plus the report of aligning one set of provider books.
#[derive(Debug)]
pub struct Alignment {
    pub records: Vec<SectionRecord>,
    pub report: BatchReport,
}

pub fn run(config: &PipelineConfig) -> Result<BatchReport> {
    let corrections = match &config.corrections {
        Some(path) => Corrections::load(path)?,
        None => Corrections::builtin()?,
    };
    let normalizer = TitleNormalizer::new(&corrections);

    let library = RawLibrary::load(&config.raw_texts, &corrections, &normalizer)?;
    let splits = Splits::load(&config.splits)?;
    splits.validate_titles(&library)?;

    let mut books = Vec::new();
    for path in &config.summaries {
        books.extend(load_summaries(path)?);
    }

    let Alignment { records, mut report } = align(&library, &corrections, &normalizer, books)?;
    let partition = splits.partition(records)?;
    report.record_partition(&partition);

    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("create output directory {}", config.out_dir.display()))?;
    let mut ids = Vec::new();
    for split in Split::ALL {
        let records = partition.records(split);
        write_json(&config.out_dir.join(format!("{split}.json")), records)?;
        ids.extend(pair_ids(records));
    }
    write_json(&config.out_dir.join("pair_ids.json"), &ids)?;

    if let Some(path) = &config.expected_pair_ids {
        let expected = load_expected(path)?;
        report.pair_diff = Some(PairDiff::new(&ids, &expected));
    }
    report.log();
    Ok(report)
}

/// Prepare and align provider books against `library`, then compose.
/// Books are taken in order; the first provider to name a section supplies
/// its raw text.
pub fn align(
    library: &RawLibrary,
    corrections: &Corrections,
    normalizer: &TitleNormalizer,
    books: Vec<ProviderBook>,
) -> Result<Alignment, AlignError> {
    let mut report = BatchReport {
        books: library.len(),
        ..BatchReport::default()
    };
    let mut aligner = Aligner::new(library, corrections);

    for book in books {
        let (title, source) = (book.title.clone(), book.source.clone());
        let book = match prepare(book, corrections, normalizer) {
            Ok(Some(book)) => book,
            Ok(None) => continue,
            Err(err) => {
                error!("{title}: {source} summaries rejected: {err}");
                continue;
            }
        };
        let errors = match aligner.add_book(&book) {
            Ok(errors) => errors,
            Err(AlignError::UnknownBook { title }) => {
                warn!("{title}: no raw text, skipping {} summaries", book.source);
                continue;
            }
            Err(err) => return Err(err),
        };
        report.provider_books += 1;
        if errors.is_unexpected() {
            report.unexpected.push(errors);
        }
    }

    report.synthesized = aligner.compose()?;
    let mut halted: Vec<_> = aligner.halted().cloned().collect();
    halted.sort();
    report.halted = halted;
    report.sections = aligner.len();
    report.summaries = aligner.summary_count();
    info!(
        "aligned {} sections with {} summaries",
        report.sections, report.summaries
    );
    Ok(Alignment {
        records: aligner.records(),
        report,
    })
}

pub fn load_summaries(path: &Path) -> Result<Vec<ProviderBook>> {
    let text = fs::read_to_string(path).with_context(|| format!("read summaries {}", path.display()))?;
    let books: Vec<ProviderBook> =
        serde_json::from_str(&text).with_context(|| format!("parse summaries {}", path.display()))?;
    info!("loaded {} provider books from {}", books.len(), path.display());
    Ok(books)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).with_context(|| format!("write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}
