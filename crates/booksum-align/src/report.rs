use std::fmt;

use booksum_types::{BookTitle, Provider, Split};
use tracing::{info, warn};

use crate::engine::BookErrors;
use crate::pairs::PairDiff;
use crate::splits::Partition;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SplitCounts {
    pub sections: usize,
    pub summaries: usize,
}

/// Summary of one batch run.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub books: usize,
    pub provider_books: usize,
    pub sections: usize,
    pub summaries: usize,
    pub synthesized: usize,
    pub unexpected: Vec<BookErrors>,
    pub halted: Vec<(BookTitle, Provider)>,
    pub splits: [SplitCounts; 3],
    pub pair_diff: Option<PairDiff>,
}

impl BatchReport {
    pub fn record_partition(&mut self, partition: &Partition) {
        for (slot, split) in self.splits.iter_mut().zip(Split::ALL) {
            *slot = SplitCounts {
                sections: partition.sections(split),
                summaries: partition.summaries(split),
            };
        }
    }

    pub fn counts(&self, split: Split) -> SplitCounts {
        match split {
            Split::Train => self.splits[0],
            Split::Val => self.splits[1],
            Split::Test => self.splits[2],
        }
    }

    /// Emit the report through `tracing`.
    pub fn log(&self) {
        for errors in &self.unexpected {
            warn!(
                "unexpected errors for {} / {}: {:?}",
                errors.title, errors.provider, errors.sections
            );
        }
        for line in self.to_string().lines() {
            info!("{line}");
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "books: {} raw, {} provider books; sections: {}; summaries: {} ({} synthesized)",
            self.books, self.provider_books, self.sections, self.summaries, self.synthesized
        )?;
        for split in Split::ALL {
            let counts = self.counts(split);
            writeln!(f, "{split}: {} sections, {} summaries", counts.sections, counts.summaries)?;
        }
        if !self.unexpected.is_empty() {
            writeln!(f, "unexpected error sections:")?;
            for errors in &self.unexpected {
                writeln!(f, "  {} / {}: {:?}", errors.title, errors.provider, errors.sections)?;
            }
        }
        if !self.halted.is_empty() {
            let halted: Vec<String> = self.halted.iter().map(|(t, p)| format!("{t} / {p}")).collect();
            writeln!(f, "halted for compose: {}", halted.join(", "))?;
        }
        match &self.pair_diff {
            Some(diff) if diff.is_clean() => writeln!(f, "pair ids match the expected list")?,
            Some(diff) => {
                writeln!(f, "pair ids missing: {}", diff.missing.len())?;
                for id in &diff.missing {
                    writeln!(f, "  - {id}")?;
                }
                writeln!(f, "pair ids extra: {}", diff.extra.len())?;
                for id in &diff.extra {
                    writeln!(f, "  + {id}")?;
                }
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn display_lists_splits_and_diff() {
        let report = BatchReport {
            books: 2,
            provider_books: 3,
            sections: 5,
            summaries: 9,
            synthesized: 1,
            splits: [
                SplitCounts {
                    sections: 4,
                    summaries: 7,
                },
                SplitCounts {
                    sections: 1,
                    summaries: 2,
                },
                SplitCounts::default(),
            ],
            pair_diff: Some(PairDiff {
                missing: BTreeSet::from(["Emma.Chapter 1.sparknotes".to_string()]),
                extra: BTreeSet::new(),
            }),
            ..BatchReport::default()
        };
        let text = report.to_string();
        assert!(text.contains("summaries: 9 (1 synthesized)"), "{text}");
        assert!(text.contains("train: 4 sections, 7 summaries"), "{text}");
        assert!(text.contains("test: 0 sections, 0 summaries"), "{text}");
        assert!(text.contains("  - Emma.Chapter 1.sparknotes"), "{text}");
        assert!(!text.contains("halted"), "{text}");
    }
}
