//! Train/val/test assignment of books.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use booksum_types::{BookTitle, SectionRecord, Split};
use serde::Deserialize;
use thiserror::Error;

use crate::library::RawLibrary;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("{0} is not assigned to any split")]
    UnassignedTitle(BookTitle),
    #[error("{what}: splits hold {split_total}, expected {total}")]
    CountMismatch {
        what: &'static str,
        split_total: usize,
        total: usize,
    },
}

#[derive(Deserialize)]
struct SplitFile {
    #[serde(default)]
    train: Vec<BookTitle>,
    #[serde(default)]
    val: Vec<BookTitle>,
    #[serde(default)]
    test: Vec<BookTitle>,
}

#[derive(Clone, Debug, Default)]
pub struct Splits {
    assignment: BTreeMap<BookTitle, Split>,
}

impl Splits {
    pub fn from_json(text: &str) -> Result<Self> {
        let file: SplitFile = serde_json::from_str(text).context("parse split table")?;
        let mut splits = Splits::default();
        for (split, titles) in [(Split::Train, file.train), (Split::Val, file.val), (Split::Test, file.test)] {
            for title in titles {
                if let Some(previous) = splits.assignment.insert(title.clone(), split)
                    && previous != split
                {
                    bail!("{title} is assigned to both {previous} and {split}");
                }
            }
        }
        Ok(splits)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read splits {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("load splits {}", path.display()))
    }

    pub fn assign(&mut self, title: impl Into<BookTitle>, split: Split) {
        self.assignment.insert(title.into(), split);
    }

    pub fn split_of(&self, title: &BookTitle) -> Option<Split> {
        self.assignment.get(title).copied()
    }

    pub fn titles(&self) -> BTreeSet<BookTitle> {
        self.assignment.keys().cloned().collect()
    }

    /// Both sides of the title comparison must match; the error lists what
    /// each side has that the other lacks.
    pub fn validate_titles(&self, library: &RawLibrary) -> Result<()> {
        let raw = library.titles();
        let assigned = self.titles();
        if raw == assigned {
            return Ok(());
        }
        let only_raw: Vec<&str> = raw.difference(&assigned).map(BookTitle::as_str).collect();
        let only_splits: Vec<&str> = assigned.difference(&raw).map(BookTitle::as_str).collect();
        bail!(
            "raw texts and splits disagree on titles\n  only in raw texts: {only_raw:?}\n  only in splits: {only_splits:?}"
        )
    }

    /// Partition records by their book's split. Totals are checked against
    /// the input.
    pub fn partition(&self, records: Vec<SectionRecord>) -> Result<Partition, SplitError> {
        let sections = records.len();
        let summaries: usize = records.iter().map(|r| r.summaries.len()).sum();

        let mut partition = Partition::default();
        for record in records {
            let split = self
                .split_of(&record.book_title)
                .ok_or_else(|| SplitError::UnassignedTitle(record.book_title.clone()))?;
            partition.records.entry(split).or_default().push(record);
        }

        let split_sections: usize = Split::ALL.iter().map(|s| partition.sections(*s)).sum();
        if split_sections != sections {
            return Err(SplitError::CountMismatch {
                what: "sections",
                split_total: split_sections,
                total: sections,
            });
        }
        let split_summaries: usize = Split::ALL.iter().map(|s| partition.summaries(*s)).sum();
        if split_summaries != summaries {
            return Err(SplitError::CountMismatch {
                what: "summaries",
                split_total: split_summaries,
                total: summaries,
            });
        }
        Ok(partition)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Partition {
    records: BTreeMap<Split, Vec<SectionRecord>>,
}

impl Partition {
    pub fn records(&self, split: Split) -> &[SectionRecord] {
        self.records.get(&split).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn sections(&self, split: Split) -> usize {
        self.records(split).len()
    }

    pub fn summaries(&self, split: Split) -> usize {
        self.records(split).iter().map(|r| r.summaries.len()).sum()
    }
}
