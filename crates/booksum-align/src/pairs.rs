//! `"<title>.<section>.<provider>"` pair ids and the regression diff against
//! a previous run.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use booksum_types::SectionRecord;

/// One id per summary fragment, in record order.
pub fn pair_ids<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a SectionRecord>,
{
    records
        .into_iter()
        .flat_map(|record| {
            let id = record.chapter_id();
            record
                .summaries
                .iter()
                .map(move |fragment| id.pair_id(&fragment.source))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn load_expected(path: impl AsRef<Path>) -> Result<BTreeSet<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read expected pair ids {}", path.display()))?;
    let ids: Vec<String> =
        serde_json::from_str(&text).with_context(|| format!("parse expected pair ids {}", path.display()))?;
    Ok(ids.into_iter().collect())
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PairDiff {
    /// Expected but not produced.
    pub missing: BTreeSet<String>,
    /// Produced but not expected.
    pub extra: BTreeSet<String>,
}

impl PairDiff {
    pub fn new(actual: &[String], expected: &BTreeSet<String>) -> Self {
        let actual: BTreeSet<String> = actual.iter().cloned().collect();
        Self {
            missing: expected.difference(&actual).cloned().collect(),
            extra: actual.difference(expected).cloned().collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}
