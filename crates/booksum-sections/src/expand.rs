//! Expansion of compressed section ids (`Chapter 3-5`, `Letter 1, Letter 2`,
//! `Book 2`) into the atomic ids of one book.

use std::collections::HashSet;

use booksum_types::{AtomicSections, SectionId};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::corrections::{BookCorrections, ExpansionStep};
use crate::normalize::titlecase;

/// Nesting bound for book-specific expansion rules.
pub const MAX_RULE_DEPTH: usize = 8;

/// Longest numeric range accepted.
pub const MAX_RANGE: u32 = 10_000;

static RE_MULTI_CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*-\s*\d+").expect("range pattern compiles"));

static RE_CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Chapter|CHAPTER) \d+$").expect("chapter pattern compiles"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("{section}: {missing:?} is not a section of the book")]
    SequenceGap { section: String, missing: String },
    #[error("{section}: invalid range")]
    InvalidRange { section: String },
    #[error("{section}: {duplicate:?} appears more than once")]
    Duplicate { section: String, duplicate: String },
    #[error("{section}: expansion rules nest deeper than {limit}")]
    RecursionLimit { section: String, limit: usize },
}

/// Expands compressed ids against the known atomic ids of one book.
#[derive(Clone, Copy, Debug)]
pub struct SectionExpander<'a> {
    atoms: &'a AtomicSections,
    book: Option<&'a BookCorrections>,
}

impl<'a> SectionExpander<'a> {
    pub fn new(atoms: &'a AtomicSections, book: Option<&'a BookCorrections>) -> Self {
        Self { atoms, book }
    }

    /// Ordered atomic ids covered by `compressed`. Every id must exist in the
    /// book and appear once.
    pub fn expand(&self, compressed: &str) -> Result<Vec<SectionId>, ExpandError> {
        let candidates = self.candidates(compressed, compressed, 0)?;
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = self.resolve(compressed, &candidate)?;
            if !seen.insert(id.clone()) {
                return Err(ExpandError::Duplicate {
                    section: compressed.to_string(),
                    duplicate: id.into_string(),
                });
            }
            out.push(id);
        }
        Ok(out)
    }

    fn candidates(&self, origin: &str, section: &str, depth: usize) -> Result<Vec<String>, ExpandError> {
        if depth > MAX_RULE_DEPTH {
            return Err(ExpandError::RecursionLimit {
                section: origin.to_string(),
                limit: MAX_RULE_DEPTH,
            });
        }

        let section = if RE_MULTI_CHAPTER.is_match(section) && section.contains("Letters") {
            section.replace("Letters", "Letter")
        } else {
            section.to_string()
        };

        if let Some(rule) = self.book.and_then(|book| book.expansion(&section)) {
            let mut out = Vec::new();
            for step in &rule.steps {
                match step {
                    ExpansionStep::Literal(id) => out.push(id.clone()),
                    ExpansionStep::Expand(id) => out.extend(self.candidates(origin, id, depth + 1)?),
                }
            }
            return Ok(out);
        }

        if let Some(range) = RE_MULTI_CHAPTER.find(&section) {
            let invalid = || ExpandError::InvalidRange {
                section: origin.to_string(),
            };
            let (start, end) = range.as_str().split_once('-').ok_or_else(invalid)?;
            let start: u32 = start.trim().parse().map_err(|_| invalid())?;
            let end: u32 = end.trim().parse().map_err(|_| invalid())?;
            if start > end || end - start >= MAX_RANGE {
                return Err(invalid());
            }
            let base = RE_MULTI_CHAPTER.replace_all(&section, "");
            return Ok((start..=end).map(|k| format!("{base}{k}")).collect());
        }

        if section.contains(',') {
            return Ok(section.split(',').map(|part| part.trim().to_string()).collect());
        }

        if !RE_CHAPTER.is_match(&section) {
            let mut keyed = Vec::new();
            for id in self.atoms.qualified_by(&section) {
                match id.trailing_number() {
                    Some(number) => keyed.push((number, id.as_str().to_string())),
                    None => return Ok(vec![section]),
                }
            }
            if keyed.is_empty() {
                return Ok(vec![section]);
            }
            keyed.sort_by_key(|(number, _)| *number);
            return Ok(keyed.into_iter().map(|(_, id)| id).collect());
        }

        Ok(vec![section])
    }

    fn resolve(&self, origin: &str, candidate: &str) -> Result<SectionId, ExpandError> {
        if self.atoms.contains(candidate) {
            return Ok(SectionId::from(candidate));
        }
        if let Some(alias) = self.book.and_then(|book| book.aliases.get(candidate))
            && self.atoms.contains(alias)
        {
            return Ok(SectionId::from(alias.as_str()));
        }
        let cased = titlecase(candidate);
        if self.atoms.contains(&cased) {
            return Ok(SectionId::from(cased));
        }
        Err(ExpandError::SequenceGap {
            section: origin.to_string(),
            missing: candidate.to_string(),
        })
    }
}
