//! Section-title normalization.
//!
//! Turns a provider heading such as `CHAPTERS XIV - XVI: The Storm` into the
//! canonical id `Chapter 14-16`. The pipeline is a fixed sequence of textual
//! rewrites; headings that do not end up in a recognized unit shape are kept
//! but flagged as [`HeadingStatus::Unmatched`] so the correction table can
//! deal with them.

use std::collections::{HashMap, HashSet};

use booksum_numerals::{NumeralError, replace_number_words, replace_ordinals, replace_roman_numerals};
use booksum_types::{BookTitle, SectionId};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::corrections::Corrections;

/// Words kept lower-case by [`titlecase`] unless they open the heading.
const ARTICLES: [&str; 5] = ["a", "an", "of", "the", "in"];

const SEPARATORS: [(&str, &str); 7] = [
    (" & ", "-"),
    (" AND ", "-"),
    (" and ", "-"),
    (" to ", "-"),
    (" TO", "-"),
    ("—", "-"),
    ("–", "-"),
];

const SUBTITLE_CHARS: [char; 2] = ['"', '('];

const MAX_PASSES: usize = 4;

static RE_CHAPTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Chapters?\s?").expect("chapters pattern compiles"));

static RE_PLURAL_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(letter|part|book|act|scene|volume|stave|phase)s\s?(\d)")
        .expect("plural unit pattern compiles")
});

static RE_CHAPTER_DASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:Chapter|CHAPTER|Stave) \d+\s*(?:-|:)\s*[a-zA-Z]+")
        .expect("chapter dash pattern compiles")
});

static RE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").expect("dash pattern compiles"));

static RE_CANONICAL: Lazy<Regex> = Lazy::new(|| {
    let numbered = r"(?:Chapter|Part|Book|Act|Scene|Volume|Stave|Phase|Letter) \d+";
    let named = r"(?:Preface|Prologue|Epilogue|Introduction|Conclusion|Sequel|Finale|Induction|Prelude)";
    let atom = format!(r"(?:(?:Book|Part|Volume|Act|Phase) \d+: )?(?:{numbered}|{named})");
    let item = format!(r"{atom}(?:-(?:\d+|{atom}))?");
    Regex::new(&format!(r"^{item}(?:, ?{item})*$")).expect("canonical pattern compiles")
});

/// Whether a normalized heading landed on a known unit shape.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HeadingStatus {
    Canonical,
    Unmatched,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedHeading {
    pub section: SectionId,
    pub status: HeadingStatus,
}

impl NormalizedHeading {
    pub fn is_canonical(&self) -> bool {
        self.status == HeadingStatus::Canonical
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NormalizeOptions {
    /// Rewrite `First`..`Twelfth` as digits.
    pub ordinals: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { ordinals: true }
    }
}

/// Heading normalizer configured from the correction table.
#[derive(Clone, Debug, Default)]
pub struct TitleNormalizer {
    typos: Vec<(String, String)>,
    passthrough: HashMap<BookTitle, HashSet<String>>,
}

impl TitleNormalizer {
    pub fn new(corrections: &Corrections) -> Self {
        let typos = corrections
            .typo_fixups
            .iter()
            .map(|fix| (fix.from.clone(), fix.to.clone()))
            .collect();
        let passthrough = corrections
            .books
            .iter()
            .filter(|(_, book)| !book.passthrough.is_empty())
            .map(|(title, book)| (title.clone(), book.passthrough.iter().cloned().collect()))
            .collect();
        Self { typos, passthrough }
    }

    /// Normalize one heading. The rewrite pipeline is repeated until the
    /// text stops changing, so the result is stable under renormalization.
    pub fn normalize(
        &self,
        raw: &str,
        title: &BookTitle,
        options: NormalizeOptions,
    ) -> Result<NormalizedHeading, NumeralError> {
        let collapsed = collapse_spaces(raw);
        if self
            .passthrough
            .get(title)
            .is_some_and(|headings| headings.contains(&collapsed))
        {
            let status = heading_status(&collapsed);
            return Ok(NormalizedHeading {
                section: SectionId::from(collapsed),
                status,
            });
        }

        let mut current = collapsed;
        for _ in 0..MAX_PASSES {
            let next = self.rewrite(&current, options)?;
            if next == current {
                break;
            }
            current = next;
        }

        let status = heading_status(&current);
        if status == HeadingStatus::Unmatched {
            debug!("{title}: heading {raw:?} normalized to unmatched {current:?}");
        }
        Ok(NormalizedHeading {
            section: SectionId::from(current),
            status,
        })
    }

    fn rewrite(&self, text: &str, options: NormalizeOptions) -> Result<String, NumeralError> {
        let mut s = text.to_string();
        for (from, to) in &self.typos {
            s = s.replace(from.as_str(), to);
        }
        s = replace_roman_numerals(&s)?;
        s = replace_number_words(&s)?;
        s = RE_CHAPTERS.replace_all(&s, "Chapter ").into_owned();
        s = RE_PLURAL_UNIT.replace_all(&s, "${1} ${2}").into_owned();

        if RE_CHAPTER_DASH.is_match(&s) {
            for marker in [':', '-'] {
                if let Some((head, _)) = s.split_once(marker) {
                    s = head.to_string();
                }
            }
        }

        let mut s = s.trim().to_string();
        if s.ends_with(':') {
            s.pop();
        }
        if let Some(marker) = SUBTITLE_CHARS.into_iter().find(|c| s.contains(*c))
            && let Some((head, _)) = s.split_once(marker)
        {
            s = head.to_string();
        }
        if options.ordinals {
            s = replace_ordinals(&s);
        }
        for (from, to) in SEPARATORS {
            s = s.replace(from, to);
        }
        let s = RE_DASH.replace_all(&s, "-");
        Ok(titlecase(s.trim()))
    }
}

/// Classify already-normalized text.
pub fn heading_status(text: &str) -> HeadingStatus {
    if RE_CANONICAL.is_match(text) {
        HeadingStatus::Canonical
    } else {
        HeadingStatus::Unmatched
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove whitespace around hyphens (`Chapter 1 - 3` → `Chapter 1-3`).
pub fn tighten_dashes(text: &str) -> String {
    RE_DASH.replace_all(text, "-").into_owned()
}

/// Capitalize every word except articles after the first word.
pub fn titlecase(text: &str) -> String {
    text.split(' ')
        .enumerate()
        .map(|(idx, word)| {
            let lower = word.to_lowercase();
            if idx > 0 && ARTICLES.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
