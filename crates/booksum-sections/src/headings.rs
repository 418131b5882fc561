//! Raw-text heading classification.
//!
//! Gutenberg books arrive as a flat list of headings with the paragraphs
//! under each. Headings are sorted into containers (`Book 2`, `Act 1`),
//! sections (`Chapter 4`, `Preface`), subtitles and noise, and the result is
//! a [`RawBook`] keyed by canonical section ids.

use std::collections::{HashMap, HashSet};

use booksum_numerals::{NumeralError, ORDINALS, replace_number_words, replace_roman_numerals};
use booksum_types::{BookTitle, RawBook, RawHeading, RawSection, Unit};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::corrections::{BookCorrections, Corrections};
use crate::normalize::{NormalizeOptions, TitleNormalizer, collapse_spaces, titlecase};
use crate::numbering::flatten_qualifiers;
use crate::recipes::{CorrectionError, RecipeContext, apply_corrections, duplicate_ids};

const SUBTITLE_MARKERS: [char; 3] = [':', '.', '—'];

/// Sub-headings that name their container instead of a section of it.
const EXCLUDED_SUB: [&str; 2] = ["Preface", "Scene"];

static RE_CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:\b(?:book|act|part|volume)\b)|\bPhase\b|(?:First|Second) Epilogue")
        .expect("container pattern compiles")
});

static RE_ADDITIONAL_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Induction|Conclusion|Sequel|Preface)$").expect("additional section pattern compiles")
});

static RE_SUBSECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\bchapters?\b|\bscenes?\b|\bletters?\b|Final Letters|\bstaves?\b",
        r"|Introduction|Prologue|Epilogue|Finale|The Book of the Grotesque|Prelude",
    ))
    .expect("subsection pattern compiles")
});

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("number pattern compiles"));

static RE_BRACKET_NUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:[Pp]g)?\s?\d+\]").expect("page marker pattern compiles"));

static RE_END_OF_BOOK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:\*\*\*)?End of(?: the| this)? Project Gutenberg|^SELECTED BIBLIOGRAPHY")
        .expect("end marker pattern compiles")
});

/// `book the first` → `Book 1`, `second act` → `Act 2`, ...
static CONTAINER_ORDINALS: Lazy<HashMap<String, String>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (word, value) in ORDINALS {
        let word = word.to_lowercase();
        for unit in [Unit::Book, Unit::Part, Unit::Phase, Unit::Volume, Unit::Act] {
            let key = unit.keyword().to_lowercase();
            let name = format!("{unit} {value}");
            map.insert(format!("{key} the {word}"), name.clone());
            map.insert(format!("{key} {word}"), name.clone());
            map.insert(format!("{word} {key}"), name);
        }
    }
    map
});

/// What one raw heading turned out to be.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeadingKind {
    Contents,
    Container(String),
    Section(String),
    Unrecognized(String),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HeadingClassifier<'a> {
    book: Option<&'a BookCorrections>,
}

struct OpenSection {
    slot: Option<usize>,
    has_text: bool,
}

impl<'a> HeadingClassifier<'a> {
    pub fn new(book: Option<&'a BookCorrections>) -> Self {
        Self { book }
    }

    fn act_only(&self) -> bool {
        self.book.is_some_and(|book| book.act_only)
    }

    pub fn classify(&self, heading: &str) -> Result<HeadingKind, NumeralError> {
        let original = heading.trim();
        let cleaned = clean_heading(original)?;

        if cleaned == "Contents" {
            return Ok(HeadingKind::Contents);
        }
        if self
            .book
            .is_some_and(|book| book.named_chapters.iter().any(|named| named == original))
        {
            return Ok(HeadingKind::Section(original.to_string()));
        }
        if RE_CONTAINER.is_match(&cleaned) {
            return Ok(HeadingKind::Container(container_name(&cleaned)));
        }
        if RE_ADDITIONAL_SECTION.is_match(&cleaned) {
            return Ok(HeadingKind::Section(container_name(&cleaned)));
        }
        if RE_SUBSECTION.is_match(&cleaned) {
            return Ok(HeadingKind::Section(cleaned));
        }
        if RE_NUMBER.is_match(&cleaned) {
            return Ok(HeadingKind::Section(format!("Chapter {cleaned}")));
        }
        Ok(HeadingKind::Unrecognized(cleaned))
    }

    /// Sections in document order; repeated names keep their first text.
    pub fn sections(&self, headings: &[RawHeading]) -> Result<Vec<RawSection>, NumeralError> {
        let mut out: Vec<RawSection> = Vec::new();
        let mut names: HashSet<String> = HashSet::new();
        let mut container = String::new();
        let mut sub = String::new();
        let mut open: Option<OpenSection> = None;

        for heading in headings {
            let (paragraphs, finished) = clean_paragraphs(&heading.paragraphs);
            match self.classify(&heading.heading)? {
                HeadingKind::Contents => open = None,
                HeadingKind::Unrecognized(text) => {
                    // A subtitle directly under a section heading.
                    let absorbed = match open.as_mut() {
                        Some(current) if !current.has_text => {
                            if let Some(slot) = current.slot {
                                out[slot].paragraphs.extend(paragraphs);
                                current.has_text = !out[slot].paragraphs.is_empty();
                            }
                            true
                        }
                        _ => false,
                    };
                    if !absorbed {
                        debug!("skipping heading {text:?}");
                        open = None;
                    }
                }
                HeadingKind::Container(name) => {
                    container = name;
                    open = if self.act_only() {
                        let name = self.section_name(&container, &sub, &names);
                        Some(open_section(&mut out, &mut names, name, paragraphs))
                    } else {
                        None
                    };
                }
                HeadingKind::Section(name) => {
                    sub = name;
                    let name = self.section_name(&container, &sub, &names);
                    open = Some(open_section(&mut out, &mut names, name, paragraphs));
                }
            }
            if finished {
                break;
            }
        }
        Ok(out)
    }

    fn section_name(&self, container: &str, sub: &str, names: &HashSet<String>) -> String {
        if self.act_only() {
            return if names.contains(container) && !sub.is_empty() {
                sub.to_string()
            } else {
                container.to_string()
            };
        }
        match (container.is_empty(), sub.is_empty()) {
            (false, false) if EXCLUDED_SUB.contains(&sub) => container.to_string(),
            (false, false) => format!("{container}: {sub}"),
            (_, true) => container.to_string(),
            (true, false) => sub.to_string(),
        }
    }
}

fn open_section(
    out: &mut Vec<RawSection>,
    names: &mut HashSet<String>,
    name: String,
    paragraphs: Vec<String>,
) -> OpenSection {
    let has_text = !paragraphs.is_empty();
    if name.is_empty() || !names.insert(name.clone()) {
        return OpenSection {
            slot: None,
            has_text,
        };
    }
    out.push(RawSection::new(name, paragraphs));
    OpenSection {
        slot: Some(out.len() - 1),
        has_text,
    }
}

/// Strip page markers and stop at the end-of-book marker. The flag is set
/// when the marker was seen.
fn clean_paragraphs(paragraphs: &[String]) -> (Vec<String>, bool) {
    let mut out = Vec::with_capacity(paragraphs.len());
    for paragraph in paragraphs {
        let text = RE_BRACKET_NUM.replace_all(paragraph, "");
        let text = text.trim();
        if RE_END_OF_BOOK.is_match(text) {
            return (out, true);
        }
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
    (out, false)
}

fn clean_heading(heading: &str) -> Result<String, NumeralError> {
    let mut text = collapse_spaces(heading);
    // `LL.D.`, `Ph.D.`: the D is not five hundred.
    if !text.contains(".D.") {
        text = replace_number_words(&replace_roman_numerals(&text)?)?;
    }
    let mut text = titlecase(&text);
    for marker in SUBTITLE_MARKERS {
        let head = text.split_once(marker).map_or(text.as_str(), |(head, _)| head);
        text = head.trim().to_string();
    }
    Ok(text)
}

fn container_name(heading: &str) -> String {
    CONTAINER_ORDINALS
        .get(&heading.to_lowercase())
        .cloned()
        .unwrap_or_else(|| heading.to_string())
}

/// Classify a book's headings, drop container qualifiers when numbering is
/// continuous, and apply the book's raw recipes.
pub fn build_raw_book(
    title: &BookTitle,
    headings: &[RawHeading],
    corrections: &Corrections,
    normalizer: &TitleNormalizer,
) -> Result<RawBook, CorrectionError> {
    let book_corrections = corrections.book(title);
    let sections = HeadingClassifier::new(book_corrections).sections(headings)?;
    let (book, _) = flatten_qualifiers(RawBook::from_sections(title.clone(), sections));
    let mut sections: Vec<RawSection> = book
        .into_sections()
        .into_iter()
        .filter(|section| !section.id.as_str().contains("Project Gutenberg"))
        .collect();

    if let Some(book) = book_corrections
        && !book.raw.is_empty()
    {
        let ctx = RecipeContext {
            title,
            normalizer,
            options: NormalizeOptions::default(),
        };
        sections = apply_corrections(sections, &book.raw, &ctx)?;
    }

    let duplicates = duplicate_ids(&sections);
    if !duplicates.is_empty() {
        warn!("{title}: duplicate raw sections {duplicates:?}, keeping the first of each");
    }
    let book = RawBook::from_sections(title.clone(), sections);
    debug!("{title}: {} raw sections", book.len());
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corrections::Correction;

    fn heading(text: &str, paragraphs: &[&str]) -> RawHeading {
        RawHeading {
            heading: text.to_string(),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn names(sections: &[RawSection]) -> Vec<&str> {
        sections.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn chapters_with_subtitles_and_page_markers() {
        let headings = [
            heading("Contents", &["Chapter I ... 1"]),
            heading("CHAPTER I. The Beginning", &["a", "[Pg 12]b"]),
            heading("CHAPTER II", &[]),
            heading("A Dark Night", &["c"]),
            heading("Illustration", &["caption"]),
            heading("12.", &["d"]),
        ];
        let sections = HeadingClassifier::default().sections(&headings).unwrap();
        assert_eq!(names(&sections), ["Chapter 1", "Chapter 2", "Chapter 12"]);
        assert_eq!(sections[0].paragraphs, ["a", "b"]);
        assert_eq!(sections[1].paragraphs, ["c"]);
    }

    #[test]
    fn containers_qualify_sections() {
        let headings = [
            heading("BOOK THE FIRST", &[]),
            heading("CHAPTER I", &["a"]),
            heading("CHAPTER II", &["b"]),
            heading("BOOK THE SECOND", &[]),
            heading("CHAPTER I", &["c"]),
            heading("PREFACE", &["p"]),
        ];
        let sections = HeadingClassifier::default().sections(&headings).unwrap();
        assert_eq!(
            names(&sections),
            ["Book 1: Chapter 1", "Book 1: Chapter 2", "Book 2: Chapter 1", "Book 2"]
        );
    }

    #[test]
    fn end_marker_stops_the_book() {
        let headings = [
            heading("CHAPTER I", &["a", "End of the Project Gutenberg EBook of Emma", "license"]),
            heading("CHAPTER II", &["b"]),
        ];
        let sections = HeadingClassifier::default().sections(&headings).unwrap();
        assert_eq!(names(&sections), ["Chapter 1"]);
        assert_eq!(sections[0].paragraphs, ["a"]);
    }

    #[test]
    fn plays_use_acts_as_sections() {
        let book = BookCorrections {
            act_only: true,
            ..BookCorrections::default()
        };
        let headings = [heading("ACT I", &["a"]), heading("SECOND ACT", &["b"])];
        let sections = HeadingClassifier::new(Some(&book)).sections(&headings).unwrap();
        assert_eq!(names(&sections), ["Act 1", "Act 2"]);
    }

    #[test]
    fn named_chapters_are_verbatim() {
        let book = BookCorrections {
            named_chapters: vec!["HANDS".into()],
            ..BookCorrections::default()
        };
        let classifier = HeadingClassifier::new(Some(&book));
        assert_eq!(
            classifier.classify("HANDS").unwrap(),
            HeadingKind::Section("HANDS".into())
        );
        assert_eq!(
            HeadingClassifier::default().classify("Departure").unwrap(),
            HeadingKind::Unrecognized("Departure".into())
        );
    }

    #[test]
    fn raw_book_flattens_and_applies_recipes() {
        let mut corrections = Corrections::default();
        corrections.books.insert(
            BookTitle::from("Huck"),
            BookCorrections {
                raw: vec![Correction::Rename {
                    from: "Chapter the Last".into(),
                    to: "Chapter 3".into(),
                }],
                ..BookCorrections::default()
            },
        );
        let headings = [
            heading("PART I", &[]),
            heading("CHAPTER I", &["a"]),
            heading("PART II", &[]),
            heading("CHAPTER II", &["b"]),
            heading("CHAPTER THE LAST", &["c"]),
            heading("Prologue to the Project Gutenberg Edition", &["x"]),
        ];
        let book = build_raw_book(
            &BookTitle::from("Huck"),
            &headings,
            &corrections,
            &TitleNormalizer::new(&corrections),
        )
        .unwrap();
        let ids: Vec<&str> = book.section_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, ["Chapter 1", "Chapter 2", "Chapter 3"]);
    }
}
