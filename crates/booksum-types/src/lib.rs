//! Shared types for canonical book sections and the summaries attached to them.
//!
//! Every book is addressed by a [`BookTitle`]; every structural unit inside it
//! by a [`SectionId`] such as `Chapter 4`, `Book 2: Chapter 4` or the range
//! `Chapter 16-18`. A [`ChapterId`] joins the two into the
//! `"<title>.<section>"` key used throughout alignment.
//!
//! [`RawBook`] carries the ground-truth paragraphs per atomic section in
//! document order, and [`AtomicSections`] is the ordered membership view of
//! it used by the expander and the compose pass.
//!
//! ```rust
//! use booksum_types::{ChapterId, SectionId, Unit};
//!
//! let id = ChapterId::parse("Dr. Jekyll and Mr. Hyde.Chapter 3").unwrap();
//! assert_eq!(id.title.as_str(), "Dr. Jekyll and Mr. Hyde");
//! assert_eq!(id.section.trailing_number(), Some(3));
//! assert_eq!(Unit::parse("STAVE"), Some(Unit::Stave));
//! assert_eq!(SectionId::from("Book 2: Chapter 4").unqualified(), "Chapter 4");
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_newtype!(
    /// Canonical title of a work, after alias resolution.
    BookTitle
);

string_newtype!(
    /// Section key scoped to one book, atomic (`Chapter 4`) or compressed
    /// (`Chapter 4-6`, `Letter 1, Letter 2`).
    SectionId
);

string_newtype!(
    /// Name of a summary source.
    Provider
);

impl SectionId {
    /// Text after the last space (`"Chapter 12"` → `"12"`).
    pub fn last_word(&self) -> &str {
        self.0.rsplit(' ').next().unwrap_or(&self.0)
    }

    /// Numeric value of the last word, if it is a plain integer.
    pub fn trailing_number(&self) -> Option<u32> {
        self.last_word().parse().ok()
    }

    /// Split `"Book 2: Chapter 4"` into the container qualifier and the rest.
    pub fn split_qualifier(&self) -> (Option<&str>, &str) {
        match self.0.split_once(": ") {
            Some((qualifier, rest)) => (Some(qualifier), rest),
            None => (None, &self.0),
        }
    }

    /// The id without its container qualifier.
    pub fn unqualified(&self) -> &str {
        self.split_qualifier().1
    }

    pub fn is_qualified(&self) -> bool {
        self.0.contains(": ")
    }
}

/// Fully qualified `"<title>.<section>"` key.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ChapterId {
    pub title: BookTitle,
    pub section: SectionId,
}

impl ChapterId {
    pub fn new(title: impl Into<BookTitle>, section: impl Into<SectionId>) -> Self {
        Self {
            title: title.into(),
            section: section.into(),
        }
    }

    /// Split on the last `.`; titles may carry dots of their own.
    pub fn parse(raw: &str) -> Option<Self> {
        let (title, section) = raw.rsplit_once('.')?;
        if title.is_empty() || section.is_empty() {
            return None;
        }
        Some(Self::new(title, section))
    }

    /// `"<title>.<section>.<provider>"`, the regression key for one summary.
    pub fn pair_id(&self, provider: &Provider) -> String {
        format!("{self}.{provider}")
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.title, self.section)
    }
}

/// Structural unit keywords recognized in section headings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Chapter,
    Part,
    Book,
    Act,
    Scene,
    Volume,
    Stave,
    Phase,
    Letter,
    Preface,
    Prologue,
    Epilogue,
    Introduction,
    Conclusion,
    Sequel,
    Finale,
    Induction,
    Prelude,
}

impl Unit {
    pub const ALL: [Unit; 18] = [
        Unit::Chapter,
        Unit::Part,
        Unit::Book,
        Unit::Act,
        Unit::Scene,
        Unit::Volume,
        Unit::Stave,
        Unit::Phase,
        Unit::Letter,
        Unit::Preface,
        Unit::Prologue,
        Unit::Epilogue,
        Unit::Introduction,
        Unit::Conclusion,
        Unit::Sequel,
        Unit::Finale,
        Unit::Induction,
        Unit::Prelude,
    ];

    /// Parse a unit keyword, ignoring case.
    pub fn parse(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.keyword().eq_ignore_ascii_case(word))
    }

    /// Canonical spelling used in section ids.
    pub fn keyword(self) -> &'static str {
        match self {
            Unit::Chapter => "Chapter",
            Unit::Part => "Part",
            Unit::Book => "Book",
            Unit::Act => "Act",
            Unit::Scene => "Scene",
            Unit::Volume => "Volume",
            Unit::Stave => "Stave",
            Unit::Phase => "Phase",
            Unit::Letter => "Letter",
            Unit::Preface => "Preface",
            Unit::Prologue => "Prologue",
            Unit::Epilogue => "Epilogue",
            Unit::Introduction => "Introduction",
            Unit::Conclusion => "Conclusion",
            Unit::Sequel => "Sequel",
            Unit::Finale => "Finale",
            Unit::Induction => "Induction",
            Unit::Prelude => "Prelude",
        }
    }

    /// Units that carry a number (`Chapter 3`); the rest are named pseudo-units.
    pub fn is_numbered(self) -> bool {
        matches!(
            self,
            Unit::Chapter
                | Unit::Part
                | Unit::Book
                | Unit::Act
                | Unit::Scene
                | Unit::Volume
                | Unit::Stave
                | Unit::Phase
                | Unit::Letter
        )
    }

    /// Units that group lower units (`Book 2: Chapter 4`).
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Unit::Book | Unit::Part | Unit::Volume | Unit::Act | Unit::Phase
        )
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Ordered set of the atomic section ids that exist for one book.
#[derive(Clone, Debug, Default)]
pub struct AtomicSections {
    order: Vec<SectionId>,
    positions: HashMap<SectionId, usize>,
}

impl AtomicSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an id; returns `false` if it was already present.
    pub fn push(&mut self, id: SectionId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id.clone(), self.order.len());
        self.order.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Document-order index of an id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn get(&self, idx: usize) -> Option<&SectionId> {
        self.order.get(idx)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionId> + '_ {
        self.order.iter()
    }

    /// Ids qualified by `prefix` (`"Book 1"` → `"Book 1: Chapter 1"`, ...),
    /// compared without regard to case.
    pub fn qualified_by(&self, prefix: &str) -> Vec<&SectionId> {
        let wanted = format!("{}:", prefix.to_lowercase());
        self.order
            .iter()
            .filter(|id| id.as_str().to_lowercase().starts_with(&wanted))
            .collect()
    }
}

impl FromIterator<SectionId> for AtomicSections {
    fn from_iter<T: IntoIterator<Item = SectionId>>(iter: T) -> Self {
        let mut sections = Self::new();
        for id in iter {
            sections.push(id);
        }
        sections
    }
}

/// One atomic section of the canonical text.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    pub id: SectionId,
    pub paragraphs: Vec<String>,
}

impl RawSection {
    pub fn new(id: impl Into<SectionId>, paragraphs: Vec<String>) -> Self {
        Self {
            id: id.into(),
            paragraphs,
        }
    }
}

/// Canonical text of one book, sections in document order.
#[derive(Clone, Debug, Default)]
pub struct RawBook {
    title: BookTitle,
    sections: Vec<RawSection>,
    index: HashMap<SectionId, usize>,
}

impl RawBook {
    pub fn new(title: impl Into<BookTitle>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Build from sections; the first occurrence of a repeated id wins.
    pub fn from_sections(title: impl Into<BookTitle>, sections: Vec<RawSection>) -> Self {
        let mut book = Self::new(title);
        for section in sections {
            book.insert(section);
        }
        book
    }

    /// Insert unless the id is already present; returns whether it was added.
    pub fn insert(&mut self, section: RawSection) -> bool {
        if self.index.contains_key(&section.id) {
            return false;
        }
        self.index.insert(section.id.clone(), self.sections.len());
        self.sections.push(section);
        true
    }

    pub fn title(&self) -> &BookTitle {
        &self.title
    }

    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.index
            .get(id)
            .map(|idx| self.sections[*idx].paragraphs.as_slice())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[RawSection] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<RawSection> {
        self.sections
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> + '_ {
        self.sections.iter().map(|s| &s.id)
    }

    /// The book's `title_sect_map` entry.
    pub fn atomic_sections(&self) -> AtomicSections {
        self.section_ids().cloned().collect()
    }

    /// Concatenated paragraphs of `ids`, in the order given. Unknown ids
    /// contribute nothing.
    pub fn text_for(&self, ids: &[SectionId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.get(id.as_str()))
            .flat_map(|paragraphs| paragraphs.iter().cloned())
            .collect()
    }
}

/// Where a summary fragment came from: one page, or several pages stitched
/// together during compose.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceLink {
    Single(String),
    Composite(Vec<String>),
}

impl SourceLink {
    pub fn urls(&self) -> Vec<&str> {
        match self {
            SourceLink::Single(url) => vec![url.as_str()],
            SourceLink::Composite(urls) => urls.iter().map(String::as_str).collect(),
        }
    }
}

/// One provider's summary attached to a section.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SummaryFragment {
    pub source: Provider,
    pub text: Vec<String>,
    pub link: SourceLink,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthesized: bool,
}

impl SummaryFragment {
    pub fn new(source: Provider, text: Vec<String>, link: impl Into<String>) -> Self {
        Self {
            source,
            text,
            link: SourceLink::Single(link.into()),
            synthesized: false,
        }
    }
}

/// A heading with its paragraphs as delivered by the raw-text collaborator.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawHeading {
    pub heading: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

/// One scraped summary page.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProviderSection {
    pub heading: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub link: String,
}

impl ProviderSection {
    pub fn new(heading: impl Into<String>, paragraphs: Vec<String>, link: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            paragraphs,
            link: link.into(),
        }
    }
}

/// All summary pages one provider has for one book.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProviderBook {
    pub title: BookTitle,
    pub source: Provider,
    pub sections: Vec<ProviderSection>,
}

/// Final per-section output record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub book_title: BookTitle,
    pub section_id: SectionId,
    pub raw_text: Vec<String>,
    pub summaries: Vec<SummaryFragment>,
}

impl SectionRecord {
    pub fn chapter_id(&self) -> ChapterId {
        ChapterId::new(self.book_title.clone(), self.section_id.clone())
    }
}

/// Dataset partition a book belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
