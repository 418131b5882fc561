//! The raw-text library: every book's canonical sections, built once.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use booksum_sections::{Corrections, TitleNormalizer, build_raw_book};
use booksum_types::{BookTitle, RawBook, RawHeading};
use tracing::{error, info, warn};

/// `{ "<title>": [ {heading, paragraphs}, ... ] }` as delivered by the
/// Gutenberg collaborator.
pub type RawTexts = BTreeMap<String, Vec<RawHeading>>;

#[derive(Clone, Debug, Default)]
pub struct RawLibrary {
    books: BTreeMap<BookTitle, RawBook>,
}

impl RawLibrary {
    pub fn from_books<I>(books: I) -> Self
    where
        I: IntoIterator<Item = RawBook>,
    {
        Self {
            books: books
                .into_iter()
                .map(|book| (book.title().clone(), book))
                .collect(),
        }
    }

    /// Classify every book's headings. Excluded titles are skipped; a book
    /// whose corrections fail is kept with no sections so title validation
    /// still sees it. When two titles share a canonical title the first one
    /// is kept.
    pub fn from_raw_texts(texts: &RawTexts, corrections: &Corrections, normalizer: &TitleNormalizer) -> Self {
        let mut books = BTreeMap::new();
        for (raw_title, headings) in texts {
            let title = corrections.canonical_title(raw_title);
            if corrections.is_excluded(&title) {
                info!("{title}: excluded, skipping");
                continue;
            }
            if books.contains_key(&title) {
                warn!("{raw_title}: already loaded as {title}, skipping");
                continue;
            }
            let book = build_raw_book(&title, headings, corrections, normalizer).unwrap_or_else(|err| {
                error!("{title}: raw text rejected: {err}");
                RawBook::new(title.clone())
            });
            books.insert(title, book);
        }
        Self { books }
    }

    pub fn load(path: impl AsRef<Path>, corrections: &Corrections, normalizer: &TitleNormalizer) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read raw texts {}", path.display()))?;
        let texts: RawTexts =
            serde_json::from_str(&text).with_context(|| format!("parse raw texts {}", path.display()))?;
        let library = Self::from_raw_texts(&texts, corrections, normalizer);
        let sections: usize = library.books.values().map(RawBook::len).sum();
        info!(
            "loaded {} books ({sections} sections) from {}",
            library.len(),
            path.display()
        );
        Ok(library)
    }

    pub fn get(&self, title: &BookTitle) -> Option<&RawBook> {
        self.books.get(title)
    }

    pub fn contains(&self, title: &BookTitle) -> bool {
        self.books.contains_key(title)
    }

    pub fn titles(&self) -> BTreeSet<BookTitle> {
        self.books.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawBook> + '_ {
        self.books.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str, paragraphs: &[&str]) -> RawHeading {
        RawHeading {
            heading: text.to_string(),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn titles_are_canonical_and_exclusions_skipped() {
        let corrections = Corrections::builtin().unwrap();
        let normalizer = TitleNormalizer::new(&corrections);
        let mut texts = RawTexts::new();
        texts.insert("Moby-Dick".into(), vec![heading("CHAPTER I. Loomings.", &["Call me Ishmael."])]);
        texts.insert("The Moonstone".into(), vec![heading("CHAPTER I", &["text"])]);
        let library = RawLibrary::from_raw_texts(&texts, &corrections, &normalizer);
        assert_eq!(library.len(), 1);
        let book = library.get(&BookTitle::from("Moby Dick")).unwrap();
        assert!(book.contains("Chapter 1"));
    }

    #[test]
    fn aliased_titles_keep_the_first_book() {
        let corrections = Corrections::builtin().unwrap();
        let normalizer = TitleNormalizer::new(&corrections);
        let mut texts = RawTexts::new();
        texts.insert("Moby Dick".into(), vec![heading("CHAPTER I", &["first"])]);
        texts.insert("Moby-Dick".into(), vec![heading("CHAPTER I", &["second"])]);
        let library = RawLibrary::from_raw_texts(&texts, &corrections, &normalizer);
        assert_eq!(library.len(), 1);
        let book = library.get(&BookTitle::from("Moby Dick")).unwrap();
        assert_eq!(book.get("Chapter 1").unwrap(), ["first".to_string()]);
    }

    #[test]
    fn failed_books_stay_listed() {
        let corrections = Corrections::builtin().unwrap();
        let normalizer = TitleNormalizer::new(&corrections);
        let mut texts = RawTexts::new();
        // Huck Finn's correction renames a chapter this text does not have.
        texts.insert(
            "The Adventures of Huckleberry Finn".into(),
            vec![heading("CHAPTER I", &["text"])],
        );
        let library = RawLibrary::from_raw_texts(&texts, &corrections, &normalizer);
        let book = library
            .get(&BookTitle::from("The Adventures of Huckleberry Finn"))
            .unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        fs::write(&path, "[1, 2").unwrap();
        let corrections = Corrections::default();
        let err = RawLibrary::load(&path, &corrections, &TitleNormalizer::default()).unwrap_err();
        assert!(err.to_string().contains("parse raw texts"), "{err}");
    }
}
