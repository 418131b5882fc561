//! Summary/raw-text alignment.
//!
//! Provider books are added one at a time. Each summary heading is resolved
//! to the atomic sections it covers and registered once under its
//! [`ChapterId`] together with the matching raw text; later providers for the
//! same id only append their fragment. After all providers are in,
//! [`Aligner::compose`] builds multi-section summaries for providers that
//! only summarized the parts.

use std::collections::{BTreeSet, HashMap, HashSet};

use bitvec::prelude::*;
use booksum_sections::{Corrections, ExpandError, SectionExpander, tighten_dashes};
use booksum_types::{
    AtomicSections, BookTitle, ChapterId, Provider, ProviderBook, RawBook, SectionId, SectionRecord,
    SourceLink, SummaryFragment,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::library::RawLibrary;

type Coverage = BitVec<usize, Lsb0>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("{title} is not in the raw library")]
    UnknownBook { title: BookTitle },
    #[error("{title}: {provider} piece {piece:?} overlaps sections already covered while composing {section:?}")]
    DuplicateCoverage {
        title: BookTitle,
        provider: Provider,
        section: SectionId,
        piece: SectionId,
    },
}

/// Outcome of [`Aligner::register`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Registration {
    Inserted,
    /// First writer wins; the existing entry is untouched.
    AlreadyPresent,
    /// No raw text behind the id.
    EmptyText,
}

/// Headings of one provider book that could not be aligned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BookErrors {
    pub title: BookTitle,
    pub provider: Provider,
    pub sections: BTreeSet<String>,
    /// Whether the set is on the allow-list.
    pub expected: bool,
}

impl BookErrors {
    pub fn is_unexpected(&self) -> bool {
        !self.sections.is_empty() && !self.expected
    }
}

#[derive(Clone, Debug)]
struct Entry {
    id: ChapterId,
    atoms: Vec<SectionId>,
    raw_text: Vec<String>,
    summaries: Vec<SummaryFragment>,
}

pub struct Aligner<'a> {
    library: &'a RawLibrary,
    corrections: &'a Corrections,
    entries: Vec<Entry>,
    index: HashMap<ChapterId, usize>,
    /// Expanded atoms per compressed id.
    expanded: HashMap<ChapterId, Vec<SectionId>>,
    /// Providers in first-seen order.
    providers: Vec<Provider>,
    /// Ids each provider supplied for each book, pointing at their entries.
    supplied: HashMap<(BookTitle, Provider), HashMap<SectionId, usize>>,
    halted: HashSet<(BookTitle, Provider)>,
}

impl<'a> Aligner<'a> {
    pub fn new(library: &'a RawLibrary, corrections: &'a Corrections) -> Self {
        Self {
            library,
            corrections,
            entries: Vec::new(),
            index: HashMap::new(),
            expanded: HashMap::new(),
            providers: Vec::new(),
            supplied: HashMap::new(),
            halted: HashSet::new(),
        }
    }

    /// Register `id` with its raw text. Existing ids are never overwritten.
    pub fn register(&mut self, id: ChapterId, raw_text: Vec<String>, atoms: Vec<SectionId>) -> Registration {
        if self.index.contains_key(&id) {
            return Registration::AlreadyPresent;
        }
        if raw_text.is_empty() {
            return Registration::EmptyText;
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push(Entry {
            id,
            atoms,
            raw_text,
            summaries: Vec::new(),
        });
        Registration::Inserted
    }

    /// Align one prepared provider book. Unexpected error sections halt the
    /// (title, provider) pair for [`compose`](Self::compose).
    pub fn add_book(&mut self, book: &ProviderBook) -> Result<BookErrors, AlignError> {
        let library = self.library;
        let raw = library.get(&book.title).ok_or_else(|| AlignError::UnknownBook {
            title: book.title.clone(),
        })?;
        if !self.providers.contains(&book.source) {
            self.providers.push(book.source.clone());
        }
        let key = (book.title.clone(), book.source.clone());
        self.supplied.entry(key.clone()).or_default();

        let mut errors = BTreeSet::new();
        for section in &book.sections {
            let heading = tighten_dashes(&section.heading);
            if section.paragraphs.is_empty() {
                errors.insert(heading);
                continue;
            }
            let id = ChapterId::new(book.title.clone(), heading.as_str());
            let idx = match self.index.get(&id).copied() {
                Some(idx) => idx,
                None => {
                    let atoms = match self.atoms_for(&id, raw) {
                        Ok(atoms) => atoms,
                        Err(err) => {
                            debug!("{}: {err}", book.source);
                            errors.insert(heading);
                            continue;
                        }
                    };
                    let text = raw.text_for(&atoms);
                    if self.register(id.clone(), text, atoms) == Registration::EmptyText {
                        errors.insert(heading);
                        continue;
                    }
                    self.entries.len() - 1
                }
            };

            let entry = &mut self.entries[idx];
            if entry.summaries.iter().any(|f| f.source == book.source) {
                warn!("{id}: second {} summary dropped", book.source);
                continue;
            }
            entry.summaries.push(SummaryFragment::new(
                book.source.clone(),
                section.paragraphs.clone(),
                section.link.as_str(),
            ));
            if let Some(supplied) = self.supplied.get_mut(&key) {
                supplied.insert(id.section, idx);
            }
        }

        let expected = errors.is_empty()
            || self
                .corrections
                .is_expected_error(&book.title, &book.source, &errors);
        let result = BookErrors {
            title: book.title.clone(),
            provider: book.source.clone(),
            sections: errors,
            expected,
        };
        if result.is_unexpected() {
            warn!(
                "{}: {} sections without raw text: {:?}",
                book.title, book.source, result.sections
            );
            debug!("{}: raw sections {:?}", book.title, raw.section_ids().collect::<Vec<_>>());
            self.halted.insert(key);
        }
        Ok(result)
    }

    fn atoms_for(&mut self, id: &ChapterId, raw: &RawBook) -> Result<Vec<SectionId>, ExpandError> {
        if let Some(atoms) = self.expanded.get(id) {
            return Ok(atoms.clone());
        }
        let atoms = if raw.contains(id.section.as_str()) {
            vec![id.section.clone()]
        } else {
            let known = raw.atomic_sections();
            SectionExpander::new(&known, self.corrections.book(&id.title)).expand(id.section.as_str())?
        };
        self.expanded.insert(id.clone(), atoms.clone());
        Ok(atoms)
    }

    /// Synthesize multi-section summaries from single-section ones.
    /// Returns the number of fragments added; running it again adds none.
    pub fn compose(&mut self) -> Result<usize, AlignError> {
        let library = self.library;
        let mut atomic: HashMap<BookTitle, AtomicSections> = HashMap::new();
        let mut added = 0;

        for idx in 0..self.entries.len() {
            if self.entries[idx].atoms.len() < 2 {
                continue;
            }
            let title = self.entries[idx].id.title.clone();
            let Some(book) = library.get(&title) else {
                continue;
            };
            let atoms = atomic
                .entry(title.clone())
                .or_insert_with(|| book.atomic_sections());

            for provider in self.providers.clone() {
                let key = (title.clone(), provider.clone());
                if self.halted.contains(&key) {
                    continue;
                }
                let Some(supplied) = self.supplied.get(&key) else {
                    continue;
                };
                let entry = &self.entries[idx];
                if supplied.is_empty()
                    || supplied.contains_key(entry.id.section.as_str())
                    || entry.summaries.iter().any(|f| f.source == provider)
                {
                    continue;
                }
                match self.synthesize(idx, &provider, supplied, atoms)? {
                    Some(fragment) => {
                        self.entries[idx].summaries.push(fragment);
                        added += 1;
                    }
                    None => debug!("{}: {provider} pieces do not cover it exactly", self.entries[idx].id),
                }
            }
        }
        Ok(added)
    }

    /// Greedy longest match over the target's atoms.
    fn synthesize(
        &self,
        idx: usize,
        provider: &Provider,
        supplied: &HashMap<SectionId, usize>,
        atoms: &AtomicSections,
    ) -> Result<Option<SummaryFragment>, AlignError> {
        let target = &self.entries[idx];
        let mut wanted: Coverage = bitvec![usize, Lsb0; 0; atoms.len()];
        for atom in &target.atoms {
            let Some(pos) = atoms.position(atom.as_str()) else {
                return Ok(None);
            };
            wanted.set(pos, true);
        }
        let Some(last) = target.atoms.last().and_then(|atom| atoms.position(atom.as_str())) else {
            return Ok(None);
        };

        let mut covered: Coverage = bitvec![usize, Lsb0; 0; atoms.len()];
        let mut text = Vec::new();
        let mut links = Vec::new();
        let mut i = 0;
        while i < target.atoms.len() {
            let chapter = target.atoms[i].as_str();
            let longest = (i + 1..target.atoms.len()).rev().find_map(|j| {
                let candidate = format!("{chapter}-{}", target.atoms[j].last_word());
                supplied.get(candidate.as_str()).map(|piece| (*piece, j + 1))
            });
            let (piece, next) = match longest {
                Some(found) => found,
                None => {
                    let lower = chapter.to_lowercase();
                    match supplied.get(lower.as_str()).or_else(|| supplied.get(chapter)) {
                        Some(piece) => (*piece, i + 1),
                        None => break,
                    }
                }
            };

            let piece = &self.entries[piece];
            let mut positions = Vec::with_capacity(piece.atoms.len());
            for atom in &piece.atoms {
                let Some(pos) = atoms.position(atom.as_str()) else {
                    return Ok(None);
                };
                if covered[pos] {
                    return Err(AlignError::DuplicateCoverage {
                        title: target.id.title.clone(),
                        provider: provider.clone(),
                        section: target.id.section.clone(),
                        piece: piece.id.section.clone(),
                    });
                }
                positions.push(pos);
            }
            for pos in positions {
                covered.set(pos, true);
            }
            let Some(fragment) = piece
                .summaries
                .iter()
                .find(|f| &f.source == provider && !f.synthesized)
            else {
                return Ok(None);
            };
            text.extend(fragment.text.iter().cloned());
            links.extend(fragment.link.urls().into_iter().map(String::from));

            i = next;
            if covered[last] {
                break;
            }
        }

        if covered != wanted {
            return Ok(None);
        }
        Ok(Some(SummaryFragment {
            source: provider.clone(),
            text,
            link: SourceLink::Composite(links),
            synthesized: true,
        }))
    }

    /// (title, provider) pairs excluded from compose.
    pub fn halted(&self) -> impl Iterator<Item = &(BookTitle, Provider)> + '_ {
        self.halted.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary_count(&self) -> usize {
        self.entries.iter().map(|e| e.summaries.len()).sum()
    }

    pub fn get(&self, id: &ChapterId) -> Option<SectionRecord> {
        self.index.get(id).map(|idx| record(&self.entries[*idx]))
    }

    /// Records in registration order.
    pub fn records(&self) -> Vec<SectionRecord> {
        self.entries.iter().map(record).collect()
    }
}

fn record(entry: &Entry) -> SectionRecord {
    SectionRecord {
        book_title: entry.id.title.clone(),
        section_id: entry.id.section.clone(),
        raw_text: entry.raw_text.clone(),
        summaries: entry.summaries.clone(),
    }
}
