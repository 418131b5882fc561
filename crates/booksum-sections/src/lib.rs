//! Section-id normalization for book summaries.
//!
//! Every source names chapters differently: study guides write
//! `CHAPTERS XIV - XVI: The Storm`, Gutenberg texts write `CHAPTER XIV.` under
//! a `BOOK THE SECOND` heading. This crate reduces both to one addressing
//! scheme so summaries can be matched against the raw text.
//!
//! # Pieces
//! - [`TitleNormalizer`]: provider heading → canonical [`SectionId`](booksum_types::SectionId).
//! - [`HeadingClassifier`] / [`build_raw_book`]: Gutenberg headings → [`RawBook`](booksum_types::RawBook).
//! - [`SectionExpander`]: `Chapter 3-5`, `Book 2`, comma lists → atomic ids.
//! - [`numbering`]: chapter resets across containers.
//! - [`Corrections`] and [`apply_corrections`]: the per-book exception table.
//!
//! # Example
//! ```rust
//! use booksum_sections::{Corrections, NormalizeOptions, SectionExpander, TitleNormalizer};
//! use booksum_types::{AtomicSections, BookTitle, SectionId};
//!
//! # fn main() -> anyhow::Result<()> {
//! let corrections = Corrections::builtin()?;
//! let normalizer = TitleNormalizer::new(&corrections);
//! let title = BookTitle::from("Dracula");
//! let heading = normalizer.normalize("Chapters I - III", &title, NormalizeOptions::default())?;
//! assert_eq!(heading.section.as_str(), "Chapter 1-3");
//!
//! let atoms: AtomicSections = (1..=5).map(|k| SectionId::from(format!("Chapter {k}"))).collect();
//! let ids = SectionExpander::new(&atoms, corrections.book(&title)).expand(heading.section.as_str())?;
//! assert_eq!(ids.len(), 3);
//! # Ok(()) }
//! ```

pub mod corrections;
pub mod expand;
pub mod headings;
pub mod normalize;
pub mod numbering;
pub mod recipes;

pub use corrections::{BookCorrections, Correction, Corrections, ExpansionRule, ExpansionStep};
pub use expand::{ExpandError, SectionExpander};
pub use headings::{HeadingClassifier, HeadingKind, build_raw_book};
pub use normalize::{HeadingStatus, NormalizeOptions, NormalizedHeading, TitleNormalizer, tighten_dashes};
pub use numbering::{
    NumberingAnomaly, NumberingReport, UnitQualifier, analyze_numbering, chapter_resets, flatten_qualifiers,
};
pub use recipes::{CorrectionError, RecipeContext, Section, apply_corrections};
