//! Alignment of provider chapter summaries with Gutenberg raw text.
//!
//! The raw texts are classified into a [`RawLibrary`] once. Every provider
//! book is then cleaned and normalized ([`provider::prepare`]) and handed to
//! the [`Aligner`], which resolves each summary heading to the atomic
//! sections it covers and attaches the summary to one
//! [`SectionRecord`](booksum_types::SectionRecord) per section id. [`Splits`] partitions
//! the records into train/val/test and [`pipeline::run`] does all of it file
//! to file.
//!
//! ```rust
//! use booksum_align::{Aligner, RawLibrary};
//! use booksum_sections::Corrections;
//! use booksum_types::{BookTitle, ChapterId, Provider, ProviderBook, ProviderSection, RawBook, RawSection};
//!
//! let library = RawLibrary::from_books([RawBook::from_sections(
//!     "Dracula",
//!     vec![
//!         RawSection::new("Chapter 1", vec!["3 May. Bistritz.".into()]),
//!         RawSection::new("Chapter 2", vec!["5 May. The Castle.".into()]),
//!     ],
//! )]);
//! let corrections = Corrections::default();
//! let mut aligner = Aligner::new(&library, &corrections);
//! let errors = aligner
//!     .add_book(&ProviderBook {
//!         title: BookTitle::from("Dracula"),
//!         source: Provider::from("gradesaver"),
//!         sections: vec![ProviderSection::new("Chapter 1 - 2", vec!["Jonathan travels.".into()], "url")],
//!     })
//!     .unwrap();
//! assert!(errors.sections.is_empty());
//! let record = aligner.get(&ChapterId::new("Dracula", "Chapter 1-2")).unwrap();
//! assert_eq!(record.raw_text.len(), 2);
//! ```

pub mod engine;
pub mod library;
pub mod pairs;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod splits;

pub use engine::{AlignError, Aligner, BookErrors, Registration};
pub use library::{RawLibrary, RawTexts};
pub use pairs::{PairDiff, pair_ids};
pub use pipeline::{Alignment, PipelineConfig, align, run};
pub use report::{BatchReport, SplitCounts};
pub use splits::{Partition, SplitError, Splits};
