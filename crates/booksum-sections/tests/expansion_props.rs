//! Range expansion and normalization properties over generated books.

use booksum_numerals::int_to_roman;
use booksum_sections::{ExpandError, NormalizeOptions, SectionExpander, TitleNormalizer};
use booksum_types::{AtomicSections, BookTitle, SectionId};
use proptest::prelude::*;

fn book(n: u32, missing: Option<u32>) -> AtomicSections {
    (1..=n)
        .filter(|k| Some(*k) != missing)
        .map(|k| SectionId::from(format!("Chapter {k}")))
        .collect()
}

#[test]
fn ranges_expand_to_contiguous_chapters() {
    proptest!(|(n in 1u32..60, a in 1u32..60, len in 0u32..20)| {
        let a = a.min(n);
        let b = (a + len).min(n);
        let atoms = book(n, None);
        let ids = SectionExpander::new(&atoms, None)
            .expand(&format!("Chapter {a}-{b}"))
            .unwrap();
        let got: Vec<String> = ids.into_iter().map(SectionId::into_string).collect();
        let want: Vec<String> = (a..=b).map(|k| format!("Chapter {k}")).collect();
        prop_assert_eq!(got, want);
    });
}

#[test]
fn missing_chapter_is_a_gap() {
    proptest!(|(n in 2u32..60, a in 1u32..60, len in 1u32..20, pick in 0u32..20)| {
        let a = a.min(n - 1);
        let b = (a + len).min(n);
        let hole = a + pick % (b - a + 1);
        let atoms = book(n, Some(hole));
        let section = format!("Chapter {a}-{b}");
        let err = SectionExpander::new(&atoms, None).expand(&section).unwrap_err();
        prop_assert_eq!(
            err,
            ExpandError::SequenceGap { section, missing: format!("Chapter {hole}") }
        );
    });
}

#[test]
fn roman_chapter_headings_normalize_once() {
    let normalizer = TitleNormalizer::default();
    let title = BookTitle::from("Generated");
    proptest!(|(start in 1u32..200, len in 0u32..5, upper in any::<bool>())| {
        let keyword = if upper { "CHAPTERS" } else { "Chapters" };
        let raw = format!(
            "{keyword} {} - {}",
            int_to_roman(start).unwrap(),
            int_to_roman(start + len).unwrap()
        );
        let once = normalizer.normalize(&raw, &title, NormalizeOptions::default()).unwrap();
        prop_assert_eq!(once.section.as_str(), format!("Chapter {start}-{}", start + len));
        let twice = normalizer
            .normalize(once.section.as_str(), &title, NormalizeOptions::default())
            .unwrap();
        prop_assert_eq!(once, twice);
    });
}
