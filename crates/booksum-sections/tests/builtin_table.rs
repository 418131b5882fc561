use booksum_numerals::int_to_roman;
use booksum_sections::{Corrections, SectionExpander, TitleNormalizer, build_raw_book};
use booksum_types::{AtomicSections, BookTitle, RawBook, RawHeading, SectionId};

fn heading(text: &str, paragraphs: &[&str]) -> RawHeading {
    RawHeading {
        heading: text.to_string(),
        paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
    }
}

fn build(title: &str, headings: &[RawHeading]) -> RawBook {
    let corrections = Corrections::builtin().expect("built-in table parses");
    let normalizer = TitleNormalizer::new(&corrections);
    build_raw_book(&BookTitle::from(title), headings, &corrections, &normalizer).expect("book builds")
}

fn ids(book: &RawBook) -> Vec<&str> {
    book.section_ids().map(SectionId::as_str).collect()
}

#[test]
fn huck_finn_last_chapter_is_numbered() {
    let book = build(
        "The Adventures of Huckleberry Finn",
        &[
            heading("CHAPTER I.", &["You don't know about me"]),
            heading("CHAPTER II.", &["We went tiptoeing"]),
            heading("CHAPTER THE LAST", &["The first time I catched Tom", "End of Project Gutenberg's text"]),
        ],
    );
    assert_eq!(ids(&book), ["Chapter 1", "Chapter 2", "Chapter 43"]);
    assert_eq!(book.get("Chapter 43").unwrap(), ["The first time I catched Tom".to_string()]);
}

#[test]
fn northanger_abbey_is_split_into_two_books() {
    let headings: Vec<RawHeading> = (1..=31)
        .map(|k| heading(&format!("CHAPTER {}", int_to_roman(k).unwrap()), &["text"]))
        .collect();
    let book = build("Northanger Abbey", &headings);
    assert_eq!(book.len(), 31);
    assert!(book.contains("Book 1: Chapter 15"));
    assert!(book.contains("Book 2: Chapter 16"));
    assert!(!book.contains("Chapter 16"));

    let corrections = Corrections::builtin().unwrap();
    let atoms = book.atomic_sections();
    let expanded = SectionExpander::new(&atoms, corrections.book(book.title()))
        .expand("Book 2")
        .unwrap();
    assert_eq!(expanded.len(), 16);
    assert_eq!(expanded[0].as_str(), "Book 2: Chapter 1");
}

#[test]
fn anthem_parts_become_chapters() {
    let book = build(
        "Anthem",
        &[heading("PART ONE", &["It is a sin"]), heading("PART TWO", &["Liberty 5-3000"])],
    );
    assert_eq!(ids(&book), ["Chapter 1", "Chapter 2"]);
}

#[test]
fn middlemarch_finale_rule() {
    let corrections = Corrections::builtin().unwrap();
    let title = BookTitle::from("Middlemarch");
    let mut atoms: AtomicSections = (1..=86).map(|k| SectionId::from(format!("Chapter {k}"))).collect();
    atoms.push(SectionId::from("Finale"));
    let ids = SectionExpander::new(&atoms, corrections.book(&title))
        .expand("Chapter 80-Finale")
        .unwrap();
    let got: Vec<&str> = ids.iter().map(SectionId::as_str).collect();
    assert_eq!(
        got,
        [
            "Chapter 80",
            "Chapter 81",
            "Chapter 82",
            "Chapter 83",
            "Chapter 84",
            "Chapter 85",
            "Chapter 86",
            "Finale"
        ]
    );
}

#[test]
fn excluded_titles_are_canonical() {
    let corrections = Corrections::builtin().unwrap();
    for title in &corrections.excluded_titles {
        assert_eq!(&corrections.canonical_title(title.as_str()), title, "{title}");
    }
    assert!(corrections.is_excluded(&corrections.canonical_title("The Moonstone")));
}
