//! Chapter numbering across containers.
//!
//! Some books restart chapter numbers in every book or part
//! (`Book 2: Chapter 1`), others keep counting (`Book 2: Chapter 13`).
//! Summaries rarely agree with the raw text on which scheme is used, so the
//! scheme is detected and ids are rewritten into one of the two shapes.

use booksum_numerals::NumeralError;
use booksum_types::{BookTitle, RawBook, RawSection, SectionId, Unit};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::normalize::{NormalizeOptions, TitleNormalizer};
use crate::recipes::Section;

static RE_CHAPTER_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Chapter|CHAPTER) \d+").expect("chapter start pattern compiles"));

static RE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Part \d+").expect("part pattern compiles"));

/// A chapter number that neither continues the previous one nor restarts
/// at 1 in a new container.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NumberingAnomaly {
    pub section: SectionId,
    pub expected: u32,
    pub found: Option<u32>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NumberingReport {
    /// Ids where numbering restarts at 1 under a new container.
    pub resets: Vec<SectionId>,
    pub anomalies: Vec<NumberingAnomaly>,
}

impl NumberingReport {
    pub fn is_continuous(&self) -> bool {
        self.resets.is_empty() && self.anomalies.is_empty()
    }
}

/// Walk ids in document order and classify every break in the numbering.
pub fn analyze_numbering<'a, I>(ids: I) -> NumberingReport
where
    I: IntoIterator<Item = &'a SectionId>,
{
    let mut report = NumberingReport::default();
    let mut previous = 0u32;
    let mut container: Option<&str> = None;
    for id in ids {
        let (qualifier, _) = id.split_qualifier();
        let expected = previous.saturating_add(1);
        let Some(number) = id.trailing_number() else {
            report.anomalies.push(NumberingAnomaly {
                section: id.clone(),
                expected,
                found: None,
            });
            continue;
        };
        if previous.checked_add(1) == Some(number) {
            // continuous
        } else if number == 1 && qualifier.is_some() && qualifier != container {
            report.resets.push(id.clone());
        } else {
            report.anomalies.push(NumberingAnomaly {
                section: id.clone(),
                expected,
                found: Some(number),
            });
        }
        previous = number;
        container = qualifier;
    }
    report
}

/// True when the ids do not count 1, 2, 3, ... without interruption.
pub fn chapter_resets<'a, I>(ids: I) -> bool
where
    I: IntoIterator<Item = &'a SectionId>,
{
    !analyze_numbering(ids).is_continuous()
}

/// Drop container qualifiers when chapter numbers never restart.
///
/// `Book 1: Chapter 12`, `Book 2: Chapter 13` become `Chapter 12`,
/// `Chapter 13`. If two ids collapse to the same name the first is kept.
/// Breaks that are neither a continuation nor a restart are logged and
/// returned; the qualifiers are kept in that case.
pub fn flatten_qualifiers(book: RawBook) -> (RawBook, Vec<NumberingAnomaly>) {
    let title = book.title().clone();
    let numbered: Vec<&SectionId> = book
        .section_ids()
        .filter(|id| id.is_qualified() && id.trailing_number().is_some())
        .collect();
    if numbered.is_empty() {
        return (book, Vec::new());
    }
    let report = analyze_numbering(numbered);
    for anomaly in &report.anomalies {
        match anomaly.found {
            Some(found) => warn!(
                "{title}: {} breaks the chapter numbering, expected {} but found {found}",
                anomaly.section, anomaly.expected
            ),
            None => warn!("{title}: {} has no chapter number", anomaly.section),
        }
    }
    if !report.is_continuous() {
        return (book, report.anomalies);
    }

    let mut flat = RawBook::new(title.clone());
    for section in book.into_sections() {
        let original = section.id;
        let id = original.unqualified().to_string();
        if !flat.insert(RawSection::new(id.as_str(), section.paragraphs)) {
            warn!("{title}: {original} collides with {id} after dropping its container");
        }
    }
    (flat, Vec::new())
}

/// Replace container-qualified numbered ids by one continuous `"<unit> k"`
/// sequence; other ids are left alone.
pub fn renumber_continuously(book: RawBook, unit: Unit) -> RawBook {
    let title = book.title().clone();
    RawBook::from_sections(title, renumber_sections(book.into_sections(), unit))
}

pub fn renumber_sections<S: Section>(mut sections: Vec<S>, unit: Unit) -> Vec<S> {
    let mut next = 1u32;
    for section in &mut sections {
        let qualified = section.id().contains(": ");
        let numbered = section
            .id()
            .rsplit(' ')
            .next()
            .is_some_and(|word| word.parse::<u32>().is_ok());
        if qualified && numbered {
            section.set_id(format!("{unit} {next}"));
            next += 1;
        }
    }
    sections
}

/// Prefixes provider headings with a container counter that advances each
/// time numbering starts over at `Chapter 1`.
#[derive(Clone, Debug)]
pub struct UnitQualifier {
    container: Unit,
    count: u32,
}

impl UnitQualifier {
    pub fn new(container: Unit) -> Self {
        Self {
            container,
            count: 0,
        }
    }

    /// `Ok(None)` means the heading should be dropped.
    pub fn qualify(
        &mut self,
        heading: &str,
        normalizer: &TitleNormalizer,
        title: &BookTitle,
        options: NormalizeOptions,
    ) -> Result<Option<String>, NumeralError> {
        if self.is_container_heading(heading) {
            return Ok(Some(heading.to_string()));
        }
        if self.is_dropped(heading) {
            return Ok(None);
        }
        let section = normalizer.normalize(heading, title, options)?.section;
        if self.opens_container(section.as_str()) {
            self.count += 1;
        }
        Ok(Some(format!("{} {}: {section}", self.container, self.count)))
    }

    fn is_container_heading(&self, heading: &str) -> bool {
        let lower = heading.to_lowercase();
        lower.starts_with(&self.container.keyword().to_lowercase())
            || (self.container == Unit::Book && lower.starts_with("epilogue"))
    }

    fn is_dropped(&self, heading: &str) -> bool {
        match self.container {
            Unit::Book => heading == "CHAPTER SUMMARIES AND NOTES",
            other => heading.contains(&other.keyword().to_uppercase()),
        }
    }

    fn opens_container(&self, section: &str) -> bool {
        let opener = RE_CHAPTER_START.find(section).or_else(|| {
            if self.container == Unit::Book {
                RE_PART.find(section)
            } else {
                None
            }
        });
        opener.is_some_and(|m| {
            m.as_str().eq_ignore_ascii_case("chapter 1") || m.as_str().eq_ignore_ascii_case("part 1")
        })
    }
}
