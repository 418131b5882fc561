//! Provider summary preparation: heading and paragraph cleanup, title
//! canonicalization, per-provider recipes, then heading normalization.

use booksum_sections::{
    CorrectionError, Corrections, NormalizeOptions, RecipeContext, TitleNormalizer,
    apply_corrections,
};
use booksum_types::{ProviderBook, ProviderSection};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

static RE_SUMMARY_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Novel )?Summary\s?(?::|,|of)?\s?").expect("summary prefix pattern compiles"));

static RE_SUMMARY_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s?Summary:?$").expect("summary suffix pattern compiles"));

static RE_SUMMARY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s?Summary:?$").expect("summary line pattern compiles"));

static RE_ANALYSIS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s?Analysis:?$").expect("analysis line pattern compiles"));

static RE_PAREN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\d+\)").expect("paren number pattern compiles"));

/// Strip `Summary` decorations from a heading. A bare `Summary` survives
/// when `preserve_summary` is set.
pub fn clean_heading(heading: &str, preserve_summary: bool) -> String {
    if preserve_summary && heading == "Summary" {
        return heading.to_string();
    }
    let cleaned = RE_SUMMARY_START.replace(heading, "");
    let mut cleaned = RE_SUMMARY_END.replace(&cleaned, "").into_owned();
    if cleaned.ends_with(':') {
        cleaned.pop();
    }
    cleaned
}

/// Drop `(12)` markers and `Summary` labels; stop at the `Analysis` label.
pub fn clean_summary(paragraphs: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(paragraphs.len());
    for paragraph in paragraphs {
        let line = RE_PAREN_NUMBER.replace_all(paragraph, "");
        if RE_SUMMARY_LINE.is_match(&line) {
            continue;
        }
        if RE_ANALYSIS_LINE.is_match(&line) {
            break;
        }
        out.push(line.into_owned());
    }
    out
}

/// Canonicalize one provider book. `Ok(None)` means the title is excluded.
/// Headings of the returned book are normalized section ids.
pub fn prepare(
    book: ProviderBook,
    corrections: &Corrections,
    normalizer: &TitleNormalizer,
) -> Result<Option<ProviderBook>, CorrectionError> {
    let title = corrections.canonical_title(book.title.as_str());
    if corrections.is_excluded(&title) {
        info!("{title}: excluded, skipping {} summaries", book.source);
        return Ok(None);
    }
    let provider = corrections.provider(&title, &book.source);
    let options = NormalizeOptions {
        ordinals: provider.is_none_or(|p| p.ordinals),
    };
    let ctx = RecipeContext {
        title: &title,
        normalizer,
        options,
    };

    let mut sections: Vec<ProviderSection> = book
        .sections
        .into_iter()
        .map(|section| ProviderSection {
            heading: clean_heading(&section.heading, false),
            paragraphs: clean_summary(&section.paragraphs),
            link: section.link,
        })
        .collect();
    if let Some(provider) = provider {
        sections = apply_corrections(sections, &provider.headings, &ctx)?;
    }

    for section in &mut sections {
        let normalized = normalizer.normalize(&section.heading, &title, options)?;
        if !normalized.is_canonical() {
            debug!("{title}: {} heading {:?} kept as is", book.source, section.heading);
        }
        section.heading = normalized.section.into_string();
    }
    if let Some(provider) = provider {
        sections = apply_corrections(sections, &provider.sections, &ctx)?;
    }

    Ok(Some(ProviderBook {
        title,
        source: book.source,
        sections,
    }))
}
