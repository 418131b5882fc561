//! Executor for [`Correction`] recipes.
//!
//! Raw-text sections and provider summary sections go through the same
//! interpreter; the [`Section`] trait is the only thing it needs from them.

use std::collections::{BTreeSet, HashSet};

use booksum_numerals::NumeralError;
use booksum_types::{BookTitle, ProviderSection, RawSection, SectionId, Unit};
use thiserror::Error;
use tracing::debug;

use crate::corrections::Correction;
use crate::normalize::{NormalizeOptions, TitleNormalizer};
use crate::numbering::{UnitQualifier, renumber_sections};

/// An ordered, named block of paragraphs.
pub trait Section: Clone {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn paragraphs(&self) -> &[String];
    fn paragraphs_mut(&mut self) -> &mut Vec<String>;
}

impl Section for RawSection {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn set_id(&mut self, id: String) {
        self.id = SectionId::from(id);
    }

    fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    fn paragraphs_mut(&mut self) -> &mut Vec<String> {
        &mut self.paragraphs
    }
}

impl Section for ProviderSection {
    fn id(&self) -> &str {
        &self.heading
    }

    fn set_id(&mut self, id: String) {
        self.heading = id;
    }

    fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    fn paragraphs_mut(&mut self) -> &mut Vec<String> {
        &mut self.paragraphs
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrectionError {
    #[error("{op}: no section {id:?}")]
    MissingSection { op: &'static str, id: String },
    #[error("split of {id:?}: {reason}")]
    InvalidSplit { id: String, reason: String },
    #[error("renumbering {id:?} gives {value}")]
    InvalidRenumber { id: String, value: i64 },
    #[error(transparent)]
    Numeral(#[from] NumeralError),
}

/// What a recipe may need besides the sections themselves.
#[derive(Clone, Copy, Debug)]
pub struct RecipeContext<'a> {
    pub title: &'a BookTitle,
    pub normalizer: &'a TitleNormalizer,
    pub options: NormalizeOptions,
}

/// Apply `recipes` in order.
pub fn apply_corrections<S: Section>(
    sections: Vec<S>,
    recipes: &[Correction],
    ctx: &RecipeContext<'_>,
) -> Result<Vec<S>, CorrectionError> {
    recipes.iter().try_fold(sections, |sections, recipe| {
        debug!("{}: applying {recipe:?}", ctx.title);
        apply_one(sections, recipe, ctx)
    })
}

fn apply_one<S: Section>(
    mut sections: Vec<S>,
    recipe: &Correction,
    ctx: &RecipeContext<'_>,
) -> Result<Vec<S>, CorrectionError> {
    match recipe {
        Correction::Rename { from, to } => {
            let idx = position(&sections, from, "rename")?;
            sections[idx].set_id(to.clone());
            Ok(sections)
        }
        Correction::Drop { ids } => {
            for id in ids {
                position(&sections, id, "drop")?;
            }
            sections.retain(|s| !ids.iter().any(|id| id == s.id()));
            Ok(sections)
        }
        Correction::DropContaining { pattern } => {
            sections.retain(|s| !s.id().contains(pattern.as_str()));
            Ok(sections)
        }
        Correction::KeepPrefixes { prefixes } => {
            sections.retain(|s| prefixes.iter().any(|p| s.id().starts_with(p.as_str())));
            Ok(sections)
        }
        Correction::Replace { from, to } => {
            for section in &mut sections {
                if section.id().contains(from.as_str()) {
                    let id = section.id().replace(from.as_str(), to);
                    section.set_id(id);
                }
            }
            Ok(sections)
        }
        Correction::Truncate { after } => {
            let idx = position(&sections, after, "truncate")?;
            sections.truncate(idx + 1);
            Ok(sections)
        }
        Correction::Merge { into, from } => merge(sections, into, from),
        Correction::MergeRuns { separator } => Ok(merge_runs(sections, separator)),
        Correction::Split { id, into, at } => split(sections, id, into, at),
        Correction::Resplit { mapping } => {
            for from in mapping.keys() {
                position(&sections, from, "resplit")?;
            }
            for section in &mut sections {
                if let Some(to) = mapping.get(section.id()) {
                    section.set_id(to.clone());
                }
            }
            Ok(sections)
        }
        Correction::Renumber {
            prefix,
            first,
            last,
            into,
            offset,
        } => {
            for section in &mut sections {
                let Some(number) = section
                    .id()
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_prefix(' '))
                    .and_then(|n| n.parse::<u32>().ok())
                else {
                    continue;
                };
                if !(*first..=*last).contains(&number) {
                    continue;
                }
                let value = i64::from(number) + offset;
                if value < 1 {
                    return Err(CorrectionError::InvalidRenumber {
                        id: section.id().to_string(),
                        value,
                    });
                }
                section.set_id(format!("{into} {value}"));
            }
            Ok(sections)
        }
        Correction::RelabelUnit { from, to } => {
            for section in &mut sections {
                if let Some(id) = relabel(section.id(), *from, *to) {
                    section.set_id(id);
                }
            }
            Ok(sections)
        }
        Correction::Qualify { container } => {
            let mut qualifier = UnitQualifier::new(*container);
            let mut out = Vec::with_capacity(sections.len());
            for mut section in sections {
                if let Some(id) =
                    qualifier.qualify(section.id(), ctx.normalizer, ctx.title, ctx.options)?
                {
                    section.set_id(id);
                    out.push(section);
                }
            }
            Ok(out)
        }
        Correction::Flatten { unit } => Ok(renumber_sections(sections, *unit)),
        Correction::Enumerate { unit, start } => {
            for (offset, section) in sections.iter_mut().enumerate() {
                section.set_id(format!("{unit} {}", *start as usize + offset));
            }
            Ok(sections)
        }
    }
}

fn position<S: Section>(sections: &[S], id: &str, op: &'static str) -> Result<usize, CorrectionError> {
    sections
        .iter()
        .position(|s| s.id() == id)
        .ok_or_else(|| CorrectionError::MissingSection {
            op,
            id: id.to_string(),
        })
}

fn merge<S: Section>(sections: Vec<S>, into: &str, from: &[String]) -> Result<Vec<S>, CorrectionError> {
    let Some(first) = from.first() else {
        return Ok(sections);
    };
    let mut paragraphs = Vec::new();
    for id in from {
        let idx = position(&sections, id, "merge")?;
        paragraphs.extend(sections[idx].paragraphs().iter().cloned());
    }
    let anchor = position(&sections, first, "merge")?;
    let mut merged = sections[anchor].clone();
    merged.set_id(into.to_string());
    *merged.paragraphs_mut() = paragraphs;

    let absorbed: HashSet<&str> = from.iter().map(String::as_str).collect();
    let mut out = Vec::with_capacity(sections.len());
    let mut merged = Some(merged);
    for (idx, section) in sections.iter().enumerate() {
        if idx == anchor {
            out.extend(merged.take());
        } else if !absorbed.contains(section.id()) {
            out.push(section.clone());
        }
    }
    Ok(out)
}

fn merge_runs<S: Section>(sections: Vec<S>, separator: &str) -> Vec<S> {
    let mut out: Vec<S> = Vec::with_capacity(sections.len());
    let mut last_key: Option<String> = None;
    for mut section in sections {
        let key = section
            .id()
            .split_once(separator)
            .map_or(section.id(), |(head, _)| head)
            .to_string();
        if last_key.as_deref() == Some(key.as_str())
            && let Some(previous) = out.last_mut()
        {
            previous
                .paragraphs_mut()
                .extend(section.paragraphs().iter().cloned());
            continue;
        }
        section.set_id(key.clone());
        last_key = Some(key);
        out.push(section);
    }
    out
}

fn split<S: Section>(
    mut sections: Vec<S>,
    id: &str,
    into: &[String],
    at: &[usize],
) -> Result<Vec<S>, CorrectionError> {
    let idx = position(&sections, id, "split")?;
    let invalid = |reason: &str| CorrectionError::InvalidSplit {
        id: id.to_string(),
        reason: reason.to_string(),
    };
    if into.len() != at.len() + 1 {
        return Err(invalid("needs one more target id than cut points"));
    }
    let total = sections[idx].paragraphs().len();
    let mut bounds = Vec::with_capacity(at.len() + 2);
    bounds.push(0);
    bounds.extend_from_slice(at);
    bounds.push(total);
    if bounds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("cut points must be increasing and inside the section"));
    }

    let source = sections.remove(idx);
    let pieces: Vec<S> = into
        .iter()
        .zip(bounds.windows(2))
        .map(|(name, w)| {
            let mut piece = source.clone();
            piece.set_id(name.clone());
            *piece.paragraphs_mut() = source.paragraphs()[w[0]..w[1]].to_vec();
            piece
        })
        .collect();
    sections.splice(idx..idx, pieces);
    Ok(sections)
}

fn relabel(id: &str, from: Unit, to: Unit) -> Option<String> {
    let (qualifier, rest) = match id.split_once(": ") {
        Some((q, rest)) => (Some(q), rest),
        None => (None, id),
    };
    let (word, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    if !word.eq_ignore_ascii_case(from.keyword()) {
        return None;
    }
    let relabeled = if tail.is_empty() {
        to.keyword().to_string()
    } else {
        format!("{} {tail}", to.keyword())
    };
    Some(match qualifier {
        Some(q) => format!("{q}: {relabeled}"),
        None => relabeled,
    })
}

/// Ids present more than once, in first-seen order.
pub fn duplicate_ids<S: Section>(sections: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = BTreeSet::new();
    let mut out = Vec::new();
    for section in sections {
        if !seen.insert(section.id()) && reported.insert(section.id()) {
            out.push(section.id().to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn raw(ids: &[&str]) -> Vec<RawSection> {
        ids.iter()
            .map(|id| RawSection::new(*id, vec![format!("{id} text")]))
            .collect()
    }

    fn ids(sections: &[RawSection]) -> Vec<&str> {
        sections.iter().map(|s| s.id.as_str()).collect()
    }

    fn run(sections: Vec<RawSection>, recipe: Correction) -> Result<Vec<RawSection>, CorrectionError> {
        let normalizer = TitleNormalizer::default();
        let title = BookTitle::from("Test");
        let ctx = RecipeContext {
            title: &title,
            normalizer: &normalizer,
            options: NormalizeOptions::default(),
        };
        apply_corrections(sections, &[recipe], &ctx)
    }

    #[test]
    fn rename_requires_existing_section() {
        let out = run(
            raw(&["Chapter 1", "Chapter the Last"]),
            Correction::Rename {
                from: "Chapter the Last".into(),
                to: "Chapter 2".into(),
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 1", "Chapter 2"]);

        let err = run(
            raw(&["Chapter 1"]),
            Correction::Rename {
                from: "Chapter 9".into(),
                to: "Chapter 2".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CorrectionError::MissingSection { op: "rename", .. }));
    }

    #[test]
    fn drop_variants() {
        let sections = raw(&["Argument 1", "Book 1", "Argument 2", "Book 2"]);
        let out = run(
            sections.clone(),
            Correction::DropContaining {
                pattern: "Argument".into(),
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Book 1", "Book 2"]);

        let out = run(
            sections,
            Correction::KeepPrefixes {
                prefixes: vec!["Book".into()],
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Book 1", "Book 2"]);
    }

    #[test]
    fn truncate_keeps_through_marker() {
        let out = run(
            raw(&["Chapter 1", "Chapter 2", "Footnotes"]),
            Correction::Truncate {
                after: "Chapter 2".into(),
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 1", "Chapter 2"]);
    }

    #[test]
    fn merge_concatenates_in_listed_order() {
        let out = run(
            raw(&["Chapter 1", "Chapter 2a", "Chapter 2b", "Chapter 3"]),
            Correction::Merge {
                into: "Chapter 2".into(),
                from: vec!["Chapter 2a".into(), "Chapter 2b".into()],
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 1", "Chapter 2", "Chapter 3"]);
        assert_eq!(out[1].paragraphs, ["Chapter 2a text", "Chapter 2b text"]);
    }

    #[test]
    fn merge_runs_groups_by_prefix() {
        let out = run(
            raw(&["Chapter 1: Morning", "Chapter 1: Evening", "Chapter 2: Night"]),
            Correction::MergeRuns {
                separator: ": ".into(),
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 1", "Chapter 2"]);
        assert_eq!(out[0].paragraphs.len(), 2);
    }

    #[test]
    fn split_cuts_paragraphs() {
        let sections = vec![RawSection::new(
            "Chapter 1-2",
            vec!["a".into(), "b".into(), "c".into()],
        )];
        let out = run(
            sections.clone(),
            Correction::Split {
                id: "Chapter 1-2".into(),
                into: vec!["Chapter 1".into(), "Chapter 2".into()],
                at: vec![2],
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 1", "Chapter 2"]);
        assert_eq!(out[1].paragraphs, ["c"]);

        let err = run(
            sections,
            Correction::Split {
                id: "Chapter 1-2".into(),
                into: vec!["Chapter 1".into(), "Chapter 2".into()],
                at: vec![3],
            },
        )
        .unwrap_err();
        assert!(matches!(err, CorrectionError::InvalidSplit { .. }));
    }

    #[test]
    fn resplit_swaps() {
        let mapping = BTreeMap::from([
            ("Chapter 1".to_string(), "Chapter 2".to_string()),
            ("Chapter 2".to_string(), "Chapter 1".to_string()),
        ]);
        let out = run(raw(&["Chapter 1", "Chapter 2"]), Correction::Resplit { mapping }).unwrap();
        assert_eq!(ids(&out), ["Chapter 2", "Chapter 1"]);
        assert_eq!(out[0].paragraphs, ["Chapter 1 text"]);
    }

    #[test]
    fn renumber_shifts_into_container() {
        let out = run(
            raw(&["Chapter 15", "Chapter 16", "Chapter 17"]),
            Correction::Renumber {
                prefix: "Chapter".into(),
                first: 16,
                last: 31,
                into: "Book 2: Chapter".into(),
                offset: -15,
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 15", "Book 2: Chapter 1", "Book 2: Chapter 2"]);
    }

    #[test]
    fn relabel_unit_keeps_qualifier() {
        let out = run(
            raw(&["Chapter 1", "Volume 1: Chapter 2", "Preface"]),
            Correction::RelabelUnit {
                from: Unit::Chapter,
                to: Unit::Part,
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Part 1", "Volume 1: Part 2", "Preface"]);
    }

    #[test]
    fn flatten_and_enumerate() {
        let out = run(
            raw(&["Volume 1: Chapter 1", "Volume 1: Chapter 2", "Volume 2: Chapter 1"]),
            Correction::Flatten { unit: Unit::Chapter },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 1", "Chapter 2", "Chapter 3"]);

        let out = run(
            raw(&["Hands", "Paper Pills"]),
            Correction::Enumerate {
                unit: Unit::Chapter,
                start: 1,
            },
        )
        .unwrap();
        assert_eq!(ids(&out), ["Chapter 1", "Chapter 2"]);
    }

    #[test]
    fn provider_sections_share_the_executor() {
        let sections = vec![
            ProviderSection::new("Summary of PART ONE", vec![], "u0"),
            ProviderSection::new("Chapter I", vec!["s1".into()], "u1"),
            ProviderSection::new("Chapter I", vec!["s2".into()], "u2"),
        ];
        let normalizer = TitleNormalizer::default();
        let title = BookTitle::from("Test");
        let ctx = RecipeContext {
            title: &title,
            normalizer: &normalizer,
            options: NormalizeOptions::default(),
        };
        let out = apply_corrections(
            sections,
            &[Correction::Qualify {
                container: Unit::Part,
            }],
            &ctx,
        )
        .unwrap();
        let headings: Vec<&str> = out.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, ["Part 1: Chapter 1", "Part 2: Chapter 1"]);
        assert_eq!(out[1].link, "u2");
    }

    #[test]
    fn reports_duplicates_once() {
        let sections = raw(&["Chapter 1", "Chapter 1", "Chapter 2", "Chapter 1"]);
        assert_eq!(duplicate_ids(&sections), ["Chapter 1"]);
    }
}
