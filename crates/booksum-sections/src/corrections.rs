//! Per-book exception table: title aliases, typo fix-ups, expected error
//! sections and the correction recipes applied to raw and summary sections.
//!
//! The table is plain JSON so new irregular books are handled by editing data,
//! not code. A curated table ships with the crate (see [`Corrections::builtin`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use booksum_types::{BookTitle, Provider, Unit};
use serde::{Deserialize, Serialize};
use tracing::info;

const BUILTIN: &str = include_str!("../data/corrections.json");

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Corrections {
    pub typo_fixups: Vec<TypoFixup>,
    pub title_aliases: Vec<TitleAlias>,
    pub excluded_titles: BTreeSet<BookTitle>,
    pub expected_errors: Vec<ExpectedErrors>,
    pub books: BTreeMap<BookTitle, BookCorrections>,
}

/// Literal substitution applied to every summary heading before numerals
/// are parsed (`IXX` → `XIX`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypoFixup {
    pub from: String,
    pub to: String,
}

/// Maps variant spellings of a title to the canonical one.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TitleAlias {
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub equals_ignore_case: Option<String>,
    pub canonical: BookTitle,
}

impl TitleAlias {
    pub fn matches(&self, title: &str) -> bool {
        if let Some(exact) = &self.equals_ignore_case
            && exact.to_lowercase() == title.to_lowercase()
        {
            return true;
        }
        !self.contains.is_empty() && self.contains.iter().all(|part| title.contains(part.as_str()))
    }
}

/// Section headings a provider is known to carry without raw text.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedErrors {
    pub title: BookTitle,
    pub provider: Provider,
    pub sections: BTreeSet<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookCorrections {
    /// Summary headings returned verbatim by the normalizer.
    pub passthrough: Vec<String>,
    /// Plays whose acts are sections in their own right.
    pub act_only: bool,
    /// Raw-text headings accepted as sections without a unit keyword.
    pub named_chapters: Vec<String>,
    /// Substitute atomic ids tried when an expanded id is unknown.
    pub aliases: BTreeMap<String, String>,
    /// Recipes applied to the raw text after heading classification.
    pub raw: Vec<Correction>,
    pub expansions: Vec<ExpansionRule>,
    pub providers: BTreeMap<Provider, ProviderCorrections>,
}

impl BookCorrections {
    pub fn expansion(&self, section: &str) -> Option<&ExpansionRule> {
        self.expansions.iter().find(|rule| rule.section == section)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderCorrections {
    /// Recipes over the cleaned, not yet normalized headings.
    pub headings: Vec<Correction>,
    /// Recipes over normalized section ids.
    pub sections: Vec<Correction>,
    /// Whether `Book the Third` style ordinals become digits.
    pub ordinals: bool,
}

impl Default for ProviderCorrections {
    fn default() -> Self {
        Self {
            headings: Vec::new(),
            sections: Vec::new(),
            ordinals: true,
        }
    }
}

/// Book-specific rewrite of one compressed section id.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpansionRule {
    pub section: String,
    pub steps: Vec<ExpansionStep>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStep {
    /// Emit the id as-is.
    Literal(String),
    /// Expand the id again, consulting the rules first.
    Expand(String),
}

/// A single edit over an ordered list of sections.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Correction {
    Rename {
        from: String,
        to: String,
    },
    Drop {
        ids: Vec<String>,
    },
    DropContaining {
        pattern: String,
    },
    KeepPrefixes {
        prefixes: Vec<String>,
    },
    /// Substring replacement in every id.
    Replace {
        from: String,
        to: String,
    },
    /// Drop everything after `after`.
    Truncate {
        after: String,
    },
    /// Concatenate `from` (in that order) into one section named `into`.
    Merge {
        into: String,
        from: Vec<String>,
    },
    /// Merge consecutive sections sharing the id prefix before `separator`.
    MergeRuns {
        separator: String,
    },
    /// Cut one section's paragraphs at the given indices.
    Split {
        id: String,
        into: Vec<String>,
        at: Vec<usize>,
    },
    /// Rename several sections at once; swaps are allowed.
    Resplit {
        mapping: BTreeMap<String, String>,
    },
    /// `"<prefix> N"` for `first <= N <= last` becomes `"<into> N+offset"`.
    Renumber {
        prefix: String,
        first: u32,
        last: u32,
        into: String,
        #[serde(default)]
        offset: i64,
    },
    RelabelUnit {
        from: Unit,
        to: Unit,
    },
    Qualify {
        container: Unit,
    },
    Flatten {
        unit: Unit,
    },
    Enumerate {
        unit: Unit,
        #[serde(default = "one")]
        start: u32,
    },
}

fn one() -> u32 {
    1
}

impl Corrections {
    /// Load a table from disk and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read corrections {}", path.display()))?;
        let table = Self::from_json(&text)
            .with_context(|| format!("parse corrections {}", path.display()))?;
        info!(
            "loaded corrections for {} books from {}",
            table.books.len(),
            path.display()
        );
        Ok(table)
    }

    /// The table shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN).context("parse built-in corrections")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    /// Canonical titles must map to themselves.
    pub fn validate(&self) -> Result<()> {
        for alias in &self.title_aliases {
            let resolved = self.canonical_title(alias.canonical.as_str());
            if resolved != alias.canonical {
                bail!(
                    "title alias for {:?} is not idempotent: it resolves to {:?}",
                    alias.canonical.as_str(),
                    resolved.as_str()
                );
            }
        }
        for (title, book) in &self.books {
            for rule in &book.expansions {
                if rule.steps.is_empty() {
                    bail!("{title}: expansion for {:?} has no steps", rule.section);
                }
            }
        }
        Ok(())
    }

    /// First matching alias wins; unmatched titles pass through.
    pub fn canonical_title(&self, title: &str) -> BookTitle {
        self.title_aliases
            .iter()
            .find(|alias| alias.matches(title))
            .map(|alias| alias.canonical.clone())
            .unwrap_or_else(|| BookTitle::from(title))
    }

    pub fn is_excluded(&self, title: &BookTitle) -> bool {
        self.excluded_titles.contains(title)
    }

    /// The error set must match an allow-listed set exactly.
    pub fn is_expected_error(
        &self,
        title: &BookTitle,
        provider: &Provider,
        sections: &BTreeSet<String>,
    ) -> bool {
        self.expected_errors.iter().any(|expected| {
            &expected.title == title && &expected.provider == provider && &expected.sections == sections
        })
    }

    pub fn book(&self, title: &BookTitle) -> Option<&BookCorrections> {
        self.books.get(title)
    }

    pub fn provider(&self, title: &BookTitle, provider: &Provider) -> Option<&ProviderCorrections> {
        self.book(title)?.providers.get(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let table = Corrections::builtin().unwrap();
        assert!(!table.title_aliases.is_empty());
        assert!(table.book(&BookTitle::from("Middlemarch")).is_some());
    }

    #[test]
    fn aliases_resolve_first_match() {
        let table = Corrections::builtin().unwrap();
        assert_eq!(
            table.canonical_title("Adventures of Huckleberry Finn").as_str(),
            "The Adventures of Huckleberry Finn"
        );
        assert_eq!(table.canonical_title("Moby-Dick").as_str(), "Moby Dick");
        assert_eq!(table.canonical_title("THE DEERSLAYER").as_str(), "The Deerslayer");
        assert_eq!(table.canonical_title("Emma").as_str(), "Emma");
    }

    #[test]
    fn rejects_non_idempotent_alias() {
        let json = r#"{
            "title_aliases": [
                {"contains": ["Sawyer"], "canonical": "The Adventures of Tom Sawyer"},
                {"contains": ["Abroad"], "canonical": "Tom Sawyer Abroad"}
            ]
        }"#;
        let err = Corrections::from_json(json).unwrap_err();
        assert!(err.to_string().contains("not idempotent"), "{err}");
    }

    #[test]
    fn expected_errors_compare_whole_sets() {
        let table = Corrections::builtin().unwrap();
        let title = BookTitle::from("Frankenstein");
        let provider = Provider::from("cliffsnotes");
        let both: BTreeSet<String> = ["Introduction-the 1831 Edition", "Preface-the 1817 Edition"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(table.is_expected_error(&title, &provider, &both));
        let one: BTreeSet<String> = ["Preface-the 1817 Edition".to_string()].into();
        assert!(!table.is_expected_error(&title, &provider, &one));
    }

    #[test]
    fn correction_ops_are_tagged() {
        let op: Correction =
            serde_json::from_str(r#"{"op": "relabel_unit", "from": "Chapter", "to": "Part"}"#).unwrap();
        assert_eq!(
            op,
            Correction::RelabelUnit {
                from: Unit::Chapter,
                to: Unit::Part
            }
        );
        let op: Correction = serde_json::from_str(r#"{"op": "enumerate", "unit": "Chapter"}"#).unwrap();
        assert_eq!(
            op,
            Correction::Enumerate {
                unit: Unit::Chapter,
                start: 1
            }
        );
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrections.json");
        fs::write(&path, r#"{"excluded_titles": ["The Moonstone"]}"#).unwrap();
        let table = Corrections::load(&path).unwrap();
        assert!(table.is_excluded(&BookTitle::from("The Moonstone")));
        assert!(Corrections::load(dir.path().join("missing.json")).is_err());
    }
}
