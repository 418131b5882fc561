//! Conversions between Arabic integers, Roman numerals and English number
//! words, plus in-place substitution of numerals embedded in headings.
//!
//! Headings scraped from study guides and from Gutenberg spell the same
//! number many ways (`CHAPTER XIV`, `Chapter Fourteen`, `Book the First`).
//! The section normalizer rewrites all of them to Arabic digits before
//! anything else looks at the text.
//!
//! ```rust
//! use booksum_numerals::{int_to_roman, replace_number_words, replace_roman_numerals, roman_to_int};
//!
//! assert_eq!(roman_to_int("XIV").unwrap(), 14);
//! assert_eq!(int_to_roman(1994).unwrap(), "MCMXCIV");
//! assert!(roman_to_int("IIII").is_err());
//! assert_eq!(replace_roman_numerals("CHAPTER XIV").unwrap(), "CHAPTER 14");
//! assert_eq!(replace_number_words("Chapter Twenty-Three").unwrap(), "Chapter 23");
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumeralError {
    #[error("invalid roman numeral: {0:?}")]
    InvalidNumeral(String),
    #[error("{0} cannot be written as a roman numeral (valid range 1..4000)")]
    OutOfRange(u64),
    #[error("unknown number word {0:?}")]
    UnknownWord(String),
    #[error("empty number text")]
    Empty,
    #[error("number too large: {0:?}")]
    Overflow(String),
    #[error("not a number: {0:?}")]
    NotANumber(String),
}

const ROMAN_VALUES: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Upper-case roman tokens on word boundaries. Each alternative forces at
/// least one character so the empty string never matches.
static RE_ROMAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:",
        r"M{1,4}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})",
        r"|M{0,4}(?:CM|C?D|D?C{1,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})",
        r"|M{0,4}(?:CM|CD|D?C{0,3})(?:XC|X?L|L?X{1,3})(?:IX|IV|V?I{0,3})",
        r"|M{0,4}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|I?V|V?I{1,3})",
        r")\b",
    ))
    .expect("roman pattern compiles")
});

static RE_NUMBER_WORDS: Lazy<Regex> = Lazy::new(|| {
    let mut words: Vec<&str> = UNITS
        .iter()
        .chain(TENS.iter().filter(|w| !w.is_empty()))
        .chain(SCALES.iter())
        .copied()
        .collect();
    // Longest first so `seventeen` is preferred over `seven`.
    words.sort_by_key(|w| std::cmp::Reverse(w.len()));
    Regex::new(&format!(r"(?i)(?:\b(?:{})-?\b)+", words.join("|")))
        .expect("number word pattern compiles")
});

static RE_ORDINAL: Lazy<Regex> = Lazy::new(|| {
    let words: Vec<&str> = ORDINALS.iter().map(|(word, _)| *word).collect();
    Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).expect("ordinal pattern compiles")
});

static WORDS_WITH_AND: Lazy<NumberWords> = Lazy::new(|| NumberWords::new(true));
static WORDS_WITHOUT_AND: Lazy<NumberWords> = Lazy::new(|| NumberWords::new(false));

const UNITS: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [&str; 5] = ["hundred", "thousand", "million", "billion", "trillion"];

/// Ordinal words recognized in headings (`Book the Third`).
pub const ORDINALS: [(&str, u32); 12] = [
    ("First", 1),
    ("Second", 2),
    ("Third", 3),
    ("Fourth", 4),
    ("Fifth", 5),
    ("Sixth", 6),
    ("Seventh", 7),
    ("Eighth", 8),
    ("Ninth", 9),
    ("Tenth", 10),
    ("Eleventh", 11),
    ("Twelfth", 12),
];

/// Convert `1..4000` to canonical upper-case roman numerals.
pub fn int_to_roman(value: u32) -> Result<String, NumeralError> {
    if !(1..4000).contains(&value) {
        return Err(NumeralError::OutOfRange(u64::from(value)));
    }
    let mut remaining = value;
    let mut out = String::new();
    for (amount, symbol) in ROMAN_VALUES {
        while remaining >= amount {
            out.push_str(symbol);
            remaining -= amount;
        }
    }
    Ok(out)
}

/// Parse a roman numeral, accepting only canonical spellings.
///
/// Case is ignored; validity is checked by converting the value back and
/// comparing with the (upper-cased) input, which rejects `IIII`, `VX`, `IC`.
pub fn roman_to_int(text: &str) -> Result<u32, NumeralError> {
    let upper = text.to_uppercase();
    let mut values = Vec::with_capacity(upper.len());
    for c in upper.chars() {
        let value = match c {
            'M' => 1000,
            'D' => 500,
            'C' => 100,
            'L' => 50,
            'X' => 10,
            'V' => 5,
            'I' => 1,
            _ => return Err(NumeralError::InvalidNumeral(text.to_string())),
        };
        values.push(value);
    }

    let mut sum: i64 = 0;
    for (idx, value) in values.iter().enumerate() {
        match values.get(idx + 1) {
            Some(next) if next > value => sum -= i64::from(*value),
            _ => sum += i64::from(*value),
        }
    }

    let sum = u32::try_from(sum).map_err(|_| NumeralError::InvalidNumeral(text.to_string()))?;
    match int_to_roman(sum) {
        Ok(canonical) if canonical == upper => Ok(sum),
        _ => Err(NumeralError::InvalidNumeral(text.to_string())),
    }
}

/// English number word grammar: each word maps to `(scale, increment)`.
#[derive(Debug, Clone)]
pub struct NumberWords {
    table: HashMap<&'static str, (u64, u64)>,
}

impl NumberWords {
    /// Build the word table; `use_and` admits the filler word `and`
    /// (`one hundred and five`).
    pub fn new(use_and: bool) -> Self {
        let mut table = HashMap::new();
        if use_and {
            table.insert("and", (1, 0));
        }
        for (idx, word) in UNITS.iter().enumerate() {
            table.insert(*word, (1, idx as u64));
        }
        for (idx, word) in TENS.iter().enumerate() {
            if !word.is_empty() {
                table.insert(*word, (1, idx as u64 * 10));
            }
        }
        for (idx, word) in SCALES.iter().enumerate() {
            let exponent = if idx == 0 { 2 } else { idx as u32 * 3 };
            table.insert(*word, (10u64.pow(exponent), 0));
        }
        Self { table }
    }

    /// Parse space or hyphen separated number words.
    pub fn parse(&self, text: &str) -> Result<u64, NumeralError> {
        let normalized = text.replace('-', " ").to_lowercase();
        let mut words = normalized.split_whitespace().peekable();
        if words.peek().is_none() {
            return Err(NumeralError::Empty);
        }

        let overflow = || NumeralError::Overflow(text.to_string());
        let mut current: u64 = 0;
        let mut result: u64 = 0;
        for word in words {
            let (scale, increment) = *self
                .table
                .get(word)
                .ok_or_else(|| NumeralError::UnknownWord(word.to_string()))?;
            if scale > 1 && current == 0 {
                return Err(NumeralError::NotANumber(text.to_string()));
            }
            current = current
                .checked_mul(scale)
                .and_then(|v| v.checked_add(increment))
                .ok_or_else(overflow)?;
            if scale > 100 {
                result = result.checked_add(current).ok_or_else(overflow)?;
                current = 0;
            }
        }
        result.checked_add(current).ok_or_else(overflow)
    }
}

/// Parse English number words with `and` allowed.
pub fn number_words_to_int(text: &str) -> Result<u64, NumeralError> {
    WORDS_WITH_AND.parse(text)
}

/// Integer, then roman, then number words; the first that parses wins.
pub fn text_to_number(text: &str) -> Result<u64, NumeralError> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = roman_to_int(trimmed) {
        return Ok(u64::from(value));
    }
    number_words_to_int(trimmed).map_err(|_| NumeralError::NotANumber(text.to_string()))
}

/// Value of an ordinal word (`third` → 3), ignoring case.
pub fn ordinal_value(word: &str) -> Option<u32> {
    ORDINALS
        .iter()
        .find(|(ordinal, _)| ordinal.eq_ignore_ascii_case(word))
        .map(|(_, value)| *value)
}

/// Replace every upper-case roman token with its Arabic value.
pub fn replace_roman_numerals(text: &str) -> Result<String, NumeralError> {
    replace_matches(&RE_ROMAN, text, |token| {
        roman_to_int(token).map(|v| v.to_string())
    })
}

/// Replace runs of number words (`Twenty-Three`) with their value. A run
/// that is not a number on its own (`Hundred`) is left as written.
pub fn replace_number_words(text: &str) -> Result<String, NumeralError> {
    replace_matches(&RE_NUMBER_WORDS, text, |token| {
        match WORDS_WITHOUT_AND.parse(token) {
            Ok(value) => Ok(value.to_string()),
            Err(NumeralError::NotANumber(_)) => Ok(token.to_string()),
            Err(err) => Err(err),
        }
    })
}

/// Replace capitalized whole-word ordinals (`Third` → `3`).
pub fn replace_ordinals(text: &str) -> String {
    RE_ORDINAL
        .replace_all(text, |caps: &Captures<'_>| {
            ordinal_value(&caps[0])
                .map(|v| v.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn replace_matches<F>(re: &Regex, text: &str, convert: F) -> Result<String, NumeralError>
where
    F: Fn(&str) -> Result<String, NumeralError>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        out.push_str(&convert(m.as_str())?);
        last = m.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roman_round_trip_covers_full_range() {
        for n in 1..4000 {
            let roman = int_to_roman(n).unwrap();
            assert_eq!(roman_to_int(&roman).unwrap(), n, "{roman}");
        }
    }

    #[test]
    fn roman_rejects_non_canonical_forms() {
        for bad in ["IIII", "VX", "IC", "MMMM", "", "XIVX", "ABC"] {
            assert!(roman_to_int(bad).is_err(), "{bad} should fail");
        }
        assert_eq!(roman_to_int("xiv").unwrap(), 14);
    }

    #[test]
    fn int_to_roman_bounds() {
        assert_eq!(int_to_roman(0), Err(NumeralError::OutOfRange(0)));
        assert_eq!(int_to_roman(4000), Err(NumeralError::OutOfRange(4000)));
        assert_eq!(int_to_roman(3999).unwrap(), "MMMCMXCIX");
    }

    #[test]
    fn number_words_grammar() {
        assert_eq!(number_words_to_int("twenty-three").unwrap(), 23);
        assert_eq!(number_words_to_int("one hundred and five").unwrap(), 105);
        assert_eq!(number_words_to_int("Two Thousand and Twelve").unwrap(), 2012);
        assert_eq!(number_words_to_int("three million four").unwrap(), 3_000_004);
        assert_eq!(
            NumberWords::new(false).parse("one hundred and five"),
            Err(NumeralError::UnknownWord("and".into()))
        );
        assert_eq!(NumberWords::new(false).parse("one hundred five").unwrap(), 105);
        assert_eq!(number_words_to_int("  "), Err(NumeralError::Empty));
        assert!(matches!(
            number_words_to_int("eleventy"),
            Err(NumeralError::UnknownWord(_))
        ));
    }

    #[test]
    fn number_words_overflow_is_reported() {
        let huge = format!("one{}", " hundred".repeat(10));
        let err = number_words_to_int(&huge).unwrap_err();
        assert!(matches!(err, NumeralError::Overflow(_)), "{err:?}");
    }

    #[test]
    fn scale_words_need_a_value_before_them() {
        for bare in ["hundred", "thousand", "trillion trillion trillion", "one million thousand"] {
            assert_eq!(
                number_words_to_int(bare),
                Err(NumeralError::NotANumber(bare.to_string())),
                "{bare}"
            );
        }
        assert_eq!(number_words_to_int("one hundred thousand").unwrap(), 100_000);
        assert_eq!(replace_number_words("Chapter Hundred").unwrap(), "Chapter Hundred");
        assert_eq!(replace_number_words("Chapter Twenty-One").unwrap(), "Chapter 21");
    }

    #[test]
    fn text_to_number_tries_each_form() {
        assert_eq!(text_to_number("42").unwrap(), 42);
        assert_eq!(text_to_number("XLII").unwrap(), 42);
        assert_eq!(text_to_number("forty-two").unwrap(), 42);
        assert!(matches!(
            text_to_number("Preface"),
            Err(NumeralError::NotANumber(_))
        ));
    }

    #[test]
    fn embedded_roman_respects_word_boundaries() {
        assert_eq!(
            replace_roman_numerals("BOOK II: CHAPTER XIV").unwrap(),
            "BOOK 2: CHAPTER 14"
        );
        assert_eq!(replace_roman_numerals("Hawaii Civil").unwrap(), "Hawaii Civil");
        assert_eq!(replace_roman_numerals("Chapters IV-VI").unwrap(), "Chapters 4-6");
        assert!(replace_roman_numerals("MMMM").is_err());
    }

    #[test]
    fn embedded_number_words() {
        assert_eq!(
            replace_number_words("Chapter Seventeen").unwrap(),
            "Chapter 17"
        );
        assert_eq!(
            replace_number_words("Part One, Chapter Twenty-One").unwrap(),
            "Part 1, Chapter 21"
        );
        assert_eq!(replace_number_words("Often at Stone").unwrap(), "Often at Stone");
        assert_eq!(replace_number_words("Stave Two-").unwrap(), "Stave 2-");
    }

    #[test]
    fn ordinals() {
        assert_eq!(replace_ordinals("Book the Third"), "Book the 3");
        assert_eq!(replace_ordinals("Firstly"), "Firstly");
        assert_eq!(ordinal_value("twelfth"), Some(12));
        assert_eq!(ordinal_value("thirteenth"), None);
    }
}
