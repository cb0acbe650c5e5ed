use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

/// Marker separating the two halves of a composite description.
///
/// Variants are declared in priority order: the first one yielding a valid
/// split wins.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterType {
  With,
  In,
  Slash,
  Plus,
  Hyphen,
  /// Split after an explicit `handle` or `knot` keyword.
  Keyword,
  /// Split before a fiber or knot size mention.
  FiberHint,
}

impl DelimiterType {
  pub(crate) const STRUCTURAL: [DelimiterType; 5] = [DelimiterType::With, DelimiterType::In, DelimiterType::Slash, DelimiterType::Plus, DelimiterType::Hyphen];

  pub fn as_str(&self) -> &'static str {
    match self {
      DelimiterType::With => "with",
      DelimiterType::In => "in",
      DelimiterType::Slash => "slash",
      DelimiterType::Plus => "plus",
      DelimiterType::Hyphen => "hyphen",
      DelimiterType::Keyword => "keyword",
      DelimiterType::FiberHint => "fiber_hint",
    }
  }

  /// Whether the split comes from an actual separator rather than a hint.
  pub fn is_structural(&self) -> bool {
    !matches!(self, DelimiterType::Keyword | DelimiterType::FiberHint)
  }

  pub(crate) fn confidence(&self) -> f64 {
    match self {
      DelimiterType::With => 0.9,
      DelimiterType::In => 0.85,
      DelimiterType::Slash | DelimiterType::Plus => 0.7,
      DelimiterType::Hyphen => 0.6,
      DelimiterType::Keyword => 0.5,
      DelimiterType::FiberHint => 0.4,
    }
  }

  fn pattern(&self) -> Option<&'static Regex> {
    match self {
      DelimiterType::With => Some(&*WITH),
      DelimiterType::In => Some(&*IN),
      DelimiterType::Slash => Some(&*SLASH),
      DelimiterType::Plus => Some(&*PLUS),
      DelimiterType::Hyphen => Some(&*HYPHEN),
      DelimiterType::Keyword | DelimiterType::FiberHint => None,
    }
  }
}

impl fmt::Display for DelimiterType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

static WITH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+w/\s*|\s+with\s+").unwrap());
static IN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+in\.?\s+").unwrap());
static SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*/\s*").unwrap());
static PLUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\+\s*").unwrap());
static HYPHEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+[-–—]\s+").unwrap());

static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^\d+(?:[.,/]\d+)?["']?$"#).unwrap());
static DIMENSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^(?:\d+(?:[.,]\d+)?)?[x×]\d+(?:[.,]\d+)?["']?$"#).unwrap());
static TIMES_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\d+(?:[.,]\d+)?)?[x×]$").unwrap());

/// One occurrence of a delimiter in a text, as byte offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Occurrence {
  pub(crate) delimiter: DelimiterType,
  pub(crate) start: usize,
  pub(crate) end: usize,
}

impl Occurrence {
  pub(crate) fn halves<'t>(&self, text: &'t str) -> (&'t str, &'t str) {
    (text[..self.start].trim(), text[self.end..].trim())
  }
}

/// Every occurrence of a delimiter, left to right.
pub(crate) fn occurrences(delimiter: DelimiterType, text: &str) -> Vec<Occurrence> {
  let Some(pattern) = delimiter.pattern() else {
    return Vec::new();
  };

  pattern.find_iter(text).map(|mat| Occurrence { delimiter, start: mat.start(), end: mat.end() }).collect()
}

fn last_token(text: &str) -> &str {
  text.split_whitespace().next_back().unwrap_or_default()
}

fn first_token(text: &str) -> &str {
  text.split_whitespace().next().unwrap_or_default()
}

/// Whether an `in` between these halves is the unit of a dimension.
///
/// A number right before `in` only makes it a unit when a multiplication
/// sign sits next to it, as in `1 in. x 3 in.` or `1x3 in`.
fn is_dimension(first: &str, second: &str) -> bool {
  let mut before = first.split_whitespace().rev();
  let number = before.next().unwrap_or_default();

  if DIMENSION_TOKEN.is_match(&number.to_lowercase()) {
    return true;
  }

  if !NUMERIC_TOKEN.is_match(number) {
    return false;
  }

  if before.next().is_some_and(|token| TIMES_TOKEN.is_match(&token.to_lowercase())) {
    return true;
  }

  let mut after = second.split_whitespace();

  after.next().is_some_and(|token| TIMES_TOKEN.is_match(&token.to_lowercase())) && after.next().is_some_and(|token| token.starts_with(|c: char| c.is_ascii_digit()))
}

/// Check one occurrence against the context it appears in.
///
/// Returns the reason the occurrence is not a separator, if it is not.
pub(crate) fn validate(occurrence: &Occurrence, text: &str) -> Result<(), String> {
  let (first, second) = occurrence.halves(text);

  if !first.chars().any(char::is_alphanumeric) || !second.chars().any(char::is_alphanumeric) {
    return Err("one side of the delimiter is empty".into());
  }

  match occurrence.delimiter {
    DelimiterType::In if is_dimension(first, second) => Err(format!("\"{}\" is a measurement unit", text[occurrence.start..occurrence.end].trim())),

    DelimiterType::Slash => {
      let before = text[..occurrence.start].chars().next_back();
      let after = text[occurrence.end..].chars().next();

      if before.is_some_and(|c| c.is_ascii_digit()) && after.is_some_and(|c| c.is_ascii_digit()) {
        return Err("slash separates numbers".into());
      }

      if last_token(first).eq_ignore_ascii_case("w") && !text[..occurrence.start].ends_with(char::is_whitespace) {
        return Err("slash belongs to a w/ abbreviation".into());
      }

      if last_token(first).chars().count() <= 1 && first_token(second).chars().count() <= 1 {
        return Err("slash separates single characters".into());
      }

      Ok(())
    }

    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::DelimiterType;

  fn validated(delimiter: DelimiterType, text: &str) -> Vec<bool> {
    super::occurrences(delimiter, text).iter().map(|occurrence| super::validate(occurrence, text).is_ok()).collect()
  }

  #[test]
  fn measurements_are_not_separators() {
    let text = "AKA Brushworx AK47 knot in Southland 1 in. x 3 in. Galvanized Nipple Handle";

    assert_eq!(validated(DelimiterType::In, text), vec![true, false, false]);
  }

  #[test]
  fn model_numbers_before_in_are_separators() {
    assert_eq!(validated(DelimiterType::In, "AKA Brushworx AK 47 in Southland Galvanized Nipple Handle"), vec![true]);
    assert_eq!(validated(DelimiterType::In, "Declaration B 2 in Mozingo"), vec![true]);
    assert_eq!(validated(DelimiterType::In, "Semogue 1305 in Mozingo"), vec![true]);
  }

  #[test]
  fn dimensions_are_not_separators() {
    assert_eq!(validated(DelimiterType::In, "Southland 1x3 in Galvanized Nipple"), vec![false]);
    assert_eq!(validated(DelimiterType::In, "Southland 1 X 3 in. Galvanized Nipple"), vec![false]);
    assert_eq!(validated(DelimiterType::In, "Declaration B2 in Southland 1 in x 3 in handle"), vec![true, false, false]);
  }

  #[test]
  fn slash_context() {
    assert_eq!(validated(DelimiterType::Slash, "Zenith 28/50 boar"), vec![false]);
    assert_eq!(validated(DelimiterType::Slash, "Handle N/A"), vec![false]);
    assert_eq!(validated(DelimiterType::Slash, "Maggard w/Declaration"), vec![false]);
    assert_eq!(validated(DelimiterType::Slash, "Mozingo / Declaration B2"), vec![true]);
    assert_eq!(validated(DelimiterType::Slash, "Mozingo/Declaration B2"), vec![true]);
  }

  #[test]
  fn empty_halves() {
    assert_eq!(validated(DelimiterType::Plus, "+ Declaration B2"), vec![false]);
    assert_eq!(validated(DelimiterType::Hyphen, "Declaration B2 - "), vec![false]);
    assert_eq!(validated(DelimiterType::With, "Maggard w/ Declaration B2"), vec![true]);
  }

  #[test]
  fn hyphen_must_stand_alone() {
    assert!(super::occurrences(DelimiterType::Hyphen, "Semogue SOC-C7 boar").is_empty());
    assert_eq!(super::occurrences(DelimiterType::Hyphen, "Zenith – Declaration B2").len(), 1);
  }
}
