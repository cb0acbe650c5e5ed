use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use unicode_normalization::UnicodeNormalization;

/// Canonical form used to key overrides and memoized results: NFKC,
/// case-folded, whitespace collapsed and trimmed.
pub fn normalize(text: &str) -> String {
  text.nfkc().collect::<String>().to_lowercase().split_whitespace().join(" ")
}

/// Collapse runs of whitespace while keeping the original casing.
pub(crate) fn collapse_whitespace(text: &str) -> String {
  text.split_whitespace().join(" ")
}

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_`~]+").unwrap());
static TRAILING_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,;:.!?-]+$").unwrap());

/// Strip the noise community posts wrap product names in: markdown links
/// and emphasis, parenthesized remarks and trailing punctuation.
pub(crate) fn clean(text: &str) -> String {
  let text = MARKDOWN_LINK.replace_all(text, "$1");
  let text = EMPHASIS.replace_all(&text, "");
  let text = BRACKETED.replace_all(&text, " ");
  let text = collapse_whitespace(&text);

  TRAILING_PUNCTUATION.replace(&text, "").into_owned()
}

/// Thresholds deciding whether a trailing number is a usage count.
///
/// Numbers at or above `max_value`, or written with `max_digits` digits or
/// more, are model numbers (`Gillette 7 O'Clock 1000`) rather than the
/// number of times a blade was used.
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
pub struct UsageCountPolicy {
  #[serde_inline_default(800)]
  pub max_value: u32,
  #[serde_inline_default(4)]
  pub max_digits: usize,
}

impl Default for UsageCountPolicy {
  fn default() -> Self {
    UsageCountPolicy { max_value: 800, max_digits: 4 }
  }
}

impl UsageCountPolicy {
  fn accepts(&self, digits: &str) -> Option<u32> {
    if digits.len() >= self.max_digits {
      return None;
    }

    digits.parse::<u32>().ok().filter(|value| *value < self.max_value)
  }
}

static USAGE_SUFFIXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
  [
    Regex::new(r"(?i)\s*[(\[{]\s*x?\s*(\d+)\s*(?:x|st|nd|rd|th|uses?)?\s*[)\]}]\s*$").unwrap(),
    Regex::new(r"(?i)\s+(?:#|x)\s*(\d+)\s*$").unwrap(),
    Regex::new(r"(?i)\s+(\d+)\s*x\s*$").unwrap(),
  ]
});

/// Split a trailing usage count off a blade description.
///
/// Returns the text without the count, and the count itself. Text whose
/// trailing number fails the policy is returned untouched.
pub(crate) fn extract_usage_count<'t>(text: &'t str, policy: &UsageCountPolicy) -> (&'t str, Option<u32>) {
  for pattern in USAGE_SUFFIXES.iter() {
    let Some(captures) = pattern.captures(text) else {
      continue;
    };

    let (Some(suffix), Some(digits)) = (captures.get(0), captures.get(1)) else {
      continue;
    };

    if let Some(count) = policy.accepts(digits.as_str()) {
      return (text[..suffix.start()].trim_end(), Some(count));
    }

    return (text, None);
  }

  (text, None)
}

#[cfg(test)]
mod tests {
  use super::UsageCountPolicy;

  #[test]
  fn normalize() {
    assert_eq!(super::normalize("  Astra   Superior\tPLATINUM "), "astra superior platinum");
    assert_eq!(super::normalize("ＡＫＡ Brushworx"), "aka brushworx");
  }

  #[test]
  fn clean() {
    assert_eq!(super::clean("**[Karve CB](https://example.com)** (SB, #10 plate)."), "Karve CB");
    assert_eq!(super::clean("Feather - "), "Feather");
  }

  #[test]
  fn usage_counts() {
    let policy = UsageCountPolicy::default();

    assert_eq!(super::extract_usage_count("Astra SP (3)", &policy), ("Astra SP", Some(3)));
    assert_eq!(super::extract_usage_count("Astra SP [2nd]", &policy), ("Astra SP", Some(2)));
    assert_eq!(super::extract_usage_count("Feather #12", &policy), ("Feather", Some(12)));
    assert_eq!(super::extract_usage_count("Feather x4", &policy), ("Feather", Some(4)));
    assert_eq!(super::extract_usage_count("Feather 4x", &policy), ("Feather", Some(4)));
    assert_eq!(super::extract_usage_count("Feather", &policy), ("Feather", None));
  }

  #[test]
  fn usage_count_thresholds() {
    let policy = UsageCountPolicy::default();

    assert_eq!(super::extract_usage_count("Personna (800)", &policy), ("Personna (800)", None));
    assert_eq!(super::extract_usage_count("Personna (1000)", &policy), ("Personna (1000)", None));
    assert_eq!(super::extract_usage_count("Personna (799)", &policy), ("Personna", Some(799)));

    let relaxed = UsageCountPolicy { max_value: 2000, max_digits: 5 };

    assert_eq!(super::extract_usage_count("Personna (1000)", &relaxed), ("Personna", Some(1000)));
  }
}
