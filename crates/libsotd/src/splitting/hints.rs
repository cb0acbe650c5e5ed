use std::sync::LazyLock;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::Regex;

/// Words naming a knot fiber, with the fiber they denote.
const FIBERS: &[(&str, &str)] = &[
  ("badger", "Badger"),
  ("silvertip", "Badger"),
  ("silver tip", "Badger"),
  ("two band", "Badger"),
  ("2band", "Badger"),
  ("2 band", "Badger"),
  ("super badger", "Badger"),
  ("best badger", "Badger"),
  ("pure badger", "Badger"),
  ("finest", "Badger"),
  ("manchurian", "Badger"),
  ("boar", "Boar"),
  ("horse", "Horse"),
  ("horsehair", "Horse"),
  ("synthetic", "Synthetic"),
  ("synth", "Synthetic"),
  ("syn", "Synthetic"),
  ("tuxedo", "Synthetic"),
  ("plissoft", "Synthetic"),
  ("cashmere", "Synthetic"),
  ("g5a", "Synthetic"),
  ("g5b", "Synthetic"),
  ("g5c", "Synthetic"),
  ("mixed", "Mixed Badger/Boar"),
];

static FIBER_WORDS: LazyLock<AhoCorasick> = LazyLock::new(|| {
  AhoCorasickBuilder::new()
    .match_kind(MatchKind::LeftmostLongest)
    .ascii_case_insensitive(true)
    .build(FIBERS.iter().map(|(word, _)| word))
    .unwrap()
});

static KNOT_SIZE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(\d{2}(?:\.\d+)?)\s*mm\b").unwrap());

/// A fiber or knot size mention, as a byte range of the text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct KnotIndicator {
  pub(crate) start: usize,
  pub(crate) end: usize,
}

fn is_word_boundary(haystack: &str, start: usize, end: usize) -> bool {
  let before = haystack[..start].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
  let after = haystack[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());

  before && after
}

fn fiber_words(text: &str) -> impl Iterator<Item = (KnotIndicator, &'static str)> + '_ {
  FIBER_WORDS
    .find_iter(text)
    .filter(|mat| is_word_boundary(text, mat.start(), mat.end()))
    .map(|mat| (KnotIndicator { start: mat.start(), end: mat.end() }, FIBERS[mat.pattern().as_usize()].1))
}

/// Every knot indicator in the text, in order of appearance.
pub(crate) fn knot_indicators(text: &str) -> Vec<KnotIndicator> {
  let mut indicators = fiber_words(text).map(|(indicator, _)| indicator).collect::<Vec<_>>();

  indicators.extend(KNOT_SIZE.find_iter(text).map(|mat| KnotIndicator { start: mat.start(), end: mat.end() }));
  indicators.sort_by_key(|indicator| indicator.start);
  indicators
}

pub(crate) fn has_knot_indicators(text: &str) -> bool {
  fiber_words(text).next().is_some() || KNOT_SIZE.is_match(text)
}

/// Fiber stated in the text, if any.
pub fn fiber(text: &str) -> Option<&'static str> {
  fiber_words(text).next().map(|(_, fiber)| fiber)
}

/// Knot size stated in the text, in millimeters.
pub fn knot_size(text: &str) -> Option<f64> {
  KNOT_SIZE.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
  use float_cmp::approx_eq;

  #[test]
  fn fiber() {
    assert_eq!(super::fiber("Semogue 2 Band Badger"), Some("Badger"));
    assert_eq!(super::fiber("Zenith B35 boar"), Some("Boar"));
    assert_eq!(super::fiber("AP Shave Co G5C"), Some("Synthetic"));
    assert_eq!(super::fiber("Boaring handle"), None);
    assert_eq!(super::fiber("Synthesis of things"), None);
  }

  #[test]
  fn knot_size() {
    assert!(super::knot_size("Declaration B2 26mm").is_some_and(|size| approx_eq!(f64, size, 26.0)));
    assert!(super::knot_size("Maggard 24.5 mm synthetic").is_some_and(|size| approx_eq!(f64, size, 24.5)));
    assert_eq!(super::knot_size("Omega 10049"), None);
  }

  #[test]
  fn indicators_are_ordered() {
    let text = "Rubberset 400 26mm silvertip";
    let indicators = super::knot_indicators(text);

    assert_eq!(indicators.len(), 2);
    assert_eq!(&text[indicators[0].start..indicators[0].end], "26mm");
    assert_eq!(&text[indicators[1].start..indicators[1].end], "silvertip");
    assert!(super::has_knot_indicators(text));
    assert!(!super::has_knot_indicators("Southland handle"));
  }
}
