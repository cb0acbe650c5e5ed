use crate::{
  catalog::CatalogIndex,
  matching::{CatalogMatcher, HandleMatcher, KnotMatcher},
  model::Strategy,
  strategies::{Attempt, MatchInput, MatchStrategy, composite_candidate, entry_candidate},
};

/// Broadest fallback: brand-level patterns of the category and, for
/// composite categories, the whole text read as a lone handle or knot.
pub(crate) struct WholeString;

impl MatchStrategy for WholeString {
  fn strategy(&self) -> Strategy {
    Strategy::WholeString
  }

  fn attempt(&self, input: &MatchInput, catalogs: &CatalogIndex) -> Attempt {
    let mut candidates = CatalogMatcher::new(catalogs, input.category)
      .candidates(input.text, input.format_hint)
      .into_iter()
      .filter(|ranked| ranked.hit.entry.brand_wide)
      .map(|ranked| entry_candidate(ranked, self.strategy(), input))
      .collect::<Vec<_>>();

    if input.category.is_composite() {
      let handle = HandleMatcher::new(catalogs).candidates(input.text).into_iter().next();
      let knot = KnotMatcher::new(catalogs).candidates(input.text).into_iter().next();

      candidates.extend(composite_candidate(handle, knot, self.strategy(), input.text));
    }

    Attempt::from_candidates(candidates, || "no brand pattern matched the whole text".to_string())
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    model::{Category, Matched},
    strategies::{MatchInput, MatchStrategy},
    tests::fixtures,
  };

  use super::WholeString;

  #[test]
  fn brand_patterns() {
    let catalogs = fixtures::catalogs();
    let input = MatchInput {
      category: Category::Razor,
      text: "Karve Overlander",
      format_hint: None,
      split: None,
    };

    let attempt = WholeString.attempt(&input, &catalogs);

    assert_eq!(attempt.candidates.len(), 1);
    assert!(attempt.candidates[0].matched.entry().is_some_and(|entry| entry.is("Karve", "")));
  }

  #[test]
  fn lone_knot() {
    let catalogs = fixtures::catalogs();
    let input = MatchInput {
      category: Category::Brush,
      text: "Declaration B2 26mm",
      format_hint: None,
      split: None,
    };

    let attempt = WholeString.attempt(&input, &catalogs);

    assert_eq!(attempt.candidates.len(), 1);
    assert!(matches!(&attempt.candidates[0].matched, Matched::Composite { handle: None, knot: Some(knot) } if knot.is("Declaration Grooming", "B2")));
  }
}
