use crate::{
  catalog::CatalogIndex,
  matching::CatalogMatcher,
  model::Strategy,
  strategies::{Attempt, MatchInput, MatchStrategy, entry_candidate},
};

/// Match the whole text against the models of its own category.
///
/// Model entries carry the most curated patterns, so a hit here ends the
/// search.
pub(crate) struct KnownEntry;

impl MatchStrategy for KnownEntry {
  fn strategy(&self) -> Strategy {
    Strategy::KnownEntry
  }

  fn attempt(&self, input: &MatchInput, catalogs: &CatalogIndex) -> Attempt {
    if catalogs.category(input.category).is_none() {
      return Attempt::failed(format!("no {} catalog loaded", input.category));
    }

    let candidates = CatalogMatcher::new(catalogs, input.category)
      .candidates(input.text, input.format_hint)
      .into_iter()
      .filter(|ranked| !ranked.hit.entry.brand_wide)
      .map(|ranked| entry_candidate(ranked, self.strategy(), input))
      .collect::<Vec<_>>();

    Attempt::from_candidates(candidates, || format!("no {} model pattern matched", input.category))
  }
}
