use crate::{
  catalog::{CatalogHit, CatalogIndex},
  matching::{HandleMatcher, KnotMatcher},
  model::Strategy,
  scoring::Candidate,
  splitting::SplitResult,
  strategies::{Attempt, MatchInput, MatchStrategy, composite_candidate},
};

fn resolve(split: &SplitResult, catalogs: &CatalogIndex) -> (Option<CatalogHit>, Option<CatalogHit>) {
  let handle = HandleMatcher::new(catalogs).candidates(split.handle_part()).into_iter().next();
  let knot = KnotMatcher::new(catalogs).candidates(split.knot_part()).into_iter().next();

  (handle, knot)
}

fn sides((handle, knot): &(Option<CatalogHit>, Option<CatalogHit>)) -> usize {
  usize::from(handle.is_some()) + usize::from(knot.is_some())
}

/// Match both halves of a split, reading it the other way around when
/// that resolves more sides.
fn split_candidate(split: &SplitResult, strategy: Strategy, catalogs: &CatalogIndex) -> Option<Candidate> {
  let mut split = split.clone();
  let mut resolved = resolve(&split, catalogs);

  if sides(&resolved) < 2 {
    let swapped = split.swapped();
    let alternative = resolve(&swapped, catalogs);

    if sides(&alternative) > sides(&resolved) {
      tracing::debug!(first = swapped.first_part, second = swapped.second_part, "reading split the other way around");

      split = swapped;
      resolved = alternative;
    }
  }

  let (handle, knot) = resolved;
  let mut candidate = composite_candidate(handle, knot, strategy, split.knot_part())?;

  candidate.diagnostics.push(format!(
    "split on {} (confidence {:.2}): handle \"{}\", knot \"{}\"",
    split.delimiter_type,
    split.split_confidence,
    split.handle_part(),
    split.knot_part()
  ));

  Some(candidate)
}

/// Split on a validated delimiter, then match each half.
pub(crate) struct DualComponent;

impl MatchStrategy for DualComponent {
  fn strategy(&self) -> Strategy {
    Strategy::DualComponent
  }

  fn attempt(&self, input: &MatchInput, catalogs: &CatalogIndex) -> Attempt {
    let Some(split) = input.split.as_ref().and_then(|report| report.split.as_ref()) else {
      return Attempt::failed("no delimiter or hint found to split on");
    };

    if !split.delimiter_type.is_structural() {
      return Attempt::failed(format!("no delimiter validated, text was split on a {} hint", split.delimiter_type));
    }

    match split_candidate(split, self.strategy(), catalogs) {
      Some(candidate) => Attempt::from_candidates(vec![candidate], String::new),
      None => Attempt::failed(format!("split on {} but neither half matched a handle or knot", split.delimiter_type)),
    }
  }
}

/// Split on a `handle`/`knot` keyword or before fiber and size mentions.
pub(crate) struct AutomatedSplit;

impl MatchStrategy for AutomatedSplit {
  fn strategy(&self) -> Strategy {
    Strategy::AutomatedSplit
  }

  fn attempt(&self, input: &MatchInput, catalogs: &CatalogIndex) -> Attempt {
    let Some(split) = input.split.as_ref().and_then(|report| report.split.as_ref()) else {
      return Attempt::failed("no delimiter or hint found to split on");
    };

    if split.delimiter_type.is_structural() {
      return Attempt::failed(format!("not attempted, text was split on a {} delimiter", split.delimiter_type));
    }

    match split_candidate(split, self.strategy(), catalogs) {
      Some(candidate) => Attempt::from_candidates(vec![candidate], String::new),
      None => Attempt::failed(format!("split on a {} hint but neither half matched a handle or knot", split.delimiter_type)),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    model::{Category, Strategy},
    splitting::ComponentSplitter,
    strategies::{MatchInput, MatchStrategy},
    tests::fixtures,
  };

  use super::{AutomatedSplit, DualComponent};

  fn input(text: &str) -> MatchInput<'_> {
    MatchInput {
      category: Category::Brush,
      text,
      format_hint: None,
      split: Some(ComponentSplitter.split(text)),
    }
  }

  #[test]
  fn dual_component() {
    let catalogs = fixtures::catalogs();
    let input = input("AKA Brushworx AK47 knot in Southland 1 in. x 3 in. Galvanized Nipple Handle");
    let attempt = DualComponent.attempt(&input, &catalogs);
    let candidate = &attempt.candidates[0];

    assert_eq!(candidate.strategy, Strategy::DualComponent);
    assert!(candidate.matched.handle().is_some_and(|entry| entry.is("Southland", "Galvanized Nipple")));
    assert!(candidate.matched.knot().is_some_and(|entry| entry.is("AKA Brushworx", "AK47")));
    assert_eq!(candidate.attributes["handle_maker"].to_string(), "Southland");

    assert!(AutomatedSplit.attempt(&input, &catalogs).failure.is_some());
  }

  #[test]
  fn misoriented_halves_are_swapped() {
    let catalogs = fixtures::catalogs();
    let attempt = DualComponent.attempt(&input("Declaration B2 / Mozingo"), &catalogs);
    let candidate = &attempt.candidates[0];

    assert!(candidate.matched.handle().is_some_and(|entry| entry.brand == "Mozingo"));
    assert!(candidate.matched.knot().is_some_and(|entry| entry.is("Declaration Grooming", "B2")));
  }

  #[test]
  fn automated_split() {
    let catalogs = fixtures::catalogs();
    let input = input("Zenith handle Declaration B3");
    let attempt = AutomatedSplit.attempt(&input, &catalogs);

    assert!(attempt.candidates[0].matched.handle().is_some_and(|entry| entry.brand == "Zenith"));
    assert!(attempt.candidates[0].matched.knot().is_some_and(|entry| entry.is("Declaration Grooming", "B3")));
    assert!(DualComponent.attempt(&input, &catalogs).failure.is_some());
  }

  #[test]
  fn nothing_to_split() {
    let catalogs = fixtures::catalogs();
    let input = input("complete gibberish xyzzy");

    assert!(DualComponent.attempt(&input, &catalogs).failure.is_some());
    assert!(AutomatedSplit.attempt(&input, &catalogs).failure.is_some());
  }
}
