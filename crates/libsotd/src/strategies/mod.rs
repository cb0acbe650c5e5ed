use crate::{
  catalog::{CatalogHit, CatalogIndex},
  formats::FormatAffinity,
  matching::{KnotDetails, RankedHit},
  model::{AttributeValue, Attributes, CatalogEntry, Category, Matched, Strategy},
  scoring::Candidate,
  splitting::SplitReport,
};

pub(crate) mod composite;
pub(crate) mod known;
pub(crate) mod whole;

pub(crate) use composite::{AutomatedSplit, DualComponent};
pub(crate) use known::KnownEntry;
pub(crate) use whole::WholeString;

/// Text prepared for automated strategies.
#[derive(Debug)]
pub(crate) struct MatchInput<'t> {
  pub(crate) category: Category,
  /// Text stripped of markup and usage counts.
  pub(crate) text: &'t str,
  pub(crate) format_hint: Option<&'t str>,
  /// Split of the text, for composite categories.
  pub(crate) split: Option<SplitReport>,
}

/// Outcome of one strategy.
#[derive(Debug, Default)]
pub(crate) struct Attempt {
  pub(crate) candidates: Vec<Candidate>,
  /// Why the strategy produced nothing, when it did not.
  pub(crate) failure: Option<String>,
}

impl Attempt {
  pub(crate) fn failed(reason: impl Into<String>) -> Attempt {
    Attempt {
      candidates: Vec::new(),
      failure: Some(reason.into()),
    }
  }

  pub(crate) fn from_candidates(candidates: Vec<Candidate>, reason: impl FnOnce() -> String) -> Attempt {
    match candidates.is_empty() {
      true => Attempt::failed(reason()),
      false => Attempt { candidates, failure: None },
    }
  }
}

/// One named algorithm tried by the engine.
pub(crate) trait MatchStrategy: Send + Sync {
  fn strategy(&self) -> Strategy;
  fn attempt(&self, input: &MatchInput, catalogs: &CatalogIndex) -> Attempt;
}

/// Whether user-stated knot details apply to results of a category.
pub(crate) fn describes_knot(category: Category) -> bool {
  matches!(category, Category::Brush | Category::Knot)
}

/// Candidate for a single catalog hit.
pub(crate) fn entry_candidate(ranked: RankedHit, strategy: Strategy, input: &MatchInput) -> Candidate {
  let RankedHit { hit, affinity } = ranked;
  let mut candidate = Candidate::entry(hit.entry, strategy, Some(hit.pattern), hit.specificity).with_affinity(affinity);

  if describes_knot(input.category) {
    let diagnostics = KnotDetails::from_text(input.text).apply(&mut candidate.attributes);

    candidate.diagnostics.extend(diagnostics);
  }

  candidate
}

/// Attributes of a handle and knot pair, as a brush.
pub(crate) fn composite_attributes(handle: Option<&CatalogEntry>, knot: Option<&CatalogEntry>) -> Attributes {
  let mut attributes = knot.map(|knot| knot.attributes.clone()).unwrap_or_default();

  if let Some(handle) = handle {
    attributes.insert("handle_maker".to_string(), AttributeValue::from(handle.brand.as_str()));

    if let Some(material) = handle.attribute("material") {
      attributes.insert("handle_material".to_string(), material.clone());
    }
  }

  attributes
}

/// Candidate for a handle and knot pair. At least one side must be set.
pub(crate) fn composite_candidate(handle: Option<CatalogHit>, knot: Option<CatalogHit>, strategy: Strategy, knot_text: &str) -> Option<Candidate> {
  if handle.is_none() && knot.is_none() {
    return None;
  }

  let pattern = [("handle", &handle), ("knot", &knot)]
    .iter()
    .filter_map(|(side, hit)| hit.as_ref().map(|hit| format!("{side}: {}", hit.pattern)))
    .collect::<Vec<_>>()
    .join("; ");

  let specificity = handle.iter().chain(knot.iter()).map(|hit| hit.specificity).sum();
  let handle = handle.map(|hit| hit.entry);
  let knot = knot.map(|hit| hit.entry);

  let mut attributes = composite_attributes(handle.as_deref(), knot.as_deref());
  let diagnostics = KnotDetails::from_text(knot_text).apply(&mut attributes);

  Some(Candidate {
    matched: Matched::Composite { handle, knot },
    strategy,
    pattern: Some(pattern),
    specificity,
    affinity: FormatAffinity::Unspecified,
    attributes,
    diagnostics,
  })
}
