use libsotd_macros::scoring_feature;

use crate::{
  model::{CatalogEntry, Strategy},
  scoring::{Candidate, Feature, ScoringContext},
};

/// Specificity at which a pattern earns the full bonus.
const FULL_SPECIFICITY: f64 = 24.0;

/// Corrections after which the full penalty applies.
const FULL_PENALTY_CORRECTIONS: f64 = 3.0;

#[scoring_feature(StrategyBase, name = "strategy_base")]
fn score_feature(&self, candidate: &Candidate, _context: &ScoringContext) -> f64 {
  match candidate.strategy {
    Strategy::CorrectMatch => 1.0,
    Strategy::KnownEntry => 0.8,
    Strategy::DualComponent => 0.7,
    Strategy::AutomatedSplit => 0.55,
    Strategy::WholeString => 0.4,
    Strategy::NoMatch => 0.0,
  }
}

#[scoring_feature(PatternSpecificity, name = "pattern_specificity")]
fn score_feature(&self, candidate: &Candidate, _context: &ScoringContext) -> f64 {
  if candidate.strategy == Strategy::CorrectMatch {
    return 1.0;
  }

  (candidate.specificity as f64 / FULL_SPECIFICITY).min(1.0)
}

fn completeness(entry: &CatalogEntry) -> f64 {
  let expected = entry.category.expected_attributes();

  if expected.is_empty() {
    return 1.0;
  }

  expected.iter().filter(|name| entry.attributes.contains_key(**name)).count() as f64 / expected.len() as f64
}

#[scoring_feature(CatalogCompleteness, name = "catalog_completeness")]
fn score_feature(&self, candidate: &Candidate, _context: &ScoringContext) -> f64 {
  let entries = candidate.matched.entries();

  if entries.is_empty() {
    return 0.0;
  }

  entries.iter().map(|entry| completeness(entry)).sum::<f64>() / entries.len() as f64
}

#[scoring_feature(BrandAuthority, name = "brand_authority")]
fn score_feature(&self, candidate: &Candidate, _context: &ScoringContext) -> f64 {
  let entries = candidate.matched.entries();

  if entries.is_empty() {
    return 0.0;
  }

  entries.iter().map(|entry| entry.authority.weight()).sum::<f64>() / entries.len() as f64
}

#[scoring_feature(CorrectionPenalty, name = "correction_penalty")]
fn score_feature(&self, candidate: &Candidate, context: &ScoringContext) -> f64 {
  if candidate.strategy == Strategy::CorrectMatch {
    return 0.0;
  }

  (context.corrections as f64 / FULL_PENALTY_CORRECTIONS).min(1.0)
}
