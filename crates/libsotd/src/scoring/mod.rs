use std::{cmp::Ordering, sync::Arc};

use metrics::histogram;
use serde::Deserialize;
use serde_inline_default::serde_inline_default;

use crate::{
  formats::FormatAffinity,
  model::{Attributes, CatalogEntry, Matched, Strategy},
};

pub(crate) mod features;

use features::{BrandAuthority, CatalogCompleteness, CorrectionPenalty, PatternSpecificity, StrategyBase};

pub(crate) trait Feature: Send + Sync {
  fn name(&self) -> &'static str;
  fn score_feature(&self, candidate: &Candidate, context: &ScoringContext) -> f64;
}

/// Upper bound of a confidence score.
pub const MAX_SCORE: f64 = 100.0;

/// Weight of every scoring feature.
///
/// Each feature scores between 0 and 1 and contributes its score times its
/// weight. The correction penalty is subtracted.
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
pub struct ScoringWeights {
  #[serde_inline_default(70.0)]
  pub strategy_base: f64,
  #[serde_inline_default(10.0)]
  pub pattern_specificity: f64,
  #[serde_inline_default(10.0)]
  pub catalog_completeness: f64,
  #[serde_inline_default(10.0)]
  pub brand_authority: f64,
  #[serde_inline_default(15.0)]
  pub correction_penalty: f64,
}

impl Default for ScoringWeights {
  fn default() -> Self {
    ScoringWeights {
      strategy_base: 70.0,
      pattern_specificity: 10.0,
      catalog_completeness: 10.0,
      brand_authority: 10.0,
      correction_penalty: 15.0,
    }
  }
}

/// A possible answer produced by one strategy.
#[derive(Clone, Debug)]
pub struct Candidate {
  pub matched: Matched,
  pub strategy: Strategy,
  pub pattern: Option<String>,
  pub specificity: usize,
  pub affinity: FormatAffinity,
  /// Effective attributes, after user-stated details were applied.
  pub attributes: Attributes,
  pub diagnostics: Vec<String>,
}

impl Candidate {
  pub fn entry(entry: Arc<CatalogEntry>, strategy: Strategy, pattern: Option<String>, specificity: usize) -> Candidate {
    Candidate {
      attributes: entry.attributes.clone(),
      matched: Matched::Entry(entry),
      strategy,
      pattern,
      specificity,
      affinity: FormatAffinity::Unspecified,
      diagnostics: Vec::new(),
    }
  }

  pub fn with_affinity(mut self, affinity: FormatAffinity) -> Candidate {
    self.affinity = affinity;
    self
  }

  /// Declaration order of the first entry referenced.
  fn ordinal(&self) -> usize {
    self.matched.entries().first().map(|entry| entry.ordinal()).unwrap_or(usize::MAX)
  }
}

/// Facts about the input text, shared by every candidate.
#[derive(Clone, Debug, Default)]
pub struct ScoringContext {
  /// How many times a human corrected the automated match of this text.
  pub corrections: usize,
}

#[derive(Clone, Debug)]
pub struct ScoredCandidate {
  pub candidate: Candidate,
  pub score: f64,
  pub features: Vec<(&'static str, f64)>,
}

/// Additive, explainable candidate scoring.
#[derive(Clone, Debug, Default)]
pub struct ScoringEngine {
  weights: ScoringWeights,
}

impl ScoringEngine {
  pub fn new(weights: ScoringWeights) -> ScoringEngine {
    ScoringEngine { weights }
  }

  fn features(&self) -> [(&dyn Feature, f64); 5] {
    [
      (&StrategyBase, self.weights.strategy_base),
      (&PatternSpecificity, self.weights.pattern_specificity),
      (&CatalogCompleteness, self.weights.catalog_completeness),
      (&BrandAuthority, self.weights.brand_authority),
      (&CorrectionPenalty, -self.weights.correction_penalty),
    ]
  }

  /// Score one candidate, clamped to `0..=100`.
  ///
  /// Also returns the weighted contribution of every feature.
  pub fn score(&self, candidate: &Candidate, context: &ScoringContext) -> (f64, Vec<(&'static str, f64)>) {
    let features = self.features();
    let mut results = Vec::with_capacity(features.len());

    let score = features.iter().fold(0.0, |score, (feature, weight)| {
      let contribution = feature.score_feature(candidate, context) * weight;

      tracing::trace!(feature = feature.name(), contribution, "computed feature score");

      results.push((feature.name(), contribution));

      score + contribution
    });

    (score.clamp(0.0, MAX_SCORE), results)
  }

  /// Score and sort candidates, best first.
  ///
  /// Candidates are ordered by format affinity, then score. Equal scores are
  /// always settled by the strategy hierarchy, then by catalog declaration
  /// order.
  pub fn rank(&self, candidates: Vec<Candidate>, context: &ScoringContext) -> Vec<ScoredCandidate> {
    let mut scored = candidates
      .into_iter()
      .map(|candidate| {
        let (score, features) = self.score(&candidate, context);

        histogram!("sotd_candidate_scores", "strategy" => candidate.strategy.as_str()).record(score);

        ScoredCandidate { candidate, score, features }
      })
      .collect::<Vec<_>>();

    scored.sort_by(compare);
    scored
  }
}

fn compare(lhs: &ScoredCandidate, rhs: &ScoredCandidate) -> Ordering {
  rhs
    .candidate
    .affinity
    .cmp(&lhs.candidate.affinity)
    .then_with(|| rhs.score.total_cmp(&lhs.score))
    .then_with(|| lhs.candidate.strategy.priority().cmp(&rhs.candidate.strategy.priority()))
    .then_with(|| lhs.candidate.ordinal().cmp(&rhs.candidate.ordinal()))
}
