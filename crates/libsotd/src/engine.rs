use std::{fs, path::Path, sync::Arc};

use anyhow::Context;
use bon::bon;
use dashmap::DashMap;
use metrics::{counter, histogram};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use strsim::jaro_winkler;

use crate::{
  catalog::CatalogIndex,
  error::SotdError,
  formats::{self, FormatAffinity},
  matching::KnotDetails,
  model::{Category, MatchResult, Matched, Strategy},
  normalize::{self, UsageCountPolicy},
  overrides::CorrectMatchesStore,
  scoring::{Candidate, ScoredCandidate, ScoringContext, ScoringEngine, ScoringWeights},
  splitting::ComponentSplitter,
  strategies::{self, AutomatedSplit, DualComponent, KnownEntry, MatchInput, MatchStrategy, WholeString},
};

/// Similarity above which a brand is suggested for unmatched text.
const CLOSEST_BRAND_THRESHOLD: f64 = 0.85;

const DEFAULT_CACHE_CAPACITY: usize = 65_536;

/// Engine settings.
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
pub struct EngineConfig {
  /// Remember results per input text.
  #[serde_inline_default(true)]
  pub memoize: bool,
  /// Results remembered before the cache is emptied.
  #[serde_inline_default(DEFAULT_CACHE_CAPACITY)]
  pub cache_capacity: usize,
  #[serde(default)]
  pub usage_count: UsageCountPolicy,
  #[serde(default)]
  pub scoring: ScoringWeights,
}

impl Default for EngineConfig {
  fn default() -> Self {
    EngineConfig {
      memoize: true,
      cache_capacity: DEFAULT_CACHE_CAPACITY,
      usage_count: UsageCountPolicy::default(),
      scoring: ScoringWeights::default(),
    }
  }
}

impl EngineConfig {
  pub fn from_yaml(source: &str) -> Result<EngineConfig, SotdError> {
    serde_yaml::from_str(source).map_err(|err| SotdError::InvalidDocument("engine configuration".into(), err.to_string()))
  }

  pub fn load(path: impl AsRef<Path>) -> Result<EngineConfig, SotdError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;

    EngineConfig::from_yaml(&source)
  }
}

/// One text to match, as submitted by a batch caller.
#[derive(Clone, Debug, Deserialize)]
pub struct MatchRequest {
  pub category: Category,
  pub text: String,
  #[serde(default)]
  pub format: Option<String>,
}

/// How an override fares against the current catalogs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStatus {
  /// Automated matching finds the confirmed target.
  Consistent,
  /// Automated matching finds something else.
  Drifted,
  /// Automated matching finds nothing.
  Unconfirmed,
  /// The confirmed target is not in the catalogs anymore.
  Unresolved,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
  pub category: Category,
  pub normalized_key: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub format_scope: Option<String>,
  pub status: ReplayStatus,
  pub expected: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub actual: Option<String>,
  pub strategy: Strategy,
}

type CacheKey = (Category, String, Option<String>);

/// Single entry point matching free text against the catalogs.
///
/// The engine tries, in order: human-confirmed matches, catalog models of
/// the category, composite splits (brushes only) and brand-level
/// fallbacks. Candidates are ranked by the [`ScoringEngine`]. Matching
/// never fails: texts nothing applies to get an unmatched result listing
/// why every strategy gave up.
///
/// # Examples
///
/// ```rust
/// # use std::sync::Arc;
/// # use libsotd::prelude::*;
/// let engine = Engine::new(Arc::new(CatalogIndex::bundled().unwrap())).build();
/// let result = engine.match_text(Category::Blade, "Astra Superior Platinum (3)", Some("DE"));
///
/// assert_eq!(result.matched_entity().map(|entry| entry.brand.as_str()), Some("Astra"));
/// assert_eq!(result.usage_count, Some(3));
/// ```
pub struct Engine {
  catalogs: Arc<CatalogIndex>,
  overrides: Arc<CorrectMatchesStore>,
  config: EngineConfig,
  scoring: ScoringEngine,
  splitter: ComponentSplitter,
  cache: DashMap<CacheKey, MatchResult>,
}

#[bon]
impl Engine {
  #[builder(start_fn = new, finish_fn = build)]
  pub fn _new(#[builder(start_fn)] catalogs: Arc<CatalogIndex>, overrides: Option<Arc<CorrectMatchesStore>>, #[builder(default)] config: EngineConfig) -> Engine {
    Engine {
      catalogs,
      overrides: overrides.unwrap_or_default(),
      scoring: ScoringEngine::new(config.scoring.clone()),
      config,
      splitter: ComponentSplitter,
      cache: DashMap::new(),
    }
  }
}

impl Engine {
  pub fn catalogs(&self) -> &CatalogIndex {
    &self.catalogs
  }

  pub fn overrides(&self) -> &CorrectMatchesStore {
    &self.overrides
  }

  /// Match one text.
  ///
  /// `format_hint` is the device format the text was used with (the razor
  /// format for a blade), used to tell apart entries sharing a name.
  #[tracing::instrument(level = "debug", skip(self), fields(strategy))]
  pub fn match_text(&self, category: Category, text: &str, format_hint: Option<&str>) -> MatchResult {
    let key = (category, text.trim().to_string(), format_hint.map(str::to_string));

    if self.config.memoize
      && let Some(cached) = self.cache.get(&key)
    {
      let mut result = cached.clone();
      result.original_text = text.to_string();

      return result;
    }

    let result = self.resolve(category, text, format_hint, true);

    tracing::Span::current().record("strategy", result.strategy.as_str());

    counter!("sotd_matches_total", "category" => category.as_str(), "strategy" => result.strategy.as_str()).increment(1);
    histogram!("sotd_match_confidence", "category" => category.as_str()).record(result.confidence);

    if self.config.memoize {
      self.remember(key, &result);
    }

    result
  }

  fn remember(&self, key: CacheKey, result: &MatchResult) {
    if self.config.cache_capacity == 0 {
      return;
    }

    if self.cache.len() >= self.config.cache_capacity {
      tracing::debug!(capacity = self.config.cache_capacity, "match cache full, clearing");

      self.cache.clear();
    }

    self.cache.insert(key, result.clone());
  }

  /// Match independent requests in parallel, keeping their order.
  pub fn match_batch(&self, requests: &[MatchRequest]) -> Vec<MatchResult> {
    requests
      .par_iter()
      .map(|request| self.match_text(request.category, &request.text, request.format.as_deref()))
      .collect()
  }

  /// Re-run automated matching for every confirmed match.
  ///
  /// Overrides are bypassed so each confirmation is checked against what
  /// the catalogs alone would now produce.
  pub fn replay_overrides(&self) -> Vec<ReplayReport> {
    let mut reports = self
      .overrides
      .entries()
      .map(|entry| {
        let result = self.resolve(entry.category, &entry.normalized_key, entry.format_scope.as_deref(), false);

        let status = match &result.matched {
          Some(matched) if matched.same_target(&entry.target) => ReplayStatus::Consistent,
          Some(_) => ReplayStatus::Drifted,
          None => ReplayStatus::Unconfirmed,
        };

        if status != ReplayStatus::Consistent {
          tracing::warn!(category = %entry.category, key = entry.normalized_key, status = ?status, "confirmed match does not replay");
        }

        ReplayReport {
          category: entry.category,
          normalized_key: entry.normalized_key.clone(),
          format_scope: entry.format_scope.clone(),
          status,
          expected: entry.target.describe(),
          actual: result.matched.as_ref().map(Matched::describe),
          strategy: result.strategy,
        }
      })
      .collect::<Vec<_>>();

    reports.extend(self.overrides.unresolved().iter().map(|unresolved| ReplayReport {
      category: unresolved.category,
      normalized_key: unresolved.normalized_key.clone(),
      format_scope: unresolved.format_scope.clone(),
      status: ReplayStatus::Unresolved,
      expected: unresolved.reason.clone(),
      actual: None,
      strategy: Strategy::NoMatch,
    }));

    reports
  }

  fn resolve(&self, category: Category, text: &str, format_hint: Option<&str>, use_overrides: bool) -> MatchResult {
    if text.trim().is_empty() {
      return MatchResult::unmatched(category, text, vec!["empty input".into()]);
    }

    let (stripped, usage_count) = match category {
      Category::Blade => normalize::extract_usage_count(text.trim(), &self.config.usage_count),
      _ => (text.trim(), None),
    };

    let cleaned = normalize::clean(stripped);

    if cleaned.is_empty() {
      return MatchResult::unmatched(category, text, vec!["nothing left to match once markup was removed".into()]);
    }

    let mut diagnostics = Vec::new();

    if use_overrides {
      match self.confirmed(category, text, &cleaned, format_hint) {
        Some(result) => return MatchResult { usage_count, ..result },
        None => diagnostics.push(format!("{}: no confirmed match", Strategy::CorrectMatch)),
      }
    }

    let context = ScoringContext {
      corrections: self.overrides.correction_count(category, text).max(self.overrides.correction_count(category, &cleaned)),
    };

    let input = MatchInput {
      category,
      text: &cleaned,
      format_hint,
      split: category.is_composite().then(|| self.splitter.split(&cleaned)),
    };

    if let Some(report) = &input.split {
      diagnostics.extend(report.diagnostics());
    }

    let known = KnownEntry.attempt(&input, &self.catalogs);

    if !known.candidates.is_empty() {
      tracing::debug!(candidates = known.candidates.len(), "known entry matched");

      return self.finish(category, text, format_hint, usage_count, known.candidates, &context, diagnostics);
    }

    diagnostics.extend(known.failure.map(|reason| format!("{}: {reason}", Strategy::KnownEntry)));

    let fallbacks: [&dyn MatchStrategy; 3] = [&DualComponent, &AutomatedSplit, &WholeString];
    let mut candidates = Vec::new();

    for strategy in fallbacks {
      if !category.is_composite() && strategy.strategy() != Strategy::WholeString {
        continue;
      }

      let attempt = strategy.attempt(&input, &self.catalogs);

      tracing::debug!(strategy = %strategy.strategy(), candidates = attempt.candidates.len(), "attempted strategy");

      diagnostics.extend(attempt.failure.map(|reason| format!("{}: {reason}", strategy.strategy())));
      candidates.extend(attempt.candidates);
    }

    if candidates.is_empty() {
      diagnostics.extend(self.closest_brand(category, &cleaned));

      let mut result = MatchResult::unmatched(category, text, diagnostics);
      result.usage_count = usage_count;

      return result;
    }

    self.finish(category, text, format_hint, usage_count, candidates, &context, diagnostics)
  }

  /// Result of a human-confirmed match, if the text has one.
  fn confirmed(&self, category: Category, text: &str, cleaned: &str, format_hint: Option<&str>) -> Option<MatchResult> {
    let lookup = self.overrides.lookup(category, text, format_hint).or_else(|| self.overrides.lookup(category, cleaned, format_hint))?;

    let attributes = match &lookup.entry.target {
      Matched::Entry(entry) => entry.attributes.clone(),
      Matched::Composite { handle, knot } => strategies::composite_attributes(handle.as_deref(), knot.as_deref()),
    };

    let mut candidate = Candidate {
      matched: lookup.entry.target.clone(),
      strategy: Strategy::CorrectMatch,
      pattern: None,
      specificity: 0,
      affinity: FormatAffinity::Unspecified,
      attributes,
      diagnostics: lookup.diagnostic.into_iter().collect(),
    };

    if strategies::describes_knot(category) {
      let diagnostics = KnotDetails::from_text(cleaned).apply(&mut candidate.attributes);

      candidate.diagnostics.extend(diagnostics);
    }

    let scored = self.scoring.rank(vec![candidate], &ScoringContext::default()).into_iter().next()?;

    Some(result_from(category, text, None, scored, Vec::new()))
  }

  #[allow(clippy::too_many_arguments)]
  fn finish(&self, category: Category, text: &str, format_hint: Option<&str>, usage_count: Option<u32>, candidates: Vec<Candidate>, context: &ScoringContext, mut diagnostics: Vec<String>) -> MatchResult {
    let mut ranked = self.scoring.rank(candidates, context).into_iter();

    let Some(best) = ranked.next() else {
      return MatchResult::unmatched(category, text, diagnostics);
    };

    if best.candidate.affinity == FormatAffinity::Conflicting
      && let Some(format) = best.candidate.matched.entry().and_then(|entry| entry.format())
    {
      diagnostics.push(format!("matched entry is declared for {format}, not {}", format_hint.unwrap_or_default()));
    }

    let runners_up = ranked.take(3).map(|scored| format!("{} ({}, {:.1})", scored.candidate.matched.describe(), scored.candidate.strategy, scored.score)).collect::<Vec<_>>();

    if !runners_up.is_empty() {
      diagnostics.push(format!("other candidates: {}", runners_up.join(", ")));
    }

    result_from(category, text, usage_count, best, diagnostics)
  }

  /// Suggest the known brand closest to the start of the text.
  fn closest_brand(&self, category: Category, text: &str) -> Option<String> {
    let categories: &[Category] = match category.is_composite() {
      true => &[Category::Brush, Category::Handle, Category::Knot],
      false => std::slice::from_ref(&category),
    };

    let words = normalize::normalize(text);
    let words = words.split(' ').collect::<Vec<_>>();

    let (brand, similarity) = categories
      .iter()
      .filter_map(|category| self.catalogs.category(*category))
      .flat_map(|catalog| catalog.brands())
      .map(|brand| {
        let normalized = normalize::normalize(brand);
        let length = normalized.split(' ').count().min(words.len());

        (brand, jaro_winkler(&normalized, &words[..length].join(" ")))
      })
      .max_by(|lhs, rhs| lhs.1.total_cmp(&rhs.1))?;

    (similarity >= CLOSEST_BRAND_THRESHOLD).then(|| format!("closest known brand: {brand} ({similarity:.2})"))
  }

  /// Forget memoized results.
  pub fn clear_cache(&self) {
    self.cache.clear();
  }
}

fn result_from(category: Category, text: &str, usage_count: Option<u32>, scored: ScoredCandidate, mut diagnostics: Vec<String>) -> MatchResult {
  let ScoredCandidate { candidate, score, features } = scored;

  let mut all = candidate.diagnostics;
  all.append(&mut diagnostics);

  MatchResult {
    original_text: text.to_string(),
    category,
    matched: Some(candidate.matched),
    strategy: candidate.strategy,
    confidence: score,
    pattern_used: candidate.pattern,
    attributes: candidate.attributes,
    usage_count,
    features,
    diagnostics: all,
  }
}

/// Format affinity of a match result against a hint.
pub fn result_affinity(result: &MatchResult, format_hint: Option<&str>) -> FormatAffinity {
  formats::affinity(result.matched_entity().and_then(|entry| entry.format()), format_hint)
}
