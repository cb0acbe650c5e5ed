use std::{collections::HashMap, fmt, fs, path::Path, sync::Arc};

use ahash::RandomState;
use anyhow::Context;
use itertools::Itertools;
use rust_embed::Embed;
use serde::Serialize;

use crate::{
  error::SotdError,
  model::{CatalogEntry, Category},
  normalize::collapse_whitespace,
};

pub(crate) mod document;
pub(crate) mod patterns;

use patterns::CompiledPattern;

#[derive(Embed)]
#[folder = "./assets/catalogs"]
struct BundledCatalogs;

/// Defect found while loading a catalog document.
#[derive(Clone, Debug, Serialize)]
pub struct LoadDiagnostic {
  pub category: Category,
  pub location: String,
  pub message: String,
}

impl LoadDiagnostic {
  pub(crate) fn new(category: Category, location: impl AsRef<str>, message: impl Into<String>) -> LoadDiagnostic {
    LoadDiagnostic {
      category,
      location: location.as_ref().to_string(),
      message: message.into(),
    }
  }
}

impl fmt::Display for LoadDiagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}: {}", self.category, self.location, self.message)
  }
}

/// A catalog entry whose pattern matched some text.
#[derive(Clone, Debug)]
pub struct CatalogHit {
  pub entry: Arc<CatalogEntry>,
  pub pattern: String,
  pub specificity: usize,
}

/// Compiled catalog of a single category.
#[derive(Debug)]
pub struct CategoryCatalog {
  category: Category,
  entries: Vec<Arc<CatalogEntry>>,
  patterns: Vec<Vec<CompiledPattern>>,
  diagnostics: Vec<LoadDiagnostic>,
}

impl CategoryCatalog {
  pub(crate) fn build(category: Category, source: &str) -> Result<CategoryCatalog, SotdError> {
    let (drafts, mut diagnostics) = document::parse(category, source)?;

    let mut entries = Vec::with_capacity(drafts.len());
    let mut patterns = Vec::with_capacity(drafts.len());

    for draft in drafts {
      let mut compiled = Vec::with_capacity(draft.patterns.len());

      for pattern in &draft.patterns {
        match patterns::compile(pattern) {
          Ok(pattern) => compiled.push(pattern),
          Err(err) => diagnostics.push(LoadDiagnostic::new(category, draft.location(), format!("invalid pattern {pattern:?} skipped: {err}"))),
        }
      }

      if compiled.is_empty() {
        diagnostics.push(LoadDiagnostic::new(category, draft.location(), "entry has no valid pattern and was skipped"));
        continue;
      }

      for example in &draft.examples {
        if !compiled.iter().any(|pattern| pattern.regex.is_match(&collapse_whitespace(example))) {
          diagnostics.push(LoadDiagnostic::new(category, draft.location(), format!("example {example:?} is not matched by any pattern of the entry")));
        }
      }

      entries.push(Arc::new(CatalogEntry {
        category,
        brand: draft.brand,
        model: draft.model,
        authority: draft.authority,
        brand_wide: draft.brand_wide,
        patterns: draft.patterns,
        examples: draft.examples,
        attributes: draft.attributes,
        ordinal: entries.len(),
      }));

      patterns.push(compiled);
    }

    for diagnostic in &diagnostics {
      tracing::warn!(category = %category, location = diagnostic.location, "{}", diagnostic.message);
    }

    if entries.is_empty() {
      return Err(SotdError::EmptyCatalog(category));
    }

    tracing::info!(category = %category, entries = entries.len(), diagnostics = diagnostics.len(), "loaded catalog");

    Ok(CategoryCatalog {
      category,
      entries,
      patterns,
      diagnostics,
    })
  }

  pub fn category(&self) -> Category {
    self.category
  }

  pub fn entries(&self) -> &[Arc<CatalogEntry>] {
    &self.entries
  }

  pub fn diagnostics(&self) -> &[LoadDiagnostic] {
    &self.diagnostics
  }

  /// Distinct brand names, in declaration order.
  pub fn brands(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|entry| entry.brand.as_str()).unique()
  }

  /// Every entry with a pattern matching `text`.
  ///
  /// Model entries come before brand-wide ones, each group most specific
  /// first. Each entry reports the first of its patterns that matched. Hits
  /// that still tie keep their declaration order.
  pub fn lookup(&self, text: &str) -> Vec<CatalogHit> {
    let text = collapse_whitespace(text);

    if text.is_empty() {
      return Vec::new();
    }

    let mut hits = self
      .entries
      .iter()
      .zip(&self.patterns)
      .filter_map(|(entry, patterns)| {
        patterns.iter().find(|pattern| pattern.regex.is_match(&text)).map(|pattern| CatalogHit {
          entry: Arc::clone(entry),
          pattern: pattern.source.clone(),
          specificity: pattern.specificity,
        })
      })
      .collect::<Vec<_>>();

    hits.sort_by(|lhs, rhs| {
      lhs
        .entry
        .brand_wide
        .cmp(&rhs.entry.brand_wide)
        .then_with(|| rhs.specificity.cmp(&lhs.specificity))
    });
    hits
  }
}

/// All loaded catalogs, keyed by category.
///
/// Built once per run and shared read-only between every component.
#[derive(Debug, Default)]
pub struct CatalogIndex {
  catalogs: HashMap<Category, CategoryCatalog, RandomState>,
  failures: Vec<LoadDiagnostic>,
}

impl CatalogIndex {
  pub fn new() -> CatalogIndex {
    CatalogIndex::default()
  }

  /// Load (or replace) the catalog of one category from a YAML document.
  pub fn load_str(&mut self, category: Category, source: &str) -> Result<&CategoryCatalog, SotdError> {
    let catalog = CategoryCatalog::build(category, source)?;

    self.catalogs.insert(category, catalog);

    self.catalogs.get(&category).ok_or(SotdError::EmptyCatalog(category))
  }

  fn load_or_record(&mut self, category: Category, source: &str) {
    if let Err(err) = self.load_str(category, source) {
      tracing::error!(category = %category, error = err.to_string(), "could not load catalog");

      self.failures.push(LoadDiagnostic::new(category, category.file_name(), err.to_string()));
    }
  }

  /// Load every category document found in a directory.
  ///
  /// A category that cannot be read or fails to load is recorded and left
  /// out, the others are still usable. Only a directory yielding no catalog at all is an error.
  pub fn load_dir(path: impl AsRef<Path>) -> Result<CatalogIndex, SotdError> {
    let path = path.as_ref();
    let mut index = CatalogIndex::new();

    for category in Category::ALL {
      let file = path.join(category.file_name());

      if !file.exists() {
        tracing::debug!(category = %category, path = %file.display(), "no catalog document for category");
        continue;
      }

      match fs::read_to_string(&file) {
        Ok(source) => index.load_or_record(category, &source),

        Err(err) => {
          tracing::error!(category = %category, path = %file.display(), error = err.to_string(), "could not read catalog");

          index.failures.push(LoadDiagnostic::new(category, category.file_name(), format!("could not read {}: {err}", file.display())));
        }
      }
    }

    match index.catalogs.is_empty() {
      true => Err(SotdError::ConfigError(format!("no catalog could be loaded from {}", path.display()))),
      false => Ok(index),
    }
  }

  /// Catalogs shipped with the library.
  pub fn bundled() -> Result<CatalogIndex, SotdError> {
    let mut index = CatalogIndex::new();

    for category in Category::ALL {
      let Some(file) = BundledCatalogs::get(category.file_name()) else {
        continue;
      };

      let source = std::str::from_utf8(&file.data).with_context(|| format!("bundled {} is not valid UTF-8", category.file_name()))?;

      index.load_or_record(category, source);
    }

    match index.catalogs.is_empty() {
      true => Err(SotdError::ConfigError("no bundled catalog could be loaded".into())),
      false => Ok(index),
    }
  }

  pub fn category(&self, category: Category) -> Option<&CategoryCatalog> {
    self.catalogs.get(&category)
  }

  /// Structural matches of `text` in a category, model entries first.
  pub fn lookup(&self, category: Category, text: &str) -> Vec<CatalogHit> {
    match self.catalogs.get(&category) {
      Some(catalog) => catalog.lookup(text),
      None => Vec::new(),
    }
  }

  /// Find an entry by identity. Brand and model compare case-insensitively.
  pub fn find(&self, category: Category, brand: &str, model: &str) -> Option<Arc<CatalogEntry>> {
    self.catalogs.get(&category)?.entries.iter().find(|entry| entry.is(brand, model)).cloned()
  }

  /// Every load defect, including categories that could not be loaded.
  pub fn diagnostics(&self) -> impl Iterator<Item = &LoadDiagnostic> {
    Category::ALL
      .iter()
      .filter_map(|category| self.catalogs.get(category))
      .flat_map(|catalog| catalog.diagnostics.iter())
      .chain(self.failures.iter())
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use crate::{
    catalog::CatalogIndex,
    error::SotdError,
    model::{AttributeValue, Authority, Category},
    tests::fixtures,
  };

  #[test]
  fn lookup_orders_by_specificity() {
    let index = fixtures::catalogs();
    let hits = index.lookup(Category::Razor, "Karve Christopher Bradley (SB plate)");

    assert_eq!(hits.len(), 2);
    assert!(hits[0].entry.is("Karve", "Christopher Bradley"));
    assert!(hits[1].entry.is("Karve", ""));
    assert!(hits[0].specificity > hits[1].specificity);
  }

  #[test]
  fn lookup_prefers_models_over_brand_wide_entries() {
    let mut index = CatalogIndex::new();

    index
      .load_str(
        Category::Knot,
        r#"
artisan:
  AKA Brushworx:
    fiber: Synthetic
    AK47:
      patterns: ['\bak\s*-?\s*47\b']
    patterns: ['aka\s+brushworx']
"#,
      )
      .unwrap();

    let hits = index.lookup(Category::Knot, "AKA Brushworx AK47 knot");

    assert_eq!(hits.len(), 2);
    assert!(hits[0].entry.is("AKA Brushworx", "AK47"));
    assert!(hits[1].entry.brand_wide);
    assert!(hits[0].specificity < hits[1].specificity);
  }

  #[test]
  fn lookup_is_case_insensitive() {
    let index = fixtures::catalogs();

    assert_eq!(index.lookup(Category::Razor, "KARVE CHRISTOPHER BRADLEY")[0].entry.model, "Christopher Bradley");
    assert!(index.lookup(Category::Razor, "").is_empty());
    assert!(index.lookup(Category::Razor, "complete gibberish xyzzy").is_empty());
  }

  #[test]
  fn lookup_reports_first_matching_pattern() {
    let index = fixtures::catalogs();
    let hits = index.lookup(Category::Knot, "Declaration Grooming B2 knot");

    assert_eq!(hits[0].pattern, r"declaration.*\bb2\b");
  }

  #[test]
  fn malformed_patterns_do_not_block_the_category() {
    let mut index = CatalogIndex::new();
    let catalog = index
      .load_str(
        Category::Soap,
        r#"
artisan:
  Barrister and Mann:
    scent: Seville
    Seville:
      patterns: ['b(?:arrister)?\s*(?:&|and)?\s*m(?:ann)?.*seville']
  Broken Pattern Co:
    Unclosed:
      patterns: ['unclosed(']
    Partially:
      patterns: ['[bad', 'partially']
"#,
      )
      .unwrap();

    assert_eq!(catalog.entries().len(), 2);
    assert_eq!(catalog.diagnostics().len(), 3);

    assert!(index.lookup(Category::Soap, "B&M Seville").first().is_some_and(|hit| hit.entry.is("Barrister and Mann", "Seville")));
    assert!(index.lookup(Category::Soap, "Broken Pattern Co Partially").first().is_some_and(|hit| hit.entry.model == "Partially"));
  }

  #[test]
  fn examples_are_checked_against_patterns() {
    let mut index = CatalogIndex::new();
    let catalog = index
      .load_str(
        Category::Soap,
        r#"
artisan:
  Noble Otter:
    Barrbarr:
      patterns: ['noble\s*otter.*barrbarr']
      examples: ['Noble Otter Barrbarr', 'Barrbarr']
    patterns: ['noble\s*otter']
    examples: ['Noble  Otter']
"#,
      )
      .unwrap();

    assert_eq!(catalog.entries().len(), 2);
    assert_eq!(catalog.entries()[0].examples.len(), 2);
    assert_eq!(catalog.diagnostics().len(), 1);
    assert_eq!(catalog.diagnostics()[0].location, "Noble Otter Barrbarr");
    assert!(catalog.diagnostics()[0].message.contains("\"Barrbarr\""));
  }

  #[test]
  fn empty_category_is_fatal() {
    let mut index = CatalogIndex::new();
    let result = index.load_str(Category::Soap, "artisan:\n  Nobody:\n    Nothing:\n      patterns: ['(']\n");

    assert!(matches!(result, Err(SotdError::EmptyCatalog(Category::Soap))));
    assert!(index.category(Category::Soap).is_none());
  }

  #[test]
  fn find_entries() {
    let index = fixtures::catalogs();
    let entry = index.find(Category::Knot, "declaration grooming", "b2").unwrap();

    assert_eq!(entry.authority, Authority::Artisan);
    assert_eq!(entry.attribute("fiber"), Some(&AttributeValue::from("Badger")));
    assert_eq!(entry.attribute("knot_size_mm"), Some(&AttributeValue::Integer(26)));
    assert!(index.find(Category::Knot, "Declaration Grooming", "B99").is_none());
  }

  #[test]
  fn load_dir_skips_broken_categories() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("razors.yaml"), fixtures::RAZORS).unwrap();
    fs::write(dir.path().join("soaps.yaml"), "- not\n- a mapping\n").unwrap();

    let index = CatalogIndex::load_dir(dir.path()).unwrap();

    assert!(index.category(Category::Razor).is_some());
    assert!(index.category(Category::Soap).is_none());
    assert!(index.diagnostics().any(|d| d.category == Category::Soap));
  }

  #[test]
  fn load_dir_survives_unreadable_documents() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("razors.yaml"), fixtures::RAZORS).unwrap();
    fs::write(dir.path().join("soaps.yaml"), b"artisan:\n  Caf\xe9:\n    patterns: ['cafe']\n").unwrap();

    let index = CatalogIndex::load_dir(dir.path()).unwrap();

    assert!(index.category(Category::Razor).is_some());
    assert!(index.category(Category::Soap).is_none());
    assert!(index.diagnostics().any(|d| d.category == Category::Soap && d.message.starts_with("could not read")));
  }

  #[test]
  fn load_dir_requires_one_catalog() {
    let dir = tempfile::tempdir().unwrap();

    assert!(CatalogIndex::load_dir(dir.path()).is_err());
  }

  #[test]
  fn bundled_catalogs() {
    let index = CatalogIndex::bundled().unwrap();

    for category in Category::ALL {
      let catalog = index.category(category).unwrap();

      assert!(!catalog.entries().is_empty());
      assert!(catalog.diagnostics().is_empty(), "{category}: {:?}", catalog.diagnostics());
    }
  }
}
