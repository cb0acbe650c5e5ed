use std::{collections::HashMap, fs, path::Path, sync::Arc};

use ahash::RandomState;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::{
  catalog::CatalogIndex,
  error::SotdError,
  formats::{self, FormatAffinity},
  model::{CatalogEntry, Category, Matched},
  normalize::normalize,
  yaml,
};

#[derive(Debug, Deserialize)]
struct TargetDocument {
  brand: String,
  #[serde(default)]
  model: String,
}

#[derive(Debug, Deserialize)]
struct ScopedDocument {
  format: String,
  #[serde(flatten)]
  target: TargetDocument,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OverrideDocument {
  Target(TargetDocument),
  Scoped(Vec<ScopedDocument>),
  Composite { handle: Option<TargetDocument>, knot: Option<TargetDocument> },
}

/// A human-confirmed match.
#[derive(Clone, Debug)]
pub struct OverrideEntry {
  pub category: Category,
  pub normalized_key: String,
  pub format_scope: Option<String>,
  pub target: Matched,
}

/// Override whose target is not (or no longer) in the catalogs.
#[derive(Clone, Debug, Serialize)]
pub struct UnresolvedOverride {
  pub category: Category,
  pub normalized_key: String,
  pub format_scope: Option<String>,
  pub reason: String,
}

#[derive(Debug)]
pub struct OverrideLookup<'s> {
  pub entry: &'s OverrideEntry,
  /// Set when several entries competed and one was picked by fallback.
  pub diagnostic: Option<String>,
}

/// Human-confirmed matches, consulted before any automated strategy.
///
/// The store is read-only once loaded. The same text may be confirmed
/// under several device formats, each pointing to a different entry.
#[derive(Debug, Default)]
pub struct CorrectMatchesStore {
  entries: HashMap<(Category, String), Vec<OverrideEntry>, RandomState>,
  order: Vec<(Category, String)>,
  unresolved: Vec<UnresolvedOverride>,
  diagnostics: Vec<String>,
}

impl CorrectMatchesStore {
  pub fn empty() -> CorrectMatchesStore {
    CorrectMatchesStore::default()
  }

  pub fn load(path: impl AsRef<Path>, catalogs: &CatalogIndex) -> Result<CorrectMatchesStore, SotdError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;

    CorrectMatchesStore::from_yaml(&source, catalogs)
  }

  /// Read an override document and resolve its targets against the catalogs.
  ///
  /// Targets that cannot be resolved are kept aside as
  /// [`UnresolvedOverride`]s rather than failing the load.
  pub fn from_yaml(source: &str, catalogs: &CatalogIndex) -> Result<CorrectMatchesStore, SotdError> {
    let (document, duplicates) = yaml::parse_mapping(source).map_err(|err| SotdError::InvalidDocument("correct matches".into(), err.to_string()))?;
    let mut store = CorrectMatchesStore::default();

    store.diagnostics.extend(duplicates.iter().map(ToString::to_string));

    for (category, overrides) in &document {
      let Some(category) = category.as_str().and_then(|name| name.parse::<Category>().ok()) else {
        store.diagnostics.push(format!("unknown override category {category:?} skipped"));
        continue;
      };

      let Value::Mapping(overrides) = overrides else {
        store.diagnostics.push(format!("overrides for {category} must be a mapping"));
        continue;
      };

      for (text, target) in overrides {
        let Some(text) = text.as_str() else {
          store.diagnostics.push(format!("{category}: override keys must be strings"));
          continue;
        };

        match serde_yaml::from_value::<OverrideDocument>(target.clone()) {
          Ok(document) => store.record(catalogs, category, &normalize(text), document),
          Err(err) => store.diagnostics.push(format!("{category} {text:?}: malformed override skipped: {err}")),
        }
      }
    }

    for diagnostic in &store.diagnostics {
      tracing::warn!("{diagnostic}");
    }

    tracing::info!(overrides = store.len(), unresolved = store.unresolved.len(), "loaded correct matches");

    Ok(store)
  }

  fn record(&mut self, catalogs: &CatalogIndex, category: Category, key: &str, document: OverrideDocument) {
    match document {
      OverrideDocument::Target(target) => {
        let resolved = resolve(catalogs, category, &target);

        self.push(category, key, None, resolved.map(Matched::Entry));
      }

      OverrideDocument::Composite { handle, knot } => {
        let resolved = match (category.is_composite(), &handle, &knot) {
          (false, _, _) => Err(format!("{category} entries cannot be split into handle and knot")),
          (true, None, None) => Err("composite override names neither a handle nor a knot".to_string()),

          (true, _, _) => {
            let handle = handle.as_ref().map(|target| resolve(catalogs, Category::Handle, target)).transpose();
            let knot = knot.as_ref().map(|target| resolve(catalogs, Category::Knot, target)).transpose();

            handle.and_then(|handle| knot.map(|knot| Matched::Composite { handle, knot }))
          }
        };

        self.push(category, key, None, resolved);
      }

      OverrideDocument::Scoped(scopes) => {
        for scope in scopes {
          let resolved = resolve(catalogs, category, &scope.target);

          self.push(category, key, Some(scope.format), resolved.map(Matched::Entry));
        }
      }
    }
  }

  fn push(&mut self, category: Category, key: &str, format_scope: Option<String>, target: Result<Matched, String>) {
    let target = match target {
      Ok(target) => target,
      Err(reason) => {
        self.diagnostics.push(format!("{category} {key:?}: {reason}"));
        self.unresolved.push(UnresolvedOverride {
          category,
          normalized_key: key.to_string(),
          format_scope,
          reason,
        });

        return;
      }
    };

    let slot = (category, key.to_string());

    if !self.entries.contains_key(&slot) {
      self.order.push(slot.clone());
    }

    let entries = self.entries.entry(slot).or_default();

    if entries.iter().any(|entry| entry.format_scope.as_deref().map(str::to_lowercase) == format_scope.as_deref().map(str::to_lowercase)) {
      self.diagnostics.push(format!("{category} {key:?}: duplicate override for the same format ignored"));
      return;
    }

    entries.push(OverrideEntry {
      category,
      normalized_key: key.to_string(),
      format_scope,
      target,
    });
  }

  pub fn len(&self) -> usize {
    self.entries.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Every resolved override, in document order.
  pub fn entries(&self) -> impl Iterator<Item = &OverrideEntry> {
    self.order.iter().filter_map(|slot| self.entries.get(slot)).flatten()
  }

  pub fn unresolved(&self) -> &[UnresolvedOverride] {
    &self.unresolved
  }

  pub fn diagnostics(&self) -> &[String] {
    &self.diagnostics
  }

  /// Find the confirmed match for a text.
  ///
  /// When the text was confirmed several times under different formats, the
  /// entry whose scope fits `format_hint` best (exact, then compatible) wins.
  /// If none fits, the first recorded entry is returned along with a
  /// diagnostic describing the ambiguity.
  pub fn lookup(&self, category: Category, text: &str, format_hint: Option<&str>) -> Option<OverrideLookup<'_>> {
    let key = normalize(text);
    let entries = self.entries.get(&(category, key))?;

    let (first, rest) = entries.split_first()?;

    if rest.is_empty() {
      return Some(OverrideLookup { entry: first, diagnostic: None });
    }

    let affinity = |entry: &OverrideEntry| formats::affinity(entry.format_scope.as_deref(), format_hint);
    let best = entries.iter().map(affinity).max().unwrap_or(FormatAffinity::Unspecified);

    let survivors = entries
      .iter()
      .filter(|entry| best >= FormatAffinity::Group && affinity(*entry) == best)
      .collect::<Vec<_>>();

    match survivors.as_slice() {
      [only] => Some(OverrideLookup { entry: *only, diagnostic: None }),

      [] => Some(OverrideLookup {
        entry: first,
        diagnostic: Some(format!(
          "ambiguous override: {} formats confirmed for this text, none compatible with {}, using the first recorded",
          entries.len(),
          format_hint.unwrap_or("an unknown format")
        )),
      }),

      [pick, ..] => Some(OverrideLookup {
        entry: *pick,
        diagnostic: Some(format!("ambiguous override: {} formats equally compatible, using the first recorded", survivors.len())),
      }),
    }
  }

  /// How many times a text was corrected by a human, including corrections
  /// whose target no longer resolves.
  pub fn correction_count(&self, category: Category, text: &str) -> usize {
    let key = normalize(text);
    let resolved = self.entries.get(&(category, key.clone())).map(Vec::len).unwrap_or_default();
    let unresolved = self.unresolved.iter().filter(|entry| entry.category == category && entry.normalized_key == key).count();

    resolved + unresolved
  }
}

fn resolve(catalogs: &CatalogIndex, category: Category, target: &TargetDocument) -> Result<Arc<CatalogEntry>, String> {
  catalogs
    .find(category, &target.brand, &target.model)
    .ok_or_else(|| format!("no {category} entry named {:?} {:?}", target.brand, target.model))
}
