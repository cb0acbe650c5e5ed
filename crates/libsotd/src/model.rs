use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::SotdError;

/// Product category a free-text description is matched against.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Razor,
  Blade,
  Brush,
  Soap,
  Handle,
  Knot,
}

impl Category {
  pub const ALL: [Category; 6] = [Category::Razor, Category::Blade, Category::Brush, Category::Soap, Category::Handle, Category::Knot];

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Razor => "razor",
      Category::Blade => "blade",
      Category::Brush => "brush",
      Category::Soap => "soap",
      Category::Handle => "handle",
      Category::Knot => "knot",
    }
  }

  /// Name of the catalog document holding this category.
  pub fn file_name(&self) -> &'static str {
    match self {
      Category::Razor => "razors.yaml",
      Category::Blade => "blades.yaml",
      Category::Brush => "brushes.yaml",
      Category::Soap => "soaps.yaml",
      Category::Handle => "handles.yaml",
      Category::Knot => "knots.yaml",
    }
  }

  /// Composite categories describe a handle and a knot in the same string.
  pub fn is_composite(&self) -> bool {
    matches!(self, Category::Brush)
  }

  /// Attributes a fully documented entry of this category carries.
  pub fn expected_attributes(&self) -> &'static [&'static str] {
    match self {
      Category::Razor => &["format", "material"],
      Category::Blade => &["format"],
      Category::Brush => &["fiber", "knot_size_mm", "handle_maker"],
      Category::Soap => &["scent", "base"],
      Category::Handle => &["material"],
      Category::Knot => &["fiber", "knot_size_mm"],
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = SotdError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_lowercase().as_str() {
      "razor" | "razors" => Ok(Category::Razor),
      "blade" | "blades" => Ok(Category::Blade),
      "brush" | "brushes" => Ok(Category::Brush),
      "soap" | "soaps" => Ok(Category::Soap),
      "handle" | "handles" => Ok(Category::Handle),
      "knot" | "knots" => Ok(Category::Knot),
      other => Err(SotdError::ConfigError(format!("unknown category: {other}"))),
    }
  }
}

/// How established the maker behind an entry is, declared by the catalog
/// section the entry lives in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
  Other,
  Artisan,
  Manufacturer,
}

impl Authority {
  pub(crate) fn weight(&self) -> f64 {
    match self {
      Authority::Manufacturer => 1.0,
      Authority::Artisan => 0.6,
      Authority::Other => 0.3,
    }
  }
}

impl FromStr for Authority {
  type Err = SotdError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "manufacturer" => Ok(Authority::Manufacturer),
      "artisan" => Ok(Authority::Artisan),
      "other" => Ok(Authority::Other),
      other => Err(SotdError::ConfigError(format!("unknown catalog section: {other}"))),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
  Bool(bool),
  Integer(i64),
  Float(f64),
  Text(String),
}

impl fmt::Display for AttributeValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AttributeValue::Bool(value) => write!(f, "{value}"),
      AttributeValue::Integer(value) => write!(f, "{value}"),
      AttributeValue::Float(value) => write!(f, "{value}"),
      AttributeValue::Text(value) => f.write_str(value),
    }
  }
}

impl From<&str> for AttributeValue {
  fn from(value: &str) -> Self {
    AttributeValue::Text(value.to_string())
  }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct EntryId {
  pub category: Category,
  pub brand: String,
  pub model: String,
}

impl fmt::Display for EntryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.model.is_empty() {
      true => write!(f, "{}:{}", self.category, self.brand),
      false => write!(f, "{}:{} {}", self.category, self.brand, self.model),
    }
  }
}

/// A known product, as declared in a catalog document.
///
/// Entries are owned by the [`CatalogIndex`](crate::catalog::CatalogIndex)
/// and shared by reference with everything else.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
  pub category: Category,
  pub brand: String,
  pub model: String,
  pub authority: Authority,
  /// Declared with brand-level patterns rather than as a model.
  #[serde(skip)]
  pub brand_wide: bool,
  #[serde(skip)]
  pub patterns: Vec<String>,
  /// Texts documented as designating this entry.
  #[serde(skip)]
  pub examples: Vec<String>,
  pub attributes: Attributes,
  #[serde(skip)]
  pub(crate) ordinal: usize,
}

impl CatalogEntry {
  pub fn id(&self) -> EntryId {
    EntryId {
      category: self.category,
      brand: self.brand.clone(),
      model: self.model.clone(),
    }
  }

  pub fn is(&self, brand: &str, model: &str) -> bool {
    self.brand.eq_ignore_ascii_case(brand) && self.model.eq_ignore_ascii_case(model)
  }

  /// Position of the entry in its catalog, in declaration order.
  pub fn ordinal(&self) -> usize {
    self.ordinal
  }

  pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
    self.attributes.get(name)
  }

  /// Device format the entry is declared for, if any.
  pub fn format(&self) -> Option<&str> {
    match self.attributes.get("format") {
      Some(AttributeValue::Text(format)) => Some(format),
      _ => None,
    }
  }

  pub fn display_name(&self) -> String {
    match self.model.is_empty() {
      true => self.brand.clone(),
      false => format!("{} {}", self.brand, self.model),
    }
  }
}

/// Named algorithm attempted by the orchestrator, in hierarchy order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
  CorrectMatch,
  KnownEntry,
  DualComponent,
  AutomatedSplit,
  WholeString,
  NoMatch,
}

impl Strategy {
  /// Rank in the strategy hierarchy, lower is stronger.
  pub fn priority(&self) -> u8 {
    match self {
      Strategy::CorrectMatch => 0,
      Strategy::KnownEntry => 1,
      Strategy::DualComponent => 2,
      Strategy::AutomatedSplit => 3,
      Strategy::WholeString => 4,
      Strategy::NoMatch => 5,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Strategy::CorrectMatch => "correct_match",
      Strategy::KnownEntry => "known_entry",
      Strategy::DualComponent => "dual_component",
      Strategy::AutomatedSplit => "automated_split",
      Strategy::WholeString => "whole_string",
      Strategy::NoMatch => "no_match",
    }
  }

  /// Whether the strategy matched the text against a catalog pattern
  /// as written, rather than through a heuristic.
  pub fn is_structural(&self) -> bool {
    matches!(self, Strategy::CorrectMatch | Strategy::KnownEntry | Strategy::DualComponent)
  }
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matched {
  Entry(Arc<CatalogEntry>),
  Composite {
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<Arc<CatalogEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    knot: Option<Arc<CatalogEntry>>,
  },
}

impl Matched {
  pub fn entry(&self) -> Option<&CatalogEntry> {
    match self {
      Matched::Entry(entry) => Some(entry.as_ref()),
      Matched::Composite { .. } => None,
    }
  }

  pub fn handle(&self) -> Option<&CatalogEntry> {
    match self {
      Matched::Composite { handle, .. } => handle.as_deref(),
      Matched::Entry(_) => None,
    }
  }

  pub fn knot(&self) -> Option<&CatalogEntry> {
    match self {
      Matched::Composite { knot, .. } => knot.as_deref(),
      Matched::Entry(_) => None,
    }
  }

  /// All catalog entries referenced by the match.
  pub fn entries(&self) -> Vec<&CatalogEntry> {
    match self {
      Matched::Entry(entry) => vec![entry.as_ref()],
      Matched::Composite { handle, knot } => handle.iter().chain(knot.iter()).map(|entry| entry.as_ref()).collect(),
    }
  }

  /// Whether two matches designate the same catalog entities.
  pub fn same_target(&self, other: &Matched) -> bool {
    let ids = |matched: &Matched| match matched {
      Matched::Entry(entry) => (Some(entry.id()), None),
      Matched::Composite { handle, knot } => (handle.as_ref().map(|e| e.id()), knot.as_ref().map(|e| e.id())),
    };

    matches!((self, other), (Matched::Entry(_), Matched::Entry(_)) | (Matched::Composite { .. }, Matched::Composite { .. })) && ids(self) == ids(other)
  }

  pub fn describe(&self) -> String {
    match self {
      Matched::Entry(entry) => entry.display_name(),
      Matched::Composite { handle, knot } => format!(
        "{} / {}",
        handle.as_ref().map(|e| e.display_name()).unwrap_or_else(|| "?".into()),
        knot.as_ref().map(|e| e.display_name()).unwrap_or_else(|| "?".into())
      ),
    }
  }
}

/// Outcome of matching one free-text description.
#[derive(Clone, Debug, Serialize)]
pub struct MatchResult {
  pub original_text: String,
  pub category: Category,
  pub matched: Option<Matched>,
  pub strategy: Strategy,
  pub confidence: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pattern_used: Option<String>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub attributes: Attributes,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub usage_count: Option<u32>,
  pub features: Vec<(&'static str, f64)>,
  pub diagnostics: Vec<String>,
}

impl MatchResult {
  pub(crate) fn unmatched(category: Category, text: &str, diagnostics: Vec<String>) -> MatchResult {
    MatchResult {
      original_text: text.to_string(),
      category,
      matched: None,
      strategy: Strategy::NoMatch,
      confidence: 0.0,
      pattern_used: None,
      attributes: Attributes::default(),
      usage_count: None,
      features: Vec::new(),
      diagnostics,
    }
  }

  pub fn is_match(&self) -> bool {
    self.matched.is_some()
  }

  /// Matched entry for single-entity results.
  pub fn matched_entity(&self) -> Option<&CatalogEntry> {
    self.matched.as_ref().and_then(Matched::entry)
  }
}
