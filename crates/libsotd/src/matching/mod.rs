use std::sync::LazyLock;

use regex::Regex;

use crate::{
  catalog::{CatalogHit, CatalogIndex},
  formats::{self, FormatAffinity},
  model::{AttributeValue, Attributes, Category},
  normalize::collapse_whitespace,
  splitting::hints,
};

static HANDLE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bhandle\b").unwrap());
static KNOT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bknot\b").unwrap());

/// A catalog hit, with how well it fits the device format of the post.
#[derive(Clone, Debug)]
pub struct RankedHit {
  pub hit: CatalogHit,
  pub affinity: FormatAffinity,
}

/// Resolves text against the catalog of one category.
#[derive(Clone, Copy, Debug)]
pub struct CatalogMatcher<'c> {
  catalogs: &'c CatalogIndex,
  category: Category,
}

impl<'c> CatalogMatcher<'c> {
  pub fn new(catalogs: &'c CatalogIndex, category: Category) -> CatalogMatcher<'c> {
    CatalogMatcher { catalogs, category }
  }

  /// Structural matches of `text`, re-ranked by format affinity.
  ///
  /// Entries declared for the hinted format come first, then entries of a
  /// compatible format, then entries declaring no format. Entries declared
  /// for an incompatible format come last but are kept. Within a rank, the
  /// catalog order (models before brand-wide entries, specificity, then
  /// declaration) is preserved.
  pub fn candidates(&self, text: &str, format_hint: Option<&str>) -> Vec<RankedHit> {
    let mut hits = self
      .catalogs
      .lookup(self.category, text)
      .into_iter()
      .map(|hit| {
        let affinity = formats::affinity(hit.entry.format(), format_hint);

        RankedHit { hit, affinity }
      })
      .collect::<Vec<_>>();

    hits.sort_by(|lhs, rhs| rhs.affinity.cmp(&lhs.affinity));
    hits
  }
}

fn strip_keyword(pattern: &Regex, text: &str) -> String {
  collapse_whitespace(&pattern.replace_all(text, " "))
}

/// Resolves the handle half of a composite description.
#[derive(Clone, Copy, Debug)]
pub struct HandleMatcher<'c>(CatalogMatcher<'c>);

impl<'c> HandleMatcher<'c> {
  pub fn new(catalogs: &'c CatalogIndex) -> HandleMatcher<'c> {
    HandleMatcher(CatalogMatcher::new(catalogs, Category::Handle))
  }

  pub fn candidates(&self, text: &str) -> Vec<CatalogHit> {
    let text = strip_keyword(&HANDLE_KEYWORD, text);

    self.0.candidates(&text, None).into_iter().map(|ranked| ranked.hit).collect()
  }
}

/// Fiber and knot size stated by the user, next to a catalog entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KnotDetails {
  pub fiber: Option<&'static str>,
  pub knot_size_mm: Option<f64>,
}

impl KnotDetails {
  pub fn from_text(text: &str) -> KnotDetails {
    KnotDetails {
      fiber: hints::fiber(text),
      knot_size_mm: hints::knot_size(text),
    }
  }

  /// Apply the stated details over catalog attributes.
  ///
  /// Returns a diagnostic for every catalog value the user contradicted.
  pub fn apply(&self, attributes: &mut Attributes) -> Vec<String> {
    let mut diagnostics = Vec::new();

    let stated = [
      ("fiber", self.fiber.map(AttributeValue::from)),
      ("knot_size_mm", self.knot_size_mm.map(size_value)),
    ];

    for (name, value) in stated {
      let Some(value) = value else {
        continue;
      };

      match attributes.insert(name.to_string(), value.clone()) {
        Some(previous) if !same_value(&previous, &value) => diagnostics.push(format!("stated {name} {value} overrides catalog value {previous}")),
        _ => {}
      }
    }

    diagnostics
  }
}

fn size_value(size: f64) -> AttributeValue {
  match size.fract() == 0.0 {
    true => AttributeValue::Integer(size as i64),
    false => AttributeValue::Float(size),
  }
}

fn same_value(lhs: &AttributeValue, rhs: &AttributeValue) -> bool {
  match (lhs, rhs) {
    (AttributeValue::Text(lhs), AttributeValue::Text(rhs)) => lhs.eq_ignore_ascii_case(rhs),
    (AttributeValue::Integer(lhs), AttributeValue::Float(rhs)) | (AttributeValue::Float(rhs), AttributeValue::Integer(lhs)) => *lhs as f64 == *rhs,
    (lhs, rhs) => lhs == rhs,
  }
}

/// Resolves the knot half of a composite description.
#[derive(Clone, Copy, Debug)]
pub struct KnotMatcher<'c>(CatalogMatcher<'c>);

impl<'c> KnotMatcher<'c> {
  pub fn new(catalogs: &'c CatalogIndex) -> KnotMatcher<'c> {
    KnotMatcher(CatalogMatcher::new(catalogs, Category::Knot))
  }

  pub fn candidates(&self, text: &str) -> Vec<CatalogHit> {
    let text = strip_keyword(&KNOT_KEYWORD, text);

    self.0.candidates(&text, None).into_iter().map(|ranked| ranked.hit).collect()
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    formats::FormatAffinity,
    model::{AttributeValue, Attributes, Category},
    tests::fixtures,
  };

  use super::{CatalogMatcher, HandleMatcher, KnotDetails, KnotMatcher};

  #[test]
  fn format_hint_reranks() {
    let catalogs = fixtures::catalogs();
    let matcher = CatalogMatcher::new(&catalogs, Category::Blade);

    let gem = matcher.candidates("Personna", Some("GEM"));
    let injector = matcher.candidates("Personna", Some("Injector"));

    assert!(gem[0].hit.entry.is("Personna", "GEM PTFE"));
    assert_eq!(gem[0].affinity, FormatAffinity::Exact);
    assert!(injector[0].hit.entry.is("Personna", "Injector"));
    assert_eq!(injector.len(), 2);
  }

  #[test]
  fn conflicting_entries_are_kept() {
    let catalogs = fixtures::catalogs();
    let hits = CatalogMatcher::new(&catalogs, Category::Blade).candidates("Feather", Some("AC"));

    assert_eq!(hits.len(), 1);
    assert!(hits[0].hit.entry.is("Feather", "Hi-Stainless"));
    assert_eq!(hits[0].affinity, FormatAffinity::Conflicting);
  }

  #[test]
  fn group_outranks_unspecified() {
    let catalogs = fixtures::catalogs();
    let hits = CatalogMatcher::new(&catalogs, Category::Blade).candidates("Personna", Some("Half DE"));

    assert!(hits.iter().all(|ranked| ranked.affinity == FormatAffinity::Conflicting));

    let hits = CatalogMatcher::new(&catalogs, Category::Blade).candidates("Personna Lab Blue", Some("Half DE"));

    assert!(hits[0].hit.entry.is("Personna", "Lab Blue"));
    assert_eq!(hits[0].affinity, FormatAffinity::Group);
  }

  #[test]
  fn handle_and_knot_matchers() {
    let catalogs = fixtures::catalogs();

    let handles = HandleMatcher::new(&catalogs).candidates("Southland 1 in. x 3 in. Galvanized Nipple Handle");
    let knots = KnotMatcher::new(&catalogs).candidates("AKA Brushworx AK47 knot");

    assert!(handles[0].entry.is("Southland", "Galvanized Nipple"));
    assert!(knots[0].entry.is("AKA Brushworx", "AK47"));
    assert!(HandleMatcher::new(&catalogs).candidates("handle").is_empty());
  }

  #[test]
  fn stated_details_override_catalog() {
    let mut attributes = Attributes::from([("fiber".to_string(), AttributeValue::from("Badger")), ("knot_size_mm".to_string(), AttributeValue::Integer(26))]);

    let details = KnotDetails::from_text("Declaration B2 boar 26mm");
    let diagnostics = details.apply(&mut attributes);

    assert_eq!(attributes["fiber"], AttributeValue::from("Boar"));
    assert_eq!(attributes["knot_size_mm"], AttributeValue::Integer(26));
    assert_eq!(diagnostics.len(), 1);

    assert!(KnotDetails::from_text("Declaration B2").apply(&mut attributes).is_empty());
  }
}
