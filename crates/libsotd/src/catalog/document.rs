use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use validator::Validate;

use crate::{
  catalog::LoadDiagnostic,
  error::SotdError,
  model::{AttributeValue, Attributes, Authority, Category},
  yaml::{self, DuplicateKey},
};

const DEFAULTS_KEY: &str = "defaults";
const PATTERNS_KEY: &str = "patterns";
const MODEL_KEY: &str = "model";
const EXAMPLES_KEY: &str = "examples";

#[derive(Debug, Deserialize, Validate)]
struct ModelDocument {
  #[validate(length(min = 1, message = "at least one pattern must be given"))]
  patterns: Vec<String>,
  #[serde(default)]
  examples: Vec<String>,
  #[serde(flatten)]
  attributes: Attributes,
}

/// Entry read from a catalog document, before its patterns are compiled.
#[derive(Debug)]
pub(crate) struct EntryDraft {
  pub(crate) brand: String,
  pub(crate) model: String,
  pub(crate) authority: Authority,
  pub(crate) brand_wide: bool,
  pub(crate) patterns: Vec<String>,
  pub(crate) examples: Vec<String>,
  pub(crate) attributes: Attributes,
}

impl EntryDraft {
  pub(crate) fn location(&self) -> String {
    match self.model.is_empty() {
      true => self.brand.clone(),
      false => format!("{} {}", self.brand, self.model),
    }
  }
}

/// Read a catalog document into entry drafts, in declaration order.
///
/// Only a document that is not a mapping at all is an error. Every other
/// defect skips the smallest enclosing unit (attribute, model, brand or
/// section) and is reported as a diagnostic. A repeated key keeps its first
/// definition.
pub(crate) fn parse(category: Category, source: &str) -> Result<(Vec<EntryDraft>, Vec<LoadDiagnostic>), SotdError> {
  let (document, duplicates) = yaml::parse_mapping(source).map_err(|err| SotdError::InvalidDocument(category.file_name().to_string(), err.to_string()))?;

  let mut drafts = Vec::new();
  let mut diagnostics = duplicates
    .iter()
    .map(|duplicate| LoadDiagnostic::new(category, duplicate_location(duplicate), duplicate.to_string()))
    .collect::<Vec<_>>();
  let mut defaults = Attributes::default();

  if let Some(value) = document.get(DEFAULTS_KEY) {
    match serde_yaml::from_value::<Attributes>(value.clone()) {
      Ok(values) => defaults = values,
      Err(err) => diagnostics.push(LoadDiagnostic::new(category, DEFAULTS_KEY, format!("invalid category defaults: {err}"))),
    }
  }

  for (section, brands) in &document {
    let Some(section) = key_string(section) else {
      diagnostics.push(LoadDiagnostic::new(category, "<root>", "section names must be scalars"));
      continue;
    };

    if section == DEFAULTS_KEY {
      continue;
    }

    let Ok(authority) = section.parse::<Authority>() else {
      diagnostics.push(LoadDiagnostic::new(category, &section, "unknown section, expected one of manufacturer, artisan or other"));
      continue;
    };

    let Value::Mapping(brands) = brands else {
      diagnostics.push(LoadDiagnostic::new(category, &section, "section must map brand names to brand definitions"));
      continue;
    };

    for (brand, body) in brands {
      let Some(brand) = key_string(brand) else {
        diagnostics.push(LoadDiagnostic::new(category, &section, "brand names must be scalars"));
        continue;
      };

      let Value::Mapping(body) = body else {
        diagnostics.push(LoadDiagnostic::new(category, &brand, "brand definition must be a mapping"));
        continue;
      };

      parse_brand(category, authority, &brand, body, &defaults, &mut drafts, &mut diagnostics);
    }
  }

  Ok((drafts, diagnostics))
}

fn parse_brand(category: Category, authority: Authority, brand: &str, body: &Mapping, defaults: &Attributes, drafts: &mut Vec<EntryDraft>, diagnostics: &mut Vec<LoadDiagnostic>) {
  let mut attributes = defaults.clone();
  let mut models = Vec::new();
  let mut brand_patterns = None;
  let mut brand_examples = Vec::new();

  for (key, value) in body {
    let Some(key) = key_string(key) else {
      diagnostics.push(LoadDiagnostic::new(category, brand, "keys must be scalars"));
      continue;
    };

    match value {
      Value::Mapping(_) => models.push((key, value)),
      Value::Sequence(_) if key == PATTERNS_KEY => brand_patterns = Some(value),

      Value::Sequence(_) if key == EXAMPLES_KEY => match serde_yaml::from_value::<Vec<String>>(value.clone()) {
        Ok(examples) => brand_examples = examples,
        Err(err) => diagnostics.push(LoadDiagnostic::new(category, brand, format!("malformed brand examples skipped: {err}"))),
      },

      _ => match serde_yaml::from_value::<AttributeValue>(value.clone()) {
        Ok(attribute) => {
          attributes.insert(key, attribute);
        }

        Err(_) => diagnostics.push(LoadDiagnostic::new(category, brand, format!("unsupported value for attribute {key}"))),
      },
    }
  }

  let brand_model = match attributes.remove(MODEL_KEY) {
    Some(AttributeValue::Text(model)) => model,
    Some(other) => other.to_string(),
    None => String::new(),
  };

  for (model, value) in models {
    let location = format!("{brand} {model}");

    let document = match serde_yaml::from_value::<ModelDocument>(value.clone()) {
      Ok(document) => document,
      Err(err) => {
        diagnostics.push(LoadDiagnostic::new(category, &location, format!("malformed entry skipped: {err}")));
        continue;
      }
    };

    if let Err(err) = document.validate() {
      diagnostics.push(LoadDiagnostic::new(category, &location, format!("malformed entry skipped: {err}")));
      continue;
    }

    let mut model_attributes = attributes.clone();
    model_attributes.extend(document.attributes);

    drafts.push(EntryDraft {
      brand: brand.to_string(),
      model,
      authority,
      brand_wide: false,
      patterns: document.patterns,
      examples: document.examples,
      attributes: model_attributes,
    });
  }

  // Brand-wide patterns are the broadest, so they come after the models.
  if let Some(patterns) = brand_patterns {
    match serde_yaml::from_value::<Vec<String>>(patterns.clone()) {
      Ok(patterns) if !patterns.is_empty() => drafts.push(EntryDraft {
        brand: brand.to_string(),
        model: brand_model,
        authority,
        brand_wide: true,
        patterns,
        examples: brand_examples,
        attributes,
      }),

      Ok(_) => diagnostics.push(LoadDiagnostic::new(category, brand, "empty brand pattern list skipped")),
      Err(err) => diagnostics.push(LoadDiagnostic::new(category, brand, format!("malformed brand patterns skipped: {err}"))),
    }
  }
}

/// Brand and model holding a duplicate, or the duplicated key itself above
/// model level.
fn duplicate_location(duplicate: &DuplicateKey) -> String {
  let mut parts = duplicate.path.iter().skip(1).take(2).cloned().collect::<Vec<_>>();

  if parts.len() < 2 {
    parts.push(duplicate.key.clone());
  }

  parts.join(" ")
}

fn key_string(value: &Value) -> Option<String> {
  match value {
    Value::String(value) => Some(value.clone()),
    Value::Number(value) => Some(value.to_string()),
    Value::Bool(value) => Some(value.to_string()),
    _ => None,
  }
}
