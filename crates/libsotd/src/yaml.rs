use std::fmt;

use serde::{
  Deserialize, Deserializer,
  de::{self, MapAccess, SeqAccess, Visitor},
};
use serde_yaml::{Mapping, Value};

/// A key defined more than once in the same mapping.
///
/// Only the first definition is kept.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DuplicateKey {
  /// Keys leading to the mapping holding the duplicate, outermost first.
  pub(crate) path: Vec<String>,
  pub(crate) key: String,
}

impl fmt::Display for DuplicateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.path.is_empty() {
      true => write!(f, "duplicate key {:?} skipped", self.key),
      false => write!(f, "duplicate key {:?} under {} skipped", self.key, self.path.join(".")),
    }
  }
}

/// YAML value read without failing on duplicate keys.
struct Lenient {
  value: Value,
  duplicates: Vec<DuplicateKey>,
}

impl Lenient {
  fn scalar(value: Value) -> Lenient {
    Lenient { value, duplicates: Vec::new() }
  }
}

impl<'de> Deserialize<'de> for Lenient {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    deserializer.deserialize_any(LenientVisitor)
  }
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
  type Value = Lenient;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("any YAML value")
  }

  fn visit_bool<E: de::Error>(self, value: bool) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::Bool(value)))
  }

  fn visit_i64<E: de::Error>(self, value: i64) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::Number(value.into())))
  }

  fn visit_u64<E: de::Error>(self, value: u64) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::Number(value.into())))
  }

  fn visit_f64<E: de::Error>(self, value: f64) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::Number(value.into())))
  }

  fn visit_str<E: de::Error>(self, value: &str) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::String(value.to_owned())))
  }

  fn visit_string<E: de::Error>(self, value: String) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::String(value)))
  }

  fn visit_unit<E: de::Error>(self) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::Null))
  }

  fn visit_none<E: de::Error>(self) -> Result<Lenient, E> {
    Ok(Lenient::scalar(Value::Null))
  }

  fn visit_some<D>(self, deserializer: D) -> Result<Lenient, D::Error>
  where
    D: Deserializer<'de>,
  {
    Lenient::deserialize(deserializer)
  }

  fn visit_seq<A>(self, mut seq: A) -> Result<Lenient, A::Error>
  where
    A: SeqAccess<'de>,
  {
    let mut values = Vec::new();
    let mut duplicates = Vec::new();

    while let Some(item) = seq.next_element::<Lenient>()? {
      values.push(item.value);
      duplicates.extend(item.duplicates);
    }

    Ok(Lenient {
      value: Value::Sequence(values),
      duplicates,
    })
  }

  fn visit_map<A>(self, mut map: A) -> Result<Lenient, A::Error>
  where
    A: MapAccess<'de>,
  {
    let mut mapping = Mapping::new();
    let mut duplicates = Vec::new();

    while let Some(key) = map.next_key::<Value>()? {
      let value = map.next_value::<Lenient>()?;
      let name = key_name(&key);

      if mapping.contains_key(&key) {
        duplicates.push(DuplicateKey { path: Vec::new(), key: name });
        continue;
      }

      duplicates.extend(value.duplicates.into_iter().map(|mut duplicate| {
        duplicate.path.insert(0, name.clone());
        duplicate
      }));

      mapping.insert(key, value.value);
    }

    Ok(Lenient {
      value: Value::Mapping(mapping),
      duplicates,
    })
  }
}

fn key_name(key: &Value) -> String {
  match key {
    Value::String(key) => key.clone(),
    Value::Number(key) => key.to_string(),
    Value::Bool(key) => key.to_string(),
    other => format!("{other:?}"),
  }
}

/// Read a YAML mapping, keeping the first definition of repeated keys.
///
/// An empty document reads as an empty mapping.
pub(crate) fn parse_mapping(source: &str) -> Result<(Mapping, Vec<DuplicateKey>), serde_yaml::Error> {
  if source.trim().is_empty() {
    return Ok((Mapping::new(), Vec::new()));
  }

  let Lenient { value, duplicates } = serde_yaml::from_str::<Lenient>(source)?;

  match value {
    Value::Mapping(mapping) => Ok((mapping, duplicates)),
    Value::Null => Ok((Mapping::new(), duplicates)),
    _ => Err(de::Error::custom("expected a mapping at the top of the document")),
  }
}
