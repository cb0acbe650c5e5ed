use regex::{Regex, RegexBuilder};

#[derive(Clone, Debug)]
pub(crate) struct CompiledPattern {
  pub(crate) regex: Regex,
  pub(crate) source: String,
  pub(crate) specificity: usize,
}

/// Compile a catalog pattern. Catalog patterns never depend on case.
pub(crate) fn compile(source: &str) -> Result<CompiledPattern, regex::Error> {
  let regex = RegexBuilder::new(source).case_insensitive(true).size_limit(1 << 20).build()?;

  Ok(CompiledPattern {
    regex,
    source: source.to_string(),
    specificity: specificity(source),
  })
}

/// Count of literal characters a pattern requires to match.
///
/// Escapes, group flags and repetition bounds do not count, a character
/// class counts as one.
pub(crate) fn specificity(source: &str) -> usize {
  let mut count = 0;
  let mut chars = source.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '\\' => {
        chars.next();
      }

      '[' => {
        for c in chars.by_ref() {
          if c == ']' {
            break;
          }
        }

        count += 1;
      }

      '{' => {
        for c in chars.by_ref() {
          if c == '}' {
            break;
          }
        }
      }

      '(' if chars.peek() == Some(&'?') => {
        for c in chars.by_ref() {
          if c == ':' || c == ')' {
            break;
          }
        }
      }

      c if c.is_alphanumeric() => count += 1,

      _ => {}
    }
  }

  count
}

#[cfg(test)]
mod tests {
  #[test]
  fn compile_is_case_insensitive() {
    let pattern = super::compile(r"\bastra\b.*\bsp\b").unwrap();

    assert!(pattern.regex.is_match("ASTRA Superior Platinum SP"));
    assert_eq!(pattern.source, r"\bastra\b.*\bsp\b");
  }

  #[test]
  fn compile_rejects_invalid_patterns() {
    assert!(super::compile(r"feather(").is_err());
    assert!(super::compile(r"[unterminated").is_err());
  }

  #[test]
  fn specificity() {
    assert_eq!(super::specificity(r"\bastra\b.*\bsp\b"), 7);
    assert_eq!(super::specificity(r"(?:simpson)?.*chubby\s*[23]"), 14);
    assert_eq!(super::specificity(r"ak\s*-?\s*47"), 4);
    assert_eq!(super::specificity(r"\d{2}mm"), 2);
    assert!(super::specificity(r"karve.*christopher.*bradley") > super::specificity(r"karve"));
  }
}
