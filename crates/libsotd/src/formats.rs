use serde::Serialize;

/// Razor formats that accept the same blades.
const FORMAT_GROUPS: &[&[&str]] = &[
  &["DE", "Half DE", "Half DE (multi-blade)", "Shavette (DE)", "Shavette (Half DE)"],
  &["AC", "Shavette (AC)"],
  &["GEM"],
  &["Injector", "Shavette (Injector)"],
  &["Shavette (Hair Shaper)"],
  &["Straight"],
  &["Cartridge/Disposable"],
];

/// How well an entry's declared format fits the device format of a post.
///
/// Variants are ordered from worst to best fit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatAffinity {
  Conflicting,
  Unspecified,
  Group,
  Exact,
}

fn group_of(format: &str) -> Option<usize> {
  FORMAT_GROUPS.iter().position(|group| group.iter().any(|candidate| candidate.eq_ignore_ascii_case(format.trim())))
}

/// Compare a declared format against a hint.
///
/// Without a hint, or without a declared format, nothing can be told apart
/// and the affinity is [`FormatAffinity::Unspecified`].
pub fn affinity(declared: Option<&str>, hint: Option<&str>) -> FormatAffinity {
  let (Some(declared), Some(hint)) = (declared, hint) else {
    return FormatAffinity::Unspecified;
  };

  if declared.trim().eq_ignore_ascii_case(hint.trim()) {
    return FormatAffinity::Exact;
  }

  match (group_of(declared), group_of(hint)) {
    (Some(lhs), Some(rhs)) if lhs == rhs => FormatAffinity::Group,
    _ => FormatAffinity::Conflicting,
  }
}
