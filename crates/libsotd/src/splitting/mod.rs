use std::{collections::VecDeque, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

pub(crate) mod delimiters;
pub mod hints;

pub use delimiters::DelimiterType;

use delimiters::Occurrence;

static KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(handle|knot)\b").unwrap());

/// Which half of a split describes which component.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
  HandleFirst,
  KnotFirst,
}

/// A composite description divided into its two halves.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitResult {
  pub original_text: String,
  pub first_part: String,
  pub second_part: String,
  pub delimiter_type: DelimiterType,
  pub split_confidence: f64,
  pub orientation: Orientation,
}

impl SplitResult {
  pub fn handle_part(&self) -> &str {
    match self.orientation {
      Orientation::HandleFirst => &self.first_part,
      Orientation::KnotFirst => &self.second_part,
    }
  }

  pub fn knot_part(&self) -> &str {
    match self.orientation {
      Orientation::HandleFirst => &self.second_part,
      Orientation::KnotFirst => &self.first_part,
    }
  }

  /// The same split, read the other way around.
  pub fn swapped(&self) -> SplitResult {
    SplitResult {
      orientation: match self.orientation {
        Orientation::HandleFirst => Orientation::KnotFirst,
        Orientation::KnotFirst => Orientation::HandleFirst,
      },
      ..self.clone()
    }
  }
}

/// A delimiter occurrence that was found but turned down.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RejectedCandidate {
  pub delimiter: DelimiterType,
  pub position: usize,
  pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitReport {
  pub split: Option<SplitResult>,
  pub rejected: Vec<RejectedCandidate>,
}

impl SplitReport {
  /// Rejected candidates, as human-readable diagnostics.
  pub fn diagnostics(&self) -> Vec<String> {
    self
      .rejected
      .iter()
      .map(|rejected| format!("{} delimiter at {} rejected: {}", rejected.delimiter, rejected.position, rejected.reason))
      .collect()
  }
}

#[derive(Debug)]
enum SplitState {
  NoDelimiterFound,
  DelimiterCandidateFound(Occurrence),
  ValidatedSplit(Occurrence),
  RejectedCandidate,
  FiberHintFallback,
  Split(SplitResult),
  Unsplittable,
}

impl SplitState {
  fn name(&self) -> &'static str {
    match self {
      SplitState::NoDelimiterFound => "no_delimiter_found",
      SplitState::DelimiterCandidateFound(_) => "delimiter_candidate_found",
      SplitState::ValidatedSplit(_) => "validated_split",
      SplitState::RejectedCandidate => "rejected_candidate",
      SplitState::FiberHintFallback => "fiber_hint_fallback",
      SplitState::Split(_) => "split",
      SplitState::Unsplittable => "unsplittable",
    }
  }
}

/// Divides composite brush descriptions into a handle and a knot half.
///
/// Delimiters are tried in [`DelimiterType`] order, each occurrence being
/// validated against its own context. A rejected occurrence only rules out
/// itself: later occurrences of the same delimiter are still considered.
/// When no delimiter holds, `handle`/`knot` keywords then fiber and knot
/// size mentions are used as split hints.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComponentSplitter;

impl ComponentSplitter {
  #[tracing::instrument(level = "debug", skip(self))]
  pub fn split(&self, text: &str) -> SplitReport {
    let text = text.trim();

    let mut candidates = DelimiterType::STRUCTURAL
      .iter()
      .flat_map(|delimiter| delimiters::occurrences(*delimiter, text))
      .collect::<VecDeque<_>>();

    let mut rejected = Vec::new();
    let mut state = SplitState::NoDelimiterFound;

    loop {
      tracing::trace!(state = state.name(), "splitter transition");

      state = match state {
        SplitState::NoDelimiterFound | SplitState::RejectedCandidate => match candidates.pop_front() {
          Some(occurrence) => SplitState::DelimiterCandidateFound(occurrence),
          None => SplitState::FiberHintFallback,
        },

        SplitState::DelimiterCandidateFound(occurrence) => match delimiters::validate(&occurrence, text) {
          Ok(()) => SplitState::ValidatedSplit(occurrence),
          Err(reason) => {
            rejected.push(RejectedCandidate {
              delimiter: occurrence.delimiter,
              position: occurrence.start,
              reason,
            });

            SplitState::RejectedCandidate
          }
        },

        SplitState::ValidatedSplit(occurrence) => SplitState::Split(structural_split(text, &occurrence)),

        SplitState::FiberHintFallback => match keyword_split(text).or_else(|| fiber_split(text)) {
          Some(split) => SplitState::Split(split),
          None => SplitState::Unsplittable,
        },

        SplitState::Split(split) => {
          tracing::debug!(delimiter = %split.delimiter_type, first = split.first_part, second = split.second_part, "split composite text");

          return SplitReport { split: Some(split), rejected };
        }

        SplitState::Unsplittable => return SplitReport { split: None, rejected },
      };
    }
  }
}

fn build(text: &str, first: &str, second: &str, delimiter: DelimiterType, orientation: Orientation) -> SplitResult {
  SplitResult {
    original_text: text.to_string(),
    first_part: first.trim().to_string(),
    second_part: second.trim().to_string(),
    delimiter_type: delimiter,
    split_confidence: delimiter.confidence(),
    orientation,
  }
}

fn structural_split(text: &str, occurrence: &Occurrence) -> SplitResult {
  let (first, second) = occurrence.halves(text);

  let orientation = match occurrence.delimiter {
    DelimiterType::In => Orientation::KnotFirst,
    _ if hints::has_knot_indicators(first) && !hints::has_knot_indicators(second) => Orientation::KnotFirst,
    _ if mentions(first, "knot") && mentions(second, "handle") => Orientation::KnotFirst,
    _ => Orientation::HandleFirst,
  };

  build(text, first, second, occurrence.delimiter, orientation)
}

fn mentions(text: &str, keyword: &str) -> bool {
  KEYWORD.captures_iter(text).any(|captures| captures[1].eq_ignore_ascii_case(keyword))
}

fn has_words(text: &str) -> bool {
  text.chars().any(char::is_alphanumeric)
}

/// Split right after a `handle` or `knot` keyword that has text on both sides.
fn keyword_split(text: &str) -> Option<SplitResult> {
  KEYWORD.captures_iter(text).find_map(|captures| {
    let keyword = captures.get(1)?;
    let (first, second) = (&text[..keyword.end()], &text[keyword.end()..]);

    if !has_words(&text[..keyword.start()]) || !has_words(second) {
      return None;
    }

    let orientation = match keyword.as_str().eq_ignore_ascii_case("knot") {
      true => Orientation::KnotFirst,
      false => Orientation::HandleFirst,
    };

    Some(build(text, first, second, DelimiterType::Keyword, orientation))
  })
}

/// Split right before the first fiber or knot size mention.
fn fiber_split(text: &str) -> Option<SplitResult> {
  let indicator = hints::knot_indicators(text).into_iter().next()?;
  let (first, second) = (&text[..indicator.start], &text[indicator.start..]);

  if !has_words(first) {
    return None;
  }

  Some(build(text, first, second, DelimiterType::FiberHint, Orientation::HandleFirst))
}
