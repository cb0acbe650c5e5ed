mod error;
mod formats;
mod normalize;
mod strategies;
mod yaml;

pub mod catalog;
pub mod engine;
pub mod matching;
pub mod model;
pub mod overrides;
pub mod scoring;
pub mod splitting;

#[cfg(test)]
mod tests;

pub use formats::{FormatAffinity, affinity};
pub use normalize::{UsageCountPolicy, normalize};

pub mod prelude {
  pub use crate::catalog::{CatalogHit, CatalogIndex, CategoryCatalog, LoadDiagnostic};
  pub use crate::engine::{Engine, EngineConfig, MatchRequest, ReplayReport, ReplayStatus};
  pub use crate::error::SotdError;
  pub use crate::matching::{CatalogMatcher, HandleMatcher, KnotDetails, KnotMatcher};
  pub use crate::model::{AttributeValue, Attributes, Authority, CatalogEntry, Category, EntryId, MatchResult, Matched, Strategy};
  pub use crate::overrides::{CorrectMatchesStore, OverrideEntry, UnresolvedOverride};
  pub use crate::scoring::{ScoringEngine, ScoringWeights};
  pub use crate::splitting::{ComponentSplitter, DelimiterType, Orientation, SplitReport, SplitResult};
}
