use crate::model::Category;

#[derive(Debug, thiserror::Error)]
pub enum SotdError {
  #[error("invalid configuration: {0}")]
  ConfigError(String),
  #[error("invalid {0} document: {1}")]
  InvalidDocument(String, String),
  #[error("catalog for {0} has no usable entries")]
  EmptyCatalog(Category),
  #[error(transparent)]
  IoError(#[from] std::io::Error),
  #[error(transparent)]
  OtherError(#[from] anyhow::Error),
}
