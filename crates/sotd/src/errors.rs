use libsotd::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("invalid configuration: {0}")]
  ConfigError(String),
  #[error("invalid input record: {0}")]
  InvalidRecord(String),

  #[error(transparent)]
  OtherError(#[from] anyhow::Error),
}

impl From<SotdError> for AppError {
  fn from(value: SotdError) -> Self {
    match value {
      SotdError::ConfigError(err) => AppError::ConfigError(err),
      SotdError::OtherError(err) => AppError::OtherError(err),
      other => AppError::OtherError(other.into()),
    }
  }
}
