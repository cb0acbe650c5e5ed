use std::{
  env::{self, VarError},
  fmt::Display,
  path::PathBuf,
  str::FromStr,
};

use crate::errors::AppError;

#[derive(Clone, Debug, Default)]
pub struct Config {
  pub env: Env,
  pub mode: Mode,

  // Data
  pub catalog_dir: Option<PathBuf>,
  pub correct_matches: Option<PathBuf>,
  pub engine_config: Option<PathBuf>,

  // Batch
  pub input: Stream,
  pub output: Stream,
  pub workers: usize,
}

impl Config {
  pub fn from_env() -> Result<Config, AppError> {
    let config = Config {
      env: Env::from(env::var("ENV").unwrap_or("dev".into())),
      mode: env::var("MODE").unwrap_or("match".into()).parse()?,
      catalog_dir: env::var("CATALOG_DIR").ok().filter(|path| !path.is_empty()).map(PathBuf::from),
      correct_matches: env::var("CORRECT_MATCHES").ok().filter(|path| !path.is_empty()).map(PathBuf::from),
      engine_config: env::var("ENGINE_CONFIG").ok().filter(|path| !path.is_empty()).map(PathBuf::from),
      input: Stream::from(env::var("INPUT").unwrap_or("-".into())),
      output: Stream::from(env::var("OUTPUT").unwrap_or("-".into())),
      workers: parse_env("WORKERS", 0)?,
    };

    if config.mode == Mode::Replay && config.correct_matches.is_none() {
      return Err(AppError::ConfigError("CORRECT_MATCHES is required when replaying confirmed matches".into()));
    }

    Ok(config)
  }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Env {
  #[default]
  Dev,
  Production,
}

impl From<String> for Env {
  fn from(value: String) -> Self {
    match value.as_ref() {
      "dev" => Env::Dev,
      "production" => Env::Production,
      _ => Env::Dev,
    }
  }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Mode {
  #[default]
  Match,
  Replay,
}

impl FromStr for Mode {
  type Err = AppError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "match" => Ok(Mode::Match),
      "replay" => Ok(Mode::Replay),
      other => Err(AppError::ConfigError(format!("unsupported mode: {other}"))),
    }
  }
}

/// Where records are read from or written to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Stream {
  #[default]
  Stdio,
  File(PathBuf),
}

impl From<String> for Stream {
  fn from(value: String) -> Self {
    match value.as_ref() {
      "" | "-" => Stream::Stdio,
      path => Stream::File(PathBuf::from(path)),
    }
  }
}

pub fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
  T: FromStr,
  T::Err: Display,
{
  match env::var(name) {
    Ok(value) if value.is_empty() => Ok(default),
    Ok(value) => Ok(value.parse::<T>().map_err(|err| AppError::ConfigError(format!("could not read {name}: {err}")))?),
    Err(err) => match err {
      VarError::NotPresent => Ok(default),
      _ => Err(AppError::ConfigError(format!("could not read {name}: {err}")).into()),
    },
  }
}
