mod batch;
mod config;
mod errors;
mod trace;

#[cfg(test)]
mod tests;

use std::{
  fs::File,
  io::{self, BufRead, BufReader, BufWriter, Write},
  sync::Arc,
};

use anyhow::Context;
use libsotd::prelude::*;

use crate::config::{Config, Mode, Stream};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
  let config = Config::from_env()?;
  let _guards = trace::init_tracing(&config, io::stderr());

  run(&config)
}

fn run(config: &Config) -> anyhow::Result<()> {
  tracing::info!(sotd = env!("CARGO_PKG_VERSION"), mode = ?config.mode, "starting");

  if config.workers > 0 {
    rayon::ThreadPoolBuilder::new().num_threads(config.workers).build_global().context("could not configure worker pool")?;
  }

  let engine = build_engine(config)?;
  let output = open_output(&config.output)?;

  match config.mode {
    Mode::Match => {
      batch::match_lines(&engine, open_input(&config.input)?, output)?;
    }

    Mode::Replay => {
      batch::replay(&engine, output)?;
    }
  }

  Ok(())
}

pub(crate) fn build_engine(config: &Config) -> anyhow::Result<Engine> {
  let catalogs = match &config.catalog_dir {
    Some(path) => CatalogIndex::load_dir(path)?,
    None => CatalogIndex::bundled()?,
  };

  let diagnostics = catalogs.diagnostics().count();

  if diagnostics > 0 {
    tracing::warn!(diagnostics, "catalogs loaded with defects");
  }

  let overrides = match &config.correct_matches {
    Some(path) => CorrectMatchesStore::load(path, &catalogs)?,
    None => CorrectMatchesStore::empty(),
  };

  let engine_config = match &config.engine_config {
    Some(path) => EngineConfig::load(path)?,
    None => EngineConfig::default(),
  };

  Ok(Engine::new(Arc::new(catalogs)).overrides(Arc::new(overrides)).config(engine_config).build())
}

fn open_input(stream: &Stream) -> anyhow::Result<Box<dyn BufRead>> {
  match stream {
    Stream::Stdio => Ok(Box::new(io::stdin().lock())),
    Stream::File(path) => Ok(Box::new(BufReader::new(File::open(path).with_context(|| format!("could not open {}", path.display()))?))),
  }
}

fn open_output(stream: &Stream) -> anyhow::Result<Box<dyn Write>> {
  match stream {
    Stream::Stdio => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    Stream::File(path) => Ok(Box::new(BufWriter::new(File::create(path).with_context(|| format!("could not create {}", path.display()))?))),
  }
}
