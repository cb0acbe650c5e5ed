use std::io::{self, BufRead, ErrorKind, Write};

use anyhow::Context;
use itertools::Itertools;
use libsotd::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_jsonlines::{JsonLinesReader, JsonLinesWriter};

use crate::errors::AppError;

/// Records matched together by the worker pool.
const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Deserialize)]
struct InputRecord {
  #[serde(default)]
  id: Value,
  category: Category,
  #[serde(default)]
  text: Value,
  #[serde(default)]
  format: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRecord<'r> {
  id: &'r Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  result: Option<&'r MatchResult>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct BatchSummary {
  pub matched: usize,
  pub unmatched: usize,
  pub rejected: usize,
}

/// Read one record, keeping its id even when the rest is unusable.
///
/// A record whose `text` is not a string is still matched, as an empty
/// text, so that it gets an unmatched result instead of an error line.
fn parse_record(line: io::Result<Value>) -> anyhow::Result<(Value, Result<MatchRequest, AppError>)> {
  let value = match line {
    Ok(value) => value,
    Err(err) if matches!(err.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof) => return Ok((Value::Null, Err(AppError::InvalidRecord(err.to_string())))),
    Err(err) => return Err(err).context("could not read input record"),
  };

  let id = value.get("id").cloned().unwrap_or(Value::Null);

  let record = match serde_json::from_value::<InputRecord>(value) {
    Ok(record) => record,
    Err(err) => return Ok((id, Err(AppError::InvalidRecord(err.to_string())))),
  };

  let text = match record.text {
    Value::String(text) => text,
    other => {
      tracing::warn!(id = %record.id, text = %other, "record text is not a string");

      String::new()
    }
  };

  let request = MatchRequest {
    category: record.category,
    text,
    format: record.format,
  };

  Ok((record.id, Ok(request)))
}

/// Match JSON-lines records from `input`, writing one result line per
/// input line to `output`, in input order.
///
/// Lines that are not a usable record, blank ones included, get an error
/// line so that output line numbers follow the input.
pub fn match_lines(engine: &Engine, input: impl BufRead, output: impl Write) -> anyhow::Result<BatchSummary> {
  let mut summary = BatchSummary::default();
  let mut writer = JsonLinesWriter::new(output);

  for chunk in &JsonLinesReader::new(input).read_all::<Value>().chunks(CHUNK_SIZE) {
    let mut records = Vec::with_capacity(CHUNK_SIZE);
    let mut requests = Vec::with_capacity(CHUNK_SIZE);

    for line in chunk {
      let (id, request) = parse_record(line)?;

      match request {
        Ok(request) => {
          requests.push(request);
          records.push((id, None));
        }

        Err(err) => {
          tracing::warn!(id = %id, error = %err, "rejected input record");

          records.push((id, Some(err.to_string())));
        }
      }
    }

    let mut results = engine.match_batch(&requests).into_iter();

    for (id, error) in &records {
      let result = match error {
        Some(_) => None,
        None => results.next(),
      };

      match &result {
        Some(result) if result.is_match() => summary.matched += 1,
        Some(_) => summary.unmatched += 1,
        None => summary.rejected += 1,
      }

      let record = OutputRecord {
        id,
        result: result.as_ref(),
        error: error.clone(),
      };

      writer.write(&record).context("could not write result")?;
    }
  }

  writer.flush().context("could not flush output")?;

  tracing::info!(matched = summary.matched, unmatched = summary.unmatched, rejected = summary.rejected, "batch complete");

  Ok(summary)
}

/// Write one line per confirmed match, telling whether the catalogs alone
/// still produce it.
pub fn replay(engine: &Engine, output: impl Write) -> anyhow::Result<usize> {
  let reports = engine.replay_overrides();
  let mut writer = JsonLinesWriter::new(output);

  writer.write_all(&reports).context("could not write replay report")?;
  writer.flush().context("could not flush output")?;

  let drifted = reports.iter().filter(|report| report.status != ReplayStatus::Consistent).count();

  tracing::info!(overrides = reports.len(), drifted, "replay complete");

  Ok(reports.len())
}
