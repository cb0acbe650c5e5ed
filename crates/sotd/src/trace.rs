use std::io::Write;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Env};

pub struct TraceGuards {
  _logging: WorkerGuard,
}

/// Install the global subscriber, writing log lines to `writer`.
///
/// Logs never go to the batch output, callers pass stderr (or a capture in
/// tests).
pub fn init_tracing(config: &Config, writer: impl Write + Send + 'static) -> TraceGuards {
  let (appender, logging_guard) = tracing_appender::non_blocking(writer);

  let logging_formatter = match config.env {
    #[cfg(not(test))]
    Env::Dev => fmt::layer().compact().with_writer(appender).with_ansi(true).boxed(),
    Env::Production => json_subscriber::layer()
      .with_writer(appender)
      .flatten_event(true)
      .flatten_span_list_on_top_level(true)
      .with_current_span(false)
      .with_span_list(false)
      .boxed(),

    #[cfg(test)]
    Env::Dev => fmt::layer().compact().with_writer(appender).with_ansi(false).boxed(),
  };

  let filter = EnvFilter::builder().try_from_env().or_else(|_| EnvFilter::try_new("info")).unwrap();

  tracing_subscriber::registry().with(filter.and_then(logging_formatter)).init();

  TraceGuards { _logging: logging_guard }
}
