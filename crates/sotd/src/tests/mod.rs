use std::{fs, io::Cursor};

use crate::{
  batch,
  config::{Config, Env},
  tests::captured_logs::CapturedLogs,
  trace::init_tracing,
};


#[test]
fn engine_from_config() {
  let dir = tempfile::tempdir().unwrap();

  fs::write(dir.path().join("soaps.yaml"), "artisan:\n  Noble Otter:\n    Barrbarr:\n      patterns: ['barrbarr']\n").unwrap();
  fs::write(dir.path().join("correct_matches.yaml"), "soap:\n  no barrbarr: { brand: Noble Otter, model: Barrbarr }\n").unwrap();
  fs::write(dir.path().join("engine.yaml"), "memoize: false\n").unwrap();

  let config = Config {
    catalog_dir: Some(dir.path().to_path_buf()),
    correct_matches: Some(dir.path().join("correct_matches.yaml")),
    engine_config: Some(dir.path().join("engine.yaml")),
    ..Default::default()
  };

  let engine = crate::build_engine(&config).unwrap();

  assert_eq!(engine.overrides().len(), 1);
  assert!(engine.catalogs().category(libsotd::prelude::Category::Razor).is_none());
}

#[test]
fn structured_logs() {
  let logs = CapturedLogs::default();
  let config = Config {
    env: Env::Production,
    ..Default::default()
  };

  let guard = init_tracing(&config, logs.clone());
  let engine = crate::build_engine(&config).unwrap();

  batch::match_lines(&engine, Cursor::new(r#"{"id": 1, "category": "razor", "text": "Karve CB"}"#), Vec::new()).unwrap();

  drop(guard);

  let summaries = logs.find("batch complete");
  let summary = summaries.iter().find(|event| event["matched"] == 1).unwrap();

  assert_eq!(summary["unmatched"], 0);
  assert_eq!(summary["level"], "INFO");
  assert!(logs.events().iter().any(|event| event["message"] == "loaded catalog" && event["category"] == "razor"));
}
