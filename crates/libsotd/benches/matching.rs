use std::{hint::black_box, sync::Arc};

use criterion::{Criterion, criterion_group, criterion_main};

use libsotd::prelude::*;

fn engine() -> Engine {
  let catalogs = CatalogIndex::bundled().unwrap();

  Engine::new(Arc::new(catalogs)).config(EngineConfig { memoize: false, ..EngineConfig::default() }).build()
}

fn known_entry(c: &mut Criterion) {
  let engine = engine();

  c.bench_function("known_entry", |b| b.iter(|| black_box(engine.match_text(Category::Razor, "Karve Christopher Bradley (SB plate)", Some("DE")))));
}

fn dual_component(c: &mut Criterion) {
  let engine = engine();

  c.bench_function("dual_component", |b| {
    b.iter(|| black_box(engine.match_text(Category::Brush, "AKA Brushworx AK47 knot in Southland 1 in. x 3 in. Galvanized Nipple Handle", None)))
  });
}

fn unmatched(c: &mut Criterion) {
  let engine = engine();

  c.bench_function("unmatched", |b| b.iter(|| black_box(engine.match_text(Category::Brush, "complete gibberish xyzzy", None))));
}

fn batch(c: &mut Criterion) {
  let engine = engine();
  let requests = std::iter::repeat([
    (Category::Blade, "Feather (3)"),
    (Category::Soap, "B&M Seville"),
    (Category::Brush, "Maggard w/ Declaration B2 in Mozingo"),
  ])
  .take(100)
  .flatten()
  .map(|(category, text)| MatchRequest {
    category,
    text: text.to_string(),
    format: None,
  })
  .collect::<Vec<_>>();

  c.bench_function("batch", |b| b.iter(|| black_box(engine.match_batch(&requests))));
}

criterion_group!(benches, known_entry, dual_component, unmatched, batch);
criterion_main!(benches);
