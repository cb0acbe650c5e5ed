pub(crate) mod fixtures {
  use std::sync::Arc;

  use crate::{catalog::CatalogIndex, engine::Engine, model::Category, overrides::CorrectMatchesStore};

  pub(crate) const RAZORS: &str = r#"
defaults:
  format: DE

manufacturer:
  Gillette:
    material: Brass
    Super Speed:
      patterns: ['gillette.*super\s*speed', '\bsuper\s*speed\b']
  Karve:
    material: Brass
    Christopher Bradley:
      patterns: ['karve.*christopher\s*bradley', 'karve.*\bcb\b']
    patterns: ['\bkarve\b']
  Feather:
    Artist Club SS:
      format: AC
      material: Aluminum
      patterns: ['feather.*artist\s*club']

artisan:
  Blackland:
    material: Stainless Steel
    Blackbird:
      patterns: ['blackland.*blackbird', '\bblackbird\b']

other:
  Rockwell:
    6S:
      material: Stainless Steel
      patterns: ['rockwell.*\b6s\b']
"#;

  pub(crate) const BLADES: &str = r#"
manufacturer:
  Feather:
    Hi-Stainless:
      format: DE
      patterns: ['\bfeather\b.*(?:hi|stainless)', '\bfeather\b']
    Pro:
      format: AC
      patterns: ['feather.*\bpro\b']
  Astra:
    format: DE
    Superior Platinum:
      patterns: ['astra.*(?:\bsp\b|superior\s*plat)', '\bastra\b.*green']
    Superior Stainless:
      patterns: ['astra.*(?:\bss\b|superior\s*stainless)']
  Personna:
    Lab Blue:
      format: DE
      patterns: ['personna.*lab\s*blue', '\blab\s*blue\b']
    GEM PTFE:
      format: GEM
      patterns: ['personna.*\bgem\b', '\bpersonna\b']
    Injector:
      format: Injector
      patterns: ['personna.*injector', '\bpersonna\b']
"#;

  pub(crate) const BRUSHES: &str = r#"
manufacturer:
  Simpson:
    fiber: Badger
    handle_maker: Simpson
    Chubby 2:
      knot_size_mm: 27
      patterns: ['(?:simpson)?.*chubby\s*(?:2|ii)\b']
    Trafalgar T3:
      fiber: Synthetic
      knot_size_mm: 24
      patterns: ['simpson.*trafalgar.*\bt3\b', '\btrafalgar\s*t3\b']
  Omega:
    fiber: Boar
    handle_maker: Omega
    10049:
      knot_size_mm: 28
      patterns: ['omega.*10049', '\b10049\b']
    patterns: ['\bomega\b']

other:
  Semogue:
    fiber: Boar
    handle_maker: Semogue
    patterns: ['\bsemogue\b']
"#;

  pub(crate) const HANDLES: &str = r#"
artisan:
  Southland:
    material: Steel
    Galvanized Nipple:
      patterns: ['southland.*(?:galvanized|nipple)']
    patterns: ['\bsouthland\b']
  Mozingo:
    material: Wood
    patterns: ['\bmozingo\b']
  Maggard:
    material: Resin
    patterns: ['\bmaggard\b']

other:
  Zenith:
    patterns: ['\bzenith\b']
"#;

  pub(crate) const KNOTS: &str = r#"
artisan:
  Declaration Grooming:
    fiber: Badger
    B2:
      knot_size_mm: 26
      patterns: ['declaration.*\bb2\b', '\bdg\b.*\bb2\b']
    B3:
      knot_size_mm: 26
      patterns: ['declaration.*\bb3\b', '\bdg\b.*\bb3\b']
    patterns: ['\bdeclaration\b']
  AKA Brushworx:
    fiber: Synthetic
    AK47:
      knot_size_mm: 24
      patterns: ['\baka\b.*ak\s*-?\s*47', 'brushworx.*ak\s*-?\s*47']

manufacturer:
  Omega:
    fiber: Boar
    patterns: ['\bomega\b']
"#;

  pub(crate) const SOAPS: &str = r#"
defaults:
  base: Tallow

artisan:
  Barrister and Mann:
    Seville:
      scent: Seville
      patterns: ['b(?:arrister)?\s*(?:&|and)?\s*m(?:ann)?.*seville']
  Stirling Soap Co:
    Executive Man:
      scent: Executive Man
      patterns: ['stirling.*executive\s*man', '\bexecutive\s*man\b']

manufacturer:
  Proraso:
    base: Vegetable
    Green:
      scent: Eucalyptus and Menthol
      patterns: ['proraso.*(?:green|eucalyptus)']
    patterns: ['\bproraso\b']
"#;

  pub(crate) const OVERRIDES: &str = r#"
razor:
  karve cb: { brand: Karve, model: Christopher Bradley }
  gillette tech: { brand: Gillette, model: Tech }

blade:
  feather:
    - { format: DE, brand: Feather, model: Hi-Stainless }
    - { format: AC, brand: Feather, model: Pro }

brush:
  aka ak47 in southland:
    handle: { brand: Southland, model: Galvanized Nipple }
    knot: { brand: AKA Brushworx, model: AK47 }
"#;

  pub(crate) fn catalogs() -> CatalogIndex {
    let mut index = CatalogIndex::new();

    for (category, source) in [
      (Category::Razor, RAZORS),
      (Category::Blade, BLADES),
      (Category::Brush, BRUSHES),
      (Category::Handle, HANDLES),
      (Category::Knot, KNOTS),
      (Category::Soap, SOAPS),
    ] {
      index.load_str(category, source).unwrap();
    }

    index
  }

  pub(crate) fn overrides() -> CorrectMatchesStore {
    CorrectMatchesStore::from_yaml(OVERRIDES, &catalogs()).unwrap()
  }

  pub(crate) fn engine() -> Engine {
    let catalogs = Arc::new(catalogs());
    let overrides = CorrectMatchesStore::from_yaml(OVERRIDES, &catalogs).unwrap();

    Engine::new(catalogs).overrides(Arc::new(overrides)).build()
  }

  #[test]
  fn fixtures_load_cleanly() {
    let index = catalogs();

    assert_eq!(index.diagnostics().count(), 0);
    assert_eq!(overrides().len(), 4);
  }
}
