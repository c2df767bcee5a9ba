//! Integration tests for sprig
//!
//! These drive the whole pipeline on on-disk projects: discovery, build,
//! extraction and audit.

use sprig_core::{audit, extract, Depths, ExtractionSeed, Manifest, ProjectConfig, CONFIG_FILE};
use sprig_indexer::{discover, Coordinator, SourceFile};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_project(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (relative, content) in files {
        let path = temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    temp_dir
}

fn build(root: &Path) -> (Manifest, BTreeMap<String, String>) {
    let config = ProjectConfig::load(root).unwrap();
    let files: Vec<SourceFile> = discover(root, &config)
        .unwrap()
        .into_iter()
        .map(|f| SourceFile {
            source: fs::read_to_string(&f.path).unwrap(),
            id: f.id,
            language: f.language,
        })
        .collect();
    let sources = files.iter().map(|f| (f.id.clone(), f.source.clone())).collect();

    let output = Coordinator::new()
        .build(root, files, config.python.version)
        .unwrap();
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    output.manifest.verify().unwrap();
    (output.manifest, sources)
}

const SHOP: &[(&str, &str)] = &[
    ("shop/__init__.py", ""),
    (
        "shop/pricing.py",
        "import math\n\nRATE = 0.2\n\ndef tax(amount):\n    return math.ceil(amount * RATE)\n\ndef discount(amount):\n    return amount * 0.9\n",
    ),
    (
        "shop/cart.py",
        "from shop.pricing import tax\n\ndef total(items):\n    return sum(items) + tax(sum(items))\n\ndef empty():\n    return []\n",
    ),
    (
        "app.py",
        "from shop.cart import total\n\ndef main():\n    print(total([1, 2]))\n",
    ),
];

#[test]
fn test_manifest_from_disk() {
    let project = create_project(SHOP);
    let (manifest, _) = build(project.path());

    assert_eq!(manifest.file_count(), 4);
    let total = manifest.symbol("shop/cart.py", "total").unwrap();
    assert!(total.dependencies["shop/pricing.py"].symbols.contains_key("tax"));
    assert!(total.dependents["app.py"].symbols.contains_key("main"));

    let tax = manifest.symbol("shop/pricing.py", "tax").unwrap();
    assert!(tax.dependencies["math"].is_external);
    assert!(tax.internal_targets().any(|(_, s)| s == "RATE"));
}

#[test]
fn test_extract_follows_dependencies() {
    let project = create_project(SHOP);
    let (manifest, sources) = build(project.path());

    let seeds = vec!["app.py|main".parse::<ExtractionSeed>().unwrap()];
    let depths = Depths {
        dependency: 3,
        dependent: 0,
    };
    let extraction = extract(&manifest, &sources, &seeds, depths).unwrap();
    assert!(extraction.rejected.is_empty());

    let ids: Vec<_> = extraction.files.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["app.py", "shop/cart.py", "shop/pricing.py"]);

    let cart = &extraction.files["shop/cart.py"];
    assert!(cart.contains("def total"));
    assert!(!cart.contains("def empty"));

    let pricing = &extraction.files["shop/pricing.py"];
    assert!(pricing.contains("RATE = 0.2"));
    assert!(pricing.contains("def tax"));
    assert!(!pricing.contains("def discount"));

    // untouched file comes through byte-identical
    assert_eq!(extraction.files["app.py"], sources["app.py"]);
}

#[test]
fn test_depth_zero_keeps_only_the_seed() {
    let project = create_project(SHOP);
    let (manifest, sources) = build(project.path());

    let seeds = vec![ExtractionSeed::new("shop/cart.py", &["empty"])];
    let extraction = extract(&manifest, &sources, &seeds, Depths::default()).unwrap();

    assert_eq!(extraction.files.len(), 1);
    let cart = &extraction.files["shop/cart.py"];
    assert!(cart.contains("def empty"));
    assert!(!cart.contains("def total"));
}

#[test]
fn test_unknown_seed_is_rejected() {
    let project = create_project(SHOP);
    let (manifest, sources) = build(project.path());

    let seeds = vec![ExtractionSeed::new("shop/cart.py", &["missing"])];
    assert!(extract(&manifest, &sources, &seeds, Depths::default()).is_err());
}

#[test]
fn test_config_file_drives_discovery_and_audit() {
    let mut files = SHOP.to_vec();
    files.push(("legacy/old.py", "def unused():\n    pass\n"));
    files.push((
        CONFIG_FILE,
        "[project]\nexclude = [\"legacy/**\"]\n\n[metrics.symbol]\nmax_line = 1\n",
    ));
    let project = create_project(&files);
    let (manifest, _) = build(project.path());

    assert!(manifest.file("legacy/old.py").is_none());

    let config = ProjectConfig::load(project.path()).unwrap();
    let report = audit(&manifest, &config.metrics);
    let cart = &report["shop/cart.py"];
    assert!(cart.alerts.is_empty());
    assert_eq!(cart.symbols["total"][0].metric, "linesCount");
}

#[test]
fn test_previous_output_is_not_reanalyzed() {
    let mut files = SHOP.to_vec();
    files.push(("sprig-out/extracted-20260101-000000/app.py", SHOP[3].1));
    files.push(("sprig-out/extracted-20260101-000000/shop/cart.py", SHOP[2].1));
    let project = create_project(&files);
    let (manifest, _) = build(project.path());

    assert_eq!(manifest.file_count(), 4);
    assert!(manifest.file("sprig-out/extracted-20260101-000000/app.py").is_none());
    let total = manifest.symbol("shop/cart.py", "total").unwrap();
    assert_eq!(total.dependents.len(), 1);
}

#[test]
fn test_mixed_languages_in_one_project() {
    let project = create_project(&[
        ("native/util.h", "int twice(int x);\n"),
        ("native/util.c", "#include \"util.h\"\nint twice(int x) { return x * 2; }\n"),
        ("web/api.ts", "export function fetchAll(): string[] { return []; }\n"),
        ("web/index.ts", "import { fetchAll } from './api';\nexport const items = fetchAll();\n"),
    ]);
    let (manifest, _) = build(project.path());

    assert_eq!(manifest.file_count(), 4);
    let items = manifest.symbol("web/index.ts", "items").unwrap();
    assert!(items.dependencies["web/api.ts"].symbols.contains_key("fetchAll"));
    let util = manifest.file("native/util.c").unwrap();
    assert!(util.dependencies.contains_key("native/util.h"));
}
