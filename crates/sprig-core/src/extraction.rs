//! Extraction engine: bounded closure over the manifest plus range removal
//!
//! Two independent BFS walks start at the seed symbols, one along dependency
//! edges and one along dependent edges. Every file that keeps at least one
//! symbol is rewritten with the spans of its other symbols removed.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use petgraph::Direction;

use crate::error::{Result, SprigError};
use crate::graph::{SymbolGraph, SymbolKey};
use crate::manifest::Manifest;
use crate::model::{FileId, Span, SymbolId};
use crate::rewrite::{remove_ranges, ByteRange};

/// Symbols of one file to start the closure from. An empty symbol list
/// seeds every symbol of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSeed {
    pub file: FileId,
    pub symbols: Vec<SymbolId>,
}

impl ExtractionSeed {
    pub fn new(file: impl Into<FileId>, symbols: &[&str]) -> Self {
        ExtractionSeed {
            file: file.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Group seeds naming the same file.
    pub fn group(seeds: Vec<ExtractionSeed>) -> Vec<ExtractionSeed> {
        let mut grouped: BTreeMap<FileId, Vec<SymbolId>> = BTreeMap::new();
        for seed in seeds {
            let symbols = grouped.entry(seed.file).or_default();
            for symbol in seed.symbols {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }
        grouped
            .into_iter()
            .map(|(file, symbols)| ExtractionSeed { file, symbols })
            .collect()
    }
}

impl FromStr for ExtractionSeed {
    type Err = SprigError;

    /// Parse `path/to/file|symbol`.
    fn from_str(s: &str) -> Result<Self> {
        let (file, symbol) = s.split_once('|').ok_or_else(|| {
            SprigError::Config(format!("symbol `{s}` must be written as `file|symbol`"))
        })?;
        let (file, symbol) = (file.trim(), symbol.trim());
        if file.is_empty() || symbol.is_empty() {
            return Err(SprigError::Config(format!(
                "symbol `{s}` must be written as `file|symbol`"
            )));
        }
        Ok(ExtractionSeed {
            file: file.replace('\\', "/"),
            symbols: vec![symbol.to_string()],
        })
    }
}

/// Depth bounds for the two traversals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Depths {
    pub dependency: usize,
    pub dependent: usize,
}

/// Rewritten files plus the ranges that could not be applied.
#[derive(Debug, Default)]
pub struct Extraction {
    pub files: BTreeMap<FileId, String>,
    pub rejected: Vec<SprigError>,
}

/// Compute the retained symbol set per file.
pub fn closure(
    manifest: &Manifest,
    seeds: &[ExtractionSeed],
    depths: Depths,
) -> Result<BTreeMap<FileId, BTreeSet<SymbolId>>> {
    let graph = SymbolGraph::from_manifest(manifest);

    let mut seed_keys: Vec<SymbolKey> = Vec::new();
    for seed in seeds {
        let file = manifest
            .file(&seed.file)
            .ok_or_else(|| SprigError::UnknownFile(seed.file.clone()))?;
        if seed.symbols.is_empty() {
            seed_keys.extend(
                file.symbols
                    .keys()
                    .map(|s| SymbolKey::new(file.id.clone(), s.clone())),
            );
            continue;
        }
        for symbol in &seed.symbols {
            if !file.symbols.contains_key(symbol) {
                return Err(SprigError::UnknownSymbol {
                    file: seed.file.clone(),
                    symbol: symbol.clone(),
                });
            }
            seed_keys.push(SymbolKey::new(file.id.clone(), symbol.clone()));
        }
    }

    let seed_nodes: Vec<_> = seed_keys.iter().filter_map(|k| graph.node(k)).collect();
    let forward = graph.bounded_closure(&seed_nodes, Direction::Outgoing, depths.dependency);
    let backward = graph.bounded_closure(&seed_nodes, Direction::Incoming, depths.dependent);

    let mut retained: BTreeMap<FileId, BTreeSet<SymbolId>> = BTreeMap::new();
    for key in seed_keys
        .iter()
        .chain(forward.union(&backward).filter_map(|idx| graph.key(*idx)))
    {
        retained
            .entry(key.file.clone())
            .or_default()
            .insert(key.symbol.clone());
    }

    tracing::debug!(
        "Closure retains {} symbols across {} files",
        retained.values().map(|s| s.len()).sum::<usize>(),
        retained.len()
    );
    Ok(retained)
}

/// Extract the slice of the project reachable from `seeds`.
///
/// `sources` holds the original text of every file in `manifest`. The
/// manifest is only read.
pub fn extract(
    manifest: &Manifest,
    sources: &BTreeMap<FileId, String>,
    seeds: &[ExtractionSeed],
    depths: Depths,
) -> Result<Extraction> {
    let retained = closure(manifest, seeds, depths)?;
    let mut extraction = Extraction::default();

    for (file_id, keep) in &retained {
        let file = manifest
            .file(file_id)
            .ok_or_else(|| SprigError::UnknownFile(file_id.clone()))?;
        let source = sources
            .get(file_id)
            .ok_or_else(|| SprigError::UnknownFile(file_id.clone()))?;

        let kept_spans: Vec<Span> = file
            .symbols
            .values()
            .filter(|s| keep.contains(&s.id))
            .flat_map(|s| s.spans.iter().copied())
            .collect();

        // A removable span that overlaps a kept one (shared declarations such as
        // `a, b = 1, 2`) stays in place.
        let ranges: Vec<ByteRange> = file
            .symbols
            .values()
            .filter(|s| !keep.contains(&s.id))
            .flat_map(|s| s.spans.iter().copied())
            .filter(|span| !kept_spans.iter().any(|k| overlaps(k, span)))
            .map(|span| span.as_range())
            .collect();

        let removal = remove_ranges(source, &ranges);
        extraction.rejected.extend(removal.rejected);
        extraction.files.insert(file_id.clone(), removal.text);
    }

    tracing::info!(
        "Extracted {} files (dependency depth {}, dependent depth {})",
        extraction.files.len(),
        depths.dependency,
        depths.dependent
    );
    Ok(extraction)
}

fn overlaps(a: &Span, b: &Span) -> bool {
    a.start < b.end && b.start < a.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{
        assemble, insert_dependency, DependencyInfo, FileManifest, SymbolManifest,
    };
    use crate::metrics::Metrics;
    use crate::model::{Language, SymbolKind};

    /// Build a file whose symbols are `name\n` lines, in order.
    fn file(id: &str, names: &[&str]) -> (FileManifest, String) {
        let mut manifest = FileManifest::new(id, Language::Python, Metrics::default());
        let mut source = String::new();
        for (row, name) in names.iter().enumerate() {
            let start = source.len();
            source.push_str(name);
            source.push('\n');
            manifest.symbols.insert(
                name.to_string(),
                SymbolManifest::new(
                    *name,
                    SymbolKind::Function,
                    vec![Span::new(start, source.len(), row, row)],
                    Metrics::default(),
                ),
            );
        }
        (manifest, source)
    }

    fn link(file: &mut FileManifest, from: &str, target_file: &str, to: &str) {
        if let Some(symbol) = file.symbols.get_mut(from) {
            insert_dependency(
                &mut symbol.dependencies,
                DependencyInfo::internal(target_file).with_symbol(to, to),
            );
        }
    }

    /// a.py: a1 -> b.py#b1, a2 ; b.py: b1 -> c.py#c1, b2 ; c.py: c1, c2
    fn project() -> (Manifest, BTreeMap<FileId, String>) {
        let (mut a, a_src) = file("a.py", &["a1", "a2"]);
        let (mut b, b_src) = file("b.py", &["b1", "b2"]);
        let (c, c_src) = file("c.py", &["c1", "c2"]);
        link(&mut a, "a1", "b.py", "b1");
        link(&mut b, "b1", "c.py", "c1");

        let manifest = assemble(vec![a, b, c]).unwrap();
        let sources = BTreeMap::from([
            ("a.py".to_string(), a_src),
            ("b.py".to_string(), b_src),
            ("c.py".to_string(), c_src),
        ]);
        (manifest, sources)
    }

    #[test]
    fn test_depth_zero_keeps_only_seed_file() {
        let (manifest, sources) = project();
        let seeds = [ExtractionSeed::new("b.py", &["b1"])];
        let out = extract(&manifest, &sources, &seeds, Depths::default()).unwrap();

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files["b.py"], "b1\n");
    }

    #[test]
    fn test_dependency_depth_bounds_hops() {
        let (manifest, sources) = project();
        let seeds = [ExtractionSeed::new("a.py", &["a1"])];

        let depths = Depths {
            dependency: 1,
            dependent: 0,
        };
        let one = extract(&manifest, &sources, &seeds, depths).unwrap();
        assert_eq!(one.files.keys().collect::<Vec<_>>(), ["a.py", "b.py"]);
        assert_eq!(one.files["b.py"], "b1\n");

        let depths = Depths {
            dependency: 2,
            dependent: 0,
        };
        let two = extract(&manifest, &sources, &seeds, depths).unwrap();
        assert_eq!(two.files["c.py"], "c1\n");
    }

    #[test]
    fn test_dependent_traversal_is_independent() {
        let (manifest, sources) = project();
        let seeds = [ExtractionSeed::new("b.py", &["b1"])];

        let depths = Depths {
            dependency: 0,
            dependent: 1,
        };
        let out = extract(&manifest, &sources, &seeds, depths).unwrap();
        assert_eq!(out.files.keys().collect::<Vec<_>>(), ["a.py", "b.py"]);
        assert_eq!(out.files["a.py"], "a1\n");
    }

    #[test]
    fn test_cycles_terminate() {
        let (mut a, a_src) = file("a.py", &["x", "y"]);
        link(&mut a, "x", "a.py", "y");
        link(&mut a, "y", "a.py", "x");
        let manifest = assemble(vec![a]).unwrap();
        let sources = BTreeMap::from([("a.py".to_string(), a_src.clone())]);

        let seeds = [ExtractionSeed::new("a.py", &["x"])];
        let depths = Depths {
            dependency: 50,
            dependent: 50,
        };
        let out = extract(&manifest, &sources, &seeds, depths).unwrap();
        assert_eq!(out.files["a.py"], a_src);
    }

    #[test]
    fn test_unknown_seed_is_error() {
        let (manifest, sources) = project();
        let seeds = [ExtractionSeed::new("a.py", &["nope"])];
        let err = extract(&manifest, &sources, &seeds, Depths::default());
        assert!(matches!(err, Err(SprigError::UnknownSymbol { .. })));

        let seeds = [ExtractionSeed::new("z.py", &["a1"])];
        let err = extract(&manifest, &sources, &seeds, Depths::default());
        assert!(matches!(err, Err(SprigError::UnknownFile(_))));
    }

    #[test]
    fn test_seed_parsing() {
        let seed: ExtractionSeed = "src/main.c|main".parse().unwrap();
        assert_eq!(seed, ExtractionSeed::new("src/main.c", &["main"]));
        assert!("no-separator".parse::<ExtractionSeed>().is_err());
        assert!("file|".parse::<ExtractionSeed>().is_err());
    }

    #[test]
    fn test_seed_grouping() {
        let grouped = ExtractionSeed::group(vec![
            ExtractionSeed::new("a.py", &["a1"]),
            ExtractionSeed::new("b.py", &["b1"]),
            ExtractionSeed::new("a.py", &["a2", "a1"]),
        ]);
        assert_eq!(
            grouped,
            vec![
                ExtractionSeed::new("a.py", &["a1", "a2"]),
                ExtractionSeed::new("b.py", &["b1"]),
            ]
        );
    }
}
