//! Dependency manifest: file and symbol nodes with symmetric edges
//!
//! Language plugins produce one `FileManifest` per file with dependencies
//! filled in and dependents left empty. [`assemble`] links them into a
//! `Manifest`: it writes the dependent side of every internal edge, folds
//! symbol dependencies into the file summary, recomputes counts and then
//! verifies the graph invariants.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SprigError};
use crate::metrics::Metrics;
use crate::model::{FileId, Language, Span, SymbolId, SymbolKind};

/// Where an external dependency comes from, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExternalOrigin {
    Stdlib,
    ThirdParty,
}

/// An outgoing edge to one file (or external module).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    pub id: FileId,
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ExternalOrigin>,
    /// Locally used name -> resolved name in the target.
    pub symbols: BTreeMap<String, String>,
}

impl DependencyInfo {
    pub fn internal(id: impl Into<FileId>) -> Self {
        DependencyInfo {
            id: id.into(),
            is_external: false,
            origin: None,
            symbols: BTreeMap::new(),
        }
    }

    pub fn external(id: impl Into<FileId>, origin: Option<ExternalOrigin>) -> Self {
        DependencyInfo {
            id: id.into(),
            is_external: true,
            origin,
            symbols: BTreeMap::new(),
        }
    }

    pub fn with_symbol(mut self, local: impl Into<String>, resolved: impl Into<String>) -> Self {
        self.symbols.insert(local.into(), resolved.into());
        self
    }

    /// Fold another edge to the same target into this one.
    pub fn merge(&mut self, other: &DependencyInfo) {
        self.is_external |= other.is_external;
        if self.origin.is_none() {
            self.origin = other.origin;
        }
        for (local, resolved) in &other.symbols {
            self.symbols
                .entry(local.clone())
                .or_insert_with(|| resolved.clone());
        }
    }
}

/// An incoming edge from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentInfo {
    pub id: FileId,
    pub symbols: BTreeMap<SymbolId, SymbolId>,
}

/// Insert `dep` into `deps`, merging with an existing edge to the same target.
pub fn insert_dependency(deps: &mut BTreeMap<FileId, DependencyInfo>, dep: DependencyInfo) {
    match deps.get_mut(&dep.id) {
        Some(existing) => existing.merge(&dep),
        None => {
            deps.insert(dep.id.clone(), dep);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolManifest {
    pub id: SymbolId,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    /// Declaration spans; the first one is primary.
    pub spans: Vec<Span>,
    pub metrics: Metrics,
    pub dependencies: BTreeMap<FileId, DependencyInfo>,
    pub dependents: BTreeMap<FileId, DependentInfo>,
}

impl SymbolManifest {
    pub fn new(
        id: impl Into<SymbolId>,
        kind: SymbolKind,
        spans: Vec<Span>,
        metrics: Metrics,
    ) -> Self {
        SymbolManifest {
            id: id.into(),
            kind,
            spans,
            metrics,
            dependencies: BTreeMap::new(),
            dependents: BTreeMap::new(),
        }
    }

    /// Iterate internal `(target file, target symbol)` pairs this symbol depends on.
    pub fn internal_targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependencies
            .values()
            .filter(|dep| !dep.is_external)
            .flat_map(|dep| {
                dep.symbols
                    .values()
                    .map(move |resolved| (dep.id.as_str(), resolved.as_str()))
            })
    }

    /// Iterate `(source file, source symbol)` pairs that depend on this symbol.
    pub fn dependent_sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependents.values().flat_map(|dependent| {
            dependent
                .symbols
                .keys()
                .map(move |symbol| (dependent.id.as_str(), symbol.as_str()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileManifest {
    pub id: FileId,
    pub language: Language,
    pub metrics: Metrics,
    pub dependencies: BTreeMap<FileId, DependencyInfo>,
    pub dependents: BTreeMap<FileId, DependentInfo>,
    pub symbols: BTreeMap<SymbolId, SymbolManifest>,
}

impl FileManifest {
    pub fn new(id: impl Into<FileId>, language: Language, metrics: Metrics) -> Self {
        FileManifest {
            id: id.into(),
            language,
            metrics,
            dependencies: BTreeMap::new(),
            dependents: BTreeMap::new(),
            symbols: BTreeMap::new(),
        }
    }
}

/// The complete dependency graph of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    files: BTreeMap<FileId, FileManifest>,
}

impl Manifest {
    pub fn file(&self, id: &str) -> Option<&FileManifest> {
        self.files.get(id)
    }

    pub fn symbol(&self, file: &str, symbol: &str) -> Option<&SymbolManifest> {
        self.files.get(file)?.symbols.get(symbol)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileManifest> {
        self.files.values()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.files.values().map(|f| f.symbols.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Check symmetry, id uniqueness and external isolation.
    pub fn verify(&self) -> Result<()> {
        for (file_id, file) in &self.files {
            if &file.id != file_id {
                return Err(violation(format!(
                    "file keyed as {file_id} carries id {}",
                    file.id
                )));
            }

            for (symbol_id, symbol) in &file.symbols {
                if &symbol.id != symbol_id {
                    return Err(violation(format!(
                        "symbol keyed as {file_id}#{symbol_id} carries id {}",
                        symbol.id
                    )));
                }

                for dep in symbol.dependencies.values() {
                    if dep.is_external && self.files.contains_key(&dep.id) {
                        return Err(violation(format!(
                            "{file_id}#{symbol_id} marks analyzed file {} as external",
                            dep.id
                        )));
                    }
                }

                for (target_file, target_symbol) in symbol.internal_targets() {
                    let back = self
                        .symbol(target_file, target_symbol)
                        .and_then(|target| target.dependents.get(file_id))
                        .is_some_and(|d| d.symbols.contains_key(symbol_id));
                    if !back {
                        return Err(violation(format!(
                            "{}#{} depends on {}#{} without a dependent edge back",
                            file_id, symbol_id, target_file, target_symbol
                        )));
                    }
                }

                for (source_file, source_symbol) in symbol.dependent_sources() {
                    let forward = self
                        .symbol(source_file, source_symbol)
                        .and_then(|source| source.dependencies.get(file_id))
                        .is_some_and(|d| {
                            !d.is_external && d.symbols.values().any(|s| s == symbol_id)
                        });
                    if !forward {
                        return Err(violation(format!(
                            "{}#{} lists dependent {}#{} without a dependency edge",
                            file_id, symbol_id, source_file, source_symbol
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn violation(message: String) -> SprigError {
    SprigError::InvariantViolation(message)
}

/// Link per-file manifests into a verified `Manifest`.
///
/// Runs single-threaded: dependent edges land in other files' symbols.
pub fn assemble(files: Vec<FileManifest>) -> Result<Manifest> {
    let mut map: BTreeMap<FileId, FileManifest> = BTreeMap::new();
    for file in files {
        if map.contains_key(&file.id) {
            return Err(violation(format!("file {} analyzed twice", file.id)));
        }
        map.insert(file.id.clone(), file);
    }

    let known: BTreeMap<FileId, BTreeSet<SymbolId>> = map
        .iter()
        .map(|(id, file)| (id.clone(), file.symbols.keys().cloned().collect()))
        .collect();

    prune_unknown_targets(&mut map, &known);
    summarize_file_dependencies(&mut map);
    link_dependents(&mut map);
    recount(&mut map);

    let manifest = Manifest { files: map };
    manifest.verify()?;

    tracing::info!(
        "Manifest assembled: {} files, {} symbols",
        manifest.file_count(),
        manifest.symbol_count()
    );
    Ok(manifest)
}

/// Drop symbol entries that point at symbols the target file does not declare.
fn prune_unknown_targets(
    map: &mut BTreeMap<FileId, FileManifest>,
    known: &BTreeMap<FileId, BTreeSet<SymbolId>>,
) {
    let keep = |dep: &mut DependencyInfo, owner: &str| {
        if dep.is_external {
            return;
        }
        match known.get(&dep.id) {
            Some(symbols) => dep.symbols.retain(|local, resolved| {
                let exists = symbols.contains(resolved);
                if !exists {
                    tracing::debug!(
                        "{}: dropping {} -> {}#{} (not declared)",
                        owner,
                        local,
                        dep.id,
                        resolved
                    );
                }
                exists
            }),
            None => {
                tracing::debug!("{}: dependency {} is not in the manifest", owner, dep.id);
                dep.symbols.clear();
            }
        }
    };

    for file in map.values_mut() {
        let file_id = file.id.clone();
        for dep in file.dependencies.values_mut() {
            keep(dep, &file_id);
        }
        for symbol in file.symbols.values_mut() {
            for dep in symbol.dependencies.values_mut() {
                keep(dep, &file_id);
            }
        }
    }
}

fn summarize_file_dependencies(map: &mut BTreeMap<FileId, FileManifest>) {
    for file in map.values_mut() {
        let symbol_deps: Vec<DependencyInfo> = file
            .symbols
            .values()
            .flat_map(|s| s.dependencies.values().cloned())
            .collect();
        for dep in symbol_deps {
            insert_dependency(&mut file.dependencies, dep);
        }
    }
}

fn link_dependents(map: &mut BTreeMap<FileId, FileManifest>) {
    // (target file, target symbol, source file, source symbol)
    let mut symbol_edges: Vec<(FileId, SymbolId, FileId, SymbolId)> = Vec::new();
    // (target file, source file)
    let mut file_edges: BTreeSet<(FileId, FileId)> = BTreeSet::new();

    for file in map.values() {
        for dep in file.dependencies.values() {
            if !dep.is_external && map.contains_key(&dep.id) {
                file_edges.insert((dep.id.clone(), file.id.clone()));
            }
        }
        for symbol in file.symbols.values() {
            for (target_file, target_symbol) in symbol.internal_targets() {
                symbol_edges.push((
                    target_file.to_string(),
                    target_symbol.to_string(),
                    file.id.clone(),
                    symbol.id.clone(),
                ));
            }
        }
    }

    for (target_file, source_file) in file_edges {
        if let Some(target) = map.get_mut(&target_file) {
            target
                .dependents
                .entry(source_file.clone())
                .or_insert_with(|| DependentInfo {
                    id: source_file,
                    symbols: BTreeMap::new(),
                });
        }
    }

    let edge_count = symbol_edges.len();
    for (target_file, target_symbol, source_file, source_symbol) in symbol_edges {
        let Some(target) = map.get_mut(&target_file) else {
            continue;
        };

        target
            .dependents
            .entry(source_file.clone())
            .or_insert_with(|| DependentInfo {
                id: source_file.clone(),
                symbols: BTreeMap::new(),
            })
            .symbols
            .insert(source_symbol.clone(), source_symbol.clone());

        if let Some(symbol) = target.symbols.get_mut(&target_symbol) {
            symbol
                .dependents
                .entry(source_file.clone())
                .or_insert_with(|| DependentInfo {
                    id: source_file,
                    symbols: BTreeMap::new(),
                })
                .symbols
                .insert(source_symbol.clone(), source_symbol);
        }
    }
    tracing::debug!("Linked {} symbol dependent edges", edge_count);
}

fn recount(map: &mut BTreeMap<FileId, FileManifest>) {
    for file in map.values_mut() {
        file.metrics.dependency_count = file.dependencies.len();
        file.metrics.dependent_count = file.dependents.len();
        for symbol in file.symbols.values_mut() {
            symbol.metrics.dependency_count = symbol.dependencies.len();
            symbol.metrics.dependent_count = symbol.dependents.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 1, 0, 0)
    }

    fn file(id: &str, symbols: &[&str]) -> FileManifest {
        let mut file = FileManifest::new(id, Language::C, Metrics::default());
        for symbol in symbols {
            file.symbols.insert(
                symbol.to_string(),
                SymbolManifest::new(
                    *symbol,
                    SymbolKind::Function,
                    vec![span()],
                    Metrics::default(),
                ),
            );
        }
        file
    }

    fn depend(file: &mut FileManifest, symbol: &str, dep: DependencyInfo) {
        if let Some(s) = file.symbols.get_mut(symbol) {
            insert_dependency(&mut s.dependencies, dep);
        }
    }

    #[test]
    fn test_assemble_links_dependents() {
        let mut main = file("main.c", &["main"]);
        let helper = DependencyInfo::internal("lib.c").with_symbol("helper", "helper");
        depend(&mut main, "main", helper);
        let lib = file("lib.c", &["helper", "unused"]);

        let manifest = assemble(vec![main, lib]).unwrap();

        let helper = manifest.symbol("lib.c", "helper").unwrap();
        assert!(helper.dependents["main.c"].symbols.contains_key("main"));
        assert_eq!(helper.metrics.dependent_count, 1);

        let main_file = manifest.file("main.c").unwrap();
        assert!(main_file.dependencies.contains_key("lib.c"));
        assert_eq!(main_file.metrics.dependency_count, 1);

        let lib_file = manifest.file("lib.c").unwrap();
        assert!(lib_file.dependents["main.c"].symbols.contains_key("main"));
    }

    #[test]
    fn test_unknown_target_symbols_pruned() {
        let mut main = file("main.c", &["main"]);
        depend(&mut main, "main", DependencyInfo::internal("lib.c").with_symbol("ghost", "ghost"));
        depend(&mut main, "main", DependencyInfo::internal("missing.c").with_symbol("x", "x"));
        let lib = file("lib.c", &["helper"]);

        let manifest = assemble(vec![main, lib]).unwrap();
        let main_symbol = manifest.symbol("main.c", "main").unwrap();
        assert!(main_symbol.dependencies["lib.c"].symbols.is_empty());
        assert!(main_symbol.dependencies["missing.c"].symbols.is_empty());
    }

    #[test]
    fn test_external_dependencies_get_no_dependents() {
        let mut main = file("main.c", &["main"]);
        let stdio = DependencyInfo::external("<stdio.h>", None).with_symbol("printf", "printf");
        depend(&mut main, "main", stdio);

        let manifest = assemble(vec![main]).unwrap();
        let dep = &manifest.symbol("main.c", "main").unwrap().dependencies["<stdio.h>"];
        assert!(dep.is_external);
        assert_eq!(dep.symbols.len(), 1);
    }

    #[test]
    fn test_self_file_dependency() {
        let mut a = file("a.py", &["f", "g"]);
        depend(&mut a, "f", DependencyInfo::internal("a.py").with_symbol("g", "g"));

        let manifest = assemble(vec![a]).unwrap();
        let g = manifest.symbol("a.py", "g").unwrap();
        assert!(g.dependents["a.py"].symbols.contains_key("f"));
    }

    #[test]
    fn test_duplicate_file_is_violation() {
        let result = assemble(vec![file("a.c", &[]), file("a.c", &[])]);
        assert!(matches!(result, Err(SprigError::InvariantViolation(_))));
    }

    #[test]
    fn test_verify_detects_missing_back_edge() {
        let mut main = file("main.c", &["main"]);
        let helper = DependencyInfo::internal("lib.c").with_symbol("helper", "helper");
        depend(&mut main, "main", helper);
        let lib = file("lib.c", &["helper"]);

        let mut files = BTreeMap::new();
        files.insert(main.id.clone(), main);
        files.insert(lib.id.clone(), lib);
        let manifest = Manifest { files };

        assert!(matches!(
            manifest.verify(),
            Err(SprigError::InvariantViolation(_))
        ));
    }
}
