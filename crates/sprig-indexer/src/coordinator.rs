//! Orchestrates parsing and per-file analysis, then assembles the manifest

use crate::languages::Plugins;
use crate::parser_pool::{create_parser_pool, ParseRequest, ParserPool};
use crate::plugin::{ExportedSymbol, SymbolUsage};
use crate::project::{ParsedFile, Project, SourceFile};
use crate::syntax::cyclomatic_complexity;
use rayon::prelude::*;
use sprig_core::{
    assemble, insert_dependency, measure, DeclarationRole, Diagnostic, FileManifest, Manifest,
    Metrics, PythonVersion, Result, Span, SprigError, SymbolId, SymbolKind, SymbolManifest,
};
use std::collections::BTreeMap;
use std::path::Path;

/// A finished build: the verified manifest plus every per-file problem.
#[derive(Debug)]
pub struct BuildOutput {
    pub manifest: Manifest,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Coordinator {
    pool: ParserPool,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Coordinator {
            pool: create_parser_pool(),
        }
    }

    pub fn with_pool(pool: ParserPool) -> Self {
        Coordinator { pool }
    }

    /// Parse every source. Files that fail to parse are left out of the
    /// project and reported as diagnostics.
    pub fn parse(
        &self,
        root: &Path,
        sources: Vec<SourceFile>,
        python_version: PythonVersion,
    ) -> (Project, Vec<Diagnostic>) {
        let requests = sources
            .into_iter()
            .map(|source| ParseRequest {
                id: source.id,
                language: source.language,
                content: source.source,
            })
            .collect();

        let mut project = Project::new(root, python_version);
        let mut diagnostics = Vec::new();

        for reply in self.pool.parse_all(requests) {
            match reply {
                Ok(result) => {
                    if result.tree.root_node().has_error() {
                        tracing::debug!(
                            "{}: syntax errors, continuing with recovered tree",
                            result.id
                        );
                    }
                    project.insert(ParsedFile {
                        id: result.id,
                        language: result.language,
                        source: result.content,
                        tree: result.tree,
                    });
                }
                Err(failure) => {
                    tracing::warn!("Failed to parse {}: {}", failure.id, failure.error);
                    diagnostics.push(Diagnostic {
                        file: failure.id.clone(),
                        error: SprigError::Parse {
                            file: failure.id,
                            reason: failure.error.to_string(),
                        },
                    });
                }
            }
        }

        (project, diagnostics)
    }

    /// Parse, analyze and assemble in one go.
    pub fn build(
        &self,
        root: &Path,
        sources: Vec<SourceFile>,
        python_version: PythonVersion,
    ) -> Result<BuildOutput> {
        let (project, mut diagnostics) = self.parse(root, sources, python_version);
        let mut output = analyze(&project)?;
        diagnostics.append(&mut output.diagnostics);
        output.diagnostics = diagnostics;
        Ok(output)
    }
}

/// Run every plugin over the project and assemble the manifest. Files are
/// analyzed in parallel; the result does not depend on scheduling.
pub fn analyze(project: &Project) -> Result<BuildOutput> {
    let plugins = Plugins::new(project);
    let files: Vec<&ParsedFile> = project.files.values().collect();

    tracing::info!("Analyzing {} files", files.len());

    let analyzed: Vec<(FileManifest, Vec<Diagnostic>)> = files
        .par_iter()
        .map(|file| analyze_file(&plugins, file))
        .collect();

    let mut manifests = Vec::with_capacity(analyzed.len());
    let mut diagnostics = Vec::new();
    for (manifest, mut issues) in analyzed {
        manifests.push(manifest);
        diagnostics.append(&mut issues);
    }

    let manifest = assemble(manifests)?;
    if !diagnostics.is_empty() {
        tracing::info!("{} files reported resolution issues", diagnostics.len());
    }
    Ok(BuildOutput {
        manifest,
        diagnostics,
    })
}

fn analyze_file(plugins: &Plugins, file: &ParsedFile) -> (FileManifest, Vec<Diagnostic>) {
    let plugin = plugins.for_language(file.language);
    let syntax = plugin.comment_syntax();
    let kinds = plugin.complexity_kinds();

    let exports = plugin.resolve_exports(file);
    let diagnostics = exports
        .issues
        .into_iter()
        .map(|error| Diagnostic {
            file: file.id.clone(),
            error,
        })
        .collect();
    let exports = exports.value;
    let imports = plugin.resolve_imports(file);
    let usages = plugin.resolve_usages(file, &exports, &imports);

    let metrics_of = |span: &Span| {
        measure(
            &file.source,
            span,
            &syntax,
            cyclomatic_complexity(file.root(), span, kinds),
        )
    };

    let mut manifest = FileManifest::new(file.id.clone(), file.language, metrics_of(&file.span()));

    for (id, (kind, spans)) in merge_declarations(&exports) {
        let mut metrics = Metrics::default();
        for span in &spans {
            metrics += metrics_of(span);
        }
        manifest
            .symbols
            .insert(id.clone(), SymbolManifest::new(id, kind, spans, metrics));
    }

    for usage in usages {
        record_usage(&mut manifest, usage);
    }

    tracing::debug!(
        "{}: {} symbols, {} imports",
        file.id,
        manifest.symbols.len(),
        imports.len()
    );
    (manifest, diagnostics)
}

/// Fold same-id declarations into one symbol. A definition takes the
/// primary span; the remaining spans follow in source order.
fn merge_declarations(exports: &[ExportedSymbol]) -> BTreeMap<SymbolId, (SymbolKind, Vec<Span>)> {
    let mut grouped: BTreeMap<SymbolId, Vec<&ExportedSymbol>> = BTreeMap::new();
    for symbol in exports {
        grouped.entry(symbol.id.clone()).or_default().push(symbol);
    }

    grouped
        .into_iter()
        .map(|(id, mut declarations)| {
            declarations.sort_by_key(|d| (d.role != DeclarationRole::Definition, d.span.start));
            let kind = declarations[0].kind;
            let mut spans: Vec<Span> = Vec::with_capacity(declarations.len());
            for declaration in declarations {
                if !spans.contains(&declaration.span) {
                    spans.push(declaration.span);
                }
            }
            (id, (kind, spans))
        })
        .collect()
}

/// Attach a usage to its symbol, or to the file when it has no owner.
/// Same-file edges are kept only between two different symbols.
fn record_usage(manifest: &mut FileManifest, usage: SymbolUsage) {
    let SymbolUsage {
        from,
        mut dependency,
    } = usage;

    if !dependency.is_external && dependency.id == manifest.id {
        if let Some(from) = &from {
            dependency.symbols.retain(|_, target| target != from);
        }
        if from.is_none() || dependency.symbols.is_empty() {
            return;
        }
    }

    match from.and_then(|from| manifest.symbols.get_mut(&from)) {
        Some(symbol) => insert_dependency(&mut symbol.dependencies, dependency),
        None => insert_dependency(&mut manifest.dependencies, dependency),
    }
}
