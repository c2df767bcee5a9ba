//! Test utilities for Sprig

use crate::manifest::{insert_dependency, DependencyInfo, FileManifest, SymbolManifest};
use crate::metrics::Metrics;
use crate::model::{Language, Span, SymbolKind};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a temporary directory holding `files` (relative path, contents).
pub fn create_repo_with_structure(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        write_file(temp_dir.path(), path, content);
    }
    temp_dir
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A file manifest whose symbols each occupy one line of a synthetic source.
/// Returns the manifest and that source.
pub fn line_file(id: &str, language: Language, names: &[&str]) -> (FileManifest, String) {
    let mut file = FileManifest::new(id, language, Metrics::default());
    let mut source = String::new();
    for (row, name) in names.iter().enumerate() {
        let start = source.len();
        source.push_str(&format!("def {name}(): pass\n"));
        file.symbols.insert(
            name.to_string(),
            SymbolManifest::new(
                *name,
                SymbolKind::Function,
                vec![Span::new(start, source.len(), row, row)],
                Metrics::default(),
            ),
        );
    }
    (file, source)
}

/// Record that `from` in `file` uses `to` from `target`.
pub fn depend(file: &mut FileManifest, from: &str, target: &str, to: &str) {
    if let Some(symbol) = file.symbols.get_mut(from) {
        insert_dependency(
            &mut symbol.dependencies,
            DependencyInfo::internal(target).with_symbol(to, to),
        );
    }
}

/// Record that `from` in `file` uses `name` from an external module.
pub fn depend_external(file: &mut FileManifest, from: &str, module: &str, name: &str) {
    if let Some(symbol) = file.symbols.get_mut(from) {
        insert_dependency(
            &mut symbol.dependencies,
            DependencyInfo::external(module, None).with_symbol(name, name),
        );
    }
}
