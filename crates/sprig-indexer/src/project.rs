//! Parsed project model shared by every language plugin

use sprig_core::{FileId, Language, PythonVersion, Span};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tree_sitter::{Node, Tree};

/// Raw input: one discovered file and its text.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    pub language: Language,
    pub source: String,
}

impl SourceFile {
    /// Detect the language from the id's extension.
    pub fn detect(id: impl Into<FileId>, source: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let language = Language::from_path(Path::new(&id))?;
        Some(SourceFile {
            id,
            language,
            source: source.into(),
        })
    }
}

#[derive(Debug)]
pub struct ParsedFile {
    pub id: FileId,
    pub language: Language,
    pub source: String,
    pub tree: Tree,
}

impl ParsedFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    /// Span of the whole file.
    pub fn span(&self) -> Span {
        let root = self.root();
        Span::new(0, self.source.len(), 0, root.end_position().row)
    }

    /// Directory part of the id, `""` at the project root.
    pub fn dir(&self) -> &str {
        parent_dir(&self.id)
    }
}

/// Every parsed file of one analysis run.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub files: BTreeMap<FileId, ParsedFile>,
    pub python_version: PythonVersion,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, python_version: PythonVersion) -> Self {
        Project {
            root: root.into(),
            files: BTreeMap::new(),
            python_version,
        }
    }

    pub fn insert(&mut self, file: ParsedFile) {
        self.files.insert(file.id.clone(), file);
    }

    pub fn file(&self, id: &str) -> Option<&ParsedFile> {
        self.files.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.files.contains_key(id)
    }

    /// Files whose language is one of `languages`, in id order.
    pub fn files_in<'a>(
        &'a self,
        languages: &'a [Language],
    ) -> impl Iterator<Item = &'a ParsedFile> {
        self.files
            .values()
            .filter(move |f| languages.contains(&f.language))
    }
}

/// Span of a syntax node.
pub fn node_span(node: Node) -> Span {
    Span::new(
        node.start_byte(),
        node.end_byte(),
        node.start_position().row,
        node.end_position().row,
    )
}

/// Turn a path under `root` into a file id: relative, `/`-separated.
pub fn file_id(root: &Path, path: &Path) -> Option<FileId> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Directory part of a file id.
pub fn parent_dir(id: &str) -> &str {
    id.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Join `relative` onto the directory `dir`, folding `.` and `..`.
/// Returns `None` when the path climbs above the project root.
pub fn join(dir: &str, relative: &str) -> Option<FileId> {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for part in relative.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Strip the extension from the last segment of a file id.
pub fn strip_extension(id: &str) -> &str {
    let name_start = id.rfind('/').map_or(0, |i| i + 1);
    match id[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &id[..name_start + dot],
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_normalizes_separators() {
        let root = Path::new("/work/project");
        let path = root.join("src").join("lib").join("a.c");
        assert_eq!(file_id(root, &path).unwrap(), "src/lib/a.c");
        assert!(file_id(root, Path::new("/elsewhere/a.c")).is_none());
    }

    #[test]
    fn test_join_folds_dots() {
        assert_eq!(join("src/lib", "../inc/a.h").unwrap(), "src/inc/a.h");
        assert_eq!(join("", "./a.h").unwrap(), "a.h");
        assert!(join("src", "../../a.h").is_none());
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("src/burgers.h"), "src/burgers");
        assert_eq!(strip_extension("types.d.ts"), "types.d");
        assert_eq!(strip_extension("dir.v1/Makefile"), "dir.v1/Makefile");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }
}
