//! Project file discovery
//!
//! Walks the root with `.gitignore` support, then filters by the configured
//! include/exclude globs and language list. Matching runs on file ids. The
//! configured output directory is never walked, so extracted copies are not
//! analyzed again.

use crate::project::file_id;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use sprig_core::{FileId, Language, ProjectConfig, Result, SprigError};
use std::path::{Path, PathBuf};

/// A file selected for analysis, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub id: FileId,
    pub path: PathBuf,
    pub language: Language,
}

pub struct Discovery<'a> {
    config: &'a ProjectConfig,
    include: GlobSet,
    exclude: GlobSet,
}

impl<'a> Discovery<'a> {
    pub fn new(config: &'a ProjectConfig) -> Result<Self> {
        Ok(Discovery {
            config,
            include: compile(&config.project.include)?,
            exclude: compile(&config.project.exclude)?,
        })
    }

    /// Every analyzable file under `root`, sorted by id.
    pub fn walk(&self, root: &Path) -> Vec<DiscoveredFile> {
        // an out_dir of "." would otherwise hide the whole project
        let out_dir = Some(root.join(&self.config.out_dir)).filter(|dir| dir != root);
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .filter_entry(move |entry| {
                !out_dir.as_ref().is_some_and(|dir| entry.path().starts_with(dir))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if let Some(file) = self.select(root, entry.path()) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::info!("Discovered {} source files in {}", files.len(), root.display());
        files
    }

    fn select(&self, root: &Path, path: &Path) -> Option<DiscoveredFile> {
        let language = Language::from_path(path)?;
        if !self.config.analyzes(language) {
            return None;
        }
        let id = file_id(root, path)?;
        if !self.include.is_match(&id) || self.exclude.is_match(&id) {
            tracing::debug!("{} filtered out by config globs", id);
            return None;
        }
        Some(DiscoveredFile {
            id,
            path: path.to_path_buf(),
            language,
        })
    }
}

/// Shorthand for `Discovery::new(config)?.walk(root)`.
pub fn discover(root: &Path, config: &ProjectConfig) -> Result<Vec<DiscoveredFile>> {
    Ok(Discovery::new(config)?.walk(root))
}

fn compile(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| SprigError::Config(format!("invalid glob `{pattern}`: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SprigError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_file(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn ids(files: &[DiscoveredFile]) -> Vec<&str> {
        files.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_walk_keeps_supported_languages() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "main.c", "int main(void) { return 0; }");
        create_file(temp_dir.path(), "src/app.ts", "export const x = 1;");
        create_file(temp_dir.path(), "src/pkg/mod.py", "x = 1");
        create_file(temp_dir.path(), "README.md", "# readme");
        create_file(temp_dir.path(), "lib.rs", "fn main() {}");

        let files = discover(temp_dir.path(), &ProjectConfig::default()).unwrap();
        assert_eq!(ids(&files), vec!["main.c", "src/app.ts", "src/pkg/mod.py"]);
        assert_eq!(files[1].language, Language::TypeScript);
    }

    #[test]
    fn test_default_excludes_and_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), ".gitignore", "build/\n");
        create_file(temp_dir.path(), "index.js", "");
        create_file(temp_dir.path(), "node_modules/lodash/index.js", "");
        create_file(temp_dir.path(), "build/out.js", "");

        let files = discover(temp_dir.path(), &ProjectConfig::default()).unwrap();
        assert_eq!(ids(&files), vec!["index.js"]);
    }

    #[test]
    fn test_output_directory_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "a.py", "x = 1");
        create_file(temp_dir.path(), "sprig-out/extracted-1/a.py", "x = 1");
        create_file(temp_dir.path(), "build/manifests/b.py", "y = 2");

        let files = discover(temp_dir.path(), &ProjectConfig::default()).unwrap();
        assert_eq!(ids(&files), vec!["a.py", "build/manifests/b.py"]);

        let config = ProjectConfig::from_toml("out_dir = \"build/manifests\"\n").unwrap();
        let files = discover(temp_dir.path(), &config).unwrap();
        assert_eq!(ids(&files), vec!["a.py", "sprig-out/extracted-1/a.py"]);
    }

    #[test]
    fn test_config_globs_and_languages() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/a.py", "");
        create_file(temp_dir.path(), "src/b.cs", "");
        create_file(temp_dir.path(), "tests/test_a.py", "");

        let config = ProjectConfig::from_toml(
            "languages = [\"python\"]\n[project]\ninclude = [\"src/**\"]\nexclude = []\n",
        )
        .unwrap();
        let files = discover(temp_dir.path(), &config).unwrap();
        assert_eq!(ids(&files), vec!["src/a.py"]);
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let config = ProjectConfig::from_toml("[project]\ninclude = [\"src/[\"]\n").unwrap();
        assert!(matches!(
            Discovery::new(&config),
            Err(SprigError::Config(_))
        ));
    }
}
