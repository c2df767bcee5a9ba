//! Project configuration (`.sprig.toml`)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SprigError};
use crate::model::Language;

/// Config file looked up at the project root.
pub const CONFIG_FILE: &str = ".sprig.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub out_dir: PathBuf,
    /// Restrict analysis to these languages. `None` analyzes all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<Language>>,
    pub project: ProjectFiles,
    pub python: PythonConfig,
    pub extract: ExtractConfig,
    pub metrics: MetricsConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            out_dir: PathBuf::from("sprig-out"),
            languages: None,
            project: ProjectFiles::default(),
            python: PythonConfig::default(),
            extract: ExtractConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load `.sprig.toml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(ProjectConfig::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SprigError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SprigError::Config(e.to_string()))
    }

    /// Whether files of `language` take part in the analysis.
    pub fn analyzes(&self, language: Language) -> bool {
        self.languages
            .as_ref()
            .is_none_or(|languages| languages.contains(&language))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFiles {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for ProjectFiles {
    fn default() -> Self {
        ProjectFiles {
            include: vec!["**/*".to_string()],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/.git/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/bin/**".to_string(),
                "**/obj/**".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    pub version: PythonVersion,
}

/// A `3.x` Python version with a known standard-library table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u8,
    pub minor: u8,
}

impl PythonVersion {
    pub const OLDEST: PythonVersion = PythonVersion { major: 3, minor: 8 };
    pub const NEWEST: PythonVersion = PythonVersion { major: 3, minor: 13 };

    pub fn new(major: u8, minor: u8) -> Result<Self> {
        let version = PythonVersion { major, minor };
        if version < Self::OLDEST || version > Self::NEWEST {
            return Err(SprigError::Config(format!(
                "Python version {version} is not supported (expected {} to {})",
                Self::OLDEST,
                Self::NEWEST
            )));
        }
        Ok(version)
    }
}

impl Default for PythonVersion {
    fn default() -> Self {
        PythonVersion { major: 3, minor: 12 }
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for PythonVersion {
    type Err = SprigError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SprigError::Config(format!("invalid Python version `{s}`"));
        let mut parts = s.trim().split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        PythonVersion::new(major, minor)
    }
}

impl Serialize for PythonVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PythonVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub dependency_depth: usize,
    pub dependent_depth: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            dependency_depth: 1,
            dependent_depth: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub file: Thresholds,
    pub symbol: Thresholds,
}

/// Upper bounds checked by the audit. Unset bounds are not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_code_char: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_char: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_code_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dependency: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dependent: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cyclomatic_complexity: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.python.version.to_string(), "3.12");
    }

    #[test]
    fn test_parse_partial_file() {
        let config = ProjectConfig::from_toml(
            r#"
            out_dir = "build/sprig"
            languages = ["python", "csharp"]

            [python]
            version = "3.9"

            [metrics.symbol]
            max_cyclomatic_complexity = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.out_dir, PathBuf::from("build/sprig"));
        assert!(config.analyzes(Language::CSharp));
        assert!(!config.analyzes(Language::C));
        assert_eq!(config.python.version, PythonVersion::new(3, 9).unwrap());
        assert_eq!(config.metrics.symbol.max_cyclomatic_complexity, Some(10));
        assert_eq!(config.extract, ExtractConfig::default());
    }

    #[test]
    fn test_unsupported_python_version_rejected() {
        let err = ProjectConfig::from_toml("[python]\nversion = \"2.7\"\n");
        assert!(matches!(err, Err(SprigError::Config(_))));
        assert!("3.x".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn test_language_aliases_and_unknown_language() {
        let config = ProjectConfig::from_toml("languages = [\"ts\", \"C#\"]\n").unwrap();
        assert!(config.analyzes(Language::TypeScript));
        assert!(config.analyzes(Language::CSharp));
        assert!(!config.analyzes(Language::Python));

        let err = ProjectConfig::from_toml("languages = [\"cobol\"]\n").unwrap_err();
        assert!(err.to_string().contains("Unsupported language `cobol`"), "{}", err);
        assert!(matches!(
            "rust".parse::<Language>(),
            Err(SprigError::UnsupportedLanguage(name)) if name == "rust"
        ));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = ProjectConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("version = \"3.12\""));
        assert_eq!(ProjectConfig::from_toml(&text).unwrap(), config);
    }
}
