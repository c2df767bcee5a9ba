//! Threshold audit over manifest metrics

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{MetricsConfig, Thresholds};
use crate::manifest::Manifest;
use crate::metrics::Metrics;
use crate::model::{FileId, SymbolId};

/// A metric above its configured bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub metric: &'static str,
    pub value: usize,
    pub threshold: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAudit {
    pub id: FileId,
    pub alerts: Vec<Alert>,
    pub symbols: BTreeMap<SymbolId, Vec<Alert>>,
}

/// Check every file and symbol against `config`. Only entries with at
/// least one alert are reported.
pub fn audit(manifest: &Manifest, config: &MetricsConfig) -> BTreeMap<FileId, FileAudit> {
    let mut report = BTreeMap::new();

    for file in manifest.files() {
        let alerts = check(&file.metrics, &config.file);
        let symbols: BTreeMap<SymbolId, Vec<Alert>> = file
            .symbols
            .values()
            .map(|s| (s.id.clone(), check(&s.metrics, &config.symbol)))
            .filter(|(_, alerts)| !alerts.is_empty())
            .collect();

        if alerts.is_empty() && symbols.is_empty() {
            continue;
        }
        report.insert(
            file.id.clone(),
            FileAudit {
                id: file.id.clone(),
                alerts,
                symbols,
            },
        );
    }

    tracing::info!("Audit raised alerts in {} files", report.len());
    report
}

fn check(metrics: &Metrics, thresholds: &Thresholds) -> Vec<Alert> {
    let pairs = [
        ("codeCharacterCount", metrics.code_character_count, thresholds.max_code_char),
        ("characterCount", metrics.character_count, thresholds.max_char),
        ("codeLinesCount", metrics.code_lines_count, thresholds.max_code_line),
        ("linesCount", metrics.lines_count, thresholds.max_line),
        ("dependencyCount", metrics.dependency_count, thresholds.max_dependency),
        ("dependentCount", metrics.dependent_count, thresholds.max_dependent),
        (
            "cyclomaticComplexity",
            metrics.cyclomatic_complexity,
            thresholds.max_cyclomatic_complexity,
        ),
    ];

    pairs
        .into_iter()
        .filter_map(|(metric, value, bound)| {
            bound
                .filter(|&threshold| value > threshold)
                .map(|threshold| Alert {
                    metric,
                    value,
                    threshold,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{assemble, FileManifest, SymbolManifest};
    use crate::model::{Language, Span, SymbolKind};

    #[test]
    fn test_alerts_only_above_threshold() {
        let mut file = FileManifest::new(
            "a.c",
            Language::C,
            Metrics {
                lines_count: 10,
                ..Metrics::default()
            },
        );
        file.symbols.insert(
            "f".into(),
            SymbolManifest::new(
                "f",
                SymbolKind::Function,
                vec![Span::new(0, 1, 0, 0)],
                Metrics {
                    cyclomatic_complexity: 7,
                    ..Metrics::default()
                },
            ),
        );
        file.symbols.insert(
            "g".into(),
            SymbolManifest::new(
                "g",
                SymbolKind::Function,
                vec![Span::new(1, 2, 0, 0)],
                Metrics::default(),
            ),
        );
        let manifest = assemble(vec![file]).unwrap();

        let config = MetricsConfig {
            file: Thresholds {
                max_line: Some(10),
                ..Thresholds::default()
            },
            symbol: Thresholds {
                max_cyclomatic_complexity: Some(5),
                ..Thresholds::default()
            },
        };
        let report = audit(&manifest, &config);

        let a = &report["a.c"];
        assert!(a.alerts.is_empty());
        assert_eq!(
            a.symbols["f"],
            vec![Alert {
                metric: "cyclomaticComplexity",
                value: 7,
                threshold: 5
            }]
        );
        assert!(!a.symbols.contains_key("g"));
    }
}
