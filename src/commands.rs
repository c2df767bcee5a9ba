//! CLI command implementations

use anyhow::Context;
use sprig_core::{
    audit as audit_manifest, extract as extract_symbols, Depths, Diagnostic, ExtractionSeed, FileId,
    Manifest, ProjectConfig, CONFIG_FILE,
};
use sprig_indexer::{discover, Coordinator, DiscoveredFile, SourceFile};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

/// A built project: its config, the text of every analyzed file and the manifest.
struct Loaded {
    config: ProjectConfig,
    out_dir: PathBuf,
    sources: BTreeMap<FileId, String>,
    manifest: Manifest,
}

pub async fn manifest(root: PathBuf, out_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let loaded = load(&root, out_dir).await?;

    let json = loaded
        .manifest
        .to_json_pretty()
        .context("Failed to serialize manifest")?;
    let path = loaded.out_dir.join("manifest.json");
    write_file(&path, &json).await?;

    tracing::info!(
        "Wrote {} files and {} symbols to {}",
        loaded.manifest.file_count(),
        loaded.manifest.symbol_count(),
        path.display()
    );
    Ok(())
}

pub async fn extract(
    root: PathBuf,
    out_dir: Option<PathBuf>,
    seeds: Vec<ExtractionSeed>,
    dependency_depth: Option<usize>,
    dependent_depth: Option<usize>,
) -> anyhow::Result<()> {
    let loaded = load(&root, out_dir).await?;
    let depths = Depths {
        dependency: dependency_depth.unwrap_or(loaded.config.extract.dependency_depth),
        dependent: dependent_depth.unwrap_or(loaded.config.extract.dependent_depth),
    };
    let seeds = ExtractionSeed::group(seeds);

    let extraction = extract_symbols(&loaded.manifest, &loaded.sources, &seeds, depths)
        .context("Extraction failed")?;
    for rejected in &extraction.rejected {
        tracing::warn!("Range not removed: {}", rejected);
    }

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let target = loaded.out_dir.join(format!("extracted-{stamp}"));
    for (id, text) in &extraction.files {
        write_file(&target.join(id), text).await?;
    }

    tracing::info!(
        "Extracted {} files into {}",
        extraction.files.len(),
        target.display()
    );
    Ok(())
}

pub async fn audit(root: PathBuf, out_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let loaded = load(&root, out_dir).await?;
    let report = audit_manifest(&loaded.manifest, &loaded.config.metrics);

    for (id, file) in &report {
        for alert in &file.alerts {
            tracing::warn!("{}: {} = {} (max {})", id, alert.metric, alert.value, alert.threshold);
        }
        for (symbol, alerts) in &file.symbols {
            for alert in alerts {
                tracing::warn!(
                    "{}#{}: {} = {} (max {})",
                    id,
                    symbol,
                    alert.metric,
                    alert.value,
                    alert.threshold
                );
            }
        }
    }

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize audit report")?;
    let path = loaded.out_dir.join("audit.json");
    write_file(&path, &json).await?;
    tracing::info!("Wrote audit report to {}", path.display());
    Ok(())
}

pub async fn init(root: PathBuf, force: bool) -> anyhow::Result<()> {
    let path = root.join(CONFIG_FILE);
    if !force && tokio::fs::try_exists(&path).await.unwrap_or(false) {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let text = ProjectConfig::default()
        .to_toml()
        .context("Failed to render default config")?;
    write_file(&path, &text).await?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Load config, read every discovered file and build the manifest.
async fn load(root: &Path, out_dir: Option<PathBuf>) -> anyhow::Result<Loaded> {
    let mut config = ProjectConfig::load(root)
        .with_context(|| format!("Failed to load config from {}", root.display()))?;
    if let Some(out_dir) = out_dir {
        config.out_dir = out_dir;
    }
    let out_dir = root.join(&config.out_dir);

    let discovered = discover(root, &config).context("File discovery failed")?;
    let (files, mut diagnostics) = read_sources(discovered).await;

    let sources: BTreeMap<FileId, String> = files
        .iter()
        .map(|f| (f.id.clone(), f.source.clone()))
        .collect();

    let build_root = root.to_path_buf();
    let python_version = config.python.version;
    let output = tokio::task::spawn_blocking(move || {
        Coordinator::new().build(&build_root, files, python_version)
    })
    .await
    .context("Analysis task panicked")?
    .context("Failed to build manifest")?;

    diagnostics.extend(output.diagnostics);
    for diagnostic in &diagnostics {
        tracing::warn!("{}: {}", diagnostic.file, diagnostic.error);
    }

    Ok(Loaded {
        config,
        out_dir,
        sources,
        manifest: output.manifest,
    })
}

/// Read all files concurrently. Unreadable or non-UTF-8 files become diagnostics.
async fn read_sources(discovered: Vec<DiscoveredFile>) -> (Vec<SourceFile>, Vec<Diagnostic>) {
    let mut reads = JoinSet::new();
    for file in discovered {
        reads.spawn(async move {
            let result = tokio::fs::read_to_string(&file.path).await;
            (file, result)
        });
    }

    let mut files = Vec::new();
    let mut diagnostics = Vec::new();
    while let Some(joined) = reads.join_next().await {
        let (file, result) = match joined {
            Ok(read) => read,
            Err(e) => {
                tracing::warn!("Read task failed: {}", e);
                continue;
            }
        };
        match result {
            Ok(source) => files.push(SourceFile {
                id: file.id,
                language: file.language,
                source,
            }),
            Err(e) => diagnostics.push(Diagnostic {
                file: file.id,
                error: e.into(),
            }),
        }
    }

    files.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::info!("Read {} source files", files.len());
    (files, diagnostics)
}

async fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
