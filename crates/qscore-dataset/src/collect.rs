//! Gather per-project score files into one JSON document

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// `dataType -> project -> Q`
pub type ScoreTable = BTreeMap<String, BTreeMap<String, f64>>;

pub const SCORES_FILE: &str = "q_values.json";

/// Read every `<output_dir>/<dataType>/<project>.<extension>`. Files that do
/// not hold a finite number are logged and skipped.
pub fn collect_scores(output_dir: &Path, extension: &str) -> Result<ScoreTable> {
    let mut table = ScoreTable::new();
    let groups = std::fs::read_dir(output_dir)
        .with_context(|| format!("failed to read {}", output_dir.display()))?;

    for group in groups {
        let group = group?;
        if !group.file_type()?.is_dir() {
            continue;
        }
        let data_type = group.file_name().to_string_lossy().into_owned();
        let mut scores = BTreeMap::new();

        for entry in std::fs::read_dir(group.path())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extension) || !path.is_file() {
                continue;
            }
            let Some(project) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            match read_score(&path) {
                Ok(q) => {
                    scores.insert(project, q);
                }
                Err(e) => tracing::warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        if !scores.is_empty() {
            table.insert(data_type, scores);
        }
    }
    Ok(table)
}

fn read_score(path: &Path) -> Result<f64> {
    let text = std::fs::read_to_string(path)?;
    let q: f64 = text
        .trim()
        .parse()
        .with_context(|| format!("not a number: {:?}", text.trim()))?;
    anyhow::ensure!(q.is_finite(), "not a finite score: {}", q);
    Ok(q)
}

/// Collect scores and write them to `<output_dir>/q_values.json`.
pub fn write_scores(output_dir: &Path, extension: &str) -> Result<(PathBuf, ScoreTable)> {
    let table = collect_scores(output_dir, extension)?;
    let path = output_dir.join(SCORES_FILE);
    let json = serde_json::to_string_pretty(&table)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(
        "Collected {} score(s) into {}",
        table.values().map(BTreeMap::len).sum::<usize>(),
        path.display()
    );
    Ok((path, table))
}
