//! CLI command implementations

use anyhow::Context;
use qscore_core::ScoreConfig;
use qscore_dataset::{COMPLETION_MARKER, Launcher, Orchestrator, write_scores};
use qscore_indexer::ProjectRunner;
use std::path::PathBuf;

pub struct DatasetOptions {
    pub output_dir: PathBuf,
    pub num_workers: usize,
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

/// Score one project. Scoring failures are logged, not returned.
pub async fn project(
    root: PathBuf,
    output_dir: PathBuf,
    config: ScoreConfig,
) -> anyhow::Result<()> {
    tracing::info!("Scoring project {}", root.display());

    let runner = match ProjectRunner::new(config) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!("{}", e);
            return Ok(());
        }
    };

    tokio::task::spawn_blocking(move || runner.run_logged(&root, &output_dir))
        .await
        .context("scoring task panicked")?;
    Ok(())
}

/// Score every project of a dataset, each in its own child process.
pub async fn dataset(
    dataset: PathBuf,
    options: DatasetOptions,
    config: ScoreConfig,
) -> anyhow::Result<()> {
    let mut launcher = match Launcher::current_exe() {
        Ok(launcher) => launcher,
        Err(e) => {
            tracing::error!("Cannot locate the qscore executable: {}", e);
            tracing::info!("{}: nothing scored", COMPLETION_MARKER);
            return Ok(());
        }
    };
    if options.verbose {
        launcher = launcher.with_args(["--verbose"]);
    }

    let orchestrator = Orchestrator::new(launcher, options.output_dir, options.num_workers)
        .with_config(config, options.config_path);

    match orchestrator.run(&dataset).await {
        Ok(report) => {
            for id in &report.failed {
                tracing::warn!("Not scored: {}", id);
            }
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            tracing::info!("{}: nothing scored", COMPLETION_MARKER);
        }
    }
    Ok(())
}

/// Write `<output_dir>/q_values.json` from the score files under it.
pub fn collect(output_dir: PathBuf, config: &ScoreConfig) -> anyhow::Result<()> {
    match write_scores(&output_dir, &config.score_extension) {
        Ok((path, table)) => {
            tracing::info!("{} data type(s) written to {}", table.len(), path.display());
        }
        Err(e) => tracing::error!("{:#}", e),
    }
    Ok(())
}
