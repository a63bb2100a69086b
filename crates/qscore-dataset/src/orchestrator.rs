//! Dataset Orchestrator: score every `<dataset>/<dataType>/<project>` in
//! its own child process, a bounded number at a time

use crate::task::IsolatedTask;
use anyhow::{Context, Result};
use qscore_core::ScoreConfig;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Logged once when every project has been attempted.
pub const COMPLETION_MARKER: &str = "complete preprocessing all projects";

/// How to start the child that scores a single project.
#[derive(Debug, Clone)]
pub struct Launcher {
    program: PathBuf,
    base_args: Vec<OsString>,
}

impl Launcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Launcher {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Re-invoke the running executable.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    /// Arguments placed before the per-project ones.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// One project found in a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub data_type: String,
    pub name: String,
    pub path: PathBuf,
}

impl ProjectEntry {
    /// `dataType/project`, used to tag log lines.
    pub fn id(&self) -> String {
        format!("{}/{}", self.data_type, self.name)
    }
}

/// Outcome of a batch run, by project id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Immediate subdirectories of `dir`, sorted by name.
fn subdirectories(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            found.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    found.sort();
    Ok(found)
}

/// Projects under `dataset`, grouped by data type.
pub fn list_projects(dataset: &Path) -> Result<BTreeMap<String, Vec<ProjectEntry>>> {
    let mut groups = BTreeMap::new();
    let data_types = subdirectories(dataset)
        .with_context(|| format!("failed to read dataset {}", dataset.display()))?;
    for (data_type, dir) in data_types {
        let projects = subdirectories(&dir)
            .with_context(|| format!("failed to read data type {}", dir.display()))?;
        let entries = projects
            .into_iter()
            .map(|(name, path)| ProjectEntry {
                data_type: data_type.clone(),
                name,
                path,
            })
            .collect();
        groups.insert(data_type, entries);
    }
    Ok(groups)
}

pub struct Orchestrator {
    launcher: Launcher,
    config: ScoreConfig,
    config_path: Option<PathBuf>,
    output_dir: PathBuf,
    num_workers: usize,
}

impl Orchestrator {
    pub fn new(launcher: Launcher, output_dir: impl Into<PathBuf>, num_workers: usize) -> Self {
        Orchestrator {
            launcher,
            config: ScoreConfig::default(),
            config_path: None,
            output_dir: output_dir.into(),
            num_workers: num_workers.max(1),
        }
    }

    /// Use `config`, and forward `path` (if any) to every child.
    pub fn with_config(mut self, config: ScoreConfig, path: Option<PathBuf>) -> Self {
        self.config = config;
        self.config_path = path;
        self
    }

    fn project_output_dir(&self, project: &ProjectEntry) -> PathBuf {
        self.output_dir.join(&project.data_type)
    }

    fn score_file(&self, project: &ProjectEntry) -> PathBuf {
        self.project_output_dir(project)
            .join(self.config.score_file_name(&project.name))
    }

    fn task(&self, project: &ProjectEntry) -> IsolatedTask {
        let isolation = &self.config.isolation;
        let timeout = (isolation.timeout_secs > 0)
            .then(|| Duration::from_secs(isolation.timeout_secs));

        let mut task = IsolatedTask::new(project.id(), &self.launcher.program)
            .args(self.launcher.base_args.iter().cloned())
            .arg("--project")
            .arg(&project.path)
            .arg("--output_dir")
            .arg(self.project_output_dir(project))
            .memory_limit_mb(isolation.memory_limit_mb)
            .timeout(timeout);
        if let Some(path) = &self.config_path {
            task = task.arg("--config").arg(path);
        }
        task
    }

    /// Score every project in `dataset`. Per-project failures are logged and
    /// recorded in the report; only an unreadable dataset is an error.
    pub async fn run(&self, dataset: &Path) -> Result<BatchReport> {
        let groups = list_projects(dataset)?;
        let semaphore = Arc::new(Semaphore::new(self.num_workers));
        let mut report = BatchReport::default();
        let mut handles = Vec::new();

        tracing::info!(
            "Scoring {} project(s) in {} with {} worker(s)",
            groups.values().map(Vec::len).sum::<usize>(),
            dataset.display(),
            self.num_workers
        );

        for projects in groups.into_values() {
            for project in projects {
                let out_dir = self.project_output_dir(&project);
                if let Err(e) = std::fs::create_dir_all(&out_dir) {
                    tracing::error!(
                        project = %project.id(),
                        "Failed to create {}: {}",
                        out_dir.display(),
                        e
                    );
                    report.failed.push(project.id());
                    continue;
                }

                let score_file = self.score_file(&project);
                match std::fs::remove_file(&score_file) {
                    Ok(()) => tracing::debug!("Removed stale {}", score_file.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => tracing::warn!(
                        project = %project.id(),
                        "Failed to remove stale {}: {}",
                        score_file.display(),
                        e
                    ),
                }

                let task = self.task(&project);
                let semaphore = Arc::clone(&semaphore);
                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    task.run().await
                });
                handles.push((project, score_file, handle));
            }
        }

        for (project, score_file, handle) in handles {
            let id = project.id();
            match handle.await {
                Ok(Ok(_)) if score_file.is_file() => report.succeeded.push(id),
                Ok(Ok(_)) => {
                    tracing::warn!(project = %id, "Finished without writing a score");
                    report.failed.push(id);
                }
                Ok(Err(e)) => {
                    tracing::error!(project = %id, "{}", e);
                    report.failed.push(id);
                }
                Err(e) => {
                    tracing::error!(project = %id, "Worker task failed: {}", e);
                    report.failed.push(id);
                }
            }
        }

        tracing::info!(
            "{}: {} scored, {} failed",
            COMPLETION_MARKER,
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
