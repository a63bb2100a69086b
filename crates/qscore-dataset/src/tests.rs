//! Unit tests for qscore-dataset
//!
//! Children are `/bin/sh` scripts standing in for the scoring binary. They
//! receive `--project <path> --output_dir <dir>` as `$1..$4`.

use crate::*;
use qscore_core::{IsolationConfig, ScoreConfig};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn create_dataset(layout: &[(&str, &[&str])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (data_type, projects) in layout {
        for project in *projects {
            let path = dir.path().join(data_type).join(project);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("Main.java"), "package p; class Main {}").unwrap();
        }
    }
    dir
}

fn sh(script: &str) -> Launcher {
    Launcher::new("/bin/sh").with_args(["-c", script, "sh"])
}

fn unlimited() -> ScoreConfig {
    ScoreConfig {
        isolation: IsolationConfig {
            memory_limit_mb: 0,
            timeout_secs: 0,
        },
        ..ScoreConfig::default()
    }
}

const WRITE_SCORE: &str =
    r#"name=$(basename "$2"); echo "scoring $name"; echo 0.5 > "$4/$name.txt""#;

#[test]
fn test_list_projects_groups_by_data_type() {
    let dataset = create_dataset(&[("small", &["beta", "alpha"]), ("large", &["gamma"])]);
    fs::write(dataset.path().join("README.md"), "not a data type").unwrap();
    fs::write(dataset.path().join("small").join("notes.txt"), "not a project").unwrap();

    let groups = list_projects(dataset.path()).unwrap();

    let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["large", "small"]);
    let small: Vec<String> = groups["small"].iter().map(ProjectEntry::id).collect();
    assert_eq!(small, vec!["small/alpha", "small/beta"]);
    assert_eq!(groups["large"][0].path, dataset.path().join("large").join("gamma"));
}

#[test]
fn test_list_projects_missing_dataset() {
    let dir = TempDir::new().unwrap();
    assert!(list_projects(&dir.path().join("nope")).is_err());
}

#[tokio::test]
async fn test_every_project_gets_a_score_file() {
    let dataset = create_dataset(&[("small", &["alpha", "beta"]), ("large", &["gamma"])]);
    let output = TempDir::new().unwrap();

    let report = Orchestrator::new(sh(WRITE_SCORE), output.path(), 2)
        .with_config(unlimited(), None)
        .run(dataset.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded, vec!["large/gamma", "small/alpha", "small/beta"]);
    assert!(report.failed.is_empty());
    for (data_type, project) in [("small", "alpha"), ("small", "beta"), ("large", "gamma")] {
        let score = output.path().join(data_type).join(format!("{}.txt", project));
        assert_eq!(fs::read_to_string(score).unwrap().trim(), "0.5");
    }
}

#[tokio::test]
async fn test_worker_pool_bounds_concurrency() {
    let projects = ["p1", "p2", "p3", "p4", "p5", "p6"];
    let dataset = create_dataset(&[("t", &projects)]);
    let output = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let running = scratch.path().display().to_string();

    let script = format!(
        r#"name=$(basename "$2")
mkdir "{running}/run.$name"
ls -d "{running}"/run.* | wc -l >> "{running}/peaks.$name"
sleep 0.3
rmdir "{running}/run.$name"
echo 0.5 > "$4/$name.txt""#
    );

    let report = Orchestrator::new(sh(&script), output.path(), 2)
        .with_config(unlimited(), None)
        .run(dataset.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded.len(), projects.len());
    for project in projects {
        let peak: usize = fs::read_to_string(scratch.path().join(format!("peaks.{}", project)))
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(peak >= 1 && peak <= 2, "{} saw {} concurrent children", project, peak);
    }
}

#[tokio::test]
async fn test_crashing_project_does_not_affect_siblings() {
    let dataset = create_dataset(&[("t", &["alpha", "crash", "omega"])]);
    let output = TempDir::new().unwrap();
    let script = r#"name=$(basename "$2")
echo "about to score $name"
if [ "$name" = crash ]; then echo "dying" >&2; kill -9 $$; fi
echo 0.25 > "$4/$name.txt""#;

    let report = Orchestrator::new(sh(script), output.path(), 3)
        .with_config(unlimited(), None)
        .run(dataset.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded, vec!["t/alpha", "t/omega"]);
    assert_eq!(report.failed, vec!["t/crash"]);
    assert_eq!(report.total(), 3);
    assert!(output.path().join("t").join("alpha.txt").is_file());
    assert!(output.path().join("t").join("omega.txt").is_file());
    assert!(!output.path().join("t").join("crash.txt").exists());
}

#[tokio::test]
async fn test_clean_exit_without_score_is_a_failure() {
    let dataset = create_dataset(&[("t", &["empty"])]);
    let output = TempDir::new().unwrap();
    // A stale score from an earlier run must not count.
    fs::create_dir_all(output.path().join("t")).unwrap();
    fs::write(output.path().join("t").join("empty.txt"), "0.9").unwrap();

    let report = Orchestrator::new(sh("echo nothing to score"), output.path(), 1)
        .with_config(unlimited(), None)
        .run(dataset.path())
        .await
        .unwrap();

    assert_eq!(report.failed, vec!["t/empty"]);
    assert!(!output.path().join("t").join("empty.txt").exists());
}

#[tokio::test]
async fn test_child_receives_project_output_and_config() {
    let dataset = create_dataset(&[("t", &["alpha"])]);
    let output = TempDir::new().unwrap();
    let config_path = output.path().join("qscore.toml");
    fs::write(&config_path, "").unwrap();
    let script = r#"printf '%s\n' "$@" > "$4/args"; echo 1 > "$4/alpha.txt""#;

    Orchestrator::new(sh(script), output.path(), 1)
        .with_config(unlimited(), Some(config_path.clone()))
        .run(dataset.path())
        .await
        .unwrap();

    let args = fs::read_to_string(output.path().join("t").join("args")).unwrap();
    let expected = format!(
        "--project\n{}\n--output_dir\n{}\n--config\n{}\n",
        dataset.path().join("t").join("alpha").display(),
        output.path().join("t").display(),
        config_path.display()
    );
    assert_eq!(args, expected);
}

#[tokio::test]
async fn test_task_reports_abnormal_exit() {
    let result = IsolatedTask::new("t/bad", "/bin/sh")
        .args(["-c", "echo partial; exit 3"])
        .run()
        .await;
    match result {
        Err(TaskError::AbnormalExit(status)) => assert_eq!(status.code(), Some(3)),
        other => panic!("expected abnormal exit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_task_reports_spawn_failure() {
    let result = IsolatedTask::new("t/missing", "/definitely/not/a/program")
        .run()
        .await;
    assert!(matches!(result, Err(TaskError::Spawn(_))));
}

#[tokio::test]
async fn test_task_timeout_kills_child() {
    let started = Instant::now();
    let result = IsolatedTask::new("t/slow", "/bin/sh")
        .args(["-c", "exec sleep 10"])
        .timeout(Some(Duration::from_millis(300)))
        .run()
        .await;

    assert!(matches!(result, Err(TaskError::TimedOut(_))));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_chatty_child_does_not_block() {
    // Far more output than a pipe buffer holds, on both streams.
    let script = concat!(
        "i=0; while [ $i -lt 20000 ]; do ",
        "echo \"line $i\"; echo \"err $i\" >&2; i=$((i+1)); done"
    );
    let result = IsolatedTask::new("t/chatty", "/bin/sh")
        .args(["-c", script])
        .timeout(Some(Duration::from_secs(60)))
        .run()
        .await;
    assert!(result.is_ok());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_memory_limit_applies_to_child() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("limit");
    let script = format!("ulimit -v > '{}'", out.display());

    IsolatedTask::new("t/limited", "/bin/sh")
        .args(["-c".to_string(), script])
        .memory_limit_mb(512)
        .run()
        .await
        .unwrap();

    // ulimit -v reports KiB
    let limit: u64 = fs::read_to_string(&out).unwrap().trim().parse().unwrap();
    assert!(limit <= 512 * 1024);
}

fn write_score(root: &Path, data_type: &str, project: &str, contents: &str) {
    let dir = root.join(data_type);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.txt", project)), contents).unwrap();
}

#[test]
fn test_collect_scores_to_json() {
    let output = TempDir::new().unwrap();
    write_score(output.path(), "small", "beta", "-0.25");
    write_score(output.path(), "small", "alpha", "0.5\n");
    write_score(output.path(), "large", "gamma", "0.4545454545454545");
    write_score(output.path(), "large", "broken", "not a number");
    write_score(output.path(), "large", "nan", "NaN");
    fs::write(output.path().join("large").join("args"), "ignored").unwrap();
    fs::create_dir_all(output.path().join("empty")).unwrap();

    let (path, table) = write_scores(output.path(), "txt").unwrap();

    assert_eq!(path, output.path().join(SCORES_FILE));
    assert_eq!(table.len(), 2);
    insta::assert_snapshot!(fs::read_to_string(path).unwrap(), @r#"
    {
      "large": {
        "gamma": 0.4545454545454545
      },
      "small": {
        "alpha": 0.5,
        "beta": -0.25
      }
    }
    "#);
}

#[test]
fn test_collect_scores_missing_output_dir() {
    let dir = TempDir::new().unwrap();
    assert!(collect_scores(&dir.path().join("missing"), "txt").is_err());
}
