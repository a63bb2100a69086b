//! Integration tests for the qscore binary
//!
//! These run the built executable in each of its modes against on-disk
//! fixture projects.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const ALPHA: &str = r#"
package a;

import b.Beta;

public class Alpha {
    private int count;

    public void run() {
        helper();
        this.helper();
        this.count = 1;
        Beta.make();
        System.out.println("done");
    }

    void helper() {}
}
"#;

const BETA: &str = r#"
package b;

public class Beta {
    public static Beta make() {
        return new Beta();
    }

    void touch() {
        make();
    }
}
"#;

const GAMMA: &str = r#"
package b;

public class Gamma extends Beta {
}
"#;

fn write_project(root: &Path) {
    let files = [
        ("a/Alpha.java", ALPHA),
        ("a/AlphaTest.java", "package a; class AlphaTest { void t() { new Alpha().run(); } }"),
        ("b/Beta.java", BETA),
        ("b/Gamma.java", GAMMA),
        ("c/Broken.java", "package c; class Broken { void f( {"),
    ];
    for (relative, contents) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
}

fn qscore(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qscore"))
        .args(args)
        .output()
        .expect("failed to run qscore")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn five_elevenths() -> String {
    (5.0f64 / 11.0).to_string()
}

#[test]
fn test_help_lists_modes() {
    let output = qscore(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    let flags = [
        "--project",
        "--dataset",
        "--collect",
        "--output_dir",
        "--log_dir",
        "--num_workers",
    ];
    for flag in flags {
        assert!(stdout.contains(flag), "help is missing {}", flag);
    }
}

#[test]
fn test_modes_are_mutually_exclusive() {
    let dir = TempDir::new().unwrap();
    let output = qscore(&[
        "--project",
        "x",
        "--dataset",
        "y",
        "--output_dir",
        path_str(dir.path()),
    ]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be used with"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_a_mode_is_required() {
    let output = qscore(&["--num_workers", "2"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_project_mode_writes_score() {
    let workspace = TempDir::new().unwrap();
    let project = workspace.path().join("demo");
    write_project(&project);
    let out = workspace.path().join("out");

    let output = qscore(&["--project", path_str(&project), "--output_dir", path_str(&out)]);

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(out.join("demo.txt")).unwrap(), five_elevenths());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Q = "));
}

#[test]
fn test_project_mode_degenerate_exits_normally() {
    let workspace = TempDir::new().unwrap();
    let project = workspace.path().join("empty");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("README.md"), "no sources").unwrap();
    let out = workspace.path().join("out");

    let output = qscore(&["--project", path_str(&project), "--output_dir", path_str(&out)]);

    assert!(output.status.success());
    assert!(!out.join("empty.txt").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty"));
    assert!(stderr.contains("no reference edges"));
}

#[test]
fn test_project_mode_with_config_file() {
    let workspace = TempDir::new().unwrap();
    let project = workspace.path().join("demo");
    write_project(&project);
    let out = workspace.path().join("out");
    let config = workspace.path().join("qscore.toml");
    fs::write(
        &config,
        "exclude_substring = \"Gamma\"\nscore_extension = \"q\"\n",
    )
    .unwrap();

    let output = qscore(&[
        "--project",
        path_str(&project),
        "--output_dir",
        path_str(&out),
        "--config",
        path_str(&config),
    ]);

    // Gamma is skipped and AlphaTest is now analyzed:
    // n = 6, internal = 5, a_a = 5, a_b = 2, so Q = (30 - 29) / (36 - 29).
    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(out.join("demo.q")).unwrap(),
        (1.0f64 / 7.0).to_string()
    );
}

#[test]
fn test_bad_config_is_logged() {
    let workspace = TempDir::new().unwrap();
    let project = workspace.path().join("demo");
    write_project(&project);
    let config = workspace.path().join("bad.toml");
    fs::write(&config, "source_package = \"nowhere\"").unwrap();
    let out = workspace.path().join("out");

    let output = qscore(&[
        "--project",
        path_str(&project),
        "--output_dir",
        path_str(&out),
        "--config",
        path_str(&config),
    ]);

    assert!(output.status.success());
    assert!(!out.exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad.toml"));
}

#[test]
fn test_dataset_mode_then_collect() {
    let workspace = TempDir::new().unwrap();
    let dataset = workspace.path().join("dataset");
    write_project(&dataset.join("good").join("demo"));
    write_project(&dataset.join("other").join("tiny"));
    let empty = dataset.join("good").join("empty");
    fs::create_dir_all(&empty).unwrap();
    fs::write(empty.join("README.md"), "no sources").unwrap();
    let out = workspace.path().join("out");
    let logs = workspace.path().join("logs");

    let output = qscore(&[
        "--dataset",
        path_str(&dataset),
        "--output_dir",
        path_str(&out),
        "--log_dir",
        path_str(&logs),
        "--num_workers",
        "2",
    ]);

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(out.join("good").join("demo.txt")).unwrap(),
        five_elevenths()
    );
    assert_eq!(
        fs::read_to_string(out.join("other").join("tiny.txt")).unwrap(),
        five_elevenths()
    );
    assert!(!out.join("good").join("empty.txt").exists());

    let log = fs::read_to_string(logs.join("preprocess.log")).unwrap();
    assert_eq!(log.matches("complete preprocessing all projects").count(), 1);
    assert!(log.contains("2 scored, 1 failed"));
    // Child stderr is forwarded at error level under the project's identity.
    assert!(log.lines().any(|l| {
        l.contains("ERROR") && l.contains("good/empty") && l.contains("no reference edges")
    }));
    assert!(log
        .lines()
        .any(|l| l.contains("INFO") && l.contains("good/demo") && l.contains("Q = ")));

    let output = qscore(&["--collect", "--output_dir", path_str(&out)]);
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("q_values.json")).unwrap()).unwrap();
    let q = 5.0f64 / 11.0;
    assert_eq!(json["good"]["demo"].as_f64(), Some(q));
    assert_eq!(json["other"]["tiny"].as_f64(), Some(q));
    assert!(json["good"].get("empty").is_none());
}

#[test]
fn test_dataset_mode_missing_dataset_still_completes() {
    let workspace = TempDir::new().unwrap();
    let logs = workspace.path().join("logs");

    let output = qscore(&[
        "--dataset",
        path_str(&workspace.path().join("missing")),
        "--output_dir",
        path_str(&workspace.path().join("out")),
        "--log_dir",
        path_str(&logs),
    ]);

    assert!(output.status.success());
    let log = fs::read_to_string(logs.join("preprocess.log")).unwrap();
    assert!(log.contains("complete preprocessing all projects"));
}

#[test]
fn test_dataset_mode_crashing_children_still_complete() {
    let workspace = TempDir::new().unwrap();
    let dataset = workspace.path().join("dataset");
    write_project(&dataset.join("good").join("demo"));
    write_project(&dataset.join("good").join("other"));
    let out = workspace.path().join("out");
    let logs = workspace.path().join("logs");
    // One MiB of address space is too little for any child to start.
    let config = workspace.path().join("starved.toml");
    fs::write(&config, "[isolation]\nmemory_limit_mb = 1\n").unwrap();

    let output = qscore(&[
        "--dataset",
        path_str(&dataset),
        "--output_dir",
        path_str(&out),
        "--log_dir",
        path_str(&logs),
        "--num_workers",
        "2",
        "--config",
        path_str(&config),
    ]);

    assert!(output.status.success());
    assert!(!out.join("good").join("demo.txt").exists());
    assert!(!out.join("good").join("other.txt").exists());

    let log = fs::read_to_string(logs.join("preprocess.log")).unwrap();
    assert_eq!(log.matches("complete preprocessing all projects").count(), 1);
    assert!(log.contains("0 scored, 2 failed"));
    for id in ["good/demo", "good/other"] {
        assert!(log.lines().any(|l| l.contains("Not scored") && l.contains(id)));
    }
}
