use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(path, content)
}

fn guide_project(root: &Path) -> std::io::Result<()> {
    write(
        root,
        "scientia.yml",
        "title: Test\nmodules: [guide]\npaths:\n  source: src\n  output: out\n",
    )?;
    write(
        root,
        "src/guide/config.yaml",
        "name: Guide\ndescription: The guide\n",
    )?;
    write(
        root,
        "src/guide/intro.md",
        "---\ntitle: Intro\n---\nSee link[overview].\n",
    )?;
    write(
        root,
        "src/guide/overview.md",
        "---\ntitle: Overview\n---\nOverview.\n",
    )
}

#[test]
fn build_writes_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    guide_project(dir.path())?;

    Command::cargo_bin("scientia")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 2 documents in 1 modules"));

    let overview = fs::read_to_string(dir.path().join("out/guide/overview.html"))?;
    assert!(overview.contains(r#"href="../guide/intro.html""#));
    assert!(dir.path().join("out/index.html").is_file());
    assert!(dir.path().join("out/static/scientia.css").is_file());
    Ok(())
}

#[test]
fn build_honours_output_flag() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    guide_project(dir.path())?;

    Command::cargo_bin("scientia")?
        .current_dir(dir.path())
        .args(["build", "--output", "public"])
        .assert()
        .success();

    assert!(dir.path().join("public/guide/intro.html").is_file());
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[test]
fn check_reports_fingerprint_as_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    guide_project(dir.path())?;

    let output = Command::cargo_bin("scientia")?
        .current_dir(dir.path())
        .args(["check", "--json"])
        .output()?;
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["documents"], 2);
    assert_eq!(report["links"], 1);
    assert_eq!(report["fingerprint"].as_str().map(str::len), Some(64));
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[test]
fn broken_link_fails_the_build() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    guide_project(dir.path())?;
    write(
        dir.path(),
        "src/guide/broken.md",
        "---\ntitle: Broken\n---\nSee link[nosuch].\n",
    )?;

    Command::cargo_bin("scientia")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nosuch"));

    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[test]
fn missing_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("scientia")?
        .current_dir(dir.path())
        .args(["--config", "nope.yml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
    Ok(())
}
