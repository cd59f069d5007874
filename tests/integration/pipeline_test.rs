//! Integration tests for the full build pipeline
//!
//! These tests verify that the core and render crates work together
//! correctly: collection, checking and writing a site to disk.

use scientia_core::{BuildError, Config, QualifiedId, SiteBuilder, StoreError, Violation};
use scientia_render::render_site;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn guide(root: &Path) {
    write(root, "guide/config.yaml", "name: Guide\ndescription: A guide\n");
    write(
        root,
        "guide/intro.md",
        "---\ntitle: Intro\n---\nSee link[overview] and knowl[overview|Details].\n",
    );
    write(
        root,
        "guide/overview.md",
        "---\ntitle: Overview\n---\nAn overview with $a < b$ math.\n",
    );
}

fn config(root: &Path) -> Config {
    Config::from_yaml_str("title: Docs\nmodules: [guide]\n")
        .unwrap()
        .with_source_dir(root)
}

fn q(s: &str) -> QualifiedId {
    QualifiedId::parse(s).unwrap()
}

#[test]
fn test_guide_builds_and_renders() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    guide(&src);

    let site = SiteBuilder::new(config(&src)).build().unwrap();
    assert_eq!(site.store().document_count(), 2);
    assert_eq!(
        site.registry()
            .backlinks_of(&q("guide/overview"))
            .collect::<Vec<_>>(),
        [&q("guide/intro")]
    );
    assert_eq!(site.registry().knowls_of(&q("guide/overview")).count(), 1);

    let out = tmp.path().join("out");
    let stats = render_site(&site, &out).unwrap();
    assert_eq!(stats.documents, 2);

    let intro = fs::read_to_string(out.join("guide/intro.html")).unwrap();
    assert!(intro.contains(r#"<a href="../guide/overview.html">overview</a>"#));
    assert!(intro.contains(r#"knowl="guide/overview""#));

    let overview = fs::read_to_string(out.join("guide/overview.html")).unwrap();
    assert!(overview.contains("$a &lt; b$"));
    assert!(overview.contains("Backlinks"));
}

#[test]
fn test_fingerprint_is_reproducible() {
    let tmp = TempDir::new().unwrap();
    guide(tmp.path());

    let first = SiteBuilder::new(config(tmp.path())).build().unwrap();
    let second = SiteBuilder::new(config(tmp.path())).build().unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());

    write(tmp.path(), "guide/overview.md", "---\ntitle: Overview\n---\nChanged.\n");
    let third = SiteBuilder::new(config(tmp.path())).build().unwrap();
    assert_ne!(first.fingerprint(), third.fingerprint());
}

#[test]
fn test_unknown_link_target_fails() {
    let tmp = TempDir::new().unwrap();
    guide(tmp.path());
    write(
        tmp.path(),
        "guide/broken.md",
        "---\ntitle: Broken\n---\nSee link[nosuch].\n",
    );

    match SiteBuilder::new(config(tmp.path())).build() {
        Err(BuildError::Inconsistent(report)) => {
            assert!(report.violations().iter().any(|v| matches!(
                v,
                Violation::UnknownDocument { target, .. } if target == &q("guide/nosuch")
            )));
        }
        other => panic!("expected a consistency failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_setup_index_duplicate() {
    let tmp = TempDir::new().unwrap();
    guide(tmp.path());
    write(tmp.path(), "guide/setup.index.md", "---\ntitle: Setup\n---\n");
    write(tmp.path(), "guide/setup/index.md", "---\ntitle: Setup again\n---\n");

    match SiteBuilder::new(config(tmp.path())).build() {
        Err(BuildError::Store(StoreError::DuplicateDocument(duplicate))) => {
            assert_eq!(duplicate.id, q("guide/setup.index"));
            assert!(duplicate.path.is_some());
        }
        other => panic!("expected a duplicate error, got {:?}", other.map(|_| ())),
    }
}
