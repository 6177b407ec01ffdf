//! End-to-end tests for the asset pipeline
//!
//! Builds a small site fixture in a temp directory and runs the task
//! orchestrator against it.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use sitekit::config::SiteConfig;
use sitekit::tasks::{self, LeafTask, TaskContext};
use sitekit::watch::{triggered_tasks, watch_rules};

/// Create a site fixture with one asset of every class.
fn site_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");

    fs::create_dir_all(src.join("scss")).unwrap();
    fs::create_dir_all(src.join("js")).unwrap();
    fs::create_dir_all(src.join("img")).unwrap();

    fs::write(
        src.join("scss/style.scss"),
        "$bg: #fafafa;\nbody { background: $bg; nav { display: flex; } }\n",
    )
    .unwrap();
    fs::write(
        src.join("js/app.js"),
        "const answer = 40 + 2;\nconsole.log(`answer: ${answer}`);\n",
    )
    .unwrap();
    fs::write(
        src.join("index.html"),
        "<!DOCTYPE html><html><head><title>Home</title></head>\
         <body><p>Hello</p><script>if (a < b) { go(); }</script></body></html>",
    )
    .unwrap();

    // Tiny valid PNG via the image crate
    let png = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
    png.save(src.join("img/pixel.png")).unwrap();

    temp
}

fn context(temp: &TempDir) -> TaskContext {
    TaskContext::new(SiteConfig::default(), temp.path().to_path_buf())
}

fn dist_entries(dist: &Path) -> BTreeSet<String> {
    fs::read_dir(dist)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn clean_then_compile_produces_expected_tree() {
    let temp = site_fixture();
    let ctx = context(&temp);

    // Stale output that clean must remove
    fs::create_dir_all(temp.path().join("dist/old")).unwrap();
    fs::write(temp.path().join("dist/old/leftover.css"), "a{}").unwrap();

    tasks::clean(&ctx).unwrap();
    let reports = tasks::run_compile(&ctx).unwrap();
    assert!(reports.iter().all(|r| r.is_success()));

    let entries = dist_entries(&temp.path().join("dist"));
    let expected: BTreeSet<String> =
        ["css", "js", "img", "index.html"].iter().map(|s| s.to_string()).collect();
    assert_eq!(entries, expected);
}

#[test]
fn styles_emit_expanded_and_minified_with_matching_selectors() {
    let temp = site_fixture();
    let ctx = context(&temp);

    tasks::run_leaf(&ctx, LeafTask::Styles);

    let expanded = fs::read_to_string(temp.path().join("dist/css/style.css")).unwrap();
    let minified = fs::read_to_string(temp.path().join("dist/css/style.min.css")).unwrap();

    for selector in ["body", "body nav"] {
        assert!(expanded.contains(selector), "expanded missing {}", selector);
        assert!(minified.contains(selector), "minified missing {}", selector);
    }
    assert!(minified.len() <= expanded.len());
}

#[test]
fn malformed_stylesheet_fails_without_stopping_dispatch() {
    let temp = site_fixture();
    let ctx = context(&temp);

    fs::write(temp.path().join("src/scss/broken.scss"), "body { color: ").unwrap();

    // The styles pipeline reports failure instead of panicking
    let report = tasks::run_leaf(&ctx, LeafTask::Styles);
    assert!(!report.is_success());

    // A subsequent dispatch for another asset class still works
    let report = tasks::run_leaf(&ctx, LeafTask::Scripts);
    assert!(report.is_success());
    assert!(temp.path().join("dist/js/app.min.js").exists());
}

#[test]
fn compile_reports_failures_per_pipeline() {
    let temp = site_fixture();
    let ctx = context(&temp);

    fs::write(temp.path().join("src/js/broken.js"), "function ( {").unwrap();

    let reports = tasks::run_compile(&ctx).unwrap();
    assert_eq!(reports.len(), 4);

    let scripts = reports.iter().find(|r| r.task == LeafTask::Scripts).unwrap();
    assert!(!scripts.is_success());

    // Sibling pipelines are unaffected
    let styles = reports.iter().find(|r| r.task == LeafTask::Styles).unwrap();
    assert!(styles.is_success());
    assert!(temp.path().join("dist/css/style.min.css").exists());
}

#[test]
fn initial_compile_runs_on_a_background_thread() {
    let temp = site_fixture();
    let ctx = context(&temp);

    // Watch mode hands the initial compile to its own thread; the context
    // must carry across and the run must complete there.
    let handle = std::thread::spawn(move || tasks::run_compile(&ctx));
    let reports = handle.join().unwrap().unwrap();

    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| r.is_success()));
    assert!(temp.path().join("dist/css/style.min.css").exists());
}

#[test]
fn watched_globs_map_changes_to_their_tasks() {
    let temp = site_fixture();
    let src = temp.path().join("src");
    let rules = watch_rules(&SiteConfig::default());

    let cases = [
        ("img/pixel.png", LeafTask::Images),
        ("index.html", LeafTask::Markup),
        ("scss/style.scss", LeafTask::Styles),
        ("js/app.js", LeafTask::Scripts),
    ];

    for (rel, expected) in cases {
        let changed = vec![src.join(rel)];
        let triggered = triggered_tasks(&rules, &src, &changed);
        assert_eq!(triggered, vec![expected], "for {}", rel);
    }
}

#[test]
fn markup_output_preserves_text_and_structure() {
    let temp = site_fixture();
    let ctx = context(&temp);

    tasks::run_leaf(&ctx, LeafTask::Markup);

    let html = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>"));
    assert!(html.contains("Hello"));
    assert!(html.contains("</html>"));
    // Re-indented with tabs
    assert!(html.contains("\t<head>"));
    // The script body comes through untouched
    assert!(html.contains("if (a < b) { go(); }"));
}

#[test]
fn images_roundtrip_through_reencode() {
    let temp = site_fixture();
    let ctx = context(&temp);

    tasks::run_leaf(&ctx, LeafTask::Images);

    let out = temp.path().join("dist/img/pixel.png");
    let img = image::open(&out).unwrap();
    assert_eq!((img.width(), img.height()), (4, 4));
}
