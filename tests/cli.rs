//! End-to-end runs of the `anorm` binary against scratch trees.

mod common;

use common::{run_raw, TestTree};

#[test]
fn missing_base_dir_exits_nonzero() {
    let tree = TestTree::new();
    let absent = tree.path("absent");
    let result = run_raw(&[
        "timestamp-folders",
        "--base-dir",
        absent.to_str().expect("utf-8 temp path"),
    ]);
    assert_eq!(result.code, Some(1));
    assert!(
        result.stderr.contains("does not exist"),
        "stderr: {}",
        result.stderr
    );
}

#[test]
fn empty_tree_needs_no_cleanup() {
    let tree = TestTree::new();
    tree.dir("task/q1");
    let result = tree.run("timestamp-folders", &[]);
    assert_eq!(result.code, Some(0));
    assert!(result.stdout.contains("No cleanup needed!"));
}

#[test]
fn timestamp_folders_are_flattened() {
    let tree = TestTree::new();
    tree.file("task/q1/hunyuan_20240101_120000/video.mp4", b"frames")
        .file("task/q2/hunyuan_20240102_090000/clip.mp4", b"clip");

    let result = tree.run("timestamp-folders", &[]);
    assert_eq!(result.code, Some(0), "stdout: {}", result.stdout);
    assert!(result.stdout.contains("[1/2] task/q1/hunyuan_20240101_120000"));
    assert!(result.stdout.contains("Succeeded: 2"));
    assert_eq!(tree.read("task/q1/video.mp4"), b"frames");
    assert_eq!(tree.read("task/q2/video.mp4"), b"clip");
    assert!(!tree.exists("task/q1/hunyuan_20240101_120000"));

    let again = tree.run("timestamp-folders", &[]);
    assert_eq!(again.code, Some(0));
    assert!(again.stdout.contains("No cleanup needed!"));
}

#[test]
fn dry_run_changes_nothing() {
    let tree = TestTree::new();
    tree.file("task/q1/hunyuan_1/out.mp4", b"a")
        .file("task/q2/video.mp4", b"stray")
        .dir("task/q2/run_001/video")
        .file("G-3_maze_generator/00001/prompt.txt", b"p");
    let before = tree.listing();

    for subcommand in ["timestamp-folders", "misplaced-artifacts", "flat-samples"] {
        let result = tree.run(subcommand, &["--dry-run"]);
        assert_eq!(result.code, Some(0), "{subcommand}: {}", result.stdout);
        assert!(result.stdout.contains("DRY RUN"), "{subcommand}");
        assert!(result.stdout.contains("would "), "{subcommand}");
    }
    assert_eq!(tree.listing(), before);
}

#[test]
fn payloadless_folder_fails_the_run() {
    let tree = TestTree::new();
    tree.file("task/q1/hunyuan_1/log.txt", b"log")
        .file("task/q2/hunyuan_2/clip.mp4", b"clip");

    let result = tree.run("timestamp-folders", &[]);
    assert_eq!(result.code, Some(1));
    assert!(result.stdout.contains("FAILED (no payload found)"));
    assert!(result.stdout.contains("Failed: 1"));
    assert!(tree.exists("task/q1/hunyuan_1/log.txt"));
    assert!(tree.exists("task/q2/video.mp4"));
}

#[test]
fn misplaced_artifact_lands_in_run_placeholder() {
    let tree = TestTree::new();
    tree.file("task/q1/video.mp4", b"stray")
        .dir("task/q1/run_001/video");

    let result = tree.run("misplaced-artifacts", &["--json"]);
    assert_eq!(result.code, Some(0), "stdout: {}", result.stdout);
    let report = result.json();
    assert_eq!(report["pattern"], "misplaced_artifact");
    assert_eq!(report["mode"], "apply");
    assert_eq!(report["counts"]["succeeded"], 1);
    assert_eq!(report["entries"][0]["item"], "task/q1/video.mp4");
    assert_eq!(tree.read("task/q1/run_001/video/video.mp4"), b"stray");
    assert!(!tree.exists("task/q1/video.mp4"));
}

#[test]
fn flat_samples_are_nested_under_label() {
    let tree = TestTree::new();
    tree.file("G-12_grid_obtaining_award_data-generator/00000/q.txt", b"0")
        .file("G-12_grid_obtaining_award_data-generator/00001/q.txt", b"1")
        .file("G-12_grid_obtaining_award_data-generator/00002/q.txt", b"2");

    let result = tree.run("flat-samples", &["--json"]);
    assert_eq!(result.code, Some(0), "stdout: {}", result.stdout);
    let report = result.json();
    assert_eq!(report["counts"]["total_processed"], 1);

    let nested = "G-12_grid_obtaining_award_data-generator/grid_obtaining_award";
    for index in 0..3 {
        let rel = format!("{nested}/grid_obtaining_award_000{index}/q.txt");
        assert_eq!(tree.read(&rel), index.to_string().as_bytes());
    }

    let again = tree.run("flat-samples", &["--json"]);
    assert_eq!(again.code, Some(0));
    let report = again.json();
    assert_eq!(report["counts"]["skipped"], 1);
    assert_eq!(report["entries"][0]["message"], "already restructured");
}

#[test]
fn config_overrides_job_label() {
    let tree = TestTree::new();
    tree.file("task/q1/wan_20240101/out.mp4", b"w")
        .file("layout.json", br#"{ "job_label": "wan" }"#);
    let config = tree.path("layout.json");

    let result = tree.run(
        "timestamp-folders",
        &["--config", config.to_str().expect("utf-8 temp path")],
    );
    assert_eq!(result.code, Some(0), "stdout: {}", result.stdout);
    assert_eq!(tree.read("task/q1/video.mp4"), b"w");
}

#[test]
fn invalid_config_is_rejected() {
    let tree = TestTree::new();
    tree.file("layout.json", br#"{ "job_lable": "wan" }"#);
    let config = tree.path("layout.json");

    let result = tree.run(
        "timestamp-folders",
        &["--config", config.to_str().expect("utf-8 temp path")],
    );
    assert_eq!(result.code, Some(1));
    assert!(!result.stderr.is_empty());
}
