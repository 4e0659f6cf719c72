//! End-to-end runs over in-process codecs and recorded baselines.

use std::fs;
use std::path::{Path, PathBuf};

use logbench::report::{render_html, render_markdown};
use logbench::{
    aggregate, render, BackendDescriptor, BackendKind, BaselineTable, BenchConfig, BenchRunner, Codec,
    ConfigFile, OutputFormat, Origin,
};

fn write_log(dir: &Path, name: &str, lines: usize) -> PathBuf {
    let path = dir.join(name);
    let levels = ["INFO", "WARN", "ERROR", "DEBUG"];
    let body: String = (0..lines)
        .map(|i| {
            format!(
                "2024-03-{:02} 10:{:02}:{:02} [{}] worker-{} processed job {} in {}ms\n",
                i % 28 + 1,
                i % 60,
                (i * 7) % 60,
                levels[i % levels.len()],
                i % 8,
                i,
                (i * 13) % 500
            )
        })
        .collect();
    fs::write(&path, body).unwrap();
    path
}

fn codec_roster() -> Vec<BackendDescriptor> {
    vec![
        BackendDescriptor::codec("Gzip", Codec::Gzip, 9),
        BackendDescriptor::codec("Bzip2", Codec::Bzip2, 9),
        BackendDescriptor::new(
            "LZMA",
            BackendKind::Codec {
                codec: Codec::Xz,
                level: 9,
                extreme: true,
            },
        ),
    ]
}

#[test]
fn test_codecs_compress_logs() {
    let dir = tempfile::tempdir().unwrap();
    let web = write_log(dir.path(), "web.log", 2000);

    let runner = BenchRunner::with_roster(BenchConfig::new(), codec_roster()).unwrap();
    let outcome = runner.run(&[&web]);

    let set = &outcome.results[0];
    assert_eq!(set.len(), 3);
    for m in &set.measurements {
        assert!(m.is_success(), "{}: {:?}", m.backend, m.failure);
        assert!(m.compressed_size > 0);
        assert!(m.compressed_size < set.original_size());
        assert_eq!(m.origin, Origin::Codec);
        assert!(m.elapsed_secs.is_some());
    }
}

#[test]
fn test_repeated_runs_give_identical_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), "app.log", 800);

    let runner = BenchRunner::with_roster(BenchConfig::new(), codec_roster()).unwrap();
    let first = runner.run(&[&log]);
    let second = runner.run(&[&log]);

    let sizes = |outcome: &logbench::RunOutcome| -> Vec<u64> {
        outcome.results[0]
            .measurements
            .iter()
            .map(|m| m.compressed_size)
            .collect()
    };
    assert_eq!(sizes(&first), sizes(&second));
}

#[test]
fn test_verified_codecs_record_decompress_time() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), "sys.log", 500);

    let config = BenchConfig::new().with_verify_round_trip(true);
    let outcome = BenchRunner::with_roster(config, codec_roster()).unwrap().run(&[&log]);

    for m in &outcome.results[0].measurements {
        assert!(m.is_success());
        assert!(m.decompress_secs.is_some());
    }
}

#[test]
fn test_missing_candidate_falls_back_to_recorded_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let web = write_log(dir.path(), "test_log_web.txt", 1000);
    let app = write_log(dir.path(), "test_log_app.txt", 1000);

    let recorded = BaselineTable::from_json_str(
        r#"{"ULC-Hyper": {"test_log_web.txt": 6504, "test_log_sys.txt": 9104}}"#,
    )
    .unwrap();
    let mut roster = codec_roster();
    roster.push(BackendDescriptor::external("ULC-Hyper", "bin/ulc-hyper", "ulch"));

    let config = BenchConfig::new()
        .with_tools_dir(dir.path().join("tools"))
        .with_recorded(recorded);
    let outcome = BenchRunner::with_roster(config, roster).unwrap().run(&[&web, &app]);

    let hyper = outcome.results[0].get("ULC-Hyper").unwrap();
    assert_eq!(hyper.compressed_size, 6504);
    assert_eq!(hyper.origin, Origin::Recorded);
    assert_eq!(hyper.elapsed_secs, None);

    assert!(outcome.results[1].get("ULC-Hyper").is_none());
    assert!(outcome.skipped_backends.is_empty());
}

#[test]
fn test_reports_from_a_real_run() {
    let dir = tempfile::tempdir().unwrap();
    let web = write_log(dir.path(), "web.log", 1500);
    let missing = dir.path().join("gone.log");

    let mut roster = codec_roster();
    roster.push(BackendDescriptor::external("ULC-C", "ulc-c/ulc", "ulc"));
    let config = BenchConfig::new().with_tools_dir(dir.path());
    let runner = BenchRunner::with_roster(config, roster).unwrap();
    let outcome = runner.run(&[web, missing]);

    assert_eq!(outcome.skipped_inputs.len(), 1);
    assert_eq!(outcome.skipped_backends.len(), 1);

    let report = aggregate(&outcome.results, &runner.config().baselines);
    assert_eq!(report.files.len(), 1);

    let ranked = &report.files[0];
    assert!(ranked.winner.is_some());
    for pair in ranked.entries.windows(2) {
        assert!(pair[0].measurement.compressed_size <= pair[1].measurement.compressed_size);
    }

    let markdown = render_markdown(&report);
    assert!(markdown.contains("## web.log"));
    assert!(markdown.contains("| Algorithm | Compressed Size | Ratio | Time (s) | vs Gzip | vs LZMA |"));
    assert!(!markdown.contains("ULC-C"));

    let html = render_html(&report);
    assert!(html.contains("class=\"winner\""));
    assert!(!html.contains("ULC-C"));

    let json = render(OutputFormat::Json, &report).unwrap();
    assert!(json.contains("\"baselines\""));
}

#[test]
fn test_config_file_roster() {
    let config_file = ConfigFile::from_json_str(
        r#"{
            "timeout_secs": 5,
            "parallelism": 2,
            "baselines": ["Fast"],
            "backends": [
                {"kind": "codec", "name": "Fast", "codec": "gzip", "level": 1},
                {"kind": "codec", "name": "Best", "codec": "xz", "level": 9, "extreme": true}
            ]
        }"#,
    )
    .unwrap();
    let (config, roster) = config_file.apply(BenchConfig::new()).unwrap();
    let runner = BenchRunner::with_roster(config, roster.unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), "web.log", 1000);
    let outcome = runner.run(&[log]);
    let report = aggregate(&outcome.results, &runner.config().baselines);

    let best = report.files[0]
        .entries
        .iter()
        .find(|e| e.backend() == "Best")
        .unwrap();
    let factor = best.factor("Fast").unwrap();
    assert!(factor.size_factor.unwrap() > 0.0);
}
