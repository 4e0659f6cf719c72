//! Compare the standard codecs on one log file and print a Markdown report.
//!
//! Run with: cargo run --example compare_codecs -- path/to/file.log

use logbench::report::render_markdown;
use logbench::{aggregate, BackendDescriptor, BackendKind, BenchConfig, BenchRunner, Codec};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: compare_codecs <log file>...");
        std::process::exit(2);
    }

    let mut roster = Vec::new();
    for level in [1, 6, 9] {
        roster.push(BackendDescriptor::codec(format!("Gzip-{}", level), Codec::Gzip, level));
    }
    roster.push(BackendDescriptor::codec("Bzip2", Codec::Bzip2, 9));
    roster.push(BackendDescriptor::new(
        "LZMA",
        BackendKind::Codec {
            codec: Codec::Xz,
            level: 9,
            extreme: true,
        },
    ));

    let config = BenchConfig::default()
        .with_parallelism(0)
        .with_baselines(["Gzip-9", "LZMA"]);
    let runner = BenchRunner::with_roster(config, roster)?;

    let outcome = runner.run(&paths);
    for skipped in &outcome.skipped_inputs {
        eprintln!("skipped {}: {}", skipped.path.display(), skipped.reason);
    }

    let report = aggregate(&outcome.results, &runner.config().baselines);
    print!("{}", render_markdown(&report));
    Ok(())
}
