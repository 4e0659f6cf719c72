//! Fixed-width terminal table.

use std::fmt::Write;

use crate::model::Measurement;
use crate::ranking::{RankedFile, Report};
use crate::report::{
    check_label, format_factor, format_percent, format_rate, format_secs, group_thousands, DASH, FAILED,
    NO_WINNER,
};

/// One line for a measurement as it comes in, before ranking. The caller
/// supplies the compression ratio.
pub fn format_measurement(measurement: &Measurement, ratio: Option<f64>) -> String {
    match measurement.failure_reason() {
        Some(reason) => format!("{:<14} {}: {}", measurement.backend, FAILED, reason),
        None => {
            let mut line = format!(
                "{:<14} {} bytes ({})",
                measurement.backend,
                group_thousands(measurement.compressed_size),
                format_factor(ratio),
            );
            if let Some(secs) = measurement.elapsed_secs {
                let _ = write!(line, " in {:.3}s", secs);
            }
            if let Some(secs) = measurement.decompress_secs {
                let _ = write!(line, ", restored in {:.3}s", secs);
            }
            line
        }
    }
}

/// Render the whole report as aligned plain-text tables, one per file, with
/// rows in measurement order.
pub fn render_console(report: &Report) -> String {
    let mut out = String::new();
    for file in &report.files {
        render_file(&mut out, file, &report.baselines, report.round_trip);
        out.push('\n');
    }

    if !report.summary.wins.is_empty() {
        out.push_str("Wins:");
        for (backend, count) in &report.summary.wins {
            let _ = write!(out, " {} {}", backend, count);
        }
        out.push('\n');
    }
    if report.summary.files_without_winner > 0 {
        let _ = writeln!(
            out,
            "{} file(s) without a successful backend",
            report.summary.files_without_winner
        );
    }
    out
}

fn render_file(out: &mut String, file: &RankedFile, baselines: &[String], round_trip: bool) {
    let _ = writeln!(
        out,
        "{} ({} bytes)",
        file.file.name,
        group_thousands(file.file.original_size)
    );

    if file.entries.is_empty() {
        let _ = writeln!(out, "  no backend was measured");
        return;
    }

    let name_width = file
        .entries
        .iter()
        .map(|e| e.backend().chars().count())
        .max()
        .unwrap_or(0)
        .max("Backend".len());

    let _ = write!(
        out,
        "  {:<w$} {:>14} {:>9} {:>9}",
        "Backend",
        "Size",
        "Ratio",
        "Time (s)",
        w = name_width
    );
    for baseline in baselines {
        let _ = write!(out, " {:>10}", format!("vs {}", baseline));
    }
    for baseline in baselines {
        let _ = write!(out, " {:>14}", format!("speed vs {}", baseline));
    }
    let _ = write!(out, " {:>8}", "Savings");
    if round_trip {
        let _ = write!(
            out,
            " {:>10} {:>12} {:>12} {:>6}",
            "Decomp (s)", "Comp/s", "Decomp/s", "Check"
        );
    }
    out.push('\n');

    for entry in file.in_measurement_order() {
        let marker = if entry.is_winner { "*" } else { " " };
        let size = if entry.is_success() {
            group_thousands(entry.measurement.compressed_size)
        } else {
            FAILED.to_string()
        };
        let _ = write!(
            out,
            "{} {:<w$} {:>14} {:>9} {:>9}",
            marker,
            entry.backend(),
            size,
            format_factor(entry.ratio),
            format_secs(entry.measurement.elapsed_secs),
            w = name_width
        );
        for factor in &entry.factors {
            let _ = write!(out, " {:>10}", format_factor(factor.size_factor));
        }
        for factor in &entry.factors {
            let _ = write!(out, " {:>14}", format_factor(factor.speedup));
        }
        let _ = write!(out, " {:>8}", format_percent(entry.space_savings));
        if round_trip {
            let _ = write!(
                out,
                " {:>10} {:>12} {:>12} {:>6}",
                format_secs(entry.measurement.decompress_secs),
                format_rate(entry.compress_throughput),
                format_rate(entry.decompress_throughput),
                check_label(entry)
            );
        }
        if let Some(reason) = entry.measurement.failure_reason() {
            let _ = write!(out, "  {}", reason);
        }
        out.push('\n');
    }

    match file.winner_entry() {
        Some(winner) => {
            let _ = writeln!(
                out,
                "  Winner: {} ({})",
                winner.backend(),
                winner.ratio.map_or_else(|| DASH.to_string(), |r| format!("{:.2}x", r))
            );
        }
        None => {
            let _ = writeln!(out, "  {}", NO_WINNER);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::model::{Origin, Sample};
    use crate::report::fixtures::{sample_report, verified_report};
    use std::time::Duration;

    #[test]
    fn test_format_measurement_success() {
        let m = Measurement::from_outcome(
            "Gzip",
            Origin::Codec,
            Ok(Sample::timed(200_000, Duration::from_millis(100))),
        );
        let line = format_measurement(&m, Some(5.0));
        assert!(line.starts_with("Gzip"));
        assert!(line.contains("200,000 bytes (5.00x) in 0.100s"));
        assert!(!line.contains("restored"));
    }

    #[test]
    fn test_format_measurement_with_round_trip() {
        let mut m = Measurement::from_outcome(
            "Gzip",
            Origin::Codec,
            Ok(Sample::timed(200_000, Duration::from_millis(100))),
        );
        m.decompress_secs = Some(0.02);
        let line = format_measurement(&m, None);
        assert!(line.contains("200,000 bytes (-) in 0.100s, restored in 0.020s"));
    }

    #[test]
    fn test_format_measurement_failure() {
        let m = Measurement::failed("ULC-D", Origin::External, &BenchError::invocation("exit 1"));
        let line = format_measurement(&m, None);
        assert!(line.contains("FAILED: invocation failed: exit 1"));
    }

    #[test]
    fn test_console_rows_follow_measurement_order() {
        let text = render_console(&sample_report());
        let gzip = text.find("\n  Gzip").unwrap();
        let lzma = text.find("\n  LZMA").unwrap();
        let ulc = text.find("\n* ULC-<C>").unwrap();
        let failed = text.find("\n  ULC-D").unwrap();
        assert!(gzip < lzma && lzma < ulc && ulc < failed);
    }

    #[test]
    fn test_console_marks_winner_and_failures() {
        let text = render_console(&sample_report());
        assert!(text.contains("* ULC-<C>"));
        assert!(text.contains("Winner: ULC-<C> (10.00x)"));
        assert!(text.contains("FAILED"));
        assert!(text.contains(NO_WINNER));
        assert!(text.contains("vs Gzip"));
        assert!(text.contains("Wins: ULC-<C> 1"));
    }

    #[test]
    fn test_console_shows_speed_and_savings() {
        let text = render_console(&sample_report());
        assert!(text.contains("speed vs Gzip"));
        assert!(text.contains("Savings"));
        let row = text.lines().find(|l| l.starts_with("* ULC-<C>")).unwrap();
        assert!(row.contains("0.20x"), "{}", row);
        assert!(row.contains("1.60x"), "{}", row);
        assert!(row.contains("90.0%"), "{}", row);
        assert!(!text.contains("Decomp (s)"));
    }

    #[test]
    fn test_console_round_trip_columns() {
        let text = render_console(&verified_report());
        assert!(text.contains("Decomp (s)"));
        let row = text.lines().find(|l| l.starts_with("* ULC")).unwrap();
        assert!(row.contains("0.250"), "{}", row);
        assert!(row.contains("1.91 MB/s"), "{}", row);
        assert!(row.contains("3.81 MB/s"), "{}", row);
        assert!(row.contains("PASS"), "{}", row);
    }
}
