//! Markdown report.

use std::fmt::Write;

use crate::ranking::{RankedEntry, RankedFile, Report};
use crate::report::{
    check_label, format_factor, format_percent, format_rate, format_secs, group_thousands, DASH, FAILED, NO_WINNER,
};

/// Render the report as a Markdown document: a title, the generation time,
/// then one section per file with its ranked table.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("# Extensive Log Compression Benchmark\n\n");
    let _ = writeln!(
        out,
        "**Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for file in &report.files {
        render_file(&mut out, file, &report.baselines, report.round_trip);
    }

    if !report.summary.wins.is_empty() {
        out.push_str("## Summary\n\n");
        out.push_str("| Algorithm | Files Won |\n");
        out.push_str("|-----------|-----------|\n");
        let mut wins: Vec<_> = report.summary.wins.iter().collect();
        wins.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (backend, count) in wins {
            let _ = writeln!(out, "| {} | {} |", cell(backend), count);
        }
        out.push('\n');
    }

    out
}

fn render_file(out: &mut String, file: &RankedFile, baselines: &[String], round_trip: bool) {
    let _ = writeln!(out, "## {}", cell(&file.file.name));
    let _ = writeln!(
        out,
        "**Original Size:** {} bytes\n",
        group_thousands(file.file.original_size)
    );

    if file.winner.is_none() {
        let _ = writeln!(out, "_{}_\n", NO_WINNER);
    }
    if file.entries.is_empty() {
        return;
    }

    out.push_str("| Algorithm | Compressed Size | Ratio | Time (s) |");
    for baseline in baselines {
        let _ = write!(out, " vs {} |", cell(baseline));
    }
    for baseline in baselines {
        let _ = write!(out, " Speed vs {} |", cell(baseline));
    }
    out.push_str(" Savings |");
    if round_trip {
        out.push_str(" Decomp (s) | Comp Speed | Decomp Speed | Round Trip |");
    }
    out.push('\n');
    out.push_str("|-----------|----------------|-------|----------|");
    for _ in 0..baselines.len() * 2 {
        out.push_str("---------|");
    }
    out.push_str("---------|");
    if round_trip {
        out.push_str("------------|------------|--------------|------------|");
    }
    out.push('\n');

    for entry in &file.entries {
        render_row(out, entry, round_trip);
    }
    out.push('\n');
}

fn render_row(out: &mut String, entry: &RankedEntry, round_trip: bool) {
    let name = cell(entry.backend());

    if !entry.is_success() {
        let _ = write!(out, "| {} | {} | {} | {} |", name, FAILED, DASH, DASH);
        let extra = entry.factors.len() * 2 + 1 + if round_trip { 4 } else { 0 };
        for _ in 0..extra {
            let _ = write!(out, " {} |", DASH);
        }
        out.push('\n');
        return;
    }

    let name = if entry.is_winner {
        format!("**{}**", name)
    } else {
        name
    };
    let ratio = entry
        .ratio
        .map_or_else(|| DASH.to_string(), |r| format!("**{:.2}x**", r));

    let _ = write!(
        out,
        "| {} | {} | {} | {} |",
        name,
        group_thousands(entry.measurement.compressed_size),
        ratio,
        format_secs(entry.measurement.elapsed_secs)
    );
    for factor in &entry.factors {
        let _ = write!(out, " {} |", format_factor(factor.size_factor));
    }
    for factor in &entry.factors {
        let _ = write!(out, " {} |", format_factor(factor.speedup));
    }
    let _ = write!(out, " {} |", format_percent(entry.space_savings));
    if round_trip {
        let _ = write!(
            out,
            " {} | {} | {} | {} |",
            format_secs(entry.measurement.decompress_secs),
            format_rate(entry.compress_throughput),
            format_rate(entry.decompress_throughput),
            check_label(entry)
        );
    }
    out.push('\n');
}

/// Table cell text with pipes escaped.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}
