//! Self-contained HTML report.
//!
//! One card per file with the ranked table and a bar per successful backend,
//! scaled against the largest successful size in that file. Clicking the
//! size header re-sorts the rows using their `data-size` attributes; failed
//! rows stay at the bottom either way.

use std::fmt::Write;

use crate::model::Origin;
use crate::ranking::{RankedEntry, RankedFile, Report};
use crate::report::{
    check_label, escape_html, format_factor, format_percent, format_rate, format_secs, group_thousands, DASH, FAILED,
    NO_WINNER,
};

const STYLE: &str = r#"body { font-family: 'Segoe UI', sans-serif; padding: 40px; background: #f5f5f5; }
.container { max-width: 1200px; margin: 0 auto; }
.card { background: white; padding: 30px; margin-bottom: 30px; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); }
h1 { text-align: center; color: #333; }
h2 { color: #555; border-bottom: 2px solid #eee; padding-bottom: 10px; }
.generated { text-align: center; color: #888; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { padding: 12px; text-align: left; border-bottom: 1px solid #eee; }
th { background: #f8f9fa; font-weight: 600; }
th.sortable { cursor: pointer; }
.winner { color: #27ae60; font-weight: bold; }
.failed { color: #c0392b; }
.notice { color: #c0392b; font-style: italic; }
.tag { color: #888; font-size: 0.85em; }
.bar-container { width: 100%; background: #e9ecef; border-radius: 4px; height: 8px; margin-top: 5px; }
.bar { height: 100%; border-radius: 4px; }
.candidate { background: linear-gradient(90deg, #3498db, #2980b9); }
.standard { background: linear-gradient(90deg, #95a5a6, #7f8c8d); }
"#;

const SCRIPT: &str = r#"document.querySelectorAll('th.sortable').forEach(function (th) {
  th.addEventListener('click', function () {
    var tbody = th.closest('table').querySelector('tbody');
    var rows = Array.prototype.slice.call(tbody.querySelectorAll('tr'));
    var asc = th.dataset.order !== 'asc';
    th.dataset.order = asc ? 'asc' : 'desc';
    rows.sort(function (a, b) {
      var x = a.dataset.size, y = b.dataset.size;
      if (!x || !y) { return (x ? 0 : 1) - (y ? 0 : 1); }
      return asc ? Number(x) - Number(y) : Number(y) - Number(x);
    });
    rows.forEach(function (row) { tbody.appendChild(row); });
  });
});
"#;

/// Render the report as a single HTML page with embedded style and script.
pub fn render_html(report: &Report) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Log Compression Benchmark</title>\n<style>\n");
    out.push_str(STYLE);
    out.push_str("</style></head><body><div class=\"container\"><h1>Log Compression Benchmark</h1>\n");
    let _ = writeln!(
        out,
        "<p class=\"generated\">Generated {}</p>",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for file in &report.files {
        render_card(&mut out, file, &report.baselines, report.round_trip);
    }

    out.push_str("</div>\n<script>\n");
    out.push_str(SCRIPT);
    out.push_str("</script>\n</body></html>\n");
    out
}

fn render_card(out: &mut String, file: &RankedFile, baselines: &[String], round_trip: bool) {
    let _ = write!(
        out,
        "<div class=\"card\"><h2>{}</h2><p>Original Size: <strong>{} bytes</strong></p>",
        escape_html(&file.file.name),
        group_thousands(file.file.original_size)
    );

    if file.winner.is_none() {
        let _ = write!(out, "<p class=\"notice\">{}</p>", NO_WINNER);
    }

    if !file.entries.is_empty() {
        out.push_str("<table><thead><tr><th>Algorithm</th><th class=\"sortable\">Size</th><th>Ratio</th><th>Time</th>");
        for baseline in baselines {
            let _ = write!(out, "<th>vs {}</th>", escape_html(baseline));
        }
        for baseline in baselines {
            let _ = write!(out, "<th>Speed vs {}</th>", escape_html(baseline));
        }
        out.push_str("<th>Savings</th>");
        if round_trip {
            out.push_str("<th>Decomp</th><th>Comp Speed</th><th>Decomp Speed</th><th>Round Trip</th>");
        }
        out.push_str("<th>Visual</th></tr></thead><tbody>");
        for entry in &file.entries {
            render_row(out, entry, round_trip);
        }
        out.push_str("</tbody></table>");
    }

    out.push_str("</div>\n");
}

fn render_row(out: &mut String, entry: &RankedEntry, round_trip: bool) {
    let name = escape_html(entry.backend());
    let tag = match entry.measurement.origin {
        Origin::Recorded => " <span class=\"tag\">(recorded)</span>",
        _ => "",
    };

    if !entry.is_success() {
        let reason = escape_html(entry.measurement.failure_reason().unwrap_or_default());
        let _ = write!(
            out,
            "<tr data-size=\"\"><td>{}{}</td><td class=\"failed\" title=\"{}\">{}</td><td>{}</td><td>{}</td>",
            name, tag, reason, FAILED, DASH, DASH
        );
        let extra = entry.factors.len() * 2 + 1 + if round_trip { 4 } else { 0 };
        for _ in 0..extra {
            let _ = write!(out, "<td>{}</td>", DASH);
        }
        out.push_str("<td></td></tr>");
        return;
    }

    let size = entry.measurement.compressed_size;
    let class = if entry.is_winner { "winner" } else { "" };
    let bar = match entry.measurement.origin {
        Origin::Codec => "standard",
        Origin::External | Origin::Recorded => "candidate",
    };
    let width = entry.relative_size.unwrap_or(0.0) * 100.0;
    let time = match entry.measurement.elapsed_secs {
        Some(_) => format!("{}s", format_secs(entry.measurement.elapsed_secs)),
        None => DASH.to_string(),
    };

    let _ = write!(
        out,
        "<tr data-size=\"{}\"><td class=\"{}\">{}{}</td><td>{} B</td><td>{}</td><td>{}</td>",
        size,
        class,
        name,
        tag,
        group_thousands(size),
        format_factor(entry.ratio),
        time
    );
    for factor in &entry.factors {
        let _ = write!(out, "<td>{}</td>", format_factor(factor.size_factor));
    }
    for factor in &entry.factors {
        let _ = write!(out, "<td>{}</td>", format_factor(factor.speedup));
    }
    let _ = write!(out, "<td>{}</td>", format_percent(entry.space_savings));
    if round_trip {
        let decompress = match entry.measurement.decompress_secs {
            Some(_) => format!("{}s", format_secs(entry.measurement.decompress_secs)),
            None => DASH.to_string(),
        };
        let _ = write!(
            out,
            "<td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            decompress,
            format_rate(entry.compress_throughput),
            format_rate(entry.decompress_throughput),
            check_label(entry)
        );
    }
    let _ = write!(
        out,
        "<td><div class=\"bar-container\"><div class=\"bar {}\" style=\"width:{:.1}%\"></div></div></td></tr>",
        bar, width
    );
}
