//! Report renderers.
//!
//! Every renderer is a pure function of [`Report`]. Ordering, ratios and
//! relative factors are all decided during aggregation; the code here only
//! formats them.

mod console;
mod csv;
mod html;
mod json;
mod markdown;

use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::ranking::{RankedEntry, Report};

pub use self::console::{format_measurement, render_console};
pub use self::csv::render_csv;
pub use self::html::render_html;
pub use self::json::render_json;
pub use self::markdown::render_markdown;

/// Placeholder for metrics that are undefined.
pub const DASH: &str = "-";

/// Label shown in place of the size of a failed measurement.
pub const FAILED: &str = "FAILED";

/// Notice for a file where every backend failed.
pub const NO_WINNER: &str = "No successful backend for this file.";

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Fixed-width terminal table
    Console,
    /// Markdown document
    Markdown,
    /// Self-contained HTML page
    Html,
    /// Full report model as JSON
    Json,
    /// One row per (file, backend)
    Csv,
}

impl OutputFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Console => "txt",
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Ok(OutputFormat::Console),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Console => "console",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        })
    }
}

/// Render `report` in the given format.
pub fn render(format: OutputFormat, report: &Report) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(render_console(report)),
        OutputFormat::Markdown => Ok(render_markdown(report)),
        OutputFormat::Html => Ok(render_html(report)),
        OutputFormat::Json => render_json(report),
        OutputFormat::Csv => render_csv(report),
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Human-readable byte count using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Seconds with millisecond precision, or a dash.
pub fn format_secs(secs: Option<f64>) -> String {
    secs.map_or_else(|| DASH.to_string(), |s| format!("{:.3}", s))
}

/// A multiplicative factor such as `10.00x`, or a dash.
pub fn format_factor(factor: Option<f64>) -> String {
    factor.map_or_else(|| DASH.to_string(), |f| format!("{:.2}x", f))
}

/// A percentage with one decimal, or a dash.
pub fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| DASH.to_string(), |v| format!("{:.1}%", v))
}

/// A byte rate such as `1.91 MB/s`, or a dash.
pub fn format_rate(bytes_per_sec: Option<f64>) -> String {
    bytes_per_sec.map_or_else(|| DASH.to_string(), |r| format!("{}/s", format_bytes(r.round() as u64)))
}

/// `PASS` for a verified round trip, a dash otherwise.
pub(crate) fn check_label(entry: &RankedEntry) -> &'static str {
    if entry.round_trip_verified() {
        "PASS"
    } else {
        DASH
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
