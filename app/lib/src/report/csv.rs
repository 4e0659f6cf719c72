//! CSV export, one row per (file, backend) in ranked order.

use std::io;

use crate::error::{BenchError, Result};
use crate::ranking::Report;

/// Render the report as CSV with a header row.
///
/// Undefined metrics are left empty. One `vs_<baseline>` and one
/// `speed_vs_<baseline>` column are added per configured baseline.
pub fn render_csv(report: &Report) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = [
        "file",
        "original_size",
        "rank",
        "backend",
        "origin",
        "success",
        "compressed_size",
        "ratio",
        "elapsed_secs",
        "decompress_secs",
        "winner",
        "failure",
        "space_savings_pct",
        "compress_bytes_per_sec",
        "decompress_bytes_per_sec",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(report.baselines.iter().map(|b| format!("vs_{}", b)));
    header.extend(report.baselines.iter().map(|b| format!("speed_vs_{}", b)));
    writer.write_record(&header)?;

    for file in &report.files {
        for (rank, entry) in file.entries.iter().enumerate() {
            let m = &entry.measurement;
            let mut row = vec![
                file.file.name.clone(),
                file.file.original_size.to_string(),
                (rank + 1).to_string(),
                m.backend.clone(),
                m.origin.as_str().to_string(),
                m.is_success().to_string(),
                m.compressed_size.to_string(),
                optional(entry.ratio),
                optional(m.elapsed_secs),
                optional(m.decompress_secs),
                entry.is_winner.to_string(),
                m.failure.clone().unwrap_or_default(),
                optional(entry.space_savings),
                optional(entry.compress_throughput),
                optional(entry.decompress_throughput),
            ];
            row.extend(entry.factors.iter().map(|f| optional(f.size_factor)));
            row.extend(entry.factors.iter().map(|f| optional(f.speedup)));
            writer.write_record(&row)?;
        }
    }

    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| BenchError::Io(io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| BenchError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}
