//! JSON dump of the report model.

use crate::error::Result;
use crate::ranking::Report;

/// Pretty-printed JSON of the whole report.
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
