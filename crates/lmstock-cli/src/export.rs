//! JSON and CSV artifacts for a finished run.

use std::path::{Path, PathBuf};

use lmstock_core::{ExportFormat, StockStatus};
use serde::Serialize;

use crate::check::RunReport;

const CSV_HEADER: &str = "branch_code,branch_name,city,weight_grams,price_idr,status";

#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    branch_code: &'a str,
    branch_name: &'a str,
    city: &'a str,
    weight_grams: f64,
    price_idr: Option<i64>,
    status: StockStatus,
}

#[derive(Debug, Serialize)]
struct ExportFailure<'a> {
    branch_code: &'a str,
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    run_started_at: String,
    run_finished_at: String,
    records: Vec<ExportRecord<'a>>,
    failures: Vec<ExportFailure<'a>>,
}

fn export_records(report: &RunReport) -> Vec<ExportRecord<'_>> {
    report
        .records()
        .map(|(branch, record)| ExportRecord {
            branch_code: &record.branch_code,
            branch_name: &branch.name,
            city: &branch.city,
            weight_grams: record.weight_grams,
            price_idr: record.price_idr(),
            status: record.status,
        })
        .collect()
}

/// `stock_<YYYYmmdd_HHMMSS>.<ext>`, stamped with the run start time.
pub(crate) fn export_file_name(report: &RunReport, format: ExportFormat) -> String {
    format!(
        "stock_{}.{}",
        report.started_at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub(crate) fn render_json(report: &RunReport) -> anyhow::Result<String> {
    let document = ExportDocument {
        run_started_at: report.started_at.to_rfc3339(),
        run_finished_at: report.finished_at.to_rfc3339(),
        records: export_records(report),
        failures: report
            .failures()
            .map(|(branch, error)| ExportFailure {
                branch_code: &branch.code,
                kind: error.kind(),
                message: error.to_string(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub(crate) fn render_csv(report: &RunReport) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for record in export_records(report) {
        let price = record.price_idr.map(|p| p.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(record.branch_code),
            csv_field(record.branch_name),
            csv_field(record.city),
            record.weight_grams,
            price,
            record.status
        ));
    }
    out
}

/// Quotes a field when it contains a delimiter, a quote or a line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Writes one file per format into `dir`, creating it if needed.
///
/// Returns the paths written, in `formats` order.
pub(crate) fn write_exports(
    report: &RunReport,
    dir: &Path,
    formats: &[ExportFormat],
) -> anyhow::Result<Vec<PathBuf>> {
    if formats.is_empty() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("failed to create export dir {}: {e}", dir.display()))?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = dir.join(export_file_name(report, format));
        if written.contains(&path) {
            continue;
        }
        let contents = match format {
            ExportFormat::Json => render_json(report)?,
            ExportFormat::Csv => render_csv(report),
        };
        std::fs::write(&path, contents)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "export written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
