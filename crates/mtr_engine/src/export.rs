use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::json;

use crate::persist::{write_atomic, PersistError};

const SIGNATURE_LINE: &str =
    "Assinatura do Motorista: ________________________________________________";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub numero_mtr: String,
    pub data_emissao: Option<String>,
    pub gerador: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_dir: PathBuf,
    /// Also write a JSON listing next to the text report.
    pub write_manifest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub entry_count: usize,
    pub report_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no valid manifests to report")]
    Empty,
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// `Relatorio_MTRs_19-10-2026`
pub fn report_stem(date: NaiveDate) -> String {
    format!("Relatorio_MTRs_{}", date.format("%d-%m-%Y"))
}

/// Numbered list of manifests followed by the driver signature block.
pub fn render_report(entries: &[ReportEntry], date: NaiveDate) -> String {
    let today = date.format("%d/%m/%Y").to_string();
    let mut buffer = String::new();
    buffer.push_str("RELATÓRIO DE MTRs\n\n");
    buffer.push_str("Nº CÓDIGO MTR\n");
    for (index, entry) in entries.iter().enumerate() {
        buffer.push_str(&format!("{}. {}\n", index + 1, entry.numero_mtr));
    }
    buffer.push('\n');
    buffer.push_str(SIGNATURE_LINE);
    buffer.push('\n');
    buffer.push_str(&format!("Data: {today}\n"));
    buffer
}

pub fn write_report(
    entries: &[ReportEntry],
    date: NaiveDate,
    options: &ReportOptions,
) -> Result<ReportSummary, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::Empty);
    }

    let stem = report_stem(date);
    let report_path = options.output_dir.join(format!("{stem}.txt"));
    write_atomic(&report_path, &render_report(entries, date))?;

    let manifest_path = if options.write_manifest {
        let path = options.output_dir.join(format!("{stem}.json"));
        write_manifest(&path, entries, date)?;
        Some(path)
    } else {
        None
    };

    Ok(ReportSummary {
        entry_count: entries.len(),
        report_path,
        manifest_path,
    })
}

fn write_manifest(path: &Path, entries: &[ReportEntry], date: NaiveDate) -> Result<(), PersistError> {
    let manifest = json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "count": entries.len(),
        "mtrs": entries.iter().map(|entry| {
            json!({
                "numeroMTR": entry.numero_mtr,
                "dataEmissao": entry.data_emissao,
                "gerador": entry.gerador,
            })
        }).collect::<Vec<_>>()
    });
    write_atomic(path, &manifest.to_string())
}
