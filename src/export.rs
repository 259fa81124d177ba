//! Spreadsheet and plain-text renderings of a check cycle and of the daily
//! log. Nothing here keeps state.

use crate::{Provider, Sample, Snapshot};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

pub const REPORT_HEADERS: [&str; 5] = ["Service", "Status", "URL", "Latency (ms)", "Checked at"];

/// Spaces added after the longest cell of each text column.
pub const TEXT_PADDING: usize = 2;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
}

/// One row per sample, in the order given. Headers are not included.
pub fn report_rows(samples: &[Sample]) -> Vec<Vec<String>> {
    samples
        .iter()
        .map(|s| {
            let url = Provider::find(&s.provider)
                .map(|p| p.descriptor().status_url)
                .unwrap_or_default();
            vec![
                s.provider.clone(),
                s.severity.label().to_string(),
                url.to_string(),
                s.latency_ms.to_string(),
                s.time.format(TIME_FORMAT).to_string(),
            ]
        })
        .collect()
}

pub fn to_xlsx(samples: &[Sample]) -> Result<Vec<u8>, ExportError> {
    let headers: Vec<String> = REPORT_HEADERS.iter().map(|h| h.to_string()).collect();
    write_sheet("Status report", &headers, &report_rows(samples))
}

/// One row per snapshot, one column per provider.
pub fn daily_log_to_xlsx(
    snapshots: &[Snapshot],
    providers: &[Provider],
) -> Result<Vec<u8>, ExportError> {
    let headers: Vec<String> = std::iter::once("Time".to_string())
        .chain(providers.iter().map(|p| p.name().to_string()))
        .collect();
    let rows: Vec<Vec<String>> = snapshots
        .iter()
        .map(|snap| {
            std::iter::once(snap.bucket.clone())
                .chain(providers.iter().map(|p| {
                    snap.statuses
                        .get(p.name())
                        .map_or("-", |s| s.as_str())
                        .to_string()
                }))
                .collect()
        })
        .collect();
    write_sheet("Daily report", &headers, &rows)
}

fn write_sheet(name: &str, headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    for (col, header) in (0u16..).zip(headers) {
        sheet.write_string_with_format(0, col, header, &bold)?;
    }
    for (row, cells) in (1u32..).zip(rows) {
        for (col, cell) in (0u16..).zip(cells) {
            sheet.write_string(row, col, cell)?;
        }
    }
    sheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

/// Width of each column: its longest cell plus `TEXT_PADDING`.
pub fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or_default();
    (0..columns)
        .map(|col| {
            rows.iter()
                .filter_map(|r| r.get(col))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or_default()
                + TEXT_PADDING
        })
        .collect()
}

/// Fixed-width table with a dashed rule under the header.
pub fn to_text_table(samples: &[Sample]) -> String {
    let header: Vec<String> = REPORT_HEADERS.iter().map(|h| h.to_string()).collect();
    let mut rows = vec![header];
    rows.extend(report_rows(samples));
    let widths = column_widths(&rows);

    let render = |row: &Vec<String>| {
        let line: String = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        line.trim_end().to_string()
    };

    let mut out = String::new();
    let mut lines = rows.iter();
    if let Some(header) = lines.next() {
        out.push_str(&render(header));
        out.push('\n');
        out.push_str(&"-".repeat(widths.iter().sum::<usize>() - TEXT_PADDING));
        out.push('\n');
    }
    for row in lines {
        out.push_str(&render(row));
        out.push('\n');
    }
    out
}
