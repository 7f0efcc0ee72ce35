//! Spreadsheet rendering via `rust_xlsxwriter`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook};

use crate::sheets::{Cell, Sheet};
use crate::ExportError;

const COLUMN_WIDTH: f64 = 18.0;

/// Renders the sheets into a timestamped workbook under `export_dir`.
///
/// The directory is created if missing. Returns the path of the written file.
pub(crate) fn write_workbook(
    sheets: &[Sheet],
    export_dir: &Path,
    file_stem: &str,
) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(export_dir)?;

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            let col = col as u16;
            worksheet.write_string_with_format(0, col, *header, &header_format)?;
            worksheet.set_column_width(col, COLUMN_WIDTH)?;
        }

        for (offset, cells) in sheet.rows.iter().enumerate() {
            let row = (offset + 1) as u32;
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(value) => {
                        worksheet.write_string(row, col, value)?;
                    }
                    Cell::Int(value) => {
                        worksheet.write_number(row, col, *value as f64)?;
                    }
                    Cell::Number(value) => {
                        worksheet.write_number(row, col, *value)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }

    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let path = export_dir.join(format!("{file_stem}-{stamp}.xlsx"));
    workbook.save(&path)?;
    tracing::info!(path = %path.display(), sheets = sheets.len(), "workbook written");
    Ok(path)
}
