use std::path::Path;

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};

use crate::odk::tools::error::Result;
use crate::odk::tools::split::WorkbookData;

/// Writes the provided workbook data to the given path, replacing any file
/// already there.
///
/// The document creation time is pinned so unchanged data always produces the
/// same document.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook_writer.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let header_format = Format::new().set_bold();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, header, &header_format)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}
