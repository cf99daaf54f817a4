use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::odk::tools::error::{Result, ToolError};
use crate::odk::tools::split::{SheetTable, WorkbookData};

/// Reads every sheet of a workbook produced by
/// [`excel_write`](crate::odk::tools::io::excel_write), treating the first row
/// of each sheet as its header.
pub fn read_workbook(path: &Path) -> Result<WorkbookData> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    let mut tables = Vec::with_capacity(sheet_names.len());
    for sheet_name in sheet_names {
        let range = read_required_sheet(&mut workbook, &sheet_name)?;
        let mut rows = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell_to_string(Some(cell)))
                    .collect::<Vec<String>>()
            });
        let columns = rows.next().unwrap_or_default();
        tables.push(SheetTable {
            sheet_name,
            columns,
            rows: rows.collect(),
        });
    }

    Ok(WorkbookData { tables })
}

/// Reads a single sheet by name.
pub fn read_sheet(path: &Path, name: &str) -> Result<SheetTable> {
    read_workbook(path)?
        .tables
        .into_iter()
        .find(|table| table.sheet_name == name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
