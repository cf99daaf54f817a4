use std::path::Path;

use csv::ReaderBuilder;

use crate::odk::tools::error::Result;
use crate::odk::tools::model::Table;

/// Reads a delimited export with a header row into a [`Table`].
///
/// Records shorter than the header are padded with empty cells.
pub fn read_table(path: &Path, name: &str) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(name, columns);

    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(str::to_string).collect());
    }

    Ok(table)
}
