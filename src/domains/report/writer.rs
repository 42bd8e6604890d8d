use crate::domains::report::types::ReportTable;
use crate::errors::{DomainError, DomainResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;

/// Write `table` as comma-separated text, header row first, every cell quoted.
pub fn write_csv<W: Write>(table: &ReportTable, writer: W) -> DomainResult<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(&table.headers)
        .map_err(|e| DomainError::Internal(format!("Failed to write report header: {}", e)))?;
    for row in &table.rows {
        wtr.write_record(row)
            .map_err(|e| DomainError::Internal(format!("Failed to write report row: {}", e)))?;
    }
    wtr.flush()
        .map_err(|e| DomainError::Internal(format!("Failed to flush report: {}", e)))?;
    Ok(())
}

pub fn to_csv_string(table: &ReportTable) -> DomainResult<String> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| DomainError::Internal(format!("Report is not UTF-8: {}", e)))
}
