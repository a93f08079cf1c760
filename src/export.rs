use crate::error::Result;
use crate::table::Table;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes the table as comma-delimited text with a header row.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.headers())?;
    for row in table.rows() {
        out.write_record(row.iter().map(|c| c.to_string()))?;
    }
    out.flush()?;
    Ok(())
}

pub fn export_csv(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file)?;
    info!(path = %path.display(), rows = table.len(), "Exported qualified leads");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    #[test]
    fn quotes_fields_with_delimiters_and_blanks_empty_cells() {
        let table = Table::new(
            vec!["Cliente".into(), "Valor Total".into()],
            vec![vec![Cell::Text("Silva, Ana".into()), Cell::Empty]],
        );
        let mut buf = Vec::new();
        write_csv(&table, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Cliente,Valor Total\n\"Silva, Ana\",\n");
    }
}
