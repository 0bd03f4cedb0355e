use comfy_table::{Cell, Table};

use crate::cli::{open_db, resolve_owner};
use crate::error::Result;
use crate::importer::get_imports;

pub fn run(owner: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    let records = get_imports(&conn, owner.id)?;

    if records.is_empty() {
        println!("No imports yet for {}.", owner.username);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Date", "File", "Bank", "Imported", "Duplicates", "Excluded", "Bad rows", "Checksum",
    ]);
    for r in records {
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(&r.imported_at),
            Cell::new(&r.file_name),
            Cell::new(&r.bank),
            Cell::new(r.imported),
            Cell::new(r.duplicates),
            Cell::new(r.excluded),
            Cell::new(r.failed_rows),
            Cell::new(&r.checksum[..r.checksum.len().min(12)]),
        ]);
    }
    println!("Import history for {}\n{table}", owner.username);
    Ok(())
}
