use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_db, resolve_owner};
use crate::error::Result;
use crate::fmt::money;
use crate::reports::get_register;

pub fn run(owner: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    let entries = get_register(&conn, owner.id)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Description", "Amount", "Category", "Candidates"]);
    let mut unmatched = 0;
    for entry in &entries {
        let category = entry.categorization.bucket(entry.txn.amount);
        let category_cell = if entry.categorization.category().is_some() {
            Cell::new(category)
        } else {
            unmatched += 1;
            Cell::new(category.yellow())
        };
        table.add_row(vec![
            Cell::new(entry.txn.id),
            Cell::new(&entry.txn.description),
            Cell::new(money(entry.txn.amount)),
            category_cell,
            Cell::new(entry.categorization.candidates.join(", ")),
        ]);
    }
    println!("Categorization for {}\n{table}", owner.username);
    println!(
        "{} matched a keyword rule, {} fell back to Other",
        entries.len() - unmatched,
        unmatched
    );
    Ok(())
}
