use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_db, resolve_owner};
use crate::db::delete_transaction;
use crate::error::Result;
use crate::fmt::money;
use crate::reports::get_register;

pub fn list(owner: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    let entries = get_register(&conn, owner.id)?;

    if entries.is_empty() {
        println!("No transactions for {}.", owner.username);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Amount", "Description", "Bank", "Category"]);
    for entry in &entries {
        let amount = if entry.txn.amount.is_sign_negative() {
            money(entry.txn.amount).red().to_string()
        } else {
            money(entry.txn.amount).green().to_string()
        };
        table.add_row(vec![
            Cell::new(entry.txn.id),
            Cell::new(entry.txn.date),
            Cell::new(amount),
            Cell::new(&entry.txn.description),
            Cell::new(&entry.txn.bank),
            Cell::new(entry.categorization.bucket(entry.txn.amount)),
        ]);
    }
    println!("Transactions for {}\n{table}", owner.username);
    Ok(())
}

pub fn delete(owner: Option<&str>, id: i64) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    delete_transaction(&conn, owner.id, id)?;
    println!("Deleted transaction {id}");
    Ok(())
}
