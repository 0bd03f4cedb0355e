use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::owners::{add_owner, list_owners};
use crate::settings::{load_settings, save_settings};

pub fn add(username: &str, first: &str, last: &str) -> Result<()> {
    let conn = open_db()?;
    let owner = add_owner(&conn, username, first, last)?;
    println!(
        "Added owner: {} ({} {})",
        owner.username, owner.first_name, owner.last_name
    );

    // The first owner becomes the default so `--owner` can be left off.
    let mut settings = load_settings();
    if settings.default_owner.is_empty() {
        settings.default_owner = owner.username.clone();
        save_settings(&settings)?;
        println!("Default owner set to {}", owner.username);
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let default_owner = load_settings().default_owner;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Username", "First name", "Last name", ""]);
    for owner in list_owners(&conn)? {
        let marker = if owner.username == default_owner { "default" } else { "" };
        table.add_row(vec![
            Cell::new(owner.id),
            Cell::new(&owner.username),
            Cell::new(&owner.first_name),
            Cell::new(&owner.last_name),
            Cell::new(marker),
        ]);
    }
    println!("Owners\n{table}");
    Ok(())
}
