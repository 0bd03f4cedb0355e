use std::path::PathBuf;

use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path, DB_FILE};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    let raw = data_dir.unwrap_or_else(|| settings.data_dir.clone());

    let expanded = PathBuf::from(shellexpand_path(&raw));
    std::fs::create_dir_all(&expanded)?;
    let resolved = PathBuf::from(shellexpand_path(&expanded.to_string_lossy()));

    let db_path = resolved.join(DB_FILE);
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    settings.data_dir = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("{} {}", "Initialized".green().bold(), db_path.display());
    if settings.default_owner.is_empty() {
        println!("Next: `budgetpal owners add <username> --first <name> --last <name>`");
    }
    Ok(())
}
