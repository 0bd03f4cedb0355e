use crate::db::get_connection;
use crate::error::Result;
use crate::settings::{load_settings, DB_FILE};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    let default_owner = if settings.default_owner.is_empty() {
        "(not set)"
    } else {
        &settings.default_owner
    };
    println!("Owner:      {default_owner}");
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Log level:  {}", settings.log_level);

    if db_path.exists() {
        let conn = get_connection(&db_path)?;

        let owners: i64 = conn.query_row("SELECT count(*) FROM owners", [], |r| r.get(0))?;
        let transactions: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let rules: i64 = conn.query_row("SELECT count(*) FROM keyword_rules", [], |r| r.get(0))?;
        let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;

        println!();
        println!("Owners:        {owners}");
        println!("Transactions:  {transactions}");
        println!("Rules:         {rules}");
        println!("Imports:       {imports}");
    } else {
        println!();
        println!("Database not found. Run `budgetpal init` to set up.");
    }

    Ok(())
}
