pub mod categorize;
pub mod history;
pub mod import;
pub mod init;
pub mod owners;
pub mod report;
pub mod rules;
pub mod status;
pub mod transactions;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{BudgetError, Result};
use crate::models::Owner;
use crate::owners::find_owner;
use crate::settings::{db_path, load_settings};

/// Open the configured database. `init` must have run first.
pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        return Err(BudgetError::Settings(format!(
            "No database found at {}\nRun `budgetpal init` to create one.",
            path.display()
        )));
    }
    let conn = get_connection(&path)?;
    init_db(&conn)?;
    Ok(conn)
}

/// The `--owner` flag wins; otherwise the `default_owner` setting.
pub(crate) fn resolve_owner(conn: &Connection, flag: Option<&str>) -> Result<Owner> {
    let settings = load_settings();
    let username = match flag {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ if !settings.default_owner.is_empty() => settings.default_owner,
        _ => return Err(BudgetError::NoOwner),
    };
    find_owner(conn, &username)
}

#[derive(Parser)]
#[command(
    name = "budgetpal",
    about = "Import bank statements and sort them into budget categories."
)]
pub struct Cli {
    /// Owner username (default: default_owner from settings)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for budgetpal data (default: ~/.local/share/budgetpal)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage owners.
    Owners {
        #[command(subcommand)]
        command: OwnersCommands,
    },
    /// Import one or more bank statement CSV files.
    Import {
        /// Statement files (.csv)
        #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
        files: Vec<PathBuf>,
        /// Read one statement from standard input under this file name
        #[arg(long, value_name = "FILE_NAME")]
        stdin: Option<String>,
        /// Content type of the statement on standard input (default: from the file name)
        #[arg(long = "content-type", requires = "stdin")]
        content_type: Option<String>,
    },
    /// Manage keyword rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// List or delete stored transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Show every candidate category for each transaction.
    Categorize,
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show past imports.
    History,
    /// Show settings, database location and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum OwnersCommands {
    /// Register a new owner.
    Add {
        /// Unique username
        username: String,
        /// First name, as printed on statements
        #[arg(long)]
        first: String,
        /// Last name, as printed on statements
        #[arg(long)]
        last: String,
    },
    /// List all owners.
    List,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a keyword rule.
    Add {
        /// Phrases to match against transaction descriptions
        #[arg(required = true)]
        phrases: Vec<String>,
        /// Category to assign
        #[arg(long)]
        category: String,
        /// Drop matching rows at import instead of categorizing them
        #[arg(long)]
        excluded: bool,
    },
    /// List the owner's keyword rules.
    List,
    /// Update an existing rule.
    Update {
        /// Rule ID (shown in `budgetpal rules list`)
        id: i64,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// Replacement phrases
        #[arg(long, num_args = 1..)]
        phrases: Option<Vec<String>>,
        /// New rule type: included or excluded
        #[arg(long = "type")]
        rule_type: Option<String>,
    },
    /// Delete a rule by ID.
    Delete {
        /// Rule ID (shown in `budgetpal rules list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List the owner's transactions with their category.
    List,
    /// Delete a transaction by ID.
    Delete {
        /// Transaction ID (shown in `budgetpal transactions list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Category totals, monthly breakdown and balance.
    Summary {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}
