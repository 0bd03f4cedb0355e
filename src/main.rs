mod banks;
mod categorizer;
mod cli;
mod columns;
mod db;
mod error;
mod fmt;
mod importer;
mod logging;
mod models;
mod owners;
mod reports;
mod rules;
mod settings;
mod statement;

use clap::Parser;

use cli::{Cli, Commands, OwnersCommands, ReportCommands, RulesCommands, TransactionsCommands};

fn main() {
    let cli = Cli::parse();
    logging::setup_logging(&settings::load_settings().log_level);

    let owner = cli.owner.as_deref();
    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Owners { command } => match command {
            OwnersCommands::Add {
                username,
                first,
                last,
            } => cli::owners::add(&username, &first, &last),
            OwnersCommands::List => cli::owners::list(),
        },
        Commands::Import {
            files,
            stdin,
            content_type,
        } => match stdin {
            Some(file_name) => cli::import::run_stdin(owner, file_name, content_type),
            None => cli::import::run(owner, &files),
        },
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                phrases,
                category,
                excluded,
            } => cli::rules::add(owner, &phrases, &category, excluded),
            RulesCommands::List => cli::rules::list(owner),
            RulesCommands::Update {
                id,
                category,
                phrases,
                rule_type,
            } => cli::rules::update(owner, id, category, phrases, rule_type.as_deref()),
            RulesCommands::Delete { id } => cli::rules::delete(owner, id),
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::List => cli::transactions::list(owner),
            TransactionsCommands::Delete { id } => cli::transactions::delete(owner, id),
        },
        Commands::Categorize => cli::categorize::run(owner),
        Commands::Report { command } => match command {
            ReportCommands::Summary { json } => cli::report::summary(owner, json),
        },
        Commands::History => cli::history::run(owner),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
