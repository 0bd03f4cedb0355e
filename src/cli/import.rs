use std::io::Read;
use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::banks;
use crate::cli::{open_db, resolve_owner};
use crate::error::Result;
use crate::importer::{content_type_for, import_batch, import_files, BatchReport};
use crate::models::Upload;

pub fn run(owner: Option<&str>, files: &[PathBuf]) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;

    let report = import_files(&conn, &owner, files)?;
    print!("{}", format_report(&report));
    Ok(())
}

/// Import a single statement piped in on stdin, e.g. straight from a
/// download. Without `--content-type` the type follows the file name.
pub fn run_stdin(owner: Option<&str>, file_name: String, content_type: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;

    let mut bytes = Vec::new();
    std::io::stdin().read_to_end(&mut bytes)?;
    let content_type =
        content_type.unwrap_or_else(|| content_type_for(Path::new(&file_name)).to_string());
    let upload = Upload {
        file_name,
        content_type,
        bytes,
    };

    let report = import_batch(&conn, &owner, &[upload])?;
    print!("{}", format_report(&report));
    Ok(())
}

fn bank_name(bank: &str) -> &str {
    banks::by_id(bank).map_or(bank, |p| p.name)
}

pub fn format_report(report: &BatchReport) -> String {
    let mut out = String::new();

    if !report.imported.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["File", "Bank", "Imported", "Duplicates", "Excluded", "Bad rows"]);
        for file in &report.imported {
            table.add_row(vec![
                Cell::new(&file.file_name),
                Cell::new(bank_name(&file.stats.bank)),
                Cell::new(file.stats.imported),
                Cell::new(file.stats.duplicates),
                Cell::new(file.stats.excluded),
                Cell::new(file.stats.failures.len()),
            ]);
        }
        out.push_str(&format!("Imported files\n{table}\n"));

        for file in &report.imported {
            for failure in &file.stats.failures {
                out.push_str(&format!(
                    "  {} line {}: {}\n",
                    file.file_name,
                    failure.line,
                    failure.error.to_string().yellow()
                ));
            }
        }
    }

    if !report.failed.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["File", "Reason"]);
        for file in &report.failed {
            table.add_row(vec![
                Cell::new(&file.file_name),
                Cell::new(file.reason.to_string().red()),
            ]);
        }
        out.push_str(&format!("Failed files\n{table}\n"));
    }

    out.push_str(&format!(
        "{} transactions imported from {} file(s), {} bad row(s), {} file(s) failed\n",
        report.total_imported(),
        report.imported.len(),
        report.total_failed_rows(),
        report.failed.len()
    ));
    out
}
