use std::borrow::Borrow;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::banks;
use crate::categorizer::is_excluded;
use crate::db::{RuleStore, TransactionStore};
use crate::error::{BudgetError, Result};
use crate::models::{ImportRecord, KeywordRule, KeywordType, NewTransaction, Owner, Upload};
use crate::statement::{parse_statement, ParsedStatement, RowFailure};

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

pub const CSV_CONTENT_TYPES: &[&str] = &["text/csv", "application/csv", "text/x-csv"];

pub fn is_csv_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    CSV_CONTENT_TYPES.contains(&essence.as_str())
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

fn check_content_types<'a, I>(uploads: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut any = false;
    let mut rejected = Vec::new();
    for (file_name, content_type) in uploads {
        any = true;
        if !is_csv_content_type(content_type) {
            rejected.push(file_name.to_string());
        }
    }
    if !any {
        return Err(BudgetError::EmptyBatch);
    }
    if !rejected.is_empty() {
        warn!(files = ?rejected, "batch rejected, non-CSV upload");
        return Err(BudgetError::BatchRejected { files: rejected });
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a whole file was left out of a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FileFailure {
    #[error("could not determine the bank")]
    Unresolved,

    #[error("missing required columns: {}", .0.join(", "))]
    HeaderMapping(Vec<String>),

    #[error("unreadable file: {0}")]
    Unreadable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<BudgetError> for FileFailure {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::HeaderMappingFailed { missing } => Self::HeaderMapping(missing),
            BudgetError::Csv(e) => Self::Unreadable(e.to_string()),
            BudgetError::Io(e) => Self::Unreadable(e.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for FileFailure {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Duplicate,
    Excluded,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileStats {
    pub bank: String,
    pub imported: usize,
    pub duplicates: usize,
    pub excluded: usize,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone)]
pub struct ImportedFile {
    pub file_name: String,
    pub stats: FileStats,
}

#[derive(Debug, Clone)]
pub struct FailedFile {
    pub file_name: String,
    pub reason: FileFailure,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub imported: Vec<ImportedFile>,
    pub failed: Vec<FailedFile>,
}

impl BatchReport {
    pub fn total_imported(&self) -> usize {
        self.imported.iter().map(|f| f.stats.imported).sum()
    }

    pub fn total_failed_rows(&self) -> usize {
        self.imported.iter().map(|f| f.stats.failures.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Dedup & exclusion
// ---------------------------------------------------------------------------

/// Decide whether a parsed row may be stored. The dedup lookup runs first.
pub fn admit<S: TransactionStore>(
    store: &S,
    txn: &NewTransaction,
    excluded_rules: &[KeywordRule],
) -> Result<Admission> {
    if store.transaction_exists(txn.owner_id, &txn.reference_id, &txn.bank)? {
        return Ok(Admission::Duplicate);
    }
    if is_excluded(&txn.description, excluded_rules) {
        return Ok(Admission::Excluded);
    }
    Ok(Admission::Accepted)
}

pub fn store_statement<S: TransactionStore>(
    store: &S,
    bank: &str,
    statement: ParsedStatement,
    excluded_rules: &[KeywordRule],
) -> Result<FileStats> {
    let mut stats = FileStats {
        bank: bank.to_string(),
        failures: statement.failures,
        ..FileStats::default()
    };
    for row in &statement.rows {
        match admit(store, &row.txn, excluded_rules)? {
            Admission::Accepted => {
                store.insert_transaction(&row.txn)?;
                stats.imported += 1;
            }
            Admission::Duplicate => {
                debug!(line = row.line, reference = %row.txn.reference_id, "duplicate row skipped");
                stats.duplicates += 1;
            }
            Admission::Excluded => {
                debug!(line = row.line, "excluded row skipped");
                stats.excluded += 1;
            }
        }
    }
    for failure in &stats.failures {
        debug!(line = failure.line, error = %failure.error, "row skipped");
    }
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Per-file import
// ---------------------------------------------------------------------------

fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn record_import(conn: &Connection, owner_id: i64, upload: &Upload, stats: &FileStats) -> Result<()> {
    conn.execute(
        "INSERT INTO imports (owner_id, filename, bank, imported, duplicates, excluded, failed_rows, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            owner_id,
            upload.file_name,
            stats.bank,
            stats.imported as i64,
            stats.duplicates as i64,
            stats.excluded as i64,
            stats.failures.len() as i64,
            compute_checksum(&upload.bytes),
        ],
    )?;
    Ok(())
}

/// Import one file inside its own SQLite transaction: either every
/// accepted row and the import record are committed, or nothing is.
fn import_upload(
    conn: &Connection,
    owner: &Owner,
    upload: &Upload,
    excluded_rules: &[KeywordRule],
) -> std::result::Result<FileStats, FileFailure> {
    let profile =
        banks::resolve(&upload.file_name, &upload.bytes, owner).ok_or(FileFailure::Unresolved)?;
    let statement = parse_statement(&upload.bytes, profile.id, owner.id)?;

    let tx = conn.unchecked_transaction()?;
    let stats = store_statement(&*tx, profile.id, statement, excluded_rules)?;
    record_import(&tx, owner.id, upload, &stats)?;
    tx.commit()?;
    Ok(stats)
}

fn process(
    conn: &Connection,
    owner: &Owner,
    upload: &Upload,
    excluded_rules: &[KeywordRule],
    report: &mut BatchReport,
) {
    match import_upload(conn, owner, upload, excluded_rules) {
        Ok(stats) => {
            info!(
                file = %upload.file_name,
                bank = %stats.bank,
                imported = stats.imported,
                duplicates = stats.duplicates,
                excluded = stats.excluded,
                failed_rows = stats.failures.len(),
                "statement imported"
            );
            report.imported.push(ImportedFile {
                file_name: upload.file_name.clone(),
                stats,
            });
        }
        Err(reason) => {
            warn!(file = %upload.file_name, %reason, "statement not imported");
            report.failed.push(FailedFile {
                file_name: upload.file_name.clone(),
                reason,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// Import a batch of uploaded statements for one owner. Any non-CSV upload
/// rejects the whole batch; otherwise each file succeeds or fails alone.
pub fn import_batch(conn: &Connection, owner: &Owner, uploads: &[Upload]) -> Result<BatchReport> {
    check_content_types(
        uploads
            .iter()
            .map(|u| (u.file_name.as_str(), u.content_type.as_str())),
    )?;
    run_batch(conn, owner, uploads.iter().map(Ok))
}

/// Same as [`import_batch`], reading the statements from disk. The content
/// type comes from the file extension and is checked before anything is
/// read; a file that cannot be read fails on its own.
pub fn import_files(conn: &Connection, owner: &Owner, paths: &[PathBuf]) -> Result<BatchReport> {
    let names: Vec<String> = paths.iter().map(|p| display_name(p)).collect();
    check_content_types(
        names
            .iter()
            .zip(paths)
            .map(|(name, path)| (name.as_str(), content_type_for(path))),
    )?;
    let uploads = names
        .into_iter()
        .zip(paths)
        .map(|(file_name, path)| read_upload(file_name, path));
    run_batch(conn, owner, uploads)
}

fn read_upload(file_name: String, path: &Path) -> std::result::Result<Upload, FailedFile> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Upload {
            content_type: content_type_for(path).to_string(),
            file_name,
            bytes,
        }),
        Err(e) => {
            warn!(file = %file_name, error = %e, "statement not readable");
            Err(FailedFile {
                file_name,
                reason: FileFailure::Unreadable(e.to_string()),
            })
        }
    }
}

/// Shared loop behind both entry points. Entries that already failed are
/// reported in their place in the batch.
fn run_batch<U, I>(conn: &Connection, owner: &Owner, uploads: I) -> Result<BatchReport>
where
    U: Borrow<Upload>,
    I: IntoIterator<Item = std::result::Result<U, FailedFile>>,
{
    // One snapshot of the exclusion rules for the whole batch.
    let excluded_rules = conn.rules_by_type(owner.id, KeywordType::Excluded)?;

    let mut report = BatchReport::default();
    for upload in uploads {
        match upload {
            Ok(upload) => {
                let upload: &Upload = Borrow::<Upload>::borrow(&upload);
                process(conn, owner, upload, &excluded_rules, &mut report);
            }
            Err(failed) => report.failed.push(failed),
        }
    }
    Ok(report)
}

pub fn get_imports(conn: &Connection, owner_id: i64) -> Result<Vec<ImportRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, filename, bank, imported, duplicates, excluded, failed_rows, checksum, import_date \
         FROM imports WHERE owner_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok(ImportRecord {
                id: row.get(0)?,
                file_name: row.get(1)?,
                bank: row.get(2)?,
                imported: row.get(3)?,
                duplicates: row.get(4)?,
                excluded: row.get(5)?,
                failed_rows: row.get(6)?,
                checksum: row.get(7)?,
                imported_at: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
