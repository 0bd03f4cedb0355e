use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use csv::StringRecord;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::banks;
use crate::columns::{map_header, ColumnMap, Field};
use crate::error::{BudgetError, Result};
use crate::models::NewTransaction;

/// Why a single statement row was skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("missing {0} column")]
    MissingColumn(Field),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("empty reference id")]
    EmptyReference,

    #[error("unreadable row: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub line: u64,
    pub error: RowError,
}

#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub line: u64,
    pub txn: NewTransaction,
}

#[derive(Debug, Default)]
pub struct ParsedStatement {
    pub rows: Vec<ParsedRow>,
    pub failures: Vec<RowFailure>,
}

// ---------------------------------------------------------------------------
// Field normalisation
// ---------------------------------------------------------------------------

fn multi_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("invalid whitespace regex"))
}

pub fn strip_quotes(raw: &str) -> String {
    raw.replace('"', "")
}

/// `23.04.2023` style dates: quotes dropped, dots turned into dashes, then
/// parsed with the bank's pattern. Day and month must be zero-padded, so the
/// parsed date has to format back to the same text.
pub fn parse_date(raw: &str, format: &str) -> std::result::Result<NaiveDate, RowError> {
    let cleaned = strip_quotes(raw).trim().replace('.', "-");
    NaiveDate::parse_from_str(&cleaned, format)
        .ok()
        .filter(|date| date.format(format).to_string() == cleaned)
        .ok_or_else(|| RowError::InvalidDate(raw.trim().to_string()))
}

/// Amounts use a comma as the decimal separator, e.g. `-12,50`.
pub fn parse_amount(raw: &str) -> std::result::Result<Decimal, RowError> {
    let cleaned = strip_quotes(raw).trim().replace(',', ".");
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    Decimal::from_str(cleaned).map_err(|_| RowError::InvalidAmount(raw.trim().to_string()))
}

pub fn normalize_description(raw: &str) -> String {
    let lower = strip_quotes(raw).to_lowercase();
    multi_space_re().replace_all(&lower, " ").trim().to_string()
}

pub fn normalize_reference(raw: &str) -> String {
    strip_quotes(raw).trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Statement rows are split on `;` only; quote characters are data that the
/// field normalisers strip, as the banks do not escape them consistently.
pub fn reader(content: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(content)
}

fn parse_row(
    record: &StringRecord,
    columns: &ColumnMap,
    bank: &str,
    owner_id: i64,
) -> std::result::Result<NewTransaction, RowError> {
    let cell = |field: Field, idx: usize| record.get(idx).ok_or(RowError::MissingColumn(field));

    let date = parse_date(cell(Field::Date, columns.date)?, banks::date_format(bank))?;
    let amount = parse_amount(cell(Field::Amount, columns.amount)?)?;
    let description = normalize_description(cell(Field::Title, columns.title)?);
    let reference_id = normalize_reference(cell(Field::ReferenceId, columns.reference_id)?);
    if reference_id.is_empty() {
        return Err(RowError::EmptyReference);
    }

    Ok(NewTransaction {
        owner_id,
        date,
        amount,
        description,
        bank: bank.to_lowercase(),
        reference_id,
    })
}

/// Parse a whole statement for an already resolved bank. Only an unmappable
/// header fails the statement; bad rows are collected in `failures`.
pub fn parse_statement(content: &[u8], bank: &str, owner_id: i64) -> Result<ParsedStatement> {
    let mut rdr = reader(content);
    let mut records = rdr.records();

    let header = match records.next() {
        Some(header) => header?,
        None => {
            return Err(BudgetError::HeaderMappingFailed {
                missing: [Field::Date, Field::Amount, Field::Title, Field::ReferenceId]
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            })
        }
    };
    let columns = map_header(header.iter())?;

    let mut statement = ParsedStatement::default();
    let mut last_line = header.position().map_or(1, |p| p.line());
    for result in records {
        match result {
            Ok(record) => {
                let line = record.position().map_or(last_line + 1, |p| p.line());
                last_line = line;
                match parse_row(&record, &columns, bank, owner_id) {
                    Ok(txn) => statement.rows.push(ParsedRow { line, txn }),
                    Err(error) => statement.failures.push(RowFailure { line, error }),
                }
            }
            Err(e) => {
                last_line += 1;
                statement.failures.push(RowFailure {
                    line: e.position().map_or(last_line, |p| p.line()),
                    error: RowError::Malformed(e.to_string()),
                });
            }
        }
    }
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const S_PANKKI: &str = "\
Kirjauspäivä;Maksupäivä;Summa;Tapahtumalaji;Maksaja;Saajan nimi;Saajan tilinumero;Saajan BIC-tunnus;Viitenumero;Viesti;Arkistointitunnus
\"23.04.2023\";\"23.04.2023\";\"-12,50\";\"KORTTIOSTO\";\"MAIJA\";\"K-Market   Kamppi\";\"\";\"\";\"\";\"\";\"ABC123\"
24.04.2023;24.04.2023;+1500,00;PALKKA;ACME OY;Maija Meikäläinen;;SBANFIHH;;;XYZ789
";

    #[test]
    fn test_parse_date_per_bank() {
        let s = parse_date("23.04.2023", banks::date_format("s-pankki")).unwrap();
        assert_eq!(s, NaiveDate::from_ymd_opt(2023, 4, 23).unwrap());
        assert!(parse_date("23.04.2023", banks::date_format("op-pankki")).is_err());
        let op = parse_date("\"2023.04.23\"", banks::date_format("op-pankki")).unwrap();
        assert_eq!(op, NaiveDate::from_ymd_opt(2023, 4, 23).unwrap());
    }

    #[test]
    fn test_parse_date_requires_two_digit_day_and_month() {
        assert!(parse_date("2023.4.3", banks::date_format("op-pankki")).is_err());
        assert!(parse_date("3.4.2023", banks::date_format("s-pankki")).is_err());
        assert!(parse_date("2023.04.03", banks::date_format("op-pankki")).is_ok());
        assert!(parse_date("03.04.2023", banks::date_format("s-pankki")).is_ok());
    }

    #[test]
    fn test_parse_date_rejects_impossible_dates() {
        assert!(parse_date("30.02.2023", "%d-%m-%Y").is_err());
        assert!(parse_date("", "%d-%m-%Y").is_err());
    }

    #[test]
    fn test_parse_amount_comma_decimal() {
        assert_eq!(parse_amount("-12,50").unwrap(), dec("-12.50"));
        assert_eq!(parse_amount("\"1500,00\"").unwrap(), dec("1500"));
        assert_eq!(parse_amount(" +0,01 ").unwrap(), dec("0.01"));
        assert_eq!(
            parse_amount("abc").unwrap_err(),
            RowError::InvalidAmount("abc".to_string())
        );
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description("\"K-Market   Kamppi\""), "k-market kamppi");
        assert_eq!(normalize_description("HSL\t\tMobiili"), "hsl mobiili");
        assert_eq!(normalize_description("Alepa "), "alepa");
    }

    #[test]
    fn test_parse_statement_builds_canonical_rows() {
        let parsed = parse_statement(S_PANKKI.as_bytes(), "S-Pankki", 7).unwrap();
        assert!(parsed.failures.is_empty(), "{:?}", parsed.failures);
        assert_eq!(parsed.rows.len(), 2);

        let first = &parsed.rows[0].txn;
        assert_eq!(first.owner_id, 7);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 4, 23).unwrap());
        assert_eq!(first.amount, dec("-12.50"));
        assert_eq!(first.description, "k-market kamppi");
        assert_eq!(first.reference_id, "abc123");
        assert_eq!(first.bank, "s-pankki");

        assert_eq!(parsed.rows[1].txn.amount, dec("1500.00"));
        assert_eq!(parsed.rows[1].line, 3);
    }

    #[test]
    fn test_bad_rows_are_counted_not_fatal() {
        let content = "\
Kirjauspäivä;Summa;Saajan nimi;Arkistointitunnus
23.04.2023;-1,00;Alepa;r1
31.13.2023;-2,00;Alepa;r2
24.04.2023;kaksi;Alepa;r3
25.04.2023;-3,00
26.04.2023;-4,00;Alepa;
27.04.2023;-5,00;Alepa;r6
";
        let parsed = parse_statement(content.as_bytes(), "s-pankki", 1).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        let errors: Vec<_> = parsed.failures.iter().map(|f| (f.line, f.error.clone())).collect();
        assert_eq!(
            errors,
            vec![
                (3, RowError::InvalidDate("31.13.2023".to_string())),
                (4, RowError::InvalidAmount("kaksi".to_string())),
                (5, RowError::MissingColumn(Field::Title)),
                (6, RowError::EmptyReference),
            ]
        );
    }

    #[test]
    fn test_unmappable_header_fails_statement() {
        let err = parse_statement(b"Date;Amount;Payee;Id\n", "s-pankki", 1).unwrap_err();
        assert!(matches!(err, BudgetError::HeaderMappingFailed { .. }));
    }

    #[test]
    fn test_empty_statement_fails() {
        let err = parse_statement(b"", "s-pankki", 1).unwrap_err();
        assert!(matches!(err, BudgetError::HeaderMappingFailed { .. }));
    }

    #[test]
    fn test_header_only_statement_has_no_rows() {
        let parsed =
            parse_statement("Kirjauspäivä;Summa;Saajan nimi;Arkistointitunnus\n".as_bytes(), "s-pankki", 1)
                .unwrap();
        assert!(parsed.rows.is_empty());
        assert!(parsed.failures.is_empty());
    }
}
