use rust_decimal::Decimal;
use tracing::debug;

use crate::columns::{map_header, Field, Synonym};
use crate::models::Owner;
use crate::statement::{normalize_description, parse_amount, reader, strip_quotes};

/// Date pattern used when a bank has no profile of its own.
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Static description of one bank's statement export.
#[derive(Debug)]
pub struct BankProfile {
    pub id: &'static str,
    pub name: &'static str,
    /// Lowercase substrings that identify the bank in a file name.
    pub file_hints: &'static [&'static str],
    pub bic: &'static str,
    /// chrono pattern applied after `.` separators are turned into `-`.
    pub date_format: &'static str,
    pub headers: &'static [(Field, Synonym)],
}

pub const PROFILES: &[BankProfile] = &[
    BankProfile {
        id: "s-pankki",
        name: "S-Pankki",
        file_hints: &["spankki", "s-pankki"],
        bic: "SBANFIHH",
        date_format: "%d-%m-%Y",
        headers: &[
            (Field::Date, Synonym::Contains("kirjauspäivä")),
            (Field::Amount, Synonym::Contains("summa")),
            (Field::Title, Synonym::Exact("saajan nimi")),
            (Field::ReferenceId, Synonym::Contains("arkistointitunnus")),
            (Field::Bic, Synonym::Contains("bic")),
        ],
    },
    BankProfile {
        id: "op-pankki",
        name: "OP",
        file_hints: &["oppankki", "op"],
        bic: "OKOYFIHH",
        date_format: "%Y-%m-%d",
        headers: &[
            (Field::Date, Synonym::Contains("kirjauspäivä")),
            (Field::Date, Synonym::Contains("päivämäärä")),
            (Field::Amount, Synonym::Contains("määrä")),
            (Field::Title, Synonym::Contains("saaja/maksaja")),
            (Field::ReferenceId, Synonym::Contains("arkistointitunnus")),
            (Field::Bic, Synonym::Contains("bic")),
        ],
    },
];

pub fn by_id(id: &str) -> Option<&'static BankProfile> {
    PROFILES.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

pub fn date_format(bank: &str) -> &'static str {
    by_id(bank).map_or(DEFAULT_DATE_FORMAT, |p| p.date_format)
}

pub fn from_file_name(file_name: &str) -> Option<&'static BankProfile> {
    let lower = file_name.to_lowercase();
    PROFILES
        .iter()
        .find(|p| p.file_hints.iter().any(|hint| lower.contains(hint)))
}

pub fn from_bic(bic: &str) -> Option<&'static BankProfile> {
    let bic = strip_quotes(bic);
    let bic = bic.trim();
    PROFILES.iter().find(|p| p.bic.eq_ignore_ascii_case(bic))
}

/// Work out which bank produced a statement: by file name first, then by
/// the BIC on a self-transfer row (an incoming payment whose counterparty
/// is the owner themself).
pub fn resolve(file_name: &str, content: &[u8], owner: &Owner) -> Option<&'static BankProfile> {
    if let Some(profile) = from_file_name(file_name) {
        debug!(file = file_name, bank = profile.id, "bank resolved from file name");
        return Some(profile);
    }
    let profile = from_self_transfer(content, owner)?;
    debug!(file = file_name, bank = profile.id, "bank resolved from BIC");
    Some(profile)
}

fn from_self_transfer(content: &[u8], owner: &Owner) -> Option<&'static BankProfile> {
    let mut rdr = reader(content);
    let mut records = rdr.records();
    let header = records.next()?.ok()?;
    let columns = map_header(header.iter()).ok()?;
    let bic_idx = columns.bic?;

    let first = owner.first_name.to_lowercase();
    let last = owner.last_name.to_lowercase();
    let forward = format!("{first} {last}");
    let reverse = format!("{last} {first}");

    for record in records.flatten() {
        let Some(title) = record.get(columns.title) else {
            continue;
        };
        let title = normalize_description(title);
        if !title.contains(&forward) && !title.contains(&reverse) {
            continue;
        }
        let Some(Ok(amount)) = record.get(columns.amount).map(parse_amount) else {
            continue;
        };
        if amount < Decimal::ZERO {
            continue;
        }
        if let Some(profile) = record.get(bic_idx).and_then(from_bic) {
            return Some(profile);
        }
    }
    None
}
