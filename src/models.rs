use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::BudgetError;

#[derive(Debug, Clone)]
pub struct Owner {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub owner_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub bank: String,
    pub reference_id: String,
}

/// Canonical record produced from one statement row, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub owner_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub bank: String,
    pub reference_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordType {
    Included,
    Excluded,
}

impl KeywordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Included => "INCLUDED",
            Self::Excluded => "EXCLUDED",
        }
    }
}

impl fmt::Display for KeywordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeywordType {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCLUDED" => Ok(Self::Included),
            "EXCLUDED" => Ok(Self::Excluded),
            other => Err(BudgetError::InvalidRule(format!("unknown rule type '{other}'"))),
        }
    }
}

/// Category every EXCLUDED rule must carry.
pub const EXCLUDED_CATEGORY: &str = "excluded";

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub id: i64,
    pub owner_id: i64,
    pub category: String,
    pub kind: KeywordType,
    pub phrases: Vec<String>,
}

/// One uploaded statement file as handed over by the caller.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub id: i64,
    pub file_name: String,
    pub bank: String,
    pub imported: i64,
    pub duplicates: i64,
    pub excluded: i64,
    pub failed_rows: i64,
    pub checksum: String,
    pub imported_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_type_parse() {
        assert_eq!("included".parse::<KeywordType>().unwrap(), KeywordType::Included);
        assert_eq!(" EXCLUDED ".parse::<KeywordType>().unwrap(), KeywordType::Excluded);
        assert!("other".parse::<KeywordType>().is_err());
    }

    #[test]
    fn test_keyword_type_display_matches_storage() {
        assert_eq!(KeywordType::Included.to_string(), "INCLUDED");
        assert_eq!(KeywordType::Excluded.as_str(), "EXCLUDED");
    }
}
