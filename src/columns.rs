use crate::banks::PROFILES;
use crate::error::{BudgetError, Result};

/// Semantic columns a statement header is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Amount,
    Title,
    ReferenceId,
    Bic,
}

impl Field {
    /// Order in which a header cell is offered to the fields.
    pub const ALL: [Field; 5] = [
        Field::Date,
        Field::Amount,
        Field::Title,
        Field::ReferenceId,
        Field::Bic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Title => "title",
            Self::ReferenceId => "referenceId",
            Self::Bic => "bic",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Synonym {
    Contains(&'static str),
    Exact(&'static str),
}

impl Synonym {
    fn matches(&self, header: &str) -> bool {
        match self {
            Self::Contains(s) => header.contains(s),
            Self::Exact(s) => header == *s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub amount: usize,
    pub title: usize,
    pub reference_id: usize,
    pub bic: Option<usize>,
}

fn normalize_header(cell: &str) -> String {
    cell.trim_start_matches('\u{feff}')
        .replace('"', "")
        .trim()
        .to_lowercase()
}

fn field_matches(field: Field, header: &str) -> bool {
    PROFILES
        .iter()
        .flat_map(|p| p.headers.iter())
        .any(|(f, syn)| *f == field && syn.matches(header))
}

/// Locate the semantic columns in a header row. The bank is not consulted:
/// the synonyms of every known profile are tried, so a bank that reorders
/// or renames its export still maps as long as the names stay recognisable.
pub fn map_header<'a, I>(cells: I) -> Result<ColumnMap>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut found: [Option<usize>; 5] = [None; 5];

    for (idx, cell) in cells.into_iter().enumerate() {
        let header = normalize_header(cell);
        if header.is_empty() {
            continue;
        }
        // A cell is claimed by the first field it matches; the first cell
        // for a field wins.
        if let Some(pos) = Field::ALL.iter().position(|f| field_matches(*f, &header)) {
            if found[pos].is_none() {
                found[pos] = Some(idx);
            }
        }
    }

    let [date, amount, title, reference_id, bic] = found;
    match (date, amount, title, reference_id) {
        (Some(date), Some(amount), Some(title), Some(reference_id)) => Ok(ColumnMap {
            date,
            amount,
            title,
            reference_id,
            bic,
        }),
        _ => {
            let missing = [
                (Field::Date, date),
                (Field::Amount, amount),
                (Field::Title, title),
                (Field::ReferenceId, reference_id),
            ]
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(f, _)| f.to_string())
            .collect();
            Err(BudgetError::HeaderMappingFailed { missing })
        }
    }
}
