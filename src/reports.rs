use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use crate::categorizer::{categorize, Categorization};
use crate::db::{RuleStore, TransactionStore};
use crate::error::Result;
use crate::models::{KeywordRule, KeywordType, Transaction};

// ---------------------------------------------------------------------------
// Category summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category_totals: BTreeMap<String, Decimal>,
    /// Keyed by calendar month (1-12); years are merged.
    #[serde(serialize_with = "serialize_months")]
    pub monthly_totals: BTreeMap<u32, BTreeMap<String, Decimal>>,
    pub balance: Decimal,
}

pub fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map_or_else(|| month.to_string(), |m| m.name().to_uppercase())
}

fn serialize_months<S: Serializer>(
    months: &BTreeMap<u32, BTreeMap<String, Decimal>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(months.iter().map(|(m, totals)| (month_name(*m), totals)))
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Raw running totals, before zero categories are dropped and before rounding.
#[derive(Debug, Default)]
struct Totals {
    categories: BTreeMap<String, Decimal>,
    monthly: BTreeMap<u32, BTreeMap<String, Decimal>>,
    balance: Decimal,
}

fn fold_totals(transactions: &[Transaction], rules: &[KeywordRule]) -> Totals {
    let mut totals = Totals::default();
    for rule in rules.iter().filter(|r| r.kind == KeywordType::Included) {
        totals.categories.entry(rule.category.clone()).or_default();
    }

    for txn in transactions {
        let categorization = categorize(&txn.description, rules);
        let bucket = categorization.bucket(txn.amount);

        *totals.categories.entry(bucket.to_string()).or_default() += txn.amount;
        *totals
            .monthly
            .entry(txn.date.month())
            .or_default()
            .entry(bucket.to_string())
            .or_default() += txn.amount;
        totals.balance += txn.amount;
    }
    totals
}

/// Fold an owner's transactions into category, month and balance totals.
/// Always computed from scratch: rules may have changed since the last call.
pub fn summarize(transactions: &[Transaction], rules: &[KeywordRule]) -> CategorySummary {
    let totals = fold_totals(transactions, rules);

    let category_totals = totals
        .categories
        .into_iter()
        .filter(|(_, total)| !total.is_zero())
        .map(|(name, total)| (name, round_money(total)))
        .collect();

    let monthly_totals = totals
        .monthly
        .into_iter()
        .map(|(month, cats)| {
            let cats = cats
                .into_iter()
                .map(|(name, total)| (name, round_money(total)))
                .collect();
            (month, cats)
        })
        .collect();

    CategorySummary {
        category_totals,
        monthly_totals,
        balance: round_money(totals.balance),
    }
}

pub fn get_summary<S>(store: &S, owner_id: i64) -> Result<CategorySummary>
where
    S: TransactionStore + RuleStore,
{
    let rules = store.rules_by_type(owner_id, KeywordType::Included)?;
    let transactions = store.transactions_for_owner(owner_id)?;
    Ok(summarize(&transactions, &rules))
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

pub struct RegisterEntry {
    pub txn: Transaction,
    pub categorization: Categorization,
}

/// Every transaction of the owner with its category candidates.
pub fn get_register<S>(store: &S, owner_id: i64) -> Result<Vec<RegisterEntry>>
where
    S: TransactionStore + RuleStore,
{
    let rules = store.rules_by_type(owner_id, KeywordType::Included)?;
    let entries = store
        .transactions_for_owner(owner_id)?
        .into_iter()
        .map(|txn| {
            let categorization = categorize(&txn.description, &rules);
            RegisterEntry {
                txn,
                categorization,
            }
        })
        .collect();
    Ok(entries)
}
