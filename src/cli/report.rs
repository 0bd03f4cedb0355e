use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_db, resolve_owner};
use crate::error::Result;
use crate::fmt::money;
use crate::reports::{get_summary, month_name, CategorySummary};

pub fn summary(owner: Option<&str>, json: bool) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    let data = get_summary(&conn, owner.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{}", format_summary(&data));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting (report data → String)
// ---------------------------------------------------------------------------

pub fn format_summary(data: &CategorySummary) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Total"]);
    for (category, total) in &data.category_totals {
        table.add_row(vec![Cell::new(category), Cell::new(money(*total))]);
    }
    let balance_label = if data.balance.is_sign_negative() {
        "BALANCE".red().bold()
    } else {
        "BALANCE".green().bold()
    };
    table.add_row(vec![Cell::new(balance_label), Cell::new(money(data.balance))]);
    let mut out = format!("Category totals\n{table}");

    if !data.monthly_totals.is_empty() {
        let mut mtable = Table::new();
        mtable.set_header(vec!["Month", "Category", "Total"]);
        for (month, categories) in &data.monthly_totals {
            for (category, total) in categories {
                mtable.add_row(vec![
                    Cell::new(month_name(*month)),
                    Cell::new(category),
                    Cell::new(money(*total)),
                ]);
            }
        }
        out.push_str(&format!("\n\nMonthly totals\n{mtable}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_format_summary() {
        let mut category_totals = BTreeMap::new();
        category_totals.insert("groceries".to_string(), Decimal::from_str("-45.20").unwrap());
        let mut april = BTreeMap::new();
        april.insert("groceries".to_string(), Decimal::from_str("-45.20").unwrap());
        let mut monthly_totals = BTreeMap::new();
        monthly_totals.insert(4, april);

        let out = format_summary(&CategorySummary {
            category_totals,
            monthly_totals,
            balance: Decimal::from_str("-45.20").unwrap(),
        });
        assert!(out.contains("groceries"));
        assert!(out.contains("APRIL"));
        assert!(out.contains("-€45.20"));
        assert!(out.contains("Monthly totals"));
    }

    #[test]
    fn test_format_summary_without_months() {
        let out = format_summary(&CategorySummary {
            category_totals: BTreeMap::new(),
            monthly_totals: BTreeMap::new(),
            balance: Decimal::ZERO,
        });
        assert!(out.contains("€0.00"));
        assert!(!out.contains("Monthly totals"));
    }
}
