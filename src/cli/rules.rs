use std::str::FromStr;

use comfy_table::{Cell, Table};

use crate::cli::{open_db, resolve_owner};
use crate::error::Result;
use crate::models::{KeywordRule, KeywordType};
use crate::rules::{add_rule, delete_rule, list_rules, update_rule, RuleUpdate};

fn describe(rule: &KeywordRule) -> String {
    format!("'{}' \u{2192} {}", rule.phrases.join("', '"), rule.category)
}

pub fn add(owner: Option<&str>, phrases: &[String], category: &str, excluded: bool) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    let kind = if excluded {
        KeywordType::Excluded
    } else {
        KeywordType::Included
    };
    let rule = add_rule(&conn, owner.id, category, kind, phrases)?;
    println!("Added rule {}: {}", rule.id, describe(&rule));
    Ok(())
}

pub fn list(owner: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Type", "Category", "Phrases"]);
    for rule in list_rules(&conn, owner.id)? {
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(rule.kind),
            Cell::new(&rule.category),
            Cell::new(rule.phrases.join(", ")),
        ]);
    }
    println!("Keyword rules for {}\n{table}", owner.username);
    Ok(())
}

pub fn update(
    owner: Option<&str>,
    id: i64,
    category: Option<String>,
    phrases: Option<Vec<String>>,
    rule_type: Option<&str>,
) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    let kind = rule_type.map(KeywordType::from_str).transpose()?;

    let rule = update_rule(
        &conn,
        owner.id,
        id,
        RuleUpdate {
            category,
            kind,
            phrases,
        },
    )?;
    println!("Updated rule {}: {}", rule.id, describe(&rule));
    Ok(())
}

pub fn delete(owner: Option<&str>, id: i64) -> Result<()> {
    let conn = open_db()?;
    let owner = resolve_owner(&conn, owner)?;
    let rule = delete_rule(&conn, owner.id, id)?;
    println!("Deleted rule {id}: {}", describe(&rule));
    Ok(())
}
