use rusqlite::Connection;

use crate::db::{get_rule, rule_from_row};
use crate::error::{BudgetError, Result};
use crate::models::{KeywordRule, KeywordType, EXCLUDED_CATEGORY};

/// Optional changes applied by [`update_rule`].
#[derive(Debug, Default)]
pub struct RuleUpdate {
    pub category: Option<String>,
    pub kind: Option<KeywordType>,
    pub phrases: Option<Vec<String>>,
}

/// Lowercase and validate a rule before it is written.
fn normalize(category: &str, kind: KeywordType, phrases: &[String]) -> Result<(String, Vec<String>)> {
    let category = category.trim().to_lowercase();
    if category.is_empty() {
        return Err(BudgetError::InvalidRule("category cannot be empty".to_string()));
    }
    if kind == KeywordType::Excluded && category != EXCLUDED_CATEGORY {
        return Err(BudgetError::InvalidRule(format!(
            "excluded keywords must have category '{EXCLUDED_CATEGORY}'"
        )));
    }
    let phrases: Vec<String> = phrases
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    if phrases.is_empty() {
        return Err(BudgetError::InvalidRule("keywords cannot be empty".to_string()));
    }
    Ok((category, phrases))
}

pub fn add_rule(
    conn: &Connection,
    owner_id: i64,
    category: &str,
    kind: KeywordType,
    phrases: &[String],
) -> Result<KeywordRule> {
    let (category, phrases) = normalize(category, kind, phrases)?;
    conn.execute(
        "INSERT INTO keyword_rules (owner_id, category, rule_type, phrases) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![owner_id, category, kind.as_str(), serde_json::to_string(&phrases)?],
    )?;
    Ok(KeywordRule {
        id: conn.last_insert_rowid(),
        owner_id,
        category,
        kind,
        phrases,
    })
}

pub fn list_rules(conn: &Connection, owner_id: i64) -> Result<Vec<KeywordRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, category, rule_type, phrases FROM keyword_rules \
         WHERE owner_id = ?1 ORDER BY rule_type DESC, category, id",
    )?;
    let rows = stmt
        .query_map([owner_id], rule_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// A rule owned by someone else is reported as unknown.
fn owned_rule(conn: &Connection, owner_id: i64, id: i64) -> Result<KeywordRule> {
    match get_rule(conn, id)? {
        Some(rule) if rule.owner_id == owner_id => Ok(rule),
        _ => Err(BudgetError::UnknownRule(id)),
    }
}

pub fn update_rule(conn: &Connection, owner_id: i64, id: i64, update: RuleUpdate) -> Result<KeywordRule> {
    let existing = owned_rule(conn, owner_id, id)?;
    let kind = update.kind.unwrap_or(existing.kind);
    let category = update.category.unwrap_or(existing.category);
    let phrases = update.phrases.unwrap_or(existing.phrases);
    let (category, phrases) = normalize(&category, kind, &phrases)?;

    conn.execute(
        "UPDATE keyword_rules SET category = ?1, rule_type = ?2, phrases = ?3 WHERE id = ?4",
        rusqlite::params![category, kind.as_str(), serde_json::to_string(&phrases)?, id],
    )?;
    Ok(KeywordRule {
        id,
        owner_id,
        category,
        kind,
        phrases,
    })
}

pub fn delete_rule(conn: &Connection, owner_id: i64, id: i64) -> Result<KeywordRule> {
    let rule = owned_rule(conn, owner_id, id)?;
    conn.execute("DELETE FROM keyword_rules WHERE id = ?1", [id])?;
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db, RuleStore};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        for name in ["maija", "matti"] {
            conn.execute(
                "INSERT INTO owners (username, first_name, last_name) VALUES (?1, 'First', 'Last')",
                [name],
            )
            .unwrap();
        }
        (dir, conn)
    }

    fn phrases(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_rule_lowercases() {
        let (_dir, conn) = test_db();
        let rule = add_rule(&conn, 1, " Groceries ", KeywordType::Included, &phrases(&["K-Market", " ", "LIDL"])).unwrap();
        assert_eq!(rule.category, "groceries");
        assert_eq!(rule.phrases, vec!["k-market", "lidl"]);
        let stored = conn.rules_by_type(1, KeywordType::Included).unwrap();
        assert_eq!(stored, vec![rule]);
    }

    #[test]
    fn test_excluded_rule_requires_excluded_category() {
        let (_dir, conn) = test_db();
        let err = add_rule(&conn, 1, "transfers", KeywordType::Excluded, &phrases(&["oma siirto"])).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidRule(_)));
        assert!(add_rule(&conn, 1, "EXCLUDED", KeywordType::Excluded, &phrases(&["oma siirto"])).is_ok());
    }

    #[test]
    fn test_empty_phrases_rejected() {
        let (_dir, conn) = test_db();
        assert!(add_rule(&conn, 1, "food", KeywordType::Included, &phrases(&["  "])).is_err());
    }

    #[test]
    fn test_update_rule_revalidates() {
        let (_dir, conn) = test_db();
        let rule = add_rule(&conn, 1, "food", KeywordType::Included, &phrases(&["alepa"])).unwrap();
        let switched = update_rule(
            &conn,
            1,
            rule.id,
            RuleUpdate {
                kind: Some(KeywordType::Excluded),
                ..RuleUpdate::default()
            },
        );
        assert!(matches!(switched, Err(BudgetError::InvalidRule(_))));

        let updated = update_rule(
            &conn,
            1,
            rule.id,
            RuleUpdate {
                phrases: Some(phrases(&["Alepa", "Sale"])),
                ..RuleUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.phrases, vec!["alepa", "sale"]);
        assert_eq!(updated.category, "food");
    }

    #[test]
    fn test_foreign_rules_are_unknown() {
        let (_dir, conn) = test_db();
        let rule = add_rule(&conn, 1, "food", KeywordType::Included, &phrases(&["alepa"])).unwrap();
        assert!(matches!(delete_rule(&conn, 2, rule.id), Err(BudgetError::UnknownRule(_))));
        assert!(matches!(
            update_rule(&conn, 2, rule.id, RuleUpdate::default()),
            Err(BudgetError::UnknownRule(_))
        ));
        delete_rule(&conn, 1, rule.id).unwrap();
        assert!(list_rules(&conn, 1).unwrap().is_empty());
    }

    #[test]
    fn test_list_rules_included_first() {
        let (_dir, conn) = test_db();
        add_rule(&conn, 1, "excluded", KeywordType::Excluded, &phrases(&["oma siirto"])).unwrap();
        add_rule(&conn, 1, "food", KeywordType::Included, &phrases(&["alepa"])).unwrap();
        let kinds: Vec<KeywordType> = list_rules(&conn, 1).unwrap().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![KeywordType::Included, KeywordType::Excluded]);
    }
}
