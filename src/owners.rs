use rusqlite::{Connection, OptionalExtension};

use crate::error::{BudgetError, Result};
use crate::models::Owner;

fn owner_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
    })
}

pub fn add_owner(conn: &Connection, username: &str, first_name: &str, last_name: &str) -> Result<Owner> {
    let username = username.trim();
    let first_name = first_name.trim();
    let last_name = last_name.trim();
    if username.is_empty() || first_name.is_empty() || last_name.is_empty() {
        return Err(BudgetError::Other(
            "username, first name and last name are all required".to_string(),
        ));
    }
    let exists: bool = conn
        .prepare("SELECT 1 FROM owners WHERE username = ?1")?
        .exists([username])?;
    if exists {
        return Err(BudgetError::Other(format!("Owner '{username}' already exists")));
    }
    conn.execute(
        "INSERT INTO owners (username, first_name, last_name) VALUES (?1, ?2, ?3)",
        rusqlite::params![username, first_name, last_name],
    )?;
    Ok(Owner {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    })
}

pub fn list_owners(conn: &Connection) -> Result<Vec<Owner>> {
    let mut stmt = conn.prepare("SELECT id, username, first_name, last_name FROM owners ORDER BY username")?;
    let rows = stmt
        .query_map([], owner_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_owner(conn: &Connection, username: &str) -> Result<Owner> {
    conn.query_row(
        "SELECT id, username, first_name, last_name FROM owners WHERE username = ?1",
        [username],
        owner_from_row,
    )
    .optional()?
    .ok_or_else(|| BudgetError::UnknownOwner(username.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_add_and_find_owner() {
        let (_dir, conn) = test_db();
        let added = add_owner(&conn, " maija ", "Maija", "Meikäläinen").unwrap();
        let found = find_owner(&conn, "maija").unwrap();
        assert_eq!(found.id, added.id);
        assert_eq!(found.last_name, "Meikäläinen");
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (_dir, conn) = test_db();
        add_owner(&conn, "maija", "Maija", "Meikäläinen").unwrap();
        assert!(add_owner(&conn, "maija", "Other", "Person").is_err());
    }

    #[test]
    fn test_names_required() {
        let (_dir, conn) = test_db();
        assert!(add_owner(&conn, "matti", "", "Virtanen").is_err());
    }

    #[test]
    fn test_unknown_owner() {
        let (_dir, conn) = test_db();
        assert!(matches!(find_owner(&conn, "nobody"), Err(BudgetError::UnknownOwner(_))));
    }

    #[test]
    fn test_list_owners_sorted() {
        let (_dir, conn) = test_db();
        add_owner(&conn, "matti", "Matti", "Virtanen").unwrap();
        add_owner(&conn, "maija", "Maija", "Meikäläinen").unwrap();
        let names: Vec<String> = list_owners(&conn).unwrap().into_iter().map(|o| o.username).collect();
        assert_eq!(names, vec!["maija", "matti"]);
    }
}
