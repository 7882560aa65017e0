use crate::Database;
use crate::models::{JokeHeaderRow, JokeRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Jokes --

    pub fn create_joke(&self, id: &str, name: &str, content: &str, jokester_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO jokes (id, name, content, jokester_id) VALUES (?1, ?2, ?3, ?4)",
                (id, name, content, jokester_id),
            )?;
            Ok(())
        })
    }

    pub fn get_joke(&self, id: &str) -> Result<Option<JokeRow>> {
        self.with_conn(|conn| query_joke(conn, id))
    }

    /// Newest-first joke headers for the listing page.
    pub fn list_jokes(&self, limit: u32) -> Result<Vec<JokeHeaderRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name FROM jokes ORDER BY created_at DESC, id DESC LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(JokeHeaderRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn random_joke(&self) -> Result<Option<JokeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, content, jokester_id, created_at
                 FROM jokes ORDER BY RANDOM() LIMIT 1",
            )?;

            let row = stmt.query_row([], joke_from_row).optional()?;

            Ok(row)
        })
    }

    pub fn delete_joke(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM jokes WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_joke(conn: &Connection, id: &str) -> Result<Option<JokeRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, content, jokester_id, created_at FROM jokes WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], joke_from_row).optional()?;

    Ok(row)
}

fn joke_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<JokeRow, rusqlite::Error> {
    Ok(JokeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        content: row.get(2)?,
        jokester_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
