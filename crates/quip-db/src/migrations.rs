use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS jokes (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            content       TEXT NOT NULL,
            jokester_id   TEXT NOT NULL REFERENCES users(id),
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_jokes_jokester
            ON jokes(jokester_id);

        CREATE INDEX IF NOT EXISTS idx_jokes_created
            ON jokes(created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
