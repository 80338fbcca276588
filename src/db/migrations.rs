use anyhow::Result;
use rusqlite::Connection;

/// The progress document is stored whole as JSON under a fixed key — the
/// backend is a keyed record store, not a relational model of the data.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS qada_progress (
            id        INTEGER PRIMARY KEY CHECK(id = 1),
            document  TEXT NOT NULL,
            saved_at  TEXT DEFAULT (datetime('now'))
        );
    ",
    )?;
    Ok(())
}
