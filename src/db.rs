use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "gradebook.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    // One row per named collection; payload is the whole collection as a JSON array.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS collections(
            name TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    // Workspaces created before timestamps were tracked.
    if !table_has_column(conn, "collections", "updated_at")? {
        conn.execute("ALTER TABLE collections ADD COLUMN updated_at TEXT", [])?;
    }
    Ok(())
}

pub fn collection_get(conn: &Connection, name: &str) -> anyhow::Result<Option<String>> {
    let payload = conn
        .query_row(
            "SELECT payload FROM collections WHERE name = ?",
            [name],
            |r| r.get::<_, String>(0),
        )
        .optional()
        .with_context(|| format!("failed to read collection {name}"))?;
    Ok(payload)
}

pub fn collection_put(conn: &Connection, name: &str, payload: &str) -> anyhow::Result<()> {
    let updated_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO collections(name, payload, updated_at)
         VALUES(?, ?, ?)
         ON CONFLICT(name) DO UPDATE SET
           payload = excluded.payload,
           updated_at = excluded.updated_at",
        (name, payload, &updated_at),
    )
    .with_context(|| format!("failed to write collection {name}"))?;
    Ok(())
}

pub fn collection_updated_at(conn: &Connection, name: &str) -> anyhow::Result<Option<String>> {
    let ts = conn
        .query_row(
            "SELECT updated_at FROM collections WHERE name = ?",
            [name],
            |r| r.get::<_, Option<String>>(0),
        )
        .optional()?;
    Ok(ts.flatten())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
