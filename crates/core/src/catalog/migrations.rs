//! Versioned schema migrations for the catalog database.

use rusqlite::{params, Connection};

use super::StoreError;

struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

/// Ordered, idempotent migrations. Each is applied at most once; the applied
/// version is recorded in the same transaction as its effect.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create torrents table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS torrents (
                info_hash TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                magnet_uri TEXT NOT NULL DEFAULT '',
                added_at TEXT NOT NULL,
                length INTEGER NOT NULL DEFAULT 0,
                files TEXT,
                downloaded INTEGER NOT NULL DEFAULT 0,
                progress REAL NOT NULL DEFAULT 0,
                state TEXT NOT NULL DEFAULT 'downloading',
                movie_details TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#,
    },
    Migration {
        version: 2,
        description: "add indexes",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_torrents_name ON torrents(name);
            CREATE INDEX IF NOT EXISTS idx_torrents_added_at ON torrents(added_at);
            CREATE INDEX IF NOT EXISTS idx_torrents_state ON torrents(state);
            CREATE INDEX IF NOT EXISTS idx_torrents_progress ON torrents(progress);
        "#,
    },
];

/// Bring the schema up to the latest version.
pub fn run_migrations(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let applied = applied_versions(conn)?;

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applying catalog migration"
        );

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            params![migration.version],
        )?;
        tx.commit()?;
    }

    Ok(())
}

fn applied_versions(conn: &Connection) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut versions = Vec::new();
    for row in rows {
        versions.push(row?);
    }
    Ok(versions)
}
