use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Cached friend lists. Deliberately no uniqueness constraint:
        -- the whole table is wiped on a timer and on login/logout, so
        -- rows are only ever bulk-inserted, never upserted.
        CREATE TABLE IF NOT EXISTS friends (
            provider_id  TEXT NOT NULL,
            owner_id     TEXT NOT NULL,
            name         TEXT NOT NULL,
            screen_name  TEXT NOT NULL,
            location     TEXT NOT NULL DEFAULT '',
            avatar_url   TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_friends_owner
            ON friends(owner_id);

        CREATE TABLE IF NOT EXISTS notes (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL,
            friend_id   TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notes_owner_friend
            ON notes(owner_id, friend_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
