/// Database row types — these map directly to SQLite rows.
/// Distinct from flock-types API models to keep the DB layer independent.

pub struct NoteRow {
    pub id: String,
    pub owner_id: String,
    pub friend_id: String,
    pub content: String,
    pub created_at: String,
}
