use crate::Database;
use crate::models::NoteRow;
use anyhow::Result;
use flock_types::models::Friend;
use rusqlite::Connection;

impl Database {
    // -- Friends cache --

    /// Bulk-insert a freshly fetched friend list. No upsert: the table is
    /// wiped wholesale before refreshes, so plain inserts are enough.
    pub fn insert_friends(&self, friends: &[Friend]) -> Result<()> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "INSERT INTO friends (provider_id, owner_id, name, screen_name, location, avatar_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for f in friends {
                stmt.execute(rusqlite::params![
                    f.provider_id,
                    f.owner_id,
                    f.name,
                    f.screen_name,
                    f.location,
                    f.avatar_url,
                ])?;
            }
            Ok(())
        })
    }

    pub fn get_friends(&self, owner_id: &str) -> Result<Vec<Friend>> {
        self.with_conn(|conn| query_friends(conn, owner_id))
    }

    /// Wipe the whole friends cache (every user). Runs on the clear timer
    /// and on login/logout.
    pub fn delete_friends(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM friends", [])?;
            Ok(n)
        })
    }

    // -- Notes --

    pub fn get_notes(&self, owner_id: &str, friend_id: &str) -> Result<Vec<NoteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, friend_id, content, created_at
                 FROM notes WHERE owner_id = ?1 AND friend_id = ?2
                 ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([owner_id, friend_id], note_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_note(
        &self,
        id: &str,
        owner_id: &str,
        friend_id: &str,
        content: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (id, owner_id, friend_id, content) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, owner_id, friend_id, content],
            )?;
            Ok(())
        })
    }

    /// Update a note's content, but only if `owner_id` matches the stored
    /// owner. A non-matching owner affects zero rows and yields `None`,
    /// exactly like a missing id — callers cannot tell the two apart.
    pub fn update_note(&self, id: &str, owner_id: &str, content: &str) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notes SET content = ?1 WHERE id = ?2 AND owner_id = ?3",
                rusqlite::params![content, id, owner_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, friend_id, content, created_at FROM notes WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], note_from_row)?;
            Ok(Some(row))
        })
    }

    /// Delete a note with the same ownership filter as `update_note`.
    /// Returns whether a row was actually removed.
    pub fn delete_note(&self, id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
                rusqlite::params![id, owner_id],
            )?;
            Ok(changed > 0)
        })
    }
}

fn query_friends(conn: &Connection, owner_id: &str) -> Result<Vec<Friend>> {
    let mut stmt = conn.prepare(
        "SELECT provider_id, owner_id, name, screen_name, location, avatar_url
         FROM friends WHERE owner_id = ?1",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok(Friend {
                provider_id: row.get(0)?,
                owner_id: row.get(1)?,
                name: row.get(2)?,
                screen_name: row.get(3)?,
                location: row.get(4)?,
                avatar_url: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn note_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<NoteRow, rusqlite::Error> {
    Ok(NoteRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        friend_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friend(owner: &str, id: &str, name: &str) -> Friend {
        Friend {
            provider_id: id.into(),
            owner_id: owner.into(),
            name: name.into(),
            screen_name: name.to_lowercase(),
            location: String::new(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn test_friends_roundtrip_and_wipe() {
        let db = Database::open_in_memory().unwrap();
        db.insert_friends(&[friend("u1", "1", "Alice"), friend("u1", "2", "Bob")])
            .unwrap();
        db.insert_friends(&[friend("u2", "3", "Carol")]).unwrap();

        assert_eq!(db.get_friends("u1").unwrap().len(), 2);
        assert_eq!(db.get_friends("u2").unwrap().len(), 1);
        assert!(db.get_friends("u3").unwrap().is_empty());

        // The wipe is global, not per-user
        assert_eq!(db.delete_friends().unwrap(), 3);
        assert!(db.get_friends("u1").unwrap().is_empty());
    }

    #[test]
    fn test_note_crud() {
        let db = Database::open_in_memory().unwrap();
        db.insert_note("n1", "u1", "42", "met at conf").unwrap();

        let notes = db.get_notes("u1", "42").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "met at conf");
        assert_eq!(notes[0].owner_id, "u1");
        assert_eq!(notes[0].friend_id, "42");

        let updated = db.update_note("n1", "u1", "met at conf 2024").unwrap();
        assert_eq!(updated.unwrap().content, "met at conf 2024");

        assert!(db.delete_note("n1", "u1").unwrap());
        assert!(db.get_notes("u1", "42").unwrap().is_empty());
    }

    #[test]
    fn test_note_mutation_requires_matching_owner() {
        let db = Database::open_in_memory().unwrap();
        db.insert_note("n1", "u1", "42", "private").unwrap();

        // Another user's update affects zero rows and looks like "not found"
        assert!(db.update_note("n1", "u2", "hijacked").unwrap().is_none());
        assert!(!db.delete_note("n1", "u2").unwrap());

        // The original content is untouched
        let notes = db.get_notes("u1", "42").unwrap();
        assert_eq!(notes[0].content, "private");
    }
}
