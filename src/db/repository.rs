use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{HistoryEntry, HistoryKind};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Append an entry to the log with a fresh id and the current time.
    pub async fn insert_entry(&self, content: String, kind: HistoryKind) -> Result<HistoryEntry> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            content,
            kind,
            created_at: Utc::now(),
        };

        let row = entry.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO history (id, content, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        row.id,
                        row.content,
                        row.kind.as_str(),
                        row.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(entry)
    }

    /// Full log, newest first. Same-timestamp entries break ties on insertion
    /// order so the most recent insert still lists first.
    pub async fn get_all_entries(&self) -> Result<Vec<HistoryEntry>> {
        let entries = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, content, kind, created_at FROM history ORDER BY created_at DESC, rowid DESC",
                )?;
                let entries = stmt
                    .query_map([], |row| Ok(entry_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    pub async fn delete_entry(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM history WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute("DELETE FROM history", [])?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn entry_from_row(row: &Row) -> HistoryEntry {
    HistoryEntry {
        id: row.get(0).unwrap(),
        content: row.get(1).unwrap(),
        kind: HistoryKind::from_db(&row.get::<_, String>(2).unwrap()),
        created_at: row
            .get::<_, String>(3)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_repository() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("history.db");
        let repo = Repository::new(db_path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let (_dir, repo) = temp_repository().await;

        let a = repo
            .insert_entry("foo".into(), HistoryKind::Scanned)
            .await
            .unwrap();
        let b = repo
            .insert_entry("foo".into(), HistoryKind::Scanned)
            .await
            .unwrap();

        assert_ne!(a.id, b.id);

        let entries = repo.get_all_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.content == "foo"));
    }

    #[tokio::test]
    async fn newest_entries_list_first() {
        let (_dir, repo) = temp_repository().await;

        repo.insert_entry("first".into(), HistoryKind::Created)
            .await
            .unwrap();
        repo.insert_entry("second".into(), HistoryKind::Scanned)
            .await
            .unwrap();

        let entries = repo.get_all_entries().await.unwrap();
        assert_eq!(entries[0].content, "second");
        assert_eq!(entries[1].content, "first");
    }

    #[tokio::test]
    async fn delete_unknown_id_leaves_log_unchanged() {
        let (_dir, repo) = temp_repository().await;

        repo.insert_entry("keep me".into(), HistoryKind::Created)
            .await
            .unwrap();
        repo.delete_entry("no-such-id").await.unwrap();

        let entries = repo.get_all_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "keep me");
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_entry() {
        let (_dir, repo) = temp_repository().await;

        let a = repo
            .insert_entry("a".into(), HistoryKind::Created)
            .await
            .unwrap();
        repo.insert_entry("b".into(), HistoryKind::Scanned)
            .await
            .unwrap();

        repo.delete_entry(&a.id).await.unwrap();

        let entries = repo.get_all_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "b");
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let (_dir, repo) = temp_repository().await;

        repo.insert_entry("a".into(), HistoryKind::Created)
            .await
            .unwrap();
        repo.insert_entry("b".into(), HistoryKind::Scanned)
            .await
            .unwrap();
        repo.clear().await.unwrap();

        assert!(repo.get_all_entries().await.unwrap().is_empty());
    }
}
