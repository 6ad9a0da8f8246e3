//! Persistent follower snapshot and change log (SQLite)
//!
//! Two tables per platform database:
//!
//! - `current_followers`: the last fetched follower list, replaced wholesale
//! - `follower_changes`: append-only follow/unfollow log
//!
//! Only the reconciliation run writes here.

use crate::error::{self, Error};
use followtrack_core::account::Account;
use followtrack_core::reconcile::{ChangeAction, ChangeRecord, FollowerStats, NewChange};
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS current_followers (
    identifier TEXT PRIMARY KEY,
    handle TEXT NOT NULL,
    display_name TEXT NOT NULL,
    followers_count INTEGER NOT NULL DEFAULT 0,
    following_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT
);

CREATE TABLE IF NOT EXISTS follower_changes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    follower_identifier TEXT NOT NULL,
    handle TEXT NOT NULL,
    display_name TEXT NOT NULL,
    action TEXT NOT NULL CHECK (action IN ('follow', 'unfollow')),
    timestamp TEXT NOT NULL
);
";

pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    pub fn open(db_path: &Path) -> error::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(db_path).map_err(|e| {
            Error::Storage(format!("Failed to open {}: {}", db_path.display(), e))
        })?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> error::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> error::Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// The stored snapshot, in the order it was written.
    pub fn load_snapshot(&self) -> error::Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT identifier, handle, display_name, followers_count, following_count, created_at
             FROM current_followers ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(Account {
                id: r.get(0)?,
                handle: r.get(1)?,
                display_name: r.get(2)?,
                followers_count: r.get::<_, i64>(3)?.max(0) as u64,
                following_count: r.get::<_, i64>(4)?.max(0) as u64,
                created_at: r.get(5)?,
            })
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    /// Delete the snapshot and insert `accounts` in one transaction.
    ///
    /// Should a list ever repeat an identifier, the last occurrence wins.
    pub fn replace_snapshot(&mut self, accounts: &[Account]) -> error::Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM current_followers", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO current_followers
                 (identifier, handle, display_name, followers_count, following_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for account in accounts {
                stmt.execute(params![
                    account.id,
                    account.handle,
                    account.display_name,
                    account.followers_count as i64,
                    account.following_count as i64,
                    account.created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Append change rows in one transaction.
    pub fn append_changes(&mut self, changes: &[NewChange]) -> error::Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO follower_changes
                 (follower_identifier, handle, display_name, action, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for change in changes {
                stmt.execute(params![
                    change.follower_id,
                    change.handle,
                    change.display_name,
                    change.action.as_str(),
                    change.timestamp,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Most recent changes first; rows sharing a timestamp come newest-insert first.
    pub fn recent_changes(&self, limit: usize) -> error::Result<Vec<ChangeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, follower_identifier, handle, display_name, action, timestamp
             FROM follower_changes ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], |r| {
            let action: String = r.get(4)?;
            let action = ChangeAction::parse(&action).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(Error::Storage(format!("unknown change action {action:?}"))),
                )
            })?;

            Ok(ChangeRecord {
                id: r.get(0)?,
                follower_id: r.get(1)?,
                handle: r.get(2)?,
                display_name: r.get(3)?,
                action,
                timestamp: r.get(5)?,
            })
        })?;

        let mut changes = Vec::new();
        for row in rows {
            changes.push(row?);
        }
        Ok(changes)
    }

    pub fn stats(&self) -> error::Result<FollowerStats> {
        let count = |sql: &str| -> error::Result<u64> {
            let n: i64 = self.conn.query_row(sql, [], |r| r.get(0))?;
            Ok(n.max(0) as u64)
        };

        Ok(FollowerStats {
            current_followers: count("SELECT COUNT(*) FROM current_followers")?,
            follows_tracked: count(
                "SELECT COUNT(*) FROM follower_changes WHERE action = 'follow'",
            )?,
            unfollows_tracked: count(
                "SELECT COUNT(*) FROM follower_changes WHERE action = 'unfollow'",
            )?,
        })
    }

    /// Timestamp of the newest logged change, if any.
    pub fn last_change_at(&self) -> error::Result<Option<String>> {
        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(timestamp) FROM follower_changes", [], |r| {
                    r.get(0)
                })?;
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::accounts;
    use tempfile::TempDir;

    fn change(id: &str, action: ChangeAction, timestamp: &str) -> NewChange {
        NewChange {
            follower_id: id.to_string(),
            handle: id.to_lowercase(),
            display_name: id.to_string(),
            action,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_empty_store() {
        let store = SnapshotStore::open_in_memory().unwrap();
        assert!(store.load_snapshot().unwrap().is_empty());
        assert!(store.recent_changes(10).unwrap().is_empty());
        assert_eq!(store.stats().unwrap(), FollowerStats::default());
        assert_eq!(store.last_change_at().unwrap(), None);
    }

    #[test]
    fn test_replace_snapshot_round_trips_accounts() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let mut list = accounts(&["A", "B"]);
        list[1].created_at = None;

        store.replace_snapshot(&list).unwrap();
        assert_eq!(store.load_snapshot().unwrap(), list);

        store.replace_snapshot(&accounts(&["C"])).unwrap();
        let ids: Vec<String> = store
            .load_snapshot()
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["C"]);
    }

    #[test]
    fn test_recent_changes_order_and_limit() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        store
            .append_changes(&[
                change("A", ChangeAction::Follow, "2024-01-01T00:00:00Z"),
                change("B", ChangeAction::Unfollow, "2024-02-01T00:00:00Z"),
                change("C", ChangeAction::Follow, "2024-02-01T00:00:00Z"),
            ])
            .unwrap();

        let recent = store.recent_changes(10).unwrap();
        let ids: Vec<&str> = recent.iter().map(|c| c.follower_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "B", "A"]);
        assert_eq!(recent[1].action, ChangeAction::Unfollow);

        assert_eq!(store.recent_changes(1).unwrap().len(), 1);
    }

    #[test]
    fn test_stats() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        store.replace_snapshot(&accounts(&["A", "B", "C"])).unwrap();
        store
            .append_changes(&[
                change("A", ChangeAction::Follow, "2024-01-01T00:00:00Z"),
                change("B", ChangeAction::Follow, "2024-01-01T00:00:00Z"),
                change("D", ChangeAction::Unfollow, "2024-01-01T00:00:00Z"),
            ])
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.current_followers, 3);
        assert_eq!(stats.follows_tracked, 2);
        assert_eq!(stats.unfollows_tracked, 1);
        assert_eq!(stats.net_change(), 1);
        assert_eq!(
            store.last_change_at().unwrap().as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_open_on_disk_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("mastodon.db");

        {
            let mut store = SnapshotStore::open(&path).unwrap();
            store.replace_snapshot(&accounts(&["A"])).unwrap();
        }

        let store = SnapshotStore::open(&path).unwrap();
        assert_eq!(store.load_snapshot().unwrap().len(), 1);
    }
}
