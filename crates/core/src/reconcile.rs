//! Snapshot diffing and change classification
//!
//! [`reconcile`] compares a freshly fetched follower list against the last
//! persisted snapshot. Accounts are compared by full value (see
//! [`Account`]), so a profile whose counts moved between runs is reported as
//! one removal plus one addition.

use crate::account::Account;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Direction of a follower transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Follow,
    Unfollow,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Follow => "follow",
            ChangeAction::Unfollow => "unfollow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "follow" => Some(ChangeAction::Follow),
            "unfollow" => Some(ChangeAction::Unfollow),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change row waiting to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChange {
    pub follower_id: String,
    pub handle: String,
    pub display_name: String,
    pub action: ChangeAction,
    pub timestamp: String,
}

/// A change row read back from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub id: i64,
    pub follower_id: String,
    pub handle: String,
    pub display_name: String,
    pub action: ChangeAction,
    pub timestamp: String,
}

/// Outcome of diffing a fresh list against the stored snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// The snapshot was empty; the fresh list only seeds it.
    pub first_run: bool,
    /// In the fresh list but not in the snapshot, in fresh-list order.
    pub added: Vec<Account>,
    /// In the snapshot but not in the fresh list, in snapshot order.
    pub removed: Vec<Account>,
}

impl Reconciliation {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Change rows for this run, all stamped with the same `timestamp`.
    ///
    /// Additions come first, then removals.
    pub fn changes(&self, timestamp: &str) -> Vec<NewChange> {
        let to_change = |account: &Account, action: ChangeAction| NewChange {
            follower_id: account.id.clone(),
            handle: account.handle.clone(),
            display_name: account.display_name.clone(),
            action,
            timestamp: timestamp.to_string(),
        };

        self.added
            .iter()
            .map(|a| to_change(a, ChangeAction::Follow))
            .chain(self.removed.iter().map(|a| to_change(a, ChangeAction::Unfollow)))
            .collect()
    }
}

/// Diff `fresh` against `previous`.
///
/// An empty `previous` is treated as a first run: nothing is reported so the
/// initial snapshot does not flood the log with false follows.
pub fn reconcile(fresh: &[Account], previous: &[Account]) -> Reconciliation {
    if previous.is_empty() {
        return Reconciliation {
            first_run: true,
            ..Default::default()
        };
    }

    let fresh_set: HashSet<&Account> = fresh.iter().collect();
    let previous_set: HashSet<&Account> = previous.iter().collect();

    Reconciliation {
        first_run: false,
        added: fresh
            .iter()
            .filter(|a| !previous_set.contains(a))
            .cloned()
            .collect(),
        removed: previous
            .iter()
            .filter(|a| !fresh_set.contains(a))
            .cloned()
            .collect(),
    }
}

/// Aggregate counters shown by `stats` and the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FollowerStats {
    pub current_followers: u64,
    pub follows_tracked: u64,
    pub unfollows_tracked: u64,
}

impl FollowerStats {
    pub fn net_change(&self) -> i64 {
        self.follows_tracked as i64 - self.unfollows_tracked as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            handle: id.to_lowercase(),
            display_name: id.to_string(),
            followers_count: 1,
            following_count: 1,
            created_at: None,
        }
    }

    fn ids(accounts: &[Account]) -> Vec<&str> {
        accounts.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_reconcile_scenario() {
        let previous = vec![account("A"), account("B")];
        let fresh = vec![account("B"), account("C")];

        let result = reconcile(&fresh, &previous);

        assert!(!result.first_run);
        assert_eq!(ids(&result.added), vec!["C"]);
        assert_eq!(ids(&result.removed), vec!["A"]);
    }

    #[test]
    fn test_reconcile_first_run_reports_nothing() {
        let fresh = vec![account("A"), account("B")];
        let result = reconcile(&fresh, &[]);

        assert!(result.first_run);
        assert!(result.is_unchanged());
        assert!(result.changes("2024-01-01T00:00:00Z").is_empty());
    }

    #[test]
    fn test_reconcile_idempotent() {
        let snapshot = vec![account("A"), account("B")];
        let result = reconcile(&snapshot, &snapshot);

        assert!(result.is_unchanged());
        assert!(result.changes("now").is_empty());
    }

    #[test]
    fn test_reconcile_added_and_removed_disjoint_and_rebuild_fresh() {
        let previous = vec![account("A"), account("B"), account("C"), account("D")];
        let fresh = vec![account("C"), account("E"), account("A"), account("F")];

        let result = reconcile(&fresh, &previous);

        let added: HashSet<&Account> = result.added.iter().collect();
        let removed: HashSet<&Account> = result.removed.iter().collect();
        assert!(added.is_disjoint(&removed));

        let mut rebuilt: HashSet<&Account> = previous.iter().collect();
        rebuilt.extend(added.iter().copied());
        rebuilt.retain(|a| !removed.contains(a));
        let expected: HashSet<&Account> = fresh.iter().collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn test_reconcile_count_change_is_remove_plus_add() {
        let previous = vec![account("A")];
        let mut changed = account("A");
        changed.followers_count = 99;

        let result = reconcile(&[changed], &previous);

        assert_eq!(ids(&result.added), vec!["A"]);
        assert_eq!(ids(&result.removed), vec!["A"]);
    }

    #[test]
    fn test_changes_share_one_timestamp() {
        let previous = vec![account("A"), account("B")];
        let fresh = vec![account("C"), account("D")];
        let changes = reconcile(&fresh, &previous).changes("2024-05-01T10:00:00+00:00");

        assert_eq!(changes.len(), 4);
        assert!(changes
            .iter()
            .all(|c| c.timestamp == "2024-05-01T10:00:00+00:00"));
        assert_eq!(changes[0].action, ChangeAction::Follow);
        assert_eq!(changes[0].follower_id, "C");
        assert_eq!(changes[3].action, ChangeAction::Unfollow);
        assert_eq!(changes[3].follower_id, "B");
    }

    #[test]
    fn test_change_action_round_trip_strings() {
        assert_eq!(ChangeAction::parse("follow"), Some(ChangeAction::Follow));
        assert_eq!(ChangeAction::parse("unfollow"), Some(ChangeAction::Unfollow));
        assert_eq!(ChangeAction::parse("block"), None);
        assert_eq!(ChangeAction::Unfollow.to_string(), "unfollow");
    }

    #[test]
    fn test_net_change() {
        let stats = FollowerStats {
            current_followers: 10,
            follows_tracked: 3,
            unfollows_tracked: 5,
        };
        assert_eq!(stats.net_change(), -2);
    }
}
