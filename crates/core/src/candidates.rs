//! Candidate lists derived from two relationship lists
//!
//! Unlike reconciliation these compare by identifier only.

use crate::account::Account;
use std::collections::HashSet;

/// Accounts in `following` that do not follow back.
pub fn non_mutual(following: &[Account], followers: &[Account]) -> Vec<Account> {
    difference_by_id(following, followers)
}

/// Accounts in `followers` that are not followed back.
pub fn follow_back(followers: &[Account], following: &[Account]) -> Vec<Account> {
    difference_by_id(followers, following)
}

fn difference_by_id(keep: &[Account], exclude: &[Account]) -> Vec<Account> {
    let excluded: HashSet<&str> = exclude.iter().map(|a| a.id.as_str()).collect();
    keep.iter()
        .filter(|a| !excluded.contains(a.id.as_str()))
        .cloned()
        .collect()
}
