//! Platform-neutral account model
//!
//! Both platforms normalize their heterogeneous records into these types so
//! that reconciliation, candidate derivation and the selection workflow can be
//! written once.

use serde::{Deserialize, Serialize};

/// A remote account as seen in a follower or following list.
///
/// Equality covers every tracked field, not only the identifier. The snapshot
/// diff relies on this: an account whose counts changed between two runs shows
/// up as both removed and added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Platform-scoped identifier (`id` on Mastodon, `did` on Bluesky)
    pub id: String,
    /// `acct` on Mastodon, `handle` on Bluesky
    pub handle: String,
    pub display_name: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub created_at: Option<String>,
}

/// Account plus the extras only fetched for the detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountDetail {
    pub account: Account,
    pub bio: Option<String>,
    pub posts_count: u64,
    pub avatar: Option<String>,
    pub profile_url: Option<String>,
}

/// A recent post, reduced to what the detail view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub created_at: Option<String>,
    pub like_count: u64,
    pub repost_count: u64,
    pub reply_count: u64,
}

/// Which relationship list to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Followers,
    Following,
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListKind::Followers => write!(f, "followers"),
            ListKind::Following => write!(f, "following"),
        }
    }
}

/// One page of a relationship list.
///
/// `next_cursor` is `None` when the list is exhausted. Adapters must never
/// return `Some("")`; use [`Page::new`] to normalize.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub accounts: Vec<Account>,
    pub next_cursor: Option<String>,
}

impl Page {
    pub fn new(accounts: Vec<Account>, next_cursor: Option<String>) -> Self {
        Self {
            accounts,
            next_cursor: next_cursor.filter(|c| !c.trim().is_empty()),
        }
    }
}

/// Pick the display name, falling back to the handle when absent or blank.
pub fn display_name_or(display_name: Option<&str>, fallback: &str) -> String {
    match display_name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            handle: format!("{id}@example.social"),
            display_name: id.to_uppercase(),
            followers_count: 10,
            following_count: 5,
            created_at: None,
        }
    }

    #[test]
    fn test_page_drops_empty_cursor() {
        let page = Page::new(vec![sample_account("a")], Some(String::new()));
        assert_eq!(page.next_cursor, None);

        let page = Page::new(vec![], Some("  ".to_string()));
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_page_keeps_real_cursor() {
        let page = Page::new(vec![], Some("abc".to_string()));
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_name_or(Some("Alice"), "alice"), "Alice");
        assert_eq!(display_name_or(Some(""), "alice"), "alice");
        assert_eq!(display_name_or(None, "alice"), "alice");
    }

    #[test]
    fn test_account_equality_covers_counts() {
        let a = sample_account("a");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.followers_count += 1;
        assert_ne!(a, b);
    }

    #[test]
    fn test_list_kind_display() {
        assert_eq!(ListKind::Followers.to_string(), "followers");
        assert_eq!(ListKind::Following.to_string(), "following");
    }
}
