//! Transformation functions for Mastodon API responses

use crate::account::{display_name_or, Account, AccountDetail, Post};
use crate::display::strip_html;
use regex::Regex;
use serde::Deserialize;

/// Followers/following requests ask for the maximum page size the API allows.
pub const PAGE_LIMIT: u32 = 80;

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Account entity returned by `/api/v1/accounts/*`
#[derive(Debug, Deserialize, Clone)]
pub struct MastodonAccount {
    pub id: String,
    pub acct: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Response of `/api/v1/accounts/verify_credentials`, only the id is needed.
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialAccount {
    pub id: String,
}

/// Status entity returned by `/api/v1/accounts/{id}/statuses`
#[derive(Debug, Deserialize, Clone)]
pub struct MastodonStatus {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub favourites_count: u64,
    #[serde(default)]
    pub reblogs_count: u64,
    #[serde(default)]
    pub replies_count: u64,
}

// =============================================================================
// Transformations
// =============================================================================

/// Extract the `rel="next"` target from a `Link` response header.
///
/// Returns `None` when the header is absent or carries no next link, which is
/// how the API signals the last page.
pub fn parse_next_link(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;
    let re = Regex::new(r"<([^>]+)>").ok()?;

    header
        .split(',')
        .find(|part| part.contains(r#"rel="next""#))
        .and_then(|part| re.captures(part))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|url| !url.is_empty())
}

/// URL of the first page of a relationship list.
pub fn first_page_url(instance: &str, account_id: &str, list: &str) -> String {
    format!(
        "{}/api/v1/accounts/{}/{}?limit={}",
        instance.trim_end_matches('/'),
        account_id,
        list,
        PAGE_LIMIT
    )
}

pub fn transform_account(account: MastodonAccount) -> Account {
    Account {
        display_name: display_name_or(account.display_name.as_deref(), &account.username),
        id: account.id,
        handle: account.acct,
        followers_count: account.followers_count,
        following_count: account.following_count,
        created_at: account.created_at,
    }
}

pub fn transform_accounts(accounts: Vec<MastodonAccount>) -> Vec<Account> {
    accounts.into_iter().map(transform_account).collect()
}

pub fn transform_account_detail(account: MastodonAccount) -> AccountDetail {
    let bio = account
        .note
        .as_deref()
        .map(strip_html)
        .filter(|b| !b.is_empty());
    let posts_count = account.statuses_count;
    let avatar = account.avatar.clone();
    let profile_url = account.url.clone();

    AccountDetail {
        account: transform_account(account),
        bio,
        posts_count,
        avatar,
        profile_url,
    }
}

pub fn transform_statuses(statuses: Vec<MastodonStatus>) -> Vec<Post> {
    statuses
        .into_iter()
        .map(|status| Post {
            text: strip_html(&status.content),
            id: status.id,
            created_at: status.created_at,
            like_count: status.favourites_count,
            repost_count: status.reblogs_count,
            reply_count: status.replies_count,
        })
        .collect()
}
