//! In-memory platform for exercising the shell without a network.

use super::{Platform, PlatformKind};
use crate::error::{self, Error};
use followtrack_core::account::{Account, AccountDetail, ListKind, Page, Post};
use std::cell::RefCell;

pub fn account(id: &str) -> Account {
    Account {
        id: id.to_string(),
        handle: format!("{}@example.social", id.to_lowercase()),
        display_name: id.to_string(),
        followers_count: 10,
        following_count: 10,
        created_at: Some("2023-02-01T00:00:00Z".to_string()),
    }
}

pub fn accounts(ids: &[&str]) -> Vec<Account> {
    ids.iter().map(|id| account(id)).collect()
}

#[derive(Default)]
pub struct MockPlatform {
    /// Followers served one page per entry; cursors are page indices.
    pub followers: Vec<Vec<Account>>,
    pub following: Vec<Vec<Account>>,
    /// Fail the request for this page.
    pub fail_page: Option<(ListKind, usize)>,
    /// Follow/unfollow calls on these ids fail.
    pub failing_ids: Vec<String>,
    pub unfollow_unsupported: bool,
    pub detail_missing: bool,
    pub reject_session: bool,
    /// Every call made, e.g. `followers:0`, `follow:A`.
    pub calls: RefCell<Vec<String>>,
}

impl MockPlatform {
    pub fn with_followers(pages: Vec<Vec<Account>>) -> Self {
        Self {
            followers: pages,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn serve(&self, kind: ListKind, cursor: Option<String>) -> error::Result<Page> {
        let index = cursor
            .map(|c| c.parse::<usize>().unwrap_or(usize::MAX))
            .unwrap_or(0);
        self.record(format!("{kind}:{index}"));

        if self.fail_page == Some((kind, index)) {
            return Err(Error::Transport(format!("page {index} of {kind} failed")));
        }

        let pages = match kind {
            ListKind::Followers => &self.followers,
            ListKind::Following => &self.following,
        };
        let accounts = pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < pages.len()).then(|| (index + 1).to_string());

        Ok(Page::new(accounts, next))
    }

    fn find(&self, id: &str) -> Option<Account> {
        self.followers
            .iter()
            .chain(self.following.iter())
            .flatten()
            .find(|a| a.id == id)
            .cloned()
    }

    fn relationship(&self, verb: &str, id: &str) -> error::Result<()> {
        self.record(format!("{verb}:{id}"));
        if self.failing_ids.iter().any(|f| f == id) {
            return Err(Error::Transport(format!("{verb} {id} failed")));
        }
        Ok(())
    }
}

impl Platform for MockPlatform {
    type Session = ();

    fn kind(&self) -> PlatformKind {
        PlatformKind::Mastodon
    }

    async fn check_session(&self) -> error::Result<()> {
        if self.reject_session {
            return Err(Error::Auth("bad token".to_string()));
        }
        Ok(())
    }

    async fn followers_page(&self, _: &(), cursor: Option<String>) -> error::Result<Page> {
        self.serve(ListKind::Followers, cursor)
    }

    async fn following_page(&self, _: &(), cursor: Option<String>) -> error::Result<Page> {
        self.serve(ListKind::Following, cursor)
    }

    async fn account_detail(&self, _: &(), id: &str) -> error::Result<AccountDetail> {
        self.record(format!("detail:{id}"));
        if self.detail_missing {
            return Err(Error::NotFound(format!("account {id}")));
        }
        let account = self
            .find(id)
            .ok_or_else(|| Error::NotFound(format!("account {id}")))?;

        Ok(AccountDetail {
            profile_url: Some(format!("https://example.social/@{}", account.id)),
            account,
            bio: Some("Writes about soup".to_string()),
            posts_count: 42,
            avatar: None,
        })
    }

    async fn recent_posts(&self, _: &(), id: &str, limit: u32) -> error::Result<Vec<Post>> {
        Ok((0..limit.min(2))
            .map(|i| Post {
                id: format!("{id}-{i}"),
                text: format!("post {i} by {id}"),
                created_at: Some("2024-03-01T00:00:00Z".to_string()),
                like_count: 1,
                repost_count: 0,
                reply_count: 0,
            })
            .collect())
    }

    async fn follow(&self, _: &(), id: &str) -> error::Result<()> {
        self.relationship("follow", id)
    }

    async fn unfollow(&self, _: &(), id: &str) -> error::Result<()> {
        if self.unfollow_unsupported {
            self.record(format!("unfollow:{id}"));
            return Err(Error::Unsupported("unfollow".to_string()));
        }
        self.relationship("unfollow", id)
    }
}
