//! Platform adapters
//!
//! [`Platform`] is the capability set every network is reduced to. Adapters
//! differ in identifiers, pagination (opaque cursor vs `Link` header) and
//! authentication, but reconciliation and the selection workflow are written
//! once against this trait.
//!
//! Authentication state is an explicit [`Platform::Session`] value obtained from
//! [`Platform::check_session`] and passed into every call; adapters never
//! re-authenticate behind the caller's back.

pub mod bluesky;
pub mod mastodon;

#[cfg(test)]
pub mod mock;

use crate::error::{self, Error};
use followtrack_core::account::{AccountDetail, ListKind, Page, Post};
use followtrack_core::selection::BulkAction;

pub use bluesky::BlueskyAdapter;
pub use mastodon::MastodonAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlatformKind {
    Mastodon,
    Bluesky,
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::Mastodon => write!(f, "mastodon"),
            PlatformKind::Bluesky => write!(f, "bluesky"),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Proof of a successful login, required by every other call.
    type Session;

    fn kind(&self) -> PlatformKind;

    /// Authenticate (or verify the stored credentials) and open a session.
    async fn check_session(&self) -> error::Result<Self::Session>;

    async fn followers_page(
        &self,
        session: &Self::Session,
        cursor: Option<String>,
    ) -> error::Result<Page>;

    async fn following_page(
        &self,
        session: &Self::Session,
        cursor: Option<String>,
    ) -> error::Result<Page>;

    async fn account_detail(&self, session: &Self::Session, id: &str)
        -> error::Result<AccountDetail>;

    async fn recent_posts(
        &self,
        session: &Self::Session,
        id: &str,
        limit: u32,
    ) -> error::Result<Vec<Post>>;

    async fn follow(&self, session: &Self::Session, id: &str) -> error::Result<()>;

    /// Returns [`Error::Unsupported`] where the platform cannot unfollow.
    async fn unfollow(&self, session: &Self::Session, id: &str) -> error::Result<()>;

    async fn list_page(
        &self,
        session: &Self::Session,
        kind: ListKind,
        cursor: Option<String>,
    ) -> error::Result<Page> {
        match kind {
            ListKind::Followers => self.followers_page(session, cursor).await,
            ListKind::Following => self.following_page(session, cursor).await,
        }
    }

    async fn apply(&self, session: &Self::Session, action: BulkAction, id: &str) -> error::Result<()> {
        match action {
            BulkAction::Follow => self.follow(session, id).await,
            BulkAction::Unfollow => self.unfollow(session, id).await,
        }
    }
}

/// Pass successful responses through, classify the rest.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    context: &str,
) -> error::Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::from_status(status, context, &body))
}
