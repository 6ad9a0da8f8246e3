use super::{ensure_success, Platform, PlatformKind};
use crate::config::MastodonConfig;
use crate::error::{self, Error};
use followtrack_core::account::{AccountDetail, Page, Post};
use followtrack_core::mastodon::{
    first_page_url, parse_next_link, transform_account_detail, transform_accounts,
    transform_statuses, CredentialAccount, MastodonAccount, MastodonStatus,
};
use log::debug;
use serde::de::DeserializeOwned;

/// Mastodon REST API adapter
pub struct MastodonAdapter {
    client: reqwest::Client,
    instance: String,
}

/// The authenticated account's id, resolved via `verify_credentials`.
#[derive(Debug, Clone)]
pub struct MastodonSession {
    pub account_id: String,
}

/// Create an HTTP client that sends the access token on every request
fn create_authenticated_client(config: &MastodonConfig) -> error::Result<reqwest::Client> {
    use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| Error::Config(format!("Invalid access token: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))
}

impl MastodonAdapter {
    pub fn new(config: &MastodonConfig) -> error::Result<Self> {
        Ok(Self {
            client: create_authenticated_client(config)?,
            instance: config.instance.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.instance, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> error::Result<T> {
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response, context).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("{context}: invalid response: {e}")))
    }

    async fn fetch_list_page(
        &self,
        session: &MastodonSession,
        list: &str,
        cursor: Option<String>,
    ) -> error::Result<Page> {
        let url = cursor.unwrap_or_else(|| first_page_url(&self.instance, &session.account_id, list));
        debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let response = ensure_success(response, &format!("Failed to fetch {list}")).await?;

        let next = parse_next_link(
            response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok()),
        );

        let accounts: Vec<MastodonAccount> = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Failed to parse {list}: {e}")))?;

        Ok(Page::new(transform_accounts(accounts), next))
    }

    async fn post_relationship(&self, id: &str, verb: &str) -> error::Result<()> {
        let url = self.url(&format!("accounts/{id}/{verb}"));
        debug!("POST {url}");

        let response = self.client.post(&url).send().await?;
        ensure_success(response, &format!("Failed to {verb} {id}")).await?;
        Ok(())
    }
}

impl Platform for MastodonAdapter {
    type Session = MastodonSession;

    fn kind(&self) -> PlatformKind {
        PlatformKind::Mastodon
    }

    async fn check_session(&self) -> error::Result<MastodonSession> {
        let account: CredentialAccount = self
            .get_json(
                &self.url("accounts/verify_credentials"),
                "Failed to verify credentials",
            )
            .await?;

        Ok(MastodonSession {
            account_id: account.id,
        })
    }

    async fn followers_page(
        &self,
        session: &MastodonSession,
        cursor: Option<String>,
    ) -> error::Result<Page> {
        self.fetch_list_page(session, "followers", cursor).await
    }

    async fn following_page(
        &self,
        session: &MastodonSession,
        cursor: Option<String>,
    ) -> error::Result<Page> {
        self.fetch_list_page(session, "following", cursor).await
    }

    async fn account_detail(
        &self,
        _session: &MastodonSession,
        id: &str,
    ) -> error::Result<AccountDetail> {
        let account: MastodonAccount = self
            .get_json(&self.url(&format!("accounts/{id}")), "Failed to fetch account")
            .await?;
        Ok(transform_account_detail(account))
    }

    async fn recent_posts(
        &self,
        _session: &MastodonSession,
        id: &str,
        limit: u32,
    ) -> error::Result<Vec<Post>> {
        let statuses: Vec<MastodonStatus> = self
            .get_json(
                &self.url(&format!("accounts/{id}/statuses?limit={limit}")),
                "Failed to fetch statuses",
            )
            .await?;
        Ok(transform_statuses(statuses))
    }

    async fn follow(&self, _session: &MastodonSession, id: &str) -> error::Result<()> {
        self.post_relationship(id, "follow").await
    }

    async fn unfollow(&self, _session: &MastodonSession, id: &str) -> error::Result<()> {
        self.post_relationship(id, "unfollow").await
    }
}
