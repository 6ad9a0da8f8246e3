use super::{Platform, PlatformKind};
use crate::config::BlueskyConfig;
use crate::error::{self, Error};
use chrono::{SecondsFormat, Utc};
use followtrack_core::account::{AccountDetail, Page, Post};
use followtrack_core::bluesky::{
    classify_xrpc_error, follow_request, transform_author_feed, transform_followers_page,
    transform_follows_page, transform_profile_detail, AuthorFeedResponse, FollowersResponse,
    FollowsResponse, ProfileView, SessionResponse, XrpcErrorKind, PAGE_LIMIT,
};
use log::debug;
use serde::de::DeserializeOwned;

/// Pass successful XRPC responses through; classify failures by status and
/// error name. `invalid_request` decides what `InvalidRequest` means for the
/// method that was called.
async fn ensure_xrpc_success(
    response: reqwest::Response,
    context: &str,
    invalid_request: fn(String) -> Error,
) -> error::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = Error::status_detail(status, context, &body);

    Err(match classify_xrpc_error(status.as_u16(), &body) {
        XrpcErrorKind::Auth => Error::Auth(detail),
        XrpcErrorKind::NotFound => Error::NotFound(detail),
        XrpcErrorKind::InvalidRequest => invalid_request(detail),
        XrpcErrorKind::Other => Error::Transport(detail),
    })
}

/// Bluesky XRPC adapter
pub struct BlueskyAdapter {
    client: reqwest::Client,
    service: String,
    handle: String,
    password: String,
}

/// Tokens returned by `createSession`.
#[derive(Debug, Clone)]
pub struct BlueskySession {
    pub access_jwt: String,
    pub did: String,
}

impl BlueskyAdapter {
    pub fn new(config: &BlueskyConfig) -> error::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            service: config.service.trim_end_matches('/').to_string(),
            handle: config.handle.clone(),
            password: config.password.clone(),
        })
    }

    fn xrpc(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service, method)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        session: &BlueskySession,
        method: &str,
        params: &[(&str, String)],
        invalid_request: fn(String) -> Error,
    ) -> error::Result<T> {
        let url = self.xrpc(method);
        debug!("GET {url} {params:?}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&session.access_jwt)
            .query(params)
            .send()
            .await?;
        let response =
            ensure_xrpc_success(response, &format!("{method} failed"), invalid_request).await?;

        response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("{method}: invalid response: {e}")))
    }

    fn graph_params(session: &BlueskySession, cursor: Option<String>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("actor", session.did.clone()),
            ("limit", PAGE_LIMIT.to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }
        params
    }
}

impl Platform for BlueskyAdapter {
    type Session = BlueskySession;

    fn kind(&self) -> PlatformKind {
        PlatformKind::Bluesky
    }

    async fn check_session(&self) -> error::Result<BlueskySession> {
        let response = self
            .client
            .post(self.xrpc("com.atproto.server.createSession"))
            .json(&serde_json::json!({
                "identifier": self.handle,
                "password": self.password,
            }))
            .send()
            .await?;

        // Malformed identifiers come back as InvalidRequest.
        let response = ensure_xrpc_success(response, "createSession rejected", Error::Auth).await?;

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("createSession: invalid response: {e}")))?;

        Ok(BlueskySession {
            access_jwt: session.access_jwt,
            did: session.did,
        })
    }

    async fn followers_page(
        &self,
        session: &BlueskySession,
        cursor: Option<String>,
    ) -> error::Result<Page> {
        let response: FollowersResponse = self
            .query(
                session,
                "app.bsky.graph.getFollowers",
                &Self::graph_params(session, cursor),
                Error::Transport,
            )
            .await?;
        Ok(transform_followers_page(response))
    }

    async fn following_page(
        &self,
        session: &BlueskySession,
        cursor: Option<String>,
    ) -> error::Result<Page> {
        let response: FollowsResponse = self
            .query(
                session,
                "app.bsky.graph.getFollows",
                &Self::graph_params(session, cursor),
                Error::Transport,
            )
            .await?;
        Ok(transform_follows_page(response))
    }

    async fn account_detail(
        &self,
        session: &BlueskySession,
        id: &str,
    ) -> error::Result<AccountDetail> {
        let profile: ProfileView = self
            .query(
                session,
                "app.bsky.actor.getProfile",
                &[("actor", id.to_string())],
                // Unknown actors come back as InvalidRequest.
                Error::NotFound,
            )
            .await?;
        Ok(transform_profile_detail(profile))
    }

    async fn recent_posts(
        &self,
        session: &BlueskySession,
        id: &str,
        limit: u32,
    ) -> error::Result<Vec<Post>> {
        let feed: AuthorFeedResponse = self
            .query(
                session,
                "app.bsky.feed.getAuthorFeed",
                &[("actor", id.to_string()), ("limit", limit.to_string())],
                Error::Transport,
            )
            .await?;
        Ok(transform_author_feed(feed))
    }

    async fn follow(&self, session: &BlueskySession, id: &str) -> error::Result<()> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let body = follow_request(&session.did, id, &created_at);
        debug!("createRecord follow {id}");

        let response = self
            .client
            .post(self.xrpc("com.atproto.repo.createRecord"))
            .bearer_auth(&session.access_jwt)
            .json(&body)
            .send()
            .await?;
        ensure_xrpc_success(response, &format!("Failed to follow {id}"), Error::Transport).await?;
        Ok(())
    }

    async fn unfollow(&self, _session: &BlueskySession, id: &str) -> error::Result<()> {
        // Needs the follow record's rkey: list the repo's follow records, find
        // the one whose subject is `id`, then deleteRecord it.
        Err(Error::Unsupported(format!(
            "unfollowing {id} is not available on Bluesky"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> BlueskyAdapter {
        BlueskyAdapter::new(&BlueskyConfig {
            handle: "me.bsky.social".to_string(),
            password: "app-password".to_string(),
            service: server.uri(),
        })
        .unwrap()
    }

    fn session() -> BlueskySession {
        BlueskySession {
            access_jwt: "jwt".to_string(),
            did: "did:plc:me".to_string(),
        }
    }

    async fn answer(server: &MockServer, xrpc: &str, response: ResponseTemplate) {
        Mock::given(path(format!("/xrpc/{xrpc}")))
            .respond_with(response)
            .mount(server)
            .await;
    }

    fn xrpc_error(status: u16, error: &str, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_json(json!({"error": error, "message": message}))
    }

    #[tokio::test]
    async fn test_create_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_partial_json(json!({"identifier": "me.bsky.social"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessJwt": "jwt",
                "refreshJwt": "refresh",
                "did": "did:plc:me",
                "handle": "me.bsky.social"
            })))
            .mount(&server)
            .await;

        let session = adapter(&server).check_session().await.unwrap();

        assert_eq!(session.access_jwt, "jwt");
        assert_eq!(session.did, "did:plc:me");
    }

    #[tokio::test]
    async fn test_bad_credentials_are_auth_errors() {
        for response in [
            xrpc_error(401, "AuthenticationRequired", "Invalid identifier or password"),
            xrpc_error(400, "InvalidRequest", "Input/identifier must be a string"),
        ] {
            let server = MockServer::start().await;
            answer(&server, "com.atproto.server.createSession", response).await;

            let result = adapter(&server).check_session().await;

            assert!(matches!(result, Err(Error::Auth(_))), "{result:?}");
        }
    }

    #[tokio::test]
    async fn test_followers_page_passes_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xrpc/app.bsky.graph.getFollowers"))
            .and(query_param("actor", "did:plc:me"))
            .and(query_param("cursor", "3k2"))
            .and(header("authorization", "Bearer jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subject": {"did": "did:plc:me", "handle": "me.bsky.social"},
                "followers": [{"did": "did:plc:a", "handle": "a.bsky.social"}]
            })))
            .mount(&server)
            .await;

        let page = adapter(&server)
            .followers_page(&session(), Some("3k2".to_string()))
            .await
            .unwrap();

        assert_eq!(page.accounts[0].id, "did:plc:a");
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_expired_token_is_auth_error() {
        let server = MockServer::start().await;
        let expired = || xrpc_error(400, "ExpiredToken", "Token has expired");
        answer(&server, "app.bsky.graph.getFollowers", expired()).await;
        answer(&server, "app.bsky.actor.getProfile", expired()).await;
        let adapter = adapter(&server);

        let page = adapter.followers_page(&session(), None).await;
        let detail = adapter.account_detail(&session(), "did:plc:a").await;

        assert!(matches!(page, Err(Error::Auth(_))), "{page:?}");
        assert!(matches!(detail, Err(Error::Auth(_))), "{detail:?}");
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let server = MockServer::start().await;
        answer(
            &server,
            "app.bsky.actor.getProfile",
            xrpc_error(400, "InvalidRequest", "Profile not found"),
        )
        .await;

        let result = adapter(&server).account_detail(&session(), "did:plc:gone").await;

        assert!(matches!(result, Err(Error::NotFound(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_gateway_error_mentioning_400_is_transport() {
        let server = MockServer::start().await;
        answer(
            &server,
            "app.bsky.actor.getProfile",
            ResponseTemplate::new(502).set_body_string("upstream timed out after 400ms"),
        )
        .await;

        let result = adapter(&server).account_detail(&session(), "did:plc:a").await;

        assert!(matches!(result, Err(Error::Transport(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_follow_creates_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .and(header("authorization", "Bearer jwt"))
            .and(body_partial_json(json!({
                "repo": "did:plc:me",
                "collection": "app.bsky.graph.follow",
                "record": {"$type": "app.bsky.graph.follow", "subject": "did:plc:a"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uri": "at://did:plc:me/app.bsky.graph.follow/3k",
                "cid": "bafy"
            })))
            .expect(1)
            .mount(&server)
            .await;

        adapter(&server).follow(&session(), "did:plc:a").await.unwrap();
    }
}
