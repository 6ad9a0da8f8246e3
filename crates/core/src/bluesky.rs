//! Transformation functions for Bluesky (AT Protocol) XRPC responses

use crate::account::{display_name_or, Account, AccountDetail, Page, Post};
use serde::{Deserialize, Serialize};

/// Followers/follows requests ask for the maximum page size the API allows.
pub const PAGE_LIMIT: u32 = 100;

/// Record collection used for follow records.
pub const FOLLOW_COLLECTION: &str = "app.bsky.graph.follow";

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// `com.atproto.server.createSession` response
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_jwt: String,
    pub did: String,
    #[serde(default)]
    pub handle: Option<String>,
}

/// Profile view embedded in graph responses and returned by `getProfile`
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub follows_count: Option<u64>,
    #[serde(default)]
    pub posts_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `app.bsky.graph.getFollowers` response
#[derive(Debug, Deserialize, Clone)]
pub struct FollowersResponse {
    #[serde(default)]
    pub followers: Vec<ProfileView>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// `app.bsky.graph.getFollows` response
#[derive(Debug, Deserialize, Clone)]
pub struct FollowsResponse {
    #[serde(default)]
    pub follows: Vec<ProfileView>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// `app.bsky.feed.getAuthorFeed` response
#[derive(Debug, Deserialize, Clone)]
pub struct AuthorFeedResponse {
    #[serde(default)]
    pub feed: Vec<FeedItem>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedItem {
    pub post: FeedPost,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub uri: String,
    pub record: FeedRecord,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub repost_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Error body every XRPC method returns on failure.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct XrpcError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// How a failed XRPC call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrpcErrorKind {
    /// The session or credentials were rejected.
    Auth,
    NotFound,
    /// `InvalidRequest`; its meaning depends on the method that was called.
    InvalidRequest,
    Other,
}

// =============================================================================
// Request Types (Serialization)
// =============================================================================

/// Body of `com.atproto.repo.createRecord` for a follow.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CreateFollowRequest {
    pub repo: String,
    pub collection: String,
    pub record: FollowRecord,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FollowRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub subject: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Build the follow record that makes `repo_did` follow `subject_did`.
pub fn follow_request(repo_did: &str, subject_did: &str, created_at: &str) -> CreateFollowRequest {
    CreateFollowRequest {
        repo: repo_did.to_string(),
        collection: FOLLOW_COLLECTION.to_string(),
        record: FollowRecord {
            record_type: FOLLOW_COLLECTION.to_string(),
            subject: subject_did.to_string(),
            created_at: created_at.to_string(),
        },
    }
}

// =============================================================================
// Transformations
// =============================================================================

pub fn transform_profile(profile: ProfileView) -> Account {
    Account {
        display_name: display_name_or(profile.display_name.as_deref(), &profile.handle),
        id: profile.did,
        handle: profile.handle,
        followers_count: profile.followers_count.unwrap_or(0),
        following_count: profile.follows_count.unwrap_or(0),
        created_at: profile.created_at,
    }
}

pub fn transform_followers_page(response: FollowersResponse) -> Page {
    Page::new(
        response.followers.into_iter().map(transform_profile).collect(),
        response.cursor,
    )
}

pub fn transform_follows_page(response: FollowsResponse) -> Page {
    Page::new(
        response.follows.into_iter().map(transform_profile).collect(),
        response.cursor,
    )
}

pub fn transform_profile_detail(profile: ProfileView) -> AccountDetail {
    let bio = profile.description.clone().filter(|d| !d.trim().is_empty());
    let posts_count = profile.posts_count.unwrap_or(0);
    let avatar = profile.avatar.clone();
    let profile_url = Some(profile_url(&profile.handle));

    AccountDetail {
        account: transform_profile(profile),
        bio,
        posts_count,
        avatar,
        profile_url,
    }
}

pub fn transform_author_feed(response: AuthorFeedResponse) -> Vec<Post> {
    response
        .feed
        .into_iter()
        .map(|item| Post {
            id: item.post.uri,
            text: item.post.record.text,
            created_at: item.post.record.created_at,
            like_count: item.post.like_count.unwrap_or(0),
            repost_count: item.post.repost_count.unwrap_or(0),
            reply_count: item.post.reply_count.unwrap_or(0),
        })
        .collect()
}

pub fn parse_xrpc_error(body: &str) -> Option<XrpcError> {
    serde_json::from_str(body).ok()
}

/// Classify a failed XRPC response by its status and error name.
///
/// Expired and invalid tokens arrive as 400 on some servers, so the error name
/// wins over the status.
pub fn classify_xrpc_error(status: u16, body: &str) -> XrpcErrorKind {
    let name = parse_xrpc_error(body).and_then(|e| e.error);

    match (status, name.as_deref()) {
        (_, Some("ExpiredToken" | "InvalidToken" | "AuthenticationRequired" | "AccountTakedown")) => {
            XrpcErrorKind::Auth
        }
        (_, Some("NotFound" | "RecordNotFound")) => XrpcErrorKind::NotFound,
        (400, Some("InvalidRequest")) => XrpcErrorKind::InvalidRequest,
        (401 | 403, _) => XrpcErrorKind::Auth,
        (404, _) => XrpcErrorKind::NotFound,
        _ => XrpcErrorKind::Other,
    }
}

/// Public web URL of a profile.
pub fn profile_url(handle: &str) -> String {
    format!("https://bsky.app/profile/{handle}")
}
