//! Core library for followtrack
//!
//! This crate implements the **Functional Core** of the followtrack application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`followtrack_core`** (this crate): Pure transformation functions with zero I/O
//! - **`followtrack`**: Network, storage and terminal I/O plus orchestration
//!
//! Everything here can be exercised with fixture data: API payloads are
//! deserialized and normalized, snapshots are diffed, candidate lists are
//! derived and the interactive selection is driven key by key, all without
//! touching the network, the database or a terminal.
//!
//! # Module Organization
//!
//! - [`account`]: The platform-neutral account, post and page model
//! - [`mastodon`]: Mastodon API payloads and `Link` header pagination
//! - [`bluesky`]: Bluesky XRPC payloads and cursor pagination
//! - [`reconcile`]: Snapshot diffing and change classification
//! - [`candidates`]: Non-mutual and follow-back derivation
//! - [`selection`]: The interactive selection state machine
//! - [`display`]: Formatting helpers for terminal output
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use followtrack_core::reconcile::reconcile;
//!
//! let result = reconcile(&fresh_followers, &stored_snapshot);
//! for change in result.changes(&now) {
//!     println!("{} {}", change.action, change.handle);
//! }
//! ```

pub mod account;
pub mod bluesky;
pub mod candidates;
pub mod display;
pub mod mastodon;
pub mod reconcile;
pub mod selection;
