//! Snapshot Fetching
//!
//! One network round trip per dataset, validated into a typed snapshot.
//!
//! ## Datasets
//!
//! - **Stats** (`/api/stats`): counters plus active and waiting lists,
//!   polled on every tick
//! - **Recent activity** (`/api/recent-activity`): latest messages, loaded
//!   once at startup
//!
//! Fetchers never retry. A failed fetch is reported to the caller and the
//! next scheduled cycle supersedes it.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod scripted;

pub use client::{decode, HttpFetcher};
pub use error::{FetchError, FetchErrorKind, FetchResult};

use std::fmt;

use async_trait::async_trait;

use crate::model::{RecentActivitySnapshot, StatsSnapshot};

/// The datasets served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Stats,
    RecentActivity,
}

impl Dataset {
    /// Message shown to the user when a refresh of this dataset fails
    pub fn failure_message(self) -> &'static str {
        match self {
            Dataset::Stats => "Failed to update statistics",
            Dataset::RecentActivity => "Failed to update recent messages",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Stats => f.write_str("stats"),
            Dataset::RecentActivity => f.write_str("recent activity"),
        }
    }
}

/// Source of snapshots
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch counters and the active/waiting lists
    async fn fetch_stats(&self) -> FetchResult<StatsSnapshot>;

    /// Fetch the recent message feed
    async fn fetch_recent_activity(&self) -> FetchResult<RecentActivitySnapshot>;
}
