//! Scripted fetcher for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::{Dataset, FetchError, FetchResult, SnapshotFetcher};
use crate::model::{
    ConversationSummary, MessagePreview, RecentActivitySnapshot, StatsSnapshot, WaitingUserSummary,
};

/// Serves whatever response is currently scripted and counts calls
pub(crate) struct ScriptedFetcher {
    stats: Mutex<FetchResult<StatsSnapshot>>,
    activity: Mutex<FetchResult<RecentActivitySnapshot>>,
    delay: Mutex<Duration>,
    stats_calls: AtomicUsize,
    activity_calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(
        stats: FetchResult<StatsSnapshot>,
        activity: FetchResult<RecentActivitySnapshot>,
    ) -> Self {
        Self {
            stats: Mutex::new(stats),
            activity: Mutex::new(activity),
            delay: Mutex::new(Duration::ZERO),
            stats_calls: AtomicUsize::new(0),
            activity_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_stats(&self, stats: FetchResult<StatsSnapshot>) {
        *self.stats.lock().unwrap() = stats;
    }

    /// Make every stats fetch take `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    pub fn activity_calls(&self) -> usize {
        self.activity_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch_stats(&self) -> FetchResult<StatsSnapshot> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.stats.lock().unwrap().clone()
    }

    async fn fetch_recent_activity(&self) -> FetchResult<RecentActivitySnapshot> {
        self.activity_calls.fetch_add(1, Ordering::SeqCst);
        self.activity.lock().unwrap().clone()
    }
}

pub fn stats(total: u64, active: &[i64], waiting: &[i64]) -> StatsSnapshot {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    StatsSnapshot {
        total_users: total,
        active_conversations: active.len() as u64,
        waiting_users: waiting.len() as u64,
        active_conversations_data: active
            .iter()
            .map(|id| ConversationSummary {
                id: *id,
                duration_minutes: 3.0,
                message_count: 4,
                started_at: at,
            })
            .collect(),
        waiting_users_data: waiting
            .iter()
            .map(|id| WaitingUserSummary {
                id: *id,
                wait_time_minutes: 1.0,
                joined_at: at,
            })
            .collect(),
        timestamp: None,
    }
}

pub fn activity(texts: &[&str]) -> RecentActivitySnapshot {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    RecentActivitySnapshot {
        recent_messages: texts
            .iter()
            .enumerate()
            .map(|(i, text)| MessagePreview {
                conversation_id: i as i64 + 1,
                message_preview: text.to_string(),
                sent_at: at,
                id: None,
                message_type: None,
            })
            .collect(),
        timestamp: None,
    }
}

pub fn server_error(dataset: Dataset) -> FetchError {
    FetchError::transport(dataset, "HTTP 500: Internal Server Error")
}
