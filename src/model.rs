//! Snapshot Types
//!
//! Typed views of the two read-only endpoints. Snapshots are immutable once
//! decoded and are replaced wholesale by the next successful fetch.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server timestamps are carried as UTC instants
pub type Timestamp = DateTime<Utc>;

/// Result of one `/api/stats` fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_users: u64,
    pub active_conversations: u64,
    pub waiting_users: u64,
    pub active_conversations_data: Vec<ConversationSummary>,
    pub waiting_users_data: Vec<WaitingUserSummary>,
    /// When the server produced the snapshot
    #[serde(default, deserialize_with = "wire_time::deserialize_opt")]
    pub timestamp: Option<Timestamp>,
}

/// One active conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub duration_minutes: f64,
    pub message_count: u64,
    #[serde(deserialize_with = "wire_time::deserialize")]
    pub started_at: Timestamp,
}

/// One user waiting to be matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingUserSummary {
    pub id: i64,
    pub wait_time_minutes: f64,
    #[serde(deserialize_with = "wire_time::deserialize")]
    pub joined_at: Timestamp,
}

/// Result of one `/api/recent-activity` fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivitySnapshot {
    pub recent_messages: Vec<MessagePreview>,
    #[serde(default, deserialize_with = "wire_time::deserialize_opt")]
    pub timestamp: Option<Timestamp>,
}

/// A truncated message as served by the activity feed
///
/// `message_preview` is untrusted user text and must only reach the page
/// through [`crate::format::escape_text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePreview {
    pub conversation_id: i64,
    pub message_preview: String,
    #[serde(deserialize_with = "wire_time::deserialize")]
    pub sent_at: Timestamp,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub message_type: Option<String>,
}

impl StatsSnapshot {
    /// Check constraints serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        for conv in &self.active_conversations_data {
            check_measure("duration_minutes", conv.id, conv.duration_minutes)?;
        }
        for user in &self.waiting_users_data {
            check_measure("wait_time_minutes", user.id, user.wait_time_minutes)?;
        }
        Ok(())
    }
}

fn check_measure(field: &str, id: i64, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} of record {} must be a non-negative number, got {}", field, id, value))
    }
}

/// Parse a wire timestamp.
///
/// Values with an explicit offset are honored; naive values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

mod wire_time {
    use super::{parse_timestamp, Timestamp};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_with_zone() {
        let ts = parse_timestamp("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());

        let ts = parse_timestamp("2024-01-01T12:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_timestamp_as_utc() {
        let ts = parse_timestamp("2024-03-05T08:09:10.123456").unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-05 08:09:10");

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_decode_stats() {
        let body = r#"{
            "total_users": 5,
            "active_conversations": 2,
            "waiting_users": 1,
            "active_conversations_data": [
                {"id": 7, "duration_minutes": 3, "message_count": 4, "started_at": "2024-01-01T10:00:00Z"}
            ],
            "waiting_users_data": [],
            "timestamp": "2024-01-01T10:03:00"
        }"#;

        let stats: StatsSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(stats.total_users, 5);
        assert_eq!(stats.active_conversations_data.len(), 1);
        assert_eq!(stats.active_conversations_data[0].id, 7);
        assert_eq!(stats.active_conversations_data[0].duration_minutes, 3.0);
        assert!(stats.timestamp.is_some());
        assert!(stats.validate().is_ok());
    }

    #[test]
    fn test_negative_measure_rejected() {
        let stats = StatsSnapshot {
            total_users: 0,
            active_conversations: 0,
            waiting_users: 1,
            active_conversations_data: vec![],
            waiting_users_data: vec![WaitingUserSummary {
                id: 3,
                wait_time_minutes: -1.0,
                joined_at: Utc::now(),
            }],
            timestamp: None,
        };

        let err = stats.validate().unwrap_err();
        assert!(err.contains("wait_time_minutes"));
    }

    #[test]
    fn test_decode_recent_activity_extra_fields() {
        let body = r#"{
            "recent_messages": [
                {"id": 1, "conversation_id": 9, "message_preview": "hi", "sent_at": "2024-01-01T10:00:00", "message_type": "text"}
            ]
        }"#;

        let activity: RecentActivitySnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(activity.recent_messages[0].conversation_id, 9);
        assert_eq!(activity.recent_messages[0].message_type.as_deref(), Some("text"));
        assert!(activity.timestamp.is_none());
    }
}
