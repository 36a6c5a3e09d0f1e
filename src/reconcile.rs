//! Reconciliation Planning
//!
//! Pure functions deciding what a snapshot changes on the page. They take
//! the currently displayed state and a snapshot and describe the update;
//! applying it is left to [`crate::render::ListRenderer`].

use crate::model::StatsSnapshot;
use crate::view;

/// Planned update of one numeric widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetChange {
    /// Text to display
    pub text: String,
    /// Whether the change pulse should fire
    pub highlight: bool,
}

/// Plan a widget update.
///
/// The pulse fires exactly when the displayed text differs from the new
/// value as strings; `"12"` → `"12"` is quiet, `"12"` → `"13"` is not.
pub fn plan_widget(previous: &str, value: &str) -> WidgetChange {
    WidgetChange {
        text: value.to_string(),
        highlight: previous != value,
    }
}

/// Widget values carried by a stats snapshot, in update order.
///
/// Active and waiting counters each appear in two places on the page.
pub fn stats_widgets(stats: &StatsSnapshot) -> Vec<(&'static str, String)> {
    vec![
        (view::TOTAL_USERS, stats.total_users.to_string()),
        (view::ACTIVE_CONVERSATIONS, stats.active_conversations.to_string()),
        (view::WAITING_USERS, stats.waiting_users.to_string()),
        (view::ACTIVE_COUNT, stats.active_conversations.to_string()),
        (view::WAITING_COUNT, stats.waiting_users.to_string()),
    ]
}

/// Whether freshly rendered markup would leave a container as it is.
///
/// `rendered` must already have been through the glyph pass, since that is
/// the form the page holds.
pub fn list_unchanged(displayed: Option<&str>, rendered: &str) -> bool {
    displayed == Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total: u64, active: u64, waiting: u64) -> StatsSnapshot {
        StatsSnapshot {
            total_users: total,
            active_conversations: active,
            waiting_users: waiting,
            active_conversations_data: vec![],
            waiting_users_data: vec![],
            timestamp: None,
        }
    }

    #[test]
    fn test_highlight_on_change() {
        let change = plan_widget("12", "13");
        assert_eq!(change.text, "13");
        assert!(change.highlight);
    }

    #[test]
    fn test_no_highlight_when_equal() {
        let change = plan_widget("12", "12");
        assert_eq!(change.text, "12");
        assert!(!change.highlight);
    }

    #[test]
    fn test_highlight_uses_exact_strings() {
        assert!(plan_widget("12 ", "12").highlight);
        assert!(plan_widget("012", "12").highlight);
        assert!(plan_widget("", "0").highlight);
    }

    #[test]
    fn test_stats_widgets_order_and_duplicates() {
        let widgets = stats_widgets(&stats(5, 2, 1));
        assert_eq!(
            widgets,
            vec![
                (view::TOTAL_USERS, "5".to_string()),
                (view::ACTIVE_CONVERSATIONS, "2".to_string()),
                (view::WAITING_USERS, "1".to_string()),
                (view::ACTIVE_COUNT, "2".to_string()),
                (view::WAITING_COUNT, "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_unchanged() {
        assert!(list_unchanged(Some("<p>a</p>"), "<p>a</p>"));
        assert!(!list_unchanged(Some("<p>a</p>"), "<p>b</p>"));
        assert!(!list_unchanged(None, ""));
    }
}
