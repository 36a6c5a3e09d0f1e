//! List Rendering
//!
//! Turns ordered records into container markup and pushes it, together with
//! numeric widget updates, through the [`ViewHost`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::format::{escape_text, format_measure, Formatter};
use crate::model::{ConversationSummary, MessagePreview, WaitingUserSummary};
use crate::reconcile::{self, WidgetChange};
use crate::view::{GlyphPass, ViewHost};

/// Rows shown in the recent messages list unless configured otherwise
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// How long a changed widget stays highlighted unless configured otherwise
pub const DEFAULT_HIGHLIGHT: Duration = Duration::from_millis(500);

/// Which template a list is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    ActiveConversation,
    WaitingUser,
    RecentMessage,
}

impl TemplateKind {
    /// Icon and message of the empty-state view
    pub fn empty_state(self) -> (&'static str, &'static str) {
        match self {
            TemplateKind::ActiveConversation => ("message-circle", "No active conversations"),
            TemplateKind::WaitingUser => ("users", "No users waiting"),
            TemplateKind::RecentMessage => ("message-square", "No recent messages"),
        }
    }

    /// Fixed markup shown when the list has no records
    pub fn empty_markup(self) -> String {
        let (icon, message) = self.empty_state();
        format!(
            "<div class=\"text-center py-4\">\
             <i data-feather=\"{}\" class=\"text-muted mb-2\"></i>\
             <p class=\"text-muted mb-0\">{}</p>\
             </div>",
            icon, message
        )
    }
}

/// A record that can be rendered as one list row
pub trait ListRow {
    const KIND: TemplateKind;

    fn render_row(&self, formatter: &Formatter) -> String;
}

impl ListRow for ConversationSummary {
    const KIND: TemplateKind = TemplateKind::ActiveConversation;

    fn render_row(&self, formatter: &Formatter) -> String {
        format!(
            "<div class=\"activity-item active mb-3\" data-conversation-id=\"{id}\">\
             <h6 class=\"mb-1\"><span class=\"live-indicator me-2\"></span>Conversation #{id}</h6>\
             <small class=\"text-muted\">\
             <i data-feather=\"clock\" width=\"12\" height=\"12\" class=\"me-1\"></i>{duration} minutes \
             <span class=\"ms-2\"><i data-feather=\"message-square\" width=\"12\" height=\"12\" class=\"me-1\"></i>{count} messages</span>\
             </small>\
             <small class=\"text-muted\">{time}</small>\
             </div>",
            id = self.id,
            duration = format_measure(self.duration_minutes),
            count = self.message_count,
            time = formatter.format_time(&self.started_at),
        )
    }
}

impl ListRow for WaitingUserSummary {
    const KIND: TemplateKind = TemplateKind::WaitingUser;

    fn render_row(&self, formatter: &Formatter) -> String {
        format!(
            "<div class=\"activity-item waiting mb-3\" data-user-id=\"{id}\">\
             <h6 class=\"mb-1\"><i data-feather=\"clock\" width=\"14\" height=\"14\" class=\"me-2\"></i>User #{id}</h6>\
             <small class=\"text-muted\">Waiting for {wait} minutes</small>\
             <small class=\"text-muted\">{time}</small>\
             </div>",
            id = self.id,
            wait = format_measure(self.wait_time_minutes),
            time = formatter.format_time(&self.joined_at),
        )
    }
}

impl ListRow for MessagePreview {
    const KIND: TemplateKind = TemplateKind::RecentMessage;

    fn render_row(&self, formatter: &Formatter) -> String {
        format!(
            "<div class=\"message-preview mb-3\" data-conversation-id=\"{id}\">\
             <small class=\"text-muted\"><i data-feather=\"hash\" width=\"12\" height=\"12\" class=\"me-1\"></i>Conversation {id}</small>\
             <small class=\"text-muted\">{time}</small>\
             <p class=\"mb-0 small\">{text}</p>\
             </div>",
            id = self.conversation_id,
            time = formatter.format_time(&self.sent_at),
            text = escape_text(&self.message_preview),
        )
    }
}

/// Render a list body.
///
/// Rows keep input order. `limit` keeps only the first `limit` records.
/// When no row would be shown the empty state is rendered.
pub fn render_markup<R: ListRow>(
    records: &[R],
    formatter: &Formatter,
    limit: Option<usize>,
) -> String {
    if visible_rows(records.len(), limit) == 0 {
        return R::KIND.empty_markup();
    }

    let take = limit.unwrap_or(records.len());
    records
        .iter()
        .take(take)
        .map(|record| record.render_row(formatter))
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_rows(len: usize, limit: Option<usize>) -> usize {
    limit.map_or(len, |limit| len.min(limit))
}

/// What a render call did to its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Rows were written
    Rendered { rows: usize },
    /// The empty-state view was written
    Empty,
    /// The container already showed exactly this content
    Unchanged,
    /// The container is not on the page
    Skipped,
}

/// Writes lists and widgets to the page
pub struct ListRenderer {
    view: Arc<dyn ViewHost>,
    glyphs: Arc<dyn GlyphPass>,
    formatter: Formatter,
    recent_limit: usize,
    highlight_for: Duration,
    /// Pending highlight-clear task per widget
    clears: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl ListRenderer {
    pub fn new(view: Arc<dyn ViewHost>, glyphs: Arc<dyn GlyphPass>, formatter: Formatter) -> Self {
        Self {
            view,
            glyphs,
            formatter,
            recent_limit: DEFAULT_RECENT_LIMIT,
            highlight_for: DEFAULT_HIGHLIGHT,
            clears: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn with_highlight_duration(mut self, duration: Duration) -> Self {
        self.highlight_for = duration;
        self
    }

    fn limit_for(&self, kind: TemplateKind) -> Option<usize> {
        match kind {
            TemplateKind::RecentMessage => Some(self.recent_limit),
            TemplateKind::ActiveConversation | TemplateKind::WaitingUser => None,
        }
    }

    /// Render `records` into `container_id`, then run the glyph pass.
    ///
    /// A missing container is a silent no-op.
    pub fn render<R: ListRow>(&self, container_id: &str, records: &[R]) -> RenderOutcome {
        let Some(displayed) = self.view.text(container_id) else {
            tracing::trace!(container = container_id, "Container absent, render skipped");
            return RenderOutcome::Skipped;
        };

        let markup = render_markup(records, &self.formatter, self.limit_for(R::KIND));
        if reconcile::list_unchanged(Some(&displayed), &self.glyphs.apply(&markup)) {
            return RenderOutcome::Unchanged;
        }

        if !self.view.write(container_id, &markup) {
            return RenderOutcome::Skipped;
        }
        self.view.apply_glyphs(self.glyphs.as_ref());

        match visible_rows(records.len(), self.limit_for(R::KIND)) {
            0 => RenderOutcome::Empty,
            rows => RenderOutcome::Rendered { rows },
        }
    }

    /// Set a numeric widget, pulsing it when the displayed text changes.
    ///
    /// Returns `None` when the widget is not on the page.
    pub fn update_element(&self, id: &str, value: &str) -> Option<WidgetChange> {
        let previous = self.view.text(id)?;
        let change = reconcile::plan_widget(&previous, value);

        self.view.set_text(id, &change.text);
        if change.highlight {
            self.pulse(id);
        }

        Some(change)
    }

    /// Highlight `id` for the configured duration. A newer pulse restarts
    /// the countdown.
    fn pulse(&self, id: &str) {
        self.view.set_highlight(id, true);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let view = Arc::clone(&self.view);
                let widget = id.to_string();
                let delay = self.highlight_for;
                let clear = handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    view.set_highlight(&widget, false);
                });

                let mut clears = self.clears.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(previous) = clears.insert(id.to_string(), clear) {
                    previous.abort();
                }
            }
            Err(_) => {
                tracing::debug!(widget = id, "No runtime to clear highlight; clearing now");
                self.view.set_highlight(id, false);
            }
        }
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }
}
