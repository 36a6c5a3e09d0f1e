//! Error Notifications
//!
//! Transient banners for failed refresh cycles. Every call produces its own
//! banner with its own removal timer; nothing is queued or deduplicated.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::format::escape_text;
use crate::view::{GlyphPass, ViewHost};

/// How long a banner stays up unless configured otherwise
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(5000);

/// Identifier of an inserted banner
pub type BannerId = String;

/// Inserts self-dismissing warning banners
pub struct ErrorNotifier {
    view: Arc<dyn ViewHost>,
    glyphs: Arc<dyn GlyphPass>,
    dismiss_after: Duration,
}

impl ErrorNotifier {
    pub fn new(view: Arc<dyn ViewHost>, glyphs: Arc<dyn GlyphPass>) -> Self {
        Self {
            view,
            glyphs,
            dismiss_after: DEFAULT_DISMISS_AFTER,
        }
    }

    pub fn with_dismiss_after(mut self, duration: Duration) -> Self {
        self.dismiss_after = duration;
        self
    }

    /// Show `message` in a new banner and schedule its removal
    pub fn notify(&self, message: &str) -> BannerId {
        let id = format!("alert-{}", Uuid::new_v4());

        self.view.push_banner(&id, &banner_markup(&id, message));
        self.view.apply_glyphs(self.glyphs.as_ref());
        tracing::debug!(banner = %id, "Error banner shown");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let view = Arc::clone(&self.view);
                let banner = id.clone();
                let delay = self.dismiss_after;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if view.remove_banner(&banner) {
                        tracing::trace!(banner = %banner, "Error banner expired");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(banner = %id, "No runtime, banner will stay until dismissed");
            }
        }

        id
    }

    /// User dismissal. Safe after the banner already expired.
    pub fn dismiss(&self, id: &str) -> bool {
        self.view.remove_banner(id)
    }
}

fn banner_markup(id: &str, message: &str) -> String {
    format!(
        "<div id=\"{}\" class=\"alert alert-warning alert-dismissible fade show position-fixed\" \
         style=\"top: 20px; right: 20px; z-index: 1050; min-width: 300px;\">\
         <i data-feather=\"alert-triangle\" class=\"me-2\"></i>{}\
         <button type=\"button\" class=\"btn-close\" data-bs-dismiss=\"alert\"></button>\
         </div>",
        id,
        escape_text(message)
    )
}
