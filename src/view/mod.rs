//! Render Targets
//!
//! The synchronizer never touches a real page. Everything it displays goes
//! through the [`ViewHost`] capability, addressed by stable element ids.
//!
//! ## Page structure
//!
//! Numeric widgets hold plain text and may be highlighted:
//! - `total-users`
//! - `active-conversations`, `active-count`
//! - `waiting-users`, `waiting-count`
//!
//! List containers hold markup:
//! - `active-conversations-list`
//! - `waiting-users-list`
//! - `recent-messages-list`
//!
//! Banners are appended to the document body under generated ids.

mod glyphs;
mod page;

pub use glyphs::{FeatherGlyphs, GlyphPass, NoGlyphs};
pub use page::{Banner, MemoryPage};

pub const TOTAL_USERS: &str = "total-users";
pub const ACTIVE_CONVERSATIONS: &str = "active-conversations";
pub const ACTIVE_COUNT: &str = "active-count";
pub const WAITING_USERS: &str = "waiting-users";
pub const WAITING_COUNT: &str = "waiting-count";

pub const ACTIVE_CONVERSATIONS_LIST: &str = "active-conversations-list";
pub const WAITING_USERS_LIST: &str = "waiting-users-list";
pub const RECENT_MESSAGES_LIST: &str = "recent-messages-list";

/// Capability interface over the host page
///
/// Methods take `&self`; implementations provide their own interior
/// mutability so one host can be shared between the controller, the
/// notifier and spawned timers.
pub trait ViewHost: Send + Sync {
    /// Displayed text of an element, `None` if the page has no such element
    fn text(&self, id: &str) -> Option<String>;

    /// Replace an element's text. Returns `false` if the element is absent.
    fn set_text(&self, id: &str, text: &str) -> bool;

    /// Replace a container's markup. Returns `false` if the container is absent.
    fn write(&self, container_id: &str, content: &str) -> bool;

    /// Toggle the change highlight on an element. Absent elements are ignored.
    fn set_highlight(&self, id: &str, on: bool);

    /// Append a banner to the document body
    fn push_banner(&self, banner_id: &str, markup: &str);

    /// Remove a banner. Returns `false` if it was already gone.
    fn remove_banner(&self, banner_id: &str) -> bool;

    /// Run the glyph pass over the whole document
    fn apply_glyphs(&self, glyphs: &dyn GlyphPass);
}
