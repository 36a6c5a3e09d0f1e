//! # Liveboard
//!
//! Live dashboard synchronizer. Polls a pair of read-only endpoints and
//! reconciles the snapshots into numeric widgets and list views, pausing
//! while the view is hidden and keeping the last good view when a fetch
//! fails.
//!
//! ## Modules
//!
//! - [`controller`]: refresh cadence and visibility state machine
//! - [`fetch`]: HTTP snapshot fetching and validation
//! - [`render`]: list templates and widget updates
//! - [`notify`]: self-dismissing error banners
//! - [`view`]: the page capability and an in-memory page
//! - [`reconcile`]: pure update planning
//! - [`format`]: timestamps and HTML escaping
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use liveboard::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let fetcher = Arc::new(HttpFetcher::new(config.source.clone())?);
//!     let page = Arc::new(MemoryPage::dashboard());
//!
//!     let controller = PollingController::from_config(fetcher, page.clone(), &config)?;
//!     controller.initialize().await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//!     controller.teardown();
//!
//!     println!("{}", page.render_document());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod fetch;
pub mod format;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod render;
pub mod view;

pub use config::{
    generate_default_config, Config, ConfigError, DisplayConfig, LoggingConfig, PollingConfig,
    SourceConfig,
};

pub use controller::{
    ControllerError, CycleOutcome, CycleReport, CycleTrigger, LoadReport, PageEvent,
    PollState, PollingController, Visibility,
};

pub use fetch::{Dataset, FetchError, FetchErrorKind, FetchResult, HttpFetcher, SnapshotFetcher};

pub use format::{escape_text, DisplayZone, Formatter};

pub use model::{
    ConversationSummary, MessagePreview, RecentActivitySnapshot, StatsSnapshot, Timestamp,
    WaitingUserSummary,
};

pub use notify::{BannerId, ErrorNotifier};

pub use render::{ListRenderer, ListRow, RenderOutcome, TemplateKind};

pub use view::{FeatherGlyphs, GlyphPass, MemoryPage, NoGlyphs, ViewHost};
