//! Polling Controller
//!
//! Owns the refresh cadence and the visibility-driven pause/resume cycle.
//!
//! ## Lifecycle
//!
//! 1. [`PollingController::initialize`] arms the timer and runs one combined
//!    load: stats (widgets and both lists) followed by recent activity.
//! 2. Every tick refreshes stats only. Recent activity is loaded once.
//! 3. `Hidden` disarms the timer, `Visible` re-arms it.
//! 4. [`PollingController::teardown`] (or dropping the controller) disarms it
//!    for good.
//!
//! A failed cycle is logged, shown once as a banner and otherwise ignored:
//! the timer stays armed and the next tick tries again.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::{Config, PollingConfig};
use crate::fetch::{Dataset, FetchError, FetchErrorKind, SnapshotFetcher};
use crate::format::Formatter;
use crate::model::{RecentActivitySnapshot, StatsSnapshot};
use crate::notify::ErrorNotifier;
use crate::reconcile;
use crate::render::ListRenderer;
use crate::view::{
    FeatherGlyphs, GlyphPass, NoGlyphs, ViewHost, ACTIVE_CONVERSATIONS_LIST, RECENT_MESSAGES_LIST,
    WAITING_USERS_LIST,
};

/// Page visibility as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Page lifecycle events the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    VisibilityChanged(Visibility),
    Unload,
}

/// Observable polling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    pub timer_armed: bool,
    pub interval: Duration,
    pub visible: bool,
}

/// What started a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    Initial,
    Timer,
}

/// Result of one dataset refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The snapshot was reconciled into the page
    Applied,
    /// The fetch failed; the page was left as it was
    Failed(FetchErrorKind),
    /// The tick was dropped because the previous cycle was still running
    Skipped,
}

/// Published after every refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub dataset: Dataset,
    pub trigger: CycleTrigger,
    pub outcome: CycleOutcome,
}

/// Outcome of the initial combined load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub stats: CycleOutcome,
    pub recent_activity: CycleOutcome,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Controller already initialized")]
    AlreadyInitialized,

    #[error("Polling interval must be greater than zero")]
    ZeroInterval,
}

const REPORT_CAPACITY: usize = 64;

/// State shared with the timer task and the cycles it spawns
struct Shared {
    fetcher: Arc<dyn SnapshotFetcher>,
    renderer: ListRenderer,
    notifier: ErrorNotifier,
    skip_overlapping: bool,
    /// Stats refreshes currently running, initial load included
    in_flight: AtomicUsize,
    ticks: AtomicU64,
    reports: broadcast::Sender<CycleReport>,
}

/// Releases one in-flight claim when a refresh ends, however it ends
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Shared {
    async fn refresh_stats(&self, trigger: CycleTrigger) -> CycleOutcome {
        let outcome = match self.fetcher.fetch_stats().await {
            Ok(stats) => {
                self.apply_stats(&stats);
                CycleOutcome::Applied
            }
            Err(e) => self.report_failure(&e),
        };
        self.publish(Dataset::Stats, trigger, outcome);
        outcome
    }

    async fn refresh_recent_activity(&self, trigger: CycleTrigger) -> CycleOutcome {
        let outcome = match self.fetcher.fetch_recent_activity().await {
            Ok(activity) => {
                self.apply_recent_activity(&activity);
                CycleOutcome::Applied
            }
            Err(e) => self.report_failure(&e),
        };
        self.publish(Dataset::RecentActivity, trigger, outcome);
        outcome
    }

    fn apply_stats(&self, stats: &StatsSnapshot) {
        let changed = reconcile::stats_widgets(stats)
            .into_iter()
            .filter_map(|(id, value)| self.renderer.update_element(id, &value))
            .filter(|change| change.highlight)
            .count();

        let active = self
            .renderer
            .render(ACTIVE_CONVERSATIONS_LIST, &stats.active_conversations_data);
        let waiting = self
            .renderer
            .render(WAITING_USERS_LIST, &stats.waiting_users_data);

        tracing::debug!(
            total_users = stats.total_users,
            widgets_changed = changed,
            active = ?active,
            waiting = ?waiting,
            "Stats reconciled"
        );
    }

    fn apply_recent_activity(&self, activity: &RecentActivitySnapshot) {
        let outcome = self
            .renderer
            .render(RECENT_MESSAGES_LIST, &activity.recent_messages);
        tracing::debug!(
            messages = activity.recent_messages.len(),
            outcome = ?outcome,
            "Recent activity reconciled"
        );
    }

    fn report_failure(&self, err: &FetchError) -> CycleOutcome {
        tracing::warn!(
            dataset = %err.dataset,
            kind = %err.kind,
            error = %err.message,
            "Refresh failed, keeping current view"
        );
        self.notifier.notify(err.dataset.failure_message());
        CycleOutcome::Failed(err.kind)
    }

    fn publish(&self, dataset: Dataset, trigger: CycleTrigger, outcome: CycleOutcome) {
        // No subscribers is fine
        let _ = self.reports.send(CycleReport {
            dataset,
            trigger,
            outcome,
        });
    }

    /// Claim the stats refresh only if nothing else holds it
    fn try_claim(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Claim the stats refresh unconditionally
    fn claim(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn timer_cycle(self: Arc<Self>) {
        let _guard = if self.skip_overlapping {
            let Some(guard) = self.try_claim() else {
                tracing::debug!("Previous refresh still running, skipping tick");
                self.publish(Dataset::Stats, CycleTrigger::Timer, CycleOutcome::Skipped);
                return;
            };
            Some(guard)
        } else {
            None
        };

        self.refresh_stats(CycleTrigger::Timer).await;
    }
}

/// Drives periodic refreshes of the dashboard
pub struct PollingController {
    shared: Arc<Shared>,
    interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
    visible: AtomicBool,
    initialized: AtomicBool,
}

impl PollingController {
    /// Create a controller. Nothing runs until [`initialize`](Self::initialize)
    /// or [`start_polling`](Self::start_polling).
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        renderer: ListRenderer,
        notifier: ErrorNotifier,
        config: &PollingConfig,
    ) -> Result<Self, ControllerError> {
        if config.interval().is_zero() {
            return Err(ControllerError::ZeroInterval);
        }
        let (reports, _) = broadcast::channel(REPORT_CAPACITY);

        Ok(Self {
            shared: Arc::new(Shared {
                fetcher,
                renderer,
                notifier,
                skip_overlapping: config.skip_overlapping_cycles,
                in_flight: AtomicUsize::new(0),
                ticks: AtomicU64::new(0),
                reports,
            }),
            interval: config.interval(),
            timer: Mutex::new(None),
            visible: AtomicBool::new(true),
            initialized: AtomicBool::new(false),
        })
    }

    /// Wire renderer and notifier from a full configuration
    pub fn from_config(
        fetcher: Arc<dyn SnapshotFetcher>,
        view: Arc<dyn ViewHost>,
        config: &Config,
    ) -> Result<Self, ControllerError> {
        let glyphs: Arc<dyn GlyphPass> = if config.display.glyphs {
            Arc::new(FeatherGlyphs)
        } else {
            Arc::new(NoGlyphs)
        };
        let formatter = Formatter::new(config.display_zone().unwrap_or_default());

        let renderer = ListRenderer::new(Arc::clone(&view), Arc::clone(&glyphs), formatter)
            .with_recent_limit(config.polling.recent_messages_limit)
            .with_highlight_duration(config.polling.highlight());
        let notifier =
            ErrorNotifier::new(view, glyphs).with_dismiss_after(config.polling.notification());

        Self::new(fetcher, renderer, notifier, &config.polling)
    }

    /// Arm the timer and run the initial combined load.
    ///
    /// Only the first call does anything.
    pub async fn initialize(&self) -> Result<LoadReport, ControllerError> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ControllerError::AlreadyInitialized);
        }

        self.visible.store(true, Ordering::SeqCst);
        self.start_polling();

        let report = self.load_all().await;
        tracing::info!(
            stats = ?report.stats,
            recent_activity = ?report.recent_activity,
            "Initial load finished"
        );
        Ok(report)
    }

    /// Stats then recent activity. Each dataset succeeds or fails on its own.
    ///
    /// With the overlap guard on, ticks during the stats part are skipped.
    pub async fn load_all(&self) -> LoadReport {
        let stats = {
            let _guard = self.shared.skip_overlapping.then(|| self.shared.claim());
            self.shared.refresh_stats(CycleTrigger::Initial).await
        };
        let recent_activity = self
            .shared
            .refresh_recent_activity(CycleTrigger::Initial)
            .await;

        LoadReport {
            stats,
            recent_activity,
        }
    }

    /// (Re)arm the repeating stats refresh. Any armed timer is disarmed first.
    pub fn start_polling(&self) {
        let mut timer = self.lock_timer();
        if let Some(previous) = timer.take() {
            previous.abort();
            tracing::debug!("Disarmed previous timer");
        }

        *timer = Some(self.arm());
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Polling started");
    }

    /// Disarm the timer. Returns whether one was armed.
    ///
    /// A cycle already in flight runs to completion.
    pub fn stop_polling(&self) -> bool {
        match self.lock_timer().take() {
            Some(handle) => {
                handle.abort();
                tracing::info!("Polling stopped");
                true
            }
            None => false,
        }
    }

    /// Pause while hidden, resume when visible again
    pub fn on_visibility_change(&self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden => {
                self.visible.store(false, Ordering::SeqCst);
                self.stop_polling();
            }
            Visibility::Visible => {
                self.visible.store(true, Ordering::SeqCst);
                self.start_polling();
            }
        }
    }

    /// Page is going away
    pub fn teardown(&self) {
        self.stop_polling();
        tracing::debug!("Controller torn down");
    }

    /// Feed page events to the handlers until `Unload` or the sender closes
    pub async fn run_events(&self, mut events: mpsc::Receiver<PageEvent>) {
        while let Some(event) = events.recv().await {
            tracing::debug!(?event, "Page event");
            match event {
                PageEvent::VisibilityChanged(visibility) => self.on_visibility_change(visibility),
                PageEvent::Unload => {
                    self.teardown();
                    return;
                }
            }
        }
        self.teardown();
    }

    /// Receive a report after every refresh
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.shared.reports.subscribe()
    }

    pub fn poll_state(&self) -> PollState {
        PollState {
            timer_armed: self.lock_timer().is_some(),
            interval: self.interval,
            visible: self.visible.load(Ordering::SeqCst),
        }
    }

    /// Timer ticks observed since creation, across re-arms
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::SeqCst)
    }

    fn arm(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                shared.ticks.fetch_add(1, Ordering::SeqCst);
                // Cycles run detached so a slow fetch never delays the ticker
                tokio::spawn(Arc::clone(&shared).timer_cycle());
            }
        })
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::scripted::{self, ScriptedFetcher};
    use crate::fetch::{decode, FetchResult};
    use crate::format::DisplayZone;
    use crate::render::TemplateKind;
    use crate::view::{MemoryPage, TOTAL_USERS, WAITING_COUNT};

    const E2E_STATS: &str = r#"{"total_users":5,"active_conversations":2,"waiting_users":1,"active_conversations_data":[{"id":7,"duration_minutes":3,"message_count":4,"started_at":"2024-01-01T10:00:00Z"}],"waiting_users_data":[]}"#;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller_with(
        fetcher: &Arc<ScriptedFetcher>,
        page: &Arc<MemoryPage>,
        config: PollingConfig,
    ) -> PollingController {
        let glyphs: Arc<dyn GlyphPass> = Arc::new(NoGlyphs);
        let formatter = Formatter::new(DisplayZone::parse("utc").unwrap());
        let renderer = ListRenderer::new(page.clone(), glyphs.clone(), formatter);
        let notifier = ErrorNotifier::new(page.clone(), glyphs);
        PollingController::new(fetcher.clone(), renderer, notifier, &config).unwrap()
    }

    fn controller(fetcher: &Arc<ScriptedFetcher>, page: &Arc<MemoryPage>) -> PollingController {
        controller_with(fetcher, page, PollingConfig::default())
    }

    fn ok_fetcher() -> Arc<ScriptedFetcher> {
        Arc::new(ScriptedFetcher::new(
            Ok(scripted::stats(3, &[1], &[2])),
            Ok(scripted::activity(&["hello"])),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_stats_body() {
        let stats: FetchResult<StatsSnapshot> = decode(Dataset::Stats, E2E_STATS.as_bytes());
        let fetcher = Arc::new(ScriptedFetcher::new(stats, Ok(scripted::activity(&[]))));
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);

        let report = controller.initialize().await.unwrap();
        assert_eq!(report.stats, CycleOutcome::Applied);

        assert_eq!(page.content(TOTAL_USERS).unwrap(), "5");
        assert_eq!(page.content(WAITING_COUNT).unwrap(), "1");

        let active = page.content(ACTIVE_CONVERSATIONS_LIST).unwrap();
        assert_eq!(active.matches("class=\"activity-item active").count(), 1);
        assert!(active.contains("Conversation #7"));

        assert_eq!(
            page.content(WAITING_USERS_LIST).unwrap(),
            TemplateKind::WaitingUser.empty_markup()
        );
        assert_eq!(
            page.content(RECENT_MESSAGES_LIST).unwrap(),
            TemplateKind::RecentMessage.empty_markup()
        );
        assert!(page.banners().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_failure_isolated() {
        let fetcher = Arc::new(ScriptedFetcher::new(
            Err(scripted::server_error(Dataset::Stats)),
            Ok(scripted::activity(&["fresh message"])),
        ));
        let page = Arc::new(
            MemoryPage::dashboard()
                .with_widget(TOTAL_USERS, "41")
                .with_container(ACTIVE_CONVERSATIONS_LIST, "<p>prior active</p>")
                .with_container(WAITING_USERS_LIST, "<p>prior waiting</p>")
                .with_container(RECENT_MESSAGES_LIST, "<p>prior recent</p>"),
        );
        let controller = controller(&fetcher, &page);

        let report = controller.initialize().await.unwrap();
        assert_eq!(report.stats, CycleOutcome::Failed(FetchErrorKind::Transport));
        assert_eq!(report.recent_activity, CycleOutcome::Applied);

        assert_eq!(page.content(TOTAL_USERS).unwrap(), "41");
        assert_eq!(page.content(ACTIVE_CONVERSATIONS_LIST).unwrap(), "<p>prior active</p>");
        assert_eq!(page.content(WAITING_USERS_LIST).unwrap(), "<p>prior waiting</p>");
        assert!(page
            .content(RECENT_MESSAGES_LIST)
            .unwrap()
            .contains("fresh message"));

        let banners = page.banners();
        assert_eq!(banners.len(), 1);
        assert!(banners[0].markup.contains("Failed to update statistics"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_twice_rejected() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);

        controller.initialize().await.unwrap();
        assert_eq!(
            controller.initialize().await,
            Err(ControllerError::AlreadyInitialized)
        );
        assert_eq!(fetcher.stats_calls(), 1);

        tokio::time::sleep(ms(5_001)).await;
        assert_eq!(fetcher.stats_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_single_timer() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);

        controller.start_polling();
        controller.start_polling();

        tokio::time::sleep(ms(4_999)).await;
        assert_eq!(fetcher.stats_calls(), 0);

        tokio::time::sleep(ms(2)).await;
        assert_eq!(fetcher.stats_calls(), 1);

        tokio::time::sleep(ms(5_000)).await;
        assert_eq!(fetcher.stats_calls(), 2);
        assert_eq!(controller.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_refresh_stats_only() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);

        controller.initialize().await.unwrap();
        tokio::time::sleep(ms(15_001)).await;

        assert_eq!(fetcher.stats_calls(), 4);
        assert_eq!(fetcher.activity_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_gating() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);

        controller.initialize().await.unwrap();
        assert_eq!(fetcher.stats_calls(), 1);

        controller.on_visibility_change(Visibility::Hidden);
        let state = controller.poll_state();
        assert!(!state.timer_armed);
        assert!(!state.visible);

        tokio::time::sleep(ms(30_000)).await;
        assert_eq!(fetcher.stats_calls(), 1);

        controller.on_visibility_change(Visibility::Visible);
        assert!(controller.poll_state().timer_armed);

        tokio::time::sleep(ms(4_999)).await;
        assert_eq!(fetcher.stats_calls(), 1);
        tokio::time::sleep(ms(2)).await;
        assert_eq!(fetcher.stats_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_polling() {
        let fetcher = Arc::new(ScriptedFetcher::new(
            Err(scripted::server_error(Dataset::Stats)),
            Ok(scripted::activity(&[])),
        ));
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);

        controller.initialize().await.unwrap();
        tokio::time::sleep(ms(5_001)).await;
        assert_eq!(fetcher.stats_calls(), 2);
        assert!(controller.poll_state().timer_armed);
        assert_eq!(page.content(TOTAL_USERS).unwrap(), "0");

        fetcher.set_stats(Ok(scripted::stats(9, &[], &[])));
        tokio::time::sleep(ms(5_000)).await;
        assert_eq!(page.content(TOTAL_USERS).unwrap(), "9");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_tick_skipped() {
        let fetcher = ok_fetcher();
        fetcher.set_delay(ms(12_000));
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);
        let mut reports = controller.subscribe();

        controller.start_polling();
        tokio::time::sleep(ms(15_001)).await;
        assert_eq!(controller.ticks(), 3);
        assert_eq!(fetcher.stats_calls(), 1);

        let skipped = std::iter::from_fn(|| reports.try_recv().ok())
            .filter(|r| r.outcome == CycleOutcome::Skipped)
            .count();
        assert_eq!(skipped, 2);

        // First cycle finished at 17s, the 20s tick runs again
        tokio::time::sleep(ms(5_000)).await;
        assert_eq!(fetcher.stats_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_during_initial_load_skipped() {
        let fetcher = ok_fetcher();
        fetcher.set_delay(ms(7_000));
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);
        let mut reports = controller.subscribe();

        // The 5s tick lands while the initial stats fetch is still running
        controller.initialize().await.unwrap();
        assert_eq!(controller.ticks(), 1);
        assert_eq!(fetcher.stats_calls(), 1);

        let skipped: Vec<_> = std::iter::from_fn(|| reports.try_recv().ok())
            .filter(|r| r.outcome == CycleOutcome::Skipped)
            .collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].trigger, CycleTrigger::Timer);

        tokio::time::sleep(ms(3_001)).await;
        assert_eq!(fetcher.stats_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());
        let glyphs: Arc<dyn GlyphPass> = Arc::new(NoGlyphs);
        let renderer = ListRenderer::new(page.clone(), glyphs.clone(), Formatter::default());
        let notifier = ErrorNotifier::new(page.clone(), glyphs);
        let config = PollingConfig {
            interval_ms: 0,
            ..PollingConfig::default()
        };

        let result = PollingController::new(fetcher.clone(), renderer, notifier, &config);
        assert!(matches!(result, Err(ControllerError::ZeroInterval)));

        let mut full = Config::default();
        full.polling.interval_ms = 0;
        let result = PollingController::from_config(fetcher.clone(), page.clone(), &full);
        assert!(matches!(result, Err(ControllerError::ZeroInterval)));
        assert_eq!(fetcher.stats_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlap_allowed_without_guard() {
        let fetcher = ok_fetcher();
        fetcher.set_delay(ms(12_000));
        let page = Arc::new(MemoryPage::dashboard());
        let config = PollingConfig {
            skip_overlapping_cycles: false,
            ..PollingConfig::default()
        };
        let controller = controller_with(&fetcher, &page, config);

        controller.start_polling();
        tokio::time::sleep(ms(15_001)).await;
        assert_eq!(fetcher.stats_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_cycle_finish() {
        let fetcher = Arc::new(ScriptedFetcher::new(
            Ok(scripted::stats(8, &[], &[])),
            Ok(scripted::activity(&[])),
        ));
        fetcher.set_delay(ms(2_000));
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);

        controller.start_polling();
        tokio::time::sleep(ms(5_001)).await;
        assert_eq!(fetcher.stats_calls(), 1);

        assert!(controller.stop_polling());
        assert!(!controller.stop_polling());

        tokio::time::sleep(ms(2_000)).await;
        assert_eq!(page.content(TOTAL_USERS).unwrap(), "8");

        tokio::time::sleep(ms(10_000)).await;
        assert_eq!(fetcher.stats_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_and_drop_disarm() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());

        let controller = controller(&fetcher, &page);
        controller.initialize().await.unwrap();
        controller.teardown();
        assert!(!controller.poll_state().timer_armed);
        tokio::time::sleep(ms(20_000)).await;
        assert_eq!(fetcher.stats_calls(), 1);

        let dropped = controller_with(&fetcher, &page, PollingConfig::default());
        dropped.start_polling();
        drop(dropped);
        tokio::time::sleep(ms(20_000)).await;
        assert_eq!(fetcher.stats_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_events() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);
        controller.initialize().await.unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(PageEvent::VisibilityChanged(Visibility::Hidden)).await.unwrap();
        tx.send(PageEvent::VisibilityChanged(Visibility::Visible)).await.unwrap();
        tx.send(PageEvent::Unload).await.unwrap();

        controller.run_events(rx).await;

        let state = controller.poll_state();
        assert!(!state.timer_armed);
        assert!(state.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_published() {
        let fetcher = ok_fetcher();
        let page = Arc::new(MemoryPage::dashboard());
        let controller = controller(&fetcher, &page);
        let mut reports = controller.subscribe();

        controller.initialize().await.unwrap();

        let first = reports.recv().await.unwrap();
        assert_eq!(first.dataset, Dataset::Stats);
        assert_eq!(first.trigger, CycleTrigger::Initial);
        let second = reports.recv().await.unwrap();
        assert_eq!(second.dataset, Dataset::RecentActivity);

        tokio::time::sleep(ms(5_001)).await;
        let tick = reports.recv().await.unwrap();
        assert_eq!(tick.trigger, CycleTrigger::Timer);
        assert_eq!(tick.outcome, CycleOutcome::Applied);
    }
}
