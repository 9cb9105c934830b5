//! Change-triggered scan scheduling.
//!
//! Bursts of change notifications (autosave, find-and-replace) collapse into
//! one scan per quiescence window. [`DebounceState`] is the pure state
//! machine; [`Scheduler`] drives it from a tokio task.
//!
//! ```text
//!            change               change (timer reset, scope overwritten)
//!   ┌──────┐ ──────▶ ┌────────────┐ ◀──┐
//!   │ Idle │         │ PendingRun │ ───┘
//!   └──────┘ ◀────── └────────────┘
//!            expiry: run scan once
//! ```
//!
//! A scan that is already running is never cancelled. A change arriving
//! during it starts a fresh window, so two scans may overlap; merges are
//! idempotent, so the outcome is the same.

use crate::config::{ChangeScope, SiblingConfig};
use crate::traits::ScanRunner;
use crate::types::{ChangeEvent, ScanScope};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, trace};

/// A scan waiting for its quiescence window to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRun {
    deadline: Instant,
    scope: ScanScope,
}

/// Idle / PendingRun debounce state machine.
///
/// Time is always passed in, so the machine can be exercised with arbitrary
/// instants.
#[derive(Debug, Default)]
pub struct DebounceState {
    pending: Option<PendingRun>,
}

impl DebounceState {
    /// Create an idle state machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no run is pending.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Record a qualifying change: (re)start the timer and remember `scope`,
    /// replacing any previously remembered scope.
    pub fn record(&mut self, scope: ScanScope, now: Instant, window: Duration) {
        self.pending = Some(PendingRun {
            deadline: now + window,
            scope,
        });
    }

    /// When the pending run is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Scope of the pending run, if any.
    pub fn pending_scope(&self) -> Option<&ScanScope> {
        self.pending.as_ref().map(|p| &p.scope)
    }

    /// Return to idle and hand back the scope if the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<ScanScope> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => self.pending.take().map(|p| p.scope),
            _ => None,
        }
    }

    /// Return to idle immediately, handing back any pending scope.
    pub fn flush(&mut self) -> Option<ScanScope> {
        self.pending.take().map(|p| p.scope)
    }
}

/// Scheduler parameters taken from a configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Quiescence window.
    pub window: Duration,
    /// What a change notification scans.
    pub change_scope: ChangeScope,
    /// Extension of documents whose changes qualify.
    pub text_extension: String,
}

impl SchedulerSettings {
    /// Settings from a configuration snapshot. An out-of-range window is
    /// clamped.
    pub fn from_config(config: &SiblingConfig) -> Self {
        Self {
            window: config.quiescence_clamped(),
            change_scope: config.change_scope,
            text_extension: config.text_extension.clone(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_config(&SiblingConfig::default())
    }
}

#[derive(Debug)]
enum Command {
    Changed(ChangeEvent),
    Reconfigure(SchedulerSettings),
    Shutdown,
}

/// Cloneable sender side of a running [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Report a document change. Returns `false` if the scheduler has stopped.
    pub fn notify_changed(&self, event: ChangeEvent) -> bool {
        self.tx.send(Command::Changed(event)).is_ok()
    }

    /// Apply new settings to subsequent notifications.
    pub fn reconfigure(&self, settings: SchedulerSettings) -> bool {
        self.tx.send(Command::Reconfigure(settings)).is_ok()
    }
}

/// Debounced scan scheduler running on the tokio runtime.
pub struct Scheduler {
    handle: SchedulerHandle,
    task: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the scheduler task.
    pub fn spawn(runner: Arc<dyn ScanRunner>, settings: SchedulerSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = SchedulerTask {
            rx,
            runner,
            settings,
            state: DebounceState::new(),
            in_flight: JoinSet::new(),
        };
        info!("Starting scan scheduler");
        Self {
            handle: SchedulerHandle { tx },
            task: tokio::spawn(task.run()),
        }
    }

    /// Handle for sending notifications.
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Stop accepting notifications, run any pending scan immediately and
    /// wait for in-flight scans to finish.
    pub async fn shutdown(self) {
        let _ = self.handle.tx.send(Command::Shutdown);
        if let Err(err) = self.task.await {
            error!("Scheduler task failed: {}", err);
        }
    }
}

struct SchedulerTask {
    rx: mpsc::UnboundedReceiver<Command>,
    runner: Arc<dyn ScanRunner>,
    settings: SchedulerSettings,
    state: DebounceState,
    in_flight: JoinSet<bool>,
}

impl SchedulerTask {
    async fn run(mut self) {
        loop {
            let deadline = self.state.deadline();
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(Command::Changed(event)) => self.on_change(event),
                    Some(Command::Reconfigure(settings)) => {
                        debug!(?settings, "Scheduler reconfigured");
                        self.settings = settings;
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = wait_for(deadline) => {
                    if let Some(scope) = self.state.take_due(Instant::now()) {
                        self.launch(scope);
                    }
                }
                Some(result) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    log_outcome(result);
                }
            }
        }

        if let Some(scope) = self.state.flush() {
            debug!(%scope, "Flushing pending scan on shutdown");
            self.launch(scope);
        }
        while let Some(result) = self.in_flight.join_next().await {
            log_outcome(result);
        }
        info!("Scan scheduler stopped");
    }

    fn on_change(&mut self, event: ChangeEvent) {
        if !event.qualifies(&self.settings.text_extension) {
            trace!(document = %event.id, kind = ?event.kind, "Ignoring change");
            return;
        }

        let scope = match self.settings.change_scope {
            ChangeScope::Document => ScanScope::Document(event.id),
            ChangeScope::Vault => ScanScope::Vault,
        };
        trace!(%scope, "Change recorded, timer reset");
        self.state
            .record(scope, Instant::now(), self.settings.window);
    }

    fn launch(&mut self, scope: ScanScope) {
        debug!(%scope, "Quiescence window elapsed, starting scan");
        let runner = Arc::clone(&self.runner);
        self.in_flight
            .spawn(async move { runner.run_scan(scope).await });
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn log_outcome(result: Result<bool, tokio::task::JoinError>) {
    match result {
        Ok(changed) => debug!(changed, "Scheduled scan finished"),
        Err(err) => error!("Scheduled scan panicked: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mocks::CountingRunner;
    use crate::types::{ChangeKind, DocumentId};

    const WINDOW: Duration = Duration::from_millis(1000);

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            window: WINDOW,
            change_scope: ChangeScope::Document,
            text_extension: "md".to_string(),
        }
    }

    fn doc(path: &str) -> ScanScope {
        ScanScope::Document(DocumentId::new(path))
    }

    #[test]
    fn test_state_machine_transitions() {
        let start = Instant::now();
        let mut state = DebounceState::new();
        assert!(state.is_idle());
        assert_eq!(state.take_due(start + WINDOW * 10), None);

        state.record(doc("a.md"), start, WINDOW);
        assert!(!state.is_idle());
        assert_eq!(state.deadline(), Some(start + WINDOW));
        assert_eq!(state.take_due(start + WINDOW / 2), None);

        // A second change resets the timer and overwrites the scope.
        state.record(doc("b.md"), start + WINDOW / 2, WINDOW);
        assert_eq!(state.take_due(start + WINDOW), None);
        assert_eq!(state.pending_scope(), Some(&doc("b.md")));

        assert_eq!(state.take_due(start + WINDOW * 3 / 2), Some(doc("b.md")));
        assert!(state.is_idle());
    }

    #[test]
    fn test_flush_returns_pending_scope() {
        let mut state = DebounceState::new();
        assert_eq!(state.flush(), None);
        state.record(ScanScope::Vault, Instant::now(), WINDOW);
        assert_eq!(state.flush(), Some(ScanScope::Vault));
        assert!(state.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_scan() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(runner.clone(), settings());
        let handle = scheduler.handle();

        for _ in 0..5 {
            assert!(handle.notify_changed(ChangeEvent::modified("2024-01-01.md")));
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(runner.call_count(), 0);

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(runner.scopes(), vec![doc("2024-01-01.md")]);

        scheduler.shutdown().await;
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_scope_wins() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(runner.clone(), settings());
        let handle = scheduler.handle();

        handle.notify_changed(ChangeEvent::modified("a.md"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.notify_changed(ChangeEvent::modified("b.md"));
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(runner.scopes(), vec![doc("b.md")]);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_run_separately() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(runner.clone(), settings());
        let handle = scheduler.handle();

        handle.notify_changed(ChangeEvent::modified("a.md"));
        tokio::time::sleep(WINDOW * 2).await;
        handle.notify_changed(ChangeEvent::modified("a.md"));
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(runner.call_count(), 2);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_text_and_removal_events_ignored() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(runner.clone(), settings());
        let handle = scheduler.handle();

        handle.notify_changed(ChangeEvent::modified("image.png"));
        handle.notify_changed(ChangeEvent::new("gone.md", ChangeKind::Removed));
        tokio::time::sleep(WINDOW * 3).await;

        scheduler.shutdown().await;
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vault_scope_setting() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(
            runner.clone(),
            SchedulerSettings {
                change_scope: ChangeScope::Vault,
                ..settings()
            },
        );

        scheduler
            .handle()
            .notify_changed(ChangeEvent::modified("2024-01-01.md"));
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(runner.scopes(), vec![ScanScope::Vault]);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_run() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(runner.clone(), settings());

        scheduler
            .handle()
            .notify_changed(ChangeEvent::modified("a.md"));
        scheduler.shutdown().await;

        assert_eq!(runner.scopes(), vec![doc("a.md")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_changes_window() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(runner.clone(), settings());
        let handle = scheduler.handle();

        handle.reconfigure(SchedulerSettings {
            window: Duration::from_millis(5000),
            ..settings()
        });
        handle.notify_changed(ChangeEvent::modified("a.md"));
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(runner.call_count(), 0);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(runner.call_count(), 1);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_handle_reports_stopped_scheduler() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::spawn(runner, settings());
        let handle = scheduler.handle();
        scheduler.shutdown().await;
        assert!(!handle.notify_changed(ChangeEvent::modified("a.md")));
    }
}
