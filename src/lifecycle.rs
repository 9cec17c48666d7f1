//! Application lifecycle notifications and the foreground reconcile driver.
//!
//! The host publishes state changes through an [`AppStateMonitor`]. The
//! driver reconciles once at mount and again every time the application
//! comes back to the foreground.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::selection::Reconciler;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppStateChange {
    pub previous: AppState,
    pub current: AppState,
}

impl AppStateChange {
    /// True when the application just became active.
    pub fn is_foregrounded(&self) -> bool {
        self.current == AppState::Active && self.previous != AppState::Active
    }
}

/// Publishes application state changes to subscribers.
pub struct AppStateMonitor {
    tx: broadcast::Sender<AppStateChange>,
    current: Mutex<AppState>,
}

impl AppStateMonitor {
    pub fn new(initial: AppState) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            current: Mutex::new(initial),
        }
    }

    pub fn current(&self) -> AppState {
        match self.current.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Start receiving changes. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Move to `next`, notifying subscribers if the state changed.
    pub fn set(&self, next: AppState) -> bool {
        let change = {
            let mut current = match self.current.lock() {
                Ok(state) => state,
                Err(poisoned) => poisoned.into_inner(),
            };
            if *current == next {
                return false;
            }
            let change = AppStateChange {
                previous: *current,
                current: next,
            };
            *current = next;
            change
        };

        tracing::debug!(previous = ?change.previous, current = ?change.current, "App state changed");
        // No subscribers is fine.
        let _ = self.tx.send(change);
        true
    }

    /// Record a background-to-foreground round trip.
    pub fn resume(&self) {
        if self.current() == AppState::Active {
            self.set(AppState::Background);
        }
        self.set(AppState::Active);
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<AppStateChange>,
}

impl Subscription {
    /// Wait for the next foreground transition. `None` once the monitor is gone.
    pub async fn next_foreground(&mut self) -> Option<()> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.is_foregrounded() => return Some(()),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Missed app state changes, reconciling anyway");
                    return Some(());
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

async fn run_pass(reconciler: &Reconciler, trigger: &'static str) {
    match reconciler.reconcile().await {
        Ok(outcome) => {
            tracing::debug!(
                trigger,
                selected = ?outcome.ids().map(<[String]>::len),
                "Pass complete"
            );
        }
        Err(e) => {
            tracing::warn!(trigger, error = %e, "Reconciliation failed, will retry on next foreground");
        }
    }
}

/// Reconcile at mount and on every foreground transition until shutdown.
///
/// Returns the number of passes run.
pub async fn run_foreground_reconciler(
    reconciler: Reconciler,
    mut subscription: Subscription,
    shutdown: CancellationToken,
) -> usize {
    run_pass(&reconciler, "mount").await;
    let mut passes = 1;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            event = subscription.next_foreground() => {
                if event.is_none() {
                    break;
                }
                run_pass(&reconciler, "foreground").await;
                passes += 1;
            }
        }
    }

    tracing::debug!(passes, "Foreground reconciler stopped");
    passes
}

/// Resume the app every `interval` until shutdown.
pub fn spawn_wake_timer(
    monitor: std::sync::Arc<AppStateMonitor>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; mount already covers it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => monitor.resume(),
            }
        }
    })
}

/// Resume the app whenever the process receives SIGUSR1.
#[cfg(unix)]
pub fn spawn_resume_signal(
    monitor: std::sync::Arc<AppStateMonitor>,
    shutdown: CancellationToken,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1())?;
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = usr1.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("Received SIGUSR1, reconciling");
                    monitor.resume();
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::selection::keys;
    use crate::selection::testing::{FakeLibrary, MemoryStore};
    use crate::selection::SelectionStore;

    fn reconciler(library: Arc<FakeLibrary>, kv: Arc<MemoryStore>) -> Reconciler {
        Reconciler::new(library, SelectionStore::new(kv))
    }

    async fn wait_for_writes(kv: &MemoryStore, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while kv.writes().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for writes");
    }

    #[test]
    fn test_is_foregrounded() {
        let change = |previous, current| AppStateChange { previous, current };
        assert!(change(AppState::Background, AppState::Active).is_foregrounded());
        assert!(change(AppState::Inactive, AppState::Active).is_foregrounded());
        assert!(!change(AppState::Active, AppState::Background).is_foregrounded());
        assert!(!change(AppState::Background, AppState::Inactive).is_foregrounded());
    }

    #[test]
    fn test_set_only_publishes_changes() {
        let monitor = AppStateMonitor::new(AppState::Active);
        let mut sub = monitor.subscribe();
        assert!(!monitor.set(AppState::Active));
        assert!(monitor.set(AppState::Background));
        assert_eq!(monitor.current(), AppState::Background);

        let change = sub.rx.try_recv().unwrap();
        assert_eq!(change.previous, AppState::Active);
        assert_eq!(change.current, AppState::Background);
        assert!(sub.rx.try_recv().is_err());
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let monitor = AppStateMonitor::new(AppState::Active);
        let sub = monitor.subscribe();
        assert_eq!(monitor.tx.receiver_count(), 1);
        drop(sub);
        assert_eq!(monitor.tx.receiver_count(), 0);
        // Publishing without subscribers must not fail.
        assert!(monitor.set(AppState::Background));
    }

    #[tokio::test]
    async fn test_next_foreground_skips_other_changes() {
        let monitor = AppStateMonitor::new(AppState::Active);
        let mut sub = monitor.subscribe();
        monitor.set(AppState::Inactive);
        monitor.set(AppState::Background);
        monitor.set(AppState::Active);
        assert_eq!(sub.next_foreground().await, Some(()));
    }

    #[tokio::test]
    async fn test_next_foreground_ends_when_monitor_dropped() {
        let monitor = AppStateMonitor::new(AppState::Active);
        let mut sub = monitor.subscribe();
        drop(monitor);
        assert_eq!(sub.next_foreground().await, None);
    }

    #[tokio::test]
    async fn test_reconciles_on_mount_and_foreground() {
        let library = Arc::new(FakeLibrary::with_ids(&["a", "b"]));
        let kv = Arc::new(MemoryStore::with(&[(keys::SELECTED_MEDIA, r#"["a","b","c"]"#)]));
        let monitor = AppStateMonitor::new(AppState::Active);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(run_foreground_reconciler(
            reconciler(library.clone(), kv.clone()),
            monitor.subscribe(),
            shutdown.clone(),
        ));

        wait_for_writes(&kv, 1).await;
        assert_eq!(kv.value(keys::SELECTED_MEDIA).as_deref(), Some(r#"["a","b"]"#));

        library.replace(&["b"]);
        monitor.resume();
        wait_for_writes(&kv, 2).await;
        assert_eq!(kv.value(keys::SELECTED_MEDIA).as_deref(), Some(r#"["b"]"#));

        shutdown.cancel();
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_enumeration_failure_does_not_stop_driver() {
        let library = Arc::new(FakeLibrary::with_ids(&["a"]));
        let kv = Arc::new(MemoryStore::with(&[(keys::SELECTED_MEDIA, r#"["a","b"]"#)]));
        library.set_failing(true);
        let monitor = AppStateMonitor::new(AppState::Active);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(run_foreground_reconciler(
            reconciler(library.clone(), kv.clone()),
            monitor.subscribe(),
            shutdown.clone(),
        ));

        tokio::time::timeout(Duration::from_secs(5), async {
            while library.enumerate_calls() < 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(kv.writes().is_empty());

        library.set_failing(false);
        monitor.resume();
        wait_for_writes(&kv, 1).await;
        assert_eq!(kv.value(keys::SELECTED_MEDIA).as_deref(), Some(r#"["a"]"#));

        shutdown.cancel();
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_driver_stops_when_monitor_dropped() {
        let library = Arc::new(FakeLibrary::with_ids(&[]));
        let kv = Arc::new(MemoryStore::default());
        let monitor = AppStateMonitor::new(AppState::Active);
        let sub = monitor.subscribe();
        drop(monitor);

        let passes =
            run_foreground_reconciler(reconciler(library, kv), sub, CancellationToken::new()).await;
        assert_eq!(passes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_timer_resumes_periodically() {
        let monitor = Arc::new(AppStateMonitor::new(AppState::Active));
        let mut sub = monitor.subscribe();
        let shutdown = CancellationToken::new();
        let handle = spawn_wake_timer(monitor.clone(), Duration::from_secs(30), shutdown.clone());

        assert_eq!(sub.next_foreground().await, Some(()));
        assert_eq!(monitor.current(), AppState::Active);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
