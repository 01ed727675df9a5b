//! Connection health monitoring.
//!
//! The monitor wakes up on a fixed tick. While the connection is alive it
//! asks its callback to send a keep-alive check every check interval. When no
//! event has been acknowledged for longer than the no-event threshold, or the
//! socket reported a disconnect, it waits a jittered interval that grows with
//! consecutive failures and then asks its callback to reconnect.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use sc_core::config::HealthSettings;
use sc_core::constants;

/// Health monitor timing.
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// How often the monitor evaluates the connection.
    pub monitor_interval: Duration,
    /// Interval between keep-alive checks.
    pub check_interval: Duration,
    /// Silence after which the connection is considered dead.
    pub no_event_threshold: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_millis(constants::HEALTH_MONITOR_INTERVAL_MS),
            check_interval: Duration::from_millis(constants::HEALTH_CHECK_INTERVAL_MS),
            no_event_threshold: Duration::from_millis(constants::NO_EVENT_INTERVAL_THRESHOLD_MS),
        }
    }
}

impl From<&HealthSettings> for HealthCheckConfig {
    fn from(settings: &HealthSettings) -> Self {
        Self {
            monitor_interval: Duration::from_millis(settings.monitor_interval_ms.max(1)),
            check_interval: Duration::from_millis(settings.check_interval_ms),
            no_event_threshold: Duration::from_millis(settings.no_event_threshold_ms),
        }
    }
}

/// Actions the monitor requests from its owner.
#[async_trait]
pub trait HealthCallback: Send + Sync {
    /// The connection looks dead; reconnect if appropriate.
    async fn reconnect(&self);

    /// Time for a keep-alive check.
    async fn check(&self);
}

#[derive(Debug)]
struct MonitorState {
    last_ack: Instant,
    last_check: Instant,
    disconnected: bool,
    consecutive_failures: u32,
}

enum Action {
    Check,
    Reconnect(u32),
}

/// Watches a connection for silent death.
pub struct HealthMonitor {
    config: HealthCheckConfig,
    callback: Arc<dyn HealthCallback>,
    state: Arc<Mutex<MonitorState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HealthMonitor {
    pub fn new(config: HealthCheckConfig, callback: Arc<dyn HealthCallback>) -> Self {
        let now = Instant::now();
        Self {
            config,
            callback,
            state: Arc::new(Mutex::new(MonitorState {
                last_ack: now,
                last_check: now,
                disconnected: false,
                consecutive_failures: 0,
            })),
            task: Mutex::new(None),
        }
    }

    /// Start monitoring a fresh connection. Calling it again restarts the clock.
    pub fn start(&self) {
        if let Ok(mut state) = self.state.lock() {
            let now = Instant::now();
            state.last_ack = now;
            state.last_check = now;
            state.disconnected = false;
            state.consecutive_failures = 0;
        }
        self.ensure_running();
    }

    /// Stop monitoring. A no-op when already stopped.
    pub fn stop(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                debug!("health monitor stopped");
                handle.abort();
            }
        }
    }

    /// Record that the connection delivered an event.
    pub fn ack(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.last_ack = Instant::now();
            state.consecutive_failures = 0;
        }
    }

    /// The socket dropped; keep running so a reconnect gets scheduled.
    pub fn on_disconnected(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.disconnected = true;
        }
        self.ensure_running();
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Number of reconnects requested since the last ack or start.
    pub fn consecutive_failures(&self) -> u32 {
        self.state
            .lock()
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }

    /// How long to wait before the next reconnect after `failures` failed ones.
    pub fn retry_interval(failures: u32) -> Duration {
        let cap = constants::MAX_RECONNECT_INTERVAL_MS;
        let failures = u64::from(failures);
        let max = (500 + failures.saturating_mul(2000)).min(cap);
        let min = (failures.saturating_sub(1).saturating_mul(2000)).max(250).min(cap);
        let millis = if max > min {
            rand::thread_rng().gen_range(min..max)
        } else {
            min
        };
        Duration::from_millis(millis)
    }

    fn ensure_running(&self) {
        let Ok(mut task) = self.task.lock() else {
            return;
        };
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        debug!("health monitor started");
        *task = Some(tokio::spawn(run_monitor(
            self.config.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.callback),
        )));
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn next_action(config: &HealthCheckConfig, state: &Mutex<MonitorState>) -> Option<Action> {
    let mut state = state.lock().ok()?;
    let now = Instant::now();
    // Checks keep going on a silent but open socket; one answer revives it.
    if !state.disconnected && now.duration_since(state.last_check) >= config.check_interval {
        state.last_check = now;
        return Some(Action::Check);
    }
    if state.disconnected || now.duration_since(state.last_ack) >= config.no_event_threshold {
        return Some(Action::Reconnect(state.consecutive_failures));
    }
    None
}

async fn run_monitor(
    config: HealthCheckConfig,
    state: Arc<Mutex<MonitorState>>,
    callback: Arc<dyn HealthCallback>,
) {
    let mut ticker = interval_at(Instant::now() + config.monitor_interval, config.monitor_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match next_action(&config, &state) {
            Some(Action::Check) => {
                debug!("health check");
                // Callbacks run detached so they may stop this monitor safely.
                let callback = Arc::clone(&callback);
                tokio::spawn(async move { callback.check().await });
            }
            Some(Action::Reconnect(failures)) => {
                let delay = HealthMonitor::retry_interval(failures);
                warn!(
                    "connection looks dead, reconnecting in {:.1}s (failures: {failures})",
                    delay.as_secs_f64()
                );
                sleep(delay).await;
                if let Ok(mut state) = state.lock() {
                    state.consecutive_failures += 1;
                }
                info!("health monitor requesting reconnect");
                let callback = Arc::clone(&callback);
                tokio::spawn(async move { callback.reconnect().await });
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        reconnects: AtomicUsize,
        checks: AtomicUsize,
    }

    #[async_trait]
    impl HealthCallback for Counting {
        async fn reconnect(&self) {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
        }

        async fn check(&self) {
            self.checks.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn monitor(callback: Arc<Counting>) -> HealthMonitor {
        HealthMonitor::new(HealthCheckConfig::default(), callback)
    }

    #[test]
    fn test_retry_interval_bounds() {
        for _ in 0..50 {
            let d = HealthMonitor::retry_interval(0);
            assert!(d >= Duration::from_millis(250) && d < Duration::from_millis(500));

            let d = HealthMonitor::retry_interval(1);
            assert!(d >= Duration::from_millis(250) && d < Duration::from_millis(2500));

            let d = HealthMonitor::retry_interval(3);
            assert!(d >= Duration::from_millis(4000) && d < Duration::from_millis(6500));
        }
        assert_eq!(HealthMonitor::retry_interval(50), Duration::from_millis(25_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_fires_while_alive() {
        let callback = Arc::new(Counting::default());
        let monitor = monitor(callback.clone());
        monitor.start();

        for _ in 0..25 {
            sleep(Duration::from_secs(1)).await;
            monitor.ack();
        }

        assert!(callback.checks.load(Ordering::SeqCst) >= 2);
        assert_eq!(callback.reconnects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_triggers_reconnect() {
        let callback = Arc::new(Counting::default());
        let monitor = monitor(callback.clone());
        monitor.start();

        sleep(Duration::from_secs(29)).await;
        assert_eq!(callback.reconnects.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(3)).await;
        assert!(callback.reconnects.load(Ordering::SeqCst) >= 1);
        assert!(monitor.consecutive_failures() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_checks_continue_during_silence() {
        let callback = Arc::new(Counting::default());
        let monitor = monitor(callback.clone());
        monitor.start();

        sleep(Duration::from_secs(29)).await;
        let before = callback.checks.load(Ordering::SeqCst);
        assert!(before >= 2);

        sleep(Duration::from_secs(30)).await;
        assert!(callback.reconnects.load(Ordering::SeqCst) >= 1);
        assert!(callback.checks.load(Ordering::SeqCst) > before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_disconnected_requests_reconnect() {
        let callback = Arc::new(Counting::default());
        let monitor = monitor(callback.clone());
        monitor.on_disconnected();
        assert!(monitor.is_running());

        sleep(Duration::from_secs(2)).await;
        assert_eq!(callback.reconnects.load(Ordering::SeqCst), 1);
        assert_eq!(callback.checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let callback = Arc::new(Counting::default());
        let monitor = monitor(callback.clone());
        monitor.stop();
        monitor.start();
        monitor.start();
        assert!(monitor.is_running());
        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_running());

        sleep(Duration::from_secs(60)).await;
        assert_eq!(callback.checks.load(Ordering::SeqCst), 0);
        assert_eq!(callback.reconnects.load(Ordering::SeqCst), 0);
    }
}
