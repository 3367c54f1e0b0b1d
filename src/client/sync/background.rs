//! # Reconciliation Loop
//!
//! Periodic poll-and-replace of the roster and chat log while sync is
//! enabled.
//!
//! Each tick fetches both snapshots concurrently and, for each, replaces the
//! held list wholesale when it differs structurally. There is no merge: a
//! local write that lands between a tick's fetch and its replace is
//! discarded if the snapshot does not contain it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nutrisync::client::sync::ReconciliationLoop;
//!
//! # async fn example(reconciler: ReconciliationLoop) {
//! // Start polling with an immediate first tick
//! reconciler.start(true);
//!
//! // Stop polling; a second stop is a no-op
//! reconciler.stop();
//! # }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::client::state::SessionState;
use crate::client::sync::RemoteSyncClient;
use crate::shared::ChangeSource;

/// What one tick changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub roster_replaced: bool,
    pub messages_replaced: bool,
}

/// Owner of the polling task
#[derive(Debug)]
pub struct ReconciliationLoop {
    remote: RemoteSyncClient,
    state: Arc<SessionState>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ReconciliationLoop {
    pub fn new(remote: RemoteSyncClient, state: Arc<SessionState>, interval: Duration) -> Self {
        Self {
            remote,
            state,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Run one reconciliation tick now
    pub async fn tick(&self) -> TickOutcome {
        run_tick(&self.remote, &self.state).await
    }

    /// Start polling; returns `false` if a loop is already running
    ///
    /// With `immediate` the first tick runs right away, otherwise after one
    /// full interval.
    pub fn start(&self, immediate: bool) -> bool {
        let Ok(mut task) = self.task.lock() else {
            tracing::error!("Reconciliation task slot poisoned");
            return false;
        };
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::debug!("Reconciliation loop already running");
            return false;
        }

        let remote = self.remote.clone();
        let state = Arc::clone(&self.state);
        let interval = self.interval;

        *task = Some(tokio::spawn(async move {
            let first = if immediate {
                tokio::time::Instant::now()
            } else {
                tokio::time::Instant::now() + interval
            };
            let mut ticker = tokio::time::interval_at(first, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            tracing::info!("Reconciliation loop started ({:?} period)", interval);
            loop {
                ticker.tick().await;
                if !state.sync_flag().is_enabled() {
                    break;
                }
                run_tick(&remote, &state).await;
            }
            tracing::info!("Reconciliation loop stopped");
        }));
        true
    }

    /// Cancel the polling task; returns `true` if one was running
    pub fn stop(&self) -> bool {
        let Ok(mut task) = self.task.lock() else {
            return false;
        };
        match task.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for ReconciliationLoop {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

async fn run_tick(remote: &RemoteSyncClient, state: &SessionState) -> TickOutcome {
    let (roster, messages) = tokio::join!(remote.fetch_roster(), remote.fetch_messages());

    // Fetches issued after a disable return empty lists without a request;
    // those must not wipe local state.
    if !state.sync_flag().is_enabled() {
        tracing::debug!("Sync disabled during tick; discarding fetched snapshots");
        return TickOutcome::default();
    }

    let outcome = TickOutcome {
        roster_replaced: state.replace_roster(roster, ChangeSource::Remote).await,
        messages_replaced: state.replace_messages(messages, ChangeSource::Remote).await,
    };
    if outcome.roster_replaced || outcome.messages_replaced {
        tracing::debug!(
            "Reconciliation replaced roster: {}, messages: {}",
            outcome.roster_replaced,
            outcome.messages_replaced
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::Config;
    use crate::client::local_store::LocalStateStore;
    use crate::client::sync::SyncFlag;
    use crate::shared::config::AppConfig;
    use crate::shared::presence::WirePresence;
    use crate::shared::{IdentityInput, StateEvent};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fixture(
        server: &MockServer,
        enabled: bool,
    ) -> (ReconciliationLoop, Arc<SessionState>) {
        let config = Config::with_builder(
            AppConfig::builder()
                .server_url(server.uri())
                .request_timeout(Duration::from_secs(1)),
        )
        .unwrap();
        let flag = SyncFlag::new(enabled);
        let state = Arc::new(SessionState::new(LocalStateStore::in_memory(), flag.clone()));
        let remote = RemoteSyncClient::new(config, flag);
        let reconciler =
            ReconciliationLoop::new(remote, Arc::clone(&state), Duration::from_secs(60));
        (reconciler, state)
    }

    async fn mount_snapshots(server: &MockServer, roster: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/online-users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(roster))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chat-messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_tick_replaces_differing_roster() {
        let server = MockServer::start().await;
        let remote_entry = IdentityInput::new("user_9", "Zoe").into_entry();
        mount_snapshots(&server, json!([WirePresence::from(&remote_entry)])).await;

        let (reconciler, state) = fixture(&server, true).await;
        let outcome = reconciler.tick().await;

        assert!(outcome.roster_replaced);
        assert!(!outcome.messages_replaced);
        assert_eq!(state.roster().await, vec![remote_entry]);
    }

    #[tokio::test]
    async fn test_identical_snapshots_emit_nothing() {
        let server = MockServer::start().await;
        let remote_entry = IdentityInput::new("user_9", "Zoe").into_entry();
        mount_snapshots(&server, json!([WirePresence::from(&remote_entry)])).await;

        let (reconciler, state) = fixture(&server, true).await;
        reconciler.tick().await;

        let mut events = state.subscribe();
        let mut replaced = 0;
        for _ in 0..3 {
            let outcome = reconciler.tick().await;
            replaced += outcome.roster_replaced as usize + outcome.messages_replaced as usize;
        }
        assert_eq!(replaced, 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_is_not_reentrant() {
        let server = MockServer::start().await;
        mount_snapshots(&server, json!([])).await;

        let (reconciler, _state) = fixture(&server, true).await;
        assert!(reconciler.start(false));
        assert!(!reconciler.start(false));
        assert!(reconciler.is_running());

        assert!(reconciler.stop());
        assert!(!reconciler.stop());
        assert!(!reconciler.is_running());
    }

    #[tokio::test]
    async fn test_immediate_start_ticks_once() {
        let server = MockServer::start().await;
        let remote_entry = IdentityInput::new("user_9", "Zoe").into_entry();
        mount_snapshots(&server, json!([WirePresence::from(&remote_entry)])).await;

        let (reconciler, state) = fixture(&server, true).await;
        let mut events = state.subscribe();
        reconciler.start(true);

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("immediate tick should replace the roster")
            .unwrap();
        assert!(matches!(event, StateEvent::RosterChanged(ChangeSource::Remote)));
        reconciler.stop();
    }

    #[tokio::test]
    async fn test_disabled_tick_keeps_local_state() {
        let server = MockServer::start().await;
        let (reconciler, state) = fixture(&server, false).await;
        let local = vec![IdentityInput::new("user_1", "Ana").into_entry()];
        state.replace_roster(local.clone(), ChangeSource::Local).await;

        assert_eq!(reconciler.tick().await, TickOutcome::default());
        assert_eq!(state.roster().await, local);
    }
}
