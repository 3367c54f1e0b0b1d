//! Session orchestration
//!
//! Builds one session's services, runs the startup flow, and tears them down.
//!
//! Startup:
//! 1. restore identity and presence flag from the local store
//! 2. probe the remote once; the result seeds `syncEnabled`
//! 3. reachable: an initial fetch is the roster/chat baseline;
//!    unreachable: the local store is
//! 4. re-announce a restored, presence-enabled identity
//! 5. start the reconciliation loop (if enabled) and the health monitor
//!
//! `syncEnabled` is not re-evaluated afterwards. Failing polls reduce to
//! empty snapshots; only [`Session::set_sync_enabled`] flips the flag.

use std::sync::{Arc, Mutex};

use crate::client::chat_log::ChatMessageLog;
use crate::client::config::Config;
use crate::client::local_store::LocalStateStore;
use crate::client::presence::PresenceManager;
use crate::client::state::SessionState;
use crate::client::sync::{
    ConnectivityProbe, HealthMonitor, ReconciliationLoop, RemoteSyncClient, Replicator, SyncFlag,
    SyncStatus,
};
use crate::shared::StateEvent;

/// One running instance of the sync engine
#[derive(Debug)]
pub struct Session {
    config: Config,
    state: Arc<SessionState>,
    probe: ConnectivityProbe,
    replicator: Replicator,
    presence: PresenceManager,
    chat: ChatMessageLog,
    reconciler: ReconciliationLoop,
    health: Mutex<Option<HealthMonitor>>,
    startup_reachable: bool,
}

impl Session {
    /// Build the services and run the startup flow
    pub async fn start(config: Config, store: LocalStateStore) -> Self {
        let sync = SyncFlag::default();
        let state = Arc::new(SessionState::new(store, sync.clone()));
        let probe = ConnectivityProbe::new(&config);
        let remote = RemoteSyncClient::new(config.clone(), sync.clone());
        let replicator = Replicator::new(remote.clone(), config.push_retry());
        let chat = ChatMessageLog::new(Arc::clone(&state), replicator.clone());
        let presence = PresenceManager::new(Arc::clone(&state), chat.clone(), replicator.clone());
        let reconciler =
            ReconciliationLoop::new(remote, Arc::clone(&state), config.poll_interval());

        state.restore_identity().await;

        let reachable = probe.check().await;
        sync.set(reachable);
        if reachable {
            let baseline = reconciler.tick().await;
            tracing::info!(
                "Sync enabled; remote baseline loaded (roster replaced: {}, messages replaced: {})",
                baseline.roster_replaced,
                baseline.messages_replaced
            );
        } else {
            tracing::info!("Sync disabled; continuing from local state");
            state.restore_collections().await;
        }

        presence.resume().await;

        if reachable {
            reconciler.start(false);
        }

        let health = config.server_url().map(|_| {
            HealthMonitor::spawn(probe.clone(), config.health_interval(), Some(reachable))
        });

        Self {
            config,
            state,
            probe,
            replicator,
            presence,
            chat,
            reconciler,
            health: Mutex::new(health),
            startup_reachable: reachable,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn presence(&self) -> &PresenceManager {
        &self.presence
    }

    pub fn chat(&self) -> &ChatMessageLog {
        &self.chat
    }

    pub fn reconciler(&self) -> &ReconciliationLoop {
        &self.reconciler
    }

    pub fn replicator(&self) -> &Replicator {
        &self.replicator
    }

    pub fn is_sync_enabled(&self) -> bool {
        self.state.sync_flag().is_enabled()
    }

    /// Enable or disable sync; returns whether the flag changed
    ///
    /// Enabling starts the loop with an immediate tick. Disabling cancels it.
    pub fn set_sync_enabled(&self, enabled: bool) -> bool {
        let previous = self.state.sync_flag().set(enabled);
        if previous == enabled {
            return false;
        }

        self.state.notify(StateEvent::SyncEnabledChanged(enabled));
        if enabled {
            tracing::info!("Sync enabled");
            self.reconciler.start(true);
        } else {
            tracing::info!("Sync disabled");
            self.reconciler.stop();
        }
        true
    }

    /// Probe the remote now, without touching `syncEnabled`
    pub async fn probe_now(&self) -> bool {
        self.probe.check().await
    }

    /// Latest known reachability of the remote authority
    pub fn remote_reachable(&self) -> bool {
        self.health
            .lock()
            .ok()
            .and_then(|health| health.as_ref().and_then(HealthMonitor::latest))
            .unwrap_or(self.startup_reachable)
    }

    /// Advisory status for display
    pub fn status(&self) -> SyncStatus {
        SyncStatus::resolve(self.remote_reachable(), self.is_sync_enabled())
    }

    /// Stop background work and flush pending pushes
    ///
    /// When sync is enabled the identity is announced offline first.
    pub async fn shutdown(self) {
        self.reconciler.stop();
        if let Ok(mut health) = self.health.lock() {
            if let Some(monitor) = health.take() {
                monitor.stop();
            }
        }

        self.presence.announce_offline().await;
        let delivered = self.replicator.flush().await;
        tracing::info!("Session closed ({} pending pushes delivered)", delivered);
    }
}
