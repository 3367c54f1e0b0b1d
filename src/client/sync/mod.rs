//! # Sync Layer
//!
//! Everything that talks to the remote authority, and the loop that keeps
//! local state in step with it.
//!
//! ## Architecture
//!
//! - **Network Monitor**: one-shot connectivity probe and the periodic
//!   health monitor
//! - **Remote Client**: bounded, non-failing roster and chat reads/writes
//! - **Replicator**: fire-and-forget pushes with optional bounded retry
//! - **Background**: the reconciliation loop
//! - **Sync State**: the shared enable flag and the advisory status

pub mod background;
pub mod network_monitor;
pub mod remote;
pub mod replicator;
pub mod sync_state;

pub use background::{ReconciliationLoop, TickOutcome};
pub use network_monitor::{ConnectivityProbe, HealthMonitor};
pub use remote::RemoteSyncClient;
pub use replicator::Replicator;
pub use sync_state::{SyncFlag, SyncStatus};
