//! # Sync State
//!
//! The shared enable switch and the advisory three-valued status derived
//! from it. The status is for display only; nothing in the engine branches
//! on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Advisory synchronization status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Remote reachable and sync enabled
    Full,
    /// Sync enabled but the remote is currently unreachable
    Local,
    /// Sync disabled
    Offline,
}

impl SyncStatus {
    /// Derive the status from the latest reachability and the enable flag
    pub fn resolve(remote_reachable: bool, sync_enabled: bool) -> Self {
        match (sync_enabled, remote_reachable) {
            (true, true) => SyncStatus::Full,
            (true, false) => SyncStatus::Local,
            (false, _) => SyncStatus::Offline,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStatus::Full => "full",
            SyncStatus::Local => "local",
            SyncStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Shared `syncEnabled` switch
///
/// Clones observe the same flag; the remote client reads it to fail fast.
#[derive(Debug, Clone, Default)]
pub struct SyncFlag(Arc<AtomicBool>);

impl SyncFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Set the flag, returning the previous value
    pub fn set(&self, enabled: bool) -> bool {
        self.0.swap(enabled, Ordering::SeqCst)
    }
}
