//! nutrisync - Presence & Chat Synchronization Engine
//!
//! The synchronization core of a personal nutrition-planning app: a shared
//! notion of who is online and what has been said, kept on a device that
//! must work fully offline and reconcile with a remote authority whenever
//! one is reachable.
//!
//! # Module Structure
//!
//! - **`shared`** - Data model and ambient types
//!   - Roster entries, chat messages and their wire shapes
//!   - State change events
//!   - Error taxonomy and configuration
//!
//! - **`client`** - The engine as it runs on a device
//!   - Local state store
//!   - Connectivity probe, remote client, reconciliation loop
//!   - Presence manager and chat log
//!   - Session orchestration
//!
//! # Degrade Modes
//!
//! With no remote configured, or an unreachable one at startup, the engine
//! runs from local persistence only. Network and storage failures never
//! surface to callers; they are logged and reflected in the advisory
//! [`client::SyncStatus`].
//!
//! # Reconciliation
//!
//! While sync is enabled the roster and chat log are polled on a fixed
//! period and replaced wholesale when the remote snapshot differs. Local
//! writes are optimistic and replicated best-effort; a snapshot that lacks
//! them wins.

/// Shared types and data structures
pub mod shared;

/// Device-side engine
pub mod client;
