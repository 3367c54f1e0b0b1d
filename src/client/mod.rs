//! Client Module
//!
//! The presence & chat synchronization engine as it runs on a device.
//!
//! # Architecture
//!
//! The client module is organized into focused submodules:
//!
//! - **`config`** - Configuration (remote URL, timeouts, data directory)
//! - **`local_store`** - Synchronous persistence of the four state keys
//! - **`sync`** - Connectivity probe, remote client, replicator, loop
//! - **`state`** - Session state and its change notifications
//! - **`presence`** - Identity, presence flag, join/leave notices
//! - **`chat_log`** - Append-only chat log
//! - **`session`** - Startup flow and teardown
//! - **`main`** - Command-line client (binary)
//!
//! # Example
//!
//! ```rust,no_run
//! use nutrisync::client::{Config, Session};
//! use nutrisync::client::local_store::{JsonFileStore, LocalStateStore};
//! use nutrisync::shared::IdentityInput;
//!
//! # async fn example() {
//! let config = Config::new();
//! let store = LocalStateStore::new(JsonFileStore::new(config.data_dir()));
//! let session = Session::start(config, store).await;
//!
//! session.presence().initialize(IdentityInput::new("user_1", "Ana")).await;
//! println!("sync status: {}", session.status());
//! session.shutdown().await;
//! # }
//! ```

pub mod chat_log;
pub mod config;
pub mod local_store;
pub mod presence;
pub mod session;
pub mod state;
pub mod sync;

// Re-export commonly used types
pub use chat_log::ChatMessageLog;
pub use config::Config;
pub use presence::PresenceManager;
pub use session::Session;
pub use state::SessionState;
pub use sync::SyncStatus;
