//! CropLock platform node
//!
//! Composes the role directory, receipt ledger, marketplace and lending
//! pool into one [`Platform`] and serves it through a single-writer Tokio
//! actor.
//!
//! # Example
//!
//! ```no_run
//! use croplock_node::{spawn_platform_actor, Platform, PlatformConfig};
//! use receipt_ledger::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> croplock_node::Result<()> {
//! let config = PlatformConfig::from_env()?;
//! let platform = Platform::new(&config, Arc::new(SystemClock))?;
//! let handle = spawn_platform_actor(platform, config.mailbox_capacity);
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod metrics;
pub mod platform;

// Re-exports
pub use actor::{spawn_platform_actor, PlatformActor, PlatformHandle, PlatformMessage};
pub use config::{GenesisAllocation, PlatformConfig};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use platform::Platform;
