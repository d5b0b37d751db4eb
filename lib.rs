//! # Shredder - Secure File Overwrite Library
//!
//! Shredder replaces a file's contents, in place, with several passes of
//! cryptographically secure random data so the original bytes cannot be
//! read back through the filesystem.
//!
//! ## Features
//!
//! - **OS CSPRNG**: Every pass gets a fresh buffer from `OsRng`, zeroized after use
//! - **Multi-pass**: Write, sync, rewind; three passes by default
//! - **Fail-fast**: The first open/stat/entropy/write/sync/seek error aborts the shred
//! - **Pluggable I/O**: Any [`fs::FileSystem`] (real or in-memory) and any
//!   [`stream::Stream`] can be shredded
//!
//! ## Quick Start
//!
//! ```no_run
//! use shredder::{config::Config, shredder::Shredder};
//!
//! fn main() -> anyhow::Result<()> {
//!     let cfg = Config::load_with_env(None)?;
//!     let shredder = Shredder::from_config(&cfg);
//!
//!     shredder.shred("secret.txt")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Limits
//!
//! Copy-on-write filesystems, SSD wear-leveling, journaling and snapshots may
//! keep old copies of the data elsewhere on the medium. The file's directory
//! entry, size and name are left untouched.

pub mod config;
pub mod error;
pub mod fs;
pub mod random;
pub mod shredder;
pub mod stream;

// Re-export common types for convenience
pub use error::{Result, ShredError};
pub use shredder::{shred, Shredder};
