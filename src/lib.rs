//! IMAP mailbox retention cleaner
//!
//! Connects to one IMAP account and, for each folder listed in a YAML
//! policy file, deletes the messages whose `Date` header is older than
//! the folder's retention period.
//!
//! ```no_run
//! # async fn demo() -> mailbox_cleaner::Result<()> {
//! use mailbox_cleaner::{Cleaner, ImapConfig};
//! use std::path::Path;
//!
//! let config = ImapConfig::new("imap.gmail.com", "me@gmail.com", "app-password");
//! let cleaner = Cleaner::from_policy_file(config, Path::new("config.yaml"))?;
//! let report = cleaner.run().await?;
//! println!("removed {}", report.total_removed());
//! # Ok(())
//! # }
//! ```

mod cleaner;
mod config;
pub mod date;
mod error;
pub mod retention;
mod session;

pub use cleaner::{Cleaner, CleanupReport, FolderReport, clean_folder};
pub use config::{DEFAULT_HOST, DEFAULT_PORT, ImapConfig, Security};
pub use error::{Error, Result};
pub use retention::{FolderPolicy, Ttl, load_policies};
pub use session::{MailSession, MessageHeaders};
