//! Folder cleanup orchestration
//!
//! One run walks the configured folders in order. For each folder it
//! selects it, checks every message's `Date` against the folder's
//! cutoff, flags the expired ones `\Deleted` and expunges them before
//! moving on.

use crate::config::ImapConfig;
use crate::date::{compute_cutoff, is_expired, parse_header_date};
use crate::error::Result;
use crate::retention::{FolderPolicy, load_policies};
use crate::session::MailSession;
use chrono::{Local, NaiveDateTime};
use std::path::Path;
use tracing::info;

/// Outcome of cleaning one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub name: String,
    /// Messages in the folder when it was selected.
    pub total: u32,
    /// Messages flagged `\Deleted` during the scan.
    pub marked: usize,
    /// Messages the server reported as expunged.
    pub removed: usize,
}

/// Per-folder outcomes, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub folders: Vec<FolderReport>,
}

impl CleanupReport {
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.folders.iter().map(|f| f.removed).sum()
    }
}

/// Deletes expired messages from one IMAP account.
pub struct Cleaner {
    config: ImapConfig,
    policies: Vec<FolderPolicy>,
}

impl Cleaner {
    #[must_use]
    pub const fn new(config: ImapConfig, policies: Vec<FolderPolicy>) -> Self {
        Self { config, policies }
    }

    /// Load the retention policies from `path`.
    ///
    /// Nothing touches the network until [`Self::run`], so a bad
    /// policy file is reported before any connection is made.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the file cannot be loaded.
    pub fn from_policy_file(config: ImapConfig, path: &Path) -> Result<Self> {
        let policies = load_policies(path)?;
        info!("Loaded {} folder policies from {}", policies.len(), path.display());
        Ok(Self::new(config, policies))
    }

    /// Connect, clean every configured folder, then close the session.
    ///
    /// The session is closed on every path out of the folder loop,
    /// including errors.
    ///
    /// # Errors
    ///
    /// Returns the first error hit; folders after it are not touched.
    pub async fn run(&self) -> Result<CleanupReport> {
        let mut session = MailSession::connect(&self.config).await?;
        let result = self.clean_all(&mut session).await;
        session.close().await;
        result
    }

    async fn clean_all(&self, session: &mut MailSession) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        for policy in &self.policies {
            let cutoff = compute_cutoff(&policy.ttl, Local::now().naive_local());
            let folder = clean_folder(session, &policy.name, cutoff).await?;
            report.folders.push(folder);
        }
        Ok(report)
    }
}

/// Delete every message in `name` dated strictly before `cutoff`.
///
/// # Errors
///
/// Fails on the first protocol error or unparseable `Date` header; in
/// that case nothing in the folder has been expunged.
pub async fn clean_folder(
    session: &mut MailSession,
    name: &str,
    cutoff: NaiveDateTime,
) -> Result<FolderReport> {
    info!("Cleaning up folder {}", name);
    let total = session.select_folder(name).await?;
    info!("Found {} messages in total", total);

    let uids = session.list_all_message_ids().await?;
    info!(
        "The following messages are older than {}. They will be removed:",
        cutoff.format("%Y-%m-%d")
    );

    let mut marked = 0;
    for uid in uids {
        let headers = session.fetch_headers(uid).await?;
        let date = parse_header_date(&headers.date)?;
        if !is_expired(date, cutoff) {
            continue;
        }
        info!("\t{}: {}", headers.date, headers.subject);
        session.mark_for_deletion(uid).await?;
        marked += 1;
    }

    let removed = session.commit_deletions().await?;
    if removed > 0 {
        info!("Removed {} messages", removed);
    } else {
        info!("No messages were removed");
    }

    Ok(FolderReport {
        name: name.to_string(),
        total,
        marked,
        removed,
    })
}
