//! Per-folder retention policies
//!
//! The policy file is a YAML sequence. Each entry names a folder and
//! optionally how long its messages are kept:
//!
//! ```yaml
//! - name: INBOX
//!   ttl:
//!     days: 30
//! - name: "[Gmail]/Spam"
//! ```
//!
//! Entries are processed in file order. A folder without `ttl` keeps
//! nothing: every message already in it is eligible for deletion.

use crate::error::{Error, Result};
use chrono::TimeDelta;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Retention policy for one folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderPolicy {
    /// Folder name exactly as the server knows it.
    pub name: String,
    /// How long messages are kept. Absent means zero.
    #[serde(default)]
    pub ttl: Ttl,
}

/// Retention period, as a sum of non-negative units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ttl {
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub milliseconds: u32,
    pub microseconds: u32,
}

impl Ttl {
    /// Total retention period.
    ///
    /// Saturates at [`TimeDelta::MAX`] instead of overflowing.
    #[must_use]
    pub fn to_duration(&self) -> TimeDelta {
        let parts = [
            TimeDelta::try_weeks(i64::from(self.weeks)),
            TimeDelta::try_days(i64::from(self.days)),
            TimeDelta::try_hours(i64::from(self.hours)),
            TimeDelta::try_minutes(i64::from(self.minutes)),
            TimeDelta::try_seconds(i64::from(self.seconds)),
            TimeDelta::try_milliseconds(i64::from(self.milliseconds)),
            Some(TimeDelta::microseconds(i64::from(self.microseconds))),
        ];

        parts
            .into_iter()
            .try_fold(TimeDelta::zero(), |total, part| {
                part.and_then(|p| total.checked_add(&p))
            })
            .unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Read the retention policies from a YAML file.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read, is not valid
/// YAML of the expected shape, or names an empty folder.
pub fn load_policies(path: &Path) -> Result<Vec<FolderPolicy>> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {e}", path.display())))?;
    parse_policies(&text).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Parse retention policies from YAML text.
///
/// # Errors
///
/// Returns [`Error::Config`] on malformed YAML or an empty folder name.
pub fn parse_policies(text: &str) -> Result<Vec<FolderPolicy>> {
    let policies: Option<Vec<FolderPolicy>> =
        serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
    let policies = policies.unwrap_or_default();

    if let Some(pos) = policies.iter().position(|p| p.name.trim().is_empty()) {
        return Err(Error::Config(format!(
            "entry {} has an empty folder name",
            pos + 1
        )));
    }

    Ok(policies)
}
