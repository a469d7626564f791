//! Error types for mailbox-cleaner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Cannot parse date header: {0}")]
    DateParse(String),

    #[error("IMAP error: {0}")]
    Imap(String),
}

impl Error {
    /// Process exit status for this kind of failure.
    ///
    /// `Connection` and `Tls` share a status; anything unclassified
    /// exits with 1. Status 2 stays free for command-line usage errors.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 7,
            Self::Auth(_) => 3,
            Self::Connection(_) | Self::Tls(_) => 4,
            Self::FolderNotFound(_) => 5,
            Self::DateParse(_) => 6,
            Self::Imap(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
