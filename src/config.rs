//! IMAP connection configuration

/// Default IMAP server when none is given.
pub const DEFAULT_HOST: &str = "imap.gmail.com";

/// Default port for implicit TLS (IMAPS).
pub const DEFAULT_PORT: u16 = 993;

/// How the connection is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// TLS from the first byte (IMAPS, usually port 993).
    #[default]
    Tls,
    /// Plain TCP upgraded with the STARTTLS command (usually port 143).
    StartTls,
}

/// IMAP connection configuration for a single account
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub security: Security,
    /// Skip certificate verification (self-signed bridges, test servers).
    pub accept_invalid_certs: bool,
}

impl ImapConfig {
    /// Configuration for `username` on `host` with implicit TLS on
    /// the default port.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            security: Security::default(),
            accept_invalid_certs: false,
        }
    }

    /// `host:port` as passed to the TCP connector.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
