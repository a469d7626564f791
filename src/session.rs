//! Authenticated IMAP session
//!
//! Wraps an `async_imap::Session` over TLS and exposes the handful of
//! commands the cleaner needs: SELECT, UID SEARCH, UID FETCH,
//! UID STORE, EXPUNGE, CLOSE and LOGOUT.

use crate::config::{ImapConfig, Security};
use crate::error::{Error, Result};
use async_imap::imap_proto::{MailboxDatum, Response, Status};
use futures::TryStreamExt;
use mail_parser::{HeaderName, MessageParser};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

/// A TLS-wrapped IMAP session.
type ImapSession = async_imap::Session<Compat<tokio_rustls::client::TlsStream<TcpStream>>>;

const DELETED_FLAG: &str = "\\Deleted";

/// The two headers the cleaner looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeaders {
    /// Raw `Date:` value, trimmed.
    pub date: String,
    /// Decoded `Subject:`; empty when the message has none.
    pub subject: String,
}

/// An open, logged-in connection to one IMAP account.
pub struct MailSession {
    inner: ImapSession,
}

impl MailSession {
    /// Connect, negotiate TLS and log in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the host cannot be reached,
    /// [`Error::Tls`] if the handshake fails and [`Error::Auth`] if
    /// the server rejects the credentials.
    pub async fn connect(config: &ImapConfig) -> Result<Self> {
        let addr = config.address();
        debug!("Connecting to IMAP server at {}", addr);

        let tcp_stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| Error::Connection(format!("Cannot reach {addr}: {e}")))?;

        let tcp_stream = match config.security {
            Security::Tls => tcp_stream,
            Security::StartTls => starttls(tcp_stream).await?,
        };

        let connector = tls_connector(config.accept_invalid_certs)?;
        let server_name = ServerName::try_from(config.host.clone())
            .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;

        let client = async_imap::Client::new(tls_stream.compat());
        let inner = client
            .login(&config.username, &config.password)
            .await
            .map_err(|(e, _)| match e {
                async_imap::error::Error::No(msg) | async_imap::error::Error::Bad(msg) => {
                    Error::Auth(format!("{} rejected: {msg}", config.username))
                }
                other => Error::Connection(format!("Login failed: {other}")),
            })?;

        info!("Signed in successfully");
        Ok(Self { inner })
    }

    /// SELECT a folder and return how many messages it holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FolderNotFound`] if the server refuses the
    /// folder name.
    pub async fn select_folder(&mut self, name: &str) -> Result<u32> {
        match self.inner.select(name).await {
            Ok(mailbox) => Ok(mailbox.exists),
            Err(async_imap::error::Error::No(msg) | async_imap::error::Error::Bad(msg)) => {
                debug!("SELECT {} refused: {}", name, msg);
                Err(Error::FolderNotFound(name.to_string()))
            }
            Err(e) => Err(Error::Imap(format!("Failed to select {name}: {e}"))),
        }
    }

    /// UIDs of every message in the selected folder, in the order the
    /// server lists them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Imap`] if the search fails or its response
    /// cannot be read.
    pub async fn list_all_message_ids(&mut self) -> Result<Vec<u32>> {
        let id = self
            .inner
            .run_command("UID SEARCH ALL")
            .await
            .map_err(|e| Error::Imap(format!("Search failed: {e}")))?;

        let mut uids = Vec::new();
        loop {
            let response = self
                .inner
                .read_response()
                .await
                .map_err(|e| Error::Imap(format!("Search error: {e}")))?
                .ok_or_else(|| Error::Imap("Connection lost during search".into()))?;

            match response.parsed() {
                Response::MailboxData(MailboxDatum::Search(found)) => {
                    uids.extend_from_slice(found);
                }
                Response::Done {
                    tag,
                    status,
                    information,
                    ..
                } if *tag == id => {
                    if !matches!(status, Status::Ok) {
                        return Err(Error::Imap(format!(
                            "Search refused: {}",
                            information.as_deref().unwrap_or("no reason given")
                        )));
                    }
                    return Ok(uids);
                }
                _ => {}
            }
        }
    }

    /// Fetch the full raw message without setting `\Seen`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Imap`] if the fetch fails or returns no body.
    pub async fn fetch_message(&mut self, uid: u32) -> Result<Vec<u8>> {
        let uid_set = uid.to_string();
        let fetches: Vec<_> = self
            .inner
            .uid_fetch(&uid_set, "(BODY.PEEK[])")
            .await
            .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?
            .try_collect()
            .await
            .map_err(|e| Error::Imap(format!("Fetch error: {e}")))?;

        fetches
            .iter()
            .find_map(|fetch| fetch.body().map(<[u8]>::to_vec))
            .ok_or_else(|| Error::Imap(format!("No body found for UID {uid}")))
    }

    /// Fetch a message and pull out its `Date` and `Subject`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DateParse`] when the message has no `Date`
    /// header, otherwise the errors of [`Self::fetch_message`].
    pub async fn fetch_headers(&mut self, uid: u32) -> Result<MessageHeaders> {
        let raw = self.fetch_message(uid).await?;
        parse_headers(uid, &raw)
    }

    /// Flag a message `\Deleted`. It stays in the folder until
    /// [`Self::commit_deletions`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Imap`] if the STORE fails.
    pub async fn mark_for_deletion(&mut self, uid: u32) -> Result<()> {
        let uid_set = uid.to_string();
        let query = format!("+FLAGS ({DELETED_FLAG})");
        let _updates: Vec<_> = self
            .inner
            .uid_store(&uid_set, &query)
            .await
            .map_err(|e| Error::Imap(format!("Store failed for UID {uid}: {e}")))?
            .try_collect()
            .await
            .map_err(|e| Error::Imap(format!("Store error for UID {uid}: {e}")))?;
        Ok(())
    }

    /// EXPUNGE the selected folder and return how many messages the
    /// server removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Imap`] if the EXPUNGE fails.
    pub async fn commit_deletions(&mut self) -> Result<usize> {
        let removed: Vec<u32> = self
            .inner
            .expunge()
            .await
            .map_err(|e| Error::Imap(format!("Expunge failed: {e}")))?
            .try_collect()
            .await
            .map_err(|e| Error::Imap(format!("Expunge error: {e}")))?;
        Ok(removed.len())
    }

    /// CLOSE the selected folder and LOGOUT.
    ///
    /// Failures are logged and otherwise ignored; there is nothing
    /// useful left to do with the session at this point.
    pub async fn close(mut self) {
        if let Err(e) = self.inner.close().await {
            debug!("CLOSE failed: {}", e);
        }
        if let Err(e) = self.inner.logout().await {
            warn!("LOGOUT failed: {}", e);
        }
        debug!("Session closed");
    }
}

/// Issue STARTTLS on a fresh plain connection and hand back the socket
/// ready for the TLS handshake.
async fn starttls(tcp_stream: TcpStream) -> Result<TcpStream> {
    let mut client = async_imap::Client::new(tcp_stream.compat());
    client
        .run_command_and_check_ok("STARTTLS", None)
        .await
        .map_err(|e| Error::Tls(format!("STARTTLS failed: {e}")))?;
    Ok(client.into_inner().into_inner())
}

/// Build a TLS connector, verifying certificates against the native
/// root store unless `accept_invalid_certs` is set.
fn tls_connector(accept_invalid_certs: bool) -> Result<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?;

    let config = if accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth()
    } else {
        builder
            .with_root_certificates(native_roots()?)
            .with_no_client_auth()
    };

    Ok(TlsConnector::from(Arc::new(config)))
}

fn native_roots() -> Result<rustls::RootCertStore> {
    let loaded = rustls_native_certs::load_native_certs();
    for e in &loaded.errors {
        warn!("Skipping native certificate: {}", e);
    }

    let mut roots = rustls::RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    debug!("Loaded {} native root certificates ({} ignored)", added, ignored);

    if roots.is_empty() {
        return Err(Error::Tls("No native root certificates found".into()));
    }
    Ok(roots)
}

/// Certificate verifier that trusts any server certificate but still
/// checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn parse_headers(uid: u32, raw: &[u8]) -> Result<MessageHeaders> {
    let message = MessageParser::new()
        .parse_headers(raw)
        .ok_or_else(|| Error::Imap(format!("Cannot parse headers of UID {uid}")))?;

    let date = message
        .header_raw(HeaderName::Date)
        .map(str::trim)
        .ok_or_else(|| Error::DateParse(format!("UID {uid} has no Date header")))?;

    Ok(MessageHeaders {
        date: date.to_string(),
        subject: message.subject().unwrap_or_default().to_string(),
    })
}
