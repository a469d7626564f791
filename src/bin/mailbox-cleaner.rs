#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that deletes expired messages from the folders listed in a
//! retention policy file

use anyhow::Context;
use clap::Parser;
use clap::builder::FalseyValueParser;
use mailbox_cleaner::{Cleaner, DEFAULT_HOST, DEFAULT_PORT, Error, ImapConfig, Security};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailbox-cleaner")]
#[command(about = "Delete IMAP messages older than each folder's retention period")]
struct Args {
    /// IMAP server
    #[arg(short, long, env = "IMAP_HOST", default_value = DEFAULT_HOST)]
    server: String,

    /// IMAP port
    #[arg(short = 'P', long, env = "IMAP_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Email address
    #[arg(short, long, env = "IMAP_USERNAME")]
    email: String,

    /// Password
    #[arg(short, long, env = "IMAP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Path to folders config
    #[arg(short, long, default_value = "./config.yaml")]
    config: PathBuf,

    /// Connect in plain text and upgrade with STARTTLS
    #[arg(long, env = "IMAP_STARTTLS", value_parser = FalseyValueParser::new())]
    starttls: bool,

    /// Accept any server certificate
    #[arg(
        long,
        env = "IMAP_ACCEPT_INVALID_CERTS",
        value_parser = FalseyValueParser::new()
    )]
    accept_invalid_certs: bool,
}

impl Args {
    fn imap_config(&self) -> ImapConfig {
        ImapConfig {
            host: self.server.clone(),
            port: self.port,
            username: self.email.clone(),
            password: self.password.clone(),
            security: if self.starttls {
                Security::StartTls
            } else {
                Security::Tls
            },
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Something went wrong: {e:#}");
            let code = e.downcast_ref::<Error>().map_or(1, Error::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let cleaner = Cleaner::from_policy_file(args.imap_config(), &args.config)
        .context("Cannot load folder policies")?;

    let report = cleaner
        .run()
        .await
        .with_context(|| format!("Cleanup of {} failed", args.email))?;

    info!(
        "Done: removed {} messages across {} folders",
        report.total_removed(),
        report.folders.len()
    );
    Ok(())
}
