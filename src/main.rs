//! Cowmail CLI
//!
//! Thin wrapper around the cowmail library for command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # Create an identity (keep the secret key to yourself)
//! cowmail keygen --name me
//!
//! # Send a message to a contact's public key
//! cowmail --server mail.example.org send --to <public key> "hello"
//!
//! # Fetch everything addressed to you
//! COWMAIL_SECRET_KEY=<secret key> cowmail --server mail.example.org fetch
//!
//! # Check the crypto locally, and optionally a full round trip through a server
//! cowmail selftest
//! cowmail --server localhost:1337 selftest --with-server
//! ```

use std::slice;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use cowmail::transport;
use cowmail::{decode_key_base64, open, scan, seal, ClientConfig, CowmailError, Identity, Message, ServerAddr};

/// Cowmail - anonymous store-and-forward messaging
#[derive(Parser)]
#[command(name = "cowmail")]
#[command(version = "0.1.0")]
#[command(about = "Cowmail - anonymous store-and-forward messaging")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Server to talk to, host[:port] (default port 1337)
    #[arg(short, long, global = true, env = "COWMAIL_SERVER", default_value = "localhost")]
    server: String,

    /// Network timeout in seconds (none by default)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new identity and print its keys
    Keygen {
        /// Label for the identity
        #[arg(short, long, default_value = "me")]
        name: String,
    },

    /// Seal a message for a recipient and put it on the server
    Send {
        /// Recipient public key (base64)
        #[arg(long)]
        to: String,

        /// Message text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List the server's heads and fetch every message addressed to us
    Fetch {
        /// Secret key(s) to scan with (base64)
        #[arg(long = "secret", env = "COWMAIL_SECRET_KEY", value_delimiter = ',', required = true)]
        secrets: Vec<String>,
    },

    /// Seal, scan and open a message locally
    Selftest {
        /// Also run PUT, LIST and GET against the server
        #[arg(long)]
        with_server: bool,
    },
}

const SELFTEST_TEXT: &str = "Moo! This is a cowmail self test.";

fn setup_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let server: ServerAddr = cli.server.parse()?;
    let mut config = ClientConfig::new(server);
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn keygen(name: &str) -> Result<()> {
    let id = Identity::generate(name)?;
    let secret = id
        .secret_key_base64()
        .context("generated identity has no secret key")?;
    println!("name:   {}", id.name);
    println!("public: {}", id.public_key_base64());
    println!("secret: {}", secret.as_str());
    Ok(())
}

fn send(config: &ClientConfig, to: &str, text: &str) -> Result<()> {
    let recipient = Identity::contact("recipient", decode_key_base64(to).context("bad recipient key")?);
    let sealed = transport::send(config, &Message::from_text(text), &recipient)
        .with_context(|| format!("could not deliver to {}", config.server))?;
    info!(bytes = sealed.len(), "message sent");
    println!("sent {} bytes to {}", sealed.len(), config.server);
    Ok(())
}

fn fetch(config: &ClientConfig, secrets: &[String]) -> Result<()> {
    let identities = secrets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let key = decode_key_base64(s).with_context(|| format!("bad secret key #{}", i + 1))?;
            Ok(Identity::from_secret(&format!("id{}", i + 1), key))
        })
        .collect::<Result<Vec<_>>>()?;
    let fetched = transport::fetch_all(config, &identities)
        .with_context(|| format!("could not list messages on {}", config.server))?;
    if fetched.is_empty() {
        println!("no messages");
    }
    for message in fetched {
        let to = &identities[message.identity_index].name;
        match message.result {
            Ok(plaintext) => println!("[{}] {}", to, plaintext.text()),
            Err(CowmailError::DecryptionFailed) => println!("[{}] [Decryption failed]", to),
            Err(e) => println!("[{}] [Fetch failed: {}]", to, e),
        }
    }
    Ok(())
}

fn selftest(config: Option<&ClientConfig>) -> Result<()> {
    let me = Identity::generate("selftest")?;

    let sealed = seal(&Message::from_text(SELFTEST_TEXT), &me.to_contact())?;
    let tickets = scan([sealed.head()], slice::from_ref(&me));
    ensure!(tickets.len() == 1, "own head did not open");
    let text = open(&tickets[0], sealed.body())?.text();
    ensure!(text == SELFTEST_TEXT, "decrypted text does not match");
    println!(
        "crypto test: ok ({} byte head, {} byte body)",
        sealed.head().len(),
        sealed.body().len()
    );

    if let Some(config) = config {
        let sealed = transport::send(config, &Message::from_text(SELFTEST_TEXT), &me)?;
        let fetched = transport::fetch_all(config, slice::from_ref(&me))?;
        let found = fetched
            .into_iter()
            .find(|f| f.hash == sealed.body_hash())
            .context("sent message not found on server")?;
        let text = found.result?.text();
        ensure!(text == SELFTEST_TEXT, "fetched text does not match");
        println!("protocol test: ok ({})", config.server);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Keygen { name } => keygen(name),
        Commands::Send { to, text } => send(&client_config(&cli)?, to, &text.join(" ")),
        Commands::Fetch { secrets } => fetch(&client_config(&cli)?, secrets),
        Commands::Selftest { with_server } => {
            let config = if *with_server { Some(client_config(&cli)?) } else { None };
            selftest(config.as_ref())
        }
    }
}
