//! Client side of the store-and-forward wire protocol.
//!
//! Every operation opens its own TCP connection, does one exchange and closes it. Requests start with an ASCII verb
//! line, followed by raw bytes:
//!
//! - `PUT\n` + head (80) + body: store a sealed message. The client half-closes; no response.
//! - `LIST\n`: the server streams heads back to back, 80 bytes each, until it closes.
//! - `GET\n` + body hash (32): the server answers with the raw body (`ciphertext || tag`) and closes.
//!
//! Failures are per operation. Nothing here retries; the caller picks another server or gives up on the message.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{CowmailError, Result};
use crate::head::HEAD_SIZE;
use crate::identity::Identity;
use crate::messages::{Message, SealedMessage};
use crate::opener::{open, scan};
use crate::primitives::KEY_SIZE;
use crate::sealer::seal;

/// Request verbs (client → server).
mod verb {
    pub const PUT: &[u8] = b"PUT\n";
    pub const LIST: &[u8] = b"LIST\n";
    pub const GET: &[u8] = b"GET\n";
}

/// Connection is one scoped exchange with a server. Dropping it closes the socket, so every early return through
/// `?` still releases the connection.
struct Connection {
    stream: TcpStream,
}

impl Connection {
    fn open(config: &ClientConfig) -> Result<Self> {
        let server = &config.server;
        let addrs = (server.host.as_str(), server.port)
            .to_socket_addrs()
            .map_err(|e| CowmailError::Transport(format!("{}: {}", server, e)))?;
        let mut last_error = None;
        for addr in addrs {
            let attempt = match config.timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(config.timeout)?;
                    stream.set_write_timeout(config.timeout)?;
                    debug!(%server, %addr, "connected");
                    return Ok(Self { stream });
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(CowmailError::Transport(match last_error {
            Some(e) => format!("{}: {}", server, e),
            None => format!("{}: no addresses", server),
        }))
    }

    /// request writes the verb and payload as one contiguous write, then half-closes so the server sees the end of
    /// the request.
    fn request(&mut self, verb: &[u8], payload: &[u8]) -> Result<()> {
        let mut buf = Vec::with_capacity(verb.len() + payload.len());
        buf.extend_from_slice(verb);
        buf.extend_from_slice(payload);
        self.stream.write_all(&buf)?;
        self.stream.flush()?;
        self.stream.shutdown(Shutdown::Write)?;
        Ok(())
    }

    /// read_record fills `buf` unless the stream ends first; returns how many bytes arrived
    fn read_record(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // the peer may already be gone
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// put stores a sealed message on the server
pub fn put(config: &ClientConfig, sealed: &SealedMessage) -> Result<()> {
    let mut conn = Connection::open(config)?;
    conn.request(verb::PUT, &sealed.to_bytes())?;
    debug!(server = %config.server, bytes = sealed.len(), "put");
    Ok(())
}

/// list fetches every head the server holds. A trailing partial record is dropped.
pub fn list(config: &ClientConfig) -> Result<Vec<[u8; HEAD_SIZE]>> {
    let mut conn = Connection::open(config)?;
    conn.request(verb::LIST, &[])?;
    let mut heads = Vec::new();
    loop {
        let mut head = [0u8; HEAD_SIZE];
        match conn.read_record(&mut head)? {
            HEAD_SIZE => heads.push(head),
            0 => break,
            short => {
                warn!(server = %config.server, bytes = short, "short head record, stopping");
                break;
            }
        }
    }
    debug!(server = %config.server, heads = heads.len(), "list");
    Ok(heads)
}

/// get fetches the body stored under `hash`. Responses over `config.max_response` are refused rather than
/// truncated.
pub fn get(config: &ClientConfig, hash: &[u8; KEY_SIZE]) -> Result<Vec<u8>> {
    let mut conn = Connection::open(config)?;
    conn.request(verb::GET, hash)?;
    let limit = config.max_response;
    let mut body = Vec::new();
    (&mut conn.stream).take(limit as u64 + 1).read_to_end(&mut body)?;
    if body.len() > limit {
        return Err(CowmailError::ResponseTooLarge { limit });
    }
    debug!(server = %config.server, hash = %hex::encode(&hash[..8]), bytes = body.len(), "get");
    Ok(body)
}

/// send seals a message for `recipient` and PUTs it
pub fn send(config: &ClientConfig, message: &Message, recipient: &Identity) -> Result<SealedMessage> {
    let sealed = seal(message, recipient)?;
    put(config, &sealed)?;
    Ok(sealed)
}

/// FetchedMessage is one message found by `fetch_all`.
#[derive(Debug)]
pub struct FetchedMessage {
    /// Index into the identities passed to `fetch_all`.
    pub identity_index: usize,
    pub hash: [u8; KEY_SIZE],
    /// Either the plaintext or why this one message could not be read.
    pub result: Result<Message>,
}

/// fetch_all runs LIST, scans the heads with `identities`, then GETs and opens each match.
///
/// Only a failed LIST fails the whole call. A GET or decryption failure is recorded on that message and the rest
/// are still fetched.
pub fn fetch_all(config: &ClientConfig, identities: &[Identity]) -> Result<Vec<FetchedMessage>> {
    let heads = list(config)?;
    let tickets = scan(heads.iter(), identities);
    let fetched = tickets
        .iter()
        .map(|ticket| FetchedMessage {
            identity_index: ticket.identity_index(),
            hash: *ticket.hash(),
            result: get(config, ticket.hash()).and_then(|body| open(ticket, &body)),
        })
        .collect();
    Ok(fetched)
}

/* ------------------------------------------------------------------------- */

// TESTS
