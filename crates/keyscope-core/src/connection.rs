//! Async TCP connection to a Redis-compatible server.
//!
//! Sends commands as RESP arrays of bulk strings and reads back parsed
//! frames. A connection is opened once per invocation, handed to the
//! report that needs it, and shut down when that report finishes.

use std::fmt;

use bytes::{Bytes, BytesMut};
use keyscope_protocol::{encode_command, parse_frame, Frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::classify::DataType;
use crate::store::{KeyspaceStore, ScanBatch};

/// Errors that can occur while talking to the server.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] keyscope_protocol::ProtocolError),

    #[error("server disconnected")]
    Disconnected,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The server answered with an error reply.
    #[error("server error: {0}")]
    Server(String),

    /// The reply had a shape the command never produces.
    #[error("unexpected reply to {command}: {detail}")]
    UnexpectedReply {
        command: &'static str,
        detail: String,
    },
}

impl ConnectionError {
    /// Whether the connection itself is unusable after this error, as
    /// opposed to the server rejecting one command.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ConnectionError::Io(_) | ConnectionError::Protocol(_) | ConnectionError::Disconnected
        )
    }

    fn unexpected(command: &'static str, frame: &Frame) -> Self {
        ConnectionError::UnexpectedReply {
            command,
            detail: format!("{frame:?}"),
        }
    }
}

/// Where to connect and how to set up the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// Logical database to SELECT after connecting.
    pub db: u32,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

impl fmt::Display for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A TCP connection with read/write buffering.
pub struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl Connection {
    /// Connects to the server at the given host and port.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ConnectionError> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(16 * 1024),
            write_buf: BytesMut::with_capacity(4096),
        })
    }

    /// Connects, authenticates, selects the database, and checks the
    /// session with PING. Any failure here is fatal to the caller.
    pub async fn open(opts: &ConnectOptions) -> Result<Self, ConnectionError> {
        let mut conn = Self::connect(&opts.host, opts.port).await?;

        if let Some(pw) = opts.password.as_deref() {
            conn.authenticate(pw).await?;
        }
        if opts.db != 0 {
            conn.select(opts.db).await?;
        }
        conn.ping().await?;

        debug!(addr = %opts, db = opts.db, "connected");
        Ok(conn)
    }

    /// Sends a command and returns whatever frame comes back, error
    /// replies included.
    pub async fn send_command<A: AsRef<[u8]>>(
        &mut self,
        args: &[A],
    ) -> Result<Frame, ConnectionError> {
        self.write_buf.clear();
        encode_command(args, &mut self.write_buf);
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;

        self.read_response().await
    }

    /// Sends a command and turns an error reply into
    /// [`ConnectionError::Server`].
    pub async fn request<A: AsRef<[u8]>>(&mut self, args: &[A]) -> Result<Frame, ConnectionError> {
        match self.send_command(args).await? {
            Frame::Error(e) => Err(ConnectionError::Server(e)),
            frame => Ok(frame),
        }
    }

    /// Authenticates with the AUTH command.
    pub async fn authenticate(&mut self, password: &str) -> Result<(), ConnectionError> {
        match self.send_command(&["AUTH", password]).await? {
            Frame::Simple(s) if s == "OK" => Ok(()),
            Frame::Error(e) => Err(ConnectionError::AuthFailed(e)),
            _ => Err(ConnectionError::AuthFailed(
                "unexpected response to AUTH".into(),
            )),
        }
    }

    /// Switches to logical database `db`.
    pub async fn select(&mut self, db: u32) -> Result<(), ConnectionError> {
        let db = db.to_string();
        match self.request(&["SELECT", db.as_str()]).await? {
            Frame::Simple(s) if s == "OK" => Ok(()),
            other => Err(ConnectionError::unexpected("SELECT", &other)),
        }
    }

    /// Round-trips a PING.
    pub async fn ping(&mut self) -> Result<(), ConnectionError> {
        match self.request(&["PING"]).await? {
            Frame::Simple(s) if s == "PONG" => Ok(()),
            other => Err(ConnectionError::unexpected("PING", &other)),
        }
    }

    /// Flushes and half-closes the socket.
    pub async fn shutdown(mut self) {
        let _ = self.stream.shutdown().await;
    }

    async fn read_response(&mut self) -> Result<Frame, ConnectionError> {
        loop {
            if !self.read_buf.is_empty() {
                if let Some((frame, consumed)) = parse_frame(&self.read_buf)? {
                    let _ = self.read_buf.split_to(consumed);
                    return Ok(frame);
                }
            }

            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(ConnectionError::Disconnected);
            }
        }
    }

    async fn request_integer(
        &mut self,
        command: &'static str,
        key: &[u8],
    ) -> Result<u64, ConnectionError> {
        let frame = self.request(&[command.as_bytes(), key]).await?;
        match frame.as_integer() {
            Some(n) if n >= 0 => Ok(n as u64),
            _ => Err(ConnectionError::unexpected(command, &frame)),
        }
    }

    async fn request_text(
        &mut self,
        command: &'static str,
        args: &[&str],
    ) -> Result<String, ConnectionError> {
        let frame = self.request(args).await?;
        match frame.to_text() {
            Some(text) => Ok(text),
            None => Err(ConnectionError::unexpected(command, &frame)),
        }
    }
}

impl KeyspaceStore for Connection {
    async fn scan(
        &mut self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanBatch, ConnectionError> {
        let cursor = cursor.to_string();
        let count = count.to_string();
        let frame = self
            .request(&["SCAN", cursor.as_str(), "MATCH", pattern, "COUNT", count.as_str()])
            .await?;
        parse_scan_reply(frame)
    }

    async fn key_type(&mut self, key: &[u8]) -> Result<String, ConnectionError> {
        let frame = self.request(&["TYPE".as_bytes(), key]).await?;
        match frame {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(ref b) => Ok(String::from_utf8_lossy(b).into_owned()),
            other => Err(ConnectionError::unexpected("TYPE", &other)),
        }
    }

    async fn key_size(&mut self, key: &[u8], data_type: DataType) -> Result<u64, ConnectionError> {
        self.request_integer(data_type.size_command(), key).await
    }

    async fn info(&mut self, section: &str) -> Result<String, ConnectionError> {
        self.request_text("INFO", &["INFO", section]).await
    }

    async fn client_list(&mut self) -> Result<String, ConnectionError> {
        self.request_text("CLIENT LIST", &["CLIENT", "LIST"]).await
    }
}

/// Splits a SCAN reply into the next cursor and the key batch.
fn parse_scan_reply(frame: Frame) -> Result<ScanBatch, ConnectionError> {
    let mut parts = match frame {
        Frame::Array(parts) => parts,
        other => return Err(ConnectionError::unexpected("SCAN", &other)),
    };
    if parts.len() != 2 {
        return Err(ConnectionError::unexpected("SCAN", &Frame::Array(parts)));
    }

    let keys_frame = parts.pop().unwrap_or(Frame::Null);
    let cursor_frame = parts.pop().unwrap_or(Frame::Null);

    let cursor = cursor_frame
        .as_bytes()
        .and_then(|b| std::str::from_utf8(b).ok())
        .and_then(|s| s.parse::<u64>().ok())
        .or_else(|| cursor_frame.as_integer().and_then(|n| u64::try_from(n).ok()))
        .ok_or_else(|| ConnectionError::unexpected("SCAN", &cursor_frame))?;

    let keys = match keys_frame {
        Frame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Frame::Bulk(b) => Ok(b),
                Frame::Simple(s) => Ok(Bytes::from(s)),
                other => Err(ConnectionError::unexpected("SCAN", &other)),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Frame::Null => Vec::new(),
        other => return Err(ConnectionError::unexpected("SCAN", &other)),
    };

    Ok(ScanBatch { cursor, keys })
}
