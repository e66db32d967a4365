//! Test helpers: an in-process mock of a Redis-compatible server.
//!
//! The mock speaks RESP over real TCP and implements just enough of the
//! command set for keyscope's reports: PING, AUTH, SELECT, SCAN, TYPE,
//! the per-type size commands, INFO and CLIENT LIST. Its state lives
//! behind a `std::sync::Mutex` so tests can seed it and inspect the
//! commands it received.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use keyscope_core::ConnectOptions;
use keyscope_protocol::{parse_frame, Frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the mock holds and how it should misbehave.
#[derive(Default)]
pub struct MockState {
    /// Key name to (type name, size). A type of `"none"` makes a key that
    /// SCAN lists but TYPE reports as missing.
    pub keys: BTreeMap<Vec<u8>, (String, u64)>,
    pub password: Option<String>,
    pub info_keyspace: String,
    pub client_list: String,
    /// Drop the connection instead of answering the `n`th SCAN (0-based).
    pub drop_on_scan: Option<usize>,
    pub scan_calls: usize,
    /// Drop the connection instead of answering TYPE for this key.
    pub drop_on_type: Option<Vec<u8>>,
    /// Every command received, as lossy text.
    pub commands: Vec<Vec<String>>,
}

impl MockState {
    pub fn insert(&mut self, key: &str, type_name: &str, size: u64) {
        self.keys
            .insert(key.as_bytes().to_vec(), (type_name.to_string(), size));
    }

    /// Lists `key` in SCAN replies but reports it missing afterwards.
    pub fn ghost(&mut self, key: &str) {
        self.insert(key, "none", 0);
    }
}

/// A mock server bound to an ephemeral port on 127.0.0.1.
pub struct MockServer {
    pub port: u16,
    pub state: Arc<Mutex<MockState>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Starts a mock server on the current tokio runtime.
    pub async fn start(state: MockState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(state));

        let shared = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&shared)));
            }
        });

        Self {
            port,
            state,
            handle,
        }
    }

    pub fn options(&self) -> ConnectOptions {
        ConnectOptions {
            host: "127.0.0.1".into(),
            port: self.port,
            ..ConnectOptions::default()
        }
    }

    /// Commands received so far, each rendered as space-joined text.
    pub fn command_log(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .map(|c| c.join(" "))
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// What to do after handling one command.
enum Reply {
    Send(Frame),
    Hangup,
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<MockState>>) {
    let mut buf = BytesMut::with_capacity(4096);
    let mut out = BytesMut::new();
    let mut authed = false;

    loop {
        let frame = match parse_frame(&buf) {
            Ok(Some((frame, consumed))) => {
                let _ = buf.split_to(consumed);
                frame
            }
            Ok(None) => match stream.read_buf(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            },
            Err(_) => return,
        };

        let args = match frame {
            Frame::Array(parts) => parts
                .into_iter()
                .filter_map(|p| p.as_bytes().map(|b| b.to_vec()))
                .collect::<Vec<_>>(),
            _ => return,
        };

        let reply = {
            let mut state = state.lock().unwrap();
            handle(&mut state, &args, &mut authed)
        };

        match reply {
            Reply::Send(frame) => {
                out.clear();
                frame.serialize(&mut out);
                if stream.write_all(&out).await.is_err() {
                    return;
                }
            }
            Reply::Hangup => return,
        }
    }
}

fn handle(state: &mut MockState, args: &[Vec<u8>], authed: &mut bool) -> Reply {
    state.commands.push(
        args.iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect(),
    );

    let Some(name) = args.first() else {
        return Reply::Send(err("ERR empty command"));
    };
    let name = String::from_utf8_lossy(name).to_ascii_uppercase();

    if name == "AUTH" {
        return Reply::Send(match (&state.password, args.get(1)) {
            (Some(pw), Some(given)) if pw.as_bytes() == given.as_slice() => {
                *authed = true;
                Frame::Simple("OK".into())
            }
            (Some(_), _) => err("WRONGPASS invalid username-password pair"),
            (None, _) => err("ERR AUTH <password> called without any password configured"),
        });
    }
    if state.password.is_some() && !*authed {
        return Reply::Send(err("NOAUTH Authentication required."));
    }

    let key = args.get(1).map(|k| k.as_slice()).unwrap_or_default();
    let frame = match name.as_str() {
        "PING" => Frame::Simple("PONG".into()),
        "SELECT" => Frame::Simple("OK".into()),
        "SCAN" => {
            let call = state.scan_calls;
            state.scan_calls += 1;
            if state.drop_on_scan == Some(call) {
                return Reply::Hangup;
            }
            scan(state, args)
        }
        "TYPE" if state.drop_on_type.as_deref() == Some(key) => return Reply::Hangup,
        "TYPE" => match state.keys.get(key) {
            Some((t, _)) => Frame::Simple(t.clone()),
            None => Frame::Simple("none".into()),
        },
        "STRLEN" => size_of(state, key, "string"),
        "LLEN" => size_of(state, key, "list"),
        "HLEN" => size_of(state, key, "hash"),
        "SCARD" => size_of(state, key, "set"),
        "ZCARD" => size_of(state, key, "zset"),
        "INFO" => bulk(&state.info_keyspace),
        "CLIENT" => bulk(&state.client_list),
        _ => err(&format!("ERR unknown command '{name}'")),
    };
    Reply::Send(frame)
}

/// `SCAN cursor [MATCH pattern] [COUNT n]` over the sorted key set. The
/// cursor is an offset into the filtered listing.
fn scan(state: &MockState, args: &[Vec<u8>]) -> Frame {
    let text: Vec<String> = args
        .iter()
        .map(|a| String::from_utf8_lossy(a).into_owned())
        .collect();
    let cursor: usize = text.get(1).and_then(|c| c.parse().ok()).unwrap_or(0);
    let mut pattern = "*".to_string();
    let mut count = 10usize;
    let mut i = 2;
    while i + 1 < text.len() {
        match text[i].to_ascii_uppercase().as_str() {
            "MATCH" => pattern = text[i + 1].clone(),
            "COUNT" => count = text[i + 1].parse().unwrap_or(10).max(1),
            _ => {}
        }
        i += 2;
    }

    let listing: Vec<&Vec<u8>> = state
        .keys
        .keys()
        .filter(|k| glob_match(pattern.as_bytes(), k))
        .collect();
    let start = cursor.min(listing.len());
    let end = (start + count).min(listing.len());
    let next = if end >= listing.len() { 0 } else { end };

    Frame::Array(vec![
        bulk(&next.to_string()),
        Frame::Array(
            listing[start..end]
                .iter()
                .map(|k| Frame::Bulk(Bytes::copy_from_slice(k)))
                .collect(),
        ),
    ])
}

fn size_of(state: &MockState, key: &[u8], expected: &str) -> Frame {
    match state.keys.get(key) {
        Some((t, size)) if t == expected => Frame::Integer(*size as i64),
        Some((t, _)) if t == "none" => Frame::Integer(0),
        Some(_) => err("WRONGTYPE Operation against a key holding the wrong kind of value"),
        None => Frame::Integer(0),
    }
}

/// Glob matching with `*` and `?`, enough for the patterns tests use.
fn glob_match(pattern: &[u8], s: &[u8]) -> bool {
    match (pattern.first(), s.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            glob_match(&pattern[1..], s) || (!s.is_empty() && glob_match(pattern, &s[1..]))
        }
        (Some(b'?'), Some(_)) => glob_match(&pattern[1..], &s[1..]),
        (Some(p), Some(c)) if p == c => glob_match(&pattern[1..], &s[1..]),
        _ => false,
    }
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
}

fn err(msg: &str) -> Frame {
    Frame::Error(msg.to_string())
}

#[test]
fn glob_matching() {
    assert!(glob_match(b"*", b"anything"));
    assert!(glob_match(b"user:*", b"user:42"));
    assert!(!glob_match(b"user:*", b"session:1"));
    assert!(glob_match(b"k?", b"k1"));
    assert!(!glob_match(b"k?", b"k12"));
}
