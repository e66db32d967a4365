//! Terminal-safe rendering of server-supplied text.
//!
//! Key names and client addresses come straight from the server and may
//! contain anything, including escape sequences. Everything the reports
//! print from the server passes through here first.

/// Strips ANSI escape sequences and other control characters from
/// server-supplied strings so they can't manipulate the terminal.
/// Keeps printable characters and tabs.
pub fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if let Some(next) = chars.next() {
                if next == '[' {
                    // CSI: consume through the final letter
                    for c in chars.by_ref() {
                        if c.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
        } else if ch == '\t' || !ch.is_control() {
            out.push(ch);
        }
    }
    out
}

/// Renders a key name for a single report line.
///
/// Printable UTF-8 names pass through. Anything else is quoted the way
/// redis-cli quotes it, with `\xNN` escapes for non-printable bytes, so
/// two distinct keys never render the same.
pub fn display_key(name: &[u8]) -> String {
    match std::str::from_utf8(name) {
        Ok(s) if !s.starts_with('"') && !s.chars().any(char::is_control) => s.to_string(),
        _ => escape_bytes(name),
    }
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}
