//! Connected-client tally from `CLIENT LIST`.

use std::collections::HashMap;

use colored::Colorize;

use crate::format::sanitize;

/// Number of connections from one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTally {
    pub addr: String,
    pub connections: u64,
}

/// Counts connections per client address.
///
/// Each line of `CLIENT LIST` carries an `addr=host:port` field; the port
/// is dropped so every connection from the same host lands in one entry.
/// Lines without an `addr=` field are ignored. Sorted by connection count
/// descending, then address.
pub fn tally_clients(client_list: &str) -> Vec<ClientTally> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for line in client_list.lines() {
        if let Some(host) = line.split_whitespace().find_map(addr_host) {
            *counts.entry(host).or_insert(0) += 1;
        }
    }

    let mut tally: Vec<ClientTally> = counts
        .into_iter()
        .map(|(addr, connections)| ClientTally {
            addr: addr.to_string(),
            connections,
        })
        .collect();
    tally.sort_by(|a, b| {
        b.connections
            .cmp(&a.connections)
            .then_with(|| a.addr.cmp(&b.addr))
    });
    tally
}

/// Extracts the host part of an `addr=` field. Handles `[::1]:6379` as
/// well as bare `::1:6379` by splitting at the last colon.
fn addr_host(field: &str) -> Option<&str> {
    let addr = field.strip_prefix("addr=")?;
    let host = match addr.rsplit_once(':') {
        Some((host, _port)) => host,
        None => addr,
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    (!host.is_empty()).then_some(host)
}

/// Renders the per-address table.
pub fn render_clients(tally: &[ClientTally]) -> String {
    let mut out = format!("{}\n", "Client Connections:".bold());
    for entry in tally {
        out.push_str(&format!("{:<15} : {}\n", sanitize(&entry.addr), entry.connections));
    }
    let total: u64 = tally.iter().map(|e| e.connections).sum();
    out.push_str(&format!(
        "\n{}\n",
        format!("Total connections: {total}").bold()
    ));
    out
}
