//! Per-database key counts from `INFO keyspace`.

use colored::Colorize;

use crate::format::sanitize;

/// Key count for one logical database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseKeys {
    /// Database label as the server reports it, e.g. `db0`.
    pub name: String,
    pub index: u32,
    pub keys: u64,
}

/// Parses the body of `INFO keyspace`.
///
/// Expects lines like `db0:keys=12,expires=0,avg_ttl=0`. Section headers,
/// blank lines, and anything without a readable `keys=` field are
/// ignored. The result is sorted by database index.
pub fn parse_keyspace_info(info: &str) -> Vec<DatabaseKeys> {
    let mut dbs: Vec<DatabaseKeys> = info.lines().filter_map(parse_line).collect();
    dbs.sort_by_key(|db| db.index);
    dbs
}

fn parse_line(line: &str) -> Option<DatabaseKeys> {
    let line = line.trim();
    let (name, fields) = line.split_once(':')?;
    let index = name.strip_prefix("db")?.parse::<u32>().ok()?;
    let keys = fields
        .split(',')
        .find_map(|field| field.strip_prefix("keys="))?
        .parse::<u64>()
        .ok()?;
    Some(DatabaseKeys {
        name: name.to_string(),
        index,
        keys,
    })
}

/// Renders the per-database table.
pub fn render_keyspace(dbs: &[DatabaseKeys]) -> String {
    let mut out = format!("{}\n", "Database Key Statistics:".bold());

    if dbs.is_empty() {
        out.push_str(&format!("{}\n", "(no keys)".dimmed()));
        return out;
    }

    for db in dbs {
        out.push_str(&format!("{:<5} : {} keys\n", sanitize(&db.name), db.keys));
    }

    if dbs.len() > 1 {
        let total: u64 = dbs.iter().map(|db| db.keys).sum();
        out.push_str(&format!("\n{}\n", format!("Total keys: {total}").bold()));
    }
    out
}
