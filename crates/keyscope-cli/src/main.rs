//! keyscope: keyspace diagnostics for Redis-compatible servers.
//!
//! Connects once, runs one report, and exits. Reports go to stdout;
//! logs and errors go to stderr.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, CommandFactory, Parser};
use colored::Colorize;
use keyscope_core::{
    parse_keyspace_info, render_big_keys, render_clients, render_keyspace, tally_clients,
    BigKeyScanner, Connection, KeyspaceStore,
};
use tracing::{debug, info};

use crate::config::KeyscopeConfig;

/// Inspect the keyspace of a Redis-compatible server.
#[derive(Parser)]
#[command(name = "keyscope", version, about)]
#[command(group(
    ArgGroup::new("mode").args(["show_keys", "show_big_key", "show_client"])
))]
struct Args {
    /// path to TOML configuration file
    #[arg(short = 'c', long, env = "KEYSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// print default configuration as TOML and exit
    #[arg(long)]
    config_template: bool,

    /// server hostname [default: 127.0.0.1]
    #[arg(short = 'H', long, env = "KEYSCOPE_HOST")]
    host: Option<String>,

    /// server port [default: 6379]
    #[arg(short, long, env = "KEYSCOPE_PORT")]
    port: Option<u16>,

    /// password for AUTH
    #[arg(short = 'a', long, env = "KEYSCOPE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// logical database to inspect [default: 0]
    #[arg(short = 'n', long, env = "KEYSCOPE_DB")]
    db: Option<u32>,

    /// show key counts per database
    #[arg(long)]
    show_keys: bool,

    /// show the biggest keys per data type
    #[arg(long)]
    show_big_key: bool,

    /// show connection counts per client address
    #[arg(long)]
    show_client: bool,

    /// keys to list per type [default: 10]
    #[arg(long, env = "KEYSCOPE_TOP", value_parser = parse_positive)]
    top: Option<usize>,

    /// SCAN COUNT hint [default: 1000]
    #[arg(long, env = "KEYSCOPE_COUNT", value_parser = parse_positive)]
    count: Option<usize>,

    /// only scan keys matching this glob [default: *]
    #[arg(long, env = "KEYSCOPE_PATTERN")]
    pattern: Option<String>,

    /// stop the scan at the first key that can't be read
    #[arg(long)]
    strict: bool,

    /// disable colored output
    #[arg(long)]
    no_color: bool,

    /// log scan progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Keyspace,
    BigKeys,
    Clients,
}

impl Args {
    fn mode(&self) -> Option<Mode> {
        if self.show_keys {
            Some(Mode::Keyspace)
        } else if self.show_big_key {
            Some(Mode::BigKeys)
        } else if self.show_client {
            Some(Mode::Clients)
        } else {
            None
        }
    }
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    let default_filter = if args.verbose {
        "keyscope=debug"
    } else {
        "keyscope=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.config_template {
        return match KeyscopeConfig::default().to_toml() {
            Ok(toml) => {
                println!("{toml}");
                ExitCode::SUCCESS
            }
            Err(e) => fail(format!("failed to generate config template: {e}")),
        };
    }

    let Some(mode) = args.mode() else {
        // nothing to do; show what's available
        let mut cmd = Args::command();
        if let Err(e) = cmd.print_help() {
            return fail(format!("failed to print usage: {e}"));
        }
        println!();
        return ExitCode::SUCCESS;
    };

    // defaults → TOML file → CLI/env overrides
    let mut cfg = match &args.config {
        Some(path) => match KeyscopeConfig::from_file(path) {
            Ok(cfg) => {
                debug!(path = %path.display(), "loaded config file");
                cfg
            }
            Err(e) => return fail(e),
        },
        None => KeyscopeConfig::default(),
    };
    apply_args(&mut cfg, &args);
    if let Err(e) = cfg.validate() {
        return fail(e);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return fail(format!("failed to create runtime: {e}")),
    };

    rt.block_on(run(mode, &cfg))
}

/// Applies CLI overrides to the config. Only values given on the command
/// line (or through the environment) replace what the file set.
fn apply_args(cfg: &mut KeyscopeConfig, args: &Args) {
    if let Some(ref host) = args.host {
        cfg.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    if let Some(ref pw) = args.password {
        cfg.password = Some(pw.clone());
    }
    if let Some(db) = args.db {
        cfg.db = db;
    }
    if let Some(top) = args.top {
        cfg.top = top;
    }
    if let Some(count) = args.count {
        cfg.count = count;
    }
    if let Some(ref pattern) = args.pattern {
        cfg.pattern = pattern.clone();
    }
    if args.strict {
        cfg.strict = true;
    }
}

/// Opens the session and runs one report on it.
async fn run(mode: Mode, cfg: &KeyscopeConfig) -> ExitCode {
    let opts = cfg.connect_options();
    let mut conn = match Connection::open(&opts).await {
        Ok(conn) => conn,
        Err(e) => return fail(format!("could not connect to {opts}: {e}")),
    };
    info!(addr = %opts, db = opts.db, ?mode, "running report");

    let code = match mode {
        Mode::Keyspace => show_keyspace(&mut conn).await,
        Mode::BigKeys => show_big_keys(&mut conn, cfg).await,
        Mode::Clients => show_clients(&mut conn).await,
    };

    conn.shutdown().await;
    code
}

async fn show_keyspace(conn: &mut Connection) -> ExitCode {
    match conn.info("keyspace").await {
        Ok(info) => {
            print!("{}", render_keyspace(&parse_keyspace_info(&info)));
            ExitCode::SUCCESS
        }
        Err(e) => fail(format!("failed to read keyspace info: {e}")),
    }
}

async fn show_big_keys(conn: &mut Connection, cfg: &KeyscopeConfig) -> ExitCode {
    let scanner = BigKeyScanner::new(cfg.scan_options());
    let report = scanner.run(conn).await;
    print!("{}", render_big_keys(&report));

    if report.outcome.is_complete() {
        ExitCode::SUCCESS
    } else {
        // partial results were printed; the exit code flags them
        ExitCode::FAILURE
    }
}

async fn show_clients(conn: &mut Connection) -> ExitCode {
    match conn.client_list().await {
        Ok(list) => {
            print!("{}", render_clients(&tally_clients(&list)));
            ExitCode::SUCCESS
        }
        Err(e) => fail(format!("failed to read client list: {e}")),
    }
}

fn fail(msg: impl std::fmt::Display) -> ExitCode {
    eprintln!("{}", format!("error: {msg}").red());
    ExitCode::FAILURE
}
