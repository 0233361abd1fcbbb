//! market-planner -- a market placement optimizer behind a JSON-lines
//! worker protocol.
//!
//! Reads `start`/`cancel` messages from stdin, one JSON object per line, and
//! writes `ready`/`progress`/`new_solution`/`result`/`error` messages to
//! stdout. Logs go to stderr.
//!
//! Usage:
//!   market-planner [OPTIONS]
//!
//! Options:
//!   --log-level FILTER   tracing filter (default: market_planner=info)
//!   --yield-interval N   iterations between cooperative yields (default: 10000)
//!   --help               Show this help

use std::env;
use std::io::{self, BufRead, BufWriter, Write};
use std::process;
use std::sync::mpsc::Receiver;
use std::thread;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use market_planner::engine::{Host, HostOptions};
use market_planner::protocol::{encode_message, parse_message, Outbound};
use market_planner::search::SearchTuning;

const DEFAULT_LOG_FILTER: &str = "market_planner=info";

fn print_usage() {
    eprintln!("Usage: market-planner [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --log-level FILTER   tracing filter (default: {DEFAULT_LOG_FILTER})");
    eprintln!("  --yield-interval N   iterations between cooperative yields (default: 10000)");
    eprintln!("  --help               Show this help");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{message}");
    print_usage();
    process::exit(1);
}

/// Writes every outbound message as one JSON line, flushing after each.
fn write_messages(events: Receiver<Outbound>) {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for msg in events {
        let line = match encode_message(&msg) {
            Ok(line) => line,
            Err(e) => {
                error!("{e}");
                match encode_message(&Outbound::error(e.to_string())) {
                    Ok(line) => line,
                    Err(_) => continue,
                }
            }
        };
        if writeln!(out, "{line}").and_then(|()| out.flush()).is_err() {
            break;
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut log_filter = DEFAULT_LOG_FILTER.to_string();
    let mut tuning: Option<SearchTuning> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--log-level" => {
                i += 1;
                match args.get(i) {
                    Some(v) => log_filter = v.clone(),
                    None => usage_error("--log-level needs a value"),
                }
            }
            "--yield-interval" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse::<u64>().ok()) {
                    Some(n) if n > 0 => {
                        tuning = Some(SearchTuning {
                            yield_interval: n,
                            ..SearchTuning::default()
                        })
                    }
                    _ => usage_error("invalid --yield-interval value"),
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => usage_error(&format!("Unknown argument: {other}")),
        }
        i += 1;
    }

    let filter = EnvFilter::try_new(&log_filter).unwrap_or_else(|_| {
        eprintln!("invalid --log-level filter, using {DEFAULT_LOG_FILTER}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let (host, events) = Host::spawn(HostOptions {
        default_tuning: tuning,
        ..HostOptions::default()
    });
    let writer = thread::spawn(move || write_messages(events));
    info!("market-planner ready");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if let Some(msg) = parse_message(&line) {
            if !host.send(msg) {
                break;
            }
        }
    }

    host.finish();
    let _ = writer.join();
}
