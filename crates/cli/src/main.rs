//! # CLI - UndertowKV Interactive Shell
//!
//! A REPL-style command-line interface for the UndertowKV storage engine.
//! Reads commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted testing
//! (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SET key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key (writes a tombstone)
//! SCAN               Walk all live keys in ascending order
//! LEN                Print the number of live keys
//! STATS              Print engine debug info
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! UNDERTOW_DIR          Data directory            (default: "./data")
//! UNDERTOW_MAX_FILE_KB  Segment rotation, KiB     (default: 1048576 = 1 GiB)
//! UNDERTOW_SYNC         Advisory fsync flag       (default: "true")
//! UNDERTOW_INDEX        Index kind                (default: "btree")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! UndertowKV started (dir=./data, keys=0, active_segment=0, max_file=1048576KiB, index=btree)
//! > SET name Alice
//! OK
//! > GET name
//! Alice
//! > SCAN
//! name -> Alice
//! (1 entries)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use engine::{Config, Engine};
use std::io::{self, BufRead, Write};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    // Configuration via environment variables with sensible defaults.
    let dir = env_or("UNDERTOW_DIR", "./data");
    let max_file_kb: u64 = env_or("UNDERTOW_MAX_FILE_KB", "1048576")
        .parse()
        .unwrap_or(1048576);
    let sync: bool = env_or("UNDERTOW_SYNC", "true").parse().unwrap_or(true);
    let index_type = env_or("UNDERTOW_INDEX", "btree");

    let config = Config::new(&dir)
        .with_max_file_size(max_file_kb * 1024)
        .with_sync_write(sync)
        .with_index_type(index_type.clone());
    let engine = Engine::open(config)?;

    println!(
        "UndertowKV started (dir={}, keys={}, active_segment={}, max_file={}KiB, index={})",
        dir,
        engine.len(),
        engine.active_file_id(),
        max_file_kb,
        index_type
    );
    println!("Commands: SET key value | GET key | DEL key | SCAN | LEN | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: SET key value");
                        } else {
                            match engine.put(k.as_bytes(), v.as_bytes()) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR set failed: {}", e),
                            }
                        }
                    } else {
                        println!("ERR usage: SET key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match engine.get(k.as_bytes()) {
                            Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DEL" => {
                    if let Some(k) = parts.next() {
                        match engine.delete(k.as_bytes()) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR del failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: DEL key");
                    }
                }
                "SCAN" => {
                    let mut cur = engine.scan();
                    let mut entries = 0usize;
                    while cur.valid() {
                        if let Some(key) = cur.key() {
                            let key = key.to_vec();
                            match engine.get(&key) {
                                Ok(Some(v)) => {
                                    println!(
                                        "{} -> {}",
                                        String::from_utf8_lossy(&key),
                                        String::from_utf8_lossy(&v)
                                    );
                                    entries += 1;
                                }
                                Ok(None) => {}
                                Err(e) => println!("ERR scan read failed: {}", e),
                            }
                        }
                        cur.next();
                    }
                    if entries == 0 {
                        println!("(empty)");
                    } else {
                        println!("({} entries)", entries);
                    }
                }
                "LEN" => println!("{}", engine.len()),
                "STATS" => println!("{:?}", engine),
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => println!("ERR unknown command: {}", other),
            }
        }
        print!("> ");
        io::stdout().flush().ok();
    }

    engine.close()?;
    Ok(())
}
