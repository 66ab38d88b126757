/// Integration tests for the UndertowKV CLI.
/// Tests cover: basic ops, overwrite, delete, scans, rotation, recovery,
/// and edge cases, all driven through the spawned binary over stdin.
use std::path::Path;
use tempfile::tempdir;

/// Helper to run CLI commands and capture output
fn run_cli_command(data_dir: &Path, max_file_kb: &str, command: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new("cargo")
        .args(["run", "-p", "cli", "--"])
        .env("UNDERTOW_DIR", data_dir.to_str().unwrap())
        .env("UNDERTOW_MAX_FILE_KB", max_file_kb)
        .env("UNDERTOW_SYNC", "true")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(command.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_basic_set_get() {
    let dir = tempdir().unwrap();

    let output = run_cli_command(dir.path(), "1024", "SET key1 value1\nGET key1\n");

    assert!(output.contains("OK"));
    assert!(output.contains("value1"));
}

#[test]
fn test_multiple_keys() {
    let dir = tempdir().unwrap();

    let commands = "SET a 1\nSET b 2\nSET c 3\nGET a\nGET b\nGET c\n";
    let output = run_cli_command(dir.path(), "1024", commands);

    assert!(output.contains("1"));
    assert!(output.contains("2"));
    assert!(output.contains("3"));
}

#[test]
fn test_overwrite_key() {
    let dir = tempdir().unwrap();

    let commands = "SET mykey oldvalue\nGET mykey\nSET mykey newvalue\nGET mykey\n";
    let output = run_cli_command(dir.path(), "1024", commands);

    assert!(output.contains("oldvalue"));
    assert!(output.contains("newvalue"));
}

#[test]
fn test_delete_key() {
    let dir = tempdir().unwrap();

    let commands = "SET delme value\nGET delme\nDEL delme\nGET delme\n";
    let output = run_cli_command(dir.path(), "1024", commands);

    assert!(output.contains("value"));
    assert!(output.contains("(nil)"));
}

#[test]
fn test_delete_missing_key_reports_error() {
    let dir = tempdir().unwrap();

    let output = run_cli_command(dir.path(), "1024", "DEL ghost\n");
    assert!(output.contains("ERR del failed"));
}

#[test]
fn test_scan_orders_keys() {
    let dir = tempdir().unwrap();

    let mut commands = String::new();
    // inserted out of order on purpose
    for key in ["banana", "apple", "cherry"] {
        commands.push_str(&format!("SET {} fruit\n", key));
    }
    commands.push_str("SCAN\n");

    let output = run_cli_command(dir.path(), "1024", &commands);

    let apple = output.find("apple ->").expect("apple missing from scan");
    let banana = output.find("banana ->").expect("banana missing from scan");
    let cherry = output.find("cherry ->").expect("cherry missing from scan");
    assert!(apple < banana && banana < cherry, "scan out of order");
    assert!(output.contains("(3 entries)"));
}

#[test]
fn test_scan_excludes_deleted_keys() {
    let dir = tempdir().unwrap();

    let commands = "SET a 1\nSET b 2\nSET c 3\nDEL b\nSCAN\n";
    let output = run_cli_command(dir.path(), "1024", commands);

    assert!(!output.contains("b -> "));
    assert!(output.contains("(2 entries)"));
}

#[test]
fn test_len_counts_live_keys() {
    let dir = tempdir().unwrap();

    let commands = "SET a 1\nSET b 2\nDEL a\nLEN\n";
    let output = run_cli_command(dir.path(), "1024", commands);

    assert!(output.contains("1"));
}

#[test]
fn test_rotation_across_segments() {
    let dir = tempdir().unwrap();

    // 1 KiB threshold: ~30-byte records roll over every ~35 writes
    let mut commands = String::new();
    for i in 0..100 {
        commands.push_str(&format!("SET key{:03} value_with_some_data_{}\n", i, i));
    }
    commands.push_str("SCAN\n");

    let output = run_cli_command(dir.path(), "1", &commands);

    // all keys readable despite living in sealed segments
    assert!(output.contains("key000"));
    assert!(output.contains("key099"));

    let segments = std::fs::read_dir(dir.path().join("data_wal"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with("data_") && n.ends_with(".wal"))
                .unwrap_or(false)
        })
        .count();
    assert!(segments > 1, "expected rotation, found {} segment(s)", segments);
}

#[test]
fn test_persistence_across_restarts() {
    let dir = tempdir().unwrap();

    // First session: write data
    run_cli_command(dir.path(), "1024", "SET persist_key persist_value\n");

    // Second session: data should still be there
    let output = run_cli_command(dir.path(), "1024", "GET persist_key\n");

    assert!(output.contains("persist_value"));
}

#[test]
fn test_delete_persists_across_restarts() {
    let dir = tempdir().unwrap();

    run_cli_command(dir.path(), "1024", "SET k v\nDEL k\n");
    let output = run_cli_command(dir.path(), "1024", "GET k\n");

    assert!(output.contains("(nil)"));
}

#[test]
fn test_stats_output() {
    let dir = tempdir().unwrap();

    let commands = "SET x 1\nSET y 2\nSTATS\n";
    let output = run_cli_command(dir.path(), "1024", commands);

    assert!(output.contains("Engine"));
    assert!(output.contains("active_file_id"));
}

#[test]
fn test_quit_command() {
    let dir = tempdir().unwrap();

    let output = run_cli_command(dir.path(), "1024", "SET foo bar\nQUIT\n");

    assert!(output.contains("OK"));
    assert!(output.contains("bye"));
}

#[test]
fn test_binary_safe_mixed_case_keys() {
    let dir = tempdir().unwrap();

    let commands =
        "SET KEY1 VALUE1\nSET Key2 Value2\nSET key3 value3\nGET KEY1\nGET Key2\nGET key3\n";
    let output = run_cli_command(dir.path(), "1024", commands);

    assert!(output.contains("VALUE1"));
    assert!(output.contains("Value2"));
    assert!(output.contains("value3"));
}

#[test]
fn test_value_with_spaces() {
    let dir = tempdir().unwrap();

    let output = run_cli_command(dir.path(), "1024", "SET k hello wide world\nGET k\n");
    assert!(output.contains("hello wide world"));
}

#[test]
fn test_large_value() {
    let dir = tempdir().unwrap();

    let large_value = "x".repeat(500);
    let commands = format!("SET large_key {}\nGET large_key\n", large_value);
    let output = run_cli_command(dir.path(), "1024", &commands);

    assert!(output.contains(&large_value));
}

#[test]
fn test_mixed_operations_stress() {
    let dir = tempdir().unwrap();

    let mut commands = String::new();
    for i in 0..30 {
        match i % 3 {
            0 => commands.push_str(&format!("SET stress_k{} stress_v{}\n", i, i)),
            1 => commands.push_str(&format!("GET stress_k{}\n", i)),
            _ => commands.push_str(&format!("DEL stress_k{}\n", i - 2)),
        }
    }
    commands.push_str("SCAN\n");

    let output = run_cli_command(dir.path(), "1", &commands);

    // Should complete without panicking
    assert!(!output.is_empty());
}
