#![cfg(all(target_os = "linux", feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/msgqcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn msgqprims(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_msgqprims"))
        .env_remove("MSGQ_KEY")
        .env_remove("MSGQ_PROJ")
        .env("MSGQ_PATH", dir)
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("msgqprims should run")
}

/// Removes the channel keyed on `dir` and the directory itself.
struct Cleanup(PathBuf);

impl Drop for Cleanup {
    fn drop(&mut self) {
        let _ = msgqprims(&self.0, &["remove"]);
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[test]
fn large_message_roundtrips_through_two_processes() {
    let dir = unique_temp_dir("roundtrip");
    let _cleanup = Cleanup(dir.clone());
    let payload = "1".repeat(8193);

    let sent = msgqprims(
        &dir,
        &["--format", "json", "send", "--exclusive", "--type", "1", "--data", &payload],
    );
    assert!(sent.status.success(), "{}", String::from_utf8_lossy(&sent.stderr));
    let summary: serde_json::Value =
        serde_json::from_slice(&sent.stdout).expect("send summary should be json");
    assert_eq!(summary["frames"], 2);
    assert_eq!(summary["size"], 8193);

    let stat = msgqprims(&dir, &["--format", "json", "stat"]);
    assert!(stat.status.success());
    let stat: serde_json::Value = serde_json::from_slice(&stat.stdout).expect("stat json");
    assert_eq!(stat["frames"], 2);

    let received = msgqprims(&dir, &["--format", "raw", "recv", "--type", "1", "--count", "1"]);
    assert!(received.status.success(), "{}", String::from_utf8_lossy(&received.stderr));
    assert_eq!(received.stdout, payload.as_bytes());
}

#[test]
fn empty_message_roundtrips() {
    let dir = unique_temp_dir("empty");
    let _cleanup = Cleanup(dir.clone());

    let sent = msgqprims(&dir, &["--format", "raw", "send", "--exclusive", "-t", "4"]);
    assert!(sent.status.success());
    assert_eq!(String::from_utf8_lossy(&sent.stdout).trim(), "1");

    let received = msgqprims(&dir, &["--format", "json", "recv", "-t", "4", "--count", "1"]);
    assert!(received.status.success());
    let message: serde_json::Value =
        serde_json::from_slice(&received.stdout).expect("message json");
    assert_eq!(message["size"], 0);
    assert_eq!(message["mtype"], 4);
}

#[test]
fn nonblocking_receive_on_empty_channel_times_out() {
    let dir = unique_temp_dir("nowait");
    let _cleanup = Cleanup(dir.clone());

    let received = msgqprims(&dir, &["recv", "--exclusive", "--nowait", "--count", "1"]);
    assert_eq!(received.status.code(), Some(124));
    assert!(received.stdout.is_empty());
}

#[test]
fn removed_channel_is_gone() {
    let dir = unique_temp_dir("remove");
    let _cleanup = Cleanup(dir.clone());

    let sent = msgqprims(&dir, &["send", "--exclusive", "--data", "bye"]);
    assert!(sent.status.success());

    let removed = msgqprims(&dir, &["remove"]);
    assert!(removed.status.success());

    let stat = msgqprims(&dir, &["stat"]);
    assert_eq!(stat.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&stat.stderr).contains("open failed"));
}

#[test]
fn key_is_stable_and_depends_on_project() {
    let dir = unique_temp_dir("key");
    let _cleanup = Cleanup(dir.clone());

    let first = msgqprims(&dir, &["--format", "raw", "key"]);
    let second = msgqprims(&dir, &["--format", "raw", "key"]);
    let other = msgqprims(&dir, &["--format", "raw", "key", "--proj", "0x23"]);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert_ne!(first.stdout, other.stdout);

    let json = msgqprims(&dir, &["--format", "json", "key"]);
    let value: serde_json::Value = serde_json::from_slice(&json.stdout).expect("key json");
    assert_eq!(value["proj"], 0x22);
    assert!(value["key"].as_str().is_some_and(|k| k.starts_with("0x")));
}

#[test]
fn missing_key_path_fails() {
    let dir = unique_temp_dir("missing");
    let _cleanup = Cleanup(dir.clone());

    let output = msgqprims(&dir, &["key", "--path", "/definitely/not/here"]);
    assert_eq!(output.status.code(), Some(1));
}
