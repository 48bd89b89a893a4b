//! CLI smoke tests — verify basic binary behavior.

use std::process::Command;

fn cli_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_setu"));
    cmd.env_remove("ONEBOT_WS_URL")
        .env_remove("ONEBOT_ACCESS_TOKEN")
        .env_remove("SETU_CONFIG")
        .env_remove("SETU_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage"),
        "Expected usage info in --help output"
    );
    assert!(stdout.contains("--once"));
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("setu"),
        "Expected binary name in --version output"
    );
}

#[test]
fn test_once_untriggered_is_silent() {
    let dir = tempfile::TempDir::new().unwrap();
    let images = dir.path().join("imgs");
    let output = cli_bin()
        .current_dir(dir.path())
        .env("SETU_IMAGE_DIR", &images)
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("--once")
        .arg("今天天气不错")
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().is_empty(), "stdout was: {}", stdout);
    // Logging still happens, just not on stdout.
    assert!(String::from_utf8_lossy(&output.stderr).contains("Starting setu"));
    // Directory is created at startup.
    assert!(images.is_dir());
}

#[test]
fn test_shutdown_empties_image_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let images = dir.path().join("imgs");
    std::fs::create_dir(&images).unwrap();
    std::fs::write(images.join("123_p0.png"), b"stale").unwrap();

    let output = cli_bin()
        .env("SETU_IMAGE_DIR", &images)
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("--once")
        .arg("hello")
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    assert_eq!(std::fs::read_dir(&images).unwrap().count(), 0);
}

#[test]
fn test_missing_onebot_config_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = cli_bin()
        .env("SETU_IMAGE_DIR", dir.path().join("imgs"))
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OneBot"), "stderr was: {}", stderr);
}
