use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn litbox(config_dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_litbox"));
    command
        .env("LITBOX_CONFIG_DIR", config_dir.path())
        .env_remove("LITBOX_CONFIG")
        .env("RUST_LOG", "warn");
    command
}

#[test]
fn simulate_prints_one_line_per_tick() {
    let config_dir = TempDir::new().expect("tempdir");
    let output = litbox(&config_dir)
        .args(["simulate", "--ticks", "4", "--step-ms", "100", "--start-ms", "1000"])
        .output()
        .expect("failed to run litbox simulate");

    assert!(output.status.success(), "litbox simulate failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{stdout}");
    assert!(lines[0].starts_with("tick 0 t=1000ms elapsed=0.000 yaw=0.000"));
    assert!(lines[3].starts_with("tick 3 t=1300ms elapsed=1.000 yaw=3.000"));
}

#[test]
fn inspect_describes_a_pcx_texture() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("wall.pcx");

    // 2x2, three planes, RLE with one run per plane row.
    let mut bytes = vec![0u8; 128];
    bytes[0] = 0x0A;
    bytes[1] = 5;
    bytes[2] = 1;
    bytes[3] = 8;
    bytes[8] = 1;
    bytes[10] = 1;
    bytes[65] = 3;
    bytes[66] = 2;
    for _row in 0..2 {
        bytes.extend_from_slice(&[0xC2, 200, 0xC2, 100, 0xC2, 50]);
    }
    fs::write(&path, bytes).expect("write pcx");

    let output = litbox(&dir)
        .arg("inspect")
        .arg(&path)
        .output()
        .expect("failed to run litbox inspect");

    assert!(output.status.success(), "litbox inspect failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("size:   2x2"), "{stdout}");
    assert!(stdout.contains("3 plane(s) x 8 bpp, 2 bytes per line, rle"), "{stdout}");
    assert!(stdout.contains("mean:   (200, 100, 50)"), "{stdout}");
}

#[test]
fn inspect_fails_for_missing_texture() {
    let dir = TempDir::new().expect("tempdir");
    let status = litbox(&dir)
        .args(["inspect", "does-not-exist.pcx"])
        .current_dir(dir.path())
        .status()
        .expect("failed to run litbox inspect");
    assert!(!status.success());
}

#[test]
fn rejects_malformed_window_size() {
    let dir = TempDir::new().expect("tempdir");
    let output = litbox(&dir)
        .args(["--size", "800by600", "simulate"])
        .output()
        .expect("failed to run litbox");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WIDTHxHEIGHT"), "{stderr}");
}

#[test]
fn bundled_texture_decodes() {
    let dir = TempDir::new().expect("tempdir");
    let texture = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/texture.pcx");
    let output = litbox(&dir)
        .arg("inspect")
        .arg(&texture)
        .output()
        .expect("failed to run litbox inspect");

    assert!(output.status.success(), "litbox inspect failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("size:   64x64"), "{stdout}");
    assert!(stdout.contains("3 plane(s)"), "{stdout}");
}
