extern crate assert_cmd;
extern crate image;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn mandel() -> Command {
    let mut cmd = Command::cargo_bin("mandel").unwrap();
    cmd.env("RUST_LOG", "info");
    cmd
}

#[test]
fn renders_a_small_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.png");
    mandel()
        .args(&["-s", "32x24", "-i", "100", "-t", "1", "-o"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Output saved to"));

    let image = image::open(&path).unwrap().to_rgb();
    assert_eq!(image.width(), 32);
    assert_eq!(image.height(), 24);
    // The default view puts (-0.5, 0) at the center, deep in the cardioid.
    assert_eq!(image.get_pixel(16, 12).0, [0, 0, 0]);
}

#[test]
fn renders_a_standard_ppm() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.ppm");
    mandel()
        .args(&["-s", "8x6", "-i", "50", "-m", "standard", "--no-series", "-o"])
        .arg(&path)
        .assert()
        .success();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"P6"));
    assert!(bytes.len() > 8 * 6 * 3);
}

#[test]
fn accepts_a_negative_center() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seahorse.png");
    mandel()
        .args(&["-s", "8x8", "-c", "-0.75,-0.1", "-z", "20", "-i", "200", "-o"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());
}

#[test]
fn rejects_a_degenerate_size() {
    mandel()
        .args(&["-s", "1x5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 2"));
}

#[test]
fn rejects_a_zero_zoom() {
    mandel().args(&["-z", "0"]).assert().failure();
}

#[test]
fn rejects_an_unknown_extension_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("image.jpg");
    mandel()
        .args(&["-s", "8x8", "-o"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported output format"));
    assert!(!path.exists());
}
