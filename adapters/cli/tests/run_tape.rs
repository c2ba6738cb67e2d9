use std::{fs, path::Path, process::Command};

use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Open 40x60 level with a goal floor from row 50 down, a 4x4 ship and a
/// config that spawns it at (18, 10).
fn write_fixture(directory: &Path) {
    let level = RgbImage::from_fn(40, 60, |_, y| {
        if y >= 50 {
            Rgb([0, 0, 255])
        } else {
            Rgb([255, 255, 255])
        }
    });
    level
        .save(directory.join("drop.png"))
        .expect("level written");
    RgbaImage::from_pixel(4, 4, Rgba([200, 200, 200, 255]))
        .save(directory.join("ship.png"))
        .expect("sprite written");
    fs::write(directory.join("config.toml"), "[spawn]\ncenter_x = 20.0\ny = 10.0\n")
        .expect("config written");
}

fn gravitation(directory: &Path, tape: &[u8]) -> Command {
    fs::write(directory.join("tape.bin"), tape).expect("tape written");
    let mut command = Command::new(env!("CARGO_BIN_EXE_gravitation"));
    let _ = command
        .current_dir(directory)
        .env_remove("GRAVITATION_STORE_URL")
        .env("RUST_LOG", "warn")
        .args([
            "run",
            "--level",
            "drop.png",
            "--sprite",
            "ship.png",
            "--tape",
            "tape.bin",
            "--config",
            "config.toml",
        ]);
    command
}

#[test]
fn idle_tape_falls_onto_the_goal() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_fixture(directory.path());

    let output = gravitation(directory.path(), &[0; 400])
        .args(["--ghost-out", "ghost.json"])
        .output()
        .expect("binary runs");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Gravitation: drop"), "{stdout}");
    assert!(stdout.contains("completed in 00:"), "{stdout}");

    let ghost = fs::read_to_string(directory.path().join("ghost.json")).expect("ghost written");
    let frames: serde_json::Value = serde_json::from_str(&ghost).expect("ghost is json");
    assert!(frames.as_array().is_some_and(|frames| !frames.is_empty()));
}

#[test]
fn short_tape_reports_an_unfinished_attempt() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_fixture(directory.path());

    let output = gravitation(directory.path(), &[0; 3])
        .output()
        .expect("binary runs");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tape ended before the goal"), "{stdout}");
}

#[test]
fn submitting_without_a_store_is_rejected() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_fixture(directory.path());

    let output = gravitation(directory.path(), &[0; 3])
        .args(["--user", "ana"])
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("requires a store URL"));
}

#[test]
fn reserved_tape_bits_are_rejected() {
    let directory = tempfile::tempdir().expect("temp dir");
    write_fixture(directory.path());

    let output = gravitation(directory.path(), &[0x00, 0x80])
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid input tape"));
}
