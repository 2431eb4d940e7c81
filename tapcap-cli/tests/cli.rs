use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

/// Two deltas: a short-form 10 and a long-form 0x010203.
const SAMPLE_STREAM: &[u8] = &[0x00, 0x0A, 0x80, 0x00, 0x01, 0x02, 0x03];

const DATA_START: usize = 72;

fn tapcap() -> Command {
    Command::cargo_bin("tapcap").unwrap()
}

fn write_stream(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join("stream.bin");
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn capture_creates_the_expected_file() {
    let dir = tempdir().unwrap();
    let stream = write_stream(dir.path(), SAMPLE_STREAM);
    let out = dir.path().join("tape.cap");

    tapcap()
        .env("TAPCAP_DEVICE", format!("replay:{}", stream.display()))
        .args(["c64-pal", "-b", "10"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("* Tape type: C64 PAL"))
        .stdout(predicate::str::contains("Press <PLAY> on tape."))
        .stdout(predicate::str::contains("Reading tape..."))
        .stdout(predicate::str::contains(
            "[Lost signals: 0] [Discarded signals: 0] [Overcapture: 0]",
        ))
        .stdout(predicate::str::contains("Reading finished OK."))
        .stdout(predicate::str::contains(
            "Tape length: 0h0m0s (7 bytes) (2 signals)",
        ))
        .stdout(predicate::str::contains("Capture file successfully created."));

    let data = fs::read(&out).unwrap();
    assert_eq!(data.len(), DATA_START + SAMPLE_STREAM.len());
    assert_eq!(&data[0..8], b"TAPECAP1");
    assert_eq!(&data[8..12], &16u32.to_le_bytes());
    assert_eq!(data[12], 0x00, "machine id");
    assert_eq!(data[13], 0x00, "video id");
    assert_eq!(data[14], 0x00, "start edge unspecified");
    assert_eq!(data[16], 40, "signal width");
    assert_eq!(&data[20..24], &(DATA_START as u32).to_le_bytes());
    assert!(data[24..].starts_with(b"Created by tapcap"));
    assert_eq!(&data[DATA_START..], SAMPLE_STREAM);
}

#[test]
fn ntsc_profile_ids_land_in_the_header() {
    let dir = tempdir().unwrap();
    let stream = write_stream(dir.path(), SAMPLE_STREAM);
    let out = dir.path().join("tape.cap");

    tapcap()
        .env("TAPCAP_DEVICE", format!("replay:{}", stream.display()))
        .args(["vic-ntsc"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("* Tape type: VIC-20 NTSC"));

    let data = fs::read(&out).unwrap();
    assert_eq!(data[12], 0x02, "machine id");
    assert_eq!(data[13], 0x01, "video id");
}

#[test]
fn empty_stream_gives_a_header_only_file() {
    let dir = tempdir().unwrap();
    let stream = write_stream(dir.path(), &[]);
    let out = dir.path().join("tape.cap");

    tapcap()
        .env("TAPCAP_DEVICE", format!("replay:{}", stream.display()))
        .args(["spec48k"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("(0 bytes) (0 signals)"));

    assert_eq!(fs::read(&out).unwrap().len(), DATA_START);
}

#[test]
fn overwrite_declined_keeps_the_existing_file() {
    let dir = tempdir().unwrap();
    let stream = write_stream(dir.path(), SAMPLE_STREAM);
    let out = dir.path().join("tape.cap");
    fs::write(&out, b"keep me").unwrap();

    tapcap()
        .env("TAPCAP_DEVICE", format!("replay:{}", stream.display()))
        .args(["c64-pal"])
        .arg(&out)
        .write_stdin("n\n")
        .assert()
        .code(130)
        .stdout(predicate::str::contains("Overwrite existing file? (y/N)"))
        .stderr(predicate::str::contains("Aborted."));

    assert_eq!(fs::read(&out).unwrap(), b"keep me");
}

#[test]
fn overwrite_accepted_replaces_the_file() {
    let dir = tempdir().unwrap();
    let stream = write_stream(dir.path(), SAMPLE_STREAM);
    let out = dir.path().join("tape.cap");
    fs::write(&out, b"old").unwrap();

    tapcap()
        .env("TAPCAP_DEVICE", format!("replay:{}", stream.display()))
        .args(["c64-pal"])
        .arg(&out)
        .write_stdin("y\n")
        .assert()
        .success();

    assert_eq!(fs::read(&out).unwrap().len(), DATA_START + SAMPLE_STREAM.len());
}

#[test]
fn missing_device_is_an_error_and_leaves_no_file() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("tape.cap");

    tapcap()
        .env_remove("TAPCAP_DEVICE")
        .args(["c64-pal"])
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no tape device configured"));

    assert!(!out.exists(), "partial output must be removed");
}

#[test]
fn unsupported_device_spec_is_an_error() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("tape.cap");

    tapcap()
        .env("TAPCAP_DEVICE", "usb:0")
        .args(["c64-pal"])
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported device spec"));

    assert!(!out.exists());
}

#[test]
fn missing_replay_stream_cleans_up_the_output() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("tape.cap");

    tapcap()
        .env("TAPCAP_DEVICE", "replay:/nonexistent/stream.bin")
        .args(["c64-pal"])
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not read replay stream"));

    assert!(!out.exists());
}

#[test]
fn usage_errors_exit_with_the_clap_code() {
    tapcap().assert().code(2);
    tapcap().args(["amiga", "out.cap"]).assert().code(2);
}
