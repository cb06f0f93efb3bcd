//! Drives the `strand` binary end to end.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use strand::store::{CheckpointStore, OpenMode};

fn strand(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_strand"))
        .args(args)
        .output()
        .unwrap()
}

fn write_params(dir: &Path, init: &Path, extra: &str) -> String {
    let path = dir.join("run.txt");
    let text = format!(
        "# test run\ninit_file = {}\ncheckpoint_file = {}\nnsteps = 20\noutput_frequency = 10\n{extra}",
        init.display(),
        dir.join("run.chk").display(),
    );
    fs::write(&path, text).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn init_then_run_writes_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let init = dir.path().join("init.chk");
    let out = strand(&[
        "init",
        "--out",
        init.to_str().unwrap(),
        "--dims",
        "16,12",
        "--field",
        "phi",
        "--field",
        "c",
        "--seed",
        "5",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let params = write_params(dir.path(), &init, "");
    let log = dir.path().join("run.log");
    let out = strand(&[
        "run",
        "--params",
        &params,
        "--np",
        "4",
        "--kernel",
        "allen-cahn",
        "--log",
        log.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let store = CheckpointStore::open(dir.path().join("run.chk"), OpenMode::Read).unwrap();
    assert_eq!(store.list("/").unwrap(), vec!["phi", "c"]);
    assert_eq!(store.list("c").unwrap(), vec!["000000", "000001", "000002"]);

    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("Parameter:nsteps:20:"), "{text}");
    assert!(text.contains("Processor Dimensions: 2,2"), "{text}");
    assert!(text.contains("Elapsed Time:"), "{text}");
}

#[test]
fn token_chain_run_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let init = dir.path().join("init.chk");
    let out = strand(&["init", "--out", init.to_str().unwrap(), "--dims", "24", "--field", "u"]);
    assert!(out.status.success());

    let params = write_params(dir.path(), &init, "dimensions = 1\n");
    let out = strand(&["run", "--params", &params, "--np", "3", "--token-chain"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn missing_initial_file_exits_with_open_code() {
    let dir = tempfile::tempdir().unwrap();
    let params = write_params(dir.path(), &dir.path().join("absent.chk"), "");
    let out = strand(&["run", "--params", &params, "--np", "2"]);
    assert_eq!(out.status.code(), Some(20));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
}

#[test]
fn malformed_parameter_file_exits_with_params_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    fs::write(&path, "nsteps 20\n").unwrap();
    let out = strand(&["run", "--params", path.to_str().unwrap(), "--np", "2"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn init_rejects_a_zero_extent() {
    let dir = tempfile::tempdir().unwrap();
    let init = dir.path().join("init.chk");
    let out = strand(&["init", "--out", init.to_str().unwrap(), "--dims", "4,0", "--field", "phi"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!init.exists());
}

#[test]
fn unknown_log_level_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let params = write_params(dir.path(), &dir.path().join("init.chk"), "");
    let out = strand(&["run", "--params", &params, "--log-level", "loud"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid value 'loud'"), "{stderr}");
}

#[test]
fn debug_log_level_records_step_lines() {
    let dir = tempfile::tempdir().unwrap();
    let init = dir.path().join("init.chk");
    let out = strand(&["init", "--out", init.to_str().unwrap(), "--dims", "8,8", "--field", "phi"]);
    assert!(out.status.success());

    let params = write_params(dir.path(), &init, "");
    let log = dir.path().join("debug.log");
    let out = strand(&[
        "run",
        "--params",
        &params,
        "--np",
        "2",
        "--log",
        log.to_str().unwrap(),
        "--log-level",
        "DEBUG",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("Share data"), "{text}");
}
