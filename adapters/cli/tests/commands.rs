use std::{fs, path::Path, process::Command};

fn harpia() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_harpia"));
    let _ = command.env("RUST_LOG", "warn");
    command
}

fn generate(output: &Path, extra: &[&str]) -> std::process::Output {
    harpia()
        .args(["generate", "--entities", "3", "--frames", "30", "--seed", "5"])
        .arg("--output")
        .arg(output)
        .args(extra)
        .output()
        .expect("failed to run harpia generate")
}

#[test]
fn generate_writes_table_and_report() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let output = directory.path().join("run.csv");

    let result = generate(&output, &["--oracle", "classical"]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let report = String::from_utf8(result.stdout).expect("utf-8 report");
    assert!(report.contains("Phoenix triggers:"));
    assert!(report.contains("Frames recorded:     30 (rejected: 0)"));

    let table = fs::read_to_string(&output).expect("table written");
    let mut lines = table.lines();
    let header = lines.next().expect("header row");
    assert!(header
        .starts_with("Frame,T,Caos_Original,Caos_Fenix,Ruido_Vibracional,Fluxo_Qiskit,q0_x"));
    assert!(header.ends_with("q2_VR_Ganho,q2_Torque"));
    assert_eq!(lines.count(), 30);
}

#[test]
fn same_seed_reproduces_table() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let first = directory.path().join("first.csv");
    let second = directory.path().join("second.csv");

    assert!(generate(&first, &[]).status.success());
    assert!(generate(&second, &[]).status.success());
    assert_eq!(
        fs::read(first).expect("first table"),
        fs::read(second).expect("second table")
    );
}

#[test]
fn run_file_supplies_defaults() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let config = directory.path().join("run.toml");
    fs::write(
        &config,
        "seed = 9\noracle = \"classical\"\n\n[simulation]\nentity_count = 2\nframe_count = 4\n",
    )
    .expect("run file written");
    let output = directory.path().join("from_file.csv");

    let result = harpia()
        .arg("generate")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .output()
        .expect("failed to run harpia generate");
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let report = String::from_utf8(result.stdout).expect("utf-8 report");
    assert!(report.contains("entities:          2"));
    assert!(report.contains("oracle:            classical"));
    assert!(report.contains("seed:              0x9"));
}

#[test]
fn invalid_configuration_fails_before_writing() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let output = directory.path().join("never.csv");

    let result = harpia()
        .args(["generate", "--frames", "0", "--output"])
        .arg(&output)
        .output()
        .expect("failed to run harpia generate");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("frame"));
    assert!(!output.exists());
}

#[test]
fn replay_prints_hud_for_generated_table() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let output = directory.path().join("replay.csv");
    assert!(generate(&output, &[]).status.success());

    let result = harpia()
        .arg("replay")
        .arg("--input")
        .arg(&output)
        .args(["--limit", "3"])
        .output()
        .expect("failed to run harpia replay");
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let hud = String::from_utf8(result.stdout).expect("utf-8 hud");
    assert!(hud.contains("REPLAY MODE - EXTERNAL PLAYER | 3 entities | 30 frames"));
    assert_eq!(hud.matches("PLAYBACK: Frame").count(), 3);
    assert!(hud.contains("PLAYBACK: Frame 0/30"));
}

#[test]
fn replay_of_missing_table_fails() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let result = harpia()
        .arg("replay")
        .arg("--input")
        .arg(directory.path().join("absent.csv"))
        .output()
        .expect("failed to run harpia replay");

    assert!(!result.status.success());
    assert!(result.stdout.is_empty());
    assert!(String::from_utf8_lossy(&result.stderr).contains("failed to load telemetry"));
}

#[test]
fn replay_of_malformed_table_fails() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let input = directory.path().join("broken.csv");
    fs::write(&input, "Frame,T\n0,0.0\n").expect("table written");

    let result = harpia()
        .arg("replay")
        .arg("--input")
        .arg(&input)
        .output()
        .expect("failed to run harpia replay");

    assert!(!result.status.success());
    assert!(result.stdout.is_empty());
}
