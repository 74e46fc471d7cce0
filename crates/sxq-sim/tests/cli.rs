use std::fs;
use std::process::Command;

fn sxq_sim() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sxq-sim"))
}

#[test]
fn demo_output_reanalyzes_to_the_same_summary() {
    let dir = tempfile::tempdir().expect("temp dir");
    let demo_out = dir.path().join("demo");
    let status = sxq_sim()
        .args(["demo", "--seed", "7", "--events", "5", "--out"])
        .arg(&demo_out)
        .status()
        .expect("run demo");
    assert!(status.success());
    let demo_summary = fs::read_to_string(demo_out.join("summary.json")).expect("summary");
    assert!(demo_out.join("records.jsonl").exists());

    let rerun_out = dir.path().join("rerun");
    let status = sxq_sim()
        .args(["analyze", "--events"])
        .arg(demo_out.join("events.jsonl"))
        .arg("--out")
        .arg(&rerun_out)
        .status()
        .expect("run analyze");
    assert!(status.success());
    let rerun_summary = fs::read_to_string(rerun_out.join("summary.json")).expect("summary");

    let a: serde_json::Value = serde_json::from_str(&demo_summary).expect("json");
    let b: serde_json::Value = serde_json::from_str(&rerun_summary).expect("json");
    assert_eq!(a["events"], 5);
    assert_eq!(a["hash"], b["hash"]);

    let output = sxq_sim()
        .arg("summary")
        .arg("--input")
        .arg(rerun_out.join("summary.json"))
        .output()
        .expect("run summary");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("unique anti-S"));
}

#[test]
fn tampered_summary_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("summary.json");
    fs::write(
        &path,
        r#"{"events":1,"unique_anti_s":1,"with_granddaughters":1,"reconstructed":1,
            "reconstructed_weighted":1.0,"kshort_codes":{},"anti_lambda_codes":{},"hash":"00"}"#,
    )
    .expect("write");
    let status = sxq_sim().arg("summary").arg("--input").arg(&path).status().expect("run");
    assert!(!status.success());
}

#[test]
fn codes_lists_every_diagnostic() {
    let output = sxq_sim().args(["codes", "--stages"]).output().expect("run codes");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line.starts_with("0 accepted")));
    assert!(stdout.lines().any(|line| line.starts_with("52 ")));
    assert!(stdout.contains("mass_hypothesis"));
}
