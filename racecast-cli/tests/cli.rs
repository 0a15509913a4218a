use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "racecast-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let exe = env!("CARGO_BIN_EXE_racecast");
    let output = Command::new(exe)
        .args(args)
        .args(["--report", "json"])
        .env("NO_COLOR", "1")
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "racecast {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json report")
}

#[test]
fn cli_lists_tracks_to_output_file() {
    let exe = env!("CARGO_BIN_EXE_racecast");
    let output_path = temp_path("tracks");
    let status = Command::new(exe)
        .args(["tracks", "--output"])
        .arg(&output_path)
        .env("NO_COLOR", "1")
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Circuits"));
    assert!(content.contains("monaco"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_drivers_json_lists_the_registry() {
    let drivers = run_json(&["drivers"]);
    let list = drivers.as_array().expect("driver array");
    assert_eq!(list.len(), 19);
    assert!(list.iter().any(|d| d["code"] == "VER"));
}

#[test]
fn cli_predictions_replay_from_share_codes() {
    let first = run_json(&["predict", "--track", "spa", "--seed", "42", "--chaos"]);
    let code = first["share_code"].as_str().expect("share code").to_string();
    assert!(code.starts_with("CX-"));
    assert_eq!(first["result"]["chaos"], true);
    assert_eq!(first["track"]["key"], "spa");

    let replay = run_json(&["predict", "--track", "spa", "--code", &code]);
    assert_eq!(replay["share_code"], first["share_code"]);
    assert_eq!(replay["result"]["entries"], first["result"]["entries"]);
}

#[test]
fn cli_chaos_keeps_the_qualifying_grid() {
    let calm = run_json(&["predict", "--track", "monza", "--seed", "5"]);
    let wild = run_json(&["predict", "--track", "monza", "--seed", "5", "--chaos"]);
    assert_eq!(calm["grid"], wild["grid"]);
    let suffix = |report: &serde_json::Value| {
        report["share_code"].as_str().expect("share code")[3..].to_string()
    };
    assert_eq!(suffix(&calm), suffix(&wild));

    let other = run_json(&["qualify", "--track", "monza", "--seed", "300"]);
    let first = run_json(&["qualify", "--track", "monza", "--seed", "100"]);
    assert_ne!(other["share_code"], first["share_code"]);
}

#[test]
fn cli_weight_overrides_reach_the_model() {
    let report = run_json(&[
        "predict", "--seed", "7", "--weight", "pace=0", "--weight", "team=0.25",
    ]);
    let weight = |name: &str| report["result"]["weights"][name].as_f64().expect("weight");
    assert!(weight("pace").abs() < 1e-9);
    assert!((weight("team") - 0.25).abs() < 1e-9);
    assert!((weight("quali") - 0.85).abs() < 1e-9);
}

#[test]
fn cli_grid_override_sets_the_starting_order() {
    let quali = run_json(&["qualify", "--seed", "11", "--track", "monza"]);
    let mut order: Vec<String> = quali["grid"]
        .as_array()
        .expect("grid array")
        .iter()
        .map(|e| e["driver"].as_str().expect("code").to_string())
        .collect();
    order.reverse();
    let joined = order.join(",");

    let report = run_json(&["predict", "--seed", "11", "--track", "monza", "--grid", &joined]);
    assert_eq!(report["grid"][0]["driver"], order[0].as_str());
}

#[test]
fn cli_rejects_unknown_tracks_and_codes() {
    let exe = env!("CARGO_BIN_EXE_racecast");
    let output = Command::new(exe)
        .args(["predict", "--track", "imola", "--seed", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("track not found: imola"));

    let output = Command::new(exe)
        .args(["qualify", "--code", "PIT-STOP"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unrecognized share code"));
}

#[test]
fn cli_batch_counts_every_run() {
    let summary = run_json(&["batch", "--track", "baku", "--runs", "12", "--seed", "3"]);
    assert_eq!(summary["runs"], 12);
    let wins: u64 = summary["standings"]
        .as_array()
        .expect("standings")
        .iter()
        .map(|t| t["wins"].as_u64().unwrap_or(0))
        .sum();
    assert_eq!(wins, 12);
}
