use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn qf_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qf-sim"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn qf-sim")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("json on stdout")
}

#[test]
fn validate_accepts_the_demo_library() {
    let library = fixture("factions.json");
    let output = qf_sim(&["validate", "--factions", library.to_str().expect("utf8")]);
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["valid"], Value::Bool(true));
    assert_eq!(report["factions"], 4);
}

#[test]
fn validate_exits_nonzero_on_open_signatures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"[{"name": "Loose", "ring": "outer", "signature": ["A", "B", "C"],
             "hamiltonian": {"A": {"Nowhere": 1.0}}}]"#,
    )
    .expect("write");
    let output = qf_sim(&["validate", "--factions", path.to_str().expect("utf8")]);
    assert_eq!(output.status.code(), Some(1));
    let report = stdout_json(&output);
    assert_eq!(report["violations"].as_array().expect("violations").len(), 1);
}

#[test]
fn compose_reports_contested_symbols_for_a_preset() {
    let library = fixture("factions.json");
    let output = qf_sim(&[
        "compose",
        "--factions",
        library.to_str().expect("utf8"),
        "--preset",
        "market",
    ]);
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["hash"].as_str().expect("hash").len(), 64);
    let coin = report["affiliation"]
        .as_array()
        .expect("affiliation")
        .iter()
        .find(|entry| entry["symbol"] == "Coin")
        .expect("coin");
    assert_eq!(coin["affiliation"], "contested");
}

#[test]
fn run_is_reproducible_for_a_seed() {
    let config = fixture("run.yaml");
    let args = ["run", "--config", config.to_str().expect("utf8")];
    let first = qf_sim(&args);
    let second = qf_sim(&args);
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    assert_eq!(first.stdout, second.stdout);

    let report = stdout_json(&first);
    assert_eq!(report["ticks"], 25);
    let outcomes = report["outcomes"].as_object().expect("outcomes");
    assert_eq!(outcomes.len(), 3);
    let purity = report["purity"].as_f64().expect("purity");
    assert!(purity > 0.0 && purity <= 1.0 + 1e-9);
    let bloch = report["bloch"].as_object().expect("bloch");
    assert_eq!(bloch.len(), 3);
    for vector in bloch.values() {
        // every axis was measured, so each sits on a pole
        assert!((vector["z"].as_f64().expect("z").abs() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn merge_dry_run_leaves_the_library_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let existing = dir.path().join("library.json");
    fs::copy(fixture("factions.json"), &existing).expect("copy");
    let before = fs::read(&existing).expect("read");
    let incoming = dir.path().join("incoming.json");
    fs::write(
        &incoming,
        r#"[{"name": "Tide Wardens", "ring": "third", "signature": ["Grain", "Famine", "Omen"]},
            {"name": "Salt Traders", "ring": "outer", "signature": ["Salt", "Coin", "Debt"]}]"#,
    )
    .expect("write");

    let output = qf_sim(&[
        "merge",
        "--existing",
        existing.to_str().expect("utf8"),
        "--incoming",
        incoming.to_str().expect("utf8"),
        "--source",
        "patch-7",
        "--dry-run",
    ]);

    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["factions"], 5);
    assert_eq!(report["changes"]["Tide Wardens"]["change"], "updated");
    assert_eq!(report["changes"]["Salt Traders"]["change"], "added");
    assert_eq!(report["changes"]["Salt Traders"]["source"], "patch-7");
    assert_eq!(fs::read(&existing).expect("read"), before);
}
