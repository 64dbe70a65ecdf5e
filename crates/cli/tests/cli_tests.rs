// End-to-end tests for the `gto` binary.
//
// Fixtures use provider-style headers so schema resolution is exercised too.
// Run with: cargo test -p gto-cli --test cli_tests -- --nocapture

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn gto() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gto"))
}

const SALARIES: &str = "\
Golfer,Salary,Ceiling,RG_ProjPts,RG_Ownership%
Scottie Scheffler,\"$11,500\",110,82,28%
Rory McIlroy,\"$10,700\",104,77,22%
Xander Schauffele,\"$10,100\",99,74,18%
Ludvig Aberg,\"$9,600\",96,71,14%
Collin Morikawa,\"$9,300\",92,69,12%
Matt Fitzpatrick,\"$8,600\",88,64,9%
Tommy Fleetwood,\"$8,400\",87,63,10%
Si Woo Kim,\"$7,600\",80,58,6%
J.T. Poston,\"$7,100\",76,55,4%
Tiger Woods,\"$6,800\",70,45,3%
Davis Love III,\"$6,000\",62,41,1%
";

const ODDS: &str = "\
player_name;make_cut;top_20;top_10;top_5;win
Scheffler, Scottie;0.93;0.72;0.55;0.38;0.18
McIlroy, Rory;0.88;0.61;0.44;0.29;0.11
Schauffele, Xander;0.87;0.58;0.40;0.26;0.08
Aberg, Ludvig;0.84;0.52;0.34;0.21;0.06
Morikawa, Collin;0.83;0.50;0.32;0.19;0.05
Fitzpatrick, Matthew;0.76;0.40;0.23;0.12;0.03
Fleetwood, Tommy;0.78;0.42;0.25;0.13;0.03
Kim, Si Woo;0.70;0.33;0.18;0.09;0.02
Poston, J.T.;0.66;0.28;0.14;0.06;0.01
Love III, Davis;0.40;0.08;0.03;0.01;0.001
";

const MERGED: &str = "\
Golfer,Salary,DG_MakeCut%,DG_Top20%,DG_Top10%,DG_Top5%,DG_Win%,RG_ProjPts,RG_Ownership%,Ceiling
Scottie Scheffler,11500,0.93,0.72,0.55,0.38,0.18,82,28,110
Rory McIlroy,10700,0.88,0.61,0.44,0.29,0.11,77,22,104
Xander Schauffele,10100,0.87,0.58,0.40,0.26,0.08,74,18,99
Ludvig Aberg,9600,0.84,0.52,0.34,0.21,0.06,71,14,96
Collin Morikawa,9300,0.83,0.50,0.32,0.19,0.05,69,12,92
Matt Fitzpatrick,8600,0.76,0.40,0.23,0.12,0.03,64,9,88
Tommy Fleetwood,8400,0.78,0.42,0.25,0.13,0.03,63,10,87
Si Woo Kim,7600,0.70,0.33,0.18,0.09,0.02,58,6,80
J.T. Poston,7100,0.66,0.28,0.14,0.06,0.01,55,4,76
Davis Love III,6000,0.40,0.08,0.03,0.01,0.001,41,1,62
";

const SCORECARD_HEADER: &str =
    "Name,Salary,Ceiling,ProjectedPoints,CompositeOdds,ProjectedOwnership,FinalOwnership";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("salaries.csv"), SALARIES).unwrap();
        std::fs::write(dir.path().join("odds.csv"), ODDS).unwrap();
        std::fs::write(dir.path().join("merged.csv"), MERGED).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        gto()
            .current_dir(self.dir.path())
            .args(args)
            .output()
            .expect("failed to run gto")
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn assert_code(out: &Output, code: i32) {
    assert_eq!(
        out.status.code(),
        Some(code),
        "stdout:\n{}\nstderr:\n{}",
        stdout(out),
        stderr(out)
    );
}

fn final_total(csv: &str) -> f64 {
    csv.lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap().parse::<f64>().unwrap())
        .sum()
}

// ===========================================================================
// gto run
// ===========================================================================

#[test]
fn run_prints_scorecard_csv() {
    let fx = Fixture::new();
    let out = fx.run(&["run", "salaries.csv", "odds.csv"]);
    assert_code(&out, 0);

    let csv = stdout(&out);
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(SCORECARD_HEADER));
    assert!(csv.lines().nth(1).unwrap().starts_with("Scottie Scheffler,11500,110,82,"));
    assert_eq!(csv.lines().count(), 1 + 8);
    assert!(!csv.contains("Davis Love III"));
    assert!(!csv.contains("Tiger Woods"));
    assert!((final_total(&csv) - 600.0).abs() < 1e-6);

    let err = stderr(&out);
    assert!(err.contains("10 matched, 1 excluded"), "{err}");
    assert!(err.contains("excluded: Tiger Woods"), "{err}");
}

#[test]
fn run_writes_five_dated_artifacts() {
    let fx = Fixture::new();
    let out = fx.run(&["run", "salaries.csv", "odds.csv", "--out-dir", "out", "--date", "041425", "-q"]);
    assert_code(&out, 0);
    assert!(stderr(&out).is_empty(), "quiet run wrote to stderr: {}", stderr(&out));

    let dir = fx.path("out");
    let expected = [
        ("GTO_SalaryOwn_041425.csv", "Name,RawBaseOwnership", 10),
        ("GTO_DGOwn_041425.csv", "Name,CompositeOdds,RawOddsOwnership", 10),
        ("GTO_PreElim_041425.csv", "Name,PreEliminationOwnership", 10),
        ("GTO_FinalOwn_041425.csv", "Name,FinalOwnership", 10),
        ("gto_scorecard_041425.csv", SCORECARD_HEADER, 8),
    ];
    for (file, header, rows) in expected {
        let content = std::fs::read_to_string(dir.join(file)).unwrap_or_else(|e| panic!("{file}: {e}"));
        assert_eq!(content.lines().next(), Some(header), "{file}");
        assert_eq!(content.lines().count(), 1 + rows, "{file}");
    }

    let salary_own = std::fs::read_to_string(dir.join("GTO_SalaryOwn_041425.csv")).unwrap();
    assert!(salary_own.contains("Scottie Scheffler,20\n"));
    assert!(salary_own.contains("Davis Love III,0.5\n"));

    // Eliminated rows stay in the final-ownership artifact at zero
    let final_own = std::fs::read_to_string(dir.join("GTO_FinalOwn_041425.csv")).unwrap();
    assert!(final_own.contains("Davis Love III,0\n"));

    let scorecard = std::fs::read_to_string(dir.join("gto_scorecard_041425.csv")).unwrap();
    assert_eq!(scorecard, stdout(&out));
}

#[test]
fn run_json_result() {
    let fx = Fixture::new();
    let out = fx.run(&["run", "salaries.csv", "odds.csv", "--json", "--output", "result.json"]);
    assert_code(&out, 0);

    let val: serde_json::Value = serde_json::from_str(stdout(&out).trim()).expect("stdout must be JSON");
    assert_eq!(val["summary"]["source_a_rows"], 11);
    assert_eq!(val["summary"]["source_b_rows"], 10);
    assert_eq!(val["summary"]["matched"], 10);
    assert_eq!(val["summary"]["survivors"], 8);
    assert_eq!(val["excluded"], serde_json::json!(["Tiger Woods"]));
    assert_eq!(val["meta"]["config_name"], "default");

    let rows = val["scorecard"].as_array().unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0]["Name"], "Scottie Scheffler");
    assert_eq!(rows[0]["ProjectedOwnership"], 28.0);
    let total: f64 = rows.iter().map(|r| r["FinalOwnership"].as_f64().unwrap()).sum();
    assert!((total - 600.0).abs() < 1e-6);

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fx.path("result.json")).unwrap()).unwrap();
    assert_eq!(saved["summary"], val["summary"]);
}

#[test]
fn run_with_config_and_overrides() {
    let fx = Fixture::new();
    fx.write(
        "gto.toml",
        "name = \"Signature\"\n[allocate]\ntarget_total = 450.0\nelimination_percentile = 0.5\n",
    );

    let out = fx.run(&["run", "salaries.csv", "odds.csv", "--config", "gto.toml"]);
    assert_code(&out, 0);
    let csv = stdout(&out);
    assert_eq!(csv.lines().count(), 1 + 5);
    assert!((final_total(&csv) - 450.0).abs() < 1e-6);
    assert!(stderr(&out).contains("scorecard 'Signature'"));

    // Flags win over the file
    let out = fx.run(&["run", "salaries.csv", "odds.csv", "--config", "gto.toml", "--target-total", "600"]);
    assert_code(&out, 0);
    assert!((final_total(&stdout(&out)) - 600.0).abs() < 1e-6);
}

#[test]
fn run_strict_threshold_excludes_fuzzy_names() {
    let fx = Fixture::new();
    let out = fx.run(&["run", "salaries.csv", "odds.csv", "--threshold", "1.0"]);
    assert_code(&out, 0);
    let err = stderr(&out);
    assert!(err.contains("9 matched, 2 excluded"), "{err}");
    assert!(err.contains("Matt Fitzpatrick"), "{err}");
}

#[test]
fn config_aliases_map_unknown_headers() {
    let fx = Fixture::new();
    fx.write("renamed.csv", &SALARIES.replacen("RG_ProjPts", "Median", 1));

    let out = fx.run(&["run", "renamed.csv", "odds.csv"]);
    assert_code(&out, 4);
    let err = stderr(&out);
    assert!(err.contains("ProjectedPoints"), "{err}");
    assert!(err.contains("[aliases.source_a]"), "{err}");

    fx.write("aliases.toml", "[aliases.source_a]\nProjectedPoints = [\"Median\"]\n");
    let out = fx.run(&["run", "renamed.csv", "odds.csv", "--config", "aliases.toml"]);
    assert_code(&out, 0);
}

// ===========================================================================
// gto score
// ===========================================================================

#[test]
fn score_merged_file() {
    let fx = Fixture::new();
    let out = fx.run(&["score", "merged.csv", "--out-dir", "out", "--date", "010225"]);
    assert_code(&out, 0);

    let csv = stdout(&out);
    assert_eq!(csv.lines().next(), Some(SCORECARD_HEADER));
    assert_eq!(csv.lines().count(), 1 + 8);
    assert!((final_total(&csv) - 600.0).abs() < 1e-6);
    assert!(fx.path("out").join("gto_scorecard_010225.csv").exists());
    assert!(stderr(&out).contains("10 matched, 0 excluded"));
}

#[test]
fn score_and_run_agree() {
    let fx = Fixture::new();
    let merged = fx.run(&["score", "merged.csv"]);
    let joined = fx.run(&["run", "salaries.csv", "odds.csv"]);
    assert_code(&merged, 0);
    assert_code(&joined, 0);

    let names = |csv: &str| -> Vec<String> {
        csv.lines().skip(1).map(|l| l.split(',').next().unwrap().to_string()).collect()
    };
    assert_eq!(names(&stdout(&merged)), names(&stdout(&joined)));
}

// ===========================================================================
// gto match
// ===========================================================================

#[test]
fn match_prints_joined_table() {
    let fx = Fixture::new();
    let out = fx.run(&["match", "salaries.csv", "odds.csv"]);
    assert_code(&out, 0);

    let csv = stdout(&out);
    assert_eq!(
        csv.lines().next(),
        Some("Name,Salary,Ceiling,ProjectedPoints,ProjectedOwnership,MakeCutProb,Top20Prob,Top10Prob,Top5Prob,WinProb")
    );
    assert_eq!(csv.lines().count(), 1 + 10);
    assert!(stderr(&out).contains("excluded: Tiger Woods"));
}

#[test]
fn match_json_candidates() {
    let fx = Fixture::new();
    let out = fx.run(&["match", "salaries.csv", "odds.csv", "--json"]);
    assert_code(&out, 0);

    let val: serde_json::Value = serde_json::from_str(stdout(&out).trim()).unwrap();
    assert_eq!(val["matched"], 10);
    assert_eq!(val["excluded"], serde_json::json!(["Tiger Woods"]));
    let candidates = val["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 11);
    let fitz = candidates.iter().find(|c| c["a_name"] == "Matt Fitzpatrick").unwrap();
    assert_eq!(fitz["b_name"], "Fitzpatrick, Matthew");
    assert_eq!(fitz["accepted"], true);
}

// ===========================================================================
// gto validate
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let fx = Fixture::new();
    fx.write("gto.toml", "name = \"Weekly\"\n[reconcile]\nsimilarity_threshold = 0.85\n");
    let out = fx.run(&["validate", "gto.toml"]);
    assert_code(&out, 0);
    assert!(stderr(&out).contains("valid: 'Weekly'"));
}

#[test]
fn validate_rejects_bad_config() {
    let fx = Fixture::new();
    fx.write("range.toml", "[allocate]\nbase_range = [20.0, 0.5]\n");
    assert_code(&fx.run(&["validate", "range.toml"]), 6);

    fx.write("unknown.toml", "[allocate]\ntarget = 600.0\n");
    assert_code(&fx.run(&["validate", "unknown.toml"]), 6);

    fx.write("syntax.toml", "[reconcile\n");
    assert_code(&fx.run(&["validate", "syntax.toml"]), 6);
}

// ===========================================================================
// Exit codes
// ===========================================================================

#[test]
fn missing_input_is_io_error() {
    let fx = Fixture::new();
    let out = fx.run(&["run", "nope.csv", "odds.csv"]);
    assert_code(&out, 3);
    assert!(stderr(&out).starts_with("error: "));
}

#[test]
fn degenerate_field_exit_code() {
    let fx = Fixture::new();
    fx.write(
        "two.csv",
        "Golfer,Salary,Ceiling,RG_ProjPts,RG_Ownership%\nJon Rahm,10000,90,75,15\nRory McIlroy,9000,85,70,12\n",
    );
    fx.write(
        "two_odds.csv",
        "Golfer;DG_MakeCut%;DG_Top20%;DG_Top10%;DG_Top5%;DG_Win%\nRahm, Jon;0.9;0.6;0.4;0.2;0.1\nMcIlroy, Rory;0.85;0.55;0.3;0.15;0.08\n",
    );
    let out = fx.run(&["run", "two.csv", "two_odds.csv"]);
    assert_code(&out, 5);
    assert!(stderr(&out).contains("degenerate input"), "{}", stderr(&out));
}

#[test]
fn non_finite_cell_is_schema_error() {
    let fx = Fixture::new();
    fx.write("nan.csv", &MERGED.replace("Si Woo Kim,7600", "Si Woo Kim,NaN"));
    let out = fx.run(&["score", "nan.csv", "--out-dir", "out"]);
    assert_code(&out, 4);
    let err = stderr(&out);
    assert!(err.contains("row 8: 'Salary' is not a number ('NaN')"), "{err}");
    assert!(stdout(&out).is_empty());
    assert!(!fx.path("out").exists());

    fx.write("inf.csv", &MERGED.replace("0.70,0.33,0.18,0.09,0.02", "0.70,0.33,0.18,0.09,inf"));
    let out = fx.run(&["score", "inf.csv"]);
    assert_code(&out, 4);
    assert!(stderr(&out).contains("'WinProb' is not a number ('inf')"), "{}", stderr(&out));
}

#[test]
fn long_version_names_target() {
    let out = gto().arg("--version").output().expect("failed to run gto");
    assert_code(&out, 0);
    let text = stdout(&out);
    assert!(text.starts_with("gto 0.1.0 ("), "{text}");
    assert!(text.contains("target:  "), "{text}");
}

#[test]
fn usage_errors() {
    let fx = Fixture::new();
    assert_code(&fx.run(&["run", "salaries.csv", "odds.csv", "--date", "2025-04-14"]), 2);
    assert_code(&fx.run(&["run", "salaries.csv", "odds.csv", "--threshold", "1.5"]), 2);
    assert_code(&fx.run(&["run", "salaries.csv"]), 2);
    assert_code(&fx.run(&["bogus"]), 2);
}
