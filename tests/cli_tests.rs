//! End-to-end tests of the ortho-select binary
//!
//! Each test builds a small run directory and uses `cat` as the aligner, so the
//! fixture sequences are pre-aligned (all the same length).

#![cfg(unix)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ODB_TSV: &str = "\
    pub_og_id\tlevel_taxid\torganism_taxid\torganism_name\tint_prot_id\tpub_gene_id\tdescription\n\
    1at9\t40674\t9606_0\tHomo sapiens\t9606_0:00415a\tATP5MC1\tATP synthase membrane subunit c \
    locus 1\n\
    1at9\t40674\t10090_0\tMus musculus\t10090_0:0034c4\tATP5G1;ATP5MC1\tATP synthase, H+ \
    transporting\n\
    1at9\t40674\t10090_0\tMus musculus\t10090_0:0034c5\tAtp5g1\tATP synthase membrane subunit c \
    locus 1\n\
    1at9\t40674\t43179_0\tIctidomys tridecemlineatus\t43179_0:001a2b\tATP5MC1\tATP synthase \
    membrane subunit c locus 1\n\
    1at9\t40674\t9823_0\tSus scrofa\t9823_0:003c30\tLOC100519871\tuncharacterized protein\n\
";

const ODB_FASTA: &str = ">9606_0:00415a
MKVLAAGGTT
>10090_0:0034c4
MKVLAAGGTA
>10090_0:0034c5
MKVLAAGGAA
>43179_0:001a2b
MKVLAAGGTC
>9823_0:003c30
PPPPPPPPPP
";

const NCBI_FASTA: &str = "\
    >XP_026242723.1 ATP synthase F(0) complex subunit C1, mitochondrial [Urocitellus parryii]\n\
    MKVLAAGGTC\n\
    >XP_026242724.1 ATP synthase F(0) complex subunit C1, mitochondrial isoform X2 [Urocitellus \
    parryii]\n\
    MKAAAAGGTC\n\
";

/// Write the ATP5MC1 inputs into a fresh run directory
fn run_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create run directory");
    let root = dir.path();
    write(&root.join("input/ODB/ATP5MC1.tsv"), ODB_TSV);
    write(&root.join("input/ODB/ATP5MC1.fasta"), ODB_FASTA);
    write(&root.join("input/NCBI/9999/ATP5MC1.fasta"), NCBI_FASTA);
    write(&root.join("input/aliases/ATP5MC1_aliases.txt"), "ATP5G1\n");
    dir
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn select_cmd(run: &Path) -> Command {
    select_with_aligner(run, "cat")
}

fn select_with_aligner(run: &Path, aligner: &str) -> Command {
    let mut cmd = Command::cargo_bin("ortho-select").unwrap();
    cmd.arg("select")
        .arg("--run-dir")
        .arg(run)
        .args(["--ncbi-taxid", "9999"])
        .args(["--ncbi-tax-name", "Urocitellus parryii"])
        .args(["--odb-test-taxid", "43179_0"])
        .args(["--tax-subset", "9606_0,10090_0,43179_0"])
        .args(["--aligner", aligner]);
    cmd
}

#[test]
fn test_select_writes_final_dataset() {
    let run = run_dir();

    select_cmd(run.path())
        .arg("ATP5MC1")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ATP5MC1: 4 records, NCBI XP_026242723.1 (NCBI min dist)",
        ))
        .stdout(predicate::str::contains("1 selected, 0 failed, 0 skipped"));

    let out = run.path().join("output/ATP5MC1");
    assert!(out.join("ATP5MC1.fasta").exists());
    assert!(out.join("ATP5MC1_msa.fasta").exists());

    let records = std::fs::read_to_string(out.join("ATP5MC1_records.tsv")).unwrap();
    let mut lines = records.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("record_id\t"));
    assert!(header.ends_with("db_source\tselection_type\tlength\tdist\tseq"));
    assert!(!header.contains("pub_og_id"));

    let ids: Vec<&str> = lines.map(|l| l.split('\t').next().unwrap()).collect();
    assert_eq!(
        ids,
        vec!["9606_0:00415a", "10090_0:0034c4", "43179_0:001a2b", "XP_026242723.1"]
    );
    assert!(records.contains("symbol match single record"));
    // Two exact symbol matches for mouse, resolved by distance
    assert!(records.contains("symbol match min dist"));
    assert!(!records.contains("XP_026242724.1"));
}

#[test]
fn test_select_logs_data_errors_and_skips_on_rerun() {
    let run = run_dir();

    select_cmd(run.path())
        .args(["ATP5MC1", "CALM1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CALM1: ParseError"))
        .stdout(predicate::str::contains("1 selected, 1 failed, 0 skipped"));

    let errors = std::fs::read_to_string(run.path().join("summary/errors.tsv")).unwrap();
    assert!(errors.starts_with("gene_symbol\terror_type\tmessage\tlogged_at\n"));
    assert!(errors.contains("CALM1\tParseError\t"));

    select_cmd(run.path())
        .arg("CALM1")
        .assert()
        .success()
        .stdout(predicate::str::contains("CALM1: skipped"));

    select_cmd(run.path())
        .args(["CALM1", "--retry-errors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 selected, 1 failed, 0 skipped"));

    // The repeated error is not logged twice
    let errors = std::fs::read_to_string(run.path().join("summary/errors.tsv")).unwrap();
    assert_eq!(errors.lines().count(), 2);
}

#[test]
fn test_select_json_and_symbols_file() {
    let run = run_dir();
    let symbols = run.path().join("genes.txt");
    std::fs::write(&symbols, "# genes\nATP5MC1\n").unwrap();

    let output = select_cmd(run.path())
        .arg("--symbols-file")
        .arg(&symbols)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let outcomes = json.as_array().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["symbol"], "ATP5MC1");
    assert_eq!(outcomes[0]["status"], "selected");
    assert_eq!(outcomes[0]["ncbi_record"], "XP_026242723.1");
    assert_eq!(outcomes[0]["records"], 4);
}

#[test]
fn test_manual_selection_is_annotated() {
    let run = run_dir();
    write(
        &run.path().join("manual_record_selections.tsv"),
        "gene_symbol\trecord_id\nATP5MC1\tXP_026242723.1\n",
    );

    select_cmd(run.path()).arg("ATP5MC1").assert().success();

    let records =
        std::fs::read_to_string(run.path().join("output/ATP5MC1/ATP5MC1_records.tsv")).unwrap();
    let ncbi_row = records
        .lines()
        .find(|l| l.starts_with("XP_026242723.1"))
        .unwrap();
    assert!(ncbi_row.contains("\tNCBI\tmanual selection\t"));
}

#[test]
fn test_select_requires_symbols() {
    let run = run_dir();
    select_cmd(run.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No gene symbols given"));
}

#[test]
fn test_select_rejects_missing_aligner() {
    let run = run_dir();
    select_with_aligner(run.path(), "/nonexistent/aligner")
        .arg("ATP5MC1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to process ATP5MC1"));
}

#[test]
fn test_records_tsv() {
    let run = run_dir();
    Command::cargo_bin("ortho-select")
        .unwrap()
        .arg("records")
        .arg(run.path().join("input/NCBI/9999/ATP5MC1.fasta"))
        .args(["--taxid", "9999", "--tax-name", "Urocitellus parryii"])
        .args(["--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "record_id\torganism_taxid\torganism_name\tdescription\tlength\tseq\n",
        ))
        .stdout(predicate::str::contains("XP_026242724.1\t9999\tUrocitellus parryii"));
}

#[test]
fn test_records_unknown_organism() {
    let run = run_dir();
    Command::cargo_bin("ortho-select")
        .unwrap()
        .arg("records")
        .arg(run.path().join("input/NCBI/9999/ATP5MC1.fasta"))
        .args(["--taxid", "10090", "--tax-name", "Mus musculus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Urocitellus parryii"));
}

#[test]
fn test_distance_tsv() {
    let run = run_dir();
    Command::cargo_bin("ortho-select")
        .unwrap()
        .arg("distance")
        .arg(run.path().join("input/NCBI/9999/ATP5MC1.fasta"))
        .args(["--aligner", "cat", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "XP_026242723.1\t0.0000\t0.2000",
        ));
}
