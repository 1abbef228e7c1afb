use std::collections::HashSet;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::{tempdir, TempDir};

use wordfall::words::{Language, SqliteSource, WordRecord};

/// Binary isolated from the user's config, state and score files
fn wordfall(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wordfall").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("WORDFALL_LOG")
        .arg("--config")
        .arg(home.path().join("config.json"))
        .arg("--scores-db")
        .arg(home.path().join("scores.db"));
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

fn stderr_of(cmd: &mut Command) -> String {
    let out = cmd.assert().failure().get_output().stderr.clone();
    String::from_utf8_lossy(&out).into_owned()
}

#[test]
fn next_prints_a_word_record() {
    let home = tempdir().unwrap();
    let word = stdout_json(wordfall(&home).args(["next", "--tier", "easy", "--language", "en"]));
    assert_eq!(word["language"], "en");
    let len = word["length"].as_u64().unwrap();
    assert!((2..=4).contains(&len), "length {len}");
}

#[test]
fn batch_words_are_distinct() {
    let home = tempdir().unwrap();
    let words = stdout_json(wordfall(&home).args([
        "--seed", "4", "batch", "--tier", "normal", "--count", "5",
    ]));
    let texts: HashSet<&str> = words
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts.len(), 5);
}

#[test]
fn seeded_runs_repeat() {
    let home = tempdir().unwrap();
    let args = ["--seed", "21", "batch", "--tier", "hard", "--language", "fr"];
    let a = stdout_json(wordfall(&home).args(args));
    let b = stdout_json(wordfall(&home).args(args));
    assert_eq!(a, b);
}

#[test]
fn stats_of_a_fresh_deck() {
    let home = tempdir().unwrap();
    let stats = stdout_json(wordfall(&home).args(["stats", "--tier", "expert", "--level", "7"]));
    assert_eq!(stats["band"], 6);
    assert_eq!(stats["cursor"], 0);
    assert_eq!(stats["remaining"], stats["total"]);
}

#[test]
fn invalid_inputs_are_rejected() {
    let home = tempdir().unwrap();
    let err = stderr_of(wordfall(&home).args(["next", "--tier", "insane"]));
    assert!(err.contains("unknown tier"), "{err}");

    let err = stderr_of(wordfall(&home).args(["next", "--tier", "easy", "--language", "de"]));
    assert!(err.contains("unknown language"), "{err}");

    let err = stderr_of(wordfall(&home).args(["next", "--tier", "easy", "--level", "0"]));
    assert!(err.contains("out of range"), "{err}");

    let err = stderr_of(wordfall(&home).args(["batch", "--tier", "easy", "--count", "51"]));
    assert!(err.contains("count 51"), "{err}");
}

fn seed_corpus(path: &Path) {
    let source = SqliteSource::open(path).unwrap();
    source
        .insert_batch(&[
            WordRecord::new("zèbre", Language::Fr, 1, 30),
            WordRecord::new("yaourt", Language::Fr, 2, 12),
        ])
        .unwrap();
}

#[test]
fn words_come_from_the_sqlite_corpus() {
    let home = tempdir().unwrap();
    let db = home.path().join("words.db");
    seed_corpus(&db);

    let words = stdout_json(
        wordfall(&home)
            .arg("--db")
            .arg(&db)
            .args(["batch", "--tier", "normal", "--language", "fr", "--count", "2"]),
    );
    let texts: HashSet<&str> = words
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, HashSet::from(["zèbre", "yaourt"]));
}

#[test]
fn empty_score_boards_are_listed() {
    let home = tempdir().unwrap();
    let out = wordfall(&home)
        .args(["scores", "--language", "en"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("en easy"));
    assert!(text.contains("en expert"));
    assert!(!text.contains("fr normal"));
}

#[test]
fn empty_tier_totals_are_listed() {
    let home = tempdir().unwrap();
    let out = wordfall(&home)
        .args(["scores", "--summary"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.lines().all(|l| l.contains(" 0 games")), "{text}");
}

#[test]
fn play_requires_a_terminal() {
    let home = tempdir().unwrap();
    let err = stderr_of(wordfall(&home).args(["play"]).write_stdin(""));
    assert!(err.contains("interactive terminal"), "{err}");
}
