use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

/// Two movies, two users; movie 0 is linked to user 2.
fn write_dataset(dir: &Path) {
    let graph = r#"{
        "nodes": [
            {"id": 0, "type": "movie", "year": "1999"},
            {"id": 1, "type": "movie", "year": 2004},
            {"id": 2, "type": "user", "age": "31"},
            {"id": 3, "type": "user", "age": 0}
        ],
        "links": [{"source": 2, "target": 0}]
    }"#;
    let meta = r#"[{"name": "year", "nodeType": "movie"}, {"name": "age", "nodeType": "user"}]"#;
    fs::write(dir.join("graph.json"), graph).unwrap();
    fs::write(dir.join("attr-meta.json"), meta).unwrap();
}

#[test]
fn test_cli_stats() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("stats").arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Nodes:          4"))
        .stdout(predicate::str::contains("Edges:          1"))
        .stdout(predicate::str::contains("Candidates:     4"))
        .stdout(predicate::str::contains("Unseen:         3"));
    Ok(())
}

#[test]
fn test_cli_candidates() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let out = dir.path().join("out");

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("candidates").arg(dir.path()).arg("-o").arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Observed:       1"))
        .stdout(predicate::str::contains("Unseen:         3"));

    let csv = fs::read_to_string(out.join("candidates.csv"))?;
    assert_eq!(csv, "other,user,observed\n0,2,1\n0,3,0\n1,2,0\n1,3,0\n");
    Ok(())
}

#[test]
fn test_cli_empty_user_side_strict() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("stats").arg(dir.path()).arg("--user-type").arg("critic");
    cmd.assert().success().stdout(predicate::str::contains("Candidates:     0"));

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("stats").arg(dir.path()).arg("--user-type").arg("critic").arg("--strict");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn test_cli_features() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let out = dir.path().join("out");

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("features").arg(dir.path()).arg("-o").arg(&out);
    cmd.assert().success().stdout(predicate::str::contains("4 x 2"));

    let csv = fs::read_to_string(out.join("features.csv"))?;
    assert_eq!(csv, "1999.000,0.000\n2004.000,0.000\n0.000,31.000\n0.000,0.000\n");

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("features").arg(dir.path()).arg("-o").arg(&out).arg("--binary");
    cmd.assert().success();
    let csv = fs::read_to_string(out.join("features.csv"))?;
    assert_eq!(csv, "1,0\n1,0\n0,1\n0,0\n");
    Ok(())
}

#[test]
fn test_cli_score_pipeline() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let out = dir.path().join("out");
    let emb = dir.path().join("z.csv");
    // movie0 . user2 = 1, movie0 . user3 = 2, movie1 . user2 = -1, movie1 . user3 = 0.5
    fs::write(&emb, "1,0\n-1,2.5\n1,0\n2,1\n")?;

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("score")
        .arg(dir.path())
        .arg("--embeddings")
        .arg(&emb)
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Predicted true:  3"))
        .stdout(predicate::str::contains("Predicted false: 1"));

    let results: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("prediction-results.json"))?)?;
    assert_eq!(results["isLinkPrediction"], true);
    assert_eq!(results["trueAllowEdges"], serde_json::json!([[0, 2], [0, 3], [1, 3]]));
    assert_eq!(results["falseAllowEdges"], serde_json::json!([[1, 2]]));
    // unseen ranked: (0,3)=2 then (1,3)=0.5
    assert_eq!(results["trueUnseenEdgesSorted"]["3"], serde_json::json!([0, 1]));

    let embeddings = fs::read_to_string(out.join("node-embeddings.csv"))?;
    assert_eq!(embeddings.lines().next(), Some("1.000,0.000"));

    let graph: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("graph.json"))?)?;
    assert_eq!(graph["links"], serde_json::json!([{"source": 0, "target": 2}]));
    assert_eq!(graph["nodes"].as_array().map(Vec::len), Some(4));
    assert!(out.join("features.csv").exists());
    Ok(())
}

#[test]
fn test_cli_split_reproducible() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let a = dir.path().join("a");
    let b = dir.path().join("b");

    for out in [&a, &b] {
        let mut cmd = Command::cargo_bin("biplink")?;
        cmd.arg("split").arg(dir.path()).arg("-o").arg(out).arg("--seed").arg("7");
        cmd.assert().success().stdout(predicate::str::contains("train 1"));
    }

    assert_eq!(
        fs::read_to_string(a.join("edge-split.json"))?,
        fs::read_to_string(b.join("edge-split.json"))?
    );
    Ok(())
}

#[test]
fn test_cli_split_then_score_small_graph() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let out = dir.path().join("out");
    let emb = dir.path().join("z.csv");
    fs::write(&emb, "1,0\n-1,2.5\n1,0\n2,1\n")?;

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("split").arg(dir.path()).arg("-o").arg(&out);
    cmd.assert().success();

    // One edge: nothing held out, so AUC is undefined but the run still completes.
    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("score")
        .arg(dir.path())
        .arg("--embeddings")
        .arg(&emb)
        .arg("-o")
        .arg(&out)
        .arg("--split")
        .arg(out.join("edge-split.json"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("AUC unavailable"))
        .stdout(predicate::str::contains("Predicted true:  3"));

    assert!(out.join("prediction-results.json").exists());
    assert!(out.join("node-embeddings.csv").exists());
    assert!(out.join("graph.json").exists());
    assert!(out.join("features.csv").exists());
    Ok(())
}

#[test]
fn test_cli_score_reports_auc() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let emb = dir.path().join("z.csv");
    fs::write(&emb, "1,0\n-1,2.5\n1,0\n2,1\n")?;
    let split = dir.path().join("split.json");
    fs::write(
        &split,
        r#"{
            "trainPos": [],
            "valPos": [{"source": 0, "target": 2}],
            "valNeg": [[1, 2]],
            "testPos": [{"source": 0, "target": 3}],
            "testNeg": [[1, 3]]
        }"#,
    )?;

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("score")
        .arg(dir.path())
        .arg("--embeddings")
        .arg(&emb)
        .arg("-o")
        .arg(dir.path().join("out"))
        .arg("--split")
        .arg(&split);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Val AUC: 1.0000 | Test AUC: 1.0000"));
    Ok(())
}

#[test]
fn test_cli_score_rejects_extra_embedding_rows() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let emb = dir.path().join("z.csv");
    fs::write(&emb, "1,0\n-1,2.5\n1,0\n2,1\n0,0\n")?;

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("score")
        .arg(dir.path())
        .arg("--embeddings")
        .arg(&emb)
        .arg("-o")
        .arg(dir.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("5 rows but the graph has 4 nodes"));
    Ok(())
}

#[test]
fn test_cli_classify_bad_inputs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let logits = dir.path().join("logits.csv");
    let labels = dir.path().join("labels.txt");
    let out = dir.path().join("out");

    fs::write(&logits, "0.1,0.9\n0.8,0.2\n0.3,0.7\n")?;
    fs::write(&labels, "1\n\n0\nx\n")?;
    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("classify").arg("--logits").arg(&logits).arg("--labels").arg(&labels).arg("-o").arg(&out);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("line 4 is not a label: x"));

    fs::write(&logits, "0.1,0.9\nhigh,0.2\n")?;
    fs::write(&labels, "1\n0\n")?;
    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("classify").arg("--logits").arg(&logits).arg("--labels").arg(&labels).arg("-o").arg(&out);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("logits row 1"))
        .stderr(predicate::str::contains("embedding").not());
    Ok(())
}

#[test]
fn test_cli_classify() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let logits = dir.path().join("logits.csv");
    let labels = dir.path().join("labels.txt");
    let out = dir.path().join("out");
    fs::write(&logits, "0.1,0.9\n0.8,0.2\n0.3,0.7\n")?;
    fs::write(&labels, "1\n0\n0\n")?;

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("classify")
        .arg("--logits")
        .arg(&logits)
        .arg("--labels")
        .arg(&labels)
        .arg("-o")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Classes:  2"))
        .stdout(predicate::str::contains("Accuracy: 0.6667"));

    let results: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("prediction-results.json"))?)?;
    assert_eq!(results["predLabels"], serde_json::json!([1, 0, 1]));
    assert_eq!(results["numNodeClasses"], 2);
    Ok(())
}

#[test]
fn test_cli_missing_dataset_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("stats").arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing required file"));
    Ok(())
}

#[test]
fn test_cli_non_numeric_attribute_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_dataset(dir.path());
    let graph = fs::read_to_string(dir.path().join("graph.json"))?.replace("\"31\"", "\"old\"");
    fs::write(dir.path().join("graph.json"), graph)?;

    let mut cmd = Command::cargo_bin("biplink")?;
    cmd.arg("features").arg(dir.path()).arg("-o").arg(dir.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not numeric"));
    Ok(())
}
