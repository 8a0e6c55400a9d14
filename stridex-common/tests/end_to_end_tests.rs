//! End-to-end tests: files on disk through loading, discovery, classification
//! and subject merging

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use stridex_common::classifier::classify_document;
use stridex_common::loader::DocumentLayout;
use stridex_common::{discover, load_path, LrMetric, SensorFamily, SubjectIndex};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Should write fixture");
    path
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

// =============================================================================
// Normalization scenarios
// =============================================================================

#[test]
fn test_gait_pad_document_normalizes() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "visit.json",
        br#"{"meta":{"patient":{"id":"S1"}}, "data":{"gait_pad":{"values":{"velocity":133.4,"step_length":{"L":61.2,"R":60.5}}}}}"#,
    );

    let outcome = load_path(&path);
    assert!(outcome.errors.is_empty());
    assert_eq!(classify_document(outcome.document.as_ref().unwrap()), SensorFamily::GaitPad);

    let mut index = SubjectIndex::new();
    let report = index.ingest_outcome(&outcome);
    assert_eq!(report.headline(), "1 of 1 files loaded");

    let subject = index.subject("S1").expect("Subject S1 should exist");
    let pad = subject.gait_pad.as_ref().unwrap();
    assert_eq!(pad["velocity"], LrMetric::new(Some(133.4), None));
    assert_eq!(pad["step_length"], LrMetric::new(Some(61.2), Some(60.5)));
    assert_eq!(subject.source_files, vec!["visit.json"]);
}

#[test]
fn test_insole_days_ordered_regardless_of_key_order() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "insole_S2.json",
        br#"{"data":{"smart_insole":{"values":{"day_2":{"balance":{"L":48,"R":52}},"day_1":{"balance":{"L":50,"R":50}}}}}}"#,
    );

    let mut index = SubjectIndex::new();
    index.ingest_path(&path);

    // no meta id: the file stem is the subject id
    let subject = index.subject("insole_S2").unwrap();
    let days: Vec<u32> = subject.insole_days.iter().map(|d| d.day_index).collect();
    assert_eq!(days, vec![1, 2]);
    assert_eq!(
        subject.insole_days[1].metric("balance"),
        Some(&LrMetric::new(Some(48.0), Some(52.0)))
    );
}

#[test]
fn test_later_file_does_not_disturb_other_family() {
    let dir = TempDir::new().unwrap();
    let pad = write_file(
        &dir,
        "a_pad.json",
        br#"{"meta":{"id":"S3"},"data":{"gait_pad":{"values":{"velocity":120}}}}"#,
    );
    let insole = write_file(
        &dir,
        "b_insole.json",
        br#"{"meta":{"id":"S3"},"data":{"smart_insole":{"values":{"day_1":{"gait_speed":4.1}}}}}"#,
    );

    let mut index = SubjectIndex::new();
    let report = index.ingest_paths([&pad, &insole]);
    assert_eq!(report.loaded, 2);

    let subject = index.subject("S3").unwrap();
    assert_eq!(subject.gait_pad.as_ref().unwrap()["velocity"].left, Some(120.0));
    assert_eq!(subject.insole_days[0].metric("gait_speed").unwrap().left, Some(4.1));
    assert_eq!(subject.sensors(), vec![SensorFamily::GaitPad, SensorFamily::SmartInsole]);
}

// =============================================================================
// Loader scenarios
// =============================================================================

#[test]
fn test_jsonl_with_bad_line_keeps_valid_records() {
    let dir = TempDir::new().unwrap();
    let text = concat!(
        "{\"meta\":{\"id\":\"R1\"}}\n",
        "{\"meta\":{\"id\":\"R2\"}}\n",
        "{\"meta\":\n",
        "{\"meta\":{\"id\":\"R3\"}}\n",
        "{\"meta\":{\"id\":\"R4\"}}\n",
    );
    let path = write_file(&dir, "batch.jsonl", text.as_bytes());

    let outcome = load_path(&path);
    assert_eq!(outcome.layout, Some(DocumentLayout::Records));
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("line 3"));
    let records = outcome.document.as_ref().unwrap()["records"].as_array().unwrap();
    assert_eq!(records.len(), 4);

    let mut index = SubjectIndex::new();
    let report = index.ingest_outcome(&outcome);
    assert_eq!(report.documents, 4);
    assert_eq!(index.len(), 4);
}

#[test]
fn test_gzip_ndjson_is_loaded() {
    let dir = TempDir::new().unwrap();
    let body = gzip(b"{\"meta\":{\"id\":\"Z1\"},\"data\":{\"imu_sensor\":{\"values\":{\"gait_cycle\":{\"L\":1.1,\"R\":1.2}}}}}\n");
    let path = write_file(&dir, "imu.ndjson.gz", &body);

    let mut index = SubjectIndex::new();
    let report = index.ingest_path(&path);
    assert_eq!(report.loaded, 1);
    let imu = index.subject("Z1").unwrap().imu.as_ref().unwrap();
    assert_eq!(imu["gait_cycle"], LrMetric::new(Some(1.1), Some(1.2)));
}

#[test]
fn test_missing_file_is_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let good = write_file(&dir, "ok.json", br#"{"meta":{"id":"S1"}}"#);
    let missing = dir.path().join("missing.json");

    let mut index = SubjectIndex::new();
    let report = index.ingest_paths([&missing, &good]);
    assert_eq!(report.headline(), "1 of 2 files loaded");
    assert!(report.errors[0].starts_with("missing.json: load error"));
    assert!(index.subject("S1").is_some());
}

// =============================================================================
// Discovery scenarios
// =============================================================================

#[test]
fn test_discovery_over_loaded_document() {
    let dir = TempDir::new().unwrap();
    let doc = json!({
        "meta": {"patient": {"id": "S1"}},
        "data": {
            "imu_sensor": {"values": {"gait_cycle": {"L": 1.1, "R": 1.2}}},
            "raw": {"accel_x": [0.1, 0.2, 0.3], "pressure_grid": [[[1, 2], [3, 4]]]}
        }
    });
    let path = write_file(&dir, "raw.json", doc.to_string().as_bytes());

    let outcome = load_path(&path);
    let root = Value::Object(outcome.document.unwrap());
    let found = discover(&root);
    let listed: Vec<(String, SensorFamily)> = found.iter().map(|c| (c.path_string(), c.family())).collect();
    assert_eq!(
        listed,
        vec![
            ("root/data/imu_sensor/values/gait_cycle/L".to_string(), SensorFamily::Imu),
            ("root/data/imu_sensor/values/gait_cycle/R".to_string(), SensorFamily::Imu),
            ("root/data/raw/accel_x".to_string(), SensorFamily::Imu),
            ("root/data/raw/pressure_grid".to_string(), SensorFamily::SmartInsole),
        ]
    );
    assert_eq!(found[3].shape, vec![1, 2, 2]);
}

#[test]
fn test_top_level_array_is_wrapped_and_discoverable() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "series.json", b"[1, 2, 3]");
    let outcome = load_path(&path);
    assert_eq!(outcome.layout, Some(DocumentLayout::WrappedRoot));

    let found = discover(&Value::Object(outcome.document.unwrap()));
    assert_eq!(found[0].path_string(), "root/root");
    assert_eq!(found[0].shape, vec![3]);
}
