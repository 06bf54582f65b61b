//! Integration tests for change detection and patch export
//!
//! These run the detector on the snapshot fixtures and check the written
//! change-sets end to end.

mod common;

use roadwatch::config::{BoundingBox, DetectionSettings};
use roadwatch::detect::ChangeDetector;
use roadwatch::patch::export_patch;
use roadwatch::snapshot::read_features;

#[test]
fn test_detect_2016_2017() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("changes_2016_2017.geojson");
    let detector = ChangeDetector::from_settings(&DetectionSettings::default());

    let report = detector
        .detect(
            &common::testdata().join("2016.geojson"),
            &common::testdata().join("2017.geojson"),
            &BoundingBox::default(),
            &output,
        )
        .unwrap();

    // Kaiserdamm moved by well under a metre, A100 segments are excluded,
    // and features outside the box or without line geometry are dropped.
    assert_eq!(report.old_count, 1, "Only Kaiserdamm survives in 2016");
    assert_eq!(report.new_count, 2, "Kaiserdamm and Neue Straße in 2017");
    assert_eq!(report.candidate_count(), 1);
    assert_eq!(report.candidates[0].name(), Some("Neue Straße"));
    assert_eq!(report.output.as_deref(), Some(output.as_path()));

    let written = read_features(&output).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].properties["@id"], "way/900001");

    // Written back in WGS84
    let geo::Geometry::LineString(line) = written[0].geometry.clone().unwrap() else {
        panic!("expected a line");
    };
    assert!((line.0[0].x - 13.290).abs() < 1e-7);
    assert!((line.0[0].y - 52.510).abs() < 1e-7);
}

#[test]
fn test_detect_2017_2020() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("changes_2017_2020.geojson");
    let detector = ChangeDetector::from_settings(&DetectionSettings::default());

    let report = detector
        .detect(
            &common::testdata().join("2017.geojson"),
            &common::testdata().join("2020.geojson"),
            &BoundingBox::default(),
            &output,
        )
        .unwrap();

    assert_eq!(report.candidate_count(), 1);
    assert_eq!(report.candidates[0].name(), Some("Dreieck Funkturm"));
}

#[test]
fn test_identical_snapshots_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("changes.geojson");
    let snapshot = common::testdata().join("2017.geojson");
    let detector = ChangeDetector::from_settings(&DetectionSettings::default());

    let report = detector
        .detect(&snapshot, &snapshot, &BoundingBox::default(), &output)
        .unwrap();

    assert_eq!(report.candidate_count(), 0);
    assert!(report.output.is_none());
    assert!(!output.exists(), "No file should be written without candidates");
}

#[test]
fn test_missing_snapshot_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let detector = ChangeDetector::from_settings(&DetectionSettings::default());
    let result = detector.detect(
        &dir.path().join("missing.geojson"),
        &common::testdata().join("2017.geojson"),
        &BoundingBox::default(),
        &dir.path().join("out.geojson"),
    );
    assert!(result.is_err());
}

#[test]
fn test_detect_then_patch() {
    let dir = tempfile::tempdir().unwrap();
    let changes = dir.path().join("changes.geojson");
    let detector = ChangeDetector::from_settings(&DetectionSettings::default());
    detector
        .detect(
            &common::testdata().join("2017.geojson"),
            &common::testdata().join("2020.geojson"),
            &BoundingBox::default(),
            &changes,
        )
        .unwrap();

    let json = dir.path().join("patch.json");
    let txt = dir.path().join("patch.txt");
    let summary = export_patch(&changes, &json, &txt).unwrap().unwrap();
    assert_eq!(summary.entries, 1);

    let text = std::fs::read_to_string(&txt).unwrap();
    assert_eq!(
        text,
        "ID: 410233146 | Ref:  | Name: Dreieck Funkturm | Type: tertiary | Points: 3"
    );
}
