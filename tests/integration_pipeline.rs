//! Integration test for a full pipeline run
//!
//! Runs every stage against the snapshot fixtures in a scratch work
//! directory, with local responders in place of the public APIs.

mod common;

use roadwatch::config::PipelineConfig;
use roadwatch::pipeline::run_pipeline;

const OVERPASS: &str = r#"{"elements": [
    {"type": "way", "id": 407967885, "tags": {"highway": "construction"},
     "geometry": [{"lat": 52.495, "lon": 13.295}, {"lat": 52.500, "lon": 13.295}]}
]}"#;

fn config(work_dir: &std::path::Path, overpass: &str, osm: &str) -> PipelineConfig {
    let mut config = PipelineConfig {
        work_dir: work_dir.to_path_buf(),
        ..Default::default()
    };
    config.construction.endpoint = format!("{overpass}/api/interpreter");
    config.construction.timeout_secs = 5;
    config.history.base_url = format!("{osm}/api/0.6");
    config.history.timeout_secs = 5;
    config.history.way_ids = vec![26_144_116, 169_762_615];
    config.compare.width = 200;
    config.compare.height = 200;
    config
}

#[test]
fn test_full_run() {
    let dir = tempfile::tempdir().unwrap();
    common::copy_snapshots(dir.path());

    let (overpass, overpass_server) = common::serve(vec![(200, OVERPASS.to_owned())]);
    let (osm, osm_server) = common::serve(vec![
        (
            200,
            r#"<osm><way id="26144116" version="1" timestamp="2008-09-21T21:34:58Z"/></osm>"#
                .to_owned(),
        ),
        (404, String::new()),
    ]);

    let report = run_pipeline(&config(dir.path(), &overpass, &osm)).unwrap();
    overpass_server.join().unwrap();
    osm_server.join().unwrap();

    assert_eq!(report.pairs.len(), 2);
    assert_eq!(report.pairs[0].candidates, 1);
    assert_eq!(report.pairs[1].candidates, 1);
    assert_eq!(report.construction, 1);
    assert_eq!(report.timestamps[0].timestamp, "2008-09-21T21:34:58Z");
    assert_eq!(report.timestamps[1].timestamp, "Failed to fetch: 404");
    assert!(report.ssim.score < 1.0);
    assert_eq!(report.patch.as_ref().map(|p| p.entries), Some(1));
    assert_eq!(report.warnings.len(), 1, "{:?}", report.warnings);

    for name in [
        "changes_2016_2017.geojson",
        "changes_2017_2020.geojson",
        "overpass_2016_2017.geojson",
        "a100_timestamps.csv",
        "ssim_2016_2017.png",
        "patch_2016_2017.json",
        "patch_2016_2017.txt",
    ] {
        assert!(dir.path().join(name).exists(), "{name} should be written");
    }

    let patch = std::fs::read_to_string(dir.path().join("patch_2016_2017.txt")).unwrap();
    assert!(patch.starts_with("ID: way/900001 | Ref:  | Name: Neue Straße"));
}

#[test]
fn test_network_failures_do_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    common::copy_snapshots(dir.path());

    let mut config = config(dir.path(), "http://127.0.0.1:9", "http://127.0.0.1:9");
    config.construction.timeout_secs = 2;
    config.history.timeout_secs = 2;

    let report = run_pipeline(&config).unwrap();
    assert_eq!(report.construction, 0);
    assert!(!dir.path().join("overpass_2016_2017.geojson").exists());
    assert!(
        report
            .timestamps
            .iter()
            .all(|r| r.timestamp.starts_with("Error: "))
    );
    // construction plus one per way
    assert_eq!(report.warnings.len(), 3);
    assert!(dir.path().join("patch_2016_2017.json").exists());
}

#[test]
fn test_missing_snapshot_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "http://127.0.0.1:9", "http://127.0.0.1:9");
    assert!(run_pipeline(&config).is_err());
}
