use historic_borders::core::etl::ExportOutcome;
use historic_borders::core::session::Commit;
use historic_borders::{
    BorderPipeline, EtlEngine, HttpYearSource, LocalStorage, Partitioner, Timeline,
    TimelineSession, TomlConfig,
};
use httpmock::prelude::*;
use std::io::Read;
use tempfile::TempDir;

fn world_1492() -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"NAME": "Castile", "SUBJECTO": "Castile"},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[-8.0, 37.0], [-2.0, 37.0], [-2.0, 43.0], [-8.0, 43.0], [-8.0, 37.0]]],
                    [[[-16.0, 28.0], [-15.0, 28.0], [-15.0, 29.0], [-16.0, 29.0], [-16.0, 28.0]]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": null},
                "geometry": {"type": "Polygon", "coordinates": [
                    [[20.0, 60.0], [30.0, 60.0], [30.0, 65.0], [20.0, 65.0], [20.0, 60.0]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Venice"},
                "geometry": {"type": "Point", "coordinates": [12.3, 45.4]}
            }
        ]
    })
}

fn export_config(output_path: &str, base_url: String, formats: &[&str], compress: bool) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.dataset.base_url = base_url;
    config.load.output_path = output_path.to_string();
    config.load.output_formats = formats.iter().map(|f| f.to_string()).collect();
    config.load.compress = compress;
    config
}

#[tokio::test]
async fn test_end_to_end_export_geojson_and_csv() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let year_mock = server.mock(|when, then| {
        when.method(GET).path("/geojson/world_1492.geojson");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(world_1492());
    });

    let config = export_config(&output_path, server.url("/geojson"), &["geojson", "csv"], false);
    let source = HttpYearSource::new(&config.dataset.base_url, None).unwrap();
    let pipeline = BorderPipeline::new(LocalStorage::new(&output_path), source, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, false);

    let exports = engine.run(&[1492]).await.unwrap();
    year_mock.assert();

    assert_eq!(exports.len(), 1);
    match &exports[0].outcome {
        ExportOutcome::Written {
            borders,
            labels,
            skipped,
            ..
        } => {
            assert_eq!(*borders, 2);
            assert_eq!(*labels, 3);
            assert_eq!(*skipped, 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let borders: serde_json::Value = serde_json::from_slice(
        &std::fs::read(temp_dir.path().join("borders_1492.geojson")).unwrap(),
    )
    .unwrap();
    let features = borders["features"].as_array().unwrap();
    assert_eq!(features[0]["properties"]["NAME"], "Castile");
    assert_eq!(features[0]["properties"]["SUBJECTO"], "Castile");
    assert!(features[0]["properties"]["COLOR"]
        .as_str()
        .unwrap()
        .starts_with('#'));
    assert_eq!(features[1]["properties"]["NAME"], "unclaimed");

    let labels: serde_json::Value = serde_json::from_slice(
        &std::fs::read(temp_dir.path().join("labels_1492.geojson")).unwrap(),
    )
    .unwrap();
    let label_features = labels["features"].as_array().unwrap();
    assert_eq!(label_features.len(), 3);
    assert!(label_features
        .iter()
        .all(|f| f["geometry"]["type"] == "Point"));

    let csv = std::fs::read_to_string(temp_dir.path().join("summary_1492.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("name,color,polygons,labels,area_km2"));
    assert!(lines.next().unwrap().starts_with("Castile,#"));
    assert!(lines.next().unwrap().starts_with("unclaimed,#"));
}

#[tokio::test]
async fn test_end_to_end_export_zip_and_missing_years() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let bc_mock = server.mock(|when, then| {
        when.method(GET).path("/world_bc2000.geojson");
        then.status(200).json_body(world_1492());
    });
    let empty_mock = server.mock(|when, then| {
        when.method(GET).path("/world_1500.geojson");
        then.status(204);
    });
    let missing_mock = server.mock(|when, then| {
        when.method(GET).path("/world_1600.geojson");
        then.status(404);
    });

    let config = export_config(&output_path, server.base_url(), &["geojson", "csv"], true);
    let source = HttpYearSource::new(&config.dataset.base_url, None).unwrap();
    let pipeline = BorderPipeline::new(LocalStorage::new(&output_path), source, config);
    let engine = EtlEngine::new(pipeline);

    let exports = engine.run(&[-2000, 1500, 1600]).await.unwrap();
    bc_mock.assert();
    empty_mock.assert();
    missing_mock.assert();

    assert!(matches!(exports[0].outcome, ExportOutcome::Written { .. }));
    assert_eq!(exports[1].outcome, ExportOutcome::NoData);
    assert!(exports[2].is_failure());

    let zip_path = temp_dir.path().join("countries_bc2000.zip");
    let mut archive = zip::ZipArchive::new(std::fs::File::open(&zip_path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "borders_bc2000.geojson",
            "labels_bc2000.geojson",
            "summary_bc2000.csv"
        ]
    );

    let mut csv = String::new();
    archive
        .by_name("summary_bc2000.csv")
        .unwrap()
        .read_to_string(&mut csv)
        .unwrap();
    assert!(csv.contains("Castile"));

    assert!(!temp_dir.path().join("countries_1500.zip").exists());
    assert!(!temp_dir.path().join("countries_1600.zip").exists());
}

#[tokio::test]
async fn test_session_over_http_keeps_map_on_failure_and_clears_on_no_content() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/world_1492.geojson");
        then.status(200).json_body(world_1492());
    });
    server.mock(|when, then| {
        when.method(GET).path("/world_1500.geojson");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/world_1600.geojson");
        then.status(204);
    });

    let source = HttpYearSource::new(&server.base_url(), None).unwrap();
    let timeline = Timeline::new(vec![1492, 1500, 1600]).unwrap();
    let session = TimelineSession::new(source, timeline, Partitioner::default());

    let applied = session.select(0).await;
    assert_eq!(
        applied,
        Commit::Applied {
            year: 1492,
            borders: 2,
            labels: 3,
            skipped: 1
        }
    );

    let failed = session.step(1).await;
    assert!(matches!(failed, Commit::Failed { year: 1500, .. }));
    assert_eq!(session.displayed_year().await, Some(1492));
    assert!(session.current_data().await.is_some());

    let cleared = session.select_year(1600).await.unwrap();
    assert_eq!(cleared, Commit::NoData { year: 1600 });
    assert_eq!(session.displayed_year().await, Some(1600));
    assert!(session.current_data().await.is_none());
}
