use crate::core::partition::Partitioner;
use crate::core::year_format::data_token;
use crate::domain::model::{CountrySummary, OutputFormat, PartitionOutcome, TimelineYear};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage, YearSource};
use crate::utils::error::{BordersError, Result};
use geojson::FeatureCollection;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Offline export: the same fetch and partition steps as the interactive
/// session, written to storage instead of a map.
pub struct BorderPipeline<S: Storage, Y: YearSource, C: ConfigProvider> {
    storage: S,
    source: Y,
    config: C,
    partitioner: Partitioner,
}

impl<S: Storage, Y: YearSource, C: ConfigProvider> BorderPipeline<S, Y, C> {
    pub fn new(storage: S, source: Y, config: C) -> Self {
        let partitioner = Partitioner::new(config.label_precision());
        Self {
            storage,
            source,
            config,
            partitioner,
        }
    }
}

pub fn summary_csv(summaries: &[CountrySummary]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "color", "polygons", "labels", "area_km2"])?;
    for summary in summaries {
        writer.write_record([
            summary.name.clone(),
            summary.color.clone(),
            summary.polygons.to_string(),
            summary.labels.to_string(),
            format!("{:.1}", summary.area_km2),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| BordersError::IoError(e.into_error()))
}

fn collection_bytes(collection: &FeatureCollection) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(collection)?)
}

fn zip_files(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage, Y: YearSource, C: ConfigProvider> Pipeline for BorderPipeline<S, Y, C> {
    async fn extract(&self, year: TimelineYear) -> Result<Option<FeatureCollection>> {
        let token = data_token(year);
        tracing::debug!("Extracting year {} (token {})", year, token);
        self.source.fetch_year(&token).await
    }

    async fn transform(&self, raw: FeatureCollection) -> Result<PartitionOutcome> {
        let outcome = self.partitioner.partition(&raw);
        if outcome.skipped > 0 {
            tracing::warn!(
                "⚠️  {} of {} features had no polygon geometry and were skipped",
                outcome.skipped,
                raw.features.len()
            );
        }
        Ok(outcome)
    }

    async fn load(&self, year: TimelineYear, result: PartitionOutcome) -> Result<String> {
        let token = data_token(year);
        let mut files: Vec<(String, Vec<u8>)> = Vec::new();

        for format in self.config.output_formats() {
            match format {
                OutputFormat::GeoJson => {
                    files.push((
                        format!("borders_{}.geojson", token),
                        collection_bytes(&result.data.borders)?,
                    ));
                    files.push((
                        format!("labels_{}.geojson", token),
                        collection_bytes(&result.data.labels)?,
                    ));
                }
                OutputFormat::Csv => {
                    files.push((format!("summary_{}.csv", token), summary_csv(&result.summaries)?));
                }
            }
        }

        if files.is_empty() {
            return Err(BordersError::ValidationError {
                message: "no output formats configured".to_string(),
            });
        }

        if self.config.compress() {
            let archive = format!("countries_{}.zip", token);
            let zip_data = zip_files(&files)?;
            tracing::debug!("Writing {} ({} bytes, {} files)", archive, zip_data.len(), files.len());
            self.storage.write_file(&archive, &zip_data).await?;
            return Ok(format!("{}/{}", self.config.output_path(), archive));
        }

        for (name, data) in &files {
            tracing::debug!("Writing {} ({} bytes)", name, data.len());
            self.storage.write_file(name, data).await?;
        }

        let names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
        Ok(format!("{}/{{{}}}", self.config.output_path(), names.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn names(&self) -> Vec<String> {
            let mut names: Vec<String> = self.files.lock().await.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                BordersError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    struct MockConfig {
        formats: Vec<OutputFormat>,
        compress: bool,
    }

    impl ConfigProvider for MockConfig {
        fn dataset_base_url(&self) -> &str {
            "http://unused.test/"
        }

        fn request_timeout(&self) -> Option<Duration> {
            None
        }

        fn label_precision(&self) -> f64 {
            0.1
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_formats(&self) -> Vec<OutputFormat> {
            self.formats.clone()
        }

        fn compress(&self) -> bool {
            self.compress
        }
    }

    struct FixedSource(Option<FeatureCollection>);

    #[async_trait]
    impl YearSource for FixedSource {
        async fn fetch_year(&self, _token: &str) -> Result<Option<FeatureCollection>> {
            Ok(self.0.clone())
        }
    }

    fn raw() -> FeatureCollection {
        serde_json::from_value(serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"NAME": "Rome"},
                 "geometry": {"type": "MultiPolygon", "coordinates": [[[[10.0, 40.0], [15.0, 40.0], [15.0, 45.0], [10.0, 45.0], [10.0, 40.0]]]]}},
                {"type": "Feature", "properties": {"NAME": "Carthage"},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[8.0, 33.0], [11.0, 33.0], [11.0, 37.0], [8.0, 37.0], [8.0, 33.0]]],
                    [[[1.0, 38.0], [2.0, 38.0], [2.0, 39.0], [1.0, 39.0], [1.0, 38.0]]]
                 ]}}
            ]
        }))
        .unwrap()
    }

    fn pipeline(
        storage: MockStorage,
        formats: Vec<OutputFormat>,
        compress: bool,
    ) -> BorderPipeline<MockStorage, FixedSource, MockConfig> {
        BorderPipeline::new(storage, FixedSource(Some(raw())), MockConfig { formats, compress })
    }

    #[tokio::test]
    async fn test_extract_and_transform() {
        let pipeline = pipeline(MockStorage::new(), vec![OutputFormat::GeoJson], false);

        let raw = pipeline.extract(-264).await.unwrap().unwrap();
        let outcome = pipeline.transform(raw).await.unwrap();

        assert_eq!(outcome.data.borders.features.len(), 2);
        assert_eq!(outcome.data.labels.features.len(), 3);
        assert_eq!(outcome.summaries.len(), 2);
        assert_eq!(outcome.summaries[0].name, "Carthage");
        assert_eq!(outcome.summaries[0].labels, 2);
    }

    #[tokio::test]
    async fn test_extract_no_data() {
        let pipeline = BorderPipeline::new(
            MockStorage::new(),
            FixedSource(None),
            MockConfig {
                formats: vec![OutputFormat::GeoJson],
                compress: false,
            },
        );
        assert!(pipeline.extract(1279).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_writes_geojson_and_csv() {
        let storage = MockStorage::new();
        let pipeline = pipeline(
            storage.clone(),
            vec![OutputFormat::GeoJson, OutputFormat::Csv],
            false,
        );

        let outcome = pipeline.transform(raw()).await.unwrap();
        let location = pipeline.load(-264, outcome).await.unwrap();

        assert!(location.starts_with("test_output/"));
        assert_eq!(
            storage.names().await,
            vec!["borders_bc264.geojson", "labels_bc264.geojson", "summary_bc264.csv"]
        );

        let labels = storage.get_file("labels_bc264.geojson").await.unwrap();
        let labels = crate::core::fetcher::parse_feature_collection(
            std::str::from_utf8(&labels).unwrap(),
        )
        .unwrap();
        assert_eq!(labels.features.len(), 3);

        let csv = String::from_utf8(storage.get_file("summary_bc264.csv").await.unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "name,color,polygons,labels,area_km2");
        assert!(lines[1].starts_with("Carthage,#"));
        assert!(lines[2].starts_with("Rome,#"));
    }

    #[tokio::test]
    async fn test_load_compressed() {
        let storage = MockStorage::new();
        let pipeline = pipeline(
            storage.clone(),
            vec![OutputFormat::GeoJson, OutputFormat::Csv],
            true,
        );

        let outcome = pipeline.transform(raw()).await.unwrap();
        let location = pipeline.load(1000, outcome).await.unwrap();

        assert_eq!(location, "test_output/countries_1000.zip");
        assert_eq!(storage.names().await, vec!["countries_1000.zip"]);

        let zip_bytes = storage.get_file("countries_1000.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        let mut file_names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        file_names.sort();
        assert_eq!(
            file_names,
            vec!["borders_1000.geojson", "labels_1000.geojson", "summary_1000.csv"]
        );
    }

    #[tokio::test]
    async fn test_load_without_formats_fails() {
        let pipeline = pipeline(MockStorage::new(), vec![], false);
        let outcome = pipeline.transform(raw()).await.unwrap();
        assert!(matches!(
            pipeline.load(1000, outcome).await,
            Err(BordersError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_summary_csv_quotes_commas() {
        let summaries = vec![CountrySummary {
            name: "Rome, Republic of".to_string(),
            color: "#aabbcc".to_string(),
            polygons: 1,
            labels: 1,
            area_km2: 12.34,
        }];
        let csv = String::from_utf8(summary_csv(&summaries).unwrap()).unwrap();
        assert!(csv.contains("\"Rome, Republic of\",#aabbcc,1,1,12.3"));
    }
}
