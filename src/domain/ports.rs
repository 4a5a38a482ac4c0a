use crate::domain::model::{CountryData, OutputFormat, PartitionOutcome, TimelineYear};
use crate::utils::error::Result;
use async_trait::async_trait;
use geojson::FeatureCollection;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn dataset_base_url(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn label_precision(&self) -> f64;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> Vec<OutputFormat>;
    fn compress(&self) -> bool;
}

/// Source of one year's raw dataset. `Ok(None)` means the year has no data.
#[async_trait]
pub trait YearSource: Send + Sync {
    async fn fetch_year(&self, token: &str) -> Result<Option<FeatureCollection>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, year: TimelineYear) -> Result<Option<FeatureCollection>>;
    async fn transform(&self, raw: FeatureCollection) -> Result<PartitionOutcome>;
    async fn load(&self, year: TimelineYear, result: PartitionOutcome) -> Result<String>;
}

/// Map widget seam. `data` is `None` when the current year has no dataset.
pub trait MapPresenter: Send {
    fn present(&mut self, data: Option<&CountryData>, zoom: f64);
}
