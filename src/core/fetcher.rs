use crate::domain::ports::YearSource;
use crate::utils::error::{BordersError, Result};
use async_trait::async_trait;
use geojson::{FeatureCollection, GeoJson};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/aourednik/historical-basemaps/master/geojson/";

/// Fetches `world_<token>.geojson` from the dataset host. No caching, no retry.
#[derive(Debug, Clone)]
pub struct HttpYearSource {
    client: Client,
    base_url: Url,
}

impl HttpYearSource {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: directory_url(base_url)?,
        })
    }

    pub fn url_for(&self, token: &str) -> Result<Url> {
        let file = format!("world_{}.geojson", token);
        self.base_url
            .join(&file)
            .map_err(|e| BordersError::InvalidConfigValueError {
                field: "dataset.base_url".to_string(),
                value: self.base_url.to_string(),
                reason: format!("Cannot build URL for {}: {}", file, e),
            })
    }
}

/// `Url::join` replaces the last segment unless the base ends with '/'.
fn directory_url(base_url: &str) -> Result<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };

    Url::parse(&normalized).map_err(|e| BordersError::InvalidConfigValueError {
        field: "dataset.base_url".to_string(),
        value: base_url.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })
}

pub fn parse_feature_collection(body: &str) -> Result<FeatureCollection> {
    match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(BordersError::ProcessingError {
            message: "expected a FeatureCollection, got a single Feature".to_string(),
        }),
        GeoJson::Geometry(_) => Err(BordersError::ProcessingError {
            message: "expected a FeatureCollection, got a bare Geometry".to_string(),
        }),
    }
}

#[async_trait]
impl YearSource for HttpYearSource {
    async fn fetch_year(&self, token: &str) -> Result<Option<FeatureCollection>> {
        let url = self.url_for(token)?;
        tracing::debug!("📡 Fetching {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        tracing::debug!("Dataset response status: {}", status);

        if status == StatusCode::NO_CONTENT {
            tracing::info!("📭 No data for year token {}", token);
            return Ok(None);
        }

        if !status.is_success() {
            return Err(BordersError::HttpStatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let collection = parse_feature_collection(&body)?;
        tracing::info!(
            "📥 Fetched {} features for year token {}",
            collection.features.len(),
            token
        );

        Ok(Some(collection))
    }
}
