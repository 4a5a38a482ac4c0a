use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

/// Calendar year on the timeline; negative values are BC.
pub type TimelineYear = i32;

pub const NAME_PROPERTY: &str = "NAME";
pub const COLOR_PROPERTY: &str = "COLOR";
pub const UNCLAIMED: &str = "unclaimed";

/// Derived view of one year's dataset. Recomputed on every year change.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryData {
    pub labels: FeatureCollection,
    pub borders: FeatureCollection,
}

impl CountryData {
    pub fn empty() -> Self {
        let empty = FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        };
        Self {
            labels: empty.clone(),
            borders: empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.borders.features.is_empty() && self.labels.features.is_empty()
    }
}

/// Per-name aggregate, one row of the CSV summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub name: String,
    pub color: String,
    pub polygons: usize,
    pub labels: usize,
    pub area_km2: f64,
}

#[derive(Debug, Clone)]
pub struct PartitionOutcome {
    pub data: CountryData,
    pub summaries: Vec<CountrySummary>,
    /// Features dropped because their geometry was missing or not polygonal.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    GeoJson,
    Csv,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 2] = ["geojson", "csv"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "geojson" => Some(Self::GeoJson),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    ZoomChanged(f64),
    StyleLoaded,
}
