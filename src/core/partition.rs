use crate::core::color::color_for_name;
use crate::core::polylabel::pole_of_inaccessibility;
use crate::domain::model::{
    CountryData, CountrySummary, PartitionOutcome, COLOR_PROPERTY, NAME_PROPERTY, UNCLAIMED,
};
use geo::{GeodesicArea, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, PolygonType, Value};
use std::collections::BTreeMap;

pub const DEFAULT_LABEL_PRECISION: f64 = 1.0;

/// A feature's geometry, narrowed to what the partitioner can label.
#[derive(Debug, Clone, PartialEq)]
pub enum CountryGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    Unsupported(&'static str),
    Missing,
}

impl CountryGeometry {
    pub fn classify(geometry: Option<&Geometry>) -> Self {
        let Some(geometry) = geometry else {
            return Self::Missing;
        };

        match &geometry.value {
            Value::Polygon(rings) => Self::Polygon(to_polygon(rings)),
            Value::MultiPolygon(polygons) => {
                Self::MultiPolygon(MultiPolygon::new(polygons.iter().map(to_polygon).collect()))
            }
            Value::Point(_) => Self::Unsupported("Point"),
            Value::MultiPoint(_) => Self::Unsupported("MultiPoint"),
            Value::LineString(_) => Self::Unsupported("LineString"),
            Value::MultiLineString(_) => Self::Unsupported("MultiLineString"),
            Value::GeometryCollection(_) => Self::Unsupported("GeometryCollection"),
        }
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            Self::Polygon(polygon) => std::slice::from_ref(polygon),
            Self::MultiPolygon(multi) => &multi.0,
            Self::Unsupported(_) | Self::Missing => &[],
        }
    }
}

fn to_polygon(rings: &PolygonType) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| {
        LineString::from(
            ring.iter()
                .filter(|position| position.len() >= 2)
                .map(|position| (position[0], position[1]))
                .collect::<Vec<_>>(),
        )
    });
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

pub fn feature_name(feature: &Feature) -> String {
    feature
        .properties
        .as_ref()
        .and_then(|p| p.get(NAME_PROPERTY))
        .and_then(|v| v.as_str())
        .unwrap_or(UNCLAIMED)
        .to_string()
}

fn label_feature(x: f64, y: f64, name: &str, color: &str) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(NAME_PROPERTY.to_string(), JsonValue::String(name.to_string()));
    properties.insert(COLOR_PROPERTY.to_string(), JsonValue::String(color.to_string()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![x, y]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Output collection with the input's bbox and foreign members (e.g. `crs`).
fn derived_collection(raw: &FeatureCollection, features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: raw.bbox.clone(),
        features,
        foreign_members: raw.foreign_members.clone(),
    }
}

/// Splits a year's dataset into colored border features and one label point
/// per polygon.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    label_precision: f64,
}

impl Partitioner {
    pub fn new(label_precision: f64) -> Self {
        Self { label_precision }
    }

    pub fn label_precision(&self) -> f64 {
        self.label_precision
    }

    pub fn partition(&self, raw: &FeatureCollection) -> PartitionOutcome {
        let mut borders = Vec::with_capacity(raw.features.len());
        let mut labels = Vec::new();
        let mut summaries: BTreeMap<String, CountrySummary> = BTreeMap::new();
        let mut skipped = 0;

        for (index, feature) in raw.features.iter().enumerate() {
            let name = feature_name(feature);
            let geometry = CountryGeometry::classify(feature.geometry.as_ref());

            match &geometry {
                CountryGeometry::Unsupported(kind) => {
                    tracing::warn!(
                        "Skipping feature #{} '{}': unsupported geometry {}",
                        index,
                        name,
                        kind
                    );
                    skipped += 1;
                    continue;
                }
                CountryGeometry::Missing => {
                    tracing::warn!("Skipping feature #{} '{}': no geometry", index, name);
                    skipped += 1;
                    continue;
                }
                CountryGeometry::Polygon(_) | CountryGeometry::MultiPolygon(_) => {}
            }

            let color = color_for_name(&name);
            let polygons = geometry.polygons();

            let mut label_count = 0;
            let mut area_m2 = 0.0;
            for polygon in polygons {
                area_m2 += polygon.geodesic_area_unsigned();
                match pole_of_inaccessibility(polygon, self.label_precision) {
                    Some(pole) => {
                        labels.push(label_feature(pole.x(), pole.y(), &name, &color));
                        label_count += 1;
                    }
                    None => tracing::debug!("'{}': empty polygon ring, no label", name),
                }
            }

            let mut border = feature.clone();
            let mut properties = border.properties.take().unwrap_or_default();
            properties.insert(NAME_PROPERTY.to_string(), JsonValue::String(name.clone()));
            properties.insert(COLOR_PROPERTY.to_string(), JsonValue::String(color.clone()));
            border.properties = Some(properties);
            borders.push(border);

            let summary = summaries.entry(name.clone()).or_insert_with(|| CountrySummary {
                name,
                color,
                polygons: 0,
                labels: 0,
                area_km2: 0.0,
            });
            summary.polygons += polygons.len();
            summary.labels += label_count;
            if area_m2.is_finite() {
                summary.area_km2 += area_m2 / 1_000_000.0;
            }
        }

        tracing::debug!(
            "Partitioned {} features into {} borders and {} labels ({} skipped)",
            raw.features.len(),
            borders.len(),
            labels.len(),
            skipped
        );

        PartitionOutcome {
            data: CountryData {
                labels: derived_collection(raw, labels),
                borders: derived_collection(raw, borders),
            },
            summaries: summaries.into_values().collect(),
            skipped,
        }
    }
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_PRECISION)
    }
}

pub fn partition(raw: &FeatureCollection) -> CountryData {
    Partitioner::default().partition(raw).data
}
