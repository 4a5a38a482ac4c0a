// Domain layer: models and ports. Geometry types come from geojson; no I/O here.

pub mod model;
pub mod ports;
