use crate::domain::model::CountryData;
use crate::domain::ports::MapPresenter;

/// Stand-in for a map widget: reports what would be drawn.
#[derive(Debug, Default)]
pub struct TracingPresenter {
    frames: usize,
}

impl TracingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl MapPresenter for TracingPresenter {
    fn present(&mut self, data: Option<&CountryData>, zoom: f64) {
        self.frames += 1;
        match data {
            Some(data) => tracing::info!(
                "🗺️  Rendering {} border fills and {} labels at zoom {:.1}",
                data.borders.features.len(),
                data.labels.features.len(),
                zoom
            ),
            None => tracing::info!("🗺️  Rendering empty map at zoom {:.1}", zoom),
        }
    }
}
