use crate::core::year_format::display_label;
use crate::domain::model::TimelineYear;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Written {
        location: String,
        borders: usize,
        labels: usize,
        skipped: usize,
    },
    NoData,
    FetchFailed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct YearExport {
    pub year: TimelineYear,
    pub outcome: ExportOutcome,
}

impl YearExport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ExportOutcome::FetchFailed { .. })
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Exports each year in turn. A year whose fetch fails is reported and
    /// skipped; transform and load errors abort the run.
    pub async fn run(&self, years: &[TimelineYear]) -> Result<Vec<YearExport>> {
        tracing::info!("🚀 Exporting {} year(s)", years.len());
        let mut exports = Vec::with_capacity(years.len());

        for &year in years {
            let label = display_label(year);

            tracing::info!("📡 Extracting {}", label);
            let raw = match self.pipeline.extract(year).await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    tracing::info!("📭 {}: no data", label);
                    exports.push(YearExport {
                        year,
                        outcome: ExportOutcome::NoData,
                    });
                    continue;
                }
                Err(e) => {
                    tracing::error!("❌ {}: fetch failed: {}", label, e);
                    tracing::error!("💡 {}", e.recovery_suggestion());
                    exports.push(YearExport {
                        year,
                        outcome: ExportOutcome::FetchFailed {
                            message: e.to_string(),
                        },
                    });
                    continue;
                }
            };
            self.monitor.log_stats(&format!("{} extract", label));

            tracing::info!("🔧 Partitioning {} features", raw.features.len());
            let result = self.pipeline.transform(raw).await?;
            let borders = result.data.borders.features.len();
            let labels = result.data.labels.features.len();
            let skipped = result.skipped;
            self.monitor.log_stats(&format!("{} transform", label));

            let location = self.pipeline.load(year, result).await?;
            tracing::info!("📁 {}: {} borders, {} labels -> {}", label, borders, labels, location);
            self.monitor.log_stats(&format!("{} load", label));

            exports.push(YearExport {
                year,
                outcome: ExportOutcome::Written {
                    location,
                    borders,
                    labels,
                    skipped,
                },
            });
        }

        self.monitor.log_final_stats();
        Ok(exports)
    }
}
