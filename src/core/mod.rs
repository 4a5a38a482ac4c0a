pub mod color;
pub mod etl;
pub mod fetcher;
pub mod partition;
pub mod pipeline;
pub mod points;
pub mod polylabel;
pub mod presenter;
pub mod sealed;
pub mod session;
pub mod timeline;
pub mod year_format;

pub use crate::domain::model::{CountryData, PartitionOutcome, TimelineYear};
pub use crate::domain::ports::{ConfigProvider, MapPresenter, Pipeline, Storage, YearSource};
pub use crate::utils::error::Result;
