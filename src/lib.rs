pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::TomlConfig;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{
    etl::EtlEngine,
    fetcher::HttpYearSource,
    partition::{partition, Partitioner},
    pipeline::BorderPipeline,
    session::TimelineSession,
    timeline::Timeline,
};
pub use utils::error::{BordersError, Result};
