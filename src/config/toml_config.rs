use crate::core::fetcher::DEFAULT_BASE_URL;
use crate::core::partition::DEFAULT_LABEL_PRECISION;
use crate::core::points::{default_milestones, Milestone};
use crate::core::sealed::SealingKey;
use crate::core::timeline::{Timeline, DEFAULT_YEARS};
use crate::core::ConfigProvider;
use crate::domain::model::{OutputFormat, TimelineYear};
use crate::utils::error::{BordersError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Every section is optional; a missing file section falls back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub dataset: DatasetConfig,
    pub timeline: TimelineConfig,
    pub partition: PartitionConfig,
    pub load: LoadConfig,
    pub points: PointsConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub years: Option<Vec<TimelineYear>>,
    pub initial_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub label_precision: f64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            label_precision: DEFAULT_LABEL_PRECISION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compress: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            output_formats: vec!["geojson".to_string()],
            compress: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub store_dir: String,
    pub store_file: String,
    /// Hex-encoded 32-byte key; falls back to the environment, then `key_file`.
    pub key: Option<String>,
    pub key_file: String,
    pub per_view: u64,
    pub milestones: Vec<Milestone>,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            store_dir: "./.historic-borders".to_string(),
            store_file: "points.json".to_string(),
            key: None,
            key_file: "points.key".to_string(),
            per_view: 10,
            milestones: default_milestones(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BordersError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BordersError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown names are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BordersError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("dataset.base_url", &self.dataset.base_url)?;

        if let Some(timeout) = self.dataset.timeout_seconds {
            validation::validate_positive_number("dataset.timeout_seconds", timeout, 1)?;
        }

        if let Some(years) = &self.timeline.years {
            validation::validate_strictly_increasing("timeline.years", years)?;
        }

        validation::validate_range(
            "partition.label_precision",
            self.partition.label_precision,
            1e-6,
            10.0,
        )?;

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_one_of(
            "load.output_formats",
            &self.load.output_formats,
            &OutputFormat::NAMES,
        )?;
        if self.load.output_formats.is_empty() {
            return Err(BordersError::MissingConfigError {
                field: "load.output_formats".to_string(),
            });
        }

        validation::validate_path("points.store_dir", &self.points.store_dir)?;
        validation::validate_non_empty_string("points.store_file", &self.points.store_file)?;
        validation::validate_non_empty_string("points.key_file", &self.points.key_file)?;
        if let Some(key) = self.points.key.as_deref().filter(|k| !k.trim().is_empty()) {
            SealingKey::from_hex("points.key", key)?;
        }
        for milestone in &self.points.milestones {
            validation::validate_positive_number("points.milestones.points", milestone.points, 1)?;
            validation::validate_positive_number(
                "points.milestones.ad_free_minutes",
                milestone.ad_free_minutes.max(0) as u64,
                1,
            )?;
        }

        Ok(())
    }

    /// Timeline positioned at `timeline.initial_index` (clamped).
    pub fn timeline(&self) -> Result<Timeline> {
        let years = self
            .timeline
            .years
            .clone()
            .unwrap_or_else(|| DEFAULT_YEARS.to_vec());
        Timeline::with_index(years, self.timeline.initial_index.unwrap_or(0) as i64)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl ConfigProvider for TomlConfig {
    fn dataset_base_url(&self) -> &str {
        &self.dataset.base_url
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.dataset.timeout_seconds.map(Duration::from_secs)
    }

    fn label_precision(&self) -> f64 {
        self.partition.label_precision
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> Vec<OutputFormat> {
        self.load
            .output_formats
            .iter()
            .filter_map(|f| OutputFormat::parse(f))
            .collect()
    }

    fn compress(&self) -> bool {
        self.load.compress
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.dataset_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.output_formats(), vec![OutputFormat::GeoJson]);
        assert_eq!(config.label_precision(), 1.0);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.timeline().unwrap().len(), DEFAULT_YEARS.len());
        assert_eq!(config.points.milestones, default_milestones());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[dataset]
base_url = "https://example.com/geojson/"
timeout_seconds = 30

[timeline]
years = [-2000, -500, 400, 1492]
initial_index = 7

[partition]
label_precision = 0.25

[load]
output_path = "./maps"
output_formats = ["geojson", "csv"]
compress = true

[points]
per_view = 5
key = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
milestones = [{ points = 50, ad_free_minutes = 15 }]

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(
            config.output_formats(),
            vec![OutputFormat::GeoJson, OutputFormat::Csv]
        );
        assert!(config.compress());
        assert!(config.monitoring_enabled());
        assert_eq!(config.points.per_view, 5);
        assert_eq!(config.points.store_file, "points.json");

        let timeline = config.timeline().unwrap();
        assert_eq!(timeline.index(), 3);
        assert_eq!(timeline.current_year(), 1492);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HB_TEST_DATASET_URL", "https://mirror.example.org/data/");

        let toml_content = r#"
[dataset]
base_url = "${HB_TEST_DATASET_URL}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.dataset.base_url, "https://mirror.example.org/data/");

        std::env::remove_var("HB_TEST_DATASET_URL");
    }

    #[test]
    fn test_config_validation_failures() {
        let bad_url = TomlConfig::from_toml_str("[dataset]\nbase_url = \"invalid-url\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let unsorted =
            TomlConfig::from_toml_str("[timeline]\nyears = [400, -2000]\n").unwrap();
        assert!(unsorted.validate().is_err());
        assert!(unsorted.timeline().is_err());

        let bad_format =
            TomlConfig::from_toml_str("[load]\noutput_formats = [\"kml\"]\n").unwrap();
        assert!(bad_format.validate().is_err());

        let no_formats = TomlConfig::from_toml_str("[load]\noutput_formats = []\n").unwrap();
        assert!(matches!(
            no_formats.validate(),
            Err(BordersError::MissingConfigError { .. })
        ));

        let bad_key = TomlConfig::from_toml_str("[points]\nkey = \"abc123\"\n").unwrap();
        assert!(matches!(
            bad_key.validate(),
            Err(BordersError::InvalidConfigValueError { .. })
        ));

        let bad_precision =
            TomlConfig::from_toml_str("[partition]\nlabel_precision = 0.0\n").unwrap();
        assert!(bad_precision.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            TomlConfig::from_toml_str("[dataset\nbase_url ="),
            Err(BordersError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[load]\noutput_path = \"./from-file\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_path(), "./from-file");
    }
}
