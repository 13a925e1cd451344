use crate::adapters::CsvRecordSource;
use crate::domain::model::{ColorJob, ColumnKind, RuleInput, StyleChoice};
use crate::utils::error::{ColorError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: JobConfig,
    pub dataset: DatasetConfig,
    pub colors: ColorsConfig,
    pub transform: Option<TransformConfig>,
    pub store: StoreConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
    pub key_column: Option<String>,
    pub delimiter: Option<char>,
    /// Declared column types (`integer`, `double`, `text`).
    pub columns: Option<HashMap<String, ColumnKind>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorsConfig {
    pub column: Option<String>,
    pub color: Option<String>,
    pub rules: Option<String>,
    pub rules_text: Option<String>,
    pub donor: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    pub invert: Option<bool>,
    pub log_scale: Option<bool>,
    pub abs_log_scale: Option<bool>,
    pub histogram_equalize: Option<bool>,
    pub log_samples: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    /// `compact` (default) or `json`.
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ColorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ColorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    fn transform(&self) -> TransformConfig {
        self.transform.clone().unwrap_or_default()
    }

    fn style(&self) -> Result<Option<StyleChoice>> {
        let c = &self.colors;
        if let Some(text) = &c.rules_text {
            if c.color.is_some() || c.rules.is_some() || c.donor.is_some() {
                return Err(ColorError::MutuallyExclusiveOptionsError {
                    options: "colors.color, colors.rules, colors.rules_text and colors.donor"
                        .to_string(),
                });
            }
            return Ok(Some(StyleChoice::RuleFile(RuleInput::Text(text.clone()))));
        }
        validation::resolve_style(c.color.as_deref(), c.rules.as_deref(), c.donor.as_deref())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_dataset_name("job.name", &self.job.name)?;
        validation::validate_path("dataset.path", &self.dataset.path)?;
        validation::validate_path("store.path", &self.store.path)?;

        if let Some(samples) = self.transform().log_samples {
            validation::validate_positive_number("transform.log_samples", samples, 1)?;
        }

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            let valid_formats = ["compact", "json"];
            if !valid_formats.contains(&format) {
                return Err(ColorError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: format!("Unsupported format. Valid formats: {}", valid_formats.join(", ")),
                });
            }
        }

        let t = self.transform();
        validation::validate_flags(
            t.invert.unwrap_or(false),
            t.log_scale.unwrap_or(false),
            t.abs_log_scale.unwrap_or(false),
            t.histogram_equalize.unwrap_or(false),
        )?;
        validation::require_style(self.style()?)?;
        Ok(())
    }

    pub fn to_job(&self) -> Result<ColorJob> {
        let t = self.transform();
        let flags = validation::validate_flags(
            t.invert.unwrap_or(false),
            t.log_scale.unwrap_or(false),
            t.abs_log_scale.unwrap_or(false),
            t.histogram_equalize.unwrap_or(false),
        )?;

        Ok(ColorJob {
            dataset: self.job.name.clone(),
            column: self.colors.column.clone(),
            style: validation::require_style(self.style()?)?,
            flags,
            overwrite: self.store.overwrite.unwrap_or(true),
            seed: self.colors.seed.unwrap_or(0),
            log_samples: t.log_samples.unwrap_or(ColorJob::DEFAULT_LOG_SAMPLES),
        })
    }

    pub fn record_source(&self) -> CsvRecordSource {
        let mut source = CsvRecordSource::new(&self.dataset.path);
        if let Some(key) = &self.dataset.key_column {
            source = source.with_key_column(key.clone());
        }
        if let Some(delimiter) = self.dataset.delimiter.filter(char::is_ascii) {
            source = source.with_delimiter(delimiter as u8);
        }
        for (column, kind) in self.dataset.columns.iter().flatten() {
            source = source.with_column_kind(column.clone(), *kind);
        }
        source
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .is_some_and(|f| f == "json")
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

    const BASIC: &str = r#"
[job]
name = "roads"
description = "Road speeds"

[dataset]
path = "data/roads.csv"
key_column = "fid"
delimiter = ";"
columns = { speed = "double" }

[colors]
column = "speed"
color = "viridis"
seed = 7

[transform]
invert = true
abs_log_scale = true
log_samples = 50

[store]
path = "./colors"
overwrite = false
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();
        assert!(config.validate().is_ok());

        let job = config.to_job().unwrap();
        assert_eq!(job.dataset, "roads");
        assert_eq!(job.column.as_deref(), Some("speed"));
        assert_eq!(job.style, StyleChoice::NamedRamp("viridis".to_string()));
        assert!(job.flags.invert && job.flags.abs_log_scale && !job.flags.log_scale);
        assert_eq!(job.log_samples, 50);
        assert_eq!(job.seed, 7);
        assert!(!job.overwrite);
        assert!(!config.monitoring_enabled());
    }

    #[test]
    fn test_inline_rules() {
        let toml_content = r#"
[job]
name = "pts"

[dataset]
path = "pts.csv"

[colors]
rules_text = """
0% red
100% green
"""

[store]
path = "./colors"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let job = config.to_job().unwrap();
        assert!(matches!(job.style, StyleChoice::RuleFile(RuleInput::Text(_))));
        assert!(job.overwrite);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VCOLORS_TEST_DATA", "/srv/data");

        let toml_content = r#"
[job]
name = "roads"

[dataset]
path = "${VCOLORS_TEST_DATA}/roads.csv"

[colors]
color = "grey"

[store]
path = "./colors"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.dataset.path, "/srv/data/roads.csv");

        std::env::remove_var("VCOLORS_TEST_DATA");
    }

    #[test]
    fn test_config_validation() {
        let conflicting = BASIC.replace("abs_log_scale = true", "abs_log_scale = true\nlog_scale = true");
        let config = TomlConfig::from_toml_str(&conflicting).unwrap();
        assert!(config.validate().is_err());

        let two_styles = BASIC.replace("color = \"viridis\"", "color = \"viridis\"\ndonor = \"dem\"");
        let config = TomlConfig::from_toml_str(&two_styles).unwrap();
        assert!(config.validate().is_err());

        let bad_format = format!("{}\n[monitoring]\nenabled = true\nlog_format = \"xml\"\n", BASIC);
        let config = TomlConfig::from_toml_str(&bad_format).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.job.name, "roads");
        assert_eq!(config.record_source().path(), Path::new("data/roads.csv"));
    }
}
