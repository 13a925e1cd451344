use crate::adapters::CsvRecordSource;
use crate::domain::model::ColorJob;
use crate::utils::error::{ColorError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "vcolors")]
#[command(about = "Creates/modifies the color table associated with a dataset")]
pub struct CliConfig {
    /// CSV file holding the dataset records
    #[arg(long)]
    pub input: Option<String>,

    /// Name the color table is stored under (defaults to the input file stem)
    #[arg(long)]
    pub map: Option<String>,

    /// Column holding the feature identifiers
    #[arg(long, default_value = "cat")]
    pub key_column: String,

    /// Name of column containing numeric data
    #[arg(long)]
    pub column: Option<String>,

    /// Name of a built-in color table
    #[arg(long)]
    pub color: Option<String>,

    /// Path to rules file ("-" to read rules from stdin)
    #[arg(long)]
    pub rules: Option<String>,

    /// Dataset from which to copy the color table
    #[arg(long)]
    pub donor: Option<String>,

    /// Directory holding saved color tables
    #[arg(long, default_value = "./colors")]
    pub store: String,

    /// Remove existing color table
    #[arg(short = 'r', long)]
    pub remove: bool,

    /// Only write new color table if one doesn't already exist
    #[arg(short = 'w', long)]
    pub write_if_absent: bool,

    /// List available color tables then exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Invert colors
    #[arg(short = 'n', long)]
    pub invert: bool,

    /// Logarithmic scaling
    #[arg(short = 'g', long)]
    pub log_scale: bool,

    /// Logarithmic-absolute scaling
    #[arg(short = 'a', long)]
    pub abs_log_scale: bool,

    /// Histogram equalization
    #[arg(short = 'e', long)]
    pub equalize: bool,

    /// Seed of the random color table
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Intervals sampled by the logarithmic scalings
    #[arg(long, default_value = "100")]
    pub log_samples: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,
}

impl CliConfig {
    fn input_path(&self) -> Result<&str> {
        self.input.as_deref().ok_or_else(|| ColorError::MissingOptionError {
            option: "--input".to_string(),
        })
    }

    pub fn dataset_name(&self) -> Result<String> {
        if let Some(map) = &self.map {
            return Ok(map.clone());
        }
        let input = self.input_path()?;
        Path::new(input)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| ColorError::InvalidConfigValueError {
                field: "input".to_string(),
                value: input.to_string(),
                reason: "Cannot derive a dataset name, use --map".to_string(),
            })
    }

    pub fn record_source(&self) -> Result<CsvRecordSource> {
        Ok(CsvRecordSource::new(self.input_path()?).with_key_column(self.key_column.clone()))
    }

    /// The color job described by the options; fails in remove mode
    /// only if no style was given.
    pub fn to_job(&self) -> Result<ColorJob> {
        let style = validation::resolve_style(
            self.color.as_deref(),
            self.rules.as_deref(),
            self.donor.as_deref(),
        )?;
        let flags = validation::validate_flags(
            self.invert,
            self.log_scale,
            self.abs_log_scale,
            self.equalize,
        )?;

        Ok(ColorJob {
            dataset: self.dataset_name()?,
            column: self.column.clone(),
            style: validation::require_style(style)?,
            flags,
            overwrite: !self.write_if_absent,
            seed: self.seed,
            log_samples: self.log_samples,
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.list {
            return Ok(());
        }

        // 移除時可只給 --map
        if !self.remove || self.input.is_some() {
            validation::validate_path("input", self.input_path()?)?;
        }
        validation::validate_path("store", &self.store)?;
        validation::validate_dataset_name("map", &self.dataset_name()?)?;
        validation::validate_positive_number("log_samples", self.log_samples, 1)?;

        let style = validation::resolve_style(
            self.color.as_deref(),
            self.rules.as_deref(),
            self.donor.as_deref(),
        )?;
        validation::validate_flags(self.invert, self.log_scale, self.abs_log_scale, self.equalize)?;

        if !self.remove {
            validation::require_style(style)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::StyleChoice;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::parse_from(std::iter::once("vcolors").chain(args.iter().copied()))
    }

    #[test]
    fn test_job_from_args() {
        let config = parse(&["--input", "data/roads.csv", "--column", "speed", "--color", "viridis", "-n", "-g", "-w"]);
        assert!(config.validate().is_ok());

        let job = config.to_job().unwrap();
        assert_eq!(job.dataset, "roads");
        assert_eq!(job.column.as_deref(), Some("speed"));
        assert_eq!(job.style, StyleChoice::NamedRamp("viridis".to_string()));
        assert!(job.flags.invert && job.flags.log_scale);
        assert!(!job.overwrite);
        assert_eq!(job.log_samples, 100);
    }

    #[test]
    fn test_map_overrides_dataset_name() {
        let config = parse(&["--input", "roads.csv", "--map", "streets", "--color", "grey"]);
        assert_eq!(config.dataset_name().unwrap(), "streets");
    }

    #[test]
    fn test_validation_failures() {
        assert!(parse(&["--color", "grey"]).validate().is_err());
        assert!(parse(&["--input", "a.csv"]).validate().is_err());
        assert!(parse(&["--input", "a.csv", "--color", "grey", "--rules", "-"])
            .validate()
            .is_err());
        assert!(parse(&["--input", "a.csv", "--color", "grey", "-g", "-a"])
            .validate()
            .is_err());
        assert!(parse(&["--input", "a.csv", "--color", "grey", "--log-samples", "0"])
            .validate()
            .is_err());
    }

    #[test]
    fn test_remove_and_list_need_no_style() {
        assert!(parse(&["--input", "a.csv", "-r"]).validate().is_ok());
        assert!(parse(&["-l"]).validate().is_ok());
    }

    #[test]
    fn test_remove_by_map_name_needs_no_input() {
        let config = parse(&["-r", "--map", "roads"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.dataset_name().unwrap(), "roads");

        assert!(matches!(
            parse(&["-r"]).validate(),
            Err(ColorError::MissingOptionError { .. })
        ));
        assert!(parse(&["--map", "roads", "--color", "grey"]).validate().is_err());
    }
}
