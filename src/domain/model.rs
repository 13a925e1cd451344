use crate::utils::error::{ColorError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

pub type Rgb = rgb::RGB8;

/// Range of the values found in a dataset, as discovered by the scanner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueDomain {
    min: f64,
    max: f64,
    is_floating_point: bool,
}

impl ValueDomain {
    pub fn new(min: f64, max: f64, is_floating_point: bool) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ColorError::InvalidConfigValueError {
                field: "domain".to_string(),
                value: format!("[{}, {}]", min, max),
                reason: "bounds must be finite with min <= max".to_string(),
            });
        }
        Ok(Self {
            min,
            max,
            is_floating_point,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_floating_point(&self) -> bool {
        self.is_floating_point
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Value sitting at `percent` (0..=100) of the way from min to max.
    pub fn at_percent(&self, percent: f64) -> f64 {
        if percent <= 0.0 {
            self.min
        } else if percent >= 100.0 {
            self.max
        } else {
            self.min + (self.max - self.min) * percent / 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorBreakpoint {
    pub value: f64,
    pub color: Rgb,
}

impl ColorBreakpoint {
    pub fn new(value: f64, color: Rgb) -> Self {
        Self { value, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Colors are interpolated between breakpoints.
    Continuous,
    /// Only exact breakpoint values have a color.
    Categorical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawColorTable {
    breakpoints: Vec<ColorBreakpoint>,
    kind: TableKind,
    no_data_color: Rgb,
    #[serde(default)]
    default_color: Option<Rgb>,
}

/// Ordered value→color breakpoints.
///
/// Tables are plain values: every transform takes one and hands back a new
/// one. Deserialized tables go through the same checks as [`ColorTable::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColorTable", into = "RawColorTable")]
pub struct ColorTable {
    breakpoints: Vec<ColorBreakpoint>,
    kind: TableKind,
    no_data_color: Rgb,
    default_color: Option<Rgb>,
}

impl ColorTable {
    pub const DEFAULT_NO_DATA: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Sorts the breakpoints by value; non-finite or repeated values are rejected.
    pub fn new(mut breakpoints: Vec<ColorBreakpoint>, kind: TableKind) -> Result<Self> {
        if let Some(bad) = breakpoints.iter().find(|bp| !bp.value.is_finite()) {
            return Err(ColorError::InvalidConfigValueError {
                field: "breakpoint".to_string(),
                value: bad.value.to_string(),
                reason: "breakpoint values must be finite".to_string(),
            });
        }
        breakpoints.sort_by(|a, b| a.value.total_cmp(&b.value));
        if let Some(pair) = breakpoints.windows(2).find(|w| w[0].value == w[1].value) {
            return Err(ColorError::DuplicateBreakpointError {
                value: pair[0].value.to_string(),
            });
        }
        Ok(Self {
            breakpoints,
            kind,
            no_data_color: Self::DEFAULT_NO_DATA,
            default_color: None,
        })
    }

    pub fn empty(kind: TableKind) -> Self {
        Self {
            breakpoints: Vec::new(),
            kind,
            no_data_color: Self::DEFAULT_NO_DATA,
            default_color: None,
        }
    }

    pub fn with_no_data_color(mut self, color: Rgb) -> Self {
        self.no_data_color = color;
        self
    }

    pub fn with_default_color(mut self, color: Option<Rgb>) -> Self {
        self.default_color = color;
        self
    }

    /// Copies the no-data and default colors of `other` onto `self`.
    pub fn with_colors_of(self, other: &ColorTable) -> Self {
        self.with_no_data_color(other.no_data_color)
            .with_default_color(other.default_color)
    }

    pub fn breakpoints(&self) -> &[ColorBreakpoint] {
        &self.breakpoints
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn no_data_color(&self) -> Rgb {
        self.no_data_color
    }

    pub fn default_color(&self) -> Option<Rgb> {
        self.default_color
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Lowest and highest breakpoint values.
    pub fn range(&self) -> Option<(f64, f64)> {
        match (self.breakpoints.first(), self.breakpoints.last()) {
            (Some(first), Some(last)) => Some((first.value, last.value)),
            _ => None,
        }
    }

    pub fn lookup(&self, value: f64) -> Rgb {
        if value.is_nan() || self.breakpoints.is_empty() {
            return self.no_data_color;
        }

        match self.kind {
            TableKind::Categorical => self
                .breakpoints
                .binary_search_by(|bp| bp.value.partial_cmp(&value).unwrap_or(Ordering::Less))
                .map(|idx| self.breakpoints[idx].color)
                .unwrap_or(self.no_data_color),
            TableKind::Continuous => self.interpolate(value),
        }
    }

    fn interpolate(&self, value: f64) -> Rgb {
        let first = &self.breakpoints[0];
        let last = &self.breakpoints[self.breakpoints.len() - 1];

        if value < first.value || value > last.value {
            return self.default_color.unwrap_or(if value < first.value {
                first.color
            } else {
                last.color
            });
        }

        // 第一個 value > x 的位置
        let upper = self.breakpoints.partition_point(|bp| bp.value <= value);
        if upper == 0 {
            return first.color;
        }
        let lo = &self.breakpoints[upper - 1];
        if lo.value == value || upper == self.breakpoints.len() {
            return lo.color;
        }
        let hi = &self.breakpoints[upper];
        let t = (value - lo.value) / (hi.value - lo.value);
        mix(lo.color, hi.color, t)
    }
}

impl TryFrom<RawColorTable> for ColorTable {
    type Error = ColorError;

    fn try_from(raw: RawColorTable) -> Result<Self> {
        Ok(ColorTable::new(raw.breakpoints, raw.kind)?
            .with_no_data_color(raw.no_data_color)
            .with_default_color(raw.default_color))
    }
}

impl From<ColorTable> for RawColorTable {
    fn from(table: ColorTable) -> Self {
        RawColorTable {
            breakpoints: table.breakpoints,
            kind: table.kind,
            no_data_color: table.no_data_color,
            default_color: table.default_color,
        }
    }
}

/// Per-channel linear mix, `t` in \[0, 1\].
pub fn mix(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let channel = |x: u8, y: u8| -> u8 {
        let v = x as f64 + (y as f64 - x as f64) * t;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgb::new(channel(a.r, b.r), channel(a.g, b.g), channel(a.b, b.b))
}

/// Where rule text comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleInput {
    Path(PathBuf),
    /// Read standard input until end of stream.
    Stdin,
    Text(String),
}

impl RuleInput {
    pub const STDIN_MARKER: &'static str = "-";

    pub fn from_arg(arg: &str) -> Self {
        if arg == Self::STDIN_MARKER {
            RuleInput::Stdin
        } else {
            RuleInput::Path(PathBuf::from(arg))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RuleInput::Path(path) => path.display().to_string(),
            RuleInput::Stdin => "rules".to_string(),
            RuleInput::Text(_) => "inline rules".to_string(),
        }
    }
}

/// A fully materialized coloring choice, ready for the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    NamedRamp(String),
    DonorTable(ColorTable),
    RuleFile(RuleInput),
}

/// A coloring choice as requested, before the donor table is fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleChoice {
    NamedRamp(String),
    Donor(String),
    RuleFile(RuleInput),
}

impl StyleChoice {
    pub fn describe(&self) -> String {
        match self {
            StyleChoice::NamedRamp(name) => name.clone(),
            StyleChoice::Donor(name) => name.clone(),
            StyleChoice::RuleFile(input) => input.describe(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformFlags {
    pub invert: bool,
    pub log_scale: bool,
    pub abs_log_scale: bool,
    pub histogram_equalize: bool,
}

impl TransformFlags {
    pub fn validate(&self) -> Result<()> {
        if self.log_scale && self.abs_log_scale {
            return Err(ColorError::MutuallyExclusiveOptionsError {
                options: "log_scale and abs_log_scale".to_string(),
            });
        }
        Ok(())
    }

    pub fn any(&self) -> bool {
        self.invert || self.log_scale || self.abs_log_scale || self.histogram_equalize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Double,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnKind::Text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub value: f64,
    pub count: u64,
}

/// Everything needed to derive and store one dataset's color table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorJob {
    pub dataset: String,
    pub column: Option<String>,
    pub style: StyleChoice,
    pub flags: TransformFlags,
    pub overwrite: bool,
    pub seed: u64,
    pub log_samples: usize,
}

impl ColorJob {
    pub const DEFAULT_LOG_SAMPLES: usize = 100;

    pub fn new(dataset: impl Into<String>, style: StyleChoice) -> Self {
        Self {
            dataset: dataset.into(),
            column: None,
            style,
            flags: TransformFlags::default(),
            overwrite: true,
            seed: 0,
            log_samples: Self::DEFAULT_LOG_SAMPLES,
        }
    }
}
