use crate::core::{ramps, rules};
use crate::domain::model::{ColorBreakpoint, ColorTable, HistogramBin, Rgb, Style, TableKind, ValueDomain};
use crate::utils::error::{ColorError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions<'a> {
    /// Seed of the `random` ramp.
    pub seed: u64,
    /// Frequencies, needed by the `grey.eq` and `grey.log` ramps.
    pub histogram: Option<&'a [HistogramBin]>,
}

/// Builds the initial color table for `domain`.
pub fn build(domain: &ValueDomain, style: Style, options: &BuildOptions<'_>) -> Result<ColorTable> {
    match style {
        Style::NamedRamp(name) => build_named(domain, &name, options),
        Style::DonorTable(table) => {
            tracing::debug!("Copying donor color table ({} breakpoints)", table.len());
            Ok(table)
        }
        Style::RuleFile(input) => rules::read_rules(&input, domain),
    }
}

fn build_named(domain: &ValueDomain, name: &str, options: &BuildOptions<'_>) -> Result<ColorTable> {
    match name {
        ramps::RANDOM => ramps::random(domain, options.seed),
        ramps::GREY_EQ => {
            let histogram = require_histogram(name, options)?;
            let grey = ramps::generate("grey", domain)?;
            crate::core::transform::histogram_equalize(grey, histogram)
        }
        ramps::GREY_LOG => {
            let histogram = require_histogram(name, options)?;
            grey_log(domain, histogram)
        }
        _ => ramps::generate(name, domain),
    }
}

fn require_histogram<'a>(name: &str, options: &BuildOptions<'a>) -> Result<&'a [HistogramBin]> {
    options.histogram.ok_or_else(|| ColorError::NotImplementedError {
        feature: format!("Color table <{}>", name),
    })
}

/// Grey level of each populated value proportional to `ln(x − min + 1)`.
fn grey_log(domain: &ValueDomain, histogram: &[HistogramBin]) -> Result<ColorTable> {
    let span = (domain.max() - domain.min() + 1.0).ln();
    let mut values: Vec<f64> = histogram
        .iter()
        .filter(|bin| bin.count > 0 && bin.value.is_finite())
        .map(|bin| bin.value.clamp(domain.min(), domain.max()))
        .collect();
    values.sort_by(f64::total_cmp);
    values.dedup();

    let breakpoints = values
        .into_iter()
        .map(|x| {
            let level = if span > 0.0 {
                (255.0 * (x - domain.min() + 1.0).ln() / span).round() as u8
            } else {
                0
            };
            ColorBreakpoint::new(x, Rgb::new(level, level, level))
        })
        .collect();
    ColorTable::new(breakpoints, TableKind::Continuous)
}
