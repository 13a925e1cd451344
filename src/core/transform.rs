use crate::domain::model::{ColorBreakpoint, ColorTable, HistogramBin, TableKind, TransformFlags};
use crate::utils::error::{ColorError, Result};

/// Inputs the transforms may need beyond the table itself.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// Number of intervals sampled by the logarithmic transforms.
    pub log_samples: usize,
    /// Frequencies for histogram equalization.
    pub histogram: Option<&'a [HistogramBin]>,
}

impl Default for TransformContext<'_> {
    fn default() -> Self {
        Self {
            log_samples: 100,
            histogram: None,
        }
    }
}

/// Reverses the colors; breakpoint values stay where they are.
pub fn invert(table: ColorTable) -> Result<ColorTable> {
    if table.is_empty() {
        return Ok(table);
    }
    let values = table.breakpoints().iter().map(|bp| bp.value);
    let colors = table.breakpoints().iter().rev().map(|bp| bp.color);
    let breakpoints = values.zip(colors).map(|(v, c)| ColorBreakpoint::new(v, c)).collect();

    Ok(ColorTable::new(breakpoints, table.kind())?.with_colors_of(&table))
}

/// Interpolated range of `table`, or `None` when the transform has nothing to do.
fn scalable_range(table: &ColorTable, transform: &str) -> Option<(f64, f64)> {
    if table.kind() == TableKind::Categorical {
        if !table.is_empty() {
            tracing::warn!("⚠️  {} leaves categorical color tables unchanged", transform);
        }
        return None;
    }
    table.range().filter(|(min, max)| min < max)
}

/// Rebuilds `table` from `samples + 1` points. Point `i` is placed at
/// `position(t)` and takes the source color found at `min + t·(max − min)`.
fn resample<F>(table: &ColorTable, min: f64, max: f64, samples: usize, position: F) -> Result<ColorTable>
where
    F: Fn(f64) -> f64,
{
    let samples = samples.max(1);
    let mut breakpoints: Vec<ColorBreakpoint> = Vec::with_capacity(samples + 1);

    for i in 0..=samples {
        let t = i as f64 / samples as f64;
        let value = match i {
            0 => min,
            i if i == samples => max,
            _ => position(t).clamp(min, max),
        };
        let color = table.lookup(min + (max - min) * t);
        if breakpoints.last().is_some_and(|prev| prev.value >= value) {
            continue;
        }
        breakpoints.push(ColorBreakpoint::new(value, color));
    }

    Ok(ColorTable::new(breakpoints, TableKind::Continuous)?.with_colors_of(table))
}

/// Spreads the colors logarithmically over the value axis, giving the low
/// end more of the ramp. The range must not contain negative values; a
/// range starting at zero uses `ln(x + 1)`.
pub fn log_scale(table: ColorTable, samples: usize) -> Result<ColorTable> {
    let Some((min, max)) = scalable_range(&table, "Logarithmic scaling") else {
        return Ok(table);
    };
    if min < 0.0 {
        return Err(ColorError::InvalidDomainForLogScaleError { min, max });
    }

    let shift = if min == 0.0 { 1.0 } else { 0.0 };
    let lmin = (min + shift).ln();
    let lmax = (max + shift).ln();
    resample(&table, min, max, samples, |t| (lmin + (lmax - lmin) * t).exp() - shift)
}

/// Log scaling of the magnitude: a value `x` takes the source color at
/// the position of `ln(|x| + 1)` between the smallest and largest magnitude
/// in the range, so `x` and `-x` share a color. A range crossing zero
/// starts the curve at magnitude 0.
pub fn abs_log_scale(table: ColorTable, samples: usize) -> Result<ColorTable> {
    let Some((min, max)) = scalable_range(&table, "Absolute logarithmic scaling") else {
        return Ok(table);
    };

    let (amin, amax) = if min <= 0.0 && max >= 0.0 {
        (0.0, min.abs().max(max.abs()))
    } else {
        (min.abs().min(max.abs()), min.abs().max(max.abs()))
    };
    let lamin = (amin + 1.0).ln();
    let lamax = (amax + 1.0).ln();
    let color_at = |x: f64| {
        let t = ((x.abs() + 1.0).ln() - lamin) / (lamax - lamin);
        table.lookup(min + (max - min) * t.clamp(0.0, 1.0))
    };

    let samples = samples.max(1);
    let mut values = vec![min, max];
    for i in 0..=samples {
        let magnitude = match i {
            0 => amin,
            i if i == samples => amax,
            _ => (lamin + (lamax - lamin) * i as f64 / samples as f64).exp() - 1.0,
        };
        values.extend([magnitude, -magnitude].into_iter().filter(|v| *v > min && *v < max));
    }
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| a == b);

    let breakpoints = values
        .into_iter()
        .map(|v| ColorBreakpoint::new(v, color_at(v)))
        .collect();
    Ok(ColorTable::new(breakpoints, TableKind::Continuous)?.with_colors_of(&table))
}

/// Cumulative-distribution remapping: every populated histogram bin gets a
/// breakpoint colored with the source color at its mid-bin cumulative
/// frequency, so each color band covers the same share of the data.
pub fn histogram_equalize(table: ColorTable, histogram: &[HistogramBin]) -> Result<ColorTable> {
    let Some((min, max)) = scalable_range(&table, "Histogram equalization") else {
        return Ok(table);
    };

    let mut bins: Vec<HistogramBin> = histogram
        .iter()
        .filter(|bin| bin.count > 0 && bin.value.is_finite())
        .copied()
        .collect();
    bins.sort_by(|a, b| a.value.total_cmp(&b.value));
    bins.dedup_by(|later, earlier| {
        if later.value == earlier.value {
            earlier.count += later.count;
            true
        } else {
            false
        }
    });

    let total: u64 = bins.iter().map(|bin| bin.count).sum();
    if total == 0 {
        tracing::warn!("⚠️  Empty histogram, color table left unchanged");
        return Ok(table);
    }

    let mut cumulative = 0u64;
    let breakpoints = bins
        .iter()
        .map(|bin| {
            let fraction = (cumulative as f64 + bin.count as f64 / 2.0) / total as f64;
            cumulative += bin.count;
            ColorBreakpoint::new(bin.value, table.lookup(min + (max - min) * fraction))
        })
        .collect();

    Ok(ColorTable::new(breakpoints, TableKind::Continuous)?.with_colors_of(&table))
}

/// Applies the enabled transforms in their fixed order: invert, then log or
/// abs-log, then histogram equalization.
pub fn apply_transforms(
    table: ColorTable,
    flags: &TransformFlags,
    ctx: &TransformContext<'_>,
) -> Result<ColorTable> {
    flags.validate()?;
    if flags.histogram_equalize && ctx.histogram.is_none() {
        return Err(ColorError::NotImplementedError {
            feature: "Histogram equalization".to_string(),
        });
    }

    let mut table = table;
    if flags.invert {
        tracing::debug!("Inverting colors");
        table = invert(table)?;
    }
    if flags.log_scale {
        tracing::debug!("Applying logarithmic scaling ({} samples)", ctx.log_samples);
        table = log_scale(table, ctx.log_samples)?;
    } else if flags.abs_log_scale {
        tracing::debug!("Applying absolute logarithmic scaling ({} samples)", ctx.log_samples);
        table = abs_log_scale(table, ctx.log_samples)?;
    }
    if let (true, Some(histogram)) = (flags.histogram_equalize, ctx.histogram) {
        tracing::debug!("Equalizing over {} histogram bins", histogram.len());
        table = histogram_equalize(table, histogram)?;
    }
    Ok(table)
}
