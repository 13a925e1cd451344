use crate::core::builder::{self, BuildOptions};
use crate::core::{ramps, scanner};
use crate::core::transform::{self, TransformContext};
use crate::domain::model::{ColorJob, ColorTable, HistogramBin, Style, StyleChoice, ValueDomain};
use crate::domain::ports::{ColorPipeline, ColorTableStore, DonorTableSource, HistogramSource, RecordSource};
use crate::utils::error::{ColorError, Result};
use std::sync::Arc;

pub type SharedHistogram = Arc<dyn HistogramSource + Send + Sync>;

/// Derives a color table from a record source and keeps it in a store.
pub struct DatasetPipeline<R, S>
where
    R: RecordSource + Send + Sync,
    S: ColorTableStore + DonorTableSource,
{
    records: R,
    store: S,
    histogram: Option<SharedHistogram>,
    job: ColorJob,
}

impl<R, S> DatasetPipeline<R, S>
where
    R: RecordSource + Send + Sync,
    S: ColorTableStore + DonorTableSource,
{
    pub fn new(records: R, store: S, job: ColorJob) -> Self {
        Self {
            records,
            store,
            histogram: None,
            job,
        }
    }

    /// Enables histogram equalization and the `grey.eq`/`grey.log` ramps.
    pub fn with_histogram(mut self, histogram: SharedHistogram) -> Self {
        self.histogram = Some(histogram);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn frequencies(&self) -> Result<Option<Vec<HistogramBin>>> {
        match &self.histogram {
            Some(source) => {
                let bins = source.frequency_table(self.job.column.as_deref())?;
                tracing::debug!("Histogram of <{}>: {} distinct values", self.job.dataset, bins.len());
                Ok(Some(bins))
            }
            None => Ok(None),
        }
    }

    fn needs_histogram_ramp(&self) -> bool {
        matches!(&self.job.style, StyleChoice::NamedRamp(name) if name == ramps::GREY_EQ || name == ramps::GREY_LOG)
    }
}

#[async_trait::async_trait]
impl<R, S> ColorPipeline for DatasetPipeline<R, S>
where
    R: RecordSource + Send + Sync,
    S: ColorTableStore + DonorTableSource,
{
    fn job(&self) -> &ColorJob {
        &self.job
    }

    async fn existing(&self) -> Result<Option<ColorTable>> {
        self.store.load(&self.job.dataset).await
    }

    async fn scan(&self) -> Result<ValueDomain> {
        match &self.job.column {
            Some(column) => {
                tracing::info!("🔎 Scanning column '{}' of <{}>", column, self.job.dataset);
                scanner::scan_attribute(&self.records, &self.job.dataset, column)
            }
            None => {
                tracing::info!("🔎 Scanning categories of <{}>", self.job.dataset);
                scanner::scan_categories(&self.records, &self.job.dataset)
            }
        }
    }

    async fn build(&self, domain: ValueDomain) -> Result<ColorTable> {
        let style = match &self.job.style {
            StyleChoice::NamedRamp(name) => Style::NamedRamp(name.clone()),
            StyleChoice::RuleFile(input) => Style::RuleFile(input.clone()),
            StyleChoice::Donor(name) => {
                let table = self
                    .store
                    .load_colors(name)
                    .await?
                    .ok_or_else(|| ColorError::DonorNotFoundError { name: name.clone() })?;
                Style::DonorTable(table)
            }
        };

        let histogram = if self.needs_histogram_ramp() {
            self.frequencies()?
        } else {
            None
        };
        let options = BuildOptions {
            seed: self.job.seed,
            histogram: histogram.as_deref(),
        };
        builder::build(&domain, style, &options)
    }

    async fn transform(&self, table: ColorTable) -> Result<ColorTable> {
        let histogram = if self.job.flags.histogram_equalize {
            self.frequencies()?
        } else {
            None
        };
        let ctx = TransformContext {
            log_samples: self.job.log_samples,
            histogram: histogram.as_deref(),
        };
        transform::apply_transforms(table, &self.job.flags, &ctx)
    }

    async fn save(&self, table: ColorTable) -> Result<String> {
        self.store.save(&self.job.dataset, &table).await?;
        Ok(self.job.dataset.clone())
    }

    async fn remove(&self) -> Result<usize> {
        self.store.remove(&self.job.dataset).await
    }
}
