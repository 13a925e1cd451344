use crate::domain::model::ValueDomain;
use crate::domain::ports::ColorPipeline;
use crate::utils::error::{ColorError, Result};
use crate::utils::monitor::SystemMonitor;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub dataset: String,
    pub style: String,
    pub domain: ValueDomain,
    pub breakpoints: usize,
}

pub struct ColorEngine<P: ColorPipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: ColorPipeline> ColorEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Derives the color table and saves it. Nothing is written unless every
    /// stage succeeded.
    pub async fn run(&self) -> Result<RunSummary> {
        let job = self.pipeline.job();
        tracing::info!("🎨 Deriving color table for <{}>", job.dataset);

        if !job.overwrite && self.pipeline.existing().await?.is_some() {
            return Err(ColorError::TableExistsError {
                dataset: job.dataset.clone(),
            });
        }

        // Scan
        let domain = self.pipeline.scan().await?;
        tracing::info!(
            "📏 Value range [{}, {}] ({})",
            domain.min(),
            domain.max(),
            if domain.is_floating_point() { "floating point" } else { "integer" }
        );
        self.monitor.log_stats("Scan");

        // Build
        let table = self.pipeline.build(domain).await?;
        tracing::info!("🖌️  Built color table with {} breakpoints", table.len());
        self.monitor.log_stats("Build");

        // Transform
        let table = if job.flags.any() {
            let table = self.pipeline.transform(table).await?;
            tracing::info!("🔁 Transformed color table ({} breakpoints)", table.len());
            self.monitor.log_stats("Transform");
            table
        } else {
            table
        };

        // Save
        let breakpoints = table.len();
        let dataset = self.pipeline.save(table).await?;
        tracing::info!(
            "✅ Color table for <{}> set to '{}'",
            dataset,
            job.style.describe()
        );
        self.monitor.log_final_stats();

        Ok(RunSummary {
            dataset,
            style: job.style.describe(),
            domain,
            breakpoints,
        })
    }

    pub async fn remove(&self) -> Result<usize> {
        let dataset = &self.pipeline.job().dataset;
        let removed = self.pipeline.remove().await?;
        if removed == 0 {
            tracing::warn!("⚠️  Color table of <{}> not found", dataset);
        } else {
            tracing::info!("🗑️  Removed color table of <{}>", dataset);
        }
        Ok(removed)
    }
}
