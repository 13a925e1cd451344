use crate::domain::model::{ColorJob, ColorTable, ColumnKind, HistogramBin, ValueDomain};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Streaming values of one column; `None` marks a null.
pub type ValueIter<'a> = Box<dyn Iterator<Item = Result<Option<f64>>> + 'a>;

pub trait RecordSource {
    /// Fails with `ColumnNotFoundError` when the column does not exist.
    fn column_kind(&self, column: &str) -> Result<ColumnKind>;

    fn values(&self, column: &str) -> Result<ValueIter<'_>>;

    /// Lowest and highest feature identifier, `None` when there are no features.
    fn identifier_range(&self) -> Result<Option<(i64, i64)>>;
}

pub trait HistogramSource {
    /// Counts per distinct value of `column`, or of the identifiers when `None`.
    fn frequency_table(&self, column: Option<&str>) -> Result<Vec<HistogramBin>>;
}

pub trait ColorTableStore: Send + Sync {
    fn save(
        &self,
        dataset: &str,
        table: &ColorTable,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Number of tables removed; 0 when none existed.
    fn remove(&self, dataset: &str) -> impl std::future::Future<Output = Result<usize>> + Send;

    fn load(
        &self,
        dataset: &str,
    ) -> impl std::future::Future<Output = Result<Option<ColorTable>>> + Send;
}

#[async_trait]
pub trait DonorTableSource: Send + Sync {
    async fn load_colors(&self, name: &str) -> Result<Option<ColorTable>>;
}

/// The stages of deriving one dataset's color table.
#[async_trait]
pub trait ColorPipeline: Send + Sync {
    fn job(&self) -> &ColorJob;
    /// Table currently stored for the dataset, if any.
    async fn existing(&self) -> Result<Option<ColorTable>>;
    async fn scan(&self) -> Result<ValueDomain>;
    async fn build(&self, domain: ValueDomain) -> Result<ColorTable>;
    async fn transform(&self, table: ColorTable) -> Result<ColorTable>;
    async fn save(&self, table: ColorTable) -> Result<String>;
    async fn remove(&self) -> Result<usize>;
}
