use crate::domain::model::{ColumnKind, ValueDomain};
use crate::domain::ports::RecordSource;
use crate::utils::error::{ColorError, Result};

/// Running min/max over a stream of nullable values.
///
/// Partial accumulators built over separate chunks combine with [`merge`],
/// which is associative and commutative, so the result does not depend on
/// how the records were split.
///
/// [`merge`]: DomainAccumulator::merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainAccumulator {
    min: f64,
    max: f64,
    records: u64,
    values: u64,
}

impl Default for DomainAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainAccumulator {
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            records: 0,
            values: 0,
        }
    }

    /// `None`, `NaN` and infinities count as nulls.
    pub fn push(&mut self, value: Option<f64>) {
        self.records += 1;
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.values += 1;
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            records: self.records + other.records,
            values: self.values + other.values,
        }
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn nulls(&self) -> u64 {
        self.records - self.values
    }

    pub fn finish(self, dataset: &str, column: &str, is_floating_point: bool) -> Result<ValueDomain> {
        if self.records == 0 {
            return Err(ColorError::EmptyDatasetError {
                dataset: dataset.to_string(),
            });
        }
        if self.values == 0 {
            return Err(ColorError::NoNumericDataError {
                column: column.to_string(),
            });
        }
        ValueDomain::new(self.min, self.max, is_floating_point)
    }
}

/// Integer domain spanning the feature identifiers.
pub fn scan_categories<R>(source: &R, dataset: &str) -> Result<ValueDomain>
where
    R: RecordSource + ?Sized,
{
    let (min, max) = source
        .identifier_range()?
        .ok_or_else(|| ColorError::EmptyDatasetError {
            dataset: dataset.to_string(),
        })?;

    tracing::debug!("Category range of <{}>: {}..{}", dataset, min, max);
    ValueDomain::new(min as f64, max as f64, false)
}

/// Single pass over `column`, skipping nulls.
pub fn scan_attribute<R>(source: &R, dataset: &str, column: &str) -> Result<ValueDomain>
where
    R: RecordSource + ?Sized,
{
    let kind = source.column_kind(column)?;
    if !kind.is_numeric() {
        return Err(ColorError::ColumnTypeError {
            column: column.to_string(),
        });
    }

    let mut acc = DomainAccumulator::new();
    for value in source.values(column)? {
        acc.push(value?);
    }

    tracing::debug!(
        "Scanned {} records of <{}> ({} null values in '{}')",
        acc.records(),
        dataset,
        acc.nulls(),
        column
    );

    acc.finish(dataset, column, kind == ColumnKind::Double)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ValueIter;
    use std::collections::HashMap;

    struct MemorySource {
        ids: Vec<i64>,
        columns: HashMap<String, (ColumnKind, Vec<Option<f64>>)>,
    }

    impl MemorySource {
        fn new(ids: Vec<i64>) -> Self {
            Self {
                ids,
                columns: HashMap::new(),
            }
        }

        fn with_column(mut self, name: &str, kind: ColumnKind, values: Vec<Option<f64>>) -> Self {
            self.columns.insert(name.to_string(), (kind, values));
            self
        }
    }

    impl RecordSource for MemorySource {
        fn column_kind(&self, column: &str) -> Result<ColumnKind> {
            self.columns
                .get(column)
                .map(|(kind, _)| *kind)
                .ok_or_else(|| ColorError::ColumnNotFoundError {
                    column: column.to_string(),
                })
        }

        fn values(&self, column: &str) -> Result<ValueIter<'_>> {
            let (_, values) = &self.columns[column];
            Ok(Box::new(values.iter().map(|v| Ok(*v))))
        }

        fn identifier_range(&self) -> Result<Option<(i64, i64)>> {
            let min = self.ids.iter().min().copied();
            let max = self.ids.iter().max().copied();
            Ok(min.zip(max))
        }
    }

    #[test]
    fn test_scan_categories() {
        let source = MemorySource::new(vec![4, 2, 9, 3]);
        let domain = scan_categories(&source, "roads").unwrap();
        assert_eq!((domain.min(), domain.max()), (2.0, 9.0));
        assert!(!domain.is_floating_point());
    }

    #[test]
    fn test_scan_categories_empty() {
        let source = MemorySource::new(vec![]);
        assert!(matches!(
            scan_categories(&source, "roads"),
            Err(ColorError::EmptyDatasetError { .. })
        ));
    }

    #[test]
    fn test_scan_attribute_skips_nulls() {
        let source = MemorySource::new(vec![1, 2, 3]).with_column(
            "elev",
            ColumnKind::Double,
            vec![Some(12.5), None, Some(-3.0)],
        );
        let domain = scan_attribute(&source, "pts", "elev").unwrap();
        assert_eq!((domain.min(), domain.max()), (-3.0, 12.5));
        assert!(domain.is_floating_point());
    }

    #[test]
    fn test_scan_attribute_integer_column() {
        let source = MemorySource::new(vec![1]).with_column(
            "lanes",
            ColumnKind::Integer,
            vec![Some(2.0), Some(4.0)],
        );
        let domain = scan_attribute(&source, "roads", "lanes").unwrap();
        assert!(!domain.is_floating_point());
    }

    #[test]
    fn test_scan_attribute_errors() {
        let source = MemorySource::new(vec![1, 2])
            .with_column("empty", ColumnKind::Double, vec![])
            .with_column("nulls", ColumnKind::Integer, vec![None, None])
            .with_column("name", ColumnKind::Text, vec![]);

        assert!(matches!(
            scan_attribute(&source, "d", "missing"),
            Err(ColorError::ColumnNotFoundError { .. })
        ));
        assert!(matches!(
            scan_attribute(&source, "d", "empty"),
            Err(ColorError::EmptyDatasetError { .. })
        ));
        assert!(matches!(
            scan_attribute(&source, "d", "nulls"),
            Err(ColorError::NoNumericDataError { .. })
        ));
        assert!(matches!(
            scan_attribute(&source, "d", "name"),
            Err(ColorError::ColumnTypeError { .. })
        ));
    }

    #[test]
    fn test_single_value_gives_degenerate_domain() {
        let source =
            MemorySource::new(vec![1]).with_column("v", ColumnKind::Double, vec![Some(5.0), Some(5.0)]);
        let domain = scan_attribute(&source, "d", "v").unwrap();
        assert!(domain.is_degenerate());
    }

    #[test]
    fn test_merge_is_independent_of_chunking() {
        let values = [Some(3.0), None, Some(-1.0), Some(8.0), None, Some(2.0)];

        let mut whole = DomainAccumulator::new();
        values.iter().for_each(|v| whole.push(*v));

        for split in 0..=values.len() {
            let (left, right) = values.split_at(split);
            let mut a = DomainAccumulator::new();
            let mut b = DomainAccumulator::new();
            left.iter().for_each(|v| a.push(*v));
            right.iter().for_each(|v| b.push(*v));
            assert_eq!(a.merge(b), whole);
            assert_eq!(b.merge(a), whole);
        }
    }

    #[test]
    fn test_merge_keeps_null_only_detection() {
        let mut a = DomainAccumulator::new();
        let mut b = DomainAccumulator::new();
        a.push(None);
        b.push(None);
        assert!(matches!(
            a.merge(b).finish("d", "c", true),
            Err(ColorError::NoNumericDataError { .. })
        ));
    }

    #[test]
    fn test_non_finite_values_count_as_nulls() {
        let mut acc = DomainAccumulator::new();
        for v in [Some(f64::NAN), Some(f64::INFINITY), Some(2.0), None, Some(f64::NEG_INFINITY)] {
            acc.push(v);
        }
        assert_eq!(acc.records(), 5);
        assert_eq!(acc.nulls(), 4);
        let domain = acc.finish("pts", "v", true).unwrap();
        assert_eq!((domain.min(), domain.max()), (2.0, 2.0));

        let mut only_nan = DomainAccumulator::new();
        only_nan.push(Some(f64::NAN));
        assert!(matches!(
            only_nan.finish("pts", "v", true),
            Err(ColorError::NoNumericDataError { .. })
        ));
    }
}
