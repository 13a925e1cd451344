use crate::domain::model::{ColumnKind, HistogramBin};
use crate::domain::ports::{HistogramSource, RecordSource, ValueIter};
use crate::utils::error::{ColorError, Result};
use csv::{Reader, ReaderBuilder, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DEFAULT_KEY_COLUMN: &str = "cat";

/// Records read from a CSV file with a header row.
///
/// The file is streamed again for every request, nothing is kept in memory.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
    key_column: String,
    delimiter: u8,
    declared: HashMap<String, ColumnKind>,
}

fn is_null(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("null")
}

/// `NaN` and infinities parse as floats but carry no value; they count as nulls.
fn parse_finite(cell: &str) -> std::result::Result<Option<f64>, ()> {
    let value = cell.parse::<f64>().map_err(|_| ())?;
    Ok(value.is_finite().then_some(value))
}

impl CsvRecordSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            delimiter: b',',
            declared: HashMap::new(),
        }
    }

    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Declares the type of a column instead of inferring it from the data.
    pub fn with_column_kind(mut self, column: impl Into<String>, kind: ColumnKind) -> Self {
        self.declared.insert(column.into(), kind);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self, column: &str) -> Result<(Reader<File>, usize)> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .from_path(&self.path)?;
        let index = reader
            .headers()?
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| ColorError::ColumnNotFoundError {
                column: column.to_string(),
            })?;
        Ok((reader, index))
    }

    /// Non-null cells of `column`, as text.
    fn cells(&self, column: &str) -> Result<impl Iterator<Item = Result<Option<String>>>> {
        let (reader, index) = self.open(column)?;
        Ok(reader.into_records().map(move |record| {
            let record = record?;
            let cell = record.get(index).unwrap_or("");
            Ok((!is_null(cell)).then(|| cell.to_string()))
        }))
    }

    fn infer_kind(&self, column: &str) -> Result<ColumnKind> {
        let mut kind = ColumnKind::Integer;
        for cell in self.cells(column)? {
            let Some(cell) = cell? else { continue };
            if kind == ColumnKind::Integer && cell.parse::<i64>().is_ok() {
                continue;
            }
            match parse_finite(&cell) {
                Ok(Some(_)) => kind = ColumnKind::Double,
                Ok(None) => continue,
                Err(()) => return Ok(ColumnKind::Text),
            }
        }
        Ok(kind)
    }
}

impl RecordSource for CsvRecordSource {
    fn column_kind(&self, column: &str) -> Result<ColumnKind> {
        // 先確認欄位存在
        self.open(column)?;
        match self.declared.get(column) {
            Some(kind) => Ok(*kind),
            None => {
                let kind = self.infer_kind(column)?;
                tracing::debug!("Inferred type of column '{}': {:?}", column, kind);
                Ok(kind)
            }
        }
    }

    fn values(&self, column: &str) -> Result<ValueIter<'_>> {
        let name = column.to_string();
        let cells = self.cells(column)?;
        Ok(Box::new(cells.map(move |cell| match cell? {
            None => Ok(None),
            Some(text) => {
                parse_finite(&text).map_err(|_| ColorError::ColumnTypeError { column: name.clone() })
            }
        })))
    }

    fn identifier_range(&self) -> Result<Option<(i64, i64)>> {
        let mut range: Option<(i64, i64)> = None;
        for cell in self.cells(&self.key_column)? {
            let Some(cell) = cell? else { continue };
            let id = cell.parse::<i64>().map_err(|_| ColorError::ColumnTypeError {
                column: self.key_column.clone(),
            })?;
            range = Some(match range {
                Some((lo, hi)) => (lo.min(id), hi.max(id)),
                None => (id, id),
            });
        }
        Ok(range)
    }
}

impl HistogramSource for CsvRecordSource {
    fn frequency_table(&self, column: Option<&str>) -> Result<Vec<HistogramBin>> {
        let column = column.unwrap_or(&self.key_column);
        let mut counts: HashMap<u64, u64> = HashMap::new();
        for value in self.values(column)? {
            if let Some(v) = value? {
                // -0.0 與 0.0 視為同一值
                let key = if v == 0.0 { 0.0f64 } else { v };
                *counts.entry(key.to_bits()).or_default() += 1;
            }
        }

        let mut bins: Vec<HistogramBin> = counts
            .into_iter()
            .map(|(bits, count)| HistogramBin {
                value: f64::from_bits(bits),
                count,
            })
            .collect();
        bins.sort_by(|a, b| a.value.total_cmp(&b.value));
        Ok(bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const ROADS: &str = "cat,name,lanes,speed\n3,Main,2,50.5\n1,Side,,30\n7,High,4,NULL\n";

    #[test]
    fn test_identifier_range() {
        let file = csv_file(ROADS);
        let source = CsvRecordSource::new(file.path());
        assert_eq!(source.identifier_range().unwrap(), Some((1, 7)));
    }

    #[test]
    fn test_identifier_range_custom_key_and_empty() {
        let file = csv_file("fid;v\n");
        let source = CsvRecordSource::new(file.path())
            .with_delimiter(b';')
            .with_key_column("fid");
        assert_eq!(source.identifier_range().unwrap(), None);
    }

    #[test]
    fn test_column_kind_inference() {
        let file = csv_file(ROADS);
        let source = CsvRecordSource::new(file.path());
        assert_eq!(source.column_kind("lanes").unwrap(), ColumnKind::Integer);
        assert_eq!(source.column_kind("speed").unwrap(), ColumnKind::Double);
        assert_eq!(source.column_kind("name").unwrap(), ColumnKind::Text);
        assert!(matches!(
            source.column_kind("width"),
            Err(ColorError::ColumnNotFoundError { .. })
        ));
    }

    #[test]
    fn test_declared_kind_wins() {
        let file = csv_file(ROADS);
        let source = CsvRecordSource::new(file.path()).with_column_kind("lanes", ColumnKind::Double);
        assert_eq!(source.column_kind("lanes").unwrap(), ColumnKind::Double);
    }

    #[test]
    fn test_values_yield_nulls() {
        let file = csv_file(ROADS);
        let source = CsvRecordSource::new(file.path());
        let values: Vec<Option<f64>> = source.values("speed").unwrap().map(|v| v.unwrap()).collect();
        assert_eq!(values, vec![Some(50.5), Some(30.0), None]);
    }

    #[test]
    fn test_frequency_table() {
        let file = csv_file("cat,v\n1,2\n2,2\n3,5\n4,\n");
        let source = CsvRecordSource::new(file.path());
        let bins = source.frequency_table(Some("v")).unwrap();
        assert_eq!(
            bins,
            vec![
                HistogramBin { value: 2.0, count: 2 },
                HistogramBin { value: 5.0, count: 1 },
            ]
        );
        assert_eq!(source.frequency_table(None).unwrap().len(), 4);
    }

    #[test]
    fn test_non_finite_cells_are_nulls() {
        let file = csv_file("cat,v,w\n1,NaN,1.5\n2,nan,inf\n3,,-infinity\n4,NULL,2\n");
        let source = CsvRecordSource::new(file.path());

        assert_eq!(source.column_kind("v").unwrap(), ColumnKind::Integer);
        assert!(matches!(
            crate::core::scanner::scan_attribute(&source, "pts", "v"),
            Err(ColorError::NoNumericDataError { .. })
        ));

        assert_eq!(source.column_kind("w").unwrap(), ColumnKind::Double);
        let values: Vec<Option<f64>> = source.values("w").unwrap().map(|v| v.unwrap()).collect();
        assert_eq!(values, vec![Some(1.5), None, None, Some(2.0)]);
    }

    #[test]
    fn test_single_infinite_cell_does_not_break_scan() {
        let file = csv_file("cat,v\n1,1\n2,inf\n3,4\n");
        let source = CsvRecordSource::new(file.path());
        assert_eq!(source.column_kind("v").unwrap(), ColumnKind::Integer);

        let domain = crate::core::scanner::scan_attribute(&source, "pts", "v").unwrap();
        assert_eq!((domain.min(), domain.max()), (1.0, 4.0));
        assert!(!domain.is_floating_point());
    }
}
