//! In-memory column-typed table with a designated timestamp column and a
//! binary label column.
//!
//! A `Table` is immutable once built by ingestion; slicing produces new
//! independent tables (rows are copied, never shared).

pub mod decode;
pub mod timestamp;

use chrono::NaiveDateTime;

pub use decode::{decode, DecodeError, RawTable};
pub use timestamp::{format_timestamp, parse_timestamp, synthetic_epoch};

/// Canonical name of the timestamp column after normalization.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";
/// Required binary label column.
pub const LABEL_COLUMN: &str = "Response";

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Every non-empty cell parsed as a number.
    Numeric(Vec<Option<f64>>),
    /// Free text; one-hot expanded at training time.
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Self::Categorical(v) => {
                Self::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A feature column (anything other than the timestamp and label).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    /// Infer the column type from its raw cells: numeric when every
    /// non-empty cell parses as `f64`, categorical otherwise.
    pub fn infer(name: impl Into<String>, cells: Vec<String>) -> Self {
        let numeric = cells
            .iter()
            .filter(|c| !c.trim().is_empty())
            .all(|c| c.trim().parse::<f64>().is_ok());

        let data = if numeric {
            ColumnData::Numeric(
                cells
                    .iter()
                    .map(|c| c.trim().parse::<f64>().ok())
                    .collect(),
            )
        } else {
            ColumnData::Categorical(
                cells
                    .into_iter()
                    .map(|c| {
                        let c = c.trim().to_string();
                        (!c.is_empty()).then_some(c)
                    })
                    .collect(),
            )
        };

        Self {
            name: name.into(),
            data,
        }
    }
}

/// Parse a label cell. Accepts `0`/`1` in integer, float or boolean spelling.
pub fn parse_label(raw: &str) -> Option<u8> {
    let s = raw.trim();
    match s.to_ascii_lowercase().as_str() {
        "true" => return Some(1),
        "false" => return Some(0),
        _ => {}
    }
    match s.parse::<f64>() {
        Ok(v) if v == 0.0 => Some(0),
        Ok(v) if v == 1.0 => Some(1),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    LengthMismatch { column: String, expected: usize, got: usize },
    DuplicateColumn(String),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch {
                column,
                expected,
                got,
            } => write!(
                f,
                "column {column:?} has {got} values, expected {expected}"
            ),
            Self::DuplicateColumn(name) => write!(f, "duplicate column name {name:?}"),
        }
    }
}

impl std::error::Error for TableError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Full column order, including the timestamp and label columns.
    column_names: Vec<String>,
    timestamps: Vec<NaiveDateTime>,
    labels: Vec<u8>,
    features: Vec<Column>,
}

impl Table {
    /// Assemble a table. `column_names` must list every column exactly once:
    /// the timestamp column, the label column and each feature column.
    pub fn new(
        column_names: Vec<String>,
        timestamps: Vec<NaiveDateTime>,
        labels: Vec<u8>,
        features: Vec<Column>,
    ) -> Result<Self, TableError> {
        let n = timestamps.len();
        if labels.len() != n {
            return Err(TableError::LengthMismatch {
                column: LABEL_COLUMN.to_string(),
                expected: n,
                got: labels.len(),
            });
        }
        for col in &features {
            if col.data.len() != n {
                return Err(TableError::LengthMismatch {
                    column: col.name.clone(),
                    expected: n,
                    got: col.data.len(),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for name in &column_names {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self {
            column_names,
            timestamps,
            labels,
            features,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn feature_columns(&self) -> &[Column] {
        &self.features
    }

    pub fn label_sum(&self) -> u64 {
        self.labels.iter().map(|&l| u64::from(l)).sum()
    }

    /// Earliest and latest timestamp, `None` for an empty table.
    pub fn time_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.timestamps.iter().min()?;
        let max = self.timestamps.iter().max()?;
        Some((*min, *max))
    }

    /// Copy the given rows, in the given order, into a new table.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            column_names: self.column_names.clone(),
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            features: self
                .features
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(indices),
                })
                .collect(),
        }
    }

    /// Stable ascending sort on the timestamp column. Row positions are
    /// contiguous from zero afterwards.
    pub fn sort_by_timestamp(&mut self) {
        let mut order: Vec<usize> = (0..self.n_rows()).collect();
        order.sort_by_key(|&i| self.timestamps[i]);
        if order.iter().enumerate().any(|(pos, &i)| pos != i) {
            *self = self.take(&order);
        }
    }

    /// Rows with `start <= ts <= end`, sorted by timestamp.
    pub fn slice_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let indices: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| **ts >= start && **ts <= end)
            .map(|(i, _)| i)
            .collect();
        let mut slice = self.take(&indices);
        slice.sort_by_timestamp();
        slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Table {
        let base = synthetic_epoch();
        let ts = vec![
            base + Duration::seconds(2),
            base,
            base + Duration::seconds(1),
            base + Duration::seconds(1),
        ];
        Table::new(
            vec![
                TIMESTAMP_COLUMN.into(),
                "Temp".into(),
                "Line".into(),
                LABEL_COLUMN.into(),
            ],
            ts,
            vec![1, 0, 1, 0],
            vec![
                Column::infer("Temp", vec!["3".into(), "1".into(), "2a".into(), "".into()]),
                Column::infer("Line", vec!["1".into(), "2".into(), "".into(), "4.5".into()]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_infer_types() {
        let t = sample();
        assert!(matches!(t.features[0].data, ColumnData::Categorical(_)));
        assert_eq!(
            t.features[1].data,
            ColumnData::Numeric(vec![Some(1.0), Some(2.0), None, Some(4.5)])
        );
    }

    #[test]
    fn test_sort_is_stable_and_carries_rows() {
        let mut t = sample();
        t.sort_by_timestamp();
        let base = synthetic_epoch();
        assert_eq!(t.timestamps()[0], base);
        assert_eq!(t.labels(), &[0, 1, 0, 1]);
        assert_eq!(
            t.features[1].data,
            ColumnData::Numeric(vec![Some(2.0), None, Some(4.5), Some(1.0)])
        );
    }

    #[test]
    fn test_slice_is_inclusive_and_independent() {
        let t = sample();
        let base = synthetic_epoch();
        let slice = t.slice_between(base + Duration::seconds(1), base + Duration::seconds(2));
        assert_eq!(slice.n_rows(), 3);
        assert!(slice.timestamps().windows(2).all(|w| w[0] <= w[1]));

        let mut slice = slice;
        slice.labels[0] = 1;
        slice.labels[1] = 1;
        assert_eq!(t.labels(), &[1, 0, 1, 0]);
    }

    #[test]
    fn test_bounds_and_counts() {
        let t = sample();
        let base = synthetic_epoch();
        assert_eq!(t.time_bounds(), Some((base, base + Duration::seconds(2))));
        assert_eq!(t.label_sum(), 2);
        assert_eq!(t.n_columns(), 4);
        assert_eq!(t.take(&[]).time_bounds(), None);
    }

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        let err = Table::new(
            vec![TIMESTAMP_COLUMN.into(), LABEL_COLUMN.into()],
            vec![synthetic_epoch()],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { .. }));
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("1"), Some(1));
        assert_eq!(parse_label("0.0"), Some(0));
        assert_eq!(parse_label("TRUE"), Some(1));
        assert_eq!(parse_label("2"), None);
        assert_eq!(parse_label(""), None);
    }
}
