//! Upload → normalized dataset.

use chrono::{DateTime, Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

use super::evaluation::round2;
use super::session::{Dataset, Session};
use super::PipelineError;
use crate::table::{
    decode, format_timestamp, parse_label, parse_timestamp, synthetic_epoch, Column, Table,
    TableError, LABEL_COLUMN, TIMESTAMP_COLUMN,
};

/// Metadata reported after a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub file_name: String,
    pub total_records: usize,
    pub total_columns: usize,
    pub pass_rate: f64,
    pub start_timestamp: Option<String>,
    pub end_timestamp: Option<String>,
}

impl DatasetSummary {
    pub fn describe(file_name: &str, table: &Table) -> Self {
        let total = table.n_rows();
        let pass_rate = if total == 0 {
            0.0
        } else {
            round2(table.label_sum() as f64 / total as f64 * 100.0)
        };
        Self {
            file_name: file_name.to_string(),
            total_records: total,
            total_columns: table.n_columns(),
            pass_rate,
            start_timestamp: table.timestamps().first().map(format_timestamp),
            end_timestamp: table.timestamps().last().map(format_timestamp),
        }
    }
}

fn is_time_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("time") || lower.contains("date")
}

/// A time column made entirely of finite numbers holds nanosecond offsets
/// from the Unix epoch. Fractional nanoseconds are truncated.
fn epoch_offsets(cells: &[String]) -> Option<Vec<NaiveDateTime>> {
    if cells.is_empty() {
        return None;
    }
    cells
        .iter()
        .map(|cell| {
            let value = cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
            Some(DateTime::from_timestamp_nanos(value as i64).naive_utc())
        })
        .collect()
}

/// Decode and normalize an upload without touching any session.
///
/// The first column whose name mentions `time` or `date` becomes the
/// timestamp column; without one, a synthetic column counting seconds from
/// the epoch is inserted first. The result is sorted by timestamp.
pub fn load_table(bytes: &[u8], file_name: &str) -> Result<Table, PipelineError> {
    let raw = decode(bytes, file_name)
        .map_err(|e| PipelineError::Format(format!("Could not read file: {e}")))?;

    let Some(label_idx) = raw.headers.iter().position(|h| h == LABEL_COLUMN) else {
        return Err(PipelineError::Schema(format!(
            "Dataset must contain a '{LABEL_COLUMN}' column."
        )));
    };

    let labels = raw
        .column(label_idx)
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            parse_label(cell).ok_or_else(|| {
                PipelineError::Schema(format!(
                    "Column '{LABEL_COLUMN}' must contain only 0/1 values (row {}: {cell:?}).",
                    row + 1
                ))
            })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let time_idx = raw.headers.iter().position(|h| is_time_column(h));

    let (column_names, timestamps) = match time_idx {
        Some(idx) => {
            let source = &raw.headers[idx];
            let cells = raw.column(idx);
            let timestamps = match epoch_offsets(&cells) {
                Some(timestamps) => {
                    debug!(column = %source, "reading numeric column as epoch nanoseconds");
                    timestamps
                }
                None => cells
                    .iter()
                    .enumerate()
                    .map(|(row, cell)| {
                        parse_timestamp(cell).ok_or_else(|| {
                            PipelineError::Format(format!(
                                "Could not read file: unparseable timestamp {cell:?} in column '{source}' (row {}).",
                                row + 1
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            };
            debug!(column = %source, "using existing column as timestamp");

            let mut names = raw.headers.clone();
            names[idx] = TIMESTAMP_COLUMN.to_string();
            (names, timestamps)
        }
        None => {
            let epoch = synthetic_epoch();
            let timestamps = (0..raw.rows.len())
                .map(|i| epoch + Duration::seconds(i as i64))
                .collect();
            let mut names = Vec::with_capacity(raw.headers.len() + 1);
            names.push(TIMESTAMP_COLUMN.to_string());
            names.extend(raw.headers.iter().cloned());
            (names, timestamps)
        }
    };

    let features = raw
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx && Some(*i) != time_idx)
        .map(|(i, name)| Column::infer(name.clone(), raw.column(i)))
        .collect();

    let mut table =
        Table::new(column_names, timestamps, labels, features).map_err(|e| match e {
            TableError::DuplicateColumn(name) => PipelineError::Schema(format!(
                "Dataset has more than one '{name}' column after timestamp normalization."
            )),
            other => PipelineError::Internal(other.to_string()),
        })?;
    table.sort_by_timestamp();
    Ok(table)
}

/// Ingest an upload into the session, replacing any previous dataset.
pub fn ingest(
    session: &mut Session,
    bytes: &[u8],
    file_name: &str,
) -> Result<DatasetSummary, PipelineError> {
    if file_name.is_empty() {
        return Err(PipelineError::Format("No file uploaded.".into()));
    }

    let table = load_table(bytes, file_name)?;
    let summary = DatasetSummary::describe(file_name, &table);
    let dataset = session.install_dataset(Dataset::new(file_name, table));

    info!(
        dataset_id = %dataset.id,
        file = %summary.file_name,
        rows = summary.total_records,
        columns = summary.total_columns,
        pass_rate = summary.pass_rate,
        "dataset ingested"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnData;

    fn ten_rows() -> String {
        let mut csv = String::from("SensorA,SensorB,Response\n");
        for i in 0..10 {
            csv.push_str(&format!("{},{},{}\n", i, 10 - i, u8::from(i % 3 == 0)));
        }
        csv
    }

    #[test]
    fn test_synthetic_timestamps_follow_row_order() {
        let table = load_table(ten_rows().as_bytes(), "plant.csv").unwrap();
        assert_eq!(table.column_names()[0], TIMESTAMP_COLUMN);
        assert_eq!(table.n_columns(), 4);
        for (i, ts) in table.timestamps().iter().enumerate() {
            assert_eq!(*ts, synthetic_epoch() + Duration::seconds(i as i64));
        }
        assert_eq!(
            table.feature_columns()[0].data,
            ColumnData::Numeric((0..10).map(|i| Some(i as f64)).collect())
        );
    }

    #[test]
    fn test_summary_for_ten_rows() {
        let mut session = Session::new();
        let summary = ingest(&mut session, ten_rows().as_bytes(), "plant.csv").unwrap();
        assert_eq!(summary.total_records, 10);
        assert_eq!(summary.total_columns, 4);
        // Rows 0, 3, 6, 9 are positive.
        assert_eq!(summary.pass_rate, 40.0);
        assert_eq!(summary.start_timestamp.as_deref(), Some("2021-01-01 00:00:00"));
        assert_eq!(summary.end_timestamp.as_deref(), Some("2021-01-01 00:00:09"));
        assert!(session.dataset().is_some());
    }

    #[test]
    fn test_reupload_is_idempotent() {
        let mut session = Session::new();
        let a = ingest(&mut session, ten_rows().as_bytes(), "plant.csv").unwrap();
        let b = ingest(&mut session, ten_rows().as_bytes(), "plant.csv").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_existing_time_column_is_renamed_and_sorted() {
        let csv = "Speed,EventDate,Response\n3,2022-05-03,1\n1,2022-05-01,0\n2,2022-05-02,1\n";
        let table = load_table(csv.as_bytes(), "x.csv").unwrap();
        assert_eq!(table.column_names(), &["Speed", TIMESTAMP_COLUMN, LABEL_COLUMN]);
        assert!(table.timestamps().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(table.labels(), &[0, 1, 1]);
        assert_eq!(
            table.feature_columns()[0].data,
            ColumnData::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)])
        );
    }

    #[test]
    fn test_numeric_time_column_is_epoch_nanoseconds() {
        let csv = "CycleTime,Speed,Response\n2500,4,1\n1.5,3,0\n";
        let table = load_table(csv.as_bytes(), "m.csv").unwrap();
        assert_eq!(table.column_names(), &[TIMESTAMP_COLUMN, "Speed", LABEL_COLUMN]);

        let epoch = DateTime::from_timestamp_nanos(0).naive_utc();
        assert_eq!(
            table.timestamps(),
            &[epoch + Duration::nanoseconds(1), epoch + Duration::nanoseconds(2500)]
        );
        assert_eq!(table.labels(), &[0, 1]);
        assert_eq!(
            table.feature_columns()[0].data,
            ColumnData::Numeric(vec![Some(3.0), Some(4.0)])
        );
    }

    #[test]
    fn test_mixed_time_column_still_parses_as_dates() {
        let csv = "Runtime,Response\n2022-05-01,0\n7,1\n";
        assert!(matches!(
            load_table(csv.as_bytes(), "m.csv"),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_first_matching_time_column_wins() {
        let csv = "update_time,created_date,Response\n2022-01-02,2000-01-01,1\n2022-01-01,2000-01-02,0\n";
        let table = load_table(csv.as_bytes(), "x.csv").unwrap();
        assert_eq!(table.column_names()[0], TIMESTAMP_COLUMN);
        assert_eq!(table.feature_columns()[0].name, "created_date");
        assert_eq!(table.labels(), &[0, 1]);
    }

    #[test]
    fn test_missing_label_is_schema_error() {
        let mut session = Session::new();
        let err = ingest(&mut session, b"a,b\n1,2\n", "x.csv").unwrap_err();
        assert_eq!(
            err,
            PipelineError::Schema("Dataset must contain a 'Response' column.".into())
        );
        assert!(session.dataset().is_none());
    }

    #[test]
    fn test_non_binary_label_is_schema_error() {
        let err = load_table(b"a,Response\n1,2\n", "x.csv").unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn test_unreadable_upload_is_format_error() {
        assert!(matches!(
            load_table(b"a,Response\n1\n", "x.csv"),
            Err(PipelineError::Format(_))
        ));
        assert!(matches!(
            load_table(b"binary", "x.xlsx"),
            Err(PipelineError::Format(_))
        ));
        assert!(matches!(
            load_table(b"Timestamp,Response\nnot-a-date,1\n", "x.csv"),
            Err(PipelineError::Format(_))
        ));
    }

    #[test]
    fn test_header_only_upload() {
        let mut session = Session::new();
        let summary = ingest(&mut session, b"a,Response\n", "x.csv").unwrap();
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.pass_rate, 0.0);
        assert_eq!(summary.start_timestamp, None);
        assert_eq!(summary.end_timestamp, None);
    }
}
