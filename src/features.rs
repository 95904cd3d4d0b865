//! One-hot feature expansion and schema alignment.
//!
//! Numeric columns pass through under their own name. Categorical columns
//! expand to `<column>_<value>` indicator columns. A fitted model keeps the
//! ordered [`FeatureSchema`] it was trained on, and every inference input is
//! realigned against it.

use std::collections::{BTreeSet, HashMap};

use crate::table::{ColumnData, Table};

/// Ordered list of expanded column names a model expects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Schema covering every value observed across `tables`: numeric columns
    /// first (original order), then one indicator per categorical value,
    /// grouped by column with values sorted.
    pub fn observed_in(tables: &[&Table]) -> Self {
        let Some(first) = tables.first() else {
            return Self::default();
        };

        let mut numeric = Vec::new();
        let mut dummies = Vec::new();

        for (idx, col) in first.feature_columns().iter().enumerate() {
            match &col.data {
                ColumnData::Numeric(_) => numeric.push(col.name.clone()),
                ColumnData::Categorical(_) => {
                    let mut values = BTreeSet::new();
                    for table in tables {
                        if let Some(ColumnData::Categorical(cells)) =
                            table.feature_columns().get(idx).map(|c| &c.data)
                        {
                            values.extend(cells.iter().flatten().cloned());
                        }
                    }
                    dummies.extend(values.into_iter().map(|v| dummy_name(&col.name, &v)));
                }
            }
        }

        numeric.extend(dummies);
        Self::new(numeric)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Project an observed (name, value) row onto this schema: columns the
    /// schema expects but the row lacks become `0.0`, columns the schema does
    /// not know are dropped, and the result follows schema order.
    pub fn realign(&self, observed: &[(String, f64)]) -> Vec<f64> {
        let lookup: HashMap<&str, f64> = observed
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        self.columns
            .iter()
            .map(|c| lookup.get(c.as_str()).copied().unwrap_or(0.0))
            .collect()
    }
}

fn dummy_name(column: &str, value: &str) -> String {
    format!("{column}_{value}")
}

/// Sparse expansion of one row. Missing numeric cells become NaN; missing
/// categorical cells contribute no indicator.
pub fn expand_row(table: &Table, row: usize) -> Vec<(String, f64)> {
    table
        .feature_columns()
        .iter()
        .filter_map(|col| match &col.data {
            ColumnData::Numeric(values) => {
                Some((col.name.clone(), values[row].unwrap_or(f64::NAN)))
            }
            ColumnData::Categorical(values) => values[row]
                .as_ref()
                .map(|v| (dummy_name(&col.name, v), 1.0)),
        })
        .collect()
}

/// Dense row-major matrix bound to a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn encode(table: &Table, schema: &FeatureSchema) -> Self {
        let rows = (0..table.n_rows())
            .map(|r| schema.realign(&expand_row(table, r)))
            .collect();
        Self {
            columns: schema.columns().to_vec(),
            rows,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Expand train and test over a shared schema. The schema is computed from
/// the concatenation of both slices; the returned schema is the one a model
/// fitted on the train matrix must be stored with.
pub fn encode_joint(train: &Table, test: &Table) -> (FeatureSchema, FeatureMatrix, FeatureMatrix) {
    let schema = FeatureSchema::observed_in(&[train, test]);
    let train_matrix = FeatureMatrix::encode(train, &schema);
    let test_matrix = FeatureMatrix::encode(test, &schema);
    (schema, train_matrix, test_matrix)
}
