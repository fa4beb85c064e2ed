use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value};

use crate::error::{ChartError, ChartResult};

/// Row object handed to the rendering engine: `{column_name: value}`.
pub type DataRow = Map<String, Value>;

/// Single cell of a columnar dataset snapshot.
///
/// Equality is byte-level: floats compare by bit pattern (so `NaN == NaN`
/// and `0.0 != -0.0`) and decimals compare by their serialized form (so
/// `1.0 != 1.00`).
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn same_bytes(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Decimal(a), Self::Decimal(b)) => a.serialize() == b.serialize(),
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Converts the cell into the JSON value the rendering engine consumes.
    ///
    /// Timestamps become epoch milliseconds; non-finite floats and decimals
    /// outside the `f64` range become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::from(*value),
            Self::Float(value) => Number::from_f64(*value).map_or(Value::Null, Value::Number),
            Self::Decimal(value) => value
                .to_f64()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
            Self::Timestamp(value) => Value::from(value.timestamp_millis()),
            Self::Text(value) => Value::String(value.clone()),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.same_bytes(other)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Named column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    #[must_use]
    pub fn new<I, V>(name: impl Into<String>, cells: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self {
            name: name.into(),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Immutable columnar dataset snapshot.
///
/// Snapshots are compared structurally (shape and cell bytes), never by
/// identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table from equally sized columns.
    pub fn new(columns: Vec<Column>) -> ChartResult<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        if let Some(ragged) = columns.iter().find(|column| column.len() != row_count) {
            return Err(ChartError::InvalidData(format!(
                "column `{}` has {} rows, expected {row_count}",
                ragged.name,
                ragged.len()
            )));
        }
        Ok(Self { columns, row_count })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.columns.get(column)?.cells.get(row)
    }

    /// Returns `true` when `row` holds the same cell bytes in both tables.
    ///
    /// Rows outside either table, or tables with different column counts,
    /// never compare equal.
    #[must_use]
    pub fn row_matches(&self, other: &Self, row: usize) -> bool {
        if self.column_count() != other.column_count()
            || row >= self.row_count
            || row >= other.row_count
        {
            return false;
        }
        self.columns
            .iter()
            .zip(&other.columns)
            .all(|(left, right)| left.cells[row].same_bytes(&right.cells[row]))
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<DataRow> {
        if row >= self.row_count {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|column| (column.name.clone(), column.cells[row].to_json()))
                .collect(),
        )
    }

    /// Materializes every row starting at `offset` as engine row objects.
    #[must_use]
    pub fn rows_from(&self, offset: usize) -> Vec<DataRow> {
        (offset..self.row_count)
            .filter_map(|row| self.row(row))
            .collect()
    }

    /// Returns a new table with `tail`'s rows appended after this table's rows.
    pub fn concat(&self, tail: &Self) -> ChartResult<Self> {
        if self.columns.is_empty() {
            return Ok(tail.clone());
        }
        if self.column_count() != tail.column_count() {
            return Err(ChartError::InvalidData(format!(
                "cannot append {} columns to a table with {} columns",
                tail.column_count(),
                self.column_count()
            )));
        }
        let columns = self
            .columns
            .iter()
            .zip(&tail.columns)
            .map(|(head, rest)| Column {
                name: head.name.clone(),
                cells: head.cells.iter().chain(&rest.cells).cloned().collect(),
            })
            .collect();
        Self::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{CellValue, Column, Table};

    #[test]
    fn ragged_columns_are_rejected() {
        let result = Table::new(vec![
            Column::new("a", [1_i64, 2]),
            Column::new("b", [1_i64]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(CellValue::Float(f64::NAN), CellValue::Float(f64::NAN));
        assert_ne!(CellValue::Float(0.0), CellValue::Float(-0.0));
        assert_ne!(CellValue::Int(1), CellValue::Float(1.0));
    }

    #[test]
    fn decimal_equality_keeps_scale() {
        let one = Decimal::new(10, 1);
        let one_two_places = Decimal::new(100, 2);
        assert_ne!(CellValue::Decimal(one), CellValue::Decimal(one_two_places));
        assert_eq!(CellValue::Decimal(one), CellValue::Decimal(Decimal::new(10, 1)));
    }

    #[test]
    fn rows_are_materialized_as_objects() {
        let time = chrono::Utc
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .expect("valid timestamp");
        let table = Table::new(vec![
            Column::new("when", [time]),
            Column::new("value", [f64::INFINITY]),
            Column::new("label", [Some("a")]),
        ])
        .expect("table");

        let rows = table.rows_from(0);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            serde_json::Value::Object(rows[0].clone()),
            json!({"when": 1_700_000_000_000_i64, "value": null, "label": "a"})
        );
        assert!(table.rows_from(1).is_empty());
    }

    #[test]
    fn concat_appends_rows_in_order() {
        let head = Table::new(vec![Column::new("x", [1_i64, 2])]).expect("head");
        let tail = Table::new(vec![Column::new("x", [3_i64])]).expect("tail");
        let joined = head.concat(&tail).expect("concat");
        assert_eq!(joined.row_count(), 3);
        assert_eq!(joined.cell(2, 0), Some(&CellValue::Int(3)));
        assert!(joined.row_matches(&head, 1));
        assert!(!joined.row_matches(&head, 2));
    }
}
