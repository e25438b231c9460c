//! 通用表格数据模型

use crate::schema::{self, TableSchema};
use chrono::{NaiveDate, NaiveDateTime};
use kpi_core::{KpiError, Result};
use serde::{Deserialize, Serialize};

/// 列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Date,
    Timestamp,
}

impl ColumnType {
    /// PostgreSQL 列类型
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "BIGINT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// 列定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
    pub nullable: bool,
}

impl Column {
    pub const fn required(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

/// 单元格值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    /// 值的列类型，空值返回 `None`
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(_) => Some(ColumnType::Integer),
            CellValue::Float(_) => Some(ColumnType::Float),
            CellValue::Text(_) => Some(ColumnType::Text),
            CellValue::Date(_) => Some(ColumnType::Date),
            CellValue::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(v) => Some(*v),
            CellValue::Timestamp(v) => Some(v.date()),
            _ => None,
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Timestamp(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// 一张表的完整内容
///
/// 每一行都按表结构校验过列数、类型和可空性。
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    schema: &'static TableSchema,
    rows: Vec<Vec<CellValue>>,
}

impl TableData {
    /// 创建空表
    pub fn new(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// 按表名创建空表
    pub fn for_table(name: &str) -> Result<Self> {
        schema::lookup(name).map(Self::new)
    }

    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    pub fn columns(&self) -> &'static [Column] {
        self.schema.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 追加一行
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<()> {
        self.validate_row(&row)?;
        self.rows.push(row);
        Ok(())
    }

    /// 列序号
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.schema
            .columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| KpiError::NotFound(format!("column {}.{}", self.schema.name, column)))
    }

    /// 取某一列的全部值
    pub fn column_values(&self, column: &str) -> Result<Vec<&CellValue>> {
        let index = self.column_index(column)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    fn validate_row(&self, row: &[CellValue]) -> Result<()> {
        if row.len() != self.schema.columns.len() {
            return Err(KpiError::Validation(format!(
                "table {} expects {} columns, got {}",
                self.schema.name,
                self.schema.columns.len(),
                row.len()
            )));
        }

        for (column, cell) in self.schema.columns.iter().zip(row) {
            match cell.kind() {
                None if !column.nullable => {
                    return Err(KpiError::Validation(format!(
                        "column {}.{} is not nullable",
                        self.schema.name, column.name
                    )));
                }
                Some(kind) if kind != column.kind => {
                    return Err(KpiError::Validation(format!(
                        "column {}.{} expects {:?}, got {:?}",
                        self.schema.name, column.name, column.kind, kind
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
