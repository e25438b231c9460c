//! 仓库表结构
//!
//! 三张维度/事实表与四张指标表，列名与看板查询约定一致。

use crate::table::{Column, ColumnType};
use kpi_core::{KpiError, Result};

pub const PATIENTS: &str = "patients";
pub const DIAGNOSES: &str = "diagnoses";
pub const ADMISSIONS: &str = "admissions";
pub const KPI_READMISSION_30D: &str = "kpi_readmission_30d";
pub const KPI_AVG_LOS: &str = "kpi_avg_los";
pub const KPI_ADMISSIONS_BY_DX: &str = "kpi_admissions_by_dx";
pub const KPI_DAILY_CENSUS: &str = "kpi_daily_census";

/// 表结构
#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableSchema {
    /// 建表语句
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let null = if c.nullable { "" } else { " NOT NULL" };
                format!("{} {}{}", c.name, c.kind.sql_type(), null)
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        )
    }

    /// 逗号分隔的列名
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 单行插入语句
    pub fn insert_sql(&self) -> String {
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            self.column_list(),
            placeholders.join(", ")
        )
    }
}

pub static PATIENTS_SCHEMA: TableSchema = TableSchema {
    name: PATIENTS,
    columns: &[
        Column::required("patient_id", ColumnType::Integer),
        Column::nullable("gender", ColumnType::Text),
        Column::required("birth_date", ColumnType::Date),
    ],
};

pub static DIAGNOSES_SCHEMA: TableSchema = TableSchema {
    name: DIAGNOSES,
    columns: &[
        Column::required("diagnosis_code", ColumnType::Text),
        Column::required("diagnosis_desc", ColumnType::Text),
    ],
};

pub static ADMISSIONS_SCHEMA: TableSchema = TableSchema {
    name: ADMISSIONS,
    columns: &[
        Column::required("admission_id", ColumnType::Integer),
        Column::required("patient_id", ColumnType::Integer),
        Column::required("admit_time", ColumnType::Timestamp),
        Column::required("discharge_time", ColumnType::Timestamp),
        Column::required("primary_diagnosis", ColumnType::Text),
        Column::required("hospital_id", ColumnType::Integer),
        Column::required("room_id", ColumnType::Text),
    ],
};

pub static KPI_READMISSION_30D_SCHEMA: TableSchema = TableSchema {
    name: KPI_READMISSION_30D,
    columns: &[
        Column::required("as_of_date", ColumnType::Date),
        Column::required("readmission_rate", ColumnType::Float),
    ],
};

pub static KPI_AVG_LOS_SCHEMA: TableSchema = TableSchema {
    name: KPI_AVG_LOS,
    columns: &[
        Column::required("as_of_date", ColumnType::Date),
        Column::required("avg_los_days", ColumnType::Float),
    ],
};

pub static KPI_ADMISSIONS_BY_DX_SCHEMA: TableSchema = TableSchema {
    name: KPI_ADMISSIONS_BY_DX,
    columns: &[
        Column::required("as_of_date", ColumnType::Date),
        Column::required("diagnosis_code", ColumnType::Text),
        Column::required("admissions_count", ColumnType::Integer),
    ],
};

pub static KPI_DAILY_CENSUS_SCHEMA: TableSchema = TableSchema {
    name: KPI_DAILY_CENSUS,
    columns: &[
        Column::required("census_date", ColumnType::Date),
        Column::required("inpatient_count", ColumnType::Integer),
    ],
};

/// 所有表，按发布顺序：先维度/事实表，后指标表
pub static ALL_TABLES: [&TableSchema; 7] = [
    &PATIENTS_SCHEMA,
    &DIAGNOSES_SCHEMA,
    &ADMISSIONS_SCHEMA,
    &KPI_READMISSION_30D_SCHEMA,
    &KPI_AVG_LOS_SCHEMA,
    &KPI_ADMISSIONS_BY_DX_SCHEMA,
    &KPI_DAILY_CENSUS_SCHEMA,
];

/// 额外索引
pub const INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_kpi_daily_census_date ON kpi_daily_census(census_date)",
    "CREATE INDEX IF NOT EXISTS idx_admissions_patient_id ON admissions(patient_id)",
    "CREATE INDEX IF NOT EXISTS idx_kpi_admissions_by_dx_count ON kpi_admissions_by_dx(admissions_count)",
];

/// 按表名查找结构
pub fn lookup(name: &str) -> Result<&'static TableSchema> {
    ALL_TABLES
        .iter()
        .copied()
        .find(|schema| schema.name == name)
        .ok_or_else(|| KpiError::NotFound(format!("table {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            KPI_DAILY_CENSUS_SCHEMA.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS kpi_daily_census (census_date DATE NOT NULL, inpatient_count BIGINT NOT NULL)"
        );
        assert!(PATIENTS_SCHEMA.create_table_sql().contains("gender TEXT,"));
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            KPI_ADMISSIONS_BY_DX_SCHEMA.insert_sql(),
            "INSERT INTO kpi_admissions_by_dx (as_of_date, diagnosis_code, admissions_count) VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(KPI_AVG_LOS).unwrap().name, "kpi_avg_los");
        assert!(lookup("kpi_unknown").is_err());
        assert_eq!(ALL_TABLES.len(), 7);
    }
}
