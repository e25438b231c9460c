//! 仓库发布器
//!
//! 按固定顺序逐表替换：先维度/事实表，后四张指标表。第一张失败的表中止发布并返回
//! [`KpiError::Publish`]；已提交的表保持提交，尚未处理的表保留上一次快照。
//! 表数据校验失败时不写入任何表。

use crate::schema::{
    ADMISSIONS_SCHEMA, ALL_TABLES, DIAGNOSES_SCHEMA, KPI_ADMISSIONS_BY_DX_SCHEMA, KPI_AVG_LOS_SCHEMA,
    KPI_DAILY_CENSUS_SCHEMA, KPI_READMISSION_30D_SCHEMA, PATIENTS_SCHEMA,
};
use crate::sink::TableSink;
use crate::table::{CellValue, TableData};
use kpi_core::{AdmissionEvent, DiagnosisReference, KpiError, KpiSnapshot, Patient, Result};
use serde::Serialize;

/// 随快照一起发布的清洗后维度/事实表
#[derive(Debug, Clone, Copy)]
pub struct DimensionTables<'a> {
    pub patients: &'a [Patient],
    pub diagnoses: &'a [DiagnosisReference],
    pub admissions: &'a [AdmissionEvent],
}

/// 发布结果：每张表写入的行数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishSummary {
    pub tables: Vec<(String, usize)>,
}

impl PublishSummary {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|(_, rows)| rows).sum()
    }

    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, rows)| *rows)
    }
}

/// 仓库发布器
pub struct WarehousePublisher<'a> {
    sink: &'a dyn TableSink,
}

impl<'a> WarehousePublisher<'a> {
    pub fn new(sink: &'a dyn TableSink) -> Self {
        Self { sink }
    }

    /// 发布快照
    pub async fn publish(
        &self,
        snapshot: &KpiSnapshot,
        dimensions: &DimensionTables<'_>,
    ) -> Result<PublishSummary> {
        // 与 ALL_TABLES 顺序一致
        let built = vec![
            patients_table(dimensions.patients),
            diagnoses_table(dimensions.diagnoses),
            admissions_table(dimensions.admissions),
            readmission_table(snapshot),
            avg_los_table(snapshot),
            admissions_by_dx_table(snapshot),
            daily_census_table(snapshot),
        ];

        // 写入任何表之前先校验全部表
        let tables = ALL_TABLES
            .iter()
            .map(|s| s.name)
            .zip(built)
            .map(|(schema, table)| table.map_err(|e| KpiError::publish(schema, e)))
            .collect::<Result<Vec<_>>>()?;

        let mut summary = PublishSummary::default();
        for table in tables {
            let schema = table.name();
            let rows = table.len();

            self.sink
                .replace_table(table)
                .await
                .map_err(|e| KpiError::publish(schema, e))?;

            tracing::info!("Published {} ({} rows) to {} warehouse", schema, rows, self.sink.name());
            summary.tables.push((schema.to_string(), rows));
        }

        tracing::info!(
            "Snapshot as of {} published: {} tables, {} rows",
            snapshot.as_of_date,
            summary.tables.len(),
            summary.total_rows()
        );
        Ok(summary)
    }
}

pub fn patients_table(patients: &[Patient]) -> Result<TableData> {
    let mut table = TableData::new(&PATIENTS_SCHEMA);
    for patient in patients {
        table.push_row(vec![
            patient.patient_id.into(),
            patient.gender.map(|g| g.code()).into(),
            patient.birth_date.into(),
        ])?;
    }
    Ok(table)
}

pub fn diagnoses_table(diagnoses: &[DiagnosisReference]) -> Result<TableData> {
    let mut table = TableData::new(&DIAGNOSES_SCHEMA);
    for diagnosis in diagnoses {
        table.push_row(vec![
            diagnosis.diagnosis_code.as_str().into(),
            diagnosis.diagnosis_desc.as_str().into(),
        ])?;
    }
    Ok(table)
}

/// 住院事实表；时间戳为空的记录会被拒绝，调用方应先清洗
pub fn admissions_table(admissions: &[AdmissionEvent]) -> Result<TableData> {
    let mut table = TableData::new(&ADMISSIONS_SCHEMA);
    for admission in admissions {
        table.push_row(vec![
            admission.admission_id.into(),
            admission.patient_id.into(),
            admission.admit_time.into(),
            admission.discharge_time.into(),
            admission.primary_diagnosis.as_str().into(),
            admission.hospital_id.into(),
            admission.room_id.as_str().into(),
        ])?;
    }
    Ok(table)
}

pub fn readmission_table(snapshot: &KpiSnapshot) -> Result<TableData> {
    let mut table = TableData::new(&KPI_READMISSION_30D_SCHEMA);
    table.push_row(vec![snapshot.as_of_date.into(), snapshot.readmission_rate.into()])?;
    Ok(table)
}

pub fn avg_los_table(snapshot: &KpiSnapshot) -> Result<TableData> {
    let mut table = TableData::new(&KPI_AVG_LOS_SCHEMA);
    table.push_row(vec![snapshot.as_of_date.into(), snapshot.avg_los_days.into()])?;
    Ok(table)
}

pub fn admissions_by_dx_table(snapshot: &KpiSnapshot) -> Result<TableData> {
    let mut table = TableData::new(&KPI_ADMISSIONS_BY_DX_SCHEMA);
    for dx in &snapshot.admissions_by_dx {
        table.push_row(vec![
            snapshot.as_of_date.into(),
            dx.diagnosis_code.as_str().into(),
            dx.admissions_count.into(),
        ])?;
    }
    Ok(table)
}

pub fn daily_census_table(snapshot: &KpiSnapshot) -> Result<TableData> {
    let mut table = TableData::new(&KPI_DAILY_CENSUS_SCHEMA);
    for day in &snapshot.daily_census {
        table.push_row(vec![
            CellValue::Date(day.census_date),
            day.inpatient_count.into(),
        ])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWarehouse;
    use crate::schema::{KPI_AVG_LOS, KPI_DAILY_CENSUS, KPI_READMISSION_30D};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use kpi_core::{CensusDay, DiagnosisCount, Gender};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn snapshot(as_of: u32, census_days: u32) -> KpiSnapshot {
        KpiSnapshot {
            as_of_date: date(as_of),
            avg_los_days: 4.5,
            readmission_rate: 1.0,
            admissions_by_dx: vec![DiagnosisCount {
                diagnosis_code: "I10".to_string(),
                diagnosis_desc: Some("Essential (primary) hypertension".to_string()),
                admissions_count: 2,
            }],
            daily_census: (1..=census_days)
                .map(|d| CensusDay {
                    census_date: date(d),
                    inpatient_count: 1,
                })
                .collect(),
        }
    }

    fn dimensions() -> (Vec<Patient>, Vec<DiagnosisReference>, Vec<AdmissionEvent>) {
        let patients = vec![Patient {
            patient_id: 1,
            gender: Some(Gender::Female),
            birth_date: NaiveDate::from_ymd_opt(1970, 3, 3).unwrap(),
        }];
        let diagnoses = vec![DiagnosisReference::new("I10", "Essential (primary) hypertension")];
        let admissions = vec![AdmissionEvent {
            admission_id: 1,
            patient_id: 1,
            admit_time: date(1).and_hms_opt(0, 0, 0),
            discharge_time: date(5).and_hms_opt(0, 0, 0),
            primary_diagnosis: "I10".to_string(),
            hospital_id: 1,
            room_id: "W1-B1".to_string(),
        }];
        (patients, diagnoses, admissions)
    }

    /// 写到指定表时失败的接收端
    struct FailingSink {
        inner: MemoryWarehouse,
        fail_on: &'static str,
    }

    #[async_trait]
    impl TableSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn ensure_schema(&self) -> Result<()> {
            Ok(())
        }

        async fn replace_table(&self, table: TableData) -> Result<()> {
            if table.name() == self.fail_on {
                return Err(KpiError::Database("disk full".to_string()));
            }
            self.inner.replace_table(table).await
        }

        async fn read_table(&self, name: &str) -> Result<TableData> {
            self.inner.read_table(name).await
        }
    }

    #[tokio::test]
    async fn test_publish_then_read_back() {
        let (patients, diagnoses, admissions) = dimensions();
        let dims = DimensionTables {
            patients: &patients,
            diagnoses: &diagnoses,
            admissions: &admissions,
        };
        let warehouse = MemoryWarehouse::new();
        let publisher = WarehousePublisher::new(&warehouse);

        publisher.publish(&snapshot(5, 5), &dims).await.unwrap();
        let summary = publisher.publish(&snapshot(3, 3), &dims).await.unwrap();

        assert_eq!(summary.tables.len(), ALL_TABLES.len());
        assert_eq!(summary.rows_for(KPI_DAILY_CENSUS), Some(3));

        // 没有上一次快照的残留行
        let census = warehouse.read_table(KPI_DAILY_CENSUS).await.unwrap();
        assert_eq!(census, daily_census_table(&snapshot(3, 3)).unwrap());

        let readmission = warehouse.read_table(KPI_READMISSION_30D).await.unwrap();
        assert_eq!(readmission.len(), 1);
        assert_eq!(readmission.rows()[0], vec![CellValue::Date(date(3)), CellValue::Float(1.0)]);
    }

    #[tokio::test]
    async fn test_failure_names_table_and_keeps_untouched_tables() {
        let (patients, diagnoses, admissions) = dimensions();
        let dims = DimensionTables {
            patients: &patients,
            diagnoses: &diagnoses,
            admissions: &admissions,
        };

        let sink = FailingSink {
            inner: MemoryWarehouse::new(),
            fail_on: "none",
        };
        WarehousePublisher::new(&sink)
            .publish(&snapshot(5, 5), &dims)
            .await
            .unwrap();

        let sink = FailingSink {
            inner: sink.inner,
            fail_on: KPI_AVG_LOS,
        };
        let err = WarehousePublisher::new(&sink)
            .publish(&snapshot(3, 3), &dims)
            .await
            .unwrap_err();
        assert_eq!(err.failed_table(), Some(KPI_AVG_LOS));

        // 失败前的表已提交新快照
        let readmission = sink.inner.read_table(KPI_READMISSION_30D).await.unwrap();
        assert_eq!(readmission.rows()[0][0], CellValue::Date(date(3)));

        // 失败的表和之后的表保留旧快照
        let los = sink.inner.read_table(KPI_AVG_LOS).await.unwrap();
        assert_eq!(los.rows()[0][0], CellValue::Date(date(5)));
        let census = sink.inner.read_table(KPI_DAILY_CENSUS).await.unwrap();
        assert_eq!(census.len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_table_aborts_before_any_write() {
        let (patients, diagnoses, mut admissions) = dimensions();
        admissions[0].admit_time = None;
        let dims = DimensionTables {
            patients: &patients,
            diagnoses: &diagnoses,
            admissions: &admissions,
        };
        let warehouse = MemoryWarehouse::new();

        let err = WarehousePublisher::new(&warehouse)
            .publish(&snapshot(5, 5), &dims)
            .await
            .unwrap_err();
        assert_eq!(err.failed_table(), Some("admissions"));
        assert!(warehouse.table_names().await.is_empty());
    }

    #[test]
    fn test_uncleaned_admission_rejected() {
        let (_, _, mut admissions) = dimensions();
        admissions[0].discharge_time = None;
        assert!(matches!(admissions_table(&admissions), Err(KpiError::Validation(_))));
    }

    #[test]
    fn test_unknown_gender_stored_as_null() {
        let patients = vec![Patient {
            patient_id: 7,
            gender: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }];
        let table = patients_table(&patients).unwrap();
        assert_eq!(table.rows()[0][1], CellValue::Null);
    }
}
