//! 源表读取

use crate::records::{AdmissionRow, DiagnosisRow, PatientRow};
use crate::{SourceTables, ADMISSIONS_FILE, DIAGNOSES_FILE, PATIENTS_FILE};
use kpi_core::{AdmissionEvent, DiagnosisReference, KpiError, Patient, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// 从目录读取三张源表
pub fn read_source_tables(data_dir: &Path) -> Result<SourceTables> {
    if !data_dir.is_dir() {
        return Err(KpiError::Input(format!(
            "data directory not found: {}",
            data_dir.display()
        )));
    }

    let tables = SourceTables {
        patients: read_patients(&data_dir.join(PATIENTS_FILE))?,
        diagnoses: read_diagnoses(&data_dir.join(DIAGNOSES_FILE))?,
        admissions: read_admissions(&data_dir.join(ADMISSIONS_FILE))?,
    };

    tracing::info!(
        "Extracted {} patients, {} diagnoses, {} admissions from {}",
        tables.patients.len(),
        tables.diagnoses.len(),
        tables.admissions.len(),
        data_dir.display()
    );
    Ok(tables)
}

pub fn read_patients(path: &Path) -> Result<Vec<Patient>> {
    read_rows(path, |row: PatientRow| Patient::try_from(row))
}

pub fn read_diagnoses(path: &Path) -> Result<Vec<DiagnosisReference>> {
    read_rows(path, |row: DiagnosisRow| Ok(DiagnosisReference::from(row)))
}

pub fn read_admissions(path: &Path) -> Result<Vec<AdmissionEvent>> {
    read_rows(path, |row: AdmissionRow| AdmissionEvent::try_from(row))
}

/// 逐行反序列化并转换，错误带上文件名和行号
fn read_rows<R, T, F>(path: &Path, convert: F) -> Result<Vec<T>>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T>,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| KpiError::Input(format!("{}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<R>().enumerate() {
        // 表头占第1行
        let line = index + 2;
        let row = row.map_err(|e| KpiError::Input(format!("{}:{}: {}", path.display(), line, e)))?;
        let record = convert(row).map_err(|e| match e {
            KpiError::Input(message) => {
                KpiError::Input(format!("{}:{}: {}", path.display(), line, message))
            }
            other => other,
        })?;
        records.push(record);
    }

    tracing::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}
