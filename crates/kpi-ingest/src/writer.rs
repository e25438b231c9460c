//! 源表写出

use crate::records::{AdmissionRow, DiagnosisRow, PatientRow};
use crate::{SourceTables, ADMISSIONS_FILE, DIAGNOSES_FILE, PATIENTS_FILE};
use kpi_core::{AdmissionEvent, DiagnosisReference, KpiError, Patient, Result};
use serde::Serialize;
use std::path::Path;

/// 把三张源表写入目录（不存在则创建）
pub fn write_source_tables(data_dir: &Path, tables: &SourceTables) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;

    write_patients(&data_dir.join(PATIENTS_FILE), &tables.patients)?;
    write_diagnoses(&data_dir.join(DIAGNOSES_FILE), &tables.diagnoses)?;
    write_admissions(&data_dir.join(ADMISSIONS_FILE), &tables.admissions)?;

    tracing::info!("Wrote source tables to {}", data_dir.display());
    Ok(())
}

pub fn write_patients(path: &Path, patients: &[Patient]) -> Result<()> {
    write_rows(path, patients.iter().map(PatientRow::from))
}

pub fn write_diagnoses(path: &Path, diagnoses: &[DiagnosisReference]) -> Result<()> {
    write_rows(path, diagnoses.iter().map(DiagnosisRow::from))
}

pub fn write_admissions(path: &Path, admissions: &[AdmissionEvent]) -> Result<()> {
    write_rows(path, admissions.iter().map(AdmissionRow::from))
}

fn write_rows<R: Serialize>(path: &Path, rows: impl Iterator<Item = R>) -> Result<()> {
    let to_error = |e: csv::Error| KpiError::Io(std::io::Error::other(format!("{}: {}", path.display(), e)));

    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    for row in rows {
        writer.serialize(row).map_err(to_error)?;
    }
    writer.flush()?;
    Ok(())
}
