//! CSV行类型与领域模型之间的转换

use chrono::{NaiveDate, NaiveDateTime};
use kpi_core::{AdmissionEvent, DiagnosisReference, Gender, KpiError, Patient, Result};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// patients.csv 行
#[derive(Debug, Serialize, Deserialize)]
pub struct PatientRow {
    pub patient_id: i64,
    pub gender: Option<String>,
    pub birth_date: String,
}

/// diagnoses.csv 行
#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnosisRow {
    pub diagnosis_code: String,
    pub diagnosis_desc: String,
}

/// admissions.csv 行
#[derive(Debug, Serialize, Deserialize)]
pub struct AdmissionRow {
    pub admission_id: i64,
    pub patient_id: i64,
    pub admit_time: Option<String>,
    pub discharge_time: Option<String>,
    pub primary_diagnosis: String,
    pub hospital_id: i64,
    pub room_id: String,
}

/// 解析日期
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| parse_timestamp(value).map(|ts| ts.date()))
        .map_err(|_| KpiError::Input(format!("invalid date '{}'", value)))
}

/// 解析时间戳，接受 `YYYY-MM-DD HH:MM:SS[.fff]`、ISO `T` 分隔以及纯日期
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| KpiError::Input(format!("invalid timestamp '{}'", value)))
}

fn parse_optional_timestamp(value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value).map(Some),
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = KpiError;

    fn try_from(row: PatientRow) -> Result<Self> {
        let gender = match row.gender.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(
                Gender::from_code(code)
                    .ok_or_else(|| KpiError::Input(format!("unknown gender '{}'", code)))?,
            ),
        };

        Ok(Patient {
            patient_id: row.patient_id,
            gender,
            birth_date: parse_date(&row.birth_date)?,
        })
    }
}

impl From<&Patient> for PatientRow {
    fn from(patient: &Patient) -> Self {
        PatientRow {
            patient_id: patient.patient_id,
            gender: patient.gender.map(|g| g.code().to_string()),
            birth_date: patient.birth_date.format(DATE_FORMAT).to_string(),
        }
    }
}

impl From<DiagnosisRow> for DiagnosisReference {
    fn from(row: DiagnosisRow) -> Self {
        DiagnosisReference {
            diagnosis_code: row.diagnosis_code,
            diagnosis_desc: row.diagnosis_desc,
        }
    }
}

impl From<&DiagnosisReference> for DiagnosisRow {
    fn from(diagnosis: &DiagnosisReference) -> Self {
        DiagnosisRow {
            diagnosis_code: diagnosis.diagnosis_code.clone(),
            diagnosis_desc: diagnosis.diagnosis_desc.clone(),
        }
    }
}

impl TryFrom<AdmissionRow> for AdmissionEvent {
    type Error = KpiError;

    fn try_from(row: AdmissionRow) -> Result<Self> {
        Ok(AdmissionEvent {
            admission_id: row.admission_id,
            patient_id: row.patient_id,
            admit_time: parse_optional_timestamp(row.admit_time.as_deref())?,
            discharge_time: parse_optional_timestamp(row.discharge_time.as_deref())?,
            primary_diagnosis: row.primary_diagnosis,
            hospital_id: row.hospital_id,
            room_id: row.room_id,
        })
    }
}

impl From<&AdmissionEvent> for AdmissionRow {
    fn from(admission: &AdmissionEvent) -> Self {
        let format = |ts: NaiveDateTime| ts.format(TIMESTAMP_FORMAT).to_string();
        AdmissionRow {
            admission_id: admission.admission_id,
            patient_id: admission.patient_id,
            admit_time: admission.admit_time.map(format),
            discharge_time: admission.discharge_time.map(format),
            primary_diagnosis: admission.primary_diagnosis.clone(),
            hospital_id: admission.hospital_id,
            room_id: admission.room_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-05 00:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-05T00:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-05").unwrap(), expected);

        let fractional = expected + chrono::Duration::milliseconds(8 * 3_600_000 + 500);
        assert_eq!(parse_timestamp("2024-01-05 08:00:00.5").unwrap(), fractional);
        assert_eq!(parse_timestamp("2024-01-05T08:00:00.500").unwrap(), fractional);
        assert!(matches!(parse_timestamp("05/01/2024"), Err(KpiError::Input(_))));
    }

    #[test]
    fn test_blank_timestamp_is_null() {
        let row = AdmissionRow {
            admission_id: 1,
            patient_id: 1,
            admit_time: Some("  ".to_string()),
            discharge_time: None,
            primary_diagnosis: "I10".to_string(),
            hospital_id: 1,
            room_id: "W1-B1".to_string(),
        };
        let event = AdmissionEvent::try_from(row).unwrap();
        assert_eq!(event.admit_time, None);
        assert_eq!(event.discharge_time, None);
    }

    #[test]
    fn test_patient_gender() {
        let row = |gender: Option<&str>| PatientRow {
            patient_id: 1,
            gender: gender.map(str::to_string),
            birth_date: "1980-02-29".to_string(),
        };
        assert_eq!(Patient::try_from(row(Some("F"))).unwrap().gender, Some(Gender::Female));
        assert_eq!(Patient::try_from(row(None)).unwrap().gender, None);
        assert!(Patient::try_from(row(Some("Q"))).is_err());
    }
}
