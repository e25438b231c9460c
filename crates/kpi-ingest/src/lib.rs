//! # KPI数据接入模块
//!
//! 读写三张平面源表：`patients.csv`、`diagnoses.csv`、`admissions.csv`。
//! 空的时间戳单元格读作空值，交给清洗步骤剔除；格式错误的单元格直接报输入错误。

pub mod reader;
pub mod records;
pub mod writer;

pub use reader::{read_admissions, read_diagnoses, read_patients, read_source_tables};
pub use writer::{write_admissions, write_diagnoses, write_patients, write_source_tables};

use kpi_core::{AdmissionEvent, DiagnosisReference, Patient};

pub const PATIENTS_FILE: &str = "patients.csv";
pub const DIAGNOSES_FILE: &str = "diagnoses.csv";
pub const ADMISSIONS_FILE: &str = "admissions.csv";

/// 三张源表的内存表示
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub patients: Vec<Patient>,
    pub diagnoses: Vec<DiagnosisReference>,
    pub admissions: Vec<AdmissionEvent>,
}
