//! 核心数据模型定义

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 患者基本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    pub gender: Option<Gender>, // 未指定时为空
    pub birth_date: NaiveDate,
}

/// 性别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// 存储编码
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    /// 从存储编码解析
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// 诊断参考（ICD风格编码）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisReference {
    pub diagnosis_code: String,
    pub diagnosis_desc: String,
}

impl DiagnosisReference {
    pub fn new(code: &str, desc: &str) -> Self {
        Self {
            diagnosis_code: code.to_string(),
            diagnosis_desc: desc.to_string(),
        }
    }
}

/// 住院事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionEvent {
    pub admission_id: i64,
    pub patient_id: i64,
    pub admit_time: Option<NaiveDateTime>,
    pub discharge_time: Option<NaiveDateTime>,
    pub primary_diagnosis: String,
    pub hospital_id: i64,
    pub room_id: String, // 病区-床位，例如 W3-B2
}

impl AdmissionEvent {
    /// 有效的住院区间
    ///
    /// 两个时间戳都存在且出院不早于入院时返回 `(入院, 出院)`，否则返回 `None`。
    pub fn stay_interval(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.admit_time, self.discharge_time) {
            (Some(admit), Some(discharge)) if discharge >= admit => Some((admit, discharge)),
            _ => None,
        }
    }
}

/// 按主诊断统计的住院次数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisCount {
    pub diagnosis_code: String,
    pub diagnosis_desc: Option<String>, // 参考表中不存在的编码保留为空
    pub admissions_count: u64,
}

/// 每日在院人数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusDay {
    pub census_date: NaiveDate,
    pub inpatient_count: u64,
}

/// 一次运行产生的完整指标快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    /// 快照日期：清洗后数据中最晚的出院日期
    pub as_of_date: NaiveDate,
    pub avg_los_days: f64,
    pub readmission_rate: f64,
    /// 前10个主诊断，按次数降序
    pub admissions_by_dx: Vec<DiagnosisCount>,
    /// 从最早入院日到最晚出院日（含）每天一行
    pub daily_census: Vec<CensusDay>,
}
