//! 合成住院事件生成器

use crate::diagnoses::{diagnosis_reference, DIAGNOSES};
use chrono::{Duration, NaiveDate};
use kpi_core::{AdmissionEvent, DiagnosisReference, Gender, KpiError, Patient, Result};
use rand::prelude::*;
use rand_distr::Gamma;
use serde::{Deserialize, Serialize};

/// 住院天数Gamma分布的形状参数
pub const LOS_GAMMA_SHAPE: f64 = 2.0;
/// 住院天数Gamma分布的尺度参数
pub const LOS_GAMMA_SCALE: f64 = 2.0;
/// 医院编号上限（含）
pub const HOSPITAL_COUNT: i64 = 5;

/// 生成器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// 患者数量
    pub patient_count: usize,
    /// 住院记录数量
    pub admission_count: usize,
    /// 入院日期下界（含）
    pub start: NaiveDate,
    /// 入院日期上界（不含）
    pub end: NaiveDate,
    /// 随机种子，为空时使用系统熵
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            patient_count: 500,
            admission_count: 2000,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap_or(NaiveDate::MAX),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// 设置患者数量
    pub fn with_patients(mut self, count: usize) -> Self {
        self.patient_count = count;
        self
    }

    /// 设置住院记录数量
    pub fn with_admissions(mut self, count: usize) -> Self {
        self.admission_count = count;
        self
    }

    /// 设置入院日期范围 `[start, end)`
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// 设置随机种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.patient_count == 0 {
            return Err(KpiError::Validation("patient_count must be positive".to_string()));
        }
        if self.admission_count == 0 {
            return Err(KpiError::Validation("admission_count must be positive".to_string()));
        }
        if self.start >= self.end {
            return Err(KpiError::Validation(format!(
                "admission date range is empty: [{}, {})",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// 一次生成的全部记录
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub patients: Vec<Patient>,
    pub diagnoses: Vec<DiagnosisReference>,
    pub admissions: Vec<AdmissionEvent>,
}

/// 合成事件生成器
pub struct SyntheticEventGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    length_of_stay: Gamma<f64>,
}

impl SyntheticEventGenerator {
    /// 创建生成器
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let length_of_stay = Gamma::new(LOS_GAMMA_SHAPE, LOS_GAMMA_SCALE)
            .map_err(|e| KpiError::Validation(format!("invalid LOS distribution: {}", e)))?;

        Ok(Self {
            config,
            rng,
            length_of_stay,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// 生成完整数据集
    pub fn generate(&mut self) -> SyntheticDataset {
        let patients = self.generate_patients();
        let admissions = self.generate_admissions();

        tracing::info!(
            "Generated {} patients, {} diagnoses, {} admissions",
            patients.len(),
            DIAGNOSES.len(),
            admissions.len()
        );

        SyntheticDataset {
            patients,
            diagnoses: diagnosis_reference(),
            admissions,
        }
    }

    /// 生成患者维度表
    ///
    /// 性别均匀随机，出生日期在 1940-01-01 到 2010-12-31（含）之间均匀分布。
    pub fn generate_patients(&mut self) -> Vec<Patient> {
        let birth_start = NaiveDate::from_ymd_opt(1940, 1, 1).unwrap_or(NaiveDate::MIN);
        let birth_end = NaiveDate::from_ymd_opt(2010, 12, 31).unwrap_or(NaiveDate::MAX);
        let span = (birth_end - birth_start).num_days();

        (1..=self.config.patient_count as i64)
            .map(|patient_id| {
                let gender = if self.rng.gen_bool(0.5) {
                    Gender::Male
                } else {
                    Gender::Female
                };
                let birth_date = birth_start + Duration::days(self.rng.gen_range(0..=span));

                Patient {
                    patient_id,
                    gender: Some(gender),
                    birth_date,
                }
            })
            .collect()
    }

    /// 生成住院事实表
    pub fn generate_admissions(&mut self) -> Vec<AdmissionEvent> {
        let day_span = (self.config.end - self.config.start).num_days();
        let patient_count = self.config.patient_count as i64;

        (1..=self.config.admission_count as i64)
            .map(|admission_id| {
                let patient_id = self.rng.gen_range(1..=patient_count);
                let hospital_id = self.rng.gen_range(1..=HOSPITAL_COUNT);
                let room_id = format!(
                    "W{}-B{}",
                    self.rng.gen_range(1..=20),
                    self.rng.gen_range(1..=4)
                );

                let admit_day = self.config.start + Duration::days(self.rng.gen_range(0..day_span));
                let admit_time = admit_day.and_hms_opt(0, 0, 0);
                let los_days = self.sample_length_of_stay();
                let discharge_time = admit_time.map(|admit| admit + Duration::days(los_days));

                let (code, _) = DIAGNOSES[self.rng.gen_range(0..DIAGNOSES.len())];

                AdmissionEvent {
                    admission_id,
                    patient_id,
                    admit_time,
                    discharge_time,
                    primary_diagnosis: code.to_string(),
                    hospital_id,
                    room_id,
                }
            })
            .collect()
    }

    /// 采样住院天数
    ///
    /// Gamma(2, 2) 右偏分布，向下取整且至少为1天。
    pub fn sample_length_of_stay(&mut self) -> i64 {
        let raw: f64 = self.length_of_stay.sample(&mut self.rng);
        (raw.floor() as i64).max(1)
    }
}
