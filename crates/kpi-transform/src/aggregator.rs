//! KPI聚合器
//!
//! 四个指标都基于同一份清洗后的住院记录独立计算，只共享快照日期。

use crate::census::daily_census;
use crate::metrics::{admissions_by_diagnosis, average_length_of_stay, readmission_stats};
use chrono::NaiveDate;
use kpi_core::{AdmissionEvent, DiagnosisReference, KpiError, KpiSnapshot, Result};

/// 默认保留的主诊断数量
pub const DEFAULT_TOP_DIAGNOSES: usize = 10;

/// 快照日期：最晚的出院日期
///
/// 没有有效住院记录时返回 [`KpiError::EmptyDataset`]。
pub fn as_of_date(admissions: &[AdmissionEvent]) -> Result<NaiveDate> {
    admissions
        .iter()
        .filter_map(AdmissionEvent::stay_interval)
        .map(|(_, discharge)| discharge.date())
        .max()
        .ok_or(KpiError::EmptyDataset)
}

/// KPI聚合器
#[derive(Debug)]
pub struct KpiAggregator<'a> {
    diagnoses: &'a [DiagnosisReference],
    top_diagnoses: usize,
}

impl<'a> KpiAggregator<'a> {
    /// 使用诊断参考表创建聚合器
    pub fn new(diagnoses: &'a [DiagnosisReference]) -> Self {
        Self {
            diagnoses,
            top_diagnoses: DEFAULT_TOP_DIAGNOSES,
        }
    }

    /// 设置主诊断表保留的行数
    pub fn with_top_diagnoses(mut self, limit: usize) -> Self {
        self.top_diagnoses = limit;
        self
    }

    /// 计算指标快照
    ///
    /// 清洗后数据为空时直接失败，不输出零值指标。
    pub fn compute(&self, admissions: &[AdmissionEvent]) -> Result<KpiSnapshot> {
        let as_of_date = as_of_date(admissions)?;
        tracing::info!(
            "Aggregating KPIs over {} admissions as of {}",
            admissions.len(),
            as_of_date
        );

        let avg_los_days = average_length_of_stay(admissions);
        let readmission_rate = readmission_stats(admissions).rate();
        let admissions_by_dx = admissions_by_diagnosis(admissions, self.diagnoses, self.top_diagnoses);
        let daily_census = daily_census(admissions);

        tracing::info!(
            "KPI snapshot: avg LOS {:.2} days, readmission rate {:.3}, {} diagnoses, {} census days",
            avg_los_days,
            readmission_rate,
            admissions_by_dx.len(),
            daily_census.len()
        );

        Ok(KpiSnapshot {
            as_of_date,
            avg_los_days,
            readmission_rate,
            admissions_by_dx,
            daily_census,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::clean_admissions;
    use crate::testing::{day, stay};

    #[test]
    fn test_two_admission_scenario() {
        let admissions = vec![
            stay(1, 1, "2024-01-01", "2024-01-05", "I10"),
            stay(2, 1, "2024-01-20", "2024-01-25", "I10"),
        ];
        let reference = vec![DiagnosisReference::new("I10", "Essential (primary) hypertension")];
        let snapshot = KpiAggregator::new(&reference).compute(&admissions).unwrap();

        assert_eq!(snapshot.as_of_date, day("2024-01-25"));
        assert_eq!(snapshot.readmission_rate, 1.0);
        assert_eq!(snapshot.avg_los_days, 4.5);
        assert_eq!(snapshot.admissions_by_dx.len(), 1);
        assert_eq!(snapshot.admissions_by_dx[0].admissions_count, 2);
        assert_eq!(snapshot.daily_census.len(), 25);
        assert_eq!(snapshot.daily_census[0].census_date, day("2024-01-01"));
        assert_eq!(snapshot.daily_census[24].census_date, day("2024-01-25"));
    }

    #[test]
    fn test_empty_dataset_fails() {
        let result = KpiAggregator::new(&[]).compute(&[]);
        assert!(matches!(result, Err(KpiError::EmptyDataset)));
    }

    #[test]
    fn test_all_invalid_rows_fail_after_cleaning() {
        let inverted = stay(1, 1, "2024-01-05", "2024-01-01", "I10");
        let cleaned = clean_admissions(vec![inverted]);
        assert!(matches!(as_of_date(&cleaned), Err(KpiError::EmptyDataset)));
    }

    #[test]
    fn test_top_diagnoses_limit() {
        let admissions: Vec<_> = (0..5)
            .map(|i| stay(i, i, "2024-01-01", "2024-01-02", &format!("D{}", i)))
            .collect();
        let snapshot = KpiAggregator::new(&[])
            .with_top_diagnoses(3)
            .compute(&admissions)
            .unwrap();
        assert_eq!(snapshot.admissions_by_dx.len(), 3);
    }

    #[test]
    fn test_generated_pipeline_invariants() {
        use kpi_synth::{GeneratorConfig, SyntheticEventGenerator};

        let config = GeneratorConfig::default()
            .with_patients(200)
            .with_admissions(1500)
            .with_seed(11);
        let dataset = SyntheticEventGenerator::new(config).unwrap().generate();
        let cleaned = clean_admissions(dataset.admissions);
        let snapshot = KpiAggregator::new(&dataset.diagnoses).compute(&cleaned).unwrap();

        assert!((0.0..=1.0).contains(&snapshot.readmission_rate));
        assert!(snapshot.avg_los_days >= 1.0);
        assert!(snapshot.admissions_by_dx.len() <= DEFAULT_TOP_DIAGNOSES);
        assert!(snapshot.admissions_by_dx.iter().all(|d| d.diagnosis_desc.is_some()));

        let dx_total: u64 = snapshot.admissions_by_dx.iter().map(|d| d.admissions_count).sum();
        assert_eq!(dx_total, cleaned.len() as u64);

        let census_total: u64 = snapshot.daily_census.iter().map(|c| c.inpatient_count).sum();
        let expected: i64 = cleaned
            .iter()
            .filter_map(AdmissionEvent::stay_interval)
            .map(|(a, d)| (d.date() - a.date()).num_days() + 1)
            .sum();
        assert_eq!(census_total, expected as u64);
        assert_eq!(snapshot.daily_census.last().map(|c| c.census_date), Some(snapshot.as_of_date));
    }
}
