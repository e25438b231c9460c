//! 住院记录清洗
//!
//! 只保留两个时间戳都存在且出院不早于入院的记录。无效记录被静默剔除，从不修正。

use kpi_core::AdmissionEvent;
use serde::Serialize;

/// 清洗统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    /// 输入记录数
    pub input: usize,
    /// 保留记录数
    pub kept: usize,
    /// 缺少入院或出院时间
    pub missing_timestamp: usize,
    /// 出院早于入院
    pub inverted_interval: usize,
}

impl CleaningReport {
    pub fn dropped(&self) -> usize {
        self.missing_timestamp + self.inverted_interval
    }
}

/// 清洗住院记录
pub fn clean_admissions(admissions: impl IntoIterator<Item = AdmissionEvent>) -> Vec<AdmissionEvent> {
    clean_admissions_with_report(admissions).0
}

/// 清洗住院记录并返回剔除统计
pub fn clean_admissions_with_report(
    admissions: impl IntoIterator<Item = AdmissionEvent>,
) -> (Vec<AdmissionEvent>, CleaningReport) {
    let mut report = CleaningReport::default();
    let mut kept = Vec::new();

    for admission in admissions {
        report.input += 1;
        match (admission.admit_time, admission.discharge_time) {
            (Some(admit), Some(discharge)) if discharge >= admit => kept.push(admission),
            (Some(_), Some(_)) => report.inverted_interval += 1,
            _ => report.missing_timestamp += 1,
        }
    }
    report.kept = kept.len();

    if report.dropped() > 0 {
        tracing::warn!(
            "Dropped {} invalid admissions ({} missing timestamps, {} inverted intervals)",
            report.dropped(),
            report.missing_timestamp,
            report.inverted_interval
        );
    }
    tracing::debug!("Cleaning kept {} of {} admissions", report.kept, report.input);

    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, stay};

    fn raw() -> Vec<AdmissionEvent> {
        let mut missing_admit = stay(3, 1, "2024-01-01", "2024-01-02", "I10");
        missing_admit.admit_time = None;
        let mut missing_discharge = stay(4, 2, "2024-01-01", "2024-01-02", "I10");
        missing_discharge.discharge_time = None;

        vec![
            stay(1, 1, "2024-01-01", "2024-01-05", "I10"),
            stay(2, 1, "2024-01-10", "2024-01-03", "E11"),
            missing_admit,
            missing_discharge,
            stay(5, 2, "2024-02-01", "2024-02-01", "J18"),
        ]
    }

    #[test]
    fn test_drops_invalid_rows() {
        let (cleaned, report) = clean_admissions_with_report(raw());
        let ids: Vec<_> = cleaned.iter().map(|a| a.admission_id).collect();
        assert_eq!(ids, vec![1, 5]);

        assert_eq!(report.input, 5);
        assert_eq!(report.kept, 2);
        assert_eq!(report.missing_timestamp, 2);
        assert_eq!(report.inverted_interval, 1);
        assert_eq!(report.dropped(), 3);
    }

    #[test]
    fn test_same_instant_kept() {
        let mut event = stay(1, 1, "2024-01-01", "2024-01-01", "I10");
        event.discharge_time = Some(at("2024-01-01"));
        assert_eq!(clean_admissions(vec![event]).len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let once = clean_admissions(raw());
        let twice = clean_admissions(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        let (cleaned, report) = clean_admissions_with_report(Vec::new());
        assert!(cleaned.is_empty());
        assert_eq!(report, CleaningReport::default());
    }
}
