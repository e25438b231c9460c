//! 标量与分组指标

use chrono::NaiveDateTime;
use kpi_core::utils::days_between;
use kpi_core::{AdmissionEvent, DiagnosisCount, DiagnosisReference};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// 再入院时间窗口（天，含边界）
pub const READMISSION_WINDOW_DAYS: i64 = 30;

/// 平均住院天数
///
/// 对所有有效住院记录取 `出院 - 入院` 的整天数均值，不按时间窗口过滤。空集合返回 0.0。
pub fn average_length_of_stay(admissions: &[AdmissionEvent]) -> f64 {
    let (total, count) = admissions
        .iter()
        .filter_map(AdmissionEvent::stay_interval)
        .fold((0i64, 0usize), |(total, count), (admit, discharge)| {
            (total + days_between(admit, discharge), count + 1)
        });

    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// 再入院统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadmissionStats {
    /// 分母：同一患者存在后续住院的记录数
    pub eligible: u64,
    /// 分子：后续入院距本次出院 0..=30 天的记录数
    pub readmissions: u64,
}

impl ReadmissionStats {
    /// 再入院率，分母为0时为 0.0
    pub fn rate(&self) -> f64 {
        if self.eligible == 0 {
            0.0
        } else {
            self.readmissions as f64 / self.eligible as f64
        }
    }
}

/// 计算30天再入院统计
///
/// 先按患者分组，再在组内按入院时间稳定排序，逐条与下一次住院比较。
/// 间隔为负（住院重叠）的记录计入分母但不算再入院。
pub fn readmission_stats(admissions: &[AdmissionEvent]) -> ReadmissionStats {
    let mut by_patient: BTreeMap<i64, Vec<(NaiveDateTime, NaiveDateTime)>> = BTreeMap::new();
    for admission in admissions {
        if let Some(interval) = admission.stay_interval() {
            by_patient.entry(admission.patient_id).or_default().push(interval);
        }
    }

    let mut stats = ReadmissionStats::default();
    for stays in by_patient.values_mut() {
        stays.sort_by_key(|(admit, _)| *admit);

        for pair in stays.windows(2) {
            let (_, discharge) = pair[0];
            let (next_admit, _) = pair[1];
            let gap = days_between(discharge, next_admit);

            stats.eligible += 1;
            if (0..=READMISSION_WINDOW_DAYS).contains(&gap) {
                stats.readmissions += 1;
            }
        }
    }

    tracing::debug!(
        "Readmissions: {} of {} eligible discharges across {} patients",
        stats.readmissions,
        stats.eligible,
        by_patient.len()
    );
    stats
}

/// 按主诊断统计住院次数
///
/// 次数降序，次数相同按编码升序，取前 `limit` 个。描述从参考表左连接，未知编码描述为空。
pub fn admissions_by_diagnosis(
    admissions: &[AdmissionEvent],
    reference: &[DiagnosisReference],
    limit: usize,
) -> Vec<DiagnosisCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for admission in admissions.iter().filter(|a| a.stay_interval().is_some()) {
        *counts.entry(admission.primary_diagnosis.as_str()).or_insert(0) += 1;
    }

    let descriptions: HashMap<&str, &str> = reference
        .iter()
        .map(|d| (d.diagnosis_code.as_str(), d.diagnosis_desc.as_str()))
        .collect();

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(code, count)| {
            let diagnosis_desc = descriptions.get(code).map(|desc| desc.to_string());
            if diagnosis_desc.is_none() {
                tracing::warn!("Diagnosis code {} not found in reference table", code);
            }
            DiagnosisCount {
                diagnosis_code: code.to_string(),
                diagnosis_desc,
                admissions_count: count,
            }
        })
        .collect()
}
