//! 每日在院人数（代理指标）
//!
//! 某日 `d` 的在院人数为满足 `入院日 <= d <= 出院日` 的住院记录数。
//! 用扫描线计算：入院日 +1，出院次日 -1，按日前缀求和。

use chrono::NaiveDate;
use kpi_core::utils::date_span;
use kpi_core::{AdmissionEvent, CensusDay};

/// 计算每日在院人数
///
/// 覆盖从最早入院日到最晚出院日（含）的每一天；没有有效住院记录时返回空表。
pub fn daily_census(admissions: &[AdmissionEvent]) -> Vec<CensusDay> {
    let intervals: Vec<(NaiveDate, NaiveDate)> = admissions
        .iter()
        .filter_map(AdmissionEvent::stay_interval)
        .map(|(admit, discharge)| (admit.date(), discharge.date()))
        .collect();

    let (Some(first), Some(last)) = (
        intervals.iter().map(|(admit, _)| *admit).min(),
        intervals.iter().map(|(_, discharge)| *discharge).max(),
    ) else {
        return Vec::new();
    };

    let offset = |day: NaiveDate| (day - first).num_days() as usize;
    let days = offset(last) + 1;

    // 多出一格存放最晚出院日次日的 -1
    let mut deltas = vec![0i64; days + 1];
    for (admit, discharge) in &intervals {
        deltas[offset(*admit)] += 1;
        deltas[offset(*discharge) + 1] -= 1;
    }

    let mut in_house = 0i64;
    let census: Vec<CensusDay> = date_span(first, last)
        .zip(deltas)
        .map(|(census_date, delta)| {
            in_house += delta;
            CensusDay {
                census_date,
                inpatient_count: in_house.max(0) as u64,
            }
        })
        .collect();

    tracing::debug!("Census covers {} days from {} to {}", census.len(), first, last);
    census
}
