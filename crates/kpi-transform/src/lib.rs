//! # KPI转换模块
//!
//! 把原始住院事件转换为按时间窗口聚合的运营指标：
//! - 数据清洗：剔除缺失或倒置时间戳的住院记录
//! - 平均住院天数
//! - 30天再入院率：按患者分组、按入院时间排序后逐条比较
//! - 主诊断住院次数（前10）
//! - 每日在院人数：区间扫描线计算

pub mod aggregator;
pub mod census;
pub mod cleaner;
pub mod metrics;

// 重新导出主要类型
pub use aggregator::{as_of_date, KpiAggregator, DEFAULT_TOP_DIAGNOSES};
pub use census::daily_census;
pub use cleaner::{clean_admissions, clean_admissions_with_report, CleaningReport};
pub use metrics::{
    admissions_by_diagnosis, average_length_of_stay, readmission_stats, ReadmissionStats,
    READMISSION_WINDOW_DAYS,
};

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{NaiveDate, NaiveDateTime};
    use kpi_core::AdmissionEvent;

    pub fn at(date: &str) -> NaiveDateTime {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
            return dt;
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    pub fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    pub fn stay(id: i64, patient_id: i64, admit: &str, discharge: &str, dx: &str) -> AdmissionEvent {
        AdmissionEvent {
            admission_id: id,
            patient_id,
            admit_time: Some(at(admit)),
            discharge_time: Some(at(discharge)),
            primary_diagnosis: dx.to_string(),
            hospital_id: 1,
            room_id: "W1-B1".to_string(),
        }
    }
}
