//! 日期与天数计算工具

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 时长换算为整天数（向下取整）
///
/// 负时长同样向下取整：提前1小时或半秒都是 -1 天而不是 0 天。
pub fn whole_days(duration: Duration) -> i64 {
    let days = duration.num_days();
    if duration < Duration::days(days) {
        days - 1
    } else {
        days
    }
}

/// 两个时间点之间的整天数
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    whole_days(to - from)
}

/// 闭区间 `[start, end]` 内的所有日历日
pub fn date_span(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_whole_days_truncates_positive() {
        assert_eq!(days_between(ts("2024-01-01 00:00:00"), ts("2024-01-05 00:00:00")), 4);
        assert_eq!(days_between(ts("2024-01-01 08:00:00"), ts("2024-01-02 07:59:59")), 0);
        assert_eq!(days_between(ts("2024-01-01 08:00:00"), ts("2024-01-01 08:00:00")), 0);
    }

    #[test]
    fn test_whole_days_floors_negative() {
        assert_eq!(days_between(ts("2024-01-02 00:00:00"), ts("2024-01-01 23:00:00")), -1);
        assert_eq!(days_between(ts("2024-01-03 00:00:00"), ts("2024-01-01 00:00:00")), -2);

        let discharge = ts("2024-01-02 12:00:00");
        assert_eq!(days_between(discharge, discharge - Duration::milliseconds(500)), -1);
        assert_eq!(whole_days(Duration::nanoseconds(-1)), -1);
        assert_eq!(whole_days(Duration::days(2) + Duration::milliseconds(999)), 2);
    }

    #[test]
    fn test_date_span_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let days: Vec<_> = date_span(start, end).collect();
        assert_eq!(days.len(), 4); // 闰年
        assert_eq!(days[0], start);
        assert_eq!(days[3], end);

        assert_eq!(date_span(end, start).count(), 0);
    }
}
