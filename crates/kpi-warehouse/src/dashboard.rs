//! 看板读取
//!
//! 按看板约定回读指标表：两个标量取日期最新的一行，主诊断表左连接诊断描述并按次数降序，
//! 在院人数按日期升序。

use crate::schema::{DIAGNOSES, KPI_ADMISSIONS_BY_DX, KPI_AVG_LOS, KPI_DAILY_CENSUS, KPI_READMISSION_30D};
use crate::sink::TableSink;
use crate::table::TableData;
use chrono::NaiveDate;
use kpi_core::{CensusDay, KpiError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;

/// 带日期的标量指标
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatedMetric {
    pub as_of_date: NaiveDate,
    pub value: f64,
}

/// 柱状图的一根柱子
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisBar {
    /// 诊断描述，参考表中缺失时用编码
    pub label: String,
    pub admissions_count: i64,
}

/// 看板所需的全部数据
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub readmission_rate: Option<DatedMetric>,
    pub avg_los_days: Option<DatedMetric>,
    pub admissions_by_dx: Vec<DiagnosisBar>,
    pub daily_census: Vec<CensusDay>,
}

impl DashboardView {
    /// 渲染为文本
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Healthcare Operations KPIs");

        match self.readmission_rate {
            Some(metric) => {
                let _ = writeln!(
                    out,
                    "  30-Day Readmission Rate: {:.1}% (as of {})",
                    metric.value * 100.0,
                    metric.as_of_date
                );
            }
            None => {
                let _ = writeln!(out, "  30-Day Readmission Rate: n/a");
            }
        }
        match self.avg_los_days {
            Some(metric) => {
                let _ = writeln!(out, "  Average LOS (days): {:.2}", metric.value);
            }
            None => {
                let _ = writeln!(out, "  Average LOS (days): n/a");
            }
        }

        if !self.admissions_by_dx.is_empty() {
            let _ = writeln!(out, "\nAdmissions by Primary Diagnosis (Top 10)");
            let widest = self
                .admissions_by_dx
                .iter()
                .map(|bar| bar.label.len())
                .max()
                .unwrap_or(0);
            for bar in &self.admissions_by_dx {
                let _ = writeln!(out, "  {:<width$}  {}", bar.label, bar.admissions_count, width = widest);
            }
        }

        if let (Some(first), Some(last)) = (self.daily_census.first(), self.daily_census.last()) {
            let peak = self
                .daily_census
                .iter()
                .max_by_key(|day| day.inpatient_count)
                .copied()
                .unwrap_or(*first);
            let _ = writeln!(out, "\nDaily Inpatient Census (Proxy)");
            let _ = writeln!(
                out,
                "  {} days from {} to {}, peak {} on {}, latest {}",
                self.daily_census.len(),
                first.census_date,
                last.census_date,
                peak.inpatient_count,
                peak.census_date,
                last.inpatient_count
            );
        }

        out
    }
}

/// 看板查询
pub struct DashboardQuery<'a> {
    sink: &'a dyn TableSink,
}

impl<'a> DashboardQuery<'a> {
    pub fn new(sink: &'a dyn TableSink) -> Self {
        Self { sink }
    }

    /// 读取看板数据
    pub async fn load(&self) -> Result<DashboardView> {
        let readmission = self.sink.read_table(KPI_READMISSION_30D).await?;
        let avg_los = self.sink.read_table(KPI_AVG_LOS).await?;
        let by_dx = self.sink.read_table(KPI_ADMISSIONS_BY_DX).await?;
        let diagnoses = self.sink.read_table(DIAGNOSES).await?;
        let census = self.sink.read_table(KPI_DAILY_CENSUS).await?;

        Ok(DashboardView {
            readmission_rate: latest_metric(&readmission, "readmission_rate")?,
            avg_los_days: latest_metric(&avg_los, "avg_los_days")?,
            admissions_by_dx: diagnosis_bars(&by_dx, &diagnoses)?,
            daily_census: census_series(&census)?,
        })
    }
}

fn malformed(table: &TableData, column: &str) -> KpiError {
    KpiError::Validation(format!("unexpected value in {}.{}", table.name(), column))
}

/// 日期最新的一行
fn latest_metric(table: &TableData, value_column: &str) -> Result<Option<DatedMetric>> {
    let date_index = table.column_index("as_of_date")?;
    let value_index = table.column_index(value_column)?;

    let mut metrics = Vec::with_capacity(table.len());
    for row in table.rows() {
        let as_of_date = row[date_index]
            .as_date()
            .ok_or_else(|| malformed(table, "as_of_date"))?;
        let value = row[value_index]
            .as_f64()
            .ok_or_else(|| malformed(table, value_column))?;
        metrics.push(DatedMetric { as_of_date, value });
    }

    Ok(metrics.into_iter().max_by_key(|m| m.as_of_date))
}

fn diagnosis_bars(by_dx: &TableData, diagnoses: &TableData) -> Result<Vec<DiagnosisBar>> {
    let code_index = diagnoses.column_index("diagnosis_code")?;
    let desc_index = diagnoses.column_index("diagnosis_desc")?;
    let descriptions: HashMap<&str, &str> = diagnoses
        .rows()
        .iter()
        .filter_map(|row| Some((row[code_index].as_str()?, row[desc_index].as_str()?)))
        .collect();

    let dx_index = by_dx.column_index("diagnosis_code")?;
    let count_index = by_dx.column_index("admissions_count")?;

    let mut bars = Vec::with_capacity(by_dx.len());
    for row in by_dx.rows() {
        let code = row[dx_index]
            .as_str()
            .ok_or_else(|| malformed(by_dx, "diagnosis_code"))?;
        let admissions_count = row[count_index]
            .as_i64()
            .ok_or_else(|| malformed(by_dx, "admissions_count"))?;
        let label = descriptions.get(code).copied().unwrap_or(code).to_string();
        bars.push(DiagnosisBar {
            label,
            admissions_count,
        });
    }

    bars.sort_by(|a, b| b.admissions_count.cmp(&a.admissions_count));
    Ok(bars)
}

fn census_series(census: &TableData) -> Result<Vec<CensusDay>> {
    let date_index = census.column_index("census_date")?;
    let count_index = census.column_index("inpatient_count")?;

    let mut days = Vec::with_capacity(census.len());
    for row in census.rows() {
        let census_date = row[date_index]
            .as_date()
            .ok_or_else(|| malformed(census, "census_date"))?;
        let inpatient_count = row[count_index]
            .as_i64()
            .and_then(|c| u64::try_from(c).ok())
            .ok_or_else(|| malformed(census, "inpatient_count"))?;
        days.push(CensusDay {
            census_date,
            inpatient_count,
        });
    }

    days.sort_by_key(|day| day.census_date);
    Ok(days)
}
