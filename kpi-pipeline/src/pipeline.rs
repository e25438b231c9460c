//! 管道编排
//!
//! 一次运行依次执行：读取（或合成）源表 → 清洗 → 聚合 → 发布。任一阶段失败即终止，
//! 空数据集在发布前失败，仓库保留上一次快照。

use chrono::NaiveDate;
use kpi_admin::{WarehouseConfig, WarehouseKind};
use kpi_core::{KpiError, Result};
use kpi_ingest::SourceTables;
use kpi_synth::{GeneratorConfig, SyntheticEventGenerator};
use kpi_transform::{clean_admissions_with_report, CleaningReport, KpiAggregator};
use kpi_warehouse::{
    DimensionTables, FileWarehouse, MemoryWarehouse, PostgresWarehouse, PublishSummary, TableSink,
    WarehousePublisher,
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, Instrument};
use uuid::Uuid;

/// 按配置打开仓库并建表
pub async fn open_warehouse(config: &WarehouseConfig) -> Result<Box<dyn TableSink>> {
    let sink: Box<dyn TableSink> = match config.kind {
        WarehouseKind::Memory => Box::new(MemoryWarehouse::new()),
        WarehouseKind::File => Box::new(FileWarehouse::new(config.path.clone())),
        WarehouseKind::Postgres => {
            let connection_string = config.connection_string.as_deref().ok_or_else(|| {
                KpiError::Config("postgres warehouse requires a connection_string".to_string())
            })?;
            Box::new(PostgresWarehouse::connect(connection_string, config.max_connections).await?)
        }
    };

    sink.ensure_schema().await?;
    info!("Warehouse ready: {}", sink.name());
    Ok(sink)
}

/// 生成合成源表
pub fn generate_sources(config: GeneratorConfig) -> Result<SourceTables> {
    let mut generator = SyntheticEventGenerator::new(config)?;
    let dataset = generator.generate();
    Ok(SourceTables {
        patients: dataset.patients,
        diagnoses: dataset.diagnoses,
        admissions: dataset.admissions,
    })
}

/// 生成合成源表并写成 CSV
pub fn generate_to_dir(config: GeneratorConfig, out_dir: &Path) -> Result<SourceTables> {
    let tables = generate_sources(config)?;
    kpi_ingest::write_source_tables(out_dir, &tables)?;
    info!(
        "Wrote {} patients, {} diagnoses, {} admissions to {}",
        tables.patients.len(),
        tables.diagnoses.len(),
        tables.admissions.len(),
        out_dir.display()
    );
    Ok(tables)
}

/// 一次运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub as_of_date: NaiveDate,
    pub cleaning: CleaningReport,
    pub readmission_rate: f64,
    pub avg_los_days: f64,
    pub published: PublishSummary,
}

/// 管道执行器
pub struct PipelineRunner<'a> {
    sink: &'a dyn TableSink,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(sink: &'a dyn TableSink) -> Self {
        Self { sink }
    }

    /// 从 CSV 目录运行
    pub async fn run_from_dir(&self, data_dir: &Path) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id);
        async move {
            info!("Extracting source tables from {}", data_dir.display());
            let tables = kpi_ingest::read_source_tables(data_dir)?;
            self.execute(run_id, tables).await
        }
        .instrument(span)
        .await
    }

    /// 对已在内存中的源表运行
    pub async fn run(&self, tables: SourceTables) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id);
        self.execute(run_id, tables).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, tables: SourceTables) -> Result<RunSummary> {
        let SourceTables {
            patients,
            diagnoses,
            admissions,
        } = tables;

        let (admissions, cleaning) = clean_admissions_with_report(admissions);
        info!(
            "Cleaned admissions: kept {} of {} ({} dropped)",
            cleaning.kept,
            cleaning.input,
            cleaning.dropped()
        );

        let snapshot = KpiAggregator::new(&diagnoses).compute(&admissions)?;
        info!(
            "KPIs as of {}: readmission rate {:.4}, avg LOS {:.2} days",
            snapshot.as_of_date, snapshot.readmission_rate, snapshot.avg_los_days
        );

        let dimensions = DimensionTables {
            patients: &patients,
            diagnoses: &diagnoses,
            admissions: &admissions,
        };
        let published = WarehousePublisher::new(self.sink)
            .publish(&snapshot, &dimensions)
            .await?;

        Ok(RunSummary {
            run_id,
            as_of_date: snapshot.as_of_date,
            cleaning,
            readmission_rate: snapshot.readmission_rate,
            avg_los_days: snapshot.avg_los_days,
            published,
        })
    }
}
