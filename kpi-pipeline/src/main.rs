//! 医疗运营指标管道主程序

mod pipeline;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kpi_admin::{init_logging, ConfigManager};
use kpi_warehouse::DashboardQuery;
use pipeline::{generate_sources, generate_to_dir, open_warehouse, PipelineRunner};
use std::path::PathBuf;
use tracing::{error, info};

/// 指标管道命令行参数
#[derive(Parser, Debug)]
#[command(name = "kpi-pipeline")]
#[command(about = "医疗运营指标管道：合成数据、清洗、聚合并发布到仓库")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 生成合成源表 CSV
    Generate {
        /// 住院记录数
        #[arg(long)]
        rows: Option<usize>,

        /// 患者数
        #[arg(long)]
        patients: Option<usize>,

        /// 入院日期下界（含）
        #[arg(long)]
        start: Option<NaiveDate>,

        /// 入院日期上界（不含）
        #[arg(long)]
        end: Option<NaiveDate>,

        /// 随机种子
        #[arg(long)]
        seed: Option<u64>,

        /// 输出目录
        #[arg(short, long)]
        outdir: Option<PathBuf>,
    },
    /// 运行一次完整管道
    Run {
        /// 源 CSV 目录
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// 不读 CSV，直接用合成数据运行
        #[arg(long, conflicts_with = "data_dir")]
        synthetic: bool,

        /// 运行结束后打印看板
        #[arg(long)]
        report: bool,
    },
    /// 从仓库读取并打印看板
    Report {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
    /// 写出一份起始配置文件
    InitConfig {
        /// 输出路径
        #[arg(default_value = "kpi-pipeline.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut manager = ConfigManager::new(args.config.as_deref())?;
    init_logging(&manager.config().logging, args.log_level.as_deref())?;

    if let Err(e) = execute(args.command, &mut manager).await {
        error!("Pipeline failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn execute(command: Command, manager: &mut ConfigManager) -> Result<()> {
    match command {
        Command::Generate {
            rows,
            patients,
            start,
            end,
            seed,
            outdir,
        } => {
            let mut config = manager.config().clone();
            if let Some(rows) = rows {
                config.generator.admission_count = rows;
            }
            if let Some(patients) = patients {
                config.generator.patient_count = patients;
            }
            if let Some(start) = start {
                config.generator.start = start;
            }
            if let Some(end) = end {
                config.generator.end = end;
            }
            if seed.is_some() {
                config.generator.seed = seed;
            }
            if let Some(outdir) = outdir {
                config.data.data_dir = outdir;
            }
            manager.update_config(config)?;

            let config = manager.config();
            info!("Generating synthetic source tables into {}", config.data.data_dir.display());
            generate_to_dir(config.generator.clone(), &config.data.data_dir)
                .context("Failed to generate source tables")?;
        }
        Command::Run {
            data_dir,
            synthetic,
            report,
        } => {
            let config = manager.config();
            let sink = open_warehouse(&config.warehouse)
                .await
                .context("Failed to open warehouse")?;
            let runner = PipelineRunner::new(sink.as_ref());

            let summary = if synthetic {
                let tables = generate_sources(config.generator.clone())?;
                runner.run(tables).await?
            } else {
                let data_dir = data_dir.unwrap_or_else(|| config.data.data_dir.clone());
                runner.run_from_dir(&data_dir).await?
            };

            info!(
                "Run {} finished: {} tables, {} rows published",
                summary.run_id,
                summary.published.tables.len(),
                summary.published.total_rows()
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if report {
                let view = DashboardQuery::new(sink.as_ref()).load().await?;
                print!("{}", view.render());
            }
        }
        Command::Report { json } => {
            let sink = open_warehouse(&manager.config().warehouse)
                .await
                .context("Failed to open warehouse")?;
            let view = DashboardQuery::new(sink.as_ref()).load().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", view.render());
            }
        }
        Command::InitConfig { path } => {
            manager.save(&path)?;
            println!("Wrote configuration to {}", path.display());
        }
    }
    Ok(())
}
