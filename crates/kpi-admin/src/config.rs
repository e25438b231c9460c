//! 配置管理
//!
//! 配置来源按优先级从低到高：内置默认值、TOML 配置文件、`KPI__` 前缀的环境变量
//! （例如 `KPI__WAREHOUSE__KIND=postgres`）。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use kpi_synth::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: PipelineConfig,
    /// 配置文件路径
    config_path: Option<PathBuf>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 管道完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 仓库配置
    pub warehouse: WarehouseConfig,
    /// 合成数据配置
    pub generator: GeneratorConfig,
    /// 源文件配置
    pub data: DataConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 仓库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseKind {
    Memory,
    File,
    Postgres,
}

/// 仓库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// 仓库类型
    pub kind: WarehouseKind,
    /// 文件仓库目录
    pub path: PathBuf,
    /// PostgreSQL 连接字符串
    pub connection_string: Option<String>,
    /// 最大连接数
    pub max_connections: u32,
}

/// 源文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV 目录
    pub data_dir: PathBuf,
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    Pretty,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令
    pub level: String,
    /// 日志格式
    pub format: LogFormat,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&PipelineConfig) -> Result<()>,
}

impl ConfigManager {
    /// 加载配置，文件路径为空时只使用默认值和环境变量
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Self::load_config(config_path)?;
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config,
            config_path: config_path.map(Path::to_path_buf),
            validator,
        })
    }

    /// 从文件和环境变量加载配置
    fn load_config(config_path: Option<&Path>) -> Result<PipelineConfig> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("KPI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        let config: PipelineConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded successfully from: {}", path.display()),
            None => info!("Configuration loaded from defaults and environment"),
        }
        Ok(config)
    }

    /// 获取配置
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 更新配置
    pub fn update_config(&mut self, new_config: PipelineConfig) -> Result<()> {
        self.validator.validate(&new_config)?;
        self.config = new_config;
        info!("Configuration updated successfully");
        Ok(())
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(&self.config)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, config_str).context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// 重新加载配置
    pub fn reload_config(&mut self) -> Result<()> {
        let new_config = Self::load_config(self.config_path.as_deref())?;
        self.update_config(new_config)
    }
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "generator.patient_count",
                validator: |config| {
                    anyhow::ensure!(config.generator.patient_count > 0, "patient count must be positive");
                    Ok(())
                },
            },
            ValidationRule {
                field_path: "generator.admission_count",
                validator: |config| {
                    anyhow::ensure!(config.generator.admission_count > 0, "admission count must be positive");
                    Ok(())
                },
            },
            ValidationRule {
                field_path: "generator.start",
                validator: |config| {
                    anyhow::ensure!(
                        config.generator.start < config.generator.end,
                        "admission date range [{}, {}) is empty",
                        config.generator.start,
                        config.generator.end
                    );
                    Ok(())
                },
            },
            ValidationRule {
                field_path: "warehouse.connection_string",
                validator: |config| {
                    let missing = config
                        .warehouse
                        .connection_string
                        .as_deref()
                        .map_or(true, |s| s.trim().is_empty());
                    anyhow::ensure!(
                        config.warehouse.kind != WarehouseKind::Postgres || !missing,
                        "postgres warehouse requires a connection string"
                    );
                    Ok(())
                },
            },
            ValidationRule {
                field_path: "warehouse.max_connections",
                validator: |config| {
                    anyhow::ensure!(config.warehouse.max_connections > 0, "max connections cannot be 0");
                    Ok(())
                },
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &PipelineConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(e.context(format!("Invalid configuration value {}", rule.field_path)));
            }
        }

        info!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            kind: WarehouseKind::File,
            path: PathBuf::from("./warehouse"),
            connection_string: None,
            max_connections: 5,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}
