//! # KPI管理模块
//!
//! 提供配置加载、校验和日志初始化

pub mod config;
pub mod logging;

pub use config::{
    ConfigManager, ConfigValidator, DataConfig, LogFormat, LoggingConfig, PipelineConfig,
    WarehouseConfig, WarehouseKind,
};
pub use logging::init_logging;
