//! 日志初始化

use crate::config::{LogFormat, LoggingConfig};
use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// 构造过滤器：`RUST_LOG` 优先，其次命令行覆盖值，最后配置文件
pub fn build_filter(config: &LoggingConfig, level_override: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = level_override.unwrap_or(&config.level);
    EnvFilter::try_new(directives).with_context(|| format!("Invalid log filter: {}", directives))
}

/// 初始化全局日志订阅者，只能调用一次
pub fn init_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let filter = build_filter(config, level_override)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_config() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig::default();
        let filter = build_filter(&config, Some("debug")).unwrap();
        assert_eq!(filter.to_string(), "debug");

        let filter = build_filter(&config, None).unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_invalid_directive() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "kpi=notalevel".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_filter(&config, None).is_err());
    }
}
