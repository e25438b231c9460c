//! 错误定义模块

use thiserror::Error;

/// 指标管道统一错误类型
#[derive(Error, Debug)]
pub enum KpiError {
    /// 源记录缺失或格式错误，在聚合之前中止运行
    #[error("输入错误: {0}")]
    Input(String),

    /// 清洗后没有任何住院记录，无法确定快照日期
    #[error("清洗后的住院数据为空，无法计算指标快照")]
    EmptyDataset,

    /// 仓库写入失败，指明失败的表
    #[error("发布表 {table} 失败: {message}")]
    Publish { table: String, message: String },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),
}

impl KpiError {
    /// 构造发布错误
    pub fn publish(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        KpiError::Publish {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// 失败的表名（仅发布错误）
    pub fn failed_table(&self) -> Option<&str> {
        match self {
            KpiError::Publish { table, .. } => Some(table),
            _ => None,
        }
    }
}

/// 指标管道统一结果类型
pub type Result<T> = std::result::Result<T, KpiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_error_names_table() {
        let err = KpiError::publish("kpi_avg_los", "connection reset");
        assert_eq!(err.failed_table(), Some("kpi_avg_los"));
        assert!(err.to_string().contains("kpi_avg_los"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_other_errors_have_no_table() {
        assert_eq!(KpiError::EmptyDataset.failed_table(), None);
        assert_eq!(KpiError::Input("bad".into()).failed_table(), None);
    }
}
