//! 仓库写入抽象

use crate::table::TableData;
use async_trait::async_trait;
use kpi_core::Result;

/// 表格数据接收端
///
/// `replace_table` 是唯一的写入原语：整体替换一张表的内容，对读取方原子可见。
/// 失败时该表保持原来的内容。
#[async_trait]
pub trait TableSink: Send + Sync {
    /// 接收端名称，用于日志
    fn name(&self) -> &str;

    /// 确保所有表存在
    async fn ensure_schema(&self) -> Result<()>;

    /// 原子替换整张表
    async fn replace_table(&self, table: TableData) -> Result<()>;

    /// 读取整张表；表从未写入时返回空表
    async fn read_table(&self, name: &str) -> Result<TableData>;
}
