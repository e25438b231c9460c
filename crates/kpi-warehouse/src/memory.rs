//! 内存仓库

use crate::schema;
use crate::sink::TableSink;
use crate::table::TableData;
use async_trait::async_trait;
use kpi_core::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 进程内仓库
///
/// 替换在一次写锁内完成整表交换，读取方不会看到半张表。
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: RwLock<HashMap<&'static str, TableData>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的表名
    pub async fn table_names(&self) -> Vec<&'static str> {
        let tables = self.tables.read().await;
        let mut names: Vec<_> = tables.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl TableSink for MemoryWarehouse {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn replace_table(&self, table: TableData) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.insert(table.name(), table);
        Ok(())
    }

    async fn read_table(&self, name: &str) -> Result<TableData> {
        let schema = schema::lookup(name)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(schema.name)
            .cloned()
            .unwrap_or_else(|| TableData::new(schema)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::KPI_DAILY_CENSUS;
    use chrono::NaiveDate;

    fn census(days: &[(u32, i64)]) -> TableData {
        let mut table = TableData::for_table(KPI_DAILY_CENSUS).unwrap();
        for (day, count) in days {
            let date = NaiveDate::from_ymd_opt(2024, 1, *day).unwrap();
            table.push_row(vec![date.into(), (*count).into()]).unwrap();
        }
        table
    }

    #[tokio::test]
    async fn test_replace_discards_previous_rows() {
        let warehouse = MemoryWarehouse::new();
        warehouse.replace_table(census(&[(1, 3), (2, 4), (3, 5)])).await.unwrap();
        warehouse.replace_table(census(&[(9, 1)])).await.unwrap();

        let stored = warehouse.read_table(KPI_DAILY_CENSUS).await.unwrap();
        assert_eq!(stored, census(&[(9, 1)]));
        assert_eq!(warehouse.table_names().await, vec![KPI_DAILY_CENSUS]);
    }

    #[tokio::test]
    async fn test_unwritten_table_reads_empty() {
        let warehouse = MemoryWarehouse::new();
        assert!(warehouse.read_table(KPI_DAILY_CENSUS).await.unwrap().is_empty());
        assert!(warehouse.read_table("nope").await.is_err());
    }
}
