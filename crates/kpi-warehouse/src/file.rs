//! 文件仓库
//!
//! 每张表存为 `<目录>/<表名>.json`。写入先落到同目录的临时文件，再用 `rename` 覆盖旧文件，
//! 同一文件系统上的重命名是原子的。

use crate::schema::{self, ALL_TABLES};
use crate::sink::TableSink;
use crate::table::{CellValue, TableData};
use async_trait::async_trait;
use kpi_core::{KpiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 落盘格式
#[derive(Debug, Serialize, Deserialize)]
struct StoredTable {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// 基于JSON文件的仓库
#[derive(Debug, Clone)]
pub struct FileWarehouse {
    root: PathBuf,
}

impl FileWarehouse {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        self.root.join(format!(".{}.json.tmp", name))
    }
}

#[async_trait]
impl TableSink for FileWarehouse {
    fn name(&self) -> &str {
        "file"
    }

    async fn ensure_schema(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tracing::debug!(
            "File warehouse ready at {} ({} tables)",
            self.root.display(),
            ALL_TABLES.len()
        );
        Ok(())
    }

    async fn replace_table(&self, table: TableData) -> Result<()> {
        let name = table.name();
        let stored = StoredTable {
            table: name.to_string(),
            columns: table.columns().iter().map(|c| c.name.to_string()).collect(),
            rows: table.into_rows(),
        };
        let body = serde_json::to_vec_pretty(&stored)?;

        let staging = self.staging_path(name);
        tokio::fs::write(&staging, body).await?;
        if let Err(e) = tokio::fs::rename(&staging, self.table_path(name)).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_table(&self, name: &str) -> Result<TableData> {
        let schema = schema::lookup(name)?;
        let path = self.table_path(name);

        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TableData::new(schema)),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredTable = serde_json::from_slice(&body)?;

        let expected: Vec<&str> = schema.columns.iter().map(|c| c.name).collect();
        if stored.table != schema.name || stored.columns != expected {
            return Err(KpiError::Validation(format!(
                "{} does not match the {} table layout",
                path.display(),
                schema.name
            )));
        }

        let mut table = TableData::new(schema);
        for row in stored.rows {
            table.push_row(row)?;
        }
        Ok(table)
    }
}
