//! PostgreSQL 仓库
//!
//! 每张表一个事务：`BEGIN; DELETE FROM t; INSERT ...; COMMIT`。任一语句失败时事务随丢弃回滚，
//! 并发读取方只会看到提交前或提交后的完整内容。

use crate::connection::DatabasePool;
use crate::schema::{self, ALL_TABLES, INDEXES};
use crate::sink::TableSink;
use crate::table::{CellValue, ColumnType, TableData};
use async_trait::async_trait;
use kpi_core::{KpiError, Result};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};

/// PostgreSQL 仓库
#[derive(Debug, Clone)]
pub struct PostgresWarehouse {
    pool: DatabasePool,
}

impl PostgresWarehouse {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// 连接并创建仓库
    pub async fn connect(connection_string: &str, max_connections: u32) -> Result<Self> {
        Ok(Self::new(DatabasePool::connect(connection_string, max_connections).await?))
    }
}

fn db_error(e: sqlx::Error) -> KpiError {
    KpiError::Database(e.to_string())
}

/// 按列类型绑定参数，空值也带上类型
fn bind_cell<'q>(
    query: Query<'q, Postgres, PgArguments>,
    kind: ColumnType,
    cell: &CellValue,
) -> Query<'q, Postgres, PgArguments> {
    match cell {
        CellValue::Null => match kind {
            ColumnType::Integer => query.bind(None::<i64>),
            ColumnType::Float => query.bind(None::<f64>),
            ColumnType::Text => query.bind(None::<String>),
            ColumnType::Date => query.bind(None::<chrono::NaiveDate>),
            ColumnType::Timestamp => query.bind(None::<chrono::NaiveDateTime>),
        },
        CellValue::Integer(v) => query.bind(*v),
        CellValue::Float(v) => query.bind(*v),
        CellValue::Text(v) => query.bind(v.clone()),
        CellValue::Date(v) => query.bind(*v),
        CellValue::Timestamp(v) => query.bind(*v),
    }
}

/// 按列类型读取单元格
fn decode_cell(row: &PgRow, index: usize, kind: ColumnType) -> Result<CellValue> {
    let cell: CellValue = match kind {
        ColumnType::Integer => row.try_get::<Option<i64>, _>(index).map_err(db_error)?.into(),
        ColumnType::Float => row.try_get::<Option<f64>, _>(index).map_err(db_error)?.into(),
        ColumnType::Text => row.try_get::<Option<String>, _>(index).map_err(db_error)?.into(),
        ColumnType::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .map_err(db_error)?
            .into(),
        ColumnType::Timestamp => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .map_err(db_error)?
            .into(),
    };
    Ok(cell)
}

#[async_trait]
impl TableSink for PostgresWarehouse {
    fn name(&self) -> &str {
        "postgres"
    }

    /// 创建数据库表
    async fn ensure_schema(&self) -> Result<()> {
        let pool = self.pool.pool();

        for table in ALL_TABLES.iter() {
            sqlx::query(&table.create_table_sql())
                .execute(pool)
                .await
                .map_err(db_error)?;
        }

        // 创建索引以优化看板查询
        for index_sql in INDEXES {
            sqlx::query(index_sql).execute(pool).await.map_err(db_error)?;
        }

        tracing::info!("Warehouse tables created successfully");
        Ok(())
    }

    async fn replace_table(&self, table: TableData) -> Result<()> {
        let schema = table.schema();
        let delete_sql = format!("DELETE FROM {}", schema.name);
        let insert_sql = schema.insert_sql();

        let mut tx = self.pool.pool().begin().await.map_err(db_error)?;

        sqlx::query(&delete_sql)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for row in table.rows() {
            let mut query = sqlx::query(&insert_sql);
            for (column, cell) in schema.columns.iter().zip(row) {
                query = bind_cell(query, column.kind, cell);
            }
            query.execute(&mut *tx).await.map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        tracing::debug!("Replaced {} with {} rows", schema.name, table.len());
        Ok(())
    }

    async fn read_table(&self, name: &str) -> Result<TableData> {
        let schema = schema::lookup(name)?;
        let select_sql = format!("SELECT {} FROM {}", schema.column_list(), schema.name);

        let rows = sqlx::query(&select_sql)
            .fetch_all(self.pool.pool())
            .await
            .map_err(db_error)?;

        let mut table = TableData::new(schema);
        for row in &rows {
            let cells = schema
                .columns
                .iter()
                .enumerate()
                .map(|(index, column)| decode_cell(row, index, column.kind))
                .collect::<Result<Vec<_>>>()?;
            table.push_row(cells)?;
        }
        Ok(table)
    }
}
