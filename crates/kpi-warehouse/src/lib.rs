//! # KPI仓库模块
//!
//! 把指标快照和清洗后的维度/事实表发布到外部仓库。每张表的替换是原子的：
//! 并发读取方要么看到完整的旧快照，要么看到完整的新快照。跨表不保证原子性。

pub mod connection;
pub mod dashboard;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod publisher;
pub mod schema;
pub mod sink;
pub mod table;

// 重新导出主要类型
pub use connection::DatabasePool;
pub use dashboard::{DashboardQuery, DashboardView};
pub use file::FileWarehouse;
pub use memory::MemoryWarehouse;
pub use postgres::PostgresWarehouse;
pub use publisher::{DimensionTables, PublishSummary, WarehousePublisher};
pub use schema::TableSchema;
pub use sink::TableSink;
pub use table::{CellValue, Column, ColumnType, TableData};
