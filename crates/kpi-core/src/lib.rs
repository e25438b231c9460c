//! # KPI Core
//!
//! 医院运营指标管道的核心模块，提供基础数据结构、错误定义和日期工具。

pub mod error;
pub mod models;
pub mod utils;

pub use error::{KpiError, Result};
pub use models::*;
