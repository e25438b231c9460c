//! # KPI合成数据模块
//!
//! 生成具有真实统计形态的患者、诊断参考和住院事件记录。所有数据均为虚构，不含任何患者隐私信息。
//!
//! 生成器只返回记录，不写入任何存储。

pub mod diagnoses;
pub mod generator;

pub use diagnoses::{diagnosis_reference, DIAGNOSES};
pub use generator::{GeneratorConfig, SyntheticDataset, SyntheticEventGenerator};
