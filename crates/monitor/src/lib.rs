//! # bolsa-monitor
//!
//! 刷新周期编排：抓取 → 指标 → 信号 → 去重告警 → 看板快照。

pub mod alert;
pub mod dashboard;
pub mod error;
pub mod monitor;

pub use alert::AlertGate;
pub use dashboard::Dashboard;
pub use monitor::{CycleReport, Monitor, MonitorSettings};
