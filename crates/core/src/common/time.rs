use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::RwLock;

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 缓存过期判断与告警去重周期都必须通过此接口获取当前时间。
pub trait TimeProvider: Send + Sync {
    /// 获取当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// 实际运行使用的真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试专用虚拟时钟，允许主动拨快时间以触发缓存过期或周期翻转。
///
/// # Invariants
/// - 内部利用 `RwLock` 提供并发安全的读写。
/// - 锁中毒时沿用中毒前的值，不向调用方传播 panic。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time = new_time;
    }

    /// 将时钟向前拨动指定时长
    pub fn advance(&self, delta: chrono::Duration) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time += delta;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// # Summary
/// 告警去重周期。同一标的在同一周期桶内最多推送一次。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DedupPeriod {
    // 按 UTC 小时分桶
    Hour,
    // 按 UTC 自然日分桶
    #[default]
    Day,
}

impl DedupPeriod {
    /// # Summary
    /// 计算给定时刻所属的周期桶标识。
    ///
    /// # Logic
    /// 1. Hour => `YYYY-MM-DDTHH`。
    /// 2. Day => `YYYY-MM-DD`。
    ///
    /// # Arguments
    /// * `at`: 目标时刻 (UTC)。
    ///
    /// # Returns
    /// 周期桶字符串，同一桶内的任意两个时刻返回相同值。
    pub fn bucket(&self, at: DateTime<Utc>) -> String {
        match self {
            DedupPeriod::Hour => at.format("%Y-%m-%dT%H").to_string(),
            DedupPeriod::Day => at.format("%Y-%m-%d").to_string(),
        }
    }
}

impl FromStr for DedupPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hour" | "1h" => Ok(DedupPeriod::Hour),
            "day" | "1d" => Ok(DedupPeriod::Day),
            _ => Err(format!("Unknown DedupPeriod: {}", s)),
        }
    }
}

impl std::fmt::Display for DedupPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupPeriod::Hour => write!(f, "hour"),
            DedupPeriod::Day => write!(f, "day"),
        }
    }
}
