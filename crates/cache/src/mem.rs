use async_trait::async_trait;
use bolsa_core::cache::error::CacheError;
use bolsa_core::cache::port::Cache;
use bolsa_core::common::time::{RealTimeProvider, TimeProvider};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// 缓存条目：原始字节与过期时刻
struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// # Summary
/// 基于 DashMap 的带 TTL 内存缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 过期判断使用注入的 `TimeProvider`，读取时惰性剔除过期条目。
/// - 不做容量限制，条目数量由监控列表规模决定。
pub struct MemCache {
    // 线程安全的 KV 存储容器
    storage: DashMap<String, Entry>,
    clock: Arc<dyn TimeProvider>,
}

impl MemCache {
    /// # Summary
    /// 创建一个使用系统时钟的 MemCache 实例。
    pub fn new() -> Self {
        Self::with_clock(Arc::new(RealTimeProvider))
    }

    /// # Summary
    /// 使用指定时钟创建缓存，测试中注入 `FakeClockProvider` 以控制过期。
    ///
    /// # Arguments
    /// * `clock`: 时间提供者。
    pub fn with_clock(clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            storage: DashMap::new(),
            clock,
        }
    }

    /// 当前条目数量 (含尚未被剔除的过期条目)
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// # Summary
    /// 主动清理所有已过期条目。
    ///
    /// # Returns
    /// 被清理的条目数量。
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.storage.len();
        self.storage.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.storage.len());
        if purged > 0 {
            trace!("Purged {} expired cache entries", purged);
        }
        purged
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemCache {
    /// # Summary
    /// 设置原始字节数据。
    ///
    /// # Logic
    /// 1. 以当前时钟加 TTL 计算过期时刻，TTL 超出可表示范围时视为永不过期。
    /// 2. 插入哈希表，同名 Key 直接覆盖。
    async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let now = self.clock.now();
        let expires_at = ttl.and_then(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
        });
        self.storage.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    /// # Summary
    /// 获取原始字节数据。
    ///
    /// # Logic
    /// 1. 未命中返回 None。
    /// 2. 命中但已过期：移除条目并返回 None。
    /// 3. 否则克隆字节返回。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now();
        match self.storage.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        // 读锁已释放，再移除，避免同分片死锁
        self.storage.remove_if(key, |_, entry| entry.is_expired(now));
        trace!("Cache entry '{}' expired", key);
        Ok(None)
    }

    /// 删除指定键，无论键是否存在均返回 Ok
    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }
}
