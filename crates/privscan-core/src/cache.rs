//! 扫描历史缓存（按 ScanID 存放项目级报告）
//!
//! - 插入有序；覆盖已有键时保留其原插入位置
//! - 超出容量时淘汰最早插入的键，不看其剩余 TTL
//! - 查询时超过 TTL 的条目视为不存在，但不主动清理
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::types::Report;

struct CacheEntry {
    report: Report,
    created_at: Instant,
}

pub(crate) struct ScanCache {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
    ttl: Duration,
    capacity: usize,
}

impl ScanCache {
    pub(crate) fn new(ttl: Duration, capacity: usize) -> Self {
        Self { entries: HashMap::new(), order: VecDeque::new(), ttl, capacity }
    }

    pub(crate) fn get(&self, scan_id: &str) -> Option<&Report> {
        let entry = self.entries.get(scan_id)?;
        if entry.created_at.elapsed() < self.ttl {
            Some(&entry.report)
        } else {
            None
        }
    }

    pub(crate) fn insert(&mut self, scan_id: String, report: Report) {
        let entry = CacheEntry { report, created_at: Instant::now() };
        if self.entries.insert(scan_id.clone(), entry).is_none() {
            self.order.push_back(scan_id);
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
        }
    }

    pub(crate) fn len(&self) -> usize { self.entries.len() }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
