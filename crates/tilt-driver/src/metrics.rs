//! 摄取链路计数器
//!
//! 原子计数器，摄取线程 Relaxed 累加，任意线程可取快照。
//! 解码失败静默丢弃是策略（见 pipeline），计数器是它留下的唯一痕迹。

use std::sync::atomic::{AtomicU64, Ordering};

/// 摄取链路性能指标
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// 成帧产出的行总数
    pub lines_total: AtomicU64,
    /// 解码失败被丢弃的行数
    pub decode_failures: AtomicU64,
    /// 成功发布到状态单元的样本数
    pub publishes: AtomicU64,
    /// 读超时次数（正常现象，反映链路空闲度）
    pub read_timeouts: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取当前计数器快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_total: self.lines_total.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// 某一时刻的计数器快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub lines_total: u64,
    pub decode_failures: u64,
    pub publishes: u64,
    pub read_timeouts: u64,
}
