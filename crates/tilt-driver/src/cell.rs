//! 姿态状态单元
//!
//! 单槽、覆盖写、无锁读的共享单元。摄取线程是唯一写者，展示循环是
//! 唯一读者；双方都不会因对方而阻塞。

use arc_swap::ArcSwap;
use std::sync::Arc;
use tilt_protocol::Orientation;

use crate::metrics::IngestMetrics;

/// 最新姿态样本的共享单元
///
/// `publish` 以整体指针交换提交一个完整样本，`snapshot` 无锁装载——
/// 读者只可能观察到初始值或某一次完整发布的值，撕裂读在结构上不可能。
/// 首个有效样本到达前，`snapshot` 返回单位姿态。
///
/// 发布按写入顺序可见，但读者可能跳过中间值（只看到最新的）——
/// 对实时姿态显示这是预期的 latest-wins 语义。
pub struct OrientationCell {
    inner: ArcSwap<Orientation>,
}

impl OrientationCell {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(Orientation::IDENTITY),
        }
    }

    /// 发布一个新样本（仅摄取循环调用）
    ///
    /// 无锁（ArcSwap::store），不等待读者。
    pub fn publish(&self, orientation: Orientation) {
        self.inner.store(Arc::new(orientation));
    }

    /// 读取当前样本（仅展示循环调用）
    ///
    /// 无锁（ArcSwap::load），不阻塞写者，返回副本。
    pub fn snapshot(&self) -> Orientation {
        **self.inner.load()
    }
}

impl Default for OrientationCell {
    fn default() -> Self {
        Self::new()
    }
}

/// 摄取会话的共享上下文
///
/// 由摄取线程和消费端共同持有（Arc），聚合状态单元与计数器。
pub struct TelemetryContext {
    /// 最新姿态
    pub orientation: OrientationCell,
    /// 摄取链路计数器
    pub metrics: IngestMetrics,
}

impl TelemetryContext {
    pub fn new() -> Self {
        Self {
            orientation: OrientationCell::new(),
            metrics: IngestMetrics::new(),
        }
    }
}

impl Default for TelemetryContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn snapshot_before_first_publish_is_identity() {
        let cell = OrientationCell::new();
        assert!(cell.snapshot().is_identity());
    }

    #[test]
    fn publish_then_snapshot() {
        let cell = OrientationCell::new();
        cell.publish(Orientation::TiltDeg { x: 30, y: -15 });
        assert_eq!(cell.snapshot(), Orientation::TiltDeg { x: 30, y: -15 });
    }

    #[test]
    fn latest_publication_wins() {
        let cell = OrientationCell::new();
        for k in 0..100 {
            cell.publish(Orientation::TiltDeg { x: k, y: -k });
        }
        assert_eq!(cell.snapshot(), Orientation::TiltDeg { x: 99, y: -99 });
    }

    /// 并发交错下每次 snapshot 都是初始值或某次完整发布的值，
    /// 绝不是两次发布的字段混合。
    #[test]
    fn concurrent_snapshots_never_tear() {
        const PUBLICATIONS: i64 = 10_000;

        let cell = Arc::new(OrientationCell::new());
        let done = Arc::new(AtomicBool::new(false));

        // 写者：四个分量永远相等，任何混合都会被读者识破
        let writer = {
            let cell = cell.clone();
            let done = done.clone();
            thread::spawn(move || {
                for k in 1..=PUBLICATIONS {
                    let v = k as f64;
                    cell.publish(Orientation::Quaternion {
                        w: v,
                        x: v,
                        y: v,
                        z: v,
                    });
                }
                done.store(true, Ordering::Release);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cell = cell.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut last = 0.0f64;
                    while !done.load(Ordering::Acquire) {
                        let seen = cell.snapshot();
                        if seen.is_identity() {
                            // 首次发布前的初始值
                            continue;
                        }
                        match seen {
                            Orientation::Quaternion { w, x, y, z } => {
                                assert!(
                                    w == x && x == y && y == z,
                                    "torn read: ({w}, {x}, {y}, {z})"
                                );
                                // 发布按写入顺序可见，读到的序号单调不减
                                assert!(w >= last, "went backwards: {w} < {last}");
                                last = w;
                            },
                            other => panic!("unexpected variant: {other:?}"),
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(
            cell.snapshot(),
            Orientation::Quaternion {
                w: PUBLICATIONS as f64,
                x: PUBLICATIONS as f64,
                y: PUBLICATIONS as f64,
                z: PUBLICATIONS as f64,
            }
        );
    }
}
