//! 展示循环
//!
//! 主线程上按固定节拍运行，与摄取循环的到达率完全解耦——两边是
//! 独立时钟。每拍读一次状态单元的最新快照并递交给渲染汇；没有新样本
//! 到达时重复上一个值（last-value-hold），不插值、不因缺样本掉帧。

use crate::pose::{AxisMap, map_orientation};
use crate::sink::RenderSink;
use anyhow::bail;
use spin_sleep::SpinSleeper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tilt_driver::TelemetryContext;
use tracing::info;

/// 展示循环配置
#[derive(Debug, Clone, PartialEq)]
pub struct PresentConfig {
    /// 目标刷新率（Hz）
    pub rate_hz: f64,
    /// 最大拍数（`None` 表示一直跑到收到关闭请求；测试用）
    pub max_ticks: Option<u64>,
}

impl Default for PresentConfig {
    fn default() -> Self {
        Self {
            rate_hz: 60.0,
            max_ticks: None,
        }
    }
}

/// 运行展示循环直到关闭请求（或达到 `max_ticks`）
///
/// 返回实际运行的拍数。循环内唯一的挂起点是节拍等待；
/// 读快照不持有任何锁。
pub fn run_present_loop(
    ctx: &TelemetryContext,
    sink: &mut dyn RenderSink,
    axis_map: &AxisMap,
    config: &PresentConfig,
    close_requested: &AtomicBool,
) -> anyhow::Result<u64> {
    if !(config.rate_hz > 0.0) {
        bail!("invalid display rate: {} Hz (must be > 0)", config.rate_hz);
    }

    let period = Duration::from_secs_f64(1.0 / config.rate_hz);
    let sleeper = SpinSleeper::default();
    let mut ticks = 0u64;

    loop {
        // Acquire: pairs with the ctrl-c handler's Release store
        if close_requested.load(Ordering::Acquire) {
            info!("present loop: close requested, exiting");
            break;
        }
        if let Some(max) = config.max_ticks
            && ticks >= max
        {
            break;
        }

        let pose = map_orientation(&ctx.orientation.snapshot(), axis_map);
        sink.present(&pose);
        ticks += 1;

        sleeper.sleep(period);
    }

    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CollectSink;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;
    use tilt_protocol::Orientation;

    fn quiet_close() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn rejects_non_positive_rate() {
        let ctx = TelemetryContext::new();
        let mut sink = CollectSink::new();
        let close = quiet_close();
        for bad in [0.0, -5.0, f64::NAN] {
            let config = PresentConfig {
                rate_hz: bad,
                max_ticks: Some(1),
            };
            assert!(
                run_present_loop(&ctx, &mut sink, &AxisMap::default(), &config, &close).is_err()
            );
        }
    }

    #[test]
    fn holds_last_value_across_ticks() {
        let ctx = TelemetryContext::new();
        ctx.orientation.publish(Orientation::TiltDeg { x: 90, y: 0 });

        let mut sink = CollectSink::new();
        let config = PresentConfig {
            rate_hz: 2_000.0,
            max_ticks: Some(5),
        };
        let close = quiet_close();
        let ticks =
            run_present_loop(&ctx, &mut sink, &AxisMap::default(), &config, &close).unwrap();

        // 没有新样本到达：同一位姿被重复递交，不掉帧
        assert_eq!(ticks, 5);
        assert_eq!(sink.poses.len(), 5);
        for pose in &sink.poses {
            assert_relative_eq!(pose.rotation.angle(), FRAC_PI_2, epsilon = 1e-9);
        }
    }

    #[test]
    fn renders_identity_before_first_sample() {
        let ctx = TelemetryContext::new();
        let mut sink = CollectSink::new();
        let config = PresentConfig {
            rate_hz: 2_000.0,
            max_ticks: Some(1),
        };
        let close = quiet_close();
        run_present_loop(&ctx, &mut sink, &AxisMap::default(), &config, &close).unwrap();

        assert_relative_eq!(sink.poses[0].rotation.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn close_request_stops_loop_immediately() {
        let ctx = TelemetryContext::new();
        let mut sink = CollectSink::new();
        let close = AtomicBool::new(true);
        let ticks = run_present_loop(
            &ctx,
            &mut sink,
            &AxisMap::default(),
            &PresentConfig::default(),
            &close,
        )
        .unwrap();
        assert_eq!(ticks, 0);
        assert!(sink.poses.is_empty());
    }

    #[test]
    fn maps_snapshot_through_axis_map() {
        use crate::pose::SignedAxis;

        let ctx = TelemetryContext::new();
        let half = FRAC_PI_2 / 2.0;
        ctx.orientation.publish(Orientation::Quaternion {
            w: half.cos(),
            x: half.sin(),
            y: 0.0,
            z: 0.0,
        });

        // 设备 x̂ → 世界 ŷ
        let map = AxisMap {
            x: SignedAxis::Y,
            y: SignedAxis::Z,
            z: SignedAxis::X,
        };
        let mut sink = CollectSink::new();
        let config = PresentConfig {
            rate_hz: 2_000.0,
            max_ticks: Some(1),
        };
        let close = quiet_close();
        run_present_loop(&ctx, &mut sink, &map, &config, &close).unwrap();

        let axis = sink.poses[0].rotation.axis().unwrap();
        assert_relative_eq!(axis.into_inner(), Vector3::y(), epsilon = 1e-9);
    }
}
