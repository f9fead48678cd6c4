//! 摄取循环模块
//!
//! 后台线程的读行、解码、发布逻辑。
//!
//! 循环状态机：`Reading → Decoding → (Published | Dropped) → Reading → … → Stopped`。
//! 每轮循环头检查停止标志；进行中的阻塞读不被打断，停止在本次读返回后
//! 生效——停机延迟以传输层读超时为界。

use crate::cell::TelemetryContext;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tilt_protocol::decode_line;
use tilt_serial::{LineTransport, TransportError};
use tracing::{error, info, trace};

/// 摄取循环配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// 带内停止字节
    ///
    /// 行首字节等于该值时摄取循环干净退出（旧设备用 `z` 行通知上位机
    /// 结束会话）。`None` 关闭该行为。
    pub stop_byte: Option<u8>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            stop_byte: Some(b'z'),
        }
    }
}

/// 摄取线程主循环
///
/// 独占持有传输句柄，直到循环返回。退出条件：
///
/// - 停止标志被清除（协作式停止，循环头检查）；
/// - 传输 EOF 或设备故障（终止条件，清除标志后退出，不让进程崩溃）；
/// - 带内停止字节（见 [`IngestConfig::stop_byte`]）。
///
/// 解码失败的行就地丢弃、只计数不上报——遥测流里偶发的脏帧是常态，
/// 系统取"保住最新好样本"而不是"暴露瞬态解码噪声"。
pub fn ingest_loop(
    mut transport: impl LineTransport,
    ctx: Arc<TelemetryContext>,
    config: IngestConfig,
    is_running: Arc<AtomicBool>,
) {
    loop {
        // Acquire: if we see false, we must also see the stopper's prior writes
        if !is_running.load(Ordering::Acquire) {
            trace!("ingest loop: stop flag observed, exiting");
            break;
        }

        let line = match transport.read_line() {
            Ok(line) => line,
            Err(TransportError::Timeout) => {
                // 超时是正常情况，回到循环头重查停止标志
                ctx.metrics.read_timeouts.fetch_add(1, Ordering::Relaxed);
                continue;
            },
            Err(TransportError::Eof) => {
                info!("ingest loop: transport closed, exiting");
                // Release: publishes so far are visible to whoever sees the flag drop
                is_running.store(false, Ordering::Release);
                break;
            },
            Err(e) => {
                error!("ingest loop: transport read error: {e}");
                is_running.store(false, Ordering::Release);
                break;
            },
        };

        ctx.metrics.lines_total.fetch_add(1, Ordering::Relaxed);

        if let Some(stop) = config.stop_byte
            && line.as_str().as_bytes().first() == Some(&stop)
        {
            info!("ingest loop: in-band stop byte received, exiting");
            is_running.store(false, Ordering::Release);
            break;
        }

        match decode_line(line.as_str()) {
            Ok(orientation) => {
                ctx.orientation.publish(orientation);
                ctx.metrics.publishes.fetch_add(1, Ordering::Relaxed);
            },
            Err(reason) => {
                // 静默丢弃：下一行自然取代这一行，旧样本保持不变
                trace!(%reason, line = line.as_str(), "dropping undecodable line");
                ctx.metrics.decode_failures.fetch_add(1, Ordering::Relaxed);
            },
        }
    }

    trace!("ingest loop exited");
}
