//! 摄取会话生命周期
//!
//! [`Ingestor`] 对外封装摄取线程：持有停止标志与线程句柄，
//! 负责启动顺序（先起摄取线程，消费端再开始节拍）和收尾顺序
//! （先请求停止，再有界 join，保证不留孤儿线程、不在收尾后触碰传输句柄）。

use crate::cell::TelemetryContext;
use crate::error::DriverError;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{IngestConfig, ingest_loop};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tilt_protocol::Orientation;
use tilt_serial::LineTransport;
use tracing::error;

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();

        // 看门狗线程代为 join，主线程在通道上限时等待
        spawn(move || {
            let _ = tx.send(self.join());
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // 超时：看门狗继续挂着，进程退出时由 OS 收尾
                Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "thread join timeout",
                )))
            },
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "thread panicked during join",
            ))),
        }
    }
}

/// Drop 时 join 的限时
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 摄取会话（对外 API）
///
/// # Example
///
/// ```no_run
/// use tilt_driver::{IngestConfig, Ingestor};
/// use tilt_serial::{SerialConfig, SerialLineTransport};
///
/// let port = SerialLineTransport::open("/dev/ttyUSB0", &SerialConfig::default())?;
/// let ingestor = Ingestor::spawn(port, IngestConfig::default());
///
/// // 消费端在自己的节拍上读最新样本
/// let pose = ingestor.snapshot();
/// # Ok::<(), tilt_serial::TransportError>(())
/// ```
pub struct Ingestor {
    ctx: Arc<TelemetryContext>,
    /// 运行标志。清除即请求停止；摄取循环在 EOF/故障时也会自行清除
    is_running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ingestor {
    /// 启动摄取线程
    ///
    /// 传输句柄被移动进线程并独占持有，直到循环退出。
    pub fn spawn(transport: impl LineTransport + Send + 'static, config: IngestConfig) -> Self {
        let ctx = Arc::new(TelemetryContext::new());
        let is_running = Arc::new(AtomicBool::new(true));

        let thread = {
            let ctx = ctx.clone();
            let is_running = is_running.clone();
            spawn(move || ingest_loop(transport, ctx, config, is_running))
        };

        Self {
            ctx,
            is_running,
            thread: Some(thread),
        }
    }

    /// 读取最新姿态（无锁，纳秒级返回）
    ///
    /// 首个有效样本到达前返回单位姿态。
    pub fn snapshot(&self) -> Orientation {
        self.ctx.orientation.snapshot()
    }

    /// 取摄取链路计数器快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// 共享上下文（供需要直接持有状态单元的消费端使用）
    pub fn context(&self) -> Arc<TelemetryContext> {
        self.ctx.clone()
    }

    /// 摄取是否仍在进行
    ///
    /// EOF、设备故障或带内停止都会让它变为 `false`；此时快照仍可读，
    /// 只是不再更新（last-value-hold）。
    pub fn is_running(&self) -> bool {
        // Acquire: pairs with the loop's Release store on exit
        self.is_running.load(Ordering::Acquire)
            && self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 请求协作式停止（不等待）
    ///
    /// 进行中的阻塞读不被打断；循环在本次读返回后观察到标志并退出，
    /// 停机延迟以传输层读超时为界。
    pub fn request_stop(&self) {
        // Release: everything before the request is visible to the exiting loop
        self.is_running.store(false, Ordering::Release);
    }

    /// 停止并等待摄取线程退出
    pub fn shutdown(mut self, timeout: Duration) -> Result<(), DriverError> {
        self.request_stop();
        match self.thread.take() {
            Some(handle) => handle
                .join_timeout(timeout)
                .map_err(|_| DriverError::JoinFailed(timeout)),
            None => Ok(()),
        }
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        self.request_stop();

        if let Some(handle) = self.thread.take()
            && handle.join_timeout(JOIN_TIMEOUT).is_err()
        {
            error!(
                "ingest thread panicked or failed to shut down within {:?}",
                JOIN_TIMEOUT
            );
        }
    }
}
