//! 驱动层错误类型定义

use std::time::Duration;
use thiserror::Error;
use tilt_serial::TransportError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// 摄取线程在限时内未退出（或 panic）
    #[error("ingest thread failed to stop within {0:?}")]
    JoinFailed(Duration),
}
