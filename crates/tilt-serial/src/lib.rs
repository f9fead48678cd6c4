//! # Tilt Serial Transport Layer
//!
//! 传输抽象层：向上提供"按行读取遥测文本"的统一接口。
//!
//! 上层（摄取循环）只依赖 [`LineTransport`] trait，不关心行从哪里来；
//! 本 crate 同时提供两块实现件：
//!
//! - [`framing::LineFramer`]：在任意 `io::Read` 之上做行切分与 1024 字节
//!   帧上限（可单测，不需要硬件）；
//! - [`serial::SerialLineTransport`]：基于 `serialport` 的字符设备后端，
//!   负责打开/配置串口（波特率、流控、读超时）。

pub mod framing;
pub mod serial;

pub use framing::LineFramer;
pub use serial::{SerialConfig, SerialLineTransport};

// 重新导出帧类型与流控枚举，调用方不必直接依赖 tilt-protocol / serialport
pub use serialport::FlowControl;
pub use tilt_protocol::RawLine;

use thiserror::Error;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    /// 打开设备失败（进程边界上的致命错误）
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// 读超时：正常情况，调用方重试（并借机检查停止标志）
    #[error("read timeout")]
    Timeout,

    /// 零长度读：传输端已关闭，对摄取循环是终止条件
    #[error("transport closed (EOF)")]
    Eof,

    /// 其他 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 行传输接口
///
/// 实现者提供阻塞式（或带超时的）按行读取。会话期间传输句柄由
/// 摄取循环独占持有。
pub trait LineTransport {
    /// 读取下一条完整的行帧
    ///
    /// - `Ok(line)`：一条已剥离终止符、不超过帧上限的行；
    /// - `Err(Timeout)`：本次等待内没有凑出完整行，可安全重试；
    /// - `Err(Eof)`：对端关闭，之后的调用不会再产出数据；
    /// - 其他错误：设备故障。
    fn read_line(&mut self) -> Result<RawLine, TransportError>;
}
