//! 串口后端
//!
//! 打开并配置字符设备，在其上叠一层行成帧。

use crate::{LineFramer, LineTransport, TransportError};
use serialport::{DataBits, FlowControl, SerialPort};
use std::time::Duration;
use tilt_protocol::RawLine;
use tracing::info;

/// 串口配置
///
/// 默认值对应遥测设备的出厂设置：38400 波特、8 数据位、硬件流控。
/// 读超时决定停止标志的响应粒度——摄取循环只有在一次读返回后才会
/// 重新检查标志，超时不能设为无限。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// 波特率（bps）
    pub baud: u32,
    /// 流控方式
    pub flow: FlowControl,
    /// 单次读的阻塞上限
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: 38_400,
            flow: FlowControl::Hardware,
            read_timeout: Duration::from_millis(200),
        }
    }
}

/// 基于 `serialport` 的行传输实现
///
/// # Example
///
/// ```no_run
/// use tilt_serial::{LineTransport, SerialConfig, SerialLineTransport};
///
/// let mut port = SerialLineTransport::open("/dev/ttyUSB0", &SerialConfig::default())?;
/// let line = port.read_line()?;
/// # Ok::<(), tilt_serial::TransportError>(())
/// ```
pub struct SerialLineTransport {
    framer: LineFramer<Box<dyn SerialPort>>,
}

impl SerialLineTransport {
    /// 打开设备并应用配置
    ///
    /// 失败返回 [`TransportError::Open`]，由进程边界处理（退出码 1）。
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(path, config.baud)
            .data_bits(DataBits::Eight)
            .flow_control(config.flow)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.to_string(),
                source,
            })?;

        info!(
            path,
            baud = config.baud,
            flow = ?config.flow,
            "serial transport opened"
        );

        Ok(Self {
            framer: LineFramer::new(port),
        })
    }
}

impl LineTransport for SerialLineTransport {
    fn read_line(&mut self) -> Result<RawLine, TransportError> {
        self.framer.read_line()
    }
}
