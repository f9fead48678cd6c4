//! Viewer 配置
//!
//! TOML 配置文件 + CLI 覆盖。所有字段都有默认值，缺省的配置节按
//! 设备出厂设置填充。
//!
//! ```toml
//! [serial]
//! baud = 38400
//! flow = "hardware"
//! read_timeout_ms = 200
//!
//! [display]
//! rate_hz = 60.0
//! axis_map = { x = "x", y = "y", z = "z" }
//!
//! [ingest]
//! stop_char = "z"
//! ```

use crate::pose::AxisMap;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tilt_driver::IngestConfig;
use tilt_serial::{FlowControl, SerialConfig};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub serial: SerialSection,
    pub display: DisplaySection,
    pub ingest: IngestSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSection {
    /// 波特率（bps）
    pub baud: u32,
    /// 流控方式
    pub flow: FlowSetting,
    /// 单次读的阻塞上限（毫秒）——也是停止标志的响应粒度
    pub read_timeout_ms: u64,
}

impl Default for SerialSection {
    fn default() -> Self {
        let base = SerialConfig::default();
        Self {
            baud: base.baud,
            flow: FlowSetting::Hardware,
            read_timeout_ms: base.read_timeout.as_millis() as u64,
        }
    }
}

/// 流控设置（配置文件里的小写字符串）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowSetting {
    None,
    Software,
    Hardware,
}

impl From<FlowSetting> for FlowControl {
    fn from(value: FlowSetting) -> Self {
        match value {
            FlowSetting::None => FlowControl::None,
            FlowSetting::Software => FlowControl::Software,
            FlowSetting::Hardware => FlowControl::Hardware,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySection {
    /// 展示刷新率（Hz），与遥测到达率解耦
    pub rate_hz: f64,
    /// 传感器系到渲染世界系的轴映射
    pub axis_map: AxisMap,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            rate_hz: 60.0,
            axis_map: AxisMap::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestSection {
    /// 带内停止字符；空字符串关闭该行为
    pub stop_char: String,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            stop_char: "z".to_string(),
        }
    }
}

impl ViewerConfig {
    /// 从 TOML 文件加载
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("cannot parse config file {}", path.display()))
    }

    /// 串口打开参数
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            baud: self.serial.baud,
            flow: self.serial.flow.into(),
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
        }
    }

    /// 摄取循环参数
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            stop_byte: self.ingest.stop_char.bytes().next(),
        }
    }
}
