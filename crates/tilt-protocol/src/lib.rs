//! # Tilt Protocol
//!
//! IMU 姿态遥测的行协议定义（无 I/O、无共享状态）
//!
//! ## 模块
//!
//! - `orientation`: 姿态样本类型定义
//! - `line`: 遥测文本行解码
//!
//! ## 行文法
//!
//! 设备以换行结尾的 ASCII 文本行上报姿态，存在两代互不兼容的文法：
//!
//! ```text
//! w = %f x = %f y = %f z = %f        # 四元数遥测（当前固件）
//! Ang.x = %d<ws>Ang.y = %d           # 双轴倾角遥测（旧固件）
//! ```
//!
//! 解码器按序尝试：先四元数，再旧倾角格式。文法中的空白按 scanf 语义
//! 匹配零个或多个输入空白字符，数值转换前跳过前导空白。

pub mod line;
pub mod orientation;

pub use line::decode_line;
pub use orientation::Orientation;

use thiserror::Error;

/// 单帧（一行）的最大字节数
///
/// 超长行在解码前被截断到该上限，不做无界读取。
pub const MAX_FRAME_LEN: usize = 1024;

/// 行解码错误类型
///
/// 任何失败都不会产生部分填充的 [`Orientation`]。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// 行首不匹配任何已知文法
    #[error("line matches no known telemetry format")]
    UnknownFormat,

    /// 文法前缀匹配，但在读满必需字段前行已结束
    #[error("line ended before all required fields were read")]
    Incomplete,

    /// 必需字段存在但不是合法的有限数值（含空行）
    #[error("malformed field in telemetry line")]
    Malformed,
}

/// 一条已成帧的遥测行
///
/// 由传输层从原始字节流切分而来：行终止符已剥离，长度不超过
/// [`MAX_FRAME_LEN`]，非 UTF-8 字节以替换字符代替（解码时自然失败）。
/// 生命周期：成帧后立即交给解码器，解码尝试（无论成败）后丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine(String);

impl RawLine {
    /// 从原始字节构造一条行帧
    ///
    /// 剥离尾部的 `\n` / `\r\n`，并截断到 [`MAX_FRAME_LEN`] 字节。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut end = bytes.len();
        if end > 0 && bytes[end - 1] == b'\n' {
            end -= 1;
        }
        if end > 0 && bytes[end - 1] == b'\r' {
            end -= 1;
        }
        let capped = end.min(MAX_FRAME_LEN);
        RawLine(String::from_utf8_lossy(&bytes[..capped]).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for RawLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_line_strips_terminator() {
        assert_eq!(RawLine::from_bytes(b"abc\n").as_str(), "abc");
        assert_eq!(RawLine::from_bytes(b"abc\r\n").as_str(), "abc");
        assert_eq!(RawLine::from_bytes(b"abc").as_str(), "abc");
    }

    #[test]
    fn raw_line_empty() {
        assert!(RawLine::from_bytes(b"\n").is_empty());
        assert!(RawLine::from_bytes(b"").is_empty());
    }

    #[test]
    fn raw_line_caps_frame_length() {
        let long = vec![b'a'; MAX_FRAME_LEN + 200];
        let line = RawLine::from_bytes(&long);
        assert_eq!(line.as_str().len(), MAX_FRAME_LEN);
    }

    #[test]
    fn raw_line_lossy_utf8() {
        // 串口噪声可能夹带非 UTF-8 字节，成帧不失败，解码时丢弃
        let line = RawLine::from_bytes(&[0xFF, 0xFE, b'x', b'\n']);
        assert!(!line.is_empty());
        assert!(decode_line(line.as_str()).is_err());
    }
}
