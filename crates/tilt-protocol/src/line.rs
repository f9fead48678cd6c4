//! 遥测文本行解码
//!
//! 把一条已成帧的文本行解析为 [`Orientation`]，解码确定且无副作用：
//! 相同输入永远得到相同输出。按序尝试两代文法（先四元数，后旧倾角），
//! 行首的标签字面量互不重叠（`w =` 对 `Ang.x =`），格式判别由行首完成，
//! 不存在畸形四元数行被误判为旧格式的空间。

use crate::{DecodeError, MAX_FRAME_LEN, Orientation};

/// 解码一条遥测行
///
/// 按序尝试：
///
/// 1. 四元数文法 `"w = %f x = %f y = %f z = %f"` —— 四个字段都必须是
///    有限浮点数，成功时逐 token 精确保留解析值；
/// 2. 旧倾角文法 `"Ang.x = %d <ws> Ang.y = %d"` —— 恰好两个整数字段。
///
/// 匹配满所需字段后，行尾剩余字节被忽略（scanf 语义）。超过
/// [`MAX_FRAME_LEN`] 的输入先截断再解码。空行按 [`DecodeError::Malformed`]
/// 处理。任何失败都不产出部分样本。
///
/// # Example
///
/// ```
/// use tilt_protocol::{decode_line, Orientation};
///
/// let o = decode_line("w = 1.0 x = 0.0 y = 0.0 z = 0.0").unwrap();
/// assert!(o.is_identity());
///
/// let o = decode_line("Ang.x = 30\t\tAng.y = -15").unwrap();
/// assert_eq!(o, Orientation::TiltDeg { x: 30, y: -15 });
/// ```
pub fn decode_line(line: &str) -> Result<Orientation, DecodeError> {
    let line = truncate_frame(line);

    if line.trim().is_empty() {
        return Err(DecodeError::Malformed);
    }

    match scan_quaternion(line) {
        // 行首不是四元数文法，再试旧格式
        Err(DecodeError::UnknownFormat) => scan_tilt_pair(line),
        other => other,
    }
}

/// 截断到帧上限（保持 UTF-8 边界）
fn truncate_frame(line: &str) -> &str {
    if line.len() <= MAX_FRAME_LEN {
        return line;
    }
    let mut end = MAX_FRAME_LEN;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

fn scan_quaternion(line: &str) -> Result<Orientation, DecodeError> {
    let mut s = Scanner::new(line);

    // 行首判别：必须以 `w =` 引导，否则交给下一个文法
    if !s.literal("w") || !s.literal("=") {
        return Err(DecodeError::UnknownFormat);
    }
    let w = s.float()?;
    s.expect("x")?;
    s.expect("=")?;
    let x = s.float()?;
    s.expect("y")?;
    s.expect("=")?;
    let y = s.float()?;
    s.expect("z")?;
    s.expect("=")?;
    let z = s.float()?;

    Ok(Orientation::Quaternion { w, x, y, z })
}

fn scan_tilt_pair(line: &str) -> Result<Orientation, DecodeError> {
    let mut s = Scanner::new(line);

    if !s.literal("Ang.x") || !s.literal("=") {
        return Err(DecodeError::UnknownFormat);
    }
    let x = s.int()?;
    s.expect("Ang.y")?;
    s.expect("=")?;
    let y = s.int()?;

    Ok(Orientation::TiltDeg { x, y })
}

/// scanf 风格的行扫描器
///
/// 字面量前的空白匹配零个或多个输入空白字符；数值转换跳过前导空白。
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Scanner { rest: line }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// 跳过可选空白后尝试匹配字面量，不匹配时不消耗输入
    fn literal(&mut self, lit: &str) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(lit) {
            Some(rest) => {
                self.rest = rest;
                true
            },
            None => false,
        }
    }

    /// 字段间的必需字面量：行尾缺失算 `Incomplete`，否则算 `Malformed`
    fn expect(&mut self, lit: &str) -> Result<(), DecodeError> {
        if self.literal(lit) {
            Ok(())
        } else if self.rest.is_empty() {
            Err(DecodeError::Incomplete)
        } else {
            Err(DecodeError::Malformed)
        }
    }

    /// 读取一个有限浮点数字段
    ///
    /// `inf` / `nan` 以及上溢出的数值统一按 `Malformed` 处理：
    /// 线协议只承载有限读数。
    fn float(&mut self) -> Result<f64, DecodeError> {
        let token = self.number_token(true)?;
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(DecodeError::Malformed),
        }
    }

    /// 读取一个 i32 字段（超出范围按 `Malformed` 处理）
    fn int(&mut self) -> Result<i32, DecodeError> {
        let token = self.number_token(false)?;
        token.parse::<i32>().map_err(|_| DecodeError::Malformed)
    }

    /// 切出一个数值 token：`[+-]? digits [. digits]? ([eE][+-]? digits)?`
    ///
    /// 行尾无 token 算 `Incomplete`；token 不含任何数字算 `Malformed`。
    fn number_token(&mut self, float: bool) -> Result<&'a str, DecodeError> {
        self.skip_ws();
        if self.rest.is_empty() {
            return Err(DecodeError::Incomplete);
        }

        let bytes = self.rest.as_bytes();
        let mut i = 0;
        if bytes[i] == b'+' || bytes[i] == b'-' {
            i += 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if float {
            if i < bytes.len() && bytes[i] == b'.' {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            // 指数部分必须带至少一位数字，否则不消耗 `e`
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                let exp_digits = j;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > exp_digits {
                    i = j;
                }
            }
        }

        let token = &self.rest[..i];
        if !token.bytes().any(|b| b.is_ascii_digit()) {
            return Err(DecodeError::Malformed);
        }
        self.rest = &self.rest[i..];
        Ok(token)
    }
}
