//! 行成帧
//!
//! 在任意字节流之上切分换行终止的帧，并落实 1024 字节的帧上限。

use crate::{LineTransport, TransportError};
use std::io::{self, Read};
use tilt_protocol::{MAX_FRAME_LEN, RawLine};
use tracing::trace;

/// 每次底层 `read` 的块大小
const READ_CHUNK: usize = 256;

/// 把 `io::Read` 字节流切分成行帧
///
/// 累积字节直到遇到 `\n` 或缓冲达到 [`MAX_FRAME_LEN`]。超限的行被截断为
/// 一帧返回，超出部分留在缓冲里，会作为后续"行"产出并在解码时被丢弃
/// （与旧实现按读块处理超长行的行为一致）。
///
/// 读超时不丢数据：已累积的半行保留在缓冲中，下次调用继续拼接。
pub struct LineFramer<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: Read> LineFramer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// 取回底层读取器
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn next_line(&mut self) -> Result<RawLine, TransportError> {
        loop {
            // 缓冲里已有完整行
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buf.drain(..=pos).collect();
                return Ok(RawLine::from_bytes(&line));
            }

            // 无换行但已到帧上限：截断成帧，余量留在缓冲
            if self.buf.len() >= MAX_FRAME_LEN {
                trace!(len = self.buf.len(), "frame cap hit, truncating line");
                let frame: Vec<u8> = self.buf.drain(..MAX_FRAME_LEN).collect();
                return Ok(RawLine::from_bytes(&frame));
            }

            let mut chunk = [0u8; READ_CHUNK];
            match self.inner.read(&mut chunk) {
                // 零长度读：对端关闭。缓冲中未终止的半行一并作废
                Ok(0) => return Err(TransportError::Eof),
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) =>
                {
                    return Err(TransportError::Timeout);
                },
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }
}

impl<R: Read> LineTransport for LineFramer<R> {
    fn read_line(&mut self) -> Result<RawLine, TransportError> {
        self.next_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// 按脚本逐块产出字节的读取器（模拟串口的分片到达）
    struct ScriptedReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                },
                Some(Err(e)) => Err(e),
                None => Ok(0), // 脚本耗尽 == EOF
            }
        }
    }

    #[test]
    fn splits_lines_from_single_chunk() {
        let mut framer = LineFramer::new(Cursor::new(b"first\nsecond\n".to_vec()));
        assert_eq!(framer.read_line().unwrap().as_str(), "first");
        assert_eq!(framer.read_line().unwrap().as_str(), "second");
        assert!(matches!(framer.read_line(), Err(TransportError::Eof)));
    }

    #[test]
    fn reassembles_line_split_across_reads() {
        let mut framer = LineFramer::new(ScriptedReader::new(vec![
            Ok(b"w = 1.0 x".to_vec()),
            Ok(b" = 0.0 y = 0.0".to_vec()),
            Ok(b" z = 0.0\n".to_vec()),
        ]));
        assert_eq!(
            framer.read_line().unwrap().as_str(),
            "w = 1.0 x = 0.0 y = 0.0 z = 0.0"
        );
    }

    #[test]
    fn strips_crlf() {
        let mut framer = LineFramer::new(Cursor::new(b"abc\r\ndef\n".to_vec()));
        assert_eq!(framer.read_line().unwrap().as_str(), "abc");
        assert_eq!(framer.read_line().unwrap().as_str(), "def");
    }

    #[test]
    fn timeout_preserves_partial_line() {
        let timeout = || io::Error::new(io::ErrorKind::TimedOut, "timed out");
        let mut framer = LineFramer::new(ScriptedReader::new(vec![
            Ok(b"Ang.x = 3".to_vec()),
            Err(timeout()),
            Ok(b"0\t\tAng.y = -15\n".to_vec()),
        ]));
        assert!(matches!(framer.read_line(), Err(TransportError::Timeout)));
        assert_eq!(
            framer.read_line().unwrap().as_str(),
            "Ang.x = 30\t\tAng.y = -15"
        );
    }

    #[test]
    fn truncates_overlong_line_at_frame_cap() {
        let mut bytes = vec![b'a'; MAX_FRAME_LEN + 100];
        bytes.push(b'\n');
        let mut framer = LineFramer::new(Cursor::new(bytes));

        let frame = framer.read_line().unwrap();
        assert_eq!(frame.as_str().len(), MAX_FRAME_LEN);

        // 余量作为独立的一"行"产出（解码阶段会把它丢弃）
        let rest = framer.read_line().unwrap();
        assert_eq!(rest.as_str().len(), 100);
    }

    #[test]
    fn eof_discards_unterminated_tail() {
        let mut framer = LineFramer::new(Cursor::new(b"complete\npartial".to_vec()));
        assert_eq!(framer.read_line().unwrap().as_str(), "complete");
        assert!(matches!(framer.read_line(), Err(TransportError::Eof)));
    }

    #[test]
    fn empty_lines_are_framed() {
        // 空行也是帧，丢弃与否由解码侧决定
        let mut framer = LineFramer::new(Cursor::new(b"\n\nx\n".to_vec()));
        assert!(framer.read_line().unwrap().is_empty());
        assert!(framer.read_line().unwrap().is_empty());
        assert_eq!(framer.read_line().unwrap().as_str(), "x");
    }
}
