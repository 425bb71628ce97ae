//! 长度前缀帧编码/解码
//!
//! 每帧由 4 字节 little-endian `i32` 长度和紧随其后的 UTF-8 负载组成。
//! 编码端总是把长度和负载写入**同一个**缓冲区，调用方用一次 `write_all`
//! 发出整帧，线上不会出现只有长度没有负载的半帧。

use crate::constants::{DEFAULT_MAX_PAYLOAD_LEN, LENGTH_PREFIX_LEN};
use crate::error::ProtocolError;
use bytes::{Buf, BufMut, BytesMut};
use std::io::{self, Read};

/// 编码一帧
///
/// # 错误
/// - `ProtocolError::PayloadTooLarge`: 负载长度超出 `i32::MAX`
pub fn encode_frame(payload: &str) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    encode_frame_into(payload, &mut buf)?;
    Ok(buf.to_vec())
}

/// 编码一帧并追加到 `buf`
pub fn encode_frame_into(payload: &str, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    let len = i32::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLarge {
        len: payload.len(),
        max: i32::MAX as usize,
    })?;

    buf.reserve(LENGTH_PREFIX_LEN + payload.len());
    buf.put_i32_le(len);
    buf.put_slice(payload.as_bytes());
    Ok(())
}

/// 从切片头部解码一帧
///
/// # 返回
/// - `Ok(Some((payload, consumed)))`: 完整帧及其占用的字节数
/// - `Ok(None)`: 数据不足一帧
pub fn decode_frame(buf: &[u8]) -> Result<Option<(String, usize)>, ProtocolError> {
    let Some(len) = peek_length(buf)? else {
        return Ok(None);
    };
    let total = LENGTH_PREFIX_LEN + len;
    if buf.len() < total {
        return Ok(None);
    }
    let payload = String::from_utf8(buf[LENGTH_PREFIX_LEN..total].to_vec())?;
    Ok(Some((payload, total)))
}

fn peek_length(buf: &[u8]) -> Result<Option<usize>, ProtocolError> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Ok(None);
    }
    let raw = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if raw < 0 {
        return Err(ProtocolError::NegativeLength(raw));
    }
    Ok(Some(raw as usize))
}

// ============================================================================
// 增量解码器
// ============================================================================

/// 增量帧解码器
///
/// 适用于从非阻塞 socket 或任意分片的字节流中还原帧。出错后流处于未知
/// 位置，调用方应丢弃该连接。
///
/// ```rust
/// use robolink_protocol::{FrameDecoder, encode_frame};
///
/// let frame = encode_frame("control 1 2").unwrap();
/// let mut decoder = FrameDecoder::new();
/// decoder.extend(&frame[..3]);
/// assert!(decoder.next_frame().unwrap().is_none());
/// decoder.extend(&frame[3..]);
/// assert_eq!(decoder.next_frame().unwrap().as_deref(), Some("control 1 2"));
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    max_payload_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// 创建解码器（负载上限 `DEFAULT_MAX_PAYLOAD_LEN`）
    pub fn new() -> Self {
        Self::with_max_payload_len(DEFAULT_MAX_PAYLOAD_LEN)
    }

    /// 创建指定负载上限的解码器
    pub fn with_max_payload_len(max_payload_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            max_payload_len,
        }
    }

    /// 追加收到的字节
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// 取出下一帧（数据不足时返回 `Ok(None)`）
    pub fn next_frame(&mut self) -> Result<Option<String>, ProtocolError> {
        let Some(len) = peek_length(&self.buf)? else {
            return Ok(None);
        };
        if len > self.max_payload_len {
            return Err(ProtocolError::PayloadTooLarge {
                len,
                max: self.max_payload_len,
            });
        }
        if self.buf.len() < LENGTH_PREFIX_LEN + len {
            return Ok(None);
        }

        self.buf.advance(LENGTH_PREFIX_LEN);
        let payload = self.buf.split_to(len);
        Ok(Some(String::from_utf8(payload.to_vec())?))
    }

    /// 尚未组成完整帧的缓冲字节数
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}

// ============================================================================
// 阻塞读取
// ============================================================================

/// 从阻塞读取端读取一帧
///
/// # 返回
/// - `Ok(Some(payload))`: 完整帧
/// - `Ok(None)`: 对端在帧边界处关闭连接
///
/// # 错误
/// - `ProtocolError::Truncated`: 对端在帧中间关闭连接
/// - `ProtocolError::PayloadTooLarge`: 长度超出 `max_payload_len`
/// - `ProtocolError::Io`: 读取失败（包括读超时）
pub fn read_frame<R: Read>(
    reader: &mut R,
    max_payload_len: usize,
) -> Result<Option<String>, ProtocolError> {
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let filled = fill(reader, &mut prefix)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < LENGTH_PREFIX_LEN {
        return Err(ProtocolError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            actual: filled,
        });
    }

    let raw = i32::from_le_bytes(prefix);
    if raw < 0 {
        return Err(ProtocolError::NegativeLength(raw));
    }
    let len = raw as usize;
    if len > max_payload_len {
        return Err(ProtocolError::PayloadTooLarge {
            len,
            max: max_payload_len,
        });
    }

    let mut payload = vec![0u8; len];
    let filled = fill(reader, &mut payload)?;
    if filled < len {
        return Err(ProtocolError::Truncated {
            expected: len,
            actual: filled,
        });
    }
    Ok(Some(String::from_utf8(payload)?))
}

/// 尽量填满 `buf`，返回实际读取的字节数（遇到 EOF 提前返回）
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_layout() {
        let frame = encode_frame("exit").unwrap();
        assert_eq!(frame, [4, 0, 0, 0, b'e', b'x', b'i', b't']);
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = encode_frame("").unwrap();
        assert_eq!(frame, [0, 0, 0, 0]);
        let (payload, consumed) = decode_frame(&frame).unwrap().unwrap();
        assert_eq!(payload, "");
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_encode_into_appends() {
        let mut buf = BytesMut::new();
        encode_frame_into("a", &mut buf).unwrap();
        encode_frame_into("bc", &mut buf).unwrap();
        assert_eq!(buf.len(), 4 + 1 + 4 + 2);
    }

    #[test]
    fn test_decode_incomplete() {
        let frame = encode_frame("control 1 2").unwrap();
        assert!(decode_frame(&frame[..2]).unwrap().is_none());
        assert!(decode_frame(&frame[..frame.len() - 1]).unwrap().is_none());
    }

    #[test]
    fn test_decode_negative_length() {
        let buf = (-1i32).to_le_bytes();
        assert!(matches!(
            decode_frame(&buf),
            Err(ProtocolError::NegativeLength(-1))
        ));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let mut buf = 2i32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(decode_frame(&buf), Err(ProtocolError::InvalidUtf8(_))));
    }

    #[test]
    fn test_decoder_multiple_frames_in_one_chunk() {
        let mut data = encode_frame("control 1 2").unwrap();
        data.extend(encode_frame("exit").unwrap());

        let mut decoder = FrameDecoder::new();
        decoder.extend(&data);
        assert_eq!(decoder.next_frame().unwrap().as_deref(), Some("control 1 2"));
        assert_eq!(decoder.next_frame().unwrap().as_deref(), Some("exit"));
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn test_decoder_byte_by_byte() {
        let data = encode_frame("control 50 -100").unwrap();
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        for b in &data {
            decoder.extend(std::slice::from_ref(b));
            if let Some(frame) = decoder.next_frame().unwrap() {
                out.push(frame);
            }
        }
        assert_eq!(out, vec!["control 50 -100".to_string()]);
    }

    #[test]
    fn test_decoder_rejects_oversized() {
        let data = encode_frame("0123456789").unwrap();
        let mut decoder = FrameDecoder::with_max_payload_len(4);
        decoder.extend(&data);
        assert!(matches!(
            decoder.next_frame(),
            Err(ProtocolError::PayloadTooLarge { len: 10, max: 4 })
        ));
    }

    #[test]
    fn test_read_frame_sequence_then_eof() {
        let mut data = encode_frame("control 0 0").unwrap();
        data.extend(encode_frame("exit").unwrap());
        let mut cursor = Cursor::new(data);

        assert_eq!(
            read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD_LEN).unwrap().as_deref(),
            Some("control 0 0")
        );
        assert_eq!(
            read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD_LEN).unwrap().as_deref(),
            Some("exit")
        );
        assert!(read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD_LEN).unwrap().is_none());
    }

    #[test]
    fn test_read_frame_truncated_prefix() {
        let mut cursor = Cursor::new(vec![5u8, 0]);
        assert!(matches!(
            read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD_LEN),
            Err(ProtocolError::Truncated {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_read_frame_truncated_payload() {
        let mut data = encode_frame("control 10 10").unwrap();
        data.truncate(data.len() - 3);
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD_LEN),
            Err(ProtocolError::Truncated { expected: 13, .. })
        ));
    }
}
