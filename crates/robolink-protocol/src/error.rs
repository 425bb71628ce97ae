//! 协议层错误类型定义

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 负载长度超出允许范围（编码时超出 i32，解码时超出配置上限）
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// 长度前缀为负数
    #[error("Negative frame length: {0}")]
    NegativeLength(i32),

    /// 帧在长度前缀声明的字节数之前结束
    #[error("Truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// 负载不是合法的 UTF-8
    #[error("Invalid UTF-8 payload: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// 空负载（无命令关键字）
    #[error("Empty command")]
    EmptyCommand,

    /// 未知命令关键字
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    /// 控制值无法解析或超出 [-100, 100]
    #[error("Invalid control value: {0:?}")]
    InvalidControlValue(String),

    /// `exit` 命令携带了多余参数
    #[error("Unexpected arguments for {command}: {args:?}")]
    UnexpectedArguments { command: &'static str, args: String },

    /// 未知控制轴名称
    #[error("Unknown axis: {0:?}")]
    UnknownAxis(String),

    /// 底层读取错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::ProtocolError;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::PayloadTooLarge { len: 10, max: 4 };
        assert_eq!(err.to_string(), "Payload too large: 10 bytes (max 4)");

        let err = ProtocolError::NegativeLength(-3);
        assert_eq!(err.to_string(), "Negative frame length: -3");

        let err = ProtocolError::Truncated {
            expected: 8,
            actual: 2,
        };
        assert!(err.to_string().contains("expected 8"));

        let err = ProtocolError::UnknownCommand("move".to_string());
        assert_eq!(err.to_string(), "Unknown command: \"move\"");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: ProtocolError = io.into();
        assert!(matches!(err, ProtocolError::Io(_)));
    }
}
