//! 客户端层错误类型定义

use robolink_protocol::ProtocolError;
use std::io;
use thiserror::Error;

/// 客户端层错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 无法连接到控制服务（拒绝连接、不可达、超时、地址解析失败）
    #[error("Could not connect to server at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// 端点格式无效（应为 `host:port`）
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// 配置无效
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// 协议错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 心跳因发送失败而停止（`SendFailurePolicy::Stop`）
    #[error("Heartbeat stopped after send failure on tick {tick}: {source}")]
    HeartbeatFailed {
        tick: u64,
        #[source]
        source: io::Error,
    },

    /// 心跳线程 panic
    #[error("Heartbeat thread panicked")]
    HeartbeatPanicked,

    /// 心跳线程创建失败
    #[error("Failed to spawn heartbeat thread: {0}")]
    Spawn(#[source] io::Error),
}

/// 客户端层 Result 别名
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// 是否为连接阶段错误
    pub fn is_connect_error(&self) -> bool {
        matches!(self, ClientError::Connect { .. })
    }
}
