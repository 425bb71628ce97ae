//! 客户端配置
//!
//! 心跳周期和轴集合都是配置项，而非硬编码常量。

use crate::error::ClientError;
use robolink_protocol::{
    Axis, DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_MS,
};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 控制服务端点
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            // IPv6 字面量
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ClientError;

    /// 解析 `host:port` 或 `[v6addr]:port`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::InvalidEndpoint(s.to_string());
        let (host, port) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self::new(host, port))
    }
}

/// 心跳发送失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SendFailurePolicy {
    /// 停止心跳线程，错误由下一次 `terminate()` 返回（默认）
    #[default]
    Stop,
    /// 记录并发布失败，继续按周期发送
    Continue,
}

impl FromStr for SendFailurePolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(SendFailurePolicy::Stop),
            "continue" => Ok(SendFailurePolicy::Continue),
            other => Err(ClientError::InvalidConfig(format!(
                "unknown send failure policy {:?} (expected \"stop\" or \"continue\")",
                other
            ))),
        }
    }
}

/// 客户端配置
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// 控制服务端点（默认 `192.168.2.1:7860`）
    pub endpoint: Endpoint,
    /// 连接超时及 socket 读写超时（毫秒）
    pub timeout_ms: u64,
    /// 心跳间隔（毫秒）
    pub heartbeat_interval_ms: u64,
    /// 线序：每个心跳命令按此顺序携带各轴控制值
    pub axes: Vec<Axis>,
    /// 是否以 `debug` 级别记录每条发送的命令
    pub log_commands: bool,
    /// 发送失败策略
    pub on_send_failure: SendFailurePolicy,
    /// 失败事件通道容量（满时丢弃新事件，计数仍然累加）
    pub failure_channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            axes: Axis::DEFAULT_ORDER.to_vec(),
            log_commands: true,
            on_send_failure: SendFailurePolicy::Stop,
            failure_channel_capacity: 16,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// 检查配置是否合法
    ///
    /// # 错误
    /// - `ClientError::InvalidConfig`: 轴集合为空或重复、间隔/超时为 0
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.axes.is_empty() {
            return Err(ClientError::InvalidConfig(
                "axis set must not be empty".to_string(),
            ));
        }
        for (i, axis) in self.axes.iter().enumerate() {
            if self.axes[..i].contains(axis) {
                return Err(ClientError::InvalidConfig(format!(
                    "axis {} listed more than once",
                    axis
                )));
            }
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "heartbeat interval must be at least 1 ms".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout must be at least 1 ms".to_string(),
            ));
        }
        if self.endpoint.host.is_empty() {
            return Err(ClientError::InvalidEndpoint(self.endpoint.to_string()));
        }
        Ok(())
    }
}
