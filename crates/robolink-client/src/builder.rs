//! Builder 模式实现
//!
//! 提供链式构造 `RobotLinkClient` 实例的便捷方式。

use crate::client::RobotLinkClient;
use crate::config::{ClientConfig, Endpoint, SendFailurePolicy};
use crate::error::ClientError;
use crate::transport::LinkTransport;
use robolink_protocol::Axis;
use std::time::Duration;

/// RobotLink Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use robolink_client::{Axis, RobotLinkBuilder, SendFailurePolicy};
/// use std::time::Duration;
///
/// // 使用默认配置（192.168.2.1:7860，100ms 心跳）
/// let client = RobotLinkBuilder::new().connect().unwrap();
///
/// // 自定义端点、心跳周期和轴集合
/// let client = RobotLinkBuilder::new()
///     .endpoint("127.0.0.1", 7860)
///     .timeout(Duration::from_secs(2))
///     .heartbeat_interval(Duration::from_millis(50))
///     .axes([Axis::ChassisForward, Axis::ChassisYaw, Axis::GimbalYaw])
///     .on_send_failure(SendFailurePolicy::Continue)
///     .connect()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RobotLinkBuilder {
    config: ClientConfig,
}

impl RobotLinkBuilder {
    /// 创建新的 Builder（默认配置）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有配置创建
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// 设置端点
    pub fn endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.endpoint = Endpoint::new(host, port);
        self
    }

    /// 设置连接及读写超时
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 设置心跳间隔（毫秒精度）
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval_ms = interval.as_millis() as u64;
        self
    }

    /// 设置线序（轴集合）
    pub fn axes(mut self, axes: impl IntoIterator<Item = Axis>) -> Self {
        self.config.axes = axes.into_iter().collect();
        self
    }

    /// 是否记录每条发送的命令
    pub fn log_commands(mut self, enabled: bool) -> Self {
        self.config.log_commands = enabled;
        self
    }

    /// 设置发送失败策略
    pub fn on_send_failure(mut self, policy: SendFailurePolicy) -> Self {
        self.config.on_send_failure = policy;
        self
    }

    /// 设置失败事件通道容量
    pub fn failure_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.failure_channel_capacity = capacity;
        self
    }

    /// 当前配置
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 连接并启动心跳
    ///
    /// # Errors
    /// - `ClientError::InvalidConfig`: 配置无效
    /// - `ClientError::Connect`: 无法连接到控制服务
    pub fn connect(self) -> Result<RobotLinkClient, ClientError> {
        RobotLinkClient::connect(self.config)
    }

    /// 在给定传输层上启动客户端（不建立 TCP 连接）
    pub fn with_transport(
        self,
        transport: impl LinkTransport + 'static,
    ) -> Result<RobotLinkClient, ClientError> {
        RobotLinkClient::with_transport(self.config, Box::new(transport))
    }

    /// 作用域用法：见 [`RobotLinkClient::scoped`]
    pub fn scoped<R>(self, f: impl FnOnce(&RobotLinkClient) -> R) -> Result<R, ClientError> {
        RobotLinkClient::scoped(self.config, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = RobotLinkBuilder::new();
        assert_eq!(builder.config(), &ClientConfig::default());
    }

    #[test]
    fn test_builder_chain() {
        let builder = RobotLinkBuilder::new()
            .endpoint("127.0.0.1", 9000)
            .timeout(Duration::from_millis(1500))
            .heartbeat_interval(Duration::from_millis(20))
            .axes([Axis::GimbalYaw])
            .log_commands(false)
            .on_send_failure(SendFailurePolicy::Continue)
            .failure_channel_capacity(2);

        let config = builder.config();
        assert_eq!(config.endpoint, Endpoint::new("127.0.0.1", 9000));
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.heartbeat_interval_ms, 20);
        assert_eq!(config.axes, vec![Axis::GimbalYaw]);
        assert!(!config.log_commands);
        assert_eq!(config.on_send_failure, SendFailurePolicy::Continue);
        assert_eq!(config.failure_channel_capacity, 2);
    }

    #[test]
    fn test_builder_rejects_invalid_config_before_connecting() {
        let err = RobotLinkBuilder::new()
            .endpoint("127.0.0.1", 1)
            .heartbeat_interval(Duration::from_micros(500))
            .connect()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }
}
