//! RobotLinkClient - 控制链路客户端
//!
//! 拥有一条连接、一份期望状态和一个心跳线程。
//!
//! # 生命周期
//!
//! ```text
//! connect() ──► 心跳线程启动 ──► set_*() …（任意频率） ──► terminate()
//!                   │                                        │
//!                   └── 每个周期发送一帧 ◄──────────────────┘ 停止 → join → 关闭连接
//! ```
//!
//! `terminate()` 幂等；`Drop` 兜底调用它。

use crate::config::{ClientConfig, Endpoint};
use crate::error::ClientError;
use crate::heartbeat::{
    HeartbeatContext, HeartbeatFailure, HeartbeatManager, HeartbeatStats, HeartbeatStatsSnapshot,
    SharedTransport,
};
use crate::state::DesiredState;
use crate::transport::{LinkTransport, TcpTransport};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use robolink_protocol::{Axis, Command, ControlValue};
use std::sync::Arc;
use tracing::{debug, error, info};

/// 机器人控制链路客户端
///
/// 所有 setter 都接受 `&self`，可以通过 `Arc<RobotLinkClient>` 在多个线程间共享。
pub struct RobotLinkClient {
    config: ClientConfig,
    state: Arc<DesiredState>,
    transport: SharedTransport,
    /// `None` 表示已终止
    heartbeat: Mutex<Option<HeartbeatManager>>,
    stats: Arc<HeartbeatStats>,
    failures: Receiver<HeartbeatFailure>,
    peer: String,
}

impl RobotLinkClient {
    /// 连接到控制服务并启动心跳
    ///
    /// 连接阶段阻塞，以配置的超时为上限；拒绝连接时不重试。
    ///
    /// # Errors
    /// - `ClientError::InvalidConfig`: 配置无效
    /// - `ClientError::Connect`: 无法连接到控制服务
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = TcpTransport::connect(&config.endpoint, config.timeout())?;
        info!(
            "Connected to robot control server at {} (heartbeat {} ms)",
            transport.peer_addr(),
            config.heartbeat_interval_ms
        );
        Self::with_transport(config, Box::new(transport))
    }

    /// 使用默认配置连接（`192.168.2.1:7860`）
    pub fn connect_default() -> Result<Self, ClientError> {
        Self::connect(ClientConfig::default())
    }

    /// 在给定传输层上启动客户端
    pub fn with_transport(
        config: ClientConfig,
        transport: Box<dyn LinkTransport>,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let peer = transport.peer();
        let state = Arc::new(DesiredState::new());
        let transport: SharedTransport = Arc::new(Mutex::new(Some(transport)));
        let stats = Arc::new(HeartbeatStats::new());
        let (failures_tx, failures) =
            crossbeam_channel::bounded(config.failure_channel_capacity);

        let heartbeat = HeartbeatManager::start(HeartbeatContext {
            state: state.clone(),
            transport: transport.clone(),
            axes: config.axes.clone(),
            interval: config.heartbeat_interval(),
            log_commands: config.log_commands,
            policy: config.on_send_failure,
            stats: stats.clone(),
            failures: failures_tx,
        })?;

        Ok(Self {
            config,
            state,
            transport,
            heartbeat: Mutex::new(Some(heartbeat)),
            stats,
            failures,
            peer,
        })
    }

    /// 作用域用法
    ///
    /// 连接、运行 `f`，然后在所有退出路径上终止客户端：正常返回时显式
    /// 调用 `terminate()` 并返回其错误；`f` panic 时由 `Drop` 完成清理。
    ///
    /// ```rust,no_run
    /// use robolink_client::{ClientConfig, Endpoint, RobotLinkClient};
    ///
    /// let config = ClientConfig {
    ///     endpoint: Endpoint::new("127.0.0.1", 7860),
    ///     ..Default::default()
    /// };
    /// RobotLinkClient::scoped(config, |client| {
    ///     client.set_chassis_fwd(0.3);
    ///     std::thread::sleep(std::time::Duration::from_millis(500));
    /// })
    /// .unwrap();
    /// ```
    pub fn scoped<R>(
        config: ClientConfig,
        f: impl FnOnce(&RobotLinkClient) -> R,
    ) -> Result<R, ClientError> {
        let client = Self::connect(config)?;
        let output = f(&client);
        client.terminate()?;
        Ok(output)
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    /// 设置某轴速率（`[-1.0, 1.0]`，超出范围静默钳位）
    ///
    /// 不做任何 IO：下一个心跳周期才会发送。返回实际存储的控制值。
    pub fn set_axis(&self, axis: Axis, rate: f64) -> ControlValue {
        let value = self.state.set_rate(axis, rate);
        if !self.config.axes.contains(&axis) {
            debug!("Axis {} is not in the configured axis set; value stored but not sent", axis);
        }
        value
    }

    /// 底盘前进速率（负值后退）
    pub fn set_chassis_fwd(&self, rate: f64) {
        self.set_axis(Axis::ChassisForward, rate);
    }

    /// 底盘横移速率
    pub fn set_chassis_strafe(&self, rate: f64) {
        self.set_axis(Axis::ChassisStrafe, rate);
    }

    /// 底盘偏航速率
    pub fn set_chassis_yaw(&self, rate: f64) {
        self.set_axis(Axis::ChassisYaw, rate);
    }

    /// 云台偏航速率（底盘跟随云台时底盘也会转向）
    pub fn set_gimbal_yaw(&self, rate: f64) {
        self.set_axis(Axis::GimbalYaw, rate);
    }

    /// 云台俯仰速率
    pub fn set_gimbal_pitch(&self, rate: f64) {
        self.set_axis(Axis::GimbalPitch, rate);
    }

    /// 所有轴归零
    pub fn stop_all(&self) {
        self.state.reset();
    }

    /// 读取某轴当前的期望控制值
    pub fn desired(&self, axis: Axis) -> ControlValue {
        self.state.get(axis)
    }

    /// 下一个心跳周期将要发送的命令
    pub fn pending_command(&self) -> Command {
        self.state.command(&self.config.axes)
    }

    // ------------------------------------------------------------------------
    // 生命周期
    // ------------------------------------------------------------------------

    /// 终止客户端
    ///
    /// 停止心跳线程并等待其退出，之后才关闭连接，保证不会在关闭后写入。
    /// 幂等：已终止时直接返回 `Ok(())`。并发调用会等待正在进行的终止完成。
    ///
    /// # Errors
    /// - `ClientError::HeartbeatFailed`: 心跳此前因发送失败而停止
    /// - `ClientError::HeartbeatPanicked`: 心跳线程 panic
    /// - `ClientError::Io`: 关闭连接失败
    pub fn terminate(&self) -> Result<(), ClientError> {
        let mut guard = self.heartbeat.lock();
        let Some(mut heartbeat) = guard.take() else {
            return Ok(());
        };

        let heartbeat_result = heartbeat.stop();
        let close_result = self.close_transport();
        info!(
            "Robot link to {} terminated ({} frames sent)",
            self.peer,
            self.stats.snapshot().frames_sent
        );

        heartbeat_result?;
        close_result
    }

    fn close_transport(&self) -> Result<(), ClientError> {
        match self.transport.lock().take() {
            Some(mut transport) => transport.shutdown().map_err(ClientError::from),
            None => Ok(()),
        }
    }

    /// 心跳是否仍在运行
    ///
    /// 终止后或心跳因发送失败停止后返回 `false`。
    pub fn is_alive(&self) -> bool {
        self.heartbeat
            .lock()
            .as_ref()
            .is_some_and(|heartbeat| heartbeat.is_running())
    }

    /// 是否已终止
    pub fn is_terminated(&self) -> bool {
        self.heartbeat.lock().is_none()
    }

    // ------------------------------------------------------------------------
    // 诊断
    // ------------------------------------------------------------------------

    /// 心跳统计快照
    pub fn stats(&self) -> HeartbeatStatsSnapshot {
        self.stats.snapshot()
    }

    /// 发送失败事件接收端
    pub fn failures(&self) -> Receiver<HeartbeatFailure> {
        self.failures.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// 对端地址描述
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl Drop for RobotLinkClient {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            error!("Robot link cleanup failed: {}", e);
        }
    }
}

impl std::fmt::Debug for RobotLinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotLinkClient")
            .field("peer", &self.peer)
            .field("config", &self.config)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
