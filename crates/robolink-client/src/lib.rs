//! # Robolink Client
//!
//! 机器人控制链路客户端：维持一条到机器人控制服务的 TCP 连接，并由后台
//! 心跳线程以固定周期发送最新的期望运动状态。
//!
//! ## 分层
//!
//! - **状态层** (`state`): 每轴一个原子控制值，调用方随时写入
//! - **心跳层** (`heartbeat`): 后台线程，按周期读取快照并发送帧
//! - **传输层** (`transport`): `LinkTransport` 抽象，默认实现为 TCP
//! - **客户端层** (`client`): `RobotLinkClient`，管理连接生命周期
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use robolink_client::RobotLinkBuilder;
//!
//! # fn main() -> Result<(), robolink_client::ClientError> {
//! let client = RobotLinkBuilder::new().endpoint("192.168.2.1", 7860).connect()?;
//! client.set_chassis_fwd(0.5);
//! client.set_gimbal_yaw(-1.0);
//! // ... 下一个心跳周期发送 `control 50 -100`
//! client.terminate()?;
//! # Ok(())
//! # }
//! ```
//!
//! 作用域用法保证所有退出路径都会终止客户端：
//!
//! ```rust,no_run
//! use robolink_client::{ClientConfig, RobotLinkClient};
//!
//! # fn main() -> Result<(), robolink_client::ClientError> {
//! RobotLinkClient::scoped(ClientConfig::default(), |client| {
//!     client.set_chassis_fwd(0.2);
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! })?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod client;
pub mod config;
mod error;
pub mod heartbeat;
pub mod state;
pub mod transport;

pub use builder::RobotLinkBuilder;
pub use client::RobotLinkClient;
pub use config::{ClientConfig, Endpoint, SendFailurePolicy};
pub use error::{ClientError, Result};
pub use heartbeat::{HeartbeatFailure, HeartbeatStats, HeartbeatStatsSnapshot};
pub use state::DesiredState;
pub use transport::{LinkTransport, TcpTransport};

// 协议层常用类型
pub use robolink_protocol::{Axis, Command, ControlValue, ProtocolError};
