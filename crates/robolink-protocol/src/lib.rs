//! # Robolink Protocol
//!
//! 机器人控制链路的线协议定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（默认端点、心跳周期、命令关键字）
//! - `control`: 控制轴与控制值（速率 → `[-100, 100]` 整数）
//! - `command`: 文本命令（`control 25 -10` / `exit`）
//! - `frame`: 长度前缀帧编码/解码
//!
//! ## 帧格式
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────┐
//! │ length: i32 (LE, 4B) │ payload: UTF-8 (length B) │
//! └──────────────────────┴──────────────────────────┘
//! ```
//!
//! ## 示例
//!
//! ```rust
//! use robolink_protocol::{Command, ControlValue, decode_frame, encode_frame};
//!
//! let cmd = Command::control([ControlValue::from_rate(0.25), ControlValue::from_rate(-0.1)]);
//! let frame = encode_frame(&cmd.to_string()).unwrap();
//! let (payload, consumed) = decode_frame(&frame).unwrap().unwrap();
//! assert_eq!(payload, "control 25 -10");
//! assert_eq!(consumed, frame.len());
//! ```

pub mod command;
pub mod constants;
pub mod control;
mod error;
pub mod frame;

// 重新导出常用类型
pub use command::{Command, ControlCommand};
pub use constants::*;
pub use control::{Axis, ControlValue};
pub use error::ProtocolError;
pub use frame::{FrameDecoder, decode_frame, encode_frame, encode_frame_into, read_frame};
