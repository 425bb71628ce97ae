//! 文本命令
//!
//! 负载格式为空格分隔的 ASCII 记号：
//!
//! - `control v1 v2 …`：每个配置轴一个整数控制值，顺序由客户端配置决定
//! - `exit`：会话结束哨兵

use crate::constants::{CONTROL_COMMAND, EXIT_COMMAND};
use crate::control::{Axis, ControlValue};
use crate::error::ProtocolError;
use crate::frame::encode_frame;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// 控制命令：按线序排列的控制值
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlCommand {
    values: SmallVec<[ControlValue; Axis::COUNT]>,
}

impl ControlCommand {
    /// 从控制值序列创建
    pub fn new(values: impl IntoIterator<Item = ControlValue>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// 按线序排列的控制值
    pub fn values(&self) -> &[ControlValue] {
        &self.values
    }

    /// 第 `index` 个控制值
    pub fn get(&self, index: usize) -> Option<ControlValue> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 线协议命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `control v1 v2 …`
    Control(ControlCommand),
    /// `exit`
    Exit,
}

impl Command {
    /// 构造控制命令
    ///
    /// ```rust
    /// use robolink_protocol::{Command, ControlValue};
    ///
    /// let cmd = Command::control([ControlValue::from_rate(0.5), ControlValue::from_rate(-1.0)]);
    /// assert_eq!(cmd.to_string(), "control 50 -100");
    /// ```
    pub fn control(values: impl IntoIterator<Item = ControlValue>) -> Self {
        Command::Control(ControlCommand::new(values))
    }

    /// 是否为会话结束哨兵
    pub fn is_exit(&self) -> bool {
        matches!(self, Command::Exit)
    }

    /// 编码为完整的长度前缀帧
    pub fn to_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        encode_frame(&self.to_string())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Control(cmd) => {
                f.write_str(CONTROL_COMMAND)?;
                for value in cmd.values() {
                    write!(f, " {}", value)?;
                }
                Ok(())
            },
            Command::Exit => f.write_str(EXIT_COMMAND),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_ascii_whitespace();
        let name = tokens.next().ok_or(ProtocolError::EmptyCommand)?;

        match name {
            CONTROL_COMMAND => {
                let values = tokens
                    .map(str::parse::<ControlValue>)
                    .collect::<Result<SmallVec<_>, _>>()?;
                Ok(Command::Control(ControlCommand { values }))
            },
            EXIT_COMMAND => {
                let rest: Vec<&str> = tokens.collect();
                if rest.is_empty() {
                    Ok(Command::Exit)
                } else {
                    Err(ProtocolError::UnexpectedArguments {
                        command: EXIT_COMMAND,
                        args: rest.join(" "),
                    })
                }
            },
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}
