//! 期望状态（Desired State）
//!
//! 每个轴一个 `AtomicI8`：调用方线程写入，心跳线程在每个周期读取快照。
//! 单轴更新是原子的；跨轴不提供原子性（两次 setter 之间的心跳可能
//! 看到一个轴的新值和另一个轴的旧值）。
//!
//! 只保留每个轴的最新值，没有历史。

use robolink_protocol::{Axis, Command, ControlCommand, ControlValue};
use std::sync::atomic::{AtomicI8, Ordering};

/// 期望状态
#[derive(Debug)]
pub struct DesiredState {
    values: [AtomicI8; Axis::COUNT],
}

impl Default for DesiredState {
    fn default() -> Self {
        Self::new()
    }
}

impl DesiredState {
    /// 创建全零状态
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|_| AtomicI8::new(0)),
        }
    }

    /// 写入某轴的控制值
    pub fn set(&self, axis: Axis, value: ControlValue) {
        self.values[axis.index()].store(value.get(), Ordering::Relaxed);
    }

    /// 以归一化速率写入（先钳位再缩放），返回实际存储的控制值
    pub fn set_rate(&self, axis: Axis, rate: f64) -> ControlValue {
        let value = ControlValue::from_rate(rate);
        self.set(axis, value);
        value
    }

    /// 读取某轴的控制值
    pub fn get(&self, axis: Axis) -> ControlValue {
        ControlValue::saturating(self.values[axis.index()].load(Ordering::Relaxed))
    }

    /// 所有轴归零
    pub fn reset(&self) {
        for value in &self.values {
            value.store(0, Ordering::Relaxed);
        }
    }

    /// 按给定线序读取快照
    pub fn snapshot(&self, axes: &[Axis]) -> ControlCommand {
        ControlCommand::new(axes.iter().map(|axis| self.get(*axis)))
    }

    /// 按给定线序构造心跳命令
    pub fn command(&self, axes: &[Axis]) -> Command {
        Command::Control(self.snapshot(axes))
    }
}
