//! Heartbeat - 后台心跳机制
//!
//! 后台线程按固定周期把最新的期望状态序列化为 `control …` 命令并发送，
//! 与调用方更新状态的频率无关。
//!
//! # 设计目标
//!
//! - **速率无关**: 调用方可以任意频繁地调用 setter，线上始终是一个周期一帧
//! - **有界延迟**: 状态更新最迟在一个周期后被发送
//! - **优雅关闭**: 停止信号会提前结束等待，`stop()` 同步 join 线程
//!
//! # 工作原理
//!
//! 线程持有停止通道的接收端，以 `recv_deadline(next_tick)` 作为周期等待：
//! 超时即到达下一个周期；收到消息或发送端被 drop 即退出。周期按截止
//! 时间推进而不是每次 sleep 固定时长，因此发送耗时不会累积成漂移。

use crate::config::SendFailurePolicy;
use crate::error::ClientError;
use crate::state::DesiredState;
use crate::transport::LinkTransport;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use robolink_protocol::{Axis, Command};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// 共享的传输层（写路径互斥）
///
/// 心跳线程是唯一的写入方；互斥锁保证即使将来出现多个写入方，
/// 两条命令也不会在线上交错。`None` 表示连接已关闭。
pub(crate) type SharedTransport = Arc<Mutex<Option<Box<dyn LinkTransport>>>>;

// ============================================================================
// 统计
// ============================================================================

/// 心跳统计（原子计数器）
#[derive(Debug, Default)]
pub struct HeartbeatStats {
    /// 到达的周期数
    pub ticks: AtomicU64,
    /// 成功发送的帧数
    pub frames_sent: AtomicU64,
    /// 成功发送的字节数（含长度前缀）
    pub bytes_sent: AtomicU64,
    /// 发送失败次数
    pub send_failures: AtomicU64,
    /// 因通道已满而未发布的失败事件数
    pub failures_dropped: AtomicU64,
}

impl HeartbeatStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取快照
    pub fn snapshot(&self) -> HeartbeatStatsSnapshot {
        HeartbeatStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            failures_dropped: self.failures_dropped.load(Ordering::Relaxed),
        }
    }
}

/// 统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartbeatStatsSnapshot {
    pub ticks: u64,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub send_failures: u64,
    pub failures_dropped: u64,
}

/// 发送失败事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatFailure {
    /// 失败发生的周期序号（从 1 开始）
    pub tick: u64,
    /// IO 错误类型
    pub kind: io::ErrorKind,
    /// 错误描述
    pub message: String,
    /// 该失败是否使心跳线程停止
    pub fatal: bool,
}

// ============================================================================
// 心跳循环
// ============================================================================

/// 心跳线程所需的上下文
pub(crate) struct HeartbeatContext {
    pub state: Arc<DesiredState>,
    pub transport: SharedTransport,
    pub axes: Vec<Axis>,
    pub interval: Duration,
    pub log_commands: bool,
    pub policy: SendFailurePolicy,
    pub stats: Arc<HeartbeatStats>,
    pub failures: Sender<HeartbeatFailure>,
}

impl HeartbeatContext {
    /// 编码并在写锁内整帧发送，返回发送的字节数
    fn send(&self, command: &Command) -> io::Result<usize> {
        let frame = command
            .to_frame()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut guard = self.transport.lock();
        let transport = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "link closed"))?;
        transport.send_frame(&frame)?;
        Ok(frame.len())
    }

    fn publish_failure(&self, failure: HeartbeatFailure) {
        match self.failures.try_send(failure) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {},
            Err(TrySendError::Full(_)) => {
                self.stats.failures_dropped.fetch_add(1, Ordering::Relaxed);
            },
        }
    }
}

/// 线程退出时（包括 panic）清除运行标志
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn heartbeat_loop(
    ctx: HeartbeatContext,
    stop: Receiver<()>,
    running: Arc<AtomicBool>,
) -> Result<(), ClientError> {
    let _running = RunningGuard(running);
    let mut next_tick = Instant::now() + ctx.interval;
    let mut tick: u64 = 0;

    loop {
        match stop.recv_deadline(next_tick) {
            Err(RecvTimeoutError::Timeout) => {},
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("Heartbeat stopped after {} ticks", tick);
                return Ok(());
            },
        }

        tick += 1;
        next_tick += ctx.interval;
        let now = Instant::now();
        if next_tick <= now {
            // 发送阻塞超过一个周期：重新对齐，不补发
            next_tick = now + ctx.interval;
        }
        ctx.stats.ticks.fetch_add(1, Ordering::Relaxed);

        let command = ctx.state.command(&ctx.axes);
        match ctx.send(&command) {
            Ok(bytes) => {
                ctx.stats.frames_sent.fetch_add(1, Ordering::Relaxed);
                ctx.stats.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
                if ctx.log_commands {
                    debug!("Sent command: {}", command);
                }
            },
            Err(e) => {
                ctx.stats.send_failures.fetch_add(1, Ordering::Relaxed);
                let fatal = ctx.policy == SendFailurePolicy::Stop;
                ctx.publish_failure(HeartbeatFailure {
                    tick,
                    kind: e.kind(),
                    message: e.to_string(),
                    fatal,
                });

                if fatal {
                    error!("Heartbeat send failed on tick {}, stopping: {}", tick, e);
                    return Err(ClientError::HeartbeatFailed { tick, source: e });
                }
                warn!("Heartbeat send failed on tick {}: {}", tick, e);
            },
        }
    }
}

// ============================================================================
// HeartbeatManager
// ============================================================================

/// 心跳管理器
///
/// 在后台线程中定期发送心跳帧。线程不可重启：`stop()` 之后需要新的客户端。
pub(crate) struct HeartbeatManager {
    handle: Option<JoinHandle<Result<(), ClientError>>>,
    stop_tx: Option<Sender<()>>,
    running: Arc<AtomicBool>,
}

impl HeartbeatManager {
    /// 启动心跳线程
    pub(crate) fn start(ctx: HeartbeatContext) -> Result<Self, ClientError> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = thread::Builder::new()
            .name("robolink-heartbeat".to_string())
            .spawn(move || heartbeat_loop(ctx, stop_rx, running_clone))
            .map_err(ClientError::Spawn)?;

        Ok(HeartbeatManager {
            handle: Some(handle),
            stop_tx: Some(stop_tx),
            running,
        })
    }

    /// 停止心跳线程并等待其退出
    ///
    /// 返回心跳线程的退出结果；重复调用返回 `Ok(())`。
    pub(crate) fn stop(&mut self) -> Result<(), ClientError> {
        // drop 发送端即断开通道，线程在下一次等待时立即退出
        drop(self.stop_tx.take());

        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(Err(ClientError::HeartbeatPanicked)),
            None => Ok(()),
        }
    }

    /// 检查心跳线程是否在运行
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for HeartbeatManager {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Heartbeat exited with error during drop: {}", e);
        }
    }
}
