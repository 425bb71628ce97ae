//! 测试服务端命令
//!
//! 在本地扮演机器人控制服务：接受一个客户端，解码长度前缀帧直到收到
//! `exit` 或连接关闭，记录每条命令，并报告按 `--max-rate` 限幅后的
//! 第一个轴的值。

use anyhow::{Context, Result};
use clap::Args;
use robolink_protocol::{Command, ControlValue, DEFAULT_MAX_PAYLOAD_LEN, read_frame};
use std::io::Read;
use std::net::TcpListener;
use tracing::{debug, info, warn};

/// 测试服务端参数
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:7860")]
    pub bind: String,

    /// 第一个轴报告值的上限（控制值单位，0-100）
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub max_rate: u8,

    /// 单帧最大长度
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD_LEN)]
    pub max_frame_len: usize,
}

/// 一次会话的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// 收到的帧数
    pub frames: u64,
    /// 其中的 control 命令数
    pub control_commands: u64,
    /// 无法解析的命令数
    pub invalid_commands: u64,
    /// 最后一个（限幅后的）第一轴值
    pub last_capped: Option<ControlValue>,
    /// 会话是否以 `exit` 结束
    pub exit_received: bool,
}

impl ServeCommand {
    pub fn execute(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind)
            .with_context(|| format!("无法监听 {}", self.bind))?;
        println!("🎧 监听 {} ，等待客户端...", listener.local_addr()?);

        let (stream, peer) = listener.accept().context("接受连接失败")?;
        println!("🔌 客户端已连接: {}", peer);

        let cap = ControlValue::saturating(self.max_rate as i8);
        let summary = serve_connection(stream, cap, self.max_frame_len)?;

        println!("📊 会话结束:");
        println!("  帧数: {}", summary.frames);
        println!("  control 命令: {}", summary.control_commands);
        println!("  无效命令: {}", summary.invalid_commands);
        if let Some(value) = summary.last_capped {
            println!("  最后的第一轴值（限幅 ±{}）: {}", cap, value);
        }
        println!(
            "  结束原因: {}",
            if summary.exit_received { "exit" } else { "连接关闭" }
        );
        Ok(())
    }
}

/// 处理一个连接直到 `exit` 或 EOF
pub fn serve_connection<R: Read>(
    mut reader: R,
    cap: ControlValue,
    max_frame_len: usize,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();

    while let Some(payload) = read_frame(&mut reader, max_frame_len).context("读取帧失败")? {
        summary.frames += 1;

        match payload.parse::<Command>() {
            Ok(Command::Exit) => {
                info!("Received exit command");
                summary.exit_received = true;
                break;
            },
            Ok(Command::Control(control)) => {
                summary.control_commands += 1;
                let capped = control.get(0).map(|v| v.limited(cap));
                debug!("Received command: {}", payload);
                if let Some(value) = capped {
                    info!("Received {} (first axis capped: {})", payload, value);
                }
                summary.last_capped = capped;
            },
            Err(e) => {
                summary.invalid_commands += 1;
                warn!("Invalid command {:?}: {}", payload, e);
            },
        }
    }

    Ok(summary)
}
