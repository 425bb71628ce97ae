//! 驱动命令
//!
//! 以作用域方式连接到控制服务，保持固定速率一段时间，或从标准输入
//! 逐行读取 `fwd yaw` 速率。Ctrl-C 会归零所有轴并干净地终止连接。

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use robolink_client::{Axis, ClientConfig, RobotLinkClient};
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 轮询停止标志的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 连接参数（覆盖配置文件）
#[derive(Args, Debug, Default)]
pub struct LinkArgs {
    /// 控制服务主机
    #[arg(long)]
    pub host: Option<String>,

    /// 控制服务端口
    #[arg(short, long)]
    pub port: Option<u16>,

    /// 心跳间隔（毫秒）
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// 线序（逗号分隔）
    #[arg(long, value_delimiter = ',')]
    pub axes: Option<Vec<Axis>>,
}

impl LinkArgs {
    /// 在配置文件的基础上应用命令行参数
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(ref host) = self.host {
            config.endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(ms) = self.interval_ms {
            config.heartbeat_interval_ms = ms;
        }
        if let Some(ref axes) = self.axes {
            config.axes = axes.clone();
        }
        config
    }
}

/// 驱动命令参数
#[derive(Args, Debug)]
pub struct DriveCommand {
    #[command(flatten)]
    pub link: LinkArgs,

    /// 底盘前进速率 [-1.0, 1.0]
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub fwd: f64,

    /// 云台偏航速率 [-1.0, 1.0]
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub yaw: f64,

    /// 保持时长（秒）
    #[arg(long, default_value_t = 3.0)]
    pub duration_secs: f64,

    /// 从标准输入读取 `fwd yaw` 行
    #[arg(long, conflicts_with_all = ["fwd", "yaw", "duration_secs"])]
    pub stdin: bool,
}

impl DriveCommand {
    pub fn execute(&self, config: ClientConfig) -> Result<()> {
        let config = self.link.apply(config);
        let endpoint = config.endpoint.clone();
        let interval = config.heartbeat_interval();

        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("设置 Ctrl-C 处理器失败")?;

        println!("🔌 连接到 {} ...", endpoint);
        RobotLinkClient::scoped(config, |client| -> Result<()> {
            println!("✅ 已连接，按 Ctrl-C 停止");

            let result = if self.stdin {
                drive_from_lines(client, stdin_lines(), &running)
            } else {
                drive_fixed(client, self.fwd, self.yaw, self.duration_secs, &running)
            };

            // 让最后一个周期把零速发出去
            client.stop_all();
            thread::sleep(interval);

            let stats = client.stats();
            println!(
                "📊 已发送 {} 帧 ({} 字节)，发送失败 {} 次",
                stats.frames_sent, stats.bytes_sent, stats.send_failures
            );
            result
        })
        .with_context(|| format!("与 {} 的链路出错", endpoint))??;

        println!("✅ 已断开");
        Ok(())
    }
}

fn drive_fixed(
    client: &RobotLinkClient,
    fwd: f64,
    yaw: f64,
    duration_secs: f64,
    running: &AtomicBool,
) -> Result<()> {
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        anyhow::bail!("无效的时长: {}", duration_secs);
    }
    let duration = Duration::from_secs_f64(duration_secs);

    client.set_chassis_fwd(fwd);
    client.set_gimbal_yaw(yaw);
    info!("Holding {} for {:?}", client.pending_command(), duration);

    let start = Instant::now();
    while running.load(Ordering::SeqCst) && start.elapsed() < duration {
        if !client.is_alive() {
            anyhow::bail!("心跳已停止");
        }
        thread::sleep(POLL_INTERVAL.min(duration.saturating_sub(start.elapsed())));
    }
    Ok(())
}

/// 在专用线程读取标准输入，通过通道交给主循环
fn stdin_lines() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn drive_from_lines(
    client: &RobotLinkClient,
    lines: Receiver<String>,
    running: &AtomicBool,
) -> Result<()> {
    while running.load(Ordering::SeqCst) {
        if !client.is_alive() {
            anyhow::bail!("心跳已停止");
        }

        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match parse_rates(&line) {
            Ok(Some((fwd, yaw))) => {
                client.set_chassis_fwd(fwd);
                client.set_gimbal_yaw(yaw);
            },
            Ok(None) => {},
            Err(e) => warn!("Ignoring input line {:?}: {}", line, e),
        }
    }
    Ok(())
}

/// 解析 `fwd yaw` 行；空行和 `#` 注释返回 `None`
pub fn parse_rates(line: &str) -> Result<Option<(f64, f64)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let (Some(fwd), Some(yaw), None) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("expected two rates: `fwd yaw`");
    };
    let fwd: f64 = fwd.parse().with_context(|| format!("invalid rate {:?}", fwd))?;
    let yaw: f64 = yaw.parse().with_context(|| format!("invalid rate {:?}", yaw))?;
    Ok(Some((fwd, yaw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use robolink_client::{LinkTransport, RobotLinkBuilder};
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingTransport {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl LinkTransport for RecordingTransport {
        fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        fn shutdown(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_parse_rates() {
        assert_eq!(parse_rates("0.5 -0.25").unwrap(), Some((0.5, -0.25)));
        assert_eq!(parse_rates("  1   0 ").unwrap(), Some((1.0, 0.0)));
        assert_eq!(parse_rates("").unwrap(), None);
        assert_eq!(parse_rates("# comment").unwrap(), None);
        assert!(parse_rates("0.5").is_err());
        assert!(parse_rates("0.5 0.1 0.2").is_err());
        assert!(parse_rates("fast left").is_err());
    }

    #[test]
    fn test_link_args_override_config() {
        let args = LinkArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            interval_ms: Some(20),
            axes: Some(vec![Axis::GimbalYaw]),
        };
        let config = args.apply(ClientConfig::default());
        assert_eq!(config.endpoint.to_string(), "127.0.0.1:9000");
        assert_eq!(config.heartbeat_interval_ms, 20);
        assert_eq!(config.axes, vec![Axis::GimbalYaw]);

        let untouched = LinkArgs::default().apply(ClientConfig::default());
        assert_eq!(untouched, ClientConfig::default());
    }

    #[test]
    fn test_drive_from_lines_applies_latest_rates() {
        let transport = RecordingTransport::default();
        let client = RobotLinkBuilder::new()
            .heartbeat_interval(Duration::from_secs(10))
            .with_transport(transport)
            .unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send("0.2 0.1".to_string()).unwrap();
        tx.send("bogus".to_string()).unwrap();
        tx.send("-0.4 1.5".to_string()).unwrap();
        drop(tx);

        let running = AtomicBool::new(true);
        drive_from_lines(&client, rx, &running).unwrap();

        assert_eq!(client.pending_command().to_string(), "control -40 100");
        client.terminate().unwrap();
    }

    #[test]
    fn test_drive_fixed_stops_when_flag_cleared() {
        let client = RobotLinkBuilder::new()
            .heartbeat_interval(Duration::from_secs(10))
            .with_transport(RecordingTransport::default())
            .unwrap();

        let running = AtomicBool::new(false);
        let start = Instant::now();
        drive_fixed(&client, 0.3, -0.3, 60.0, &running).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(client.desired(Axis::ChassisForward).get(), 30);
        assert_eq!(client.desired(Axis::GimbalYaw).get(), -30);

        assert!(drive_fixed(&client, 0.0, 0.0, f64::NAN, &running).is_err());
    }
}
