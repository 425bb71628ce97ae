//! # Robolink CLI
//!
//! 机器人控制链路的命令行工具。
//!
//! ```bash
//! # 配置默认端点
//! robolink-cli config set --host 192.168.2.1 --port 7860
//!
//! # 以固定速率驱动 3 秒（内部：连接 -> 心跳 -> 断开）
//! robolink-cli drive --fwd 0.3 --yaw -0.1 --duration-secs 3
//!
//! # 从标准输入读取 `fwd yaw` 行
//! robolink-cli drive --stdin
//!
//! # 本地测试服务端
//! robolink-cli serve --bind 127.0.0.1:7860 --max-rate 30
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::config::default_config_path;
use commands::{CliConfig, ConfigCommand, DriveCommand, ServeCommand};

/// Robolink CLI - 机器人控制链路命令行工具
#[derive(Parser, Debug)]
#[command(name = "robolink-cli")]
#[command(about = "Command-line driver and test server for the robot control link", long_about = None)]
#[command(version)]
struct Cli {
    /// 输出 debug 级别日志（包括每条发送的命令）
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 配置文件路径（默认 <config_dir>/robolink/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 连接控制服务并驱动机器人
    Drive {
        #[command(flatten)]
        args: DriveCommand,
    },

    /// 运行本地测试服务端
    Serve {
        #[command(flatten)]
        args: ServeCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let directive = if cli.verbose {
        "robolink=debug"
    } else {
        "robolink=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&config_path),

        Commands::Drive { args } => {
            let config = CliConfig::load(&config_path)?.to_client_config();
            args.execute(config)
        },

        Commands::Serve { args } => args.execute(),
    }
}
