//! 配置管理命令
//!
//! CLI 配置保存在 `dirs::config_dir()/robolink/config.toml`，
//! 可通过全局参数 `--config` 覆盖。命令行参数优先于配置文件。

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use robolink_client::{Axis, ClientConfig, SendFailurePolicy};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("robolink");
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置（所有字段可选，未设置的项使用客户端默认值）
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 控制服务主机
    pub host: Option<String>,

    /// 控制服务端口
    pub port: Option<u16>,

    /// 心跳间隔（毫秒）
    pub heartbeat_interval_ms: Option<u64>,

    /// 连接及读写超时（毫秒）
    pub timeout_ms: Option<u64>,

    /// 线序
    pub axes: Option<Vec<Axis>>,

    /// 是否记录每条发送的命令
    pub log_commands: Option<bool>,

    /// 发送失败策略
    pub on_send_failure: Option<SendFailurePolicy>,
}

impl CliConfig {
    /// 加载配置（文件不存在时返回默认配置）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 保存配置
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("创建配置目录失败")?;
        }

        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        let content = format!("# Robolink CLI Configuration\n\n{}", body);
        fs::write(path, content).context("写入配置文件失败")?;

        Ok(())
    }

    /// 合并到客户端配置
    pub fn to_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(ref host) = self.host {
            config.endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(ms) = self.heartbeat_interval_ms {
            config.heartbeat_interval_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if let Some(ref axes) = self.axes {
            config.axes = axes.clone();
        }
        if let Some(enabled) = self.log_commands {
            config.log_commands = enabled;
        }
        if let Some(policy) = self.on_send_failure {
            config.on_send_failure = policy;
        }
        config
    }
}

/// 可写入配置文件的字段
#[derive(Args, Debug, Default)]
pub struct ConfigValues {
    /// 控制服务主机
    #[arg(long)]
    pub host: Option<String>,

    /// 控制服务端口
    #[arg(long)]
    pub port: Option<u16>,

    /// 心跳间隔（毫秒）
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// 连接及读写超时（毫秒）
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// 线序（逗号分隔，如 chassis_fwd,gimbal_yaw）
    #[arg(long, value_delimiter = ',')]
    pub axes: Option<Vec<Axis>>,

    /// 是否记录每条发送的命令
    #[arg(long)]
    pub log_commands: Option<bool>,

    /// 发送失败策略（stop / continue）
    #[arg(long)]
    pub on_send_failure: Option<SendFailurePolicy>,
}

impl ConfigValues {
    fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.interval_ms.is_none()
            && self.timeout_ms.is_none()
            && self.axes.is_none()
            && self.log_commands.is_none()
            && self.on_send_failure.is_none()
    }

    fn apply(self, config: &mut CliConfig) {
        if let Some(host) = self.host {
            println!("✅ 设置主机: {}", host);
            config.host = Some(host);
        }
        if let Some(port) = self.port {
            println!("✅ 设置端口: {}", port);
            config.port = Some(port);
        }
        if let Some(ms) = self.interval_ms {
            println!("✅ 设置心跳间隔: {} ms", ms);
            config.heartbeat_interval_ms = Some(ms);
        }
        if let Some(ms) = self.timeout_ms {
            println!("✅ 设置超时: {} ms", ms);
            config.timeout_ms = Some(ms);
        }
        if let Some(axes) = self.axes {
            println!("✅ 设置线序: {}", format_axes(&axes));
            config.axes = Some(axes);
        }
        if let Some(enabled) = self.log_commands {
            println!("✅ 设置命令日志: {}", enabled);
            config.log_commands = Some(enabled);
        }
        if let Some(policy) = self.on_send_failure {
            println!("✅ 设置发送失败策略: {:?}", policy);
            config.on_send_failure = Some(policy);
        }
    }
}

fn format_axes(axes: &[Axis]) -> String {
    axes.iter().map(|a| a.name()).collect::<Vec<_>>().join(",")
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置
    Show,

    /// 设置配置项
    Set {
        #[command(flatten)]
        values: ConfigValues,
    },

    /// 打印配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => Self::show_(path),

            ConfigCommand::Set { values } => Self::set_(path, values),

            ConfigCommand::Path => {
                println!("{}", path.display());
                Ok(())
            },
        }
    }

    fn show_(path: &Path) -> Result<()> {
        let config = CliConfig::load(path)?.to_client_config();

        println!("配置文件: {}", path.display());
        println!("  端点: {}", config.endpoint);
        println!("  心跳间隔: {} ms", config.heartbeat_interval_ms);
        println!("  超时: {} ms", config.timeout_ms);
        println!("  线序: {}", format_axes(&config.axes));
        println!("  命令日志: {}", config.log_commands);
        println!("  发送失败策略: {:?}", config.on_send_failure);

        Ok(())
    }

    fn set_(path: &Path, values: ConfigValues) -> Result<()> {
        if values.is_empty() {
            anyhow::bail!("未指定任何配置项（见 `robolink-cli config set --help`）");
        }

        let mut config = CliConfig::load(path)?;
        values.apply(&mut config);

        config
            .to_client_config()
            .validate()
            .context("配置无效，未保存")?;
        config.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.to_client_config(), ClientConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = CliConfig {
            host: Some("10.0.0.7".to_string()),
            port: Some(9000),
            axes: Some(vec![Axis::ChassisForward, Axis::ChassisYaw]),
            on_send_failure: Some(SendFailurePolicy::Continue),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("chassis_fwd"));
        assert!(content.contains("continue"));

        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let client = loaded.to_client_config();
        assert_eq!(client.endpoint.to_string(), "10.0.0.7:9000");
        assert_eq!(client.axes, vec![Axis::ChassisForward, Axis::ChassisYaw]);
        assert_eq!(client.heartbeat_interval_ms, 100);
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let values = ConfigValues {
            interval_ms: Some(0),
            ..Default::default()
        };
        assert!(ConfigCommand::Set { values }.execute(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_merges_with_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let values = ConfigValues {
            host: Some("127.0.0.1".to_string()),
            ..Default::default()
        };
        ConfigCommand::Set { values }.execute(&path).unwrap();

        let values = ConfigValues {
            port: Some(7861),
            ..Default::default()
        };
        ConfigCommand::Set { values }.execute(&path).unwrap();

        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(loaded.port, Some(7861));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(CliConfig::load(&path).is_err());
    }
}
