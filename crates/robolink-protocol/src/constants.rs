//! 协议常量定义

/// 机器人控制服务的默认主机地址
pub const DEFAULT_HOST: &str = "192.168.2.1";

/// 机器人控制服务的默认端口
pub const DEFAULT_PORT: u16 = 7860;

/// 默认心跳周期（毫秒）
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 100;

/// 默认 socket 读写超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// 控制命令关键字
pub const CONTROL_COMMAND: &str = "control";

/// 会话结束哨兵（由测试工具发送，心跳循环从不发送）
pub const EXIT_COMMAND: &str = "exit";

/// 长度前缀字节数（i32, little-endian）
pub const LENGTH_PREFIX_LEN: usize = 4;

/// 解码端默认允许的最大负载长度（1 MiB）
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1024 * 1024;
