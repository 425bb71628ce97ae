//! 命令定义和实现

pub mod config;
pub mod drive;
pub mod serve;

pub use config::{CliConfig, ConfigCommand};
pub use drive::DriveCommand;
pub use serve::ServeCommand;
