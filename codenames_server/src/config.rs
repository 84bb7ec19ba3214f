use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// 服务器启动参数，命令行优先，其次读取环境变量
#[derive(Parser, Debug, Clone)]
#[command(name = "codenames_server")]
#[command(about = "猜词游戏 WebSocket 服务器", long_about = None)]
pub struct Config {
    /// 监听地址
    #[arg(long, env = "CODENAMES_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// 监听端口
    #[arg(long, env = "CODENAMES_PORT", default_value_t = 25917)]
    pub port: u16,

    /// 每局游戏的最大人数
    #[arg(long, env = "CODENAMES_MAX_PLAYERS", default_value_t = 8)]
    pub max_players: usize,

    /// 版本冲突时的最大重试次数
    #[arg(long, env = "CODENAMES_WRITE_RETRIES", default_value_t = 3)]
    pub write_retries: usize,

    /// 未设置 RUST_LOG 时使用的日志级别
    #[arg(long, env = "CODENAMES_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
