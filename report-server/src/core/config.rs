//! 服务器配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | /var/lib/report-server | 工作目录 (数据库、日志) |
//! | HTTP_PORT | 3000 | HTTP 服务端口 |
//! | ENVIRONMENT | development | 运行环境 |
//! | LOG_LEVEL | info | 日志级别 |
//! | ALLOW_LEGACY_UPDATES | true | 是否允许无身份的 issue 更新 (legacy) |
//!
//! # 示例
//!
//! ```ignore
//! WORK_DIR=/data/reports HTTP_PORT=8080 cargo run
//! ```

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 是否允许不带 acting user 的 issue 更新/删除 (兼容旧客户端)
    pub allow_legacy_updates: bool,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/report-server".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            allow_legacy_updates: std::env::var("ALLOW_LEGACY_UPDATES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录: work_dir/logs
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
