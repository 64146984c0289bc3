//! Public Infrastructure Report Server - 市民基础设施问题上报后端
//!
//! # 架构概述
//!
//! 本模块是上报服务的主入口，提供以下核心功能：
//!
//! - **HTTP API** (`api`): RESTful API 接口 (issues / users / payments)
//! - **领域逻辑** (`issues`): 权限解析、生命周期流转、点赞策略
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **身份** (`identity`): 客户端声称身份的解析链
//!
//! # 模块结构
//!
//! ```text
//! report-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── issues/        # 领域逻辑 (permissions / lifecycle / upvote)
//! ├── identity/      # acting-user 解析
//! ├── db/            # 数据库层 (models / repository)
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod identity;
pub mod issues;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use identity::ActingUser;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: dotenv + 日志
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ___                    __
  / _ \___ ___  ___  ____/ /_
 / , _/ -_) _ \/ _ \/ __/ __/
/_/|_|\__/ .__/\___/_/  \__/
        /_/  public infrastructure reports
    "#
    );
}
