//! Server State

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::DbService;

/// 服务器状态 - 持有所有共享服务的引用
///
/// 每个请求处理器通过 `State` 提取器获得一份浅拷贝。除配置与数据库句柄外
/// 没有进程内共享可变状态；所有写入都是 last-writer-wins。
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造，测试场景使用)
    pub fn new(config: Config, db: Surreal<Db>) -> Self {
        Self { config, db }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/reports.db)
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("reports.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::new(config.clone(), db_service.db)
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
