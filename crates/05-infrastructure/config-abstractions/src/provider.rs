//! 配置提供者抽象接口

use async_trait::async_trait;
use infrastructure_common::ConfigError;
use serde_json::Value;

/// 配置提供者 trait
///
/// 从某个数据源读取一棵完整的配置树，由调用方合并进配置存储。
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// 加载配置树
    async fn load(&self) -> Result<Value, ConfigError>;

    /// 获取提供者名称
    fn name(&self) -> &str;

    /// 获取提供者优先级，合并时优先级高的覆盖优先级低的
    fn priority(&self) -> i32 {
        0
    }
}
