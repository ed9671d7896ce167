//! 组件生命周期

use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件描述符类型
///
/// 决定解析结果是否被缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// 注册时即持有的对象，不再实例化
    Object,
    /// 首次解析时实例化，之后始终返回同一个对象
    Loader,
    /// 每次解析都产生新实例
    Factory,
    /// 别名，解析时转发到目标名称
    Ref,
}

impl ComponentKind {
    /// 解析结果是否会被缓存在描述符上
    pub fn is_memoized(self) -> bool {
        matches!(self, Self::Object | Self::Loader)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Loader => "loader",
            Self::Factory => "factory",
            Self::Ref => "ref",
        };
        f.write_str(name)
    }
}

/// 容器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// 未初始化
    #[default]
    Uninitialized,
    /// 初始化中
    Initializing,
    /// 已初始化
    Initialized,
    /// 运行中
    Running,
    /// 已停止
    Stopped,
}
