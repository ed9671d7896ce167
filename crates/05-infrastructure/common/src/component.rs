//! 组件实例与解析上下文
//!
//! 容器内的所有组件都以类型擦除的 [`Instance`] 形式流转，
//! 需要具体类型时再通过 [`downcast`] 还原。

use crate::errors::{DependencyError, DependencyResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的组件实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// `extra` 中保存解析元数据的保留键
pub const META_KEY: &str = "$meta";

/// 把任意值包装为组件实例
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// 把组件实例还原为具体类型
pub fn downcast<T: Any + Send + Sync>(name: &str, instance: &Instance) -> DependencyResult<Arc<T>> {
    Arc::clone(instance)
        .downcast::<T>()
        .map_err(|_| DependencyError::type_mismatch::<T>(name))
}

/// 解析元数据
///
/// 每次内部解析都会注入一份，让工厂无需查询注册表就能知道自己是谁、被谁依赖。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveMeta {
    /// 当前正在解析的组件名称
    pub name: String,
    /// 依赖当前组件的上层组件名称
    pub caller: Option<String>,
}

/// 解析附加依赖
///
/// 名称到实例的映射，命中的依赖不再查询注册表。
#[derive(Clone, Default)]
pub struct ResolveExtra {
    values: HashMap<String, Instance>,
}

impl ResolveExtra {
    /// 创建空的附加依赖
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一项附加依赖
    pub fn with(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.insert(name, value);
        self
    }

    /// 插入一项附加依赖，覆盖同名项
    pub fn insert(&mut self, name: impl Into<String>, value: Instance) {
        self.values.insert(name.into(), value);
    }

    /// 获取附加依赖
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    /// 是否包含指定名称
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// 当前的解析元数据
    pub fn meta(&self) -> Option<Arc<ResolveMeta>> {
        self.values
            .get(META_KEY)
            .and_then(|value| Arc::clone(value).downcast::<ResolveMeta>().ok())
    }

    /// 为 `name` 的内部解析派生一份新的附加依赖
    ///
    /// 浅拷贝现有项，并把元数据替换为 `{name, caller: 上一层 name}`。
    pub fn for_component(&self, name: &str) -> Self {
        let meta = ResolveMeta {
            name: name.to_string(),
            caller: self.meta().map(|meta| meta.name.clone()),
        };
        self.clone().with(META_KEY, instance(meta))
    }

    /// 附加依赖数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ResolveExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("ResolveExtra")
            .field("keys", &keys)
            .field("meta", &self.meta())
            .finish()
    }
}
