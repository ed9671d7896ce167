//! 组件解析器抽象接口
//!
//! 提供按名称解析依赖和组件实例化的能力

use async_trait::async_trait;
use infrastructure_common::{
    downcast, DependencyError, DependencyResult, Instance, ResolveExtra,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 组件解析器 trait
///
/// `path` 是当前解析链上已经出现过的名称，用于循环依赖检测和错误信息。
#[async_trait]
pub trait ComponentResolver: Send + Sync {
    /// 解析指定名称的组件
    async fn resolve(
        &self,
        name: &str,
        extra: &ResolveExtra,
        path: &[String],
    ) -> DependencyResult<Instance>;

    /// 按顺序解析一组依赖
    ///
    /// `extra` 中已有的名称直接取用，其余逐个调用 [`ComponentResolver::resolve`]，
    /// 任意一项失败即整体失败。
    async fn dependencies(
        &self,
        names: &[String],
        extra: &ResolveExtra,
        path: &[String],
    ) -> DependencyResult<ResolvedDependencies> {
        let mut resolved = ResolvedDependencies::new();
        for name in names {
            let value = match extra.get(name) {
                Some(value) => Arc::clone(value),
                None => self.resolve(name, extra, path).await?,
            };
            resolved.push(name.clone(), value);
        }
        Ok(resolved)
    }
}

/// 按声明顺序排列的已解析依赖
#[derive(Clone, Default)]
pub struct ResolvedDependencies {
    entries: Vec<(String, Instance)>,
}

impl ResolvedDependencies {
    /// 创建空的依赖列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一项依赖
    pub fn push(&mut self, name: impl Into<String>, value: Instance) {
        self.entries.push((name.into(), value));
    }

    /// 按名称取得依赖实例
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// 按名称取得依赖并还原为具体类型
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> DependencyResult<Arc<T>> {
        let value = self
            .instance(name)
            .ok_or_else(|| DependencyError::UnresolvedComponent {
                name: name.to_string(),
                required_by: None,
            })?;
        downcast::<T>(name, value)
    }

    /// 按位置取得依赖实例
    pub fn at(&self, index: usize) -> Option<&Instance> {
        self.entries.get(index).map(|(_, value)| value)
    }

    /// 依赖名称
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// 依赖数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResolvedDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// 实例化上下文
///
/// 交给工厂和初始化钩子，使组件在初始化期间还能继续解析其它组件。
#[derive(Clone, Copy)]
pub struct InitContext<'a> {
    resolver: &'a dyn ComponentResolver,
    extra: &'a ResolveExtra,
    path: &'a [String],
}

impl<'a> InitContext<'a> {
    /// 创建实例化上下文
    pub fn new(resolver: &'a dyn ComponentResolver, extra: &'a ResolveExtra, path: &'a [String]) -> Self {
        Self {
            resolver,
            extra,
            path,
        }
    }

    /// 当前解析器
    pub fn resolver(&self) -> &'a dyn ComponentResolver {
        self.resolver
    }

    /// 当前组件的附加依赖，包含解析元数据
    pub fn extra(&self) -> &'a ResolveExtra {
        self.extra
    }

    /// 当前解析路径，最后一项是正在实例化的组件
    pub fn path(&self) -> &'a [String] {
        self.path
    }

    /// 沿当前路径继续解析一个组件
    pub async fn resolve(&self, name: &str) -> DependencyResult<Instance> {
        match self.extra.get(name) {
            Some(value) => Ok(Arc::clone(value)),
            None => self.resolver.resolve(name, self.extra, self.path).await,
        }
    }

    /// 沿当前路径解析组件并还原为具体类型
    pub async fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> DependencyResult<Arc<T>> {
        let value = self.resolve(name).await?;
        downcast::<T>(name, &value)
    }
}

impl fmt::Debug for InitContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitContext")
            .field("resolver", &"<resolver>")
            .field("extra", self.extra)
            .field("path", &self.path)
            .finish()
    }
}
