//! 组件工厂抽象接口
//!
//! 提供组件实例创建的工厂模式支持

use crate::resolver::{InitContext, ResolvedDependencies};
use async_trait::async_trait;
use futures::future::BoxFuture;
use infrastructure_common::{instance, DependencyResult, Instance};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// 组件工厂 trait
///
/// 用于创建组件实例
#[async_trait]
pub trait ComponentFactory: Send + Sync {
    /// 创建组件实例，`dependencies` 与 [`ComponentFactory::dependencies`] 顺序一致
    async fn create(
        &self,
        dependencies: ResolvedDependencies,
        ctx: &InitContext<'_>,
    ) -> DependencyResult<Instance>;

    /// 获取工厂名称
    fn name(&self) -> &str;

    /// 获取所需的依赖名称，按声明顺序
    fn dependencies(&self) -> Vec<String>;
}

type FactoryFn =
    Arc<dyn Fn(ResolvedDependencies) -> BoxFuture<'static, DependencyResult<Instance>> + Send + Sync>;

/// 闭包工厂包装器
///
/// 直接调用闭包并返回其结果，不经过初始化钩子。
#[derive(Clone)]
pub struct FnFactory {
    name: String,
    dependencies: Vec<String>,
    factory_fn: FactoryFn,
}

impl FnFactory {
    /// 以依赖名称列表和异步闭包创建工厂
    pub fn new<F, Fut>(dependencies: &[&str], factory_fn: F) -> Self
    where
        F: Fn(ResolvedDependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DependencyResult<Instance>> + Send + 'static,
    {
        Self {
            name: "fn".to_string(),
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            factory_fn: Arc::new(move |deps| Box::pin(factory_fn(deps))),
        }
    }

    /// 以同步闭包创建工厂
    pub fn sync<F>(dependencies: &[&str], factory_fn: F) -> Self
    where
        F: Fn(ResolvedDependencies) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        let factory_fn = Arc::new(factory_fn);
        Self::new(dependencies, move |deps| {
            let result = factory_fn(deps);
            async move { result }
        })
    }

    /// 设置工厂名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl std::fmt::Debug for FnFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFactory")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("factory_fn", &"<function>")
            .finish()
    }
}

#[async_trait]
impl ComponentFactory for FnFactory {
    async fn create(
        &self,
        dependencies: ResolvedDependencies,
        _ctx: &InitContext<'_>,
    ) -> DependencyResult<Instance> {
        (self.factory_fn)(dependencies).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }
}

/// 可由容器构造的组件类型
///
/// 构造后、交付前会调用一次 [`Injectable::initialize`]。
#[async_trait]
pub trait Injectable: Send + Sync + Sized + 'static {
    /// 构造所需的依赖名称，按声明顺序
    fn dependencies() -> Vec<String> {
        Vec::new()
    }

    /// 用已解析的依赖构造实例
    fn construct(dependencies: ResolvedDependencies) -> DependencyResult<Self>;

    /// 初始化钩子
    async fn initialize(&mut self, _ctx: &InitContext<'_>) -> DependencyResult<()> {
        Ok(())
    }
}

/// 构造型工厂：构造 `T` 并运行其初始化钩子
pub struct ConstructFactory<T> {
    name: String,
    component_type: PhantomData<fn() -> T>,
}

impl<T: Injectable> ConstructFactory<T> {
    /// 创建构造型工厂
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            component_type: PhantomData,
        }
    }
}

impl<T: Injectable> Default for ConstructFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ConstructFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructFactory")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<T: Injectable> ComponentFactory for ConstructFactory<T> {
    async fn create(
        &self,
        dependencies: ResolvedDependencies,
        ctx: &InitContext<'_>,
    ) -> DependencyResult<Instance> {
        let mut component = T::construct(dependencies)?;
        component.initialize(ctx).await?;
        Ok(instance(component))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        T::dependencies()
    }
}
