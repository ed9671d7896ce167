//! 组件方法暴露
//!
//! 组件类型实现 [`ExposeMethods`] 后，注册时通过
//! [`ComponentSpec::exposing`](crate::ComponentSpec::exposing) 声明，
//! 即可经由 `component.method` 形式的路径取得绑定到实例上的方法。

use futures::future::BoxFuture;
use infrastructure_common::{DependencyResult, Instance};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

/// 绑定到组件实例的方法
pub type BoundMethod =
    Arc<dyn Fn(Vec<Instance>) -> BoxFuture<'static, DependencyResult<Instance>> + Send + Sync>;

/// 在类型擦除的实例上查找方法
pub type MethodLookup = Arc<dyn Fn(Instance, &str) -> Option<BoundMethod> + Send + Sync>;

/// 按名称暴露方法的组件
pub trait ExposeMethods: Any + Send + Sync {
    /// 返回绑定到 `self` 的方法，名称不存在时返回 `None`
    fn method(self: Arc<Self>, name: &str) -> Option<BoundMethod>;
}

/// 为 `T` 生成方法查找函数
pub fn method_lookup<T: ExposeMethods>() -> MethodLookup {
    Arc::new(|instance: Instance, name: &str| instance.downcast::<T>().ok()?.method(name))
}

/// 把异步闭包包装为 [`BoundMethod`]
pub fn bind_method<F, Fut>(method: F) -> BoundMethod
where
    F: Fn(Vec<Instance>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DependencyResult<Instance>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(method(args)))
}
