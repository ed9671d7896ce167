//! # 依赖注入具体实现
//!
//! 提供按名称注册、解析组件的 [`Injector`]：
//!
//! - 四种描述符：持有对象、加载器（首次解析后缓存）、工厂（每次新建）、别名
//! - 沿解析路径检测循环依赖
//! - 同名并发解析共享同一次实例化
//! - 未注册名称委托给上级容器
//! - 生命周期事件分发给已登记的监听器

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use di_abstractions::{
    BoundMethod, ComponentDescriptor, ComponentEvent, ComponentEventListener, ComponentFactory,
    ComponentRegistry, ComponentResolver, ComponentSpec, DescriptorKind, InitContext,
    MethodLookup, Registration,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use infrastructure_common::{downcast, DependencyError, DependencyResult, Instance, ResolveExtra};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 进行中的解析，等待者共享同一个结果
type PendingResolve = Shared<BoxFuture<'static, DependencyResult<Instance>>>;

/// 描述符表，保留注册顺序
#[derive(Default)]
struct Registry {
    descriptors: HashMap<String, ComponentDescriptor>,
    order: Vec<String>,
}

struct Inner {
    id: Uuid,
    parent: Option<Injector>,
    registry: RwLock<Registry>,
    locks: DashMap<String, PendingResolve>,
    listeners: RwLock<Vec<Arc<dyn ComponentEventListener>>>,
}

/// 依赖注入容器
///
/// 克隆得到的是同一个容器的句柄。
#[derive(Clone)]
pub struct Injector {
    inner: Arc<Inner>,
}

impl Injector {
    /// 创建新的容器
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Injector>) -> Self {
        let listeners = parent
            .as_ref()
            .map(|p| p.inner.listeners.read().clone())
            .unwrap_or_default();
        let injector = Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                parent,
                registry: RwLock::new(Registry::default()),
                locks: DashMap::new(),
                listeners: RwLock::new(listeners),
            }),
        };
        debug!("创建容器: {}", injector.inner.id);
        injector
    }

    /// 创建子容器
    ///
    /// 子容器中找不到的名称委托给当前容器解析；监听器在创建时复制一份。
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    /// 容器标识
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// 上级容器
    pub fn parent(&self) -> Option<&Injector> {
        self.inner.parent.as_ref()
    }

    /// 注册组件
    ///
    /// 同名组件整体覆盖。别名的目标必须已在当前容器或上级容器中注册。
    pub async fn register(
        &self,
        name: &str,
        registration: impl Into<Registration>,
    ) -> DependencyResult<()> {
        let registration = registration.into();
        if name.is_empty() {
            return Err(DependencyError::registration(name, "组件名称不能为空"));
        }
        if let ComponentSpec::Ref(target) = &registration.spec {
            if target == name {
                return Err(DependencyError::registration(name, "别名不能指向自身"));
            }
            if !self.is_registered(target) {
                return Err(DependencyError::registration(
                    name,
                    format!("别名目标 {target} 未注册"),
                ));
            }
        }

        let kind = registration.spec.kind();
        self.emit(ComponentEvent::before_register(name, kind)).await;

        let descriptor = ComponentDescriptor::from_registration(name, registration);
        {
            let mut registry = self.inner.registry.write();
            if registry
                .descriptors
                .insert(name.to_string(), descriptor)
                .is_none()
            {
                registry.order.push(name.to_string());
            }
        }
        info!("注册组件: {} ({})", name, kind);

        self.emit(ComponentEvent::after_register(name, kind)).await;
        Ok(())
    }

    /// 为已注册组件创建别名
    pub async fn alias(&self, alias: &str, original: &str) -> DependencyResult<()> {
        self.register(alias, ComponentSpec::alias(original)).await
    }

    /// 获取当前容器中的描述符副本
    pub fn descriptor(&self, name: &str) -> Option<ComponentDescriptor> {
        self.inner.registry.read().descriptors.get(name).cloned()
    }

    /// 沿上级容器链查找描述符副本
    fn find_descriptor(&self, name: &str) -> Option<ComponentDescriptor> {
        self.descriptor(name)
            .or_else(|| self.inner.parent.as_ref()?.find_descriptor(name))
    }

    /// 名称是否已在当前容器或上级容器中注册
    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.registry.read().descriptors.contains_key(name)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_registered(name))
    }

    /// 当前容器的组件名称，按注册顺序
    pub fn component_names(&self) -> Vec<String> {
        self.inner.registry.read().order.clone()
    }

    /// 登记事件监听器
    pub fn add_listener(&self, listener: Arc<dyn ComponentEventListener>) {
        debug!("登记组件事件监听器: {}", listener.name());
        self.inner.listeners.write().push(listener);
    }

    /// 按名称移除事件监听器
    pub fn remove_listener(&self, name: &str) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|listener| listener.name() != name);
        before != listeners.len()
    }

    async fn emit(&self, event: ComponentEvent) {
        let listeners = self.inner.listeners.read().clone();
        for listener in listeners {
            if listener.is_enabled()
                && listener
                    .interested_event_types()
                    .contains(&event.event_type)
            {
                listener.on_event(&event).await;
            }
        }
    }

    /// 解析组件
    ///
    /// `path` 中已出现的名称再次出现即为循环依赖。
    /// 同一名称已有解析在进行时，等待并共享其结果；解析结束（无论成败）后释放。
    pub fn resolve<'a>(
        &'a self,
        name: &'a str,
        extra: &'a ResolveExtra,
        path: &'a [String],
    ) -> BoxFuture<'a, DependencyResult<Instance>> {
        async move {
            if path.iter().any(|seen| seen == name) {
                let mut chain = path.to_vec();
                chain.push(name.to_string());
                warn!("检测到循环依赖: {}", chain.join("->"));
                return Err(DependencyError::CircularDependency { chain });
            }

            let mut path = path.to_vec();
            path.push(name.to_string());

            let pending = match self.inner.locks.entry(name.to_string()) {
                Entry::Occupied(entry) => {
                    debug!("等待进行中的解析: {}", name);
                    entry.get().clone()
                }
                Entry::Vacant(entry) => {
                    let injector = self.clone();
                    let name = name.to_string();
                    let extra = extra.clone();
                    let pending = async move {
                        let result = injector.resolve_inner(&name, &extra, &path).await;
                        injector.inner.locks.remove(&name);
                        result
                    }
                    .boxed()
                    .shared();
                    entry.insert(pending.clone());
                    pending
                }
            };

            pending.await
        }
        .boxed()
    }

    fn resolve_inner<'a>(
        &'a self,
        name: &'a str,
        extra: &'a ResolveExtra,
        path: &'a [String],
    ) -> BoxFuture<'a, DependencyResult<Instance>> {
        async move {
            self.emit(ComponentEvent::before_resolve(name, path)).await;

            let Some(descriptor) = self.descriptor(name) else {
                if let Some(parent) = &self.inner.parent {
                    debug!("委托上级容器解析: {}", name);
                    let caller_path = &path[..path.len().saturating_sub(1)];
                    return parent.resolve(name, extra, caller_path).await;
                }
                let required_by = (path.len() > 1).then(|| path.join("->"));
                warn!("组件未注册: {}", name);
                return Err(DependencyError::UnresolvedComponent {
                    name: name.to_string(),
                    required_by,
                });
            };
            let kind = descriptor.component_kind();

            if let DescriptorKind::Ref(target) = &descriptor.kind {
                let value = self.resolve(target, extra, path).await?;
                self.emit(ComponentEvent::after_resolve(name, kind, path))
                    .await;
                return Ok(value);
            }

            let extra = extra.for_component(name);
            let value = match (&descriptor.object, &descriptor.kind) {
                (Some(object), _) => Arc::clone(object),
                (None, DescriptorKind::Factory(factory)) => {
                    let dependencies = self
                        .dependencies(&descriptor.dependencies, &extra, path)
                        .await?;
                    let ctx = InitContext::new(self, &extra, path);
                    factory.create(dependencies, &ctx).await?
                }
                (None, DescriptorKind::Loader(factory)) => {
                    let dependencies = self
                        .dependencies(&descriptor.dependencies, &extra, path)
                        .await?;
                    let ctx = InitContext::new(self, &extra, path);
                    let value = factory.create(dependencies, &ctx).await?;
                    self.memoize(name, &value);
                    self.emit(ComponentEvent::instantiate(name, path)).await;
                    value
                }
                (None, _) => {
                    return Err(DependencyError::Resolution {
                        name: name.to_string(),
                    })
                }
            };

            debug!("解析组件完成: {} ({})", name, kind);
            self.emit(ComponentEvent::after_resolve(name, kind, path))
                .await;
            Ok(value)
        }
        .boxed()
    }

    fn memoize(&self, name: &str, value: &Instance) {
        let mut registry = self.inner.registry.write();
        if let Some(descriptor) = registry.descriptors.get_mut(name) {
            if matches!(descriptor.kind, DescriptorKind::Loader(_)) {
                descriptor.object = Some(Arc::clone(value));
            }
        }
    }

    /// 从根路径解析组件
    pub async fn get(&self, name: &str) -> DependencyResult<Instance> {
        self.resolve(name, &ResolveExtra::new(), &[]).await
    }

    /// 从根路径解析组件并还原为具体类型
    pub async fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> DependencyResult<Arc<T>> {
        let value = self.get(name).await?;
        downcast::<T>(name, &value)
    }

    /// 解析工厂声明的依赖并调用工厂
    ///
    /// 结果不会被注册或缓存。
    pub async fn execute(&self, factory: &dyn ComponentFactory) -> DependencyResult<Instance> {
        let extra = ResolveExtra::new();
        let dependencies = self
            .dependencies(&factory.dependencies(), &extra, &[])
            .await?;
        let ctx = InitContext::new(self, &extra, &[]);
        factory.create(dependencies, &ctx).await
    }

    /// 解析 `component.method` 形式的路径，返回绑定到组件实例的方法
    pub async fn resolve_method(&self, path: &str) -> DependencyResult<BoundMethod> {
        let not_found = |component: &str, method: &str| DependencyError::MethodNotFound {
            component: component.to_string(),
            method: method.to_string(),
        };
        let (component, method) = path
            .rsplit_once('.')
            .ok_or_else(|| not_found(path, ""))?;

        let object = self.get(component).await?;
        let lookup = self
            .method_lookup(component)
            .ok_or_else(|| not_found(component, method))?;
        lookup(object, method).ok_or_else(|| not_found(component, method))
    }

    /// 沿别名链找到声明了方法暴露的描述符
    fn method_lookup(&self, name: &str) -> Option<MethodLookup> {
        let mut visited = HashSet::new();
        let mut current = name.to_string();
        loop {
            let descriptor = self.find_descriptor(&current)?;
            if let Some(methods) = &descriptor.methods {
                return Some(Arc::clone(methods));
            }
            let target = descriptor.target()?.to_string();
            if !visited.insert(current) {
                return None;
            }
            current = target;
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.inner.id)
            .field("components", &self.component_names())
            .field("in_flight", &self.inner.locks.len())
            .field("parent", &self.inner.parent.as_ref().map(Injector::id))
            .finish()
    }
}

#[async_trait]
impl ComponentResolver for Injector {
    async fn resolve(
        &self,
        name: &str,
        extra: &ResolveExtra,
        path: &[String],
    ) -> DependencyResult<Instance> {
        Injector::resolve(self, name, extra, path).await
    }
}

#[async_trait]
impl ComponentRegistry for Injector {
    async fn register_component(&self, name: &str, registration: Registration) -> DependencyResult<()> {
        self.register(name, registration).await
    }

    fn get_descriptor(&self, name: &str) -> Option<ComponentDescriptor> {
        self.descriptor(name)
    }

    fn get_component_names(&self) -> Vec<String> {
        self.component_names()
    }

    fn is_registered(&self, name: &str) -> bool {
        Injector::is_registered(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{
        bind_method, ComponentEventType, ExposeMethods, FnFactory, Injectable, ResolvedDependencies,
    };
    use infrastructure_common::{instance, ComponentKind, ResolveMeta, META_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_loader(counter: &Arc<AtomicUsize>, deps: &[&str]) -> ComponentSpec {
        let counter = Arc::clone(counter);
        ComponentSpec::loader(FnFactory::sync(deps, move |_| {
            Ok(instance(counter.fetch_add(1, Ordering::SeqCst) + 1))
        }))
    }

    fn unit_loader(deps: &[&str]) -> ComponentSpec {
        ComponentSpec::loader(FnFactory::sync(deps, |_| Ok(instance(()))))
    }

    #[tokio::test]
    async fn cycle_reports_first_repeated_name() {
        let injector = Injector::new();
        injector.register("a", unit_loader(&["b"])).await.unwrap();
        injector.register("b", unit_loader(&["c"])).await.unwrap();
        injector.register("c", unit_loader(&["b"])).await.unwrap();

        let err = injector.get("a").await.unwrap_err();
        assert_eq!(
            err,
            DependencyError::CircularDependency {
                chain: vec!["a".into(), "b".into(), "c".into(), "b".into()]
            }
        );
        assert!(err.to_string().contains("a->b->c->b"));
    }

    #[tokio::test]
    async fn loader_is_memoized_and_factory_is_not() {
        let injector = Injector::new();
        let loads = Arc::new(AtomicUsize::new(0));
        let builds = Arc::new(AtomicUsize::new(0));
        injector.register("single", counting_loader(&loads, &[])).await.unwrap();
        let builds_ref = Arc::clone(&builds);
        injector
            .register(
                "fresh",
                ComponentSpec::factory(FnFactory::sync(&[], move |_| {
                    Ok(instance(builds_ref.fetch_add(1, Ordering::SeqCst)))
                })),
            )
            .await
            .unwrap();

        let first = injector.get("single").await.unwrap();
        let second = injector.get("single").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(injector.descriptor("single").unwrap().is_instantiated());

        let a = injector.get("fresh").await.unwrap();
        let b = injector.get("fresh").await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert!(!injector.descriptor("fresh").unwrap().is_instantiated());
    }

    #[tokio::test]
    async fn concurrent_resolution_instantiates_once() {
        let injector = Injector::new();
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        injector
            .register(
                "slow",
                ComponentSpec::loader(FnFactory::new(&[], move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(instance(counter.fetch_add(1, Ordering::SeqCst)))
                    }
                })),
            )
            .await
            .unwrap();

        let (a, b) = tokio::join!(injector.get("slow"), injector.get("slow"));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(injector.inner.locks.len(), 0);
    }

    #[tokio::test]
    async fn failed_loader_is_retried() {
        let injector = Injector::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        injector
            .register(
                "flaky",
                ComponentSpec::loader(FnFactory::sync(&[], move |_| {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(DependencyError::creation_failed("flaky", "首次失败"))
                    } else {
                        Ok(instance("ok"))
                    }
                })),
            )
            .await
            .unwrap();

        assert!(injector.get("flaky").await.is_err());
        assert_eq!(*injector.resolve_as::<&str>("flaky").await.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn alias_shares_instance_and_rejects_unknown_target() {
        let injector = Injector::new();
        let loads = Arc::new(AtomicUsize::new(0));
        injector.register("a", counting_loader(&loads, &[])).await.unwrap();
        injector.alias("b", "a").await.unwrap();
        injector.alias("c", "b").await.unwrap();

        let a = injector.get("a").await.unwrap();
        assert!(Arc::ptr_eq(&injector.get("b").await.unwrap(), &a));
        assert!(Arc::ptr_eq(&injector.get("c").await.unwrap(), &a));
        assert_eq!(injector.descriptor("c").unwrap().target(), Some("b"));

        assert!(matches!(
            injector.alias("d", "nope").await,
            Err(DependencyError::Registration { .. })
        ));
        assert!(matches!(
            injector.alias("a", "a").await,
            Err(DependencyError::Registration { .. })
        ));
    }

    #[tokio::test]
    async fn unresolved_dependency_names_requiring_chain() {
        let injector = Injector::new();
        injector.register("app", unit_loader(&["repo"])).await.unwrap();
        injector.register("repo", unit_loader(&["db"])).await.unwrap();

        match injector.get("app").await {
            Err(DependencyError::UnresolvedComponent { name, required_by }) => {
                assert_eq!(name, "db");
                assert_eq!(required_by.as_deref(), Some("app->repo->db"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        match injector.get("db").await {
            Err(DependencyError::UnresolvedComponent { required_by, .. }) => {
                assert!(required_by.is_none());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn extra_satisfies_dependencies_and_carries_meta() {
        let injector = Injector::new();
        injector
            .register(
                "service",
                ComponentSpec::factory(FnFactory::sync(&["port", META_KEY], |deps| {
                    let port = deps.get::<u16>("port")?;
                    let meta = deps.get::<ResolveMeta>(META_KEY)?;
                    Ok(instance(format!("{}:{}:{:?}", meta.name, port, meta.caller)))
                })),
            )
            .await
            .unwrap();

        let extra = ResolveExtra::new().with("port", instance(8080_u16));
        let value = injector.resolve("service", &extra, &[]).await.unwrap();
        assert_eq!(
            downcast::<String>("service", &value).unwrap().as_str(),
            "service:8080:None"
        );

        let outer = ResolveExtra::new()
            .with("port", instance(1_u16))
            .for_component("app");
        let value = injector.resolve("service", &outer, &[]).await.unwrap();
        assert_eq!(
            downcast::<String>("service", &value).unwrap().as_str(),
            "service:1:Some(\"app\")"
        );
    }

    #[tokio::test]
    async fn child_delegates_misses_to_parent() {
        let parent = Injector::new();
        parent.register("shared", ComponentSpec::held(1_u32)).await.unwrap();
        parent.register("cfg", ComponentSpec::held("parent")).await.unwrap();

        let child = parent.child();
        child.register("cfg", ComponentSpec::held("child")).await.unwrap();
        child.register("user", unit_loader(&["shared"])).await.unwrap();
        child.alias("s", "shared").await.unwrap();

        assert_eq!(*child.resolve_as::<u32>("shared").await.unwrap(), 1);
        assert_eq!(*child.resolve_as::<&str>("cfg").await.unwrap(), "child");
        assert_eq!(*parent.resolve_as::<&str>("cfg").await.unwrap(), "parent");
        assert!(child.get("user").await.is_ok());
        assert_eq!(*child.resolve_as::<u32>("s").await.unwrap(), 1);
        assert_eq!(child.component_names(), vec!["cfg", "user", "s"]);
        assert_eq!(child.parent().map(Injector::id), Some(parent.id()));
    }

    #[tokio::test]
    async fn overwrite_replaces_descriptor_entirely() {
        let injector = Injector::new();
        injector.register("x", ComponentSpec::held(1_u8)).await.unwrap();
        injector.register("x", unit_loader(&["y"])).await.unwrap();

        let descriptor = injector.descriptor("x").unwrap();
        assert_eq!(descriptor.component_kind(), ComponentKind::Loader);
        assert!(descriptor.object.is_none());
        assert_eq!(injector.component_names(), vec!["x"]);
    }

    struct Greeter {
        greeting: String,
        suffix: String,
    }

    #[async_trait]
    impl Injectable for Greeter {
        fn dependencies() -> Vec<String> {
            vec!["greeting".into()]
        }

        fn construct(dependencies: ResolvedDependencies) -> DependencyResult<Self> {
            Ok(Self {
                greeting: dependencies.get::<String>("greeting")?.to_string(),
                suffix: String::new(),
            })
        }

        async fn initialize(&mut self, ctx: &InitContext<'_>) -> DependencyResult<()> {
            self.suffix = ctx.resolve_as::<String>("suffix").await?.to_string();
            Ok(())
        }
    }

    impl ExposeMethods for Greeter {
        fn method(self: Arc<Self>, name: &str) -> Option<BoundMethod> {
            match name {
                "greet" => Some(bind_method(move |args| {
                    let who = args
                        .first()
                        .and_then(|arg| Arc::clone(arg).downcast::<String>().ok())
                        .map(|who| who.to_string())
                        .unwrap_or_default();
                    let line = format!("{}, {}{}", self.greeting, who, self.suffix);
                    async move { Ok(instance(line)) }
                })),
                _ => None,
            }
        }
    }

    async fn greeter_injector() -> Injector {
        let injector = Injector::new();
        injector
            .register("greeting", ComponentSpec::held(String::from("hello")))
            .await
            .unwrap();
        injector
            .register("suffix", ComponentSpec::held(String::from("!")))
            .await
            .unwrap();
        injector
            .register(
                "greeter",
                ComponentSpec::loader(di_abstractions::ConstructFactory::<Greeter>::new())
                    .exposing::<Greeter>(),
            )
            .await
            .unwrap();
        injector
    }

    #[tokio::test]
    async fn construct_factory_runs_initialize_hook() {
        let injector = greeter_injector().await;
        let greeter = injector.resolve_as::<Greeter>("greeter").await.unwrap();
        assert_eq!(greeter.greeting, "hello");
        assert_eq!(greeter.suffix, "!");
    }

    #[tokio::test]
    async fn resolve_method_binds_to_instance() {
        let injector = greeter_injector().await;
        injector.alias("g", "greeter").await.unwrap();

        let greet = injector.resolve_method("g.greet").await.unwrap();
        let line = greet(vec![instance(String::from("world"))]).await.unwrap();
        assert_eq!(
            downcast::<String>("greet", &line).unwrap().as_str(),
            "hello, world!"
        );

        assert!(matches!(
            injector.resolve_method("greeter.missing").await,
            Err(DependencyError::MethodNotFound { .. })
        ));
        assert!(matches!(
            injector.resolve_method("greeting.len").await,
            Err(DependencyError::MethodNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn execute_resolves_declared_dependencies() {
        let injector = greeter_injector().await;
        let factory = FnFactory::sync(&["greeting", "suffix"], |deps| {
            let greeting = deps.get::<String>("greeting")?;
            let suffix = deps.get::<String>("suffix")?;
            Ok(instance(format!("{greeting}{suffix}")))
        });
        let value = injector.execute(&factory).await.unwrap();
        assert_eq!(downcast::<String>("x", &value).unwrap().as_str(), "hello!");

        let greeter = injector
            .execute(&di_abstractions::ConstructFactory::<Greeter>::new())
            .await
            .unwrap();
        assert_eq!(downcast::<Greeter>("greeter", &greeter).unwrap().suffix, "!");
        assert!(injector.descriptor("greeter").unwrap().object.is_none());
    }

    struct Recorder {
        name: String,
        only: Option<ComponentEventType>,
        events: parking_lot::Mutex<Vec<(ComponentEventType, String)>>,
    }

    impl Recorder {
        fn new(name: &str, only: Option<ComponentEventType>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                only,
                events: parking_lot::Mutex::new(Vec::new()),
            })
        }

        fn take(&self) -> Vec<(ComponentEventType, String)> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    #[async_trait]
    impl ComponentEventListener for Recorder {
        async fn on_event(&self, event: &ComponentEvent) {
            self.events
                .lock()
                .push((event.event_type, event.name.clone()));
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn interested_event_types(&self) -> Vec<ComponentEventType> {
            match self.only {
                Some(only) => vec![only],
                None => ComponentEventType::ALL.to_vec(),
            }
        }
    }

    #[tokio::test]
    async fn listeners_observe_lifecycle_in_order() {
        use ComponentEventType::*;

        let injector = Injector::new();
        let all = Recorder::new("all", None);
        let instantiations = Recorder::new("instantiate", Some(Instantiate));
        injector.add_listener(all.clone());
        injector.add_listener(instantiations.clone());

        injector.register("dep", ComponentSpec::held(1_u8)).await.unwrap();
        injector.register("svc", unit_loader(&["dep"])).await.unwrap();
        injector.get("svc").await.unwrap();
        injector.get("svc").await.unwrap();

        let recorded = all.take();
        let expected: Vec<(ComponentEventType, String)> = vec![
            (BeforeRegister, "dep"),
            (AfterRegister, "dep"),
            (BeforeRegister, "svc"),
            (AfterRegister, "svc"),
            (BeforeResolve, "svc"),
            (BeforeResolve, "dep"),
            (AfterResolve, "dep"),
            (Instantiate, "svc"),
            (AfterResolve, "svc"),
            (BeforeResolve, "svc"),
            (AfterResolve, "svc"),
        ]
        .into_iter()
        .map(|(t, n)| (t, n.to_string()))
        .collect();
        assert_eq!(recorded, expected);
        assert_eq!(instantiations.take(), vec![(Instantiate, "svc".to_string())]);

        assert!(injector.remove_listener("all"));
        assert!(!injector.remove_listener("all"));
        injector.get("svc").await.unwrap();
        assert!(all.take().is_empty());
    }
}
