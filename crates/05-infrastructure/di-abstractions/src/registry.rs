//! 组件注册表抽象接口

use crate::factory::ComponentFactory;
use crate::methods::{method_lookup, ExposeMethods, MethodLookup};
use async_trait::async_trait;
use infrastructure_common::{instance, ComponentKind, DependencyResult, Instance};
use std::any::Any;
use std::sync::Arc;

/// 组件注册输入
///
/// 由调用方显式选择的四种注册形式。
#[derive(Clone)]
pub enum ComponentSpec {
    /// 已经构造好的对象，原样持有
    Held(Instance),
    /// 首次解析时实例化并缓存
    Loader {
        factory: Arc<dyn ComponentFactory>,
        dependencies: Option<Vec<String>>,
    },
    /// 每次解析都重新实例化
    Factory {
        factory: Arc<dyn ComponentFactory>,
        dependencies: Option<Vec<String>>,
    },
    /// 转发到另一个已注册名称
    Ref(String),
}

impl ComponentSpec {
    /// 持有一个值
    pub fn held<T: Any + Send + Sync>(value: T) -> Self {
        Self::Held(instance(value))
    }

    /// 持有一个已包装的实例
    pub fn held_instance(value: Instance) -> Self {
        Self::Held(value)
    }

    /// 加载器，依赖取自工厂声明
    pub fn loader(factory: impl ComponentFactory + 'static) -> Self {
        Self::Loader {
            factory: Arc::new(factory),
            dependencies: None,
        }
    }

    /// 工厂，依赖取自工厂声明
    pub fn factory(factory: impl ComponentFactory + 'static) -> Self {
        Self::Factory {
            factory: Arc::new(factory),
            dependencies: None,
        }
    }

    /// 别名
    pub fn alias(target: impl Into<String>) -> Self {
        Self::Ref(target.into())
    }

    /// 显式指定依赖，覆盖工厂声明
    pub fn with_dependencies(self, names: &[&str]) -> Self {
        let explicit = Some(names.iter().map(|n| (*n).to_string()).collect());
        match self {
            Self::Loader { factory, .. } => Self::Loader {
                factory,
                dependencies: explicit,
            },
            Self::Factory { factory, .. } => Self::Factory {
                factory,
                dependencies: explicit,
            },
            other => other,
        }
    }

    /// 声明实例类型 `T` 暴露的方法
    pub fn exposing<T: ExposeMethods>(self) -> Registration {
        Registration {
            spec: self,
            methods: Some(method_lookup::<T>()),
        }
    }

    /// 对应的描述符类型
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Held(_) => ComponentKind::Object,
            Self::Loader { .. } => ComponentKind::Loader,
            Self::Factory { .. } => ComponentKind::Factory,
            Self::Ref(_) => ComponentKind::Ref,
        }
    }
}

impl std::fmt::Debug for ComponentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held(_) => f.write_str("Held(<object>)"),
            Self::Loader { factory, dependencies } | Self::Factory { factory, dependencies } => f
                .debug_struct(if matches!(self, Self::Loader { .. }) { "Loader" } else { "Factory" })
                .field("factory", &factory.name())
                .field("dependencies", dependencies)
                .finish(),
            Self::Ref(target) => f.debug_tuple("Ref").field(target).finish(),
        }
    }
}

/// 一次注册的完整输入：注册形式加可选的方法暴露
#[derive(Clone)]
pub struct Registration {
    pub spec: ComponentSpec,
    pub methods: Option<MethodLookup>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("spec", &self.spec)
            .field("methods", &self.methods.as_ref().map(|_| "<methods>"))
            .finish()
    }
}

impl From<ComponentSpec> for Registration {
    fn from(spec: ComponentSpec) -> Self {
        Self {
            spec,
            methods: None,
        }
    }
}

/// 描述符的实例化方式
#[derive(Clone)]
pub enum DescriptorKind {
    /// 持有的对象
    Object,
    /// 加载器
    Loader(Arc<dyn ComponentFactory>),
    /// 工厂
    Factory(Arc<dyn ComponentFactory>),
    /// 别名目标
    Ref(String),
}

/// 组件描述符
///
/// 每个注册名称对应一个；`object` 仅在持有对象或加载器完成实例化后存在。
#[derive(Clone)]
pub struct ComponentDescriptor {
    /// 组件名称
    pub name: String,
    /// 实例化方式
    pub kind: DescriptorKind,
    /// 依赖名称，按声明顺序
    pub dependencies: Vec<String>,
    /// 已持有或已缓存的对象
    pub object: Option<Instance>,
    /// 方法查找
    pub methods: Option<MethodLookup>,
}

impl ComponentDescriptor {
    /// 从注册输入构造描述符
    pub fn from_registration(name: impl Into<String>, registration: Registration) -> Self {
        let Registration { spec, methods } = registration;
        let (kind, dependencies, object) = match spec {
            ComponentSpec::Held(value) => (DescriptorKind::Object, Vec::new(), Some(value)),
            ComponentSpec::Loader {
                factory,
                dependencies,
            } => {
                let dependencies = dependencies.unwrap_or_else(|| factory.dependencies());
                (DescriptorKind::Loader(factory), dependencies, None)
            }
            ComponentSpec::Factory {
                factory,
                dependencies,
            } => {
                let dependencies = dependencies.unwrap_or_else(|| factory.dependencies());
                (DescriptorKind::Factory(factory), dependencies, None)
            }
            ComponentSpec::Ref(target) => (DescriptorKind::Ref(target), Vec::new(), None),
        };

        Self {
            name: name.into(),
            kind,
            dependencies,
            object,
            methods,
        }
    }

    /// 描述符类型
    pub fn component_kind(&self) -> ComponentKind {
        match self.kind {
            DescriptorKind::Object => ComponentKind::Object,
            DescriptorKind::Loader(_) => ComponentKind::Loader,
            DescriptorKind::Factory(_) => ComponentKind::Factory,
            DescriptorKind::Ref(_) => ComponentKind::Ref,
        }
    }

    /// 别名目标
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            DescriptorKind::Ref(target) => Some(target),
            _ => None,
        }
    }

    /// 是否已有可直接返回的对象
    pub fn is_instantiated(&self) -> bool {
        self.object.is_some()
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("kind", &self.component_kind())
            .field("target", &self.target())
            .field("dependencies", &self.dependencies)
            .field("instantiated", &self.is_instantiated())
            .field("factory", &"<function>")
            .finish()
    }
}

/// 组件注册表 trait
///
/// 提供按名称注册组件和查询描述符的核心接口
#[async_trait]
pub trait ComponentRegistry: Send + Sync {
    /// 注册组件，同名注册整体覆盖
    async fn register_component(&self, name: &str, registration: Registration) -> DependencyResult<()>;

    /// 为已注册组件创建别名
    async fn alias_component(&self, alias: &str, original: &str) -> DependencyResult<()> {
        self.register_component(alias, ComponentSpec::alias(original).into())
            .await
    }

    /// 获取描述符副本
    fn get_descriptor(&self, name: &str) -> Option<ComponentDescriptor>;

    /// 按注册顺序列出组件名称
    fn get_component_names(&self) -> Vec<String>;

    /// 检查组件是否已注册
    fn is_registered(&self, name: &str) -> bool {
        self.get_descriptor(name).is_some()
    }
}
