//! 容器：把配置存储和依赖注入容器组装在一起
//!
//! 构造时合并配置（基础配置、环境配置、外部配置、环境变量），
//! 初始化时解析整棵配置并把结果以 `config` 名称注册为组件，
//! 启动时按顺序解析预加载组件和 `main` 组件。

use crate::listener::TracingEventListener;
use config_abstractions::{ConfigProvider, Delimiters};
use config_impl::{load_providers, ConfigStore};
use di_abstractions::{ComponentSpec, Registration};
use di_impl::Injector;
use infrastructure_common::{
    downcast, instance, DependencyError, InfrastructureError, InfrastructureResult,
    Instance, LifecycleState, ResolveExtra,
};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// 容器选项
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 容器名称，以 `container_name` 注册
    pub name: String,
    /// 运行环境，用于选择 `env_config` 中的分支
    pub env: String,
    /// 基础配置
    pub config: Value,
    /// 按运行环境区分的覆盖配置
    pub env_config: Map<String, Value>,
    /// 外部覆盖配置，最后合并
    pub ext_config: Option<Value>,
    /// 占位符分隔符
    pub delimiters: Delimiters,
    /// 严格模式
    pub strict: bool,
    /// 启动时预先解析的组件
    pub load_on_start: Vec<String>,
    /// 主组件，未设置时读取配置项 `main`
    pub main: Option<String>,
    /// 发布到 `ENV.<KEY>` 的环境变量，未设置时读取进程环境
    #[serde(skip)]
    pub env_vars: Option<Vec<(String, String)>>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            name: "container".to_string(),
            env: "development".to_string(),
            config: Value::Object(Map::new()),
            env_config: Map::new(),
            ext_config: None,
            delimiters: Delimiters::default(),
            strict: true,
            load_on_start: Vec::new(),
            main: None,
            env_vars: None,
        }
    }
}

impl ContainerOptions {
    /// 以基础配置创建选项
    pub fn new(config: Value) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// 设置容器名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置运行环境
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// 添加某个运行环境的覆盖配置
    pub fn with_env_config(mut self, env: impl Into<String>, config: Value) -> Self {
        self.env_config.insert(env.into(), config);
        self
    }

    /// 设置外部覆盖配置
    pub fn with_ext_config(mut self, config: Value) -> Self {
        self.ext_config = Some(config);
        self
    }

    /// 设置占位符分隔符
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// 设置严格模式
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// 添加启动时预先解析的组件
    pub fn load_on_start(mut self, name: impl Into<String>) -> Self {
        self.load_on_start.push(name.into());
        self
    }

    /// 设置主组件
    pub fn with_main(mut self, name: impl Into<String>) -> Self {
        self.main = Some(name.into());
        self
    }

    /// 使用固定的环境变量集合
    pub fn with_env_vars<K: Into<String>, V: Into<String>>(
        mut self,
        vars: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }
}

/// 配置项 `components` 中的组件声明
#[derive(Debug, Clone, Deserialize)]
struct ComponentDeclaration {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "ref")]
    target: Option<String>,
    #[serde(default)]
    load: bool,
}

/// 容器
pub struct Container {
    options: ContainerOptions,
    config: RwLock<ConfigStore>,
    injector: Injector,
    state: Mutex<LifecycleState>,
    initialized: OnceCell<()>,
    load_on_start: Mutex<Vec<String>>,
}

impl Container {
    /// 创建容器
    ///
    /// 依次合并基础配置、`env` 与运行环境、`ENV.<KEY>` 环境变量、当前环境的覆盖配置和外部配置。
    pub fn new(options: ContainerOptions) -> InfrastructureResult<Self> {
        let mut config = ConfigStore::with_delimiters(options.config.clone(), options.delimiters.clone())?
            .with_strict(options.strict);

        config.set("env", Value::String(options.env.clone()))?;
        let vars = options
            .env_vars
            .clone()
            .unwrap_or_else(|| std::env::vars().collect());
        for (key, value) in vars {
            if let Err(e) = config.set_raw(&format!("ENV.{key}"), Value::String(value)) {
                debug!("跳过无法作为配置路径的环境变量 {}: {}", key, e);
            }
        }

        if let Some(env_config) = options.env_config.get(&options.env) {
            config.extend(env_config)?;
        }
        if let Some(ext_config) = &options.ext_config {
            config.extend(ext_config)?;
        }

        let injector = Injector::new();
        injector.add_listener(Arc::new(TracingEventListener::new()));

        info!("创建容器: {} (环境: {})", options.name, options.env);
        Ok(Self {
            load_on_start: Mutex::new(options.load_on_start.clone()),
            options,
            config: RwLock::new(config),
            injector,
            state: Mutex::new(LifecycleState::Uninitialized),
            initialized: OnceCell::new(),
        })
    }

    /// 容器名称
    pub fn name(&self) -> &str {
        &self.options.name
    }

    /// 依赖注入容器
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// 当前配置的副本
    pub fn config(&self) -> ConfigStore {
        self.config.read().clone()
    }

    /// 生命周期状态
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.lock() = state;
    }

    /// 按优先级合并配置提供者，须在初始化之前调用
    pub async fn load_providers(&self, providers: &[Box<dyn ConfigProvider>]) -> InfrastructureResult<()> {
        let mut config = self.config();
        load_providers(&mut config, providers).await?;
        *self.config.write() = config;
        Ok(())
    }

    /// 注册组件
    pub async fn register(
        &self,
        name: &str,
        registration: impl Into<Registration>,
    ) -> InfrastructureResult<()> {
        Ok(self.injector.register(name, registration).await?)
    }

    /// 为已注册组件创建别名
    pub async fn alias(&self, alias: &str, original: &str) -> InfrastructureResult<()> {
        Ok(self.injector.alias(alias, original).await?)
    }

    /// 直接解析组件，不触发初始化
    pub async fn resolve(
        &self,
        name: &str,
        extra: &ResolveExtra,
        path: &[String],
    ) -> InfrastructureResult<Instance> {
        Ok(self.injector.resolve(name, extra, path).await?)
    }

    /// 初始化后解析组件
    pub async fn get(&self, name: &str) -> InfrastructureResult<Instance> {
        self.initialize().await?;
        Ok(self.injector.get(name).await?)
    }

    /// 初始化后解析组件并还原为具体类型
    pub async fn get_as<T: Any + Send + Sync>(&self, name: &str) -> InfrastructureResult<Arc<T>> {
        let value = self.get(name).await?;
        Ok(downcast::<T>(name, &value)?)
    }

    /// 初始化容器
    ///
    /// 并发调用共享同一次初始化；失败后可以重试。
    pub async fn initialize(&self) -> InfrastructureResult<()> {
        self.initialized
            .get_or_try_init(|| self.run_initialize())
            .await
            .map(|_| ())
            .map_err(|e| {
                self.set_state(LifecycleState::Uninitialized);
                e
            })
    }

    async fn run_initialize(&self) -> InfrastructureResult<()> {
        self.set_state(LifecycleState::Initializing);
        info!("容器初始化开始: {}", self.name());

        let resolved = {
            let mut config = self.config.write();
            config.resolve_all()?;
            config.clone()
        };

        self.injector
            .register("config", ComponentSpec::held(resolved.clone()))
            .await?;
        self.injector
            .register("container_name", ComponentSpec::held(self.name().to_string()))
            .await?;
        self.register_declared(&resolved).await?;

        self.set_state(LifecycleState::Initialized);
        info!("容器初始化完成: {}", self.name());
        Ok(())
    }

    /// 注册配置项 `components` 中声明的组件
    ///
    /// 目前只支持 `alias` 类型：`{ "type": "alias", "ref": "<目标>", "load": true }`。
    /// `load` 为真的组件在启动时预先解析。
    async fn register_declared(&self, config: &ConfigStore) -> InfrastructureResult<()> {
        let Some(Value::Object(declarations)) = config.lookup("components") else {
            return Ok(());
        };

        for (name, declaration) in declarations {
            let declaration: ComponentDeclaration = serde_json::from_value(declaration.clone())
                .map_err(|e| bootstrap_failed(format!("组件 {name} 的声明无效: {e}")))?;
            match (declaration.kind.as_str(), &declaration.target) {
                ("alias", Some(target)) => {
                    self.injector.alias(name, target).await?;
                }
                ("alias", None) => {
                    return Err(bootstrap_failed(format!("别名组件 {name} 缺少 ref")));
                }
                (kind, _) => {
                    return Err(bootstrap_failed(format!("组件 {name} 的类型 {kind} 不受支持")));
                }
            }
            if declaration.load {
                self.load_on_start.lock().push(name.clone());
            }
        }
        Ok(())
    }

    /// 启动容器
    ///
    /// 初始化后解析预加载组件，再解析主组件并调用其暴露的 `start` 方法，
    /// 参数为进程命令行。
    pub async fn start(&self) -> InfrastructureResult<()> {
        self.initialize().await?;

        let preload = self.load_on_start.lock().clone();
        for name in &preload {
            debug!("预加载组件: {}", name);
            self.injector.get(name).await?;
        }
        self.set_state(LifecycleState::Running);

        let main = self.options.main.clone().or_else(|| {
            self.config
                .read()
                .lookup("main")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let Some(main) = main else {
            warn!("未配置 main 组件");
            return Ok(());
        };

        self.injector.get(&main).await?;
        match self.injector.resolve_method(&format!("{main}.start")).await {
            Ok(start) => {
                let argv: Vec<String> = std::env::args().collect();
                start(vec![instance(argv)]).await?;
                info!("主组件已启动: {}", main);
            }
            Err(DependencyError::MethodNotFound { .. }) => {
                warn!("主组件 {} 没有 start 方法", main);
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// 停止容器
    ///
    /// 按注册顺序对已有对象的组件调用其暴露的 `destroy` 方法；单个组件清理失败只记录日志。
    pub async fn stop(&self) -> InfrastructureResult<()> {
        for name in self.injector.component_names() {
            let Some(descriptor) = self.injector.descriptor(&name) else {
                continue;
            };
            let (Some(object), Some(methods)) = (descriptor.object, descriptor.methods) else {
                continue;
            };
            let Some(destroy) = methods(object, "destroy") else {
                continue;
            };
            match destroy(Vec::new()).await {
                Ok(_) => debug!("组件已清理: {}", name),
                Err(e) => warn!("组件 {} 清理失败: {}", name, e),
            }
        }

        self.set_state(LifecycleState::Stopped);
        info!("容器已停止: {}", self.name());
        Ok(())
    }
}

fn bootstrap_failed(message: String) -> InfrastructureError {
    InfrastructureError::BootstrapFailed { message }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.options.name)
            .field("env", &self.options.env)
            .field("state", &self.state())
            .field("injector", &self.injector)
            .finish()
    }
}
