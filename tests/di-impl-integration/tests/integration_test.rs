//! 跨 crate 集成测试：依赖注入、配置存储与容器
use async_trait::async_trait;
use config_abstractions::{ConfigProvider, Delimiters};
use config_impl::{ConfigStore, EnvironmentConfigProvider};
use di_abstractions::{
    ComponentSpec, ConstructFactory, FnFactory, InitContext, Injectable, ResolvedDependencies,
};
use di_impl::Injector;
use di_impl_integration_tests::{numbered_factory, numbered_loader, Counter, Numbered};
use infrastructure_common::{
    instance, ConfigError, DependencyError, DependencyResult, InfrastructureError,
};
use infrastructure_composition::{Container, ContainerOptions};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn circular_chain_is_reported_in_order() {
    let injector = Injector::new();
    let counter = Counter::new();
    injector.register("a", numbered_loader(&counter, &["b"])).await.unwrap();
    injector.register("b", numbered_loader(&counter, &["c"])).await.unwrap();
    injector.register("c", numbered_loader(&counter, &["a"])).await.unwrap();

    match injector.get("a").await {
        Err(DependencyError::CircularDependency { chain }) => {
            assert_eq!(chain, vec!["a", "b", "c", "a"]);
        }
        other => panic!("expected circular dependency, got {other:?}"),
    }
    assert_eq!(counter.get(), 0);

    // 失败不会残留解析锁
    injector
        .register("c", numbered_loader(&counter, &[]))
        .await
        .unwrap();
    injector.get("a").await.unwrap();
    assert_eq!(counter.get(), 3);
}

#[tokio::test]
async fn loader_is_singleton_and_factory_is_fresh() -> anyhow::Result<()> {
    let injector = Injector::new();
    let counter = Counter::new();
    injector.register("single", numbered_loader(&counter, &[])).await?;
    injector.register("fresh", numbered_factory(&counter, &[])).await?;

    let first = injector.get("single").await?;
    let second = injector.get("single").await?;
    assert!(Arc::ptr_eq(&first, &second));

    let a = injector.resolve_as::<Numbered>("fresh").await?;
    let b = injector.resolve_as::<Numbered>("fresh").await?;
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.n, b.n);
    Ok(())
}

#[tokio::test]
async fn concurrent_resolution_runs_loader_once() -> anyhow::Result<()> {
    let injector = Injector::new();
    let counter = Counter::new();
    let calls = counter.clone();
    injector
        .register(
            "slow",
            ComponentSpec::loader(FnFactory::new(&[], move |_| {
                let calls = calls.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(instance(Numbered { n: calls.next() }))
                }
            })),
        )
        .await?;

    let first = injector.clone();
    let second = injector.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.get("slow").await }),
        tokio::spawn(async move { second.get("slow").await }),
    );
    let (a, b) = (a??, b??);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(counter.get(), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_failure_is_shared() -> anyhow::Result<()> {
    let injector = Injector::new();
    let counter = Counter::new();
    let calls = counter.clone();
    injector
        .register(
            "bad",
            ComponentSpec::loader(FnFactory::new(&[], move |_| {
                let calls = calls.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    match calls.next() {
                        1 => Err(DependencyError::creation_failed("bad", "首次连接失败")),
                        n => Ok(instance(Numbered { n })),
                    }
                }
            })),
        )
        .await?;

    let (a, b) = tokio::join!(injector.get("bad"), injector.get("bad"));
    let (a, b) = (a.unwrap_err(), b.unwrap_err());
    assert_eq!(a, b);
    assert!(matches!(a, DependencyError::ComponentCreationFailed { .. }));
    assert_eq!(counter.get(), 1);

    // 解析锁已释放，重试会重新实例化
    let retried = injector.resolve_as::<Numbered>("bad").await?;
    assert_eq!(retried.n, 2);
    assert_eq!(counter.get(), 2);
    Ok(())
}

#[tokio::test]
async fn alias_resolves_to_same_instance() -> anyhow::Result<()> {
    let injector = Injector::new();
    injector
        .register("a", numbered_loader(&Counter::new(), &[]))
        .await?;
    injector.alias("b", "a").await?;

    let via_alias = injector.get("b").await?;
    let direct = injector.get("a").await?;
    assert!(Arc::ptr_eq(&via_alias, &direct));
    Ok(())
}

#[tokio::test]
async fn alias_to_unknown_target_is_rejected() {
    let injector = Injector::new();
    let err = injector.alias("b", "nowhere").await.unwrap_err();
    assert!(matches!(err, DependencyError::Registration { .. }));
    assert!(!injector.is_registered("b"));
}

#[tokio::test]
async fn factory_dependency_under_memoized_loader() -> anyhow::Result<()> {
    struct ComB {
        a: Arc<Numbered>,
    }

    let injector = Injector::new();
    let counter = Counter::new();
    injector
        .register("comA", numbered_factory(&counter, &[]))
        .await?;
    injector
        .register(
            "comB",
            ComponentSpec::loader(FnFactory::sync(&["comA"], |deps: ResolvedDependencies| {
                Ok(instance(ComB {
                    a: deps.get::<Numbered>("comA")?,
                }))
            })),
        )
        .await?;

    let com_b = injector.resolve_as::<ComB>("comB").await?;
    assert_eq!(com_b.a.n, 1);
    assert_eq!(counter.get(), 1);

    let com_a = injector.resolve_as::<Numbered>("comA").await?;
    assert_eq!(com_a.n, 2);

    let again = injector.resolve_as::<ComB>("comB").await?;
    assert!(Arc::ptr_eq(&com_b, &again));
    assert_eq!(again.a.n, 1);
    Ok(())
}

#[tokio::test]
async fn child_scope_delegates_and_reports_requirer() {
    let parent = Injector::new();
    let counter = Counter::new();
    parent.register("db", numbered_loader(&counter, &[])).await.unwrap();

    let child = parent.child();
    child
        .register("repo", numbered_loader(&counter, &["db", "cache"]))
        .await
        .unwrap();

    match child.get("repo").await {
        Err(DependencyError::UnresolvedComponent { name, required_by }) => {
            assert_eq!(name, "cache");
            assert_eq!(required_by.as_deref(), Some("repo->cache"));
        }
        other => panic!("expected unresolved component, got {other:?}"),
    }

    let from_child = child.get("db").await.unwrap();
    let from_parent = parent.get("db").await.unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_parent));
}

#[test]
fn config_placeholders_resolve_to_typed_values() -> anyhow::Result<()> {
    let mut config = ConfigStore::new(json!({}))?;
    config.set("a.b", json!("{a.c}"))?;
    config.set("a.c", json!(5))?;
    assert_eq!(config.resolve("a.b")?, json!(5));

    config.set("greeting", json!("n = {a.c}"))?;
    assert_eq!(config.resolve("greeting")?, json!("n = 5"));
    Ok(())
}

#[test]
fn config_escape_marker_is_stripped() -> anyhow::Result<()> {
    let config = ConfigStore::new(json!({ "raw": r"\{escaped}" }))?;
    assert_eq!(config.resolve("raw")?, json!("{escaped}"));
    Ok(())
}

#[test]
fn config_flatten_joins_paths() {
    let flat = ConfigStore::flatten_value(&json!({ "x": 1, "y": { "z": 2 } }));
    assert_eq!(serde_json::Value::Object(flat), json!({ "x": 1, "y.z": 2 }));
}

#[test]
fn config_missing_path_depends_on_strictness() -> anyhow::Result<()> {
    let strict = ConfigStore::new(json!({ "present": true }))?;
    assert!(matches!(
        strict.get("missing"),
        Err(ConfigError::MissingConfig { .. })
    ));

    let lenient = strict.clone().with_strict(false);
    assert!(lenient.get("missing")?.is_none());
    assert_eq!(lenient.get("present")?, Some(&json!(true)));
    Ok(())
}

#[test]
fn config_custom_delimiters() -> anyhow::Result<()> {
    let delimiters = Delimiters::new("${", "}");
    let config = ConfigStore::with_delimiters(
        json!({ "host": "db", "url": "pg://${host}/app", "plain": "{host}" }),
        delimiters,
    )?;
    assert_eq!(config.resolve("url")?, json!("pg://db/app"));
    assert_eq!(config.resolve("plain")?, json!("{host}"));
    Ok(())
}

#[derive(Debug, Deserialize)]
struct DatabaseSettings {
    url: String,
    pool: u32,
}

/// 依赖配置的仓储组件，初始化时再解析一次连接池计数器
struct Repository {
    settings: DatabaseSettings,
    connections: usize,
}

#[async_trait]
impl Injectable for Repository {
    fn dependencies() -> Vec<String> {
        vec!["config".to_string()]
    }

    fn construct(dependencies: ResolvedDependencies) -> DependencyResult<Self> {
        let config = dependencies.get::<ConfigStore>("config")?;
        let settings = config
            .get_as::<DatabaseSettings>("database")
            .map_err(|e| DependencyError::creation_failed("repository", e.to_string()))?;
        Ok(Self {
            settings,
            connections: 0,
        })
    }

    async fn initialize(&mut self, ctx: &InitContext<'_>) -> DependencyResult<()> {
        let pool = ctx.resolve_as::<Numbered>("pool").await?;
        self.connections = pool.n;
        Ok(())
    }
}

#[tokio::test]
async fn container_wires_resolved_config_into_components() -> anyhow::Result<()> {
    let container = Container::new(
        ContainerOptions::new(json!({
            "database": { "host": "localhost", "url": "pg://{database.host}/{ENV.APP_DB}", "pool": 4 }
        }))
        .with_env("test")
        .with_env_config("test", json!({ "database": { "host": "test-db" } }))
        .with_env_vars([("APP_DB", "adsp")]),
    )?;

    let providers: Vec<Box<dyn ConfigProvider>> = vec![Box::new(
        EnvironmentConfigProvider::new("ADSP").with_vars([("ADSP_DATABASE__POOL", "8")]),
    )];
    container.load_providers(&providers).await?;

    let counter = Counter::new();
    container
        .register("pool", numbered_loader(&counter, &[]))
        .await?;
    container
        .register("repository", ComponentSpec::loader(ConstructFactory::<Repository>::new()))
        .await?;

    let repository = container.get_as::<Repository>("repository").await?;
    assert_eq!(repository.settings.url, "pg://test-db/adsp");
    assert_eq!(repository.settings.pool, 8);
    assert_eq!(repository.connections, 1);
    Ok(())
}

#[tokio::test]
async fn container_surfaces_missing_config_on_initialize() {
    let container =
        Container::new(ContainerOptions::new(json!({ "url": "{missing.host}" }))).unwrap();
    let err = container.get("config").await.unwrap_err();
    assert!(matches!(
        err,
        InfrastructureError::ConfigError {
            source: ConfigError::MissingConfig { .. }
        }
    ));
}
