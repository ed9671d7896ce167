//! 配置提供者实现

use crate::store::ConfigStore;
use async_trait::async_trait;
use config_abstractions::ConfigProvider;
use infrastructure_common::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 读取配置文件内容
async fn read_file(path: &Path) -> ConfigResult<String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

/// TOML 配置提供者
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    file_path: PathBuf,
    priority: i32,
}

impl TomlConfigProvider {
    /// 创建新的 TOML 配置提供者
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            priority: 100,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 将 TOML 值转换为 JSON 值
    fn toml_to_json(value: toml::Value) -> Value {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        }
    }
}

#[async_trait]
impl ConfigProvider for TomlConfigProvider {
    async fn load(&self) -> Result<Value, ConfigError> {
        debug!("加载 TOML 配置文件: {}", self.file_path.display());
        let content = read_file(&self.file_path).await?;
        let table: toml::Table = toml::from_str(&content).map_err(ConfigError::parse)?;
        Ok(Self::toml_to_json(toml::Value::Table(table)))
    }

    fn name(&self) -> &str {
        "TomlConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// JSON 配置提供者
#[derive(Debug, Clone)]
pub struct JsonConfigProvider {
    file_path: PathBuf,
    priority: i32,
}

impl JsonConfigProvider {
    /// 创建新的 JSON 配置提供者
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            priority: 90,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl ConfigProvider for JsonConfigProvider {
    async fn load(&self) -> Result<Value, ConfigError> {
        debug!("加载 JSON 配置文件: {}", self.file_path.display());
        let content = read_file(&self.file_path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    fn name(&self) -> &str {
        "JsonConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// YAML 配置提供者
#[derive(Debug, Clone)]
pub struct YamlConfigProvider {
    file_path: PathBuf,
    priority: i32,
}

impl YamlConfigProvider {
    /// 创建新的 YAML 配置提供者
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            priority: 90,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl ConfigProvider for YamlConfigProvider {
    async fn load(&self) -> Result<Value, ConfigError> {
        debug!("加载 YAML 配置文件: {}", self.file_path.display());
        let content = read_file(&self.file_path).await?;
        let value: Option<Value> = serde_yaml::from_str(&content).map_err(ConfigError::parse)?;
        Ok(value.unwrap_or(Value::Null))
    }

    fn name(&self) -> &str {
        "YamlConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 环境变量配置提供者
///
/// `PREFIX_A__B=v` 映射为 `{ "a": { "b": v } }`，值会尝试解析为布尔和数字。
#[derive(Debug, Clone)]
pub struct EnvironmentConfigProvider {
    prefix: String,
    separator: String,
    priority: i32,
    vars: Option<Vec<(String, String)>>,
}

impl EnvironmentConfigProvider {
    /// 创建新的环境变量配置提供者
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: "__".to_string(),
            priority: 200,
            vars: None,
        }
    }

    /// 设置层级分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 使用固定的变量集合代替进程环境
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// 将环境变量键转换为配置键路径
    fn env_key_to_config_keys(&self, env_key: &str) -> Option<Vec<String>> {
        let key = env_key.strip_prefix(&self.prefix)?.trim_start_matches('_');
        if key.is_empty() {
            return None;
        }
        Some(
            key.split(self.separator.as_str())
                .map(str::to_lowercase)
                .collect(),
        )
    }

    fn collect(&self) -> Vec<(String, String)> {
        match &self.vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        }
    }
}

/// 环境变量值的类型推断
fn parse_env_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Number(i.into())
    } else if let Some(n) = raw
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        Value::Number(n)
    } else {
        Value::String(raw.to_string())
    }
}

fn insert_nested(root: &mut Map<String, Value>, keys: &[String], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut current = root;
    for key in parents {
        let entry = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

#[async_trait]
impl ConfigProvider for EnvironmentConfigProvider {
    async fn load(&self) -> Result<Value, ConfigError> {
        debug!("加载环境变量，前缀: {}", self.prefix);
        let mut root = Map::new();
        let mut count = 0;
        for (key, value) in self.collect() {
            if let Some(keys) = self.env_key_to_config_keys(&key) {
                insert_nested(&mut root, &keys, parse_env_value(&value));
                count += 1;
            }
        }
        debug!("加载了 {} 个环境变量", count);
        Ok(Value::Object(root))
    }

    fn name(&self) -> &str {
        "EnvironmentConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 按优先级从低到高依次加载提供者并扩展进配置存储
///
/// 同一路径上优先级高的提供者最后写入，因而生效。
pub async fn load_providers(
    store: &mut ConfigStore,
    providers: &[Box<dyn ConfigProvider>],
) -> ConfigResult<()> {
    let mut ordered: Vec<&dyn ConfigProvider> = providers.iter().map(|p| p.as_ref()).collect();
    ordered.sort_by_key(|p| p.priority());

    for provider in ordered {
        let data = provider.load().await?;
        store.extend(&data)?;
        info!(
            "已加载配置提供者 {} (优先级 {})",
            provider.name(),
            provider.priority()
        );
    }
    Ok(())
}
