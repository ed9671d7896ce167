//! 分层配置存储
//!
//! 以 `serde_json::Value` 树保存配置，按规范化路径读写，
//! 字符串值中的占位符在 [`ConfigStore::resolve`] 时替换为被引用路径的解析结果。

use config_abstractions::{ConfigPath, Delimiters, Segment, TemplateCompiler};
use infrastructure_common::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 相对当前值所在路径的占位符前缀
pub const SELF_MARKER: &str = "$.";

/// 配置存储
#[derive(Debug, Clone)]
pub struct ConfigStore {
    /// 配置树，根节点始终是映射
    data: Value,
    /// 占位符模板编译器
    compiler: TemplateCompiler,
    /// 严格模式下读取未设置的路径会报错
    strict: bool,
    /// 查找失败时回退的上级配置
    parent: Option<Arc<ConfigStore>>,
}

impl ConfigStore {
    /// 使用默认分隔符 `{` `}` 创建配置存储
    pub fn new(data: Value) -> ConfigResult<Self> {
        Self::with_delimiters(data, Delimiters::default())
    }

    /// 使用指定分隔符创建配置存储
    pub fn with_delimiters(data: Value, delimiters: Delimiters) -> ConfigResult<Self> {
        let mut store = Self {
            data: Value::Object(Map::new()),
            compiler: TemplateCompiler::new(delimiters)?,
            strict: true,
            parent: None,
        };
        store.merge(data)?;
        Ok(store)
    }

    /// 设置严格模式
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// 设置上级配置
    pub fn with_parent(mut self, parent: Arc<ConfigStore>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// 是否为严格模式
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// 占位符分隔符
    pub fn delimiters(&self) -> &Delimiters {
        self.compiler.delimiters()
    }

    /// 整棵配置树
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// 读取配置
    ///
    /// 路径不存在时：严格模式返回 [`ConfigError::MissingConfig`]，否则返回 `None`。
    pub fn get(&self, path: &str) -> ConfigResult<Option<&Value>> {
        let parsed = ConfigPath::parse(path)?;
        self.get_path(&parsed)
    }

    /// 读取配置，路径不存在或无效时返回 `None`
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let parsed = ConfigPath::parse(path).ok()?;
        self.lookup_path(&parsed)
    }

    /// 读取配置并反序列化为指定类型
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        let value = self.get(path)?.cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// 路径是否存在
    pub fn has(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// 路径存在时返回其值，否则返回 `fallback`
    pub fn get_or(&self, path: &str, fallback: Value) -> Value {
        self.lookup(path).cloned().unwrap_or(fallback)
    }

    fn get_path(&self, path: &ConfigPath) -> ConfigResult<Option<&Value>> {
        match self.lookup_path(path) {
            Some(value) => Ok(Some(value)),
            None if self.strict => Err(ConfigError::missing(path.to_bracketed())),
            None => Ok(None),
        }
    }

    fn lookup_path(&self, path: &ConfigPath) -> Option<&Value> {
        walk(&self.data, path).or_else(|| {
            self.parent
                .as_deref()
                .and_then(|parent| parent.lookup_path(path))
        })
    }

    /// 写入配置
    ///
    /// 映射和非空序列会展开为逐个叶子写入，已有的同级键保留。
    pub fn set(&mut self, path: &str, value: Value) -> ConfigResult<()> {
        let parsed = ConfigPath::parse(path)?;
        self.set_path(&parsed, value, true)
    }

    /// 写入配置，不展开映射和序列，整体替换
    pub fn set_raw(&mut self, path: &str, value: Value) -> ConfigResult<()> {
        let parsed = ConfigPath::parse(path)?;
        self.set_path(&parsed, value, false)
    }

    /// 从根开始批量合并一个映射
    pub fn merge(&mut self, data: Value) -> ConfigResult<()> {
        match data {
            Value::Null => Ok(()),
            Value::Object(_) => self.set_path(&ConfigPath::root(), data, true),
            other => Err(ConfigError::TypeConversionError {
                message: format!("配置根节点必须是映射, 实际为 {other}"),
            }),
        }
    }

    fn set_path(&mut self, path: &ConfigPath, value: Value, expand: bool) -> ConfigResult<()> {
        let value = if expand {
            match value {
                Value::Object(map) if !map.is_empty() => {
                    for (key, child) in map {
                        self.set_path(&child_path(path, &key)?, child, true)?;
                    }
                    return Ok(());
                }
                Value::Array(items) if !items.is_empty() => {
                    for (index, child) in items.into_iter().enumerate() {
                        self.set_path(&path.child(Segment::Index(index)), child, true)?;
                    }
                    return Ok(());
                }
                // 空容器没有叶子可写，已有容器保持不变
                empty if is_container(walk(&self.data, path)) && is_container(Some(&empty)) => {
                    return Ok(());
                }
                other => other,
            }
        } else {
            value
        };

        if path.is_root() {
            return match value {
                Value::Object(_) => {
                    self.data = value;
                    Ok(())
                }
                _ => Err(ConfigError::invalid_path("", "根节点只能写入映射")),
            };
        }

        let mut node = &mut self.data;
        for segment in path.segments() {
            node = slot(node, segment);
        }
        *node = value;
        Ok(())
    }

    /// 展开整棵配置树
    pub fn flatten(&self) -> Map<String, Value> {
        Self::flatten_value(&self.data)
    }

    /// 展开任意配置节点
    ///
    /// 键为方括号形式的完整路径，例如 `servers[0].host`。
    /// 只有由路径字符组成的键才会继续向下展开，其余键按叶子处理。
    pub fn flatten_value(node: &Value) -> Map<String, Value> {
        let mut out = Map::new();
        flatten_into(node, "", &mut out);
        out
    }

    /// 解析单个路径的值
    ///
    /// 字符串走占位符替换；映射和序列逐个叶子解析后重建；其它标量原样返回。
    pub fn resolve(&self, path: &str) -> ConfigResult<Value> {
        let parsed = ConfigPath::parse(path)?;
        self.resolve_at(&parsed, &mut Vec::new())
    }

    /// 解析一个原始字符串，`path` 为该字符串所在的路径
    ///
    /// 整个字符串恰好是一个占位符时直接返回被引用路径的解析值，保留其类型。
    pub fn resolve_value(&self, raw: &str, path: &str) -> ConfigResult<Value> {
        let parsed = ConfigPath::parse(path)?;
        self.resolve_template(raw, &parsed, &mut Vec::new())
    }

    /// 解析整棵配置树并写回
    ///
    /// 每个叶子都独立地递归解析被引用的原始值，结果与遍历顺序无关。
    /// 所有叶子解析成功后才统一写回，任何一项失败都不会修改配置树。
    pub fn resolve_all(&mut self) -> ConfigResult<Map<String, Value>> {
        let flat = self.flatten();
        let mut resolved = Map::new();
        for path in flat.keys() {
            let value = self.resolve(path)?;
            resolved.insert(path.clone(), value);
        }

        for (path, value) in &resolved {
            self.set(path, value.clone())?;
        }

        info!("配置解析完成，共 {} 项", resolved.len());
        Ok(resolved)
    }

    fn resolve_at(&self, path: &ConfigPath, stack: &mut Vec<String>) -> ConfigResult<Value> {
        let key = path.to_string();
        if stack.contains(&key) {
            let mut chain = stack.clone();
            chain.push(key);
            return Err(ConfigError::CircularReference { chain });
        }

        let Some(raw) = self.get_path(path)? else {
            return Ok(Value::Null);
        };

        stack.push(key);
        let resolved = self.resolve_node(raw, path, stack);
        stack.pop();
        resolved
    }

    fn resolve_node(
        &self,
        node: &Value,
        path: &ConfigPath,
        stack: &mut Vec<String>,
    ) -> ConfigResult<Value> {
        match node {
            Value::String(raw) => self.resolve_template(raw, path, stack),
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, child) in map {
                    let value = self.resolve_node(child, &child_path(path, key)?, stack)?;
                    out.insert(key.clone(), value);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, child)| {
                    self.resolve_node(child, &path.child(Segment::Index(index)), stack)
                })
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Array),
            scalar => Ok(scalar.clone()),
        }
    }

    fn resolve_template(
        &self,
        raw: &str,
        path: &ConfigPath,
        stack: &mut Vec<String>,
    ) -> ConfigResult<Value> {
        let template = self.compiler.compile(raw);

        if let Some(key) = template.single_key() {
            let target = relative_to(key, path)?;
            return self.resolve_at(&target, stack);
        }

        let mut values = HashMap::new();
        for key in template.keys() {
            let target = relative_to(key, path)?;
            let value = self.resolve_at(&target, stack)?;
            debug!("替换占位符 {} -> {}", key, target);
            values.insert(key.clone(), stringify(&value));
        }
        Ok(Value::String(template.render(&values)))
    }

    /// 以子树创建新的配置存储，继承分隔符和严格模式
    pub fn path(&self, sub_path: &str) -> ConfigResult<ConfigStore> {
        let subtree = self.get(sub_path)?.cloned().unwrap_or(Value::Null);
        match subtree {
            Value::Object(_) | Value::Null => self.create(subtree),
            other => Err(ConfigError::TypeConversionError {
                message: format!("配置 {sub_path} 不是映射: {other}"),
            }),
        }
    }

    /// 以新数据创建配置存储，继承分隔符和严格模式
    pub fn create(&self, data: Value) -> ConfigResult<ConfigStore> {
        let mut store = Self {
            data: Value::Object(Map::new()),
            compiler: self.compiler.clone(),
            strict: self.strict,
            parent: None,
        };
        store.merge(data)?;
        Ok(store)
    }

    /// 逐个叶子覆盖写入，未涉及的路径保持不变
    pub fn extend(&mut self, data: &Value) -> ConfigResult<()> {
        let flat = Self::flatten_value(data);
        debug!("扩展配置，共 {} 项", flat.len());
        for (path, value) in flat {
            self.set(&path, value)?;
        }
        Ok(())
    }
}

fn walk<'a>(node: &'a Value, path: &ConfigPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(node, |current, segment| match (current, segment) {
            (Value::Object(map), segment) => map.get(&segment.to_string()),
            (Value::Array(items), Segment::Index(index)) => items.get(*index),
            _ => None,
        })
}

/// 取得容器中某个路径段对应的槽位，必要时创建或改造容器
///
/// 空位先按下一段决定容器类型：下标 `0` 建序列，其余建映射。
/// 序列无法容纳的下标或键会把序列转成以下标字符串为键的映射。
fn slot<'a>(node: &'a mut Value, segment: &Segment) -> &'a mut Value {
    if needs_reshape(node, segment) {
        let old = std::mem::take(node);
        *node = reshape(old, segment);
    }

    match node {
        Value::Array(items) => {
            let index = segment.index().unwrap_or(items.len());
            if index == items.len() {
                items.push(Value::Null);
            }
            &mut items[index]
        }
        Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
        other => other,
    }
}

fn needs_reshape(node: &Value, segment: &Segment) -> bool {
    match (node, segment) {
        (Value::Object(_), _) => false,
        (Value::Array(items), Segment::Index(index)) => *index > items.len(),
        _ => true,
    }
}

fn reshape(old: Value, segment: &Segment) -> Value {
    match (old, segment) {
        (Value::Array(items), _) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        ),
        (_, Segment::Index(0)) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

fn flatten_into(node: &Value, prefix: &str, out: &mut Map<String, Value>) {
    let children: Vec<(String, String, &Value)> = match node {
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| (key.clone(), join_flat(prefix, key), child))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, child)| (index.to_string(), format!("{prefix}[{index}]"), child))
            .collect(),
        _ => return,
    };

    for (key, path, child) in children {
        let descend = match child {
            Value::Object(_) => true,
            Value::Array(items) => !items.is_empty(),
            _ => false,
        };
        if descend && is_path_key(&key) {
            flatten_into(child, &path, out);
        } else {
            out.insert(path, child.clone());
        }
    }
}

fn join_flat(prefix: &str, key: &str) -> String {
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        format!("{prefix}[{key}]")
    } else if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn is_path_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

fn child_path(path: &ConfigPath, key: &str) -> ConfigResult<ConfigPath> {
    if key.is_empty() {
        Ok(path.child(Segment::Key(String::new())))
    } else {
        path.join(key)
    }
}

/// 把占位符键换算为绝对路径，`$.` 开头的键相对于所在值的父路径
fn relative_to(key: &str, path: &ConfigPath) -> ConfigResult<ConfigPath> {
    match key.strip_prefix(SELF_MARKER) {
        Some(relative) => path.parent().unwrap_or_default().join(relative),
        None => ConfigPath::parse(key),
    }
}

fn is_container(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Object(_) | Value::Array(_)))
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
