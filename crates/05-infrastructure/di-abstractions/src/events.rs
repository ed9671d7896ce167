//! 组件生命周期事件定义

use async_trait::async_trait;
use infrastructure_common::ComponentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件生命周期事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEvent {
    /// 事件类型
    pub event_type: ComponentEventType,
    /// 组件名称
    pub name: String,
    /// 描述符类型，解析到未注册名称时为空
    pub kind: Option<ComponentKind>,
    /// 事件发生时的解析路径
    pub path: Vec<String>,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ComponentEvent {
    fn new(event_type: ComponentEventType, name: impl Into<String>) -> Self {
        Self {
            event_type,
            name: name.into(),
            kind: None,
            path: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// 注册前事件
    pub fn before_register(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self::new(ComponentEventType::BeforeRegister, name).with_kind(kind)
    }

    /// 注册后事件
    pub fn after_register(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self::new(ComponentEventType::AfterRegister, name).with_kind(kind)
    }

    /// 解析前事件
    pub fn before_resolve(name: impl Into<String>, path: &[String]) -> Self {
        Self::new(ComponentEventType::BeforeResolve, name).with_path(path)
    }

    /// 解析后事件
    pub fn after_resolve(name: impl Into<String>, kind: ComponentKind, path: &[String]) -> Self {
        Self::new(ComponentEventType::AfterResolve, name)
            .with_kind(kind)
            .with_path(path)
    }

    /// 加载器首次实例化事件
    pub fn instantiate(name: impl Into<String>, path: &[String]) -> Self {
        Self::new(ComponentEventType::Instantiate, name)
            .with_kind(ComponentKind::Loader)
            .with_path(path)
    }

    /// 设置描述符类型
    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// 设置解析路径
    pub fn with_path(mut self, path: &[String]) -> Self {
        self.path = path.to_vec();
        self
    }
}

/// 组件生命周期事件类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ComponentEventType {
    /// 注册前
    BeforeRegister,
    /// 注册后
    AfterRegister,
    /// 解析前
    BeforeResolve,
    /// 解析后
    AfterResolve,
    /// 加载器首次实例化
    Instantiate,
}

impl ComponentEventType {
    /// 全部事件类型
    pub const ALL: [Self; 5] = [
        Self::BeforeRegister,
        Self::AfterRegister,
        Self::BeforeResolve,
        Self::AfterResolve,
        Self::Instantiate,
    ];
}

impl fmt::Display for ComponentEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeforeRegister => "beforeRegister",
            Self::AfterRegister => "afterRegister",
            Self::BeforeResolve => "beforeResolve",
            Self::AfterResolve => "afterResolve",
            Self::Instantiate => "instantiate",
        };
        f.write_str(name)
    }
}

/// 组件事件监听器 trait
#[async_trait]
pub trait ComponentEventListener: Send + Sync {
    /// 处理组件事件
    async fn on_event(&self, event: &ComponentEvent);

    /// 获取监听器名称
    fn name(&self) -> &str;

    /// 检查监听器是否启用
    fn is_enabled(&self) -> bool {
        true
    }

    /// 获取监听器感兴趣的事件类型
    fn interested_event_types(&self) -> Vec<ComponentEventType> {
        ComponentEventType::ALL.to_vec()
    }
}
