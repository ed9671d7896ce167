//! 把组件生命周期事件桥接到 tracing

use async_trait::async_trait;
use di_abstractions::{ComponentEvent, ComponentEventListener, ComponentEventType};
use tracing::{debug, info};

/// 输出组件事件日志的监听器
#[derive(Debug, Clone)]
pub struct TracingEventListener {
    name: String,
    event_types: Vec<ComponentEventType>,
}

impl TracingEventListener {
    /// 监听器名称
    pub const NAME: &'static str = "tracing";

    /// 创建监听全部事件的监听器
    pub fn new() -> Self {
        Self {
            name: Self::NAME.to_string(),
            event_types: ComponentEventType::ALL.to_vec(),
        }
    }

    /// 只监听指定的事件类型
    pub fn with_event_types(mut self, event_types: &[ComponentEventType]) -> Self {
        self.event_types = event_types.to_vec();
        self
    }
}

impl Default for TracingEventListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComponentEventListener for TracingEventListener {
    async fn on_event(&self, event: &ComponentEvent) {
        let kind = event.kind.map(|k| k.to_string()).unwrap_or_default();
        match event.event_type {
            ComponentEventType::Instantiate => {
                info!(component = %event.name, path = %event.path.join("->"), "组件实例化完成");
            }
            event_type => {
                debug!(component = %event.name, kind = %kind, path = %event.path.join("->"), "{}", event_type);
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn interested_event_types(&self) -> Vec<ComponentEventType> {
        self.event_types.clone()
    }
}
