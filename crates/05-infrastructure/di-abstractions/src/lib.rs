//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义按名称注册组件和解析依赖的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentSpec`] / [`ComponentDescriptor`] - 注册输入与描述符
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`ComponentResolver`] - 依赖解析器接口
//! - [`ComponentFactory`] / [`Injectable`] - 组件工厂与可构造组件
//! - [`ComponentEventListener`] - 生命周期事件监听
//! - [`ExposeMethods`] - 组件方法暴露

pub mod events;
pub mod factory;
pub mod methods;
pub mod registry;
pub mod resolver;

pub use events::*;
pub use factory::*;
pub use methods::*;
pub use registry::*;
pub use resolver::*;
