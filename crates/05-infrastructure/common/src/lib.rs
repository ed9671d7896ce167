//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn ADSP 平台基础设施层的公共类型。
//!
//! ## 核心内容
//!
//! - [`Instance`] - 类型擦除的组件实例
//! - [`ResolveExtra`] / [`ResolveMeta`] - 单次解析的附加依赖与元数据
//! - [`ComponentKind`] - 组件描述符类型
//! - [`DependencyError`] / [`ConfigError`] - 依赖注入与配置的错误类型

pub mod component;
pub mod errors;
pub mod lifecycle;

pub use component::*;
pub use errors::*;
pub use lifecycle::*;
