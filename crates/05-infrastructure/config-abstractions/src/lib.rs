//! # Configuration Abstractions
//!
//! 配置管理抽象层，定义配置路径、占位符模板和配置来源。
//!
//! ## 核心接口
//!
//! - [`ConfigPath`] - 点号/方括号路径的规范形式
//! - [`TemplateCompiler`] - 占位符模板编译器
//! - [`ConfigProvider`] - 配置提供者接口

pub mod path;
pub mod provider;
pub mod template;

pub use path::*;
pub use provider::*;
pub use template::*;
