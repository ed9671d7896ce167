//! # Configuration Implementation
//!
//! 配置管理的具体实现。
//!
//! ## 主要组件
//!
//! - [`ConfigStore`] - 分层配置存储，支持路径寻址与占位符交叉引用
//! - [`TomlConfigProvider`] / [`JsonConfigProvider`] / [`YamlConfigProvider`] - 文件配置提供者
//! - [`EnvironmentConfigProvider`] - 环境变量配置提供者
//! - [`load_providers`] - 按优先级合并多个提供者

pub mod providers;
pub mod store;

pub use providers::*;
pub use store::*;
