//! # 基础设施组合层
//!
//! 把配置存储和依赖注入容器组合成一个可运行的容器。
//!
//! ## 主要功能
//!
//! - **容器**: 合并多层配置，初始化时解析配置并注册为 `config` 组件
//! - **启动流程**: 预加载组件后调用主组件的 `start` 方法
//! - **日志**: 初始化 tracing 订阅者，并把组件事件输出为日志
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{init_logging, Container, ContainerOptions, LoggingConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LoggingConfig::development())?;
//!
//!     let container = Container::new(
//!         ContainerOptions::new(json!({ "app": { "name": "adsp", "title": "{app.name} server" } }))
//!             .with_env("production"),
//!     )?;
//!     container.initialize().await?;
//!
//!     let title = container.config().resolve("app.title")?;
//!     println!("应用标题: {}", title);
//!
//!     container.start().await?;
//!     container.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod container;
pub mod listener;
pub mod logging;

pub use container::{Container, ContainerOptions};
pub use listener::TracingEventListener;
pub use logging::{init_logging, LoggingConfig};

pub use infrastructure_common::{InfrastructureError, InfrastructureResult};
