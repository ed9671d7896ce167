//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("找不到配置: {path}")]
    MissingConfig { path: String },

    #[error("配置路径无效: {path}, 原因: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("占位符分隔符无效: left={left:?}, right={right:?}")]
    InvalidDelimiters { left: String, right: String },

    #[error("检测到配置循环引用: {}", .chain.join("->"))]
    CircularReference { chain: Vec<String> },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },

    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// 创建路径缺失错误
    pub fn missing(path: impl Into<String>) -> Self {
        Self::MissingConfig { path: path.into() }
    }

    /// 创建路径无效错误
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 包装第三方解析错误
    pub fn parse(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ParseError {
            source: Box::new(source),
        }
    }
}

/// 依赖注入错误类型
///
/// 需要 `Clone`：同一名称的并发解析共享一个结果，失败也要原样交给每个等待者。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("组件注册失败: {name}, 原因: {message}")]
    Registration { name: String, message: String },

    #[error("检测到循环依赖 {}: {}", .chain.last().map_or("", String::as_str), .chain.join("->"))]
    CircularDependency { chain: Vec<String> },

    #[error("无法解析 {name}: 组件未注册{}", .required_by.as_ref().map(|chain| format!("\nrequired by: {chain}")).unwrap_or_default())]
    UnresolvedComponent {
        name: String,
        required_by: Option<String>,
    },

    #[error("无法解析组件 {name}: 描述符没有产生可用的对象")]
    Resolution { name: String },

    #[error("找不到组件 '{component}' 的方法 '{method}'")]
    MethodNotFound { component: String, method: String },

    #[error("组件创建失败: {name}, 原因: {reason}")]
    ComponentCreationFailed { name: String, reason: String },

    #[error("组件类型不匹配: {name}, 期望 {expected}")]
    TypeMismatch { name: String, expected: String },
}

impl DependencyError {
    /// 创建注册错误
    pub fn registration(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 把任意错误包装为组件创建失败
    pub fn creation_failed(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ComponentCreationFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建类型不匹配错误
    pub fn type_mismatch<T: ?Sized>(name: impl Into<String>) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected: std::any::type_name::<T>().to_string(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
