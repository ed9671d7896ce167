//! 配置路径
//!
//! `a.b`、`a[0]`、`a.0`、`[0].b` 等写法统一规范化为点分段形式，
//! 纯数字段视为序列下标。

use infrastructure_common::{ConfigError, ConfigResult};
use std::fmt;
use std::str::FromStr;

/// 路径段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// 映射键
    Key(String),
    /// 序列下标
    Index(usize),
}

impl Segment {
    /// 解析单个路径段，纯数字解析为下标
    pub fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse() {
                return Self::Index(index);
            }
        }
        Self::Key(raw.to_string())
    }

    /// 下标值
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Key(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// 规范化后的配置路径
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfigPath {
    segments: Vec<Segment>,
}

impl ConfigPath {
    /// 根路径
    pub fn root() -> Self {
        Self::default()
    }

    /// 解析路径字符串
    ///
    /// 去掉开头的 `[`，其余 `[` 替换为 `.`，删除所有 `]`，再按 `.` 切分。
    /// 空字符串表示根路径；中间出现空段视为无效路径。
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let normalized = raw
            .strip_prefix('[')
            .unwrap_or(raw)
            .replace('[', ".")
            .replace(']', "");
        if normalized.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in normalized.split('.') {
            if part.is_empty() {
                return Err(ConfigError::invalid_path(raw, "存在空的路径段"));
            }
            segments.push(Segment::parse(part));
        }
        Ok(Self { segments })
    }

    /// 路径段
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 是否为根路径
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// 追加一个路径段
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// 追加一个可能包含多段的相对路径
    pub fn join(&self, relative: &str) -> ConfigResult<Self> {
        let relative = Self::parse(relative)?;
        let mut segments = self.segments.clone();
        segments.extend(relative.segments);
        Ok(Self { segments })
    }

    /// 父路径，根路径没有父路径
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// 方括号形式，例如 `a[0].b`
    pub fn to_bracketed(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
            }
        }
        out
    }
}

/// 点分段的规范形式，例如 `a.0.b`
impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ConfigPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
