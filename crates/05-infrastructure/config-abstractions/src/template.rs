//! 占位符模板编译
//!
//! 把带 `LEFT key RIGHT` 占位符的字符串编译成字面量与占位符交替的片段序列。
//! 紧跟在转义符 `\` 之后的占位符按字面量处理，转义符本身被去掉。

use infrastructure_common::{ConfigError, ConfigResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 占位符转义符
pub const ESCAPE: char = '\\';

/// 占位符允许包含的路径字符
const KEY_CHARS: &str = r"[$0-9_a-zA-Z.\[\]]+";

/// 占位符分隔符
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

impl Delimiters {
    /// 创建分隔符
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{", "}")
    }
}

/// 模板片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// 原样输出的文本
    Literal(String),
    /// 需要替换的配置键
    Placeholder(String),
}

/// 已编译的模板
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    segments: Vec<TemplateSegment>,
    keys: Vec<String>,
}

impl Template {
    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(TemplateSegment::Literal(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(TemplateSegment::Literal(text.to_string()));
        }
    }

    fn push_placeholder(&mut self, key: &str) {
        if !self.keys.iter().any(|k| k == key) {
            self.keys.push(key.to_string());
        }
        self.segments
            .push(TemplateSegment::Placeholder(key.to_string()));
    }

    /// 片段序列
    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// 去重后的占位符键，按首次出现顺序
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 是否含有占位符
    pub fn has_placeholders(&self) -> bool {
        !self.keys.is_empty()
    }

    /// 整个模板恰好是一个占位符时返回它的键
    pub fn single_key(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [TemplateSegment::Placeholder(key)] => Some(key.as_str()),
            _ => None,
        }
    }

    /// 用给定映射渲染模板，缺失的键替换为空字符串
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Placeholder(key) => {
                    if let Some(value) = values.get(key) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

/// 模板编译器
#[derive(Debug, Clone)]
pub struct TemplateCompiler {
    delimiters: Delimiters,
    pattern: Regex,
}

impl TemplateCompiler {
    /// 按给定分隔符创建编译器
    pub fn new(delimiters: Delimiters) -> ConfigResult<Self> {
        if delimiters.left.is_empty() || delimiters.right.is_empty() {
            return Err(ConfigError::InvalidDelimiters {
                left: delimiters.left,
                right: delimiters.right,
            });
        }

        let pattern = format!(
            "{}({}){}",
            regex::escape(&delimiters.left),
            KEY_CHARS,
            regex::escape(&delimiters.right)
        );
        let pattern = Regex::new(&pattern).map_err(ConfigError::parse)?;
        Ok(Self {
            delimiters,
            pattern,
        })
    }

    /// 当前分隔符
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// 编译字符串
    pub fn compile(&self, raw: &str) -> Template {
        let mut template = Template::default();
        let mut last = 0;

        for captures in self.pattern.captures_iter(raw) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let preceding = &raw[last..whole.start()];
            if let Some(stripped) = preceding.strip_suffix(ESCAPE) {
                template.push_literal(stripped);
                template.push_literal(whole.as_str());
            } else {
                template.push_literal(preceding);
                template.push_placeholder(key.as_str());
            }
            last = whole.end();
        }

        template.push_literal(&raw[last..]);
        template
    }
}
