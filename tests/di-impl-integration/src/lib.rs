//! 集成测试共享夹具

use di_abstractions::{ComponentSpec, FnFactory};
use infrastructure_common::instance;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 带序号的测试对象，序号来自共享计数器
#[derive(Debug)]
pub struct Numbered {
    pub n: usize,
}

/// 共享计数器
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 自增并返回新值
    pub fn next(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// 每次实例化产生一个新序号的工厂
fn numbered(counter: &Counter, dependencies: &[&str]) -> FnFactory {
    let counter = counter.clone();
    FnFactory::sync(dependencies, move |_| Ok(instance(Numbered { n: counter.next() })))
}

/// 加载器形式的 [`Numbered`]
pub fn numbered_loader(counter: &Counter, dependencies: &[&str]) -> ComponentSpec {
    ComponentSpec::loader(numbered(counter, dependencies))
}

/// 工厂形式的 [`Numbered`]
pub fn numbered_factory(counter: &Counter, dependencies: &[&str]) -> ComponentSpec {
    ComponentSpec::factory(numbered(counter, dependencies))
}
