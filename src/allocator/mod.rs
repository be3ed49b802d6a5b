//! 短码分配器
//!
//! 分配器只产生候选码并维护链接数估计，不做预占，也没有全局序号。
//! 调用方拿到候选后走存储层的原子插入，冲突时再向分配器要下一个，
//! 最多尝试 `max_attempts` 次。

mod generator;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::AllocatorConfig;
use crate::errors::Result;

pub use generator::{CodeGenerator, RandomCodeGenerator};

pub struct CodeAllocator {
    generator: Arc<dyn CodeGenerator>,
    alphabet_size: u64,
    min_length: usize,
    max_length: usize,
    growth_divisor: u64,
    max_attempts: u32,
    /// 已存储链接数的估计值，启动时从存储播种，之后每次成功插入 +1
    known_links: AtomicU64,
}

impl CodeAllocator {
    pub fn new(config: &AllocatorConfig) -> Result<Self> {
        let generator = Arc::new(RandomCodeGenerator::new(&config.alphabet));
        Self::with_generator(config, generator)
    }

    /// 使用自定义生成器（测试中用于制造确定性冲突）
    pub fn with_generator(
        config: &AllocatorConfig,
        generator: Arc<dyn CodeGenerator>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            generator,
            alphabet_size: config.alphabet.chars().count() as u64,
            min_length: config.min_length,
            max_length: config.max_length,
            growth_divisor: config.growth_divisor,
            max_attempts: config.max_attempts,
            known_links: AtomicU64::new(0),
        })
    }

    /// 生成一个当前长度的候选码
    pub fn allocate(&self) -> String {
        self.generator.generate(self.current_length())
    }

    /// 当前候选长度
    ///
    /// 从 `min_length` 起，只要 链接数 > alphabet_size^length / growth_divisor
    /// 就加 1，直到 `max_length`。
    pub fn current_length(&self) -> usize {
        let links = self.known_links.load(Ordering::Relaxed);
        let mut length = self.min_length;

        while length < self.max_length && links > self.threshold(length) {
            length += 1;
        }
        length
    }

    fn threshold(&self, length: usize) -> u64 {
        let exp = u32::try_from(length).unwrap_or(u32::MAX);
        self.alphabet_size.saturating_pow(exp) / self.growth_divisor
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 用存储中的实际链接数校准估计值
    pub fn observe_link_count(&self, count: u64) {
        self.known_links.store(count, Ordering::Relaxed);
    }

    pub fn record_inserted(&self) {
        self.known_links.fetch_add(1, Ordering::Relaxed);
    }

    pub fn known_links(&self) -> u64 {
        self.known_links.load(Ordering::Relaxed)
    }
}
