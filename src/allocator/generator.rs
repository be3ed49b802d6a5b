//! 短码生成器
//!
//! 生成器只负责产生候选字符串，不接触存储；唯一性由存储层的原子插入保证。

/// 候选短码生成器
pub trait CodeGenerator: Send + Sync + 'static {
    /// 生成指定长度的候选短码
    fn generate(&self, length: usize) -> String;
}

/// 从固定字母表均匀随机取字符（默认 base62）
pub struct RandomCodeGenerator {
    alphabet: Vec<char>,
}

impl RandomCodeGenerator {
    pub fn new(alphabet: &str) -> Self {
        Self {
            alphabet: alphabet.chars().collect(),
        }
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: usize) -> String {
        use rand::RngExt;

        let mut rng = rand::rng();
        std::iter::repeat_with(|| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .take(length)
            .collect()
    }
}
